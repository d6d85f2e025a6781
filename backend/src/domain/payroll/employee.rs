//! Read-only view of HR core employee data needed for payroll.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Currency used when an employee has no pay group.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Pay-relevant facts about one active employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeePayProfile {
    /// Employee identifier.
    pub employee_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address used for payslip notifications.
    pub email: String,
    /// Base salary per period; `None` when HR has not set one.
    pub base_salary: Option<Decimal>,
    /// ISO currency of the employee's pay group.
    pub currency: String,
    /// Whether at least one bank account is on file.
    pub has_bank_account: bool,
}
