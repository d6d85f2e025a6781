//! Translation of pool and Diesel failures into payroll port errors.
//!
//! Every repository error type distinguishes lost connectivity from failed
//! statements. Constraint violations default to query failures; ports that
//! give them meaning (idempotency claims) override
//! [`PersistenceFailure::constraint_violated`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use crate::domain::ports::{
    EmployeeDirectoryError, IdempotencyRepositoryError, PayPeriodRepositoryError,
    PayrollInputRepositoryError, PayrollResultRepositoryError, PayslipRepositoryError,
};

/// Port error types a repository can report storage failures through.
pub trait PersistenceFailure: Sized {
    /// A statement failed.
    fn query_failed(message: String) -> Self;

    /// No usable connection.
    fn connection_lost(message: String) -> Self;

    /// A unique or foreign-key constraint rejected the write.
    fn constraint_violated(constraint: &str) -> Self {
        Self::query_failed(format!("constraint {constraint} violated"))
    }
}

macro_rules! query_or_connection {
    ($($error:ty),* $(,)?) => {
        $(
            impl PersistenceFailure for $error {
                fn query_failed(message: String) -> Self {
                    Self::query(message)
                }

                fn connection_lost(message: String) -> Self {
                    Self::connection(message)
                }
            }
        )*
    };
}

query_or_connection!(
    EmployeeDirectoryError,
    PayPeriodRepositoryError,
    PayrollInputRepositoryError,
    PayrollResultRepositoryError,
    PayslipRepositoryError,
);

impl PersistenceFailure for IdempotencyRepositoryError {
    fn query_failed(message: String) -> Self {
        Self::query(message)
    }

    fn connection_lost(message: String) -> Self {
        Self::connection(message)
    }

    fn constraint_violated(constraint: &str) -> Self {
        Self::duplicate_key(format!("concurrent claim detected ({constraint})"))
    }
}

/// Map a pool failure; both checkout and build failures mean no connection.
pub fn map_pool_failure<E: PersistenceFailure>(error: PoolError) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    E::connection_lost(message)
}

/// Map a Diesel failure raised while working on `table`.
pub fn map_diesel_failure<E: PersistenceFailure>(error: DieselError, table: &'static str) -> E {
    match error {
        DieselError::NotFound => E::query_failed(format!("{table}: record not found")),
        DieselError::DatabaseError(kind, info) => {
            debug!(table, ?kind, message = info.message(), "diesel operation failed");
            match kind {
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation => {
                    E::constraint_violated(info.constraint_name().unwrap_or(table))
                }
                DatabaseErrorKind::ClosedConnection => {
                    E::connection_lost(format!("{table}: database connection error"))
                }
                DatabaseErrorKind::SerializationFailure => {
                    E::query_failed(format!("{table}: concurrent update conflict"))
                }
                _ => E::query_failed(format!("{table}: database error")),
            }
        }
        other => {
            debug!(table, error = %other, "diesel operation failed");
            E::query_failed(format!("{table}: database query error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug)]
    struct ViolationInfo(&'static str);

    impl diesel::result::DatabaseErrorInformation for ViolationInfo {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn violation(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(ViolationInfo("payslips_period_employee_key")))
    }

    #[rstest]
    fn pool_failures_are_connection_errors() {
        let mapped: PayslipRepositoryError =
            map_pool_failure(PoolError::checkout("timed out waiting for connection"));
        assert_eq!(
            mapped,
            PayslipRepositoryError::connection("timed out waiting for connection")
        );
    }

    #[rstest]
    #[case(DatabaseErrorKind::UniqueViolation)]
    #[case(DatabaseErrorKind::ForeignKeyViolation)]
    fn constraint_violations_name_the_constraint(#[case] kind: DatabaseErrorKind) {
        let mapped: PayslipRepositoryError = map_diesel_failure(violation(kind), "payslips");
        assert_eq!(
            mapped,
            PayslipRepositoryError::query("constraint payslips_period_employee_key violated")
        );
    }

    #[rstest]
    fn idempotency_claims_report_duplicates() {
        let mapped: IdempotencyRepositoryError = map_diesel_failure(
            violation(DatabaseErrorKind::UniqueViolation),
            "idempotency_keys",
        );
        assert!(matches!(
            mapped,
            IdempotencyRepositoryError::DuplicateKey { .. }
        ));
    }

    #[rstest]
    fn closed_connections_are_connection_errors() {
        let mapped: PayPeriodRepositoryError =
            map_diesel_failure(violation(DatabaseErrorKind::ClosedConnection), "pay_periods");
        assert_eq!(
            mapped,
            PayPeriodRepositoryError::connection("pay_periods: database connection error")
        );
    }

    #[rstest]
    fn missing_rows_are_query_errors() {
        let mapped: EmployeeDirectoryError = map_diesel_failure(DieselError::NotFound, "employees");
        assert_eq!(
            mapped,
            EmployeeDirectoryError::query("employees: record not found")
        );
    }
}
