//! Pay-line inputs and ad-hoc adjustments collected per period and employee.
//!
//! `amount` is authoritative. When a caller leaves it at zero but supplies
//! positive units, the amount is derived as `units * rate` once, at
//! ingestion; calculation never re-derives it.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::element::{ElementType, ParseCatalogValueError};
use super::period::PeriodBounds;
use super::round_money;
use crate::domain::TenantId;

/// Where an input line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Entered through the API one line at a time.
    #[default]
    Manual,
    /// Loaded from a CSV upload.
    Import,
}

impl InputSource {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Import => "import",
        }
    }
}

impl FromStr for InputSource {
    type Err = ParseCatalogValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "import" => Ok(Self::Import),
            _ => Err(ParseCatalogValueError {
                kind: "input source",
                value: value.to_owned(),
            }),
        }
    }
}

/// Exclusive magnitude bound for `units` and `rate` (`NUMERIC(14, 4)`).
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);
/// Exclusive magnitude bound for stored amounts (`NUMERIC(14, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Validation errors for inputs and adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputValidationError {
    /// Units must not be negative.
    #[error("units must not be negative")]
    NegativeUnits,
    /// Adjustment descriptions are required.
    #[error("description must not be empty")]
    EmptyDescription,
    /// A numeric field exceeds what a pay line can store.
    #[error("{field} is out of range")]
    OutOfRange {
        /// Offending field, as named on the wire.
        field: &'static str,
    },
}

fn within(
    value: Decimal,
    bound: Decimal,
    field: &'static str,
) -> Result<Decimal, InputValidationError> {
    if value.abs() < bound {
        Ok(value)
    } else {
        Err(InputValidationError::OutOfRange { field })
    }
}

/// Caller-supplied fields for a new input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollInputDraft {
    /// Employee the line belongs to.
    pub employee_id: Uuid,
    /// Catalog element the line refers to.
    pub element_id: Uuid,
    /// Quantity, e.g. hours.
    pub units: Decimal,
    /// Price per unit.
    pub rate: Decimal,
    /// Explicit amount; zero requests derivation from units and rate.
    pub amount: Decimal,
    /// Origin of the line.
    pub source: InputSource,
}

/// Stored pay-line input. Append-only within a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollInput {
    /// Input identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Period the line applies to.
    pub period_id: Uuid,
    /// Employee the line belongs to.
    pub employee_id: Uuid,
    /// Catalog element the line refers to.
    pub element_id: Uuid,
    /// Quantity.
    pub units: Decimal,
    /// Price per unit.
    pub rate: Decimal,
    /// Authoritative amount.
    pub amount: Decimal,
    /// Origin of the line.
    pub source: InputSource,
}

impl PayrollInput {
    /// Validate a draft and normalise its amount.
    ///
    /// # Examples
    /// ```
    /// use payroll::domain::TenantId;
    /// use payroll::domain::payroll::{InputSource, PayrollInput, PayrollInputDraft};
    /// use rust_decimal_macros::dec;
    /// use uuid::Uuid;
    ///
    /// let draft = PayrollInputDraft {
    ///     employee_id: Uuid::new_v4(),
    ///     element_id: Uuid::new_v4(),
    ///     units: dec!(8),
    ///     rate: dec!(12.5),
    ///     amount: dec!(0),
    ///     source: InputSource::Manual,
    /// };
    /// let input = PayrollInput::ingest(TenantId::random(), Uuid::new_v4(), draft).unwrap();
    /// assert_eq!(input.amount, dec!(100.00));
    /// ```
    pub fn ingest(
        tenant_id: TenantId,
        period_id: Uuid,
        draft: PayrollInputDraft,
    ) -> Result<Self, InputValidationError> {
        if draft.units < Decimal::ZERO {
            return Err(InputValidationError::NegativeUnits);
        }
        let units = within(draft.units, MAX_QUANTITY, "units")?;
        let rate = within(draft.rate, MAX_QUANTITY, "rate")?;
        let amount = normalise_amount(units, rate, draft.amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            period_id,
            employee_id: draft.employee_id,
            element_id: draft.element_id,
            units,
            rate,
            amount,
            source: draft.source,
        })
    }
}

/// Derive the stored amount from its parts.
///
/// # Errors
///
/// Returns [`InputValidationError::OutOfRange`] when the amount, or the
/// product of units and rate, does not fit a stored amount.
pub fn normalise_amount(
    units: Decimal,
    rate: Decimal,
    amount: Decimal,
) -> Result<Decimal, InputValidationError> {
    let derived = if amount.is_zero() && units > Decimal::ZERO {
        units
            .checked_mul(rate)
            .ok_or(InputValidationError::OutOfRange { field: "amount" })?
    } else {
        amount
    };
    within(round_money(derived), MAX_AMOUNT, "amount")
}

/// Input amount joined to its element type.
///
/// `element_type` is `None` when the stored type is not recognised; such
/// lines contribute to neither side of the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedInput {
    /// Element type, when recognised.
    pub element_type: Option<ElementType>,
    /// Authoritative amount.
    pub amount: Decimal,
}

/// Caller-supplied fields for a new adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentDraft {
    /// Employee the adjustment belongs to.
    pub employee_id: Uuid,
    /// Free-text reason.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Optional effective date; `None` applies to any period.
    pub effective_date: Option<NaiveDate>,
}

/// Signed one-off correction to an employee's gross pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollAdjustment {
    /// Adjustment identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Period the adjustment was recorded against.
    pub period_id: Uuid,
    /// Employee the adjustment belongs to.
    pub employee_id: Uuid,
    /// Free-text reason.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Optional effective date.
    pub effective_date: Option<NaiveDate>,
}

impl PayrollAdjustment {
    /// Validate a draft and assign it an identifier.
    pub fn record(
        tenant_id: TenantId,
        period_id: Uuid,
        draft: AdjustmentDraft,
    ) -> Result<Self, InputValidationError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(InputValidationError::EmptyDescription);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            period_id,
            employee_id: draft.employee_id,
            description: description.to_owned(),
            amount: within(round_money(draft.amount), MAX_AMOUNT, "amount")?,
            effective_date: draft.effective_date,
        })
    }

    /// Whether the adjustment counts toward a period with these bounds.
    pub fn applies_to(&self, bounds: &PeriodBounds) -> bool {
        self.effective_date
            .is_none_or(|effective| bounds.contains(effective))
    }
}
