//! Pay element catalog: tenant-defined earnings and deductions.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::TenantId;

/// Which side of the payslip an element contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// Adds to gross pay.
    Earning,
    /// Subtracted from gross to reach net.
    Deduction,
}

impl ElementType {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earning => "earning",
            Self::Deduction => "deduction",
        }
    }
}

/// Error returned for unknown catalog enum values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseCatalogValueError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl FromStr for ElementType {
    type Err = ParseCatalogValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "earning" => Ok(Self::Earning),
            "deduction" => Ok(Self::Deduction),
            other => Err(ParseCatalogValueError {
                kind: "element type",
                value: other.to_owned(),
            }),
        }
    }
}

/// How input amounts for an element are usually expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalcType {
    /// A flat amount per period.
    Fixed,
    /// Units multiplied by a rate.
    UnitRate,
}

impl CalcType {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::UnitRate => "unit_rate",
        }
    }
}

impl FromStr for CalcType {
    type Err = ParseCatalogValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fixed" => Ok(Self::Fixed),
            "unit_rate" => Ok(Self::UnitRate),
            other => Err(ParseCatalogValueError {
                kind: "calc type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Validation errors for new pay elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayElementValidationError {
    /// The element name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// The element name exceeded the storage limit.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum permitted length.
        max: usize,
    },
}

/// Tenant-defined earning or deduction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayElement {
    /// Element identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Earning or deduction.
    pub element_type: ElementType,
    /// Calculation style.
    pub calc_type: CalcType,
    /// Suggested amount for new inputs.
    pub default_amount: Decimal,
    /// Whether the element is subject to tax.
    pub taxable: bool,
}

/// Fields supplied when defining a new pay element.
#[derive(Debug, Clone)]
pub struct PayElementDraft {
    /// Display name.
    pub name: String,
    /// Earning or deduction.
    pub element_type: ElementType,
    /// Calculation style.
    pub calc_type: CalcType,
    /// Suggested amount for new inputs.
    pub default_amount: Decimal,
    /// Whether the element is subject to tax.
    pub taxable: bool,
}

/// Maximum length of an element name.
pub const ELEMENT_NAME_MAX: usize = 120;

impl PayElement {
    /// Validate a draft and assign it an identifier.
    pub fn create(
        tenant_id: TenantId,
        draft: PayElementDraft,
    ) -> Result<Self, PayElementValidationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(PayElementValidationError::EmptyName);
        }
        if name.chars().count() > ELEMENT_NAME_MAX {
            return Err(PayElementValidationError::NameTooLong {
                max: ELEMENT_NAME_MAX,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_owned(),
            element_type: draft.element_type,
            calc_type: draft.calc_type,
            default_amount: super::round_money(draft.default_amount),
            taxable: draft.taxable,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    fn draft(name: &str) -> PayElementDraft {
        PayElementDraft {
            name: name.to_owned(),
            element_type: ElementType::Earning,
            calc_type: CalcType::Fixed,
            default_amount: dec!(150.005),
            taxable: true,
        }
    }

    #[rstest]
    fn create_trims_name_and_rounds_default() {
        let element = PayElement::create(TenantId::random(), draft("  Bonus "))
            .expect("valid element");
        assert_eq!(element.name, "Bonus");
        assert_eq!(element.default_amount, dec!(150.01));
    }

    #[rstest]
    fn create_rejects_blank_names() {
        let result = PayElement::create(TenantId::random(), draft("   "));
        assert_eq!(result, Err(PayElementValidationError::EmptyName));
    }

    #[rstest]
    #[case("earning", Some(ElementType::Earning))]
    #[case("deduction", Some(ElementType::Deduction))]
    #[case("benefit", None)]
    fn element_type_parses_known_values(#[case] raw: &str, #[case] expected: Option<ElementType>) {
        assert_eq!(raw.parse::<ElementType>().ok(), expected);
    }

    #[rstest]
    fn calc_type_round_trips() {
        for calc in [CalcType::Fixed, CalcType::UnitRate] {
            assert_eq!(calc.as_str().parse::<CalcType>(), Ok(calc));
        }
    }
}
