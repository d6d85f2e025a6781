//! Unpaid leave windows and their proration against a pay period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::period::PeriodBounds;

/// Validation errors for leave windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LeaveWindowError {
    /// The end date precedes the start date, or a single day is flagged half
    /// at both ends.
    #[error("leave window dates are invalid")]
    InvalidDates,
}

impl LeaveWindowError {
    /// Stable detail code for adapters.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidDates => "invalid_dates",
        }
    }
}

/// Raw leave row as stored by the HR core, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpaidLeaveSpan {
    /// First day of leave.
    pub start_date: NaiveDate,
    /// Last day of leave.
    pub end_date: NaiveDate,
    /// Whether only the afternoon of the first day is taken.
    pub start_half: bool,
    /// Whether only the morning of the last day is taken.
    pub end_half: bool,
}

/// Validated approved unpaid leave window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveWindow {
    start: NaiveDate,
    end: NaiveDate,
    start_half: bool,
    end_half: bool,
}

impl LeaveWindow {
    /// Validate a leave window.
    ///
    /// A single-day window cannot be half at both ends.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        start_half: bool,
        end_half: bool,
    ) -> Result<Self, LeaveWindowError> {
        if end < start || (start == end && start_half && end_half) {
            return Err(LeaveWindowError::InvalidDates);
        }
        Ok(Self {
            start,
            end,
            start_half,
            end_half,
        })
    }

    /// Days of this window that fall inside the period.
    ///
    /// The window is clipped to the period; a half-day flag subtracts 0.5
    /// only when its boundary day lies inside the period.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use payroll::domain::payroll::{LeaveWindow, PeriodBounds};
    /// use rust_decimal_macros::dec;
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2026, 6, d).unwrap();
    /// let june = PeriodBounds::new(day(1), day(30)).unwrap();
    /// let window = LeaveWindow::new(day(10), day(12), true, false).unwrap();
    /// assert_eq!(window.covered_days(&june), dec!(2.5));
    /// ```
    pub fn covered_days(&self, bounds: &PeriodBounds) -> Decimal {
        let Some((start, end)) = bounds.clip(self.start, self.end) else {
            return Decimal::ZERO;
        };
        let mut days = Decimal::from((end - start).num_days() + 1);
        if self.start_half && bounds.contains(self.start) {
            days -= dec!(0.5);
        }
        if self.end_half && bounds.contains(self.end) {
            days -= dec!(0.5);
        }
        days.max(Decimal::ZERO)
    }
}

impl TryFrom<UnpaidLeaveSpan> for LeaveWindow {
    type Error = LeaveWindowError;

    fn try_from(span: UnpaidLeaveSpan) -> Result<Self, Self::Error> {
        Self::new(span.start_date, span.end_date, span.start_half, span.end_half)
    }
}
