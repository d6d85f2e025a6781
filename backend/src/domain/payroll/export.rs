//! CSV exports of a period's payroll register and journal.

use std::fmt;

use serde::Serialize;

use super::result::{PayrollSummary, RegisterLine};

/// Export writer failure.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Serialising a record failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    /// Flushing the buffer failed.
    #[error("failed to flush CSV: {0}")]
    Flush(String),
    /// The written bytes were not UTF-8.
    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Ledger accounts used by the journal export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalAccount {
    /// Debited with gross pay.
    SalaryExpense,
    /// Credited with deductions withheld.
    DeductionsPayable,
    /// Credited with net pay.
    Cash,
}

impl JournalAccount {
    /// Account label written to the export.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SalaryExpense => "salary_expense",
            Self::DeductionsPayable => "deductions_payable",
            Self::Cash => "cash",
        }
    }
}

impl fmt::Display for JournalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct JournalRow {
    account: &'static str,
    debit: String,
    credit: String,
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write the register: one row per employee with gross, deductions and net.
///
/// The header is written even when there are no lines.
pub fn write_register_csv(lines: &[RegisterLine]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "employee_id",
        "first_name",
        "last_name",
        "gross",
        "deductions",
        "net",
        "currency",
    ])?;
    for line in lines {
        writer.serialize(line)?;
    }
    finish(writer)
}

/// Write the balanced journal for a summary.
pub fn write_journal_csv(summary: &PayrollSummary) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let rows = [
        (JournalAccount::SalaryExpense, Some(summary.total_gross), None),
        (
            JournalAccount::DeductionsPayable,
            None,
            Some(summary.total_deductions),
        ),
        (JournalAccount::Cash, None, Some(summary.total_net)),
    ];
    for (account, debit, credit) in rows {
        writer.serialize(JournalRow {
            account: account.as_str(),
            debit: debit.map(|value| value.to_string()).unwrap_or_default(),
            credit: credit.map(|value| value.to_string()).unwrap_or_default(),
        })?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[rstest]
    fn register_writes_header_and_rows() {
        let employee_id = Uuid::nil();
        let csv = write_register_csv(&[RegisterLine {
            employee_id,
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            gross: dec!(1200.00),
            deductions: dec!(100.00),
            net: dec!(1100.00),
            currency: "USD".to_owned(),
        }])
        .expect("register export");

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("employee_id,first_name,last_name,gross,deductions,net,currency")
        );
        assert_eq!(
            lines.next(),
            Some(format!("{employee_id},Ada,Lovelace,1200.00,100.00,1100.00,USD").as_str())
        );
        assert_eq!(lines.next(), None);
    }

    #[rstest]
    fn empty_register_still_has_header() {
        let csv = write_register_csv(&[]).expect("register export");
        assert_eq!(csv.lines().count(), 1);
    }

    #[rstest]
    fn journal_balances_debits_and_credits() {
        let summary = PayrollSummary {
            total_gross: dec!(2000.00),
            total_deductions: dec!(150.00),
            total_net: dec!(1850.00),
            employee_count: 2,
            ..PayrollSummary::default()
        };

        let csv = write_journal_csv(&summary).expect("journal export");

        assert_eq!(
            csv,
            "account,debit,credit\n\
             salary_expense,2000.00,\n\
             deductions_payable,,150.00\n\
             cash,,1850.00\n"
        );
    }
}
