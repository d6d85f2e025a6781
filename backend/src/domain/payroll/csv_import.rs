//! Header-driven parsing of payroll input CSV uploads.
//!
//! Columns are matched case-insensitively:
//! `employee_id | employee_email, element_id, units, rate, amount, source`.
//! Malformed rows are reported as rejections; they never abort the upload.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::input::InputSource;

/// How a CSV row identifies its employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeLocator {
    /// Explicit employee identifier.
    Id(Uuid),
    /// Lower-cased email, resolved against the tenant's employees.
    Email(String),
}

/// One syntactically valid import row, not yet resolved against the tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line number in the upload.
    pub line: u64,
    /// Employee reference.
    pub employee: EmployeeLocator,
    /// Catalog element identifier.
    pub element_id: Uuid,
    /// Quantity; blank cells read as zero.
    pub units: Decimal,
    /// Price per unit; blank cells read as zero.
    pub rate: Decimal,
    /// Explicit amount; blank cells read as zero.
    pub amount: Decimal,
    /// Origin; defaults to `import`.
    pub source: InputSource,
}

/// Why a row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowRejection {
    /// Neither `employee_id` nor `employee_email` was filled.
    #[error("row has no employee reference")]
    MissingEmployee,
    /// `employee_id` was not a UUID.
    #[error("employee_id is not a valid UUID")]
    InvalidEmployeeId,
    /// `element_id` was blank.
    #[error("row has no element_id")]
    MissingElement,
    /// `element_id` was not a UUID.
    #[error("element_id is not a valid UUID")]
    InvalidElementId,
    /// A numeric cell did not parse.
    #[error("{column} is not a number")]
    InvalidNumber {
        /// Offending column.
        column: &'static str,
    },
    /// `source` was not `manual` or `import`.
    #[error("source must be manual or import")]
    InvalidSource,
    /// The CSV record itself was malformed.
    #[error("malformed record: {message}")]
    Malformed {
        /// Reader diagnostic.
        message: String,
    },
    /// The employee reference did not match a tenant employee.
    #[error("employee not found")]
    UnknownEmployee,
    /// The element did not match a tenant element.
    #[error("element not found")]
    UnknownElement,
}

/// Errors that reject the whole upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvImportError {
    /// A required header is absent.
    #[error("CSV header must include {column}")]
    MissingColumn {
        /// Missing header name.
        column: &'static str,
    },
    /// The header row could not be read.
    #[error("CSV header could not be read: {message}")]
    Unreadable {
        /// Reader diagnostic.
        message: String,
    },
}

/// Parsed rows plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    /// Rows ready for resolution.
    pub rows: Vec<ImportRow>,
    /// Skipped rows with their line numbers.
    pub rejected: Vec<(u64, RowRejection)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnIndex {
    employee_id: Option<usize>,
    employee_email: Option<usize>,
    element_id: Option<usize>,
    units: Option<usize>,
    rate: Option<usize>,
    amount: Option<usize>,
    source: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, CsvImportError> {
        let mut index = Self::default();
        for (position, header) in headers.iter().enumerate() {
            let slot = match header.trim().to_ascii_lowercase().as_str() {
                "employee_id" => &mut index.employee_id,
                "employee_email" => &mut index.employee_email,
                "element_id" => &mut index.element_id,
                "units" => &mut index.units,
                "rate" => &mut index.rate,
                "amount" => &mut index.amount,
                "source" => &mut index.source,
                _ => continue,
            };
            slot.get_or_insert(position);
        }
        if index.employee_id.is_none() && index.employee_email.is_none() {
            return Err(CsvImportError::MissingColumn {
                column: "employee_id or employee_email",
            });
        }
        if index.element_id.is_none() {
            return Err(CsvImportError::MissingColumn {
                column: "element_id",
            });
        }
        Ok(index)
    }
}

fn cell(record: &csv::StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|position| record.get(position))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_number(
    record: &csv::StringRecord,
    column: Option<usize>,
    name: &'static str,
) -> Result<Decimal, RowRejection> {
    match cell(record, column) {
        None => Ok(Decimal::ZERO),
        Some(raw) => Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|_| RowRejection::InvalidNumber { column: name }),
    }
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &ColumnIndex,
    line: u64,
) -> Result<ImportRow, RowRejection> {
    let employee = match (
        cell(record, columns.employee_id),
        cell(record, columns.employee_email),
    ) {
        (Some(id), _) => EmployeeLocator::Id(
            Uuid::parse_str(id).map_err(|_| RowRejection::InvalidEmployeeId)?,
        ),
        (None, Some(email)) => EmployeeLocator::Email(email.to_lowercase()),
        (None, None) => return Err(RowRejection::MissingEmployee),
    };
    let element_id = cell(record, columns.element_id)
        .ok_or(RowRejection::MissingElement)
        .and_then(|raw| Uuid::parse_str(raw).map_err(|_| RowRejection::InvalidElementId))?;
    let source = match cell(record, columns.source) {
        None => InputSource::Import,
        Some(raw) => raw.parse().map_err(|_| RowRejection::InvalidSource)?,
    };

    Ok(ImportRow {
        line,
        employee,
        element_id,
        units: parse_number(record, columns.units, "units")?,
        rate: parse_number(record, columns.rate, "rate")?,
        amount: parse_number(record, columns.amount, "amount")?,
        source,
    })
}

/// Parse an uploaded CSV body.
///
/// # Examples
/// ```
/// use payroll::domain::payroll::parse_input_csv;
///
/// let body = "Employee_Email,Element_ID,Units,Rate\n\
///             ada@example.com,6f1c1f7e-1d0a-4a55-9a7e-2f4d8c1e9b10,8,12.50\n\
///             ,6f1c1f7e-1d0a-4a55-9a7e-2f4d8c1e9b10,1,1\n";
/// let parsed = parse_input_csv(body).unwrap();
/// assert_eq!(parsed.rows.len(), 1);
/// assert_eq!(parsed.rejected.len(), 1);
/// ```
pub fn parse_input_csv(body: &str) -> Result<ParsedImport, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| CsvImportError::Unreadable {
            message: err.to_string(),
        })?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut parsed = ParsedImport::default();
    for (offset, record) in reader.records().enumerate() {
        let fallback_line = u64::try_from(offset)
            .unwrap_or(u64::MAX)
            .saturating_add(2);
        let (line, outcome) = match record {
            Ok(record) => {
                let line = record
                    .position()
                    .map_or(fallback_line, csv::Position::line);
                (line, parse_row(&record, &columns, line))
            }
            Err(err) => (
                fallback_line,
                Err(RowRejection::Malformed {
                    message: err.to_string(),
                }),
            ),
        };
        match outcome {
            Ok(row) => parsed.rows.push(row),
            Err(rejection) => parsed.rejected.push((line, rejection)),
        }
    }
    Ok(parsed)
}
