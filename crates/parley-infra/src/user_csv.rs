//! Bulk user import from CSV.
//!
//! The first record is a header naming the columns, in any order:
//! `phone_number` and `name` are required, `job_title`, `gender` and
//! `date_of_birth` (`YYYY-MM-DD`) are optional. Unknown columns are ignored.
//! Rows that cannot be read are returned as failed [`ImportRow`]s so the
//! rest of the file still imports.

use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use parley_types::user::{CreateUserRequest, Gender, ImportRow};

/// Columns every import file must have.
pub const REQUIRED_COLUMNS: [&str; 2] = ["phone_number", "name"];

/// Problems with the file as a whole.
#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV header is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("failed to read CSV: {0}")]
    Read(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct CsvUser {
    #[serde(alias = "phone")]
    phone_number: String,
    name: String,
    #[serde(default, alias = "job")]
    job_title: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default, alias = "dob")]
    date_of_birth: Option<String>,
}

impl CsvUser {
    fn into_request(self) -> Result<CreateUserRequest, String> {
        let gender = non_empty(self.gender)
            .map(|g| g.parse::<Gender>())
            .transpose()
            .map_err(|e| e.to_string())?;
        let date_of_birth = non_empty(self.date_of_birth)
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| format!("invalid date_of_birth (expected YYYY-MM-DD): {e}"))?;

        Ok(CreateUserRequest {
            phone_number: self.phone_number,
            name: self.name,
            job_title: non_empty(self.job_title),
            gender,
            date_of_birth,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read every data row of a user CSV.
pub fn read_users<R: Read>(input: R) -> Result<Vec<ImportRow>, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(CsvImportError::Empty);
    }
    let headers = csv::StringRecord::from(
        headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
            .collect::<Vec<_>>(),
    );
    for column in REQUIRED_COLUMNS {
        let alias = if column == "phone_number" { "phone" } else { column };
        if !headers.iter().any(|h| h == column || h == alias) {
            return Err(CsvImportError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|record| {
                record
                    .deserialize::<CsvUser>(Some(&headers))
                    .map_err(|e| e.to_string())
            })
            .and_then(CsvUser::into_request);
        rows.push(ImportRow { line, parsed });
    }

    tracing::debug!(rows = rows.len(), "user CSV parsed");
    Ok(rows)
}
