//! CSV ingester (C5): stream-parses a batch's CSV bytes into validated
//! `TransactionRow`s. Header validation is case-insensitive and fails the
//! whole job when a required column is absent; row-level errors are
//! recovered locally (the row is skipped and counted).

use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use recon_core::model::TransactionRow;
use rust_decimal::Decimal;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required column: {0}")]
    MissingRequiredColumn(&'static str),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
}

struct ColumnIndices {
    transaction_date: usize,
    description: usize,
    amount: usize,
    reference_number: Option<usize>,
}

/// Stream-parses one batch's CSV bytes. Implements `Iterator<Item =
/// TransactionRow>`; call [`CsvIngester::invalid_row_count`] once exhausted
/// to read the count of rows skipped for validation failures.
pub struct CsvIngester<R> {
    reader: csv::Reader<R>,
    columns: ColumnIndices,
    invalid_rows: usize,
}

impl<R: Read> CsvIngester<R> {
    /// Builds the ingester from raw CSV bytes, validating the header row.
    /// Fails fast (`JobFatal` upstream) when a required column is missing.
    pub fn new(source: R) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(source);
        let header = reader.headers()?.clone();

        let find = |name: &'static str| -> Option<usize> {
            header.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let transaction_date = find("transaction_date").ok_or(IngestError::MissingRequiredColumn("transaction_date"))?;
        let description = find("description").ok_or(IngestError::MissingRequiredColumn("description"))?;
        let amount = find("amount").ok_or(IngestError::MissingRequiredColumn("amount"))?;
        let reference_number = find("reference_number");

        Ok(Self {
            reader,
            columns: ColumnIndices {
                transaction_date,
                description,
                amount,
                reference_number,
            },
            invalid_rows: 0,
        })
    }

    /// Rows skipped so far because a required field failed validation.
    pub fn invalid_row_count(&self) -> usize {
        self.invalid_rows
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Option<TransactionRow> {
        let raw_date = record.get(self.columns.transaction_date)?;
        let transaction_date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT).ok()?;

        let description = record.get(self.columns.description)?.to_string();

        let raw_amount = record.get(self.columns.amount)?.trim();
        validate_amount(raw_amount)?;

        let reference_number = self
            .columns
            .reference_number
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(TransactionRow {
            transaction_date,
            description,
            amount: raw_amount.to_string(),
            reference_number,
        })
    }
}

/// Syntactic amount validation: must parse as a non-negative decimal. The
/// stored value is always the raw CSV text, never the parsed `Decimal` — the
/// matcher compares amounts as strings (see recon-core's matcher module).
fn validate_amount(raw: &str) -> Option<()> {
    let value = Decimal::from_str(raw).ok()?;
    if value.is_sign_negative() {
        None
    } else {
        Some(())
    }
}

impl<R: Read> Iterator for CsvIngester<R> {
    type Item = TransactionRow;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    if let Some(row) = self.parse_record(&record) {
                        return Some(row);
                    }
                    self.invalid_rows += 1;
                    tracing::debug!(invalid_rows = self.invalid_rows, "skipped invalid csv row");
                }
                Ok(false) => return None,
                Err(err) => {
                    tracing::warn!(error = %err, "csv read error, skipping row");
                    self.invalid_rows += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_valid_rows_and_counts_invalid_ones() {
        let csv = "transaction_date,description,amount,reference_number\n\
                    2024-12-10,SARAH ADAMS,1250.00,REF1\n\
                    not-a-date,BAD ROW,10.00,\n\
                    2024-12-11,NO REF,75.50,\n";
        let mut ingester = CsvIngester::new(csv.as_bytes()).unwrap();
        let rows: Vec<_> = ingester.by_ref().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, "1250.00");
        assert_eq!(rows[0].reference_number.as_deref(), Some("REF1"));
        assert_eq!(rows[1].reference_number, None);
        assert_eq!(ingester.invalid_row_count(), 1);
    }

    #[test]
    fn missing_required_column_fails_fast() {
        let csv = "date,description,amount\n2024-12-10,X,10.00\n";
        let err = CsvIngester::new(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingRequiredColumn("transaction_date")));
    }

    #[test]
    fn header_matching_is_case_insensitive_and_order_independent() {
        let csv = "AMOUNT,Transaction_Date,Description\n10.00,2024-12-10,X\n";
        let ingester = CsvIngester::new(csv.as_bytes()).unwrap();
        let rows: Vec<_> = ingester.collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "X");
    }

    #[test]
    fn invalid_amount_is_skipped_not_fatal() {
        let csv = "transaction_date,description,amount\n2024-12-10,X,-5.00\n2024-12-10,Y,not-a-number\n2024-12-10,Z,5.00\n";
        let mut ingester = CsvIngester::new(csv.as_bytes()).unwrap();
        let rows: Vec<_> = ingester.by_ref().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(ingester.invalid_row_count(), 2);
    }
}
