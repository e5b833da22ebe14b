use csv::StringRecord;

use crate::{Error, Result};

pub const MIN_COLUMNS: usize = 7;
const VOLUME_COLUMN: usize = 6;

/// One daily bar for a ticker. Prices stay as the text found in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub ticker: String,
    pub day: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: f64,
}

impl Record {
    /// Builds a record from a positional row: ticker, day, open, high, low,
    /// close, volume. A volume that does not parse becomes `0.0`.
    pub fn from_row(row: &StringRecord) -> Result<Record> {
        if row.len() < MIN_COLUMNS {
            return Err(Error::MalformedRow {
                line: row.position().map_or(0, |p| p.line()),
                columns: row.len(),
            });
        }
        Ok(Record {
            ticker: row[0].to_string(),
            day: row[1].to_string(),
            open: row[2].to_string(),
            high: row[3].to_string(),
            low: row[4].to_string(),
            close: row[5].to_string(),
            volume: row[VOLUME_COLUMN].parse().unwrap_or_default(),
        })
    }

    /// Sorted-set member for this record: the volume in plain decimal form.
    pub fn member(&self) -> String {
        self.volume.to_string()
    }
}
