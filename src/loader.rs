use std::io;
use std::path::Path;

use log::info;

use crate::record::Record;
use crate::Result;


/// Reads every data row of the csv file at `path`. The first row is a header
/// and is discarded without looking at it.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path.as_ref())?;
    let records = read_records(reader)?;
    info!(
        "data length : {} ({})",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

/// Same as [`load_csv`] for an already opened source.
pub fn load_from_reader<R: io::Read>(source: R) -> Result<Vec<Record>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(source);
    read_records(reader)
}

// all or nothing: one bad row fails the whole file
fn read_records<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for row in reader.records() {
        records.push(Record::from_row(&row?)?);
    }
    Ok(records)
}
