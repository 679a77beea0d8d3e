//! Trace file codec
//!
//! A trace file is the download wire format written to disk: a headerless
//! run of [`ENTRY_SIZE`]-byte records in recorded order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{RVSError, Result};

use super::entry::{TraceEntry, ENTRY_SIZE};

/// Conventional name of a downloaded trace
pub const TRACE_FILE_NAME: &str = "trace.bin";

/// Write `entries` as wire records
pub fn write_trace<W: Write>(writer: &mut W, entries: &[TraceEntry]) -> Result<()> {
    for entry in entries {
        writer.write_all(&entry.to_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every record from `reader`
///
/// Fails with `MalformedTrace` if the data ends inside a record.
pub fn read_trace<R: Read>(reader: &mut R) -> Result<Vec<TraceEntry>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let trailing = bytes.len() % ENTRY_SIZE;
    if trailing != 0 {
        return Err(RVSError::MalformedTrace {
            reason: format!(
                "{} bytes is not a whole number of {}-byte records ({} trailing)",
                bytes.len(),
                ENTRY_SIZE,
                trailing
            ),
        });
    }

    Ok(bytes
        .chunks_exact(ENTRY_SIZE)
        .map(|chunk| {
            let mut record = [0u8; ENTRY_SIZE];
            record.copy_from_slice(chunk);
            TraceEntry::from_bytes(record)
        })
        .collect())
}

pub fn write_trace_file(path: impl AsRef<Path>, entries: &[TraceEntry]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_trace(&mut writer, entries)
}

pub fn read_trace_file(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    read_trace(&mut reader)
}
