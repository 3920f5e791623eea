//! Batch loading

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::{RawRecord, RecordData, RecordDecoder, Result};

/// File name the batch is read from when none is given.
pub const DEFAULT_BATCH_FILE: &str = "docbin_full.json";

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    pub id: String,
    pub data: RecordData,
}

/// Parse a batch file: a JSON array of raw records.
pub fn read_batch_file(path: &Path) -> Result<Vec<RawRecord>> {
    let f = File::open(path)?;
    let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(f))?;
    debug!(path = %path.display(), records = records.len(), "batch file parsed");
    Ok(records)
}

/// Decode every record in order. The first failure aborts the batch.
pub fn load_batch(decoder: &RecordDecoder<'_>, raws: Vec<RawRecord>) -> Result<Vec<DecodedRecord>> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        let id = raw.record_id.clone();
        let data = decoder.decode(raw)?;
        out.push(DecodedRecord { id, data });
    }
    Ok(out)
}
