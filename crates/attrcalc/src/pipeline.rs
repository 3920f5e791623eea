//! Decode -> compute

use docbin::Vocab;
use tracing::info;

use crate::{
    load_batch, CalculatedAttributes, ComputationDriver, ProgressSink, RawRecord, RecordDecoder,
    Result,
};

/// Decode the whole batch, then run the driver over it. Decoding finishes
/// before the first calculator call, so a malformed record anywhere in the
/// batch means the calculator never runs.
pub fn compute_batch(
    batch: Vec<RawRecord>,
    vocab: &Vocab,
    driver: &mut ComputationDriver<'_>,
    progress: &mut dyn ProgressSink,
) -> Result<CalculatedAttributes> {
    let records = load_batch(&RecordDecoder::new(vocab), batch)?;
    info!(records = records.len(), lang = vocab.lang(), "batch decoded");

    info!(data_type = %driver.check().data_type(), "Running attribute calculation.");
    let results = driver.run(records, progress)?;
    info!(values = results.len(), "attribute calculation done");
    Ok(results)
}
