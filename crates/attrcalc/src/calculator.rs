//! The per-record computation seam

use crate::{AttrValue, RecordData};

/// Computes one attribute value from one decoded record.
///
/// Implementations may keep state and need not be reentrant: the driver
/// calls `calculate` exactly once per record, strictly in batch order.
pub trait AttributeCalculator {
    fn calculate(&mut self, data: &RecordData) -> anyhow::Result<AttrValue>;
}

impl<F> AttributeCalculator for F
where
    F: FnMut(&RecordData) -> anyhow::Result<AttrValue>,
{
    fn calculate(&mut self, data: &RecordData) -> anyhow::Result<AttrValue> {
        self(data)
    }
}
