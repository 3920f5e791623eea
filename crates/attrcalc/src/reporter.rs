//! Result delivery seam

use async_trait::async_trait;

use crate::{CalculatedAttributes, Result};

/// Delivers the whole id -> value map in one call. No retry, no chunking:
/// an error is returned to the caller as-is.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    async fn report(&self, results: &CalculatedAttributes) -> Result<()>;
}
