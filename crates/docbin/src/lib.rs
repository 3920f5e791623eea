//! Document bundles
//!
//! Serializes annotated documents into compact binary bundles and
//! reconstructs them against a shared, immutable vocabulary.

mod hash;
mod types;
mod vocab;
mod bundle;

pub use hash::{hash_string, StrHash};
pub use types::{Attr, Doc, Span, Token};
pub use vocab::{StringStore, Vocab};
pub use bundle::{DocBin, BUNDLE_VERSION, MAX_INFLATED_BYTES};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocBinError {
    #[error("Unsupported language code: {0:?}")]
    UnsupportedLanguage(String),

    #[error("Unsupported bundle version: {0}")]
    UnsupportedVersion(u32),

    #[error("Corrupt bundle: {0}")]
    Corrupt(String),

    #[error("Unknown string hash {0:#018x} (vocabulary mismatch?)")]
    UnknownString(StrHash),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DocBinError>;
