//! Bundle codec
//!
//! Wire format: zlib(bincode(BundlePayload)). Token attributes are stored as
//! string hashes in a row-major `n_tokens x attrs.len()` table; only strings
//! the vocabulary does not already know travel with the bundle.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};

use crate::{hash_string, Attr, Doc, DocBinError, Result, StrHash, StringStore, Token, Vocab};

pub const BUNDLE_VERSION: u32 = 1;

/// Upper bound on a bundle's inflated size.
pub const MAX_INFLATED_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct BundlePayload {
    version: u32,
    attrs: Vec<Attr>,
    tokens: Vec<StrHash>,
    spaces: Vec<bool>,
    lengths: Vec<u32>,
    strings: Vec<String>,
    cats: Vec<BTreeMap<String, f64>>,
}

/// A serializable collection of docs.
#[derive(Clone, Debug)]
pub struct DocBin {
    attrs: Vec<Attr>,
    tokens: Vec<StrHash>,
    spaces: Vec<bool>,
    lengths: Vec<u32>,
    strings: BTreeSet<String>,
    cats: Vec<BTreeMap<String, f64>>,
}

impl Default for DocBin {
    fn default() -> Self {
        Self::new(&Attr::ALL)
    }
}

impl DocBin {
    /// ORTH is always stored, first.
    pub fn new(attrs: &[Attr]) -> Self {
        let mut cols = vec![Attr::Orth];
        for a in attrs {
            if !cols.contains(a) {
                cols.push(*a);
            }
        }
        Self {
            attrs: cols,
            tokens: Vec::new(),
            spaces: Vec::new(),
            lengths: Vec::new(),
            strings: BTreeSet::new(),
            cats: Vec::new(),
        }
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn add(&mut self, doc: &Doc) {
        for tok in doc.tokens() {
            for attr in &self.attrs {
                let value = tok.attr(*attr).unwrap_or("");
                self.tokens.push(hash_string(value));
                if !value.is_empty() {
                    self.strings.insert(value.to_string());
                }
            }
            self.spaces.push(tok.whitespace);
        }
        self.lengths.push(doc.len() as u32);
        self.cats.push(doc.cats().clone());
    }

    pub fn to_bytes(&self, vocab: &Vocab) -> Result<Vec<u8>> {
        let payload = BundlePayload {
            version: BUNDLE_VERSION,
            attrs: self.attrs.clone(),
            tokens: self.tokens.clone(),
            spaces: self.spaces.clone(),
            lengths: self.lengths.clone(),
            strings: self
                .strings
                .iter()
                .filter(|s| !vocab.strings().contains(s))
                .cloned()
                .collect(),
            cats: self.cats.clone(),
        };

        let raw = bincode::serialize(&payload)
            .map_err(|e| DocBinError::Serialization(e.to_string()))?;
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&raw)
            .map_err(|e| DocBinError::Serialization(e.to_string()))?;
        enc.finish()
            .map_err(|e| DocBinError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with_limit(bytes, MAX_INFLATED_BYTES)
    }

    /// `from_bytes` with an explicit cap on the inflated payload size.
    pub fn from_bytes_with_limit(bytes: &[u8], limit: u64) -> Result<Self> {
        let mut raw = Vec::new();
        ZlibDecoder::new(bytes)
            .take(limit.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|e| DocBinError::Corrupt(format!("zlib: {e}")))?;
        if raw.len() as u64 > limit {
            return Err(DocBinError::Corrupt(format!("inflates past {limit} bytes")));
        }
        let payload: BundlePayload = bincode::deserialize(&raw)
            .map_err(|e| DocBinError::Corrupt(format!("payload: {e}")))?;

        if payload.version != BUNDLE_VERSION {
            return Err(DocBinError::UnsupportedVersion(payload.version));
        }
        if payload.attrs.first() != Some(&Attr::Orth) {
            return Err(DocBinError::Corrupt("ORTH must be the first attribute".into()));
        }

        let n_tokens: usize = payload.lengths.iter().map(|&n| n as usize).sum();
        if payload.spaces.len() != n_tokens {
            return Err(DocBinError::Corrupt(format!(
                "{} space flags for {n_tokens} tokens",
                payload.spaces.len()
            )));
        }
        if payload.tokens.len() != n_tokens * payload.attrs.len() {
            return Err(DocBinError::Corrupt(format!(
                "token table has {} cells, expected {}",
                payload.tokens.len(),
                n_tokens * payload.attrs.len()
            )));
        }
        if payload.cats.len() != payload.lengths.len() {
            return Err(DocBinError::Corrupt(format!(
                "{} category maps for {} docs",
                payload.cats.len(),
                payload.lengths.len()
            )));
        }

        Ok(Self {
            attrs: payload.attrs,
            tokens: payload.tokens,
            spaces: payload.spaces,
            lengths: payload.lengths,
            strings: payload.strings.into_iter().collect(),
            cats: payload.cats,
        })
    }

    /// Rebuild the docs in insertion order.
    pub fn get_docs(&self, vocab: &Vocab) -> Result<Vec<Doc>> {
        let mut local = StringStore::new();
        for s in &self.strings {
            local.add(s);
        }
        let resolve = |h: StrHash| -> Result<Option<String>> {
            if h == 0 {
                return Ok(None);
            }
            local
                .get(h)
                .or_else(|| vocab.strings().get(h))
                .map(|s| Some(s.to_string()))
                .ok_or(DocBinError::UnknownString(h))
        };

        let width = self.attrs.len();
        let mut docs = Vec::with_capacity(self.lengths.len());
        let mut row = 0usize;

        for (len, cats) in self.lengths.iter().zip(&self.cats) {
            let mut tokens = Vec::with_capacity(*len as usize);
            for _ in 0..*len {
                let cells = &self.tokens[row * width..(row + 1) * width];
                let mut tok = Token::new("", self.spaces[row]);
                for (attr, h) in self.attrs.iter().zip(cells) {
                    tok.set_attr(*attr, resolve(*h)?);
                }
                tokens.push(tok);
                row += 1;
            }
            docs.push(Doc::from_parts(vocab.lang(), tokens, cats.clone()));
        }
        Ok(docs)
    }
}
