//! Raw records and their decoded form

use std::collections::BTreeMap;

use docbin::{Doc, DocBin, Vocab};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{AcError, Result};

/// Prefix every `bytes` payload must carry (a literal backslash + `x`).
pub const HEX_MARKER: &str = "\\x";

/// Raw fields that are consumed by decoding and never passed through.
pub const RESERVED_FIELDS: [&str; 3] = ["record_id", "bytes", "columns"];

/// One record as it appears in a batch file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub record_id: String,
    pub bytes: String,
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
}

impl RawRecord {
    /// Encode `docs` as a bundle under `columns`.
    pub fn encode(
        record_id: impl Into<String>,
        columns: Vec<String>,
        docs: &[Doc],
        vocab: &Vocab,
    ) -> Result<Self> {
        let mut bin = DocBin::default();
        for d in docs {
            bin.add(d);
        }
        let blob = bin
            .to_bytes(vocab)
            .map_err(|e| AcError::Format(format!("document bundle: {e}")))?;

        Ok(Self {
            record_id: record_id.into(),
            bytes: format!("{HEX_MARKER}{}", hex::encode(blob)),
            columns,
            extra: BTreeMap::new(),
        })
    }

    pub fn with_field(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Doc(Doc),
    Scalar(JsonValue),
}

/// Named fields of one decoded record: a doc per column plus passthrough
/// scalars.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordData {
    fields: BTreeMap<String, Field>,
}

impl RecordData {
    pub fn doc(&self, name: &str) -> Option<&Doc> {
        match self.fields.get(name) {
            Some(Field::Doc(d)) => Some(d),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&JsonValue> {
        match self.fields.get(name) {
            Some(Field::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// Text of a doc field, or the value of a string scalar.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Field::Doc(d) => Some(d.text()),
            Field::Scalar(JsonValue::String(s)) => Some(s.clone()),
            Field::Scalar(_) => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, field: Field) {
        self.fields.insert(name.into(), field);
    }

    /// JSON object with docs rendered through `Doc::to_json`.
    pub fn to_json(&self) -> JsonValue {
        let obj = self
            .fields
            .iter()
            .map(|(k, f)| {
                let v = match f {
                    Field::Doc(d) => d.to_json(),
                    Field::Scalar(v) => v.clone(),
                };
                (k.clone(), v)
            })
            .collect();
        JsonValue::Object(obj)
    }
}

/// Turns raw records into `RecordData` using one shared vocabulary.
#[derive(Clone, Copy)]
pub struct RecordDecoder<'v> {
    vocab: &'v Vocab,
}

impl<'v> RecordDecoder<'v> {
    pub fn new(vocab: &'v Vocab) -> Self {
        Self { vocab }
    }

    pub fn decode(&self, raw: RawRecord) -> Result<RecordData> {
        let id = &raw.record_id;

        let hex_payload = raw.bytes.strip_prefix(HEX_MARKER).ok_or_else(|| {
            AcError::Format(format!(
                "record {id}: unknown byte encoding in document bundle (expected {HEX_MARKER} prefix)"
            ))
        })?;
        let blob = hex::decode(hex_payload)
            .map_err(|e| AcError::Format(format!("record {id}: invalid hex payload: {e}")))?;

        let docs = DocBin::from_bytes(&blob)
            .and_then(|bin| bin.get_docs(self.vocab))
            .map_err(|e| AcError::Format(format!("record {id}: document bundle: {e}")))?;

        if docs.len() != raw.columns.len() {
            return Err(AcError::Format(format!(
                "record {id}: {} columns for {} documents",
                raw.columns.len(),
                docs.len()
            )));
        }

        let mut data = RecordData::default();
        for (col, doc) in raw.columns.into_iter().zip(docs) {
            data.insert(col, Field::Doc(doc));
        }
        // Scalars are written last and win on a name clash with a column.
        for (key, value) in raw.extra {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            data.insert(key, Field::Scalar(value));
        }
        Ok(data)
    }
}
