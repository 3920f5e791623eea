use anyhow::{Context, Result};
use attrcalc::{AttrValue, AttributeCalculator, DataType, RecordData};
use clap::ValueEnum;
use docbin::Doc;

/// Calculators that ship with the runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Builtin {
    /// Number of characters in the field's text
    CharCount,
    /// Number of tokens in the field's doc
    TokenCount,
    /// Field text in upper case
    Upper,
    /// Field text in lower case
    Lower,
    /// Whether the doc has any entity span
    HasEntities,
    /// Entity labels in document order
    EntityLabels,
    /// Token texts, whitespace tokens skipped
    TokenList,
    /// Mean token length in characters, null for an empty doc
    AvgTokenLen,
}

impl Builtin {
    /// Data type this calculator's output naturally conforms to.
    pub fn natural_type(&self) -> DataType {
        match self {
            Builtin::CharCount | Builtin::TokenCount => DataType::Integer,
            Builtin::Upper | Builtin::Lower => DataType::Text,
            Builtin::HasEntities => DataType::Boolean,
            Builtin::EntityLabels | Builtin::TokenList => DataType::EmbeddingList,
            Builtin::AvgTokenLen => DataType::Float,
        }
    }
}

pub struct BuiltinCalculator {
    kind: Builtin,
    field: String,
}

impl BuiltinCalculator {
    pub fn new(kind: Builtin, field: impl Into<String>) -> Self {
        Self { kind, field: field.into() }
    }

    fn text(&self, data: &RecordData) -> Result<String> {
        data.text(&self.field)
            .with_context(|| format!("field {:?} is missing or not text", self.field))
    }

    fn doc<'d>(&self, data: &'d RecordData) -> Result<&'d Doc> {
        data.doc(&self.field)
            .with_context(|| format!("field {:?} is missing or not a document", self.field))
    }
}

impl AttributeCalculator for BuiltinCalculator {
    fn calculate(&mut self, data: &RecordData) -> Result<AttrValue> {
        let value: AttrValue = match self.kind {
            Builtin::CharCount => self.text(data)?.chars().count().into(),
            Builtin::TokenCount => self.doc(data)?.len().into(),
            Builtin::Upper => self.text(data)?.to_uppercase().into(),
            Builtin::Lower => self.text(data)?.to_lowercase().into(),
            Builtin::HasEntities => (!self.doc(data)?.ents().is_empty()).into(),
            Builtin::EntityLabels => {
                let labels: Vec<String> = self.doc(data)?.ents().into_iter().map(|s| s.label).collect();
                labels.into()
            }
            Builtin::TokenList => {
                let words: Vec<&str> = word_tokens(self.doc(data)?).collect();
                words.into()
            }
            Builtin::AvgTokenLen => {
                let lens: Vec<usize> = word_tokens(self.doc(data)?).map(|w| w.chars().count()).collect();
                if lens.is_empty() {
                    AttrValue::Null
                } else {
                    AttrValue::Float(lens.iter().sum::<usize>() as f64 / lens.len() as f64)
                }
            }
        };
        Ok(value)
    }
}

fn word_tokens(doc: &Doc) -> impl Iterator<Item = &str> {
    doc.tokens()
        .iter()
        .map(|t| t.orth.as_str())
        .filter(|o| !o.trim().is_empty())
}
