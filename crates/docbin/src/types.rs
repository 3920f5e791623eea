//! Document model: tokens, spans and docs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Vocab;

/// Token attribute stored in a bundle column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attr {
    Orth,
    Lemma,
    Pos,
    Tag,
    EntType,
}

impl Attr {
    pub const ALL: [Attr; 5] = [Attr::Orth, Attr::Lemma, Attr::Pos, Attr::Tag, Attr::EntType];

    pub fn name(&self) -> &'static str {
        match self {
            Attr::Orth => "ORTH",
            Attr::Lemma => "LEMMA",
            Attr::Pos => "POS",
            Attr::Tag => "TAG",
            Attr::EntType => "ENT_TYPE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub orth: String,
    /// Followed by a single space in the source text
    pub whitespace: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ent_type: Option<String>,
}

impl Token {
    pub fn new(orth: impl Into<String>, whitespace: bool) -> Self {
        Self {
            orth: orth.into(),
            whitespace,
            lemma: None,
            pos: None,
            tag: None,
            ent_type: None,
        }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_ent_type(mut self, label: impl Into<String>) -> Self {
        self.ent_type = Some(label.into());
        self
    }

    pub fn attr(&self, attr: Attr) -> Option<&str> {
        match attr {
            Attr::Orth => Some(self.orth.as_str()),
            Attr::Lemma => self.lemma.as_deref(),
            Attr::Pos => self.pos.as_deref(),
            Attr::Tag => self.tag.as_deref(),
            Attr::EntType => self.ent_type.as_deref(),
        }
    }

    pub(crate) fn set_attr(&mut self, attr: Attr, value: Option<String>) {
        match attr {
            Attr::Orth => self.orth = value.unwrap_or_default(),
            Attr::Lemma => self.lemma = value,
            Attr::Pos => self.pos = value,
            Attr::Tag => self.tag = value,
            Attr::EntType => self.ent_type = value,
        }
    }
}

/// A run of consecutive tokens sharing one entity label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Span {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// A reconstructed document.
#[derive(Clone, Debug, PartialEq)]
pub struct Doc {
    lang: String,
    tokens: Vec<Token>,
    cats: BTreeMap<String, f64>,
}

impl Doc {
    pub fn new(vocab: &Vocab, tokens: Vec<Token>) -> Self {
        Self {
            lang: vocab.lang().to_string(),
            tokens,
            cats: BTreeMap::new(),
        }
    }

    /// Tokenize on single spaces. Runs of spaces become standalone `" "`
    /// tokens so that `text()` reproduces the input exactly.
    pub fn from_text(vocab: &Vocab, text: &str) -> Self {
        let pieces: Vec<&str> = text.split(' ').collect();
        let last = pieces.len() - 1;
        let mut tokens = Vec::with_capacity(pieces.len());
        for (i, piece) in pieces.into_iter().enumerate() {
            if piece.is_empty() {
                if i != last {
                    tokens.push(Token::new(" ", false));
                }
                continue;
            }
            tokens.push(Token::new(piece, i != last));
        }
        Self::new(vocab, tokens)
    }

    pub fn with_cats(mut self, cats: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.cats.extend(cats);
        self
    }

    pub(crate) fn from_parts(lang: &str, tokens: Vec<Token>, cats: BTreeMap<String, f64>) -> Self {
        Self {
            lang: lang.to_string(),
            tokens,
            cats,
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn cats(&self) -> &BTreeMap<String, f64> {
        &self.cats
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens {
            out.push_str(&t.orth);
            if t.whitespace {
                out.push(' ');
            }
        }
        out
    }

    pub fn ents(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let mut open: Option<(String, usize)> = None;

        for (i, tok) in self.tokens.iter().enumerate() {
            let label = tok.ent_type.as_deref();
            let continues = matches!((&open, label), (Some((cur, _)), Some(l)) if cur == l);
            if continues {
                continue;
            }
            if let Some((cur, start)) = open.take() {
                spans.push(self.span(cur, start, i));
            }
            if let Some(l) = label {
                open = Some((l.to_string(), i));
            }
        }
        if let Some((cur, start)) = open {
            spans.push(self.span(cur, start, self.tokens.len()));
        }
        spans
    }

    fn span(&self, label: String, start: usize, end: usize) -> Span {
        let mut text = String::new();
        for (i, t) in self.tokens[start..end].iter().enumerate() {
            text.push_str(&t.orth);
            if t.whitespace && start + i + 1 < end {
                text.push(' ');
            }
        }
        Span { label, start, end, text }
    }

    /// JSON view handed to out-of-process calculators.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "lang": self.lang,
            "text": self.text(),
            "tokens": self.tokens,
            "ents": self.ents(),
            "cats": self.cats,
        })
    }
}
