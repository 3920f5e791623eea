//! Shared vocabulary and string store

use std::collections::HashMap;

use crate::{hash_string, Attr, DocBinError, Result, StrHash};

/// Strings every vocabulary knows up front, besides the attribute names.
/// Bundles do not carry these.
const SYMBOLS: &[&str] = &[
    // universal POS tags
    "ADJ", "ADP", "ADV", "AUX", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON", "PROPN",
    "PUNCT", "SCONJ", "SYM", "VERB", "X", "SPACE",
    // entity labels
    "PERSON", "PER", "NORP", "FAC", "ORG", "GPE", "LOC", "PRODUCT", "EVENT", "WORK_OF_ART", "LAW",
    "LANGUAGE", "DATE", "TIME", "PERCENT", "MONEY", "QUANTITY", "ORDINAL", "CARDINAL", "MISC",
];

#[derive(Clone, Debug, Default)]
pub struct StringStore {
    strings: HashMap<StrHash, String>,
}

impl StringStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, s: &str) -> StrHash {
        let h = hash_string(s);
        if h != 0 {
            self.strings.entry(h).or_insert_with(|| s.to_string());
        }
        h
    }

    pub fn get(&self, hash: StrHash) -> Option<&str> {
        self.strings.get(&hash).map(String::as_str)
    }

    pub fn contains(&self, s: &str) -> bool {
        let h = hash_string(s);
        h == 0 || self.strings.contains_key(&h)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Language vocabulary. Built once, read-only afterwards; pass it by
/// reference to everything that decodes bundles.
#[derive(Clone, Debug)]
pub struct Vocab {
    lang: String,
    strings: StringStore,
}

impl Vocab {
    /// Blank vocabulary for a two-letter ISO-639-1 code ("xx" is
    /// multi-language). The symbol table is the same for every language.
    pub fn blank(lang: &str) -> Result<Self> {
        let code = lang.trim().to_ascii_lowercase();
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(DocBinError::UnsupportedLanguage(lang.to_string()));
        }

        let mut strings = StringStore::new();
        for attr in Attr::ALL {
            strings.add(attr.name());
        }
        for s in SYMBOLS {
            strings.add(s);
        }
        Ok(Self { lang: code, strings })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn strings(&self) -> &StringStore {
        &self.strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_accepts_known_codes() {
        let v = Vocab::blank("EN ").unwrap();
        assert_eq!(v.lang(), "en");
        assert!(v.strings().contains("NOUN"));
        assert!(v.strings().contains("ENT_TYPE"));
        assert!(!v.strings().contains("Berlin"));
    }

    #[test]
    fn test_blank_rejects_unknown_codes() {
        for code in ["", "eng", "e", "e1", "é"] {
            assert!(matches!(Vocab::blank(code), Err(DocBinError::UnsupportedLanguage(_))));
        }
    }

    #[test]
    fn test_blank_accepts_any_iso_code() {
        for code in ["eu", "ga", "ta", "ur", "xx"] {
            assert_eq!(Vocab::blank(code).unwrap().lang(), code);
        }
    }

    #[test]
    fn test_vocabs_are_isolated() {
        let a = Vocab::blank("de").unwrap();
        let b = Vocab::blank("fr").unwrap();
        assert_eq!(a.strings().len(), b.strings().len());
        assert_ne!(a.lang(), b.lang());
    }
}
