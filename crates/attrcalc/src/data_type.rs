//! Declared data types and the value checks attached to them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AcError, AttrValue, Result, ValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Integer,
    Float,
    Boolean,
    Category,
    Text,
    EmbeddingList,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::Category,
        DataType::Text,
        DataType::EmbeddingList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Boolean => "BOOLEAN",
            DataType::Category => "CATEGORY",
            DataType::Text => "TEXT",
            DataType::EmbeddingList => "EMBEDDING_LIST",
        }
    }

    /// Value kinds that may pass the check for this type.
    pub fn accepted_kinds(&self) -> &'static [ValueKind] {
        match self {
            DataType::Integer => &[ValueKind::Int, ValueKind::Null],
            DataType::Float => &[ValueKind::Int, ValueKind::Float, ValueKind::Null],
            DataType::Boolean => &[ValueKind::Bool],
            DataType::Category | DataType::Text => &[ValueKind::Str],
            DataType::EmbeddingList => &[ValueKind::List],
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = AcError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AcError::Config(format!("Unknown data type: {s}")))
    }
}

/// Predicate for one declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeCheck {
    data_type: DataType,
}

impl TypeCheck {
    pub fn new(data_type: DataType) -> Self {
        Self { data_type }
    }

    /// Fails with `AcError::Config` for names outside the enumeration.
    pub fn for_name(name: &str) -> Result<Self> {
        name.parse().map(Self::new)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn accepted(&self) -> &'static [ValueKind] {
        self.data_type.accepted_kinds()
    }

    /// `Ok(false)` on a shape mismatch. `Err(StructuralViolation)` when the
    /// shape fits but the value is forbidden outright (empty category).
    pub fn check(&self, value: &AttrValue) -> Result<bool> {
        let ok = match (self.data_type, value) {
            (DataType::Integer, AttrValue::Int(_) | AttrValue::Null) => true,
            (DataType::Float, AttrValue::Int(_) | AttrValue::Float(_) | AttrValue::Null) => true,
            (DataType::Boolean, AttrValue::Bool(_)) => true,
            (DataType::Category, AttrValue::Str(s)) => {
                if s.is_empty() {
                    return Err(AcError::StructuralViolation(
                        "Category cannot be empty string".into(),
                    ));
                }
                true
            }
            (DataType::Text, AttrValue::Str(_)) => true,
            (DataType::EmbeddingList, AttrValue::List(items)) => items
                .iter()
                .all(|item| matches!(item, AttrValue::Str(s) if !s.is_empty())),
            _ => false,
        };
        Ok(ok)
    }

    /// Error describing why `value` failed the check for `record_id`.
    pub fn mismatch(&self, record_id: &str, value: &AttrValue) -> AcError {
        AcError::Validation {
            record_id: record_id.to_string(),
            value: value.to_string(),
            kind: value.kind(),
            data_type: self.data_type,
            expected: self.expected(),
        }
    }

    fn expected(&self) -> String {
        let kinds = self.accepted();
        if kinds.len() == 1 {
            return kinds[0].to_string();
        }
        let names: Vec<&str> = kinds.iter().map(ValueKind::as_str).collect();
        format!("[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(t: DataType, v: impl Into<AttrValue>) -> Result<bool> {
        TypeCheck::new(t).check(&v.into())
    }

    #[test]
    fn test_parse_every_declared_type() {
        for t in DataType::ALL {
            assert_eq!(t.as_str().parse::<DataType>().unwrap(), t);
        }
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        for name in ["DATE", "integer", "", "EMBEDDING"] {
            assert!(matches!(TypeCheck::for_name(name), Err(AcError::Config(_))), "{name}");
        }
    }

    #[test]
    fn test_integer_is_nullable() {
        assert!(check(DataType::Integer, 7).unwrap());
        assert!(check(DataType::Integer, AttrValue::Null).unwrap());
        assert!(!check(DataType::Integer, 7.0).unwrap());
        assert!(!check(DataType::Integer, true).unwrap());
        assert!(!check(DataType::Integer, "7").unwrap());
    }

    #[test]
    fn test_float_accepts_ints_and_null() {
        assert!(check(DataType::Float, 1).unwrap());
        assert!(check(DataType::Float, 0.25).unwrap());
        assert!(check(DataType::Float, AttrValue::Null).unwrap());
        assert!(!check(DataType::Float, false).unwrap());
        assert!(!check(DataType::Float, "0.25").unwrap());
    }

    #[test]
    fn test_boolean_is_strict() {
        assert!(check(DataType::Boolean, true).unwrap());
        assert!(check(DataType::Boolean, false).unwrap());
        assert!(!check(DataType::Boolean, 1).unwrap());
        assert!(!check(DataType::Boolean, 0).unwrap());
        assert!(!check(DataType::Boolean, AttrValue::Null).unwrap());
    }

    #[test]
    fn test_category_rules() {
        assert!(check(DataType::Category, "x").unwrap());
        assert!(!check(DataType::Category, 5).unwrap());
        assert!(!check(DataType::Category, AttrValue::Null).unwrap());
        assert!(matches!(
            check(DataType::Category, ""),
            Err(AcError::StructuralViolation(_))
        ));
    }

    #[test]
    fn test_text_allows_empty() {
        assert!(check(DataType::Text, "").unwrap());
        assert!(check(DataType::Text, "words").unwrap());
        assert!(!check(DataType::Text, vec!["words"]).unwrap());
    }

    #[test]
    fn test_embedding_list_rules() {
        assert!(check(DataType::EmbeddingList, vec!["a", "b"]).unwrap());
        assert!(check(DataType::EmbeddingList, Vec::<String>::new()).unwrap());
        assert!(!check(DataType::EmbeddingList, vec!["a", ""]).unwrap());
        assert!(!check(DataType::EmbeddingList, "a").unwrap());
        assert!(!check(DataType::EmbeddingList, vec![1, 2]).unwrap());
    }

    #[test]
    fn test_mismatch_names_value_kind_and_expectation() {
        let err = TypeCheck::new(DataType::Float).mismatch("r-1", &AttrValue::from("abc"));
        let msg = err.to_string();
        assert!(msg.contains("`\"abc\"`"), "{msg}");
        assert!(msg.contains("type str"), "{msg}");
        assert!(msg.contains("[int, float, null]"), "{msg}");

        let msg = TypeCheck::new(DataType::Boolean).mismatch("r-2", &AttrValue::Int(1)).to_string();
        assert!(msg.contains("requires bool"), "{msg}");
    }
}
