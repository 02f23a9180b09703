//! The result tree produced by execution.
//!
//! [`ResponseMap`] is an ordered key→value container with a fixed shape:
//! its key set is decided at construction (the included response keys of
//! the owning plan node, in plan order) and never changes afterwards.
//! Entries can only be replaced through [`ResponseMap::update`].

use std::fmt::{self, Display, Formatter, Write};

use serde::Serialize;

use crate::{
    error::Error,
    value::{ConstValue, Name, Number},
};

/// One node of the result tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResponseValue {
    /// `null`.
    #[default]
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value, rendered as its name.
    Enum(Name),
    /// A list of values, in completion input order.
    List(Vec<ResponseValue>),
    /// An object result.
    Object(ResponseMap),
}

impl ResponseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResponseValue::Null)
    }

    /// Convert the value into JSON.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            ResponseValue::Null => serde_json::Value::Null,
            ResponseValue::Number(number) => serde_json::Value::Number(number),
            ResponseValue::String(string) => serde_json::Value::String(string),
            ResponseValue::Boolean(boolean) => serde_json::Value::Bool(boolean),
            ResponseValue::Enum(name) => serde_json::Value::String(name.to_string()),
            ResponseValue::List(list) => {
                serde_json::Value::Array(list.into_iter().map(ResponseValue::into_json).collect())
            }
            ResponseValue::Object(map) => map.into_json(),
        }
    }
}

impl From<ConstValue> for ResponseValue {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Null => ResponseValue::Null,
            ConstValue::Number(number) => ResponseValue::Number(number),
            ConstValue::String(string) => ResponseValue::String(string),
            ConstValue::Boolean(boolean) => ResponseValue::Boolean(boolean),
            ConstValue::Enum(name) => ResponseValue::Enum(name),
            ConstValue::List(list) => {
                ResponseValue::List(list.into_iter().map(Into::into).collect())
            }
            ConstValue::Object(object) => ResponseValue::Object(ResponseMap::from_pairs(
                object.into_iter().map(|(key, value)| (key, value.into())),
            )),
        }
    }
}

impl From<ResponseMap> for ResponseValue {
    fn from(map: ResponseMap) -> Self {
        ResponseValue::Object(map)
    }
}

impl Display for ResponseValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResponseValue::Null => f.write_str("null"),
            ResponseValue::Number(number) => write!(f, "{number}"),
            ResponseValue::String(string) => {
                f.write_char('"')?;
                for c in string.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => f.write_char(c)?,
                    }
                }
                f.write_char('"')
            }
            ResponseValue::Boolean(boolean) => write!(f, "{boolean}"),
            ResponseValue::Enum(name) => f.write_str(name),
            ResponseValue::List(list) => {
                if list.is_empty() {
                    return f.write_str("[]");
                }
                f.write_str("[ ")?;
                for (index, value) in list.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    value.fmt(f)?;
                }
                f.write_str(" ]")
            }
            ResponseValue::Object(map) => map.fmt(f),
        }
    }
}

/// An ordered, fixed-shape object result.
///
/// Equality is structural: nested maps are compared recursively, lists
/// pair-wise, scalars by value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResponseMap(Vec<(Name, ResponseValue)>);

impl ResponseMap {
    /// Build a map from key/value pairs. On duplicate keys the first
    /// occurrence wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Name, ResponseValue)>) -> Self {
        let mut entries: Vec<(Name, ResponseValue)> = Vec::new();
        for (key, value) in pairs {
            if !entries.iter().any(|(existing, _)| *existing == key) {
                entries.push((key, value));
            }
        }
        Self(entries)
    }

    /// Build a map from keys alone; every value starts out `null`.
    pub fn from_keys(keys: impl IntoIterator<Item = Name>) -> Self {
        Self::from_pairs(keys.into_iter().map(|key| (key, ResponseValue::Null)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(existing, _)| existing.as_str() == key)
    }

    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing.as_str() == key)
            .map(|(_, value)| value)
    }

    /// Replace the value of an existing key. The shape is fixed: updating a
    /// key that is not present fails.
    pub fn update(&mut self, key: &str, value: ResponseValue) -> Result<(), Error> {
        match self.0.iter_mut().find(|(existing, _)| existing.as_str() == key) {
            Some((_, slot)) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::new(format!("key '{key}' is not present in the result map"))),
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &ResponseValue)> {
        self.0.iter().map(|(key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.iter().map(|(key, _)| key)
    }

    /// Convert the map into a JSON object, preserving key order.
    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.into_json()))
                .collect(),
        )
    }
}

impl IntoIterator for ResponseMap {
    type Item = (Name, ResponseValue);
    type IntoIter = std::vec::IntoIter<(Name, ResponseValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for ResponseMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str(" }")
    }
}

impl Serialize for ResponseMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

impl Serialize for ResponseValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseValue::Null => serializer.serialize_unit(),
            ResponseValue::Number(number) => number.serialize(serializer),
            ResponseValue::String(string) => serializer.serialize_str(string),
            ResponseValue::Boolean(boolean) => serializer.serialize_bool(*boolean),
            ResponseValue::Enum(name) => serializer.serialize_str(name),
            ResponseValue::List(list) => list.serialize(serializer),
            ResponseValue::Object(map) => map.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s)
    }

    #[test]
    fn first_occurrence_wins_on_duplicate_keys() {
        let map = ResponseMap::from_pairs([
            (name("a"), ResponseValue::Boolean(true)),
            (name("a"), ResponseValue::Boolean(false)),
            (name("b"), ResponseValue::Null),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&ResponseValue::Boolean(true)));
    }

    #[test]
    fn from_keys_initialises_null() {
        let map = ResponseMap::from_keys([name("a"), name("b")]);
        assert_eq!(map.get("a"), Some(&ResponseValue::Null));
        assert_eq!(map.get("b"), Some(&ResponseValue::Null));
    }

    #[test]
    fn update_rejects_unknown_keys() {
        let mut map = ResponseMap::from_keys([name("a")]);
        map.update("a", ResponseValue::String("ok".into())).unwrap();
        assert!(map.update("b", ResponseValue::Null).is_err());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn equality_is_structural() {
        let build = || {
            ResponseMap::from_pairs([
                (
                    name("user"),
                    ResponseValue::Object(ResponseMap::from_pairs([(
                        name("id"),
                        ResponseValue::Number(1.into()),
                    )])),
                ),
                (
                    name("tags"),
                    ResponseValue::List(vec![
                        ResponseValue::String("a".into()),
                        ResponseValue::String("b".into()),
                    ]),
                ),
            ])
        };
        let mut left = build();
        let right = build();
        assert_eq!(left, right);

        left.update("tags", ResponseValue::List(vec![ResponseValue::Null]))
            .unwrap();
        assert_ne!(left, right);
        left.update(
            "tags",
            ResponseValue::List(vec![
                ResponseValue::String("a".into()),
                ResponseValue::String("b".into()),
            ]),
        )
        .unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn display_is_deterministic() {
        let map = ResponseMap::from_pairs([
            (name("hello"), ResponseValue::String("world".into())),
            (
                name("xs"),
                ResponseValue::List(vec![
                    ResponseValue::Number(1.into()),
                    ResponseValue::Null,
                ]),
            ),
            (name("nested"), ResponseValue::Object(ResponseMap::from_keys([name("a")]))),
        ]);
        assert_eq!(
            map.to_string(),
            r#"{ hello: "world", xs: [ 1, null ], nested: { a: null } }"#
        );
    }
}
