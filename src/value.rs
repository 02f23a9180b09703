//! Dynamic GraphQL values.
//!
//! [`ConstValue`] is the host value flowing through resolvers and into the
//! response. [`Value`] is its superset used in argument and directive
//! positions, where a value may still be a variable reference.

use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter, Write},
    ops::Deref,
    sync::Arc,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use serde_json::Number;

/// A cheap, cloneable GraphQL name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl Serialize for Name {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Into::into)
    }
}

/// A fully resolved GraphQL value, for example `1` or `"Hello World!"`.
///
/// [Reference](https://spec.graphql.org/October2021/#Value).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConstValue {
    /// `null`.
    #[default]
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value. These are typically in `SCREAMING_SNAKE_CASE`.
    Enum(Name),
    /// A list of values.
    List(Vec<ConstValue>),
    /// An object. This is a map of keys to values.
    Object(IndexMap<Name, ConstValue>),
}

impl std::hash::Hash for ConstValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ConstValue::Null => 0u8.hash(state),
            ConstValue::Number(number) => {
                1u8.hash(state);
                number.hash(state);
            }
            ConstValue::String(string) => {
                2u8.hash(state);
                string.hash(state);
            }
            ConstValue::Boolean(boolean) => {
                3u8.hash(state);
                boolean.hash(state);
            }
            ConstValue::Enum(name) => {
                4u8.hash(state);
                name.hash(state);
            }
            ConstValue::List(list) => {
                5u8.hash(state);
                list.hash(state);
            }
            ConstValue::Object(object) => {
                6u8.hash(state);
                // `IndexMap`'s `PartialEq` is order-independent, so the hash
                // must combine entries order-independently too.
                let combined = object.iter().fold(0u64, |acc, entry| {
                    let mut hasher = std::collections::hash_map::DefaultHasher::new();
                    entry.hash(&mut hasher);
                    acc ^ std::hash::Hasher::finish(&hasher)
                });
                combined.hash(state);
            }
        }
    }
}

impl ConstValue {
    /// Convert a JSON value into a `ConstValue`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConstValue::Null,
            serde_json::Value::Bool(boolean) => ConstValue::Boolean(boolean),
            serde_json::Value::Number(number) => ConstValue::Number(number),
            serde_json::Value::String(string) => ConstValue::String(string),
            serde_json::Value::Array(list) => {
                ConstValue::List(list.into_iter().map(ConstValue::from_json).collect())
            }
            serde_json::Value::Object(object) => ConstValue::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (Name::from(key), ConstValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert the value into JSON.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            ConstValue::Null => serde_json::Value::Null,
            ConstValue::Number(number) => serde_json::Value::Number(number),
            ConstValue::String(string) => serde_json::Value::String(string),
            ConstValue::Boolean(boolean) => serde_json::Value::Bool(boolean),
            ConstValue::Enum(name) => serde_json::Value::String(name.to_string()),
            ConstValue::List(list) => {
                serde_json::Value::Array(list.into_iter().map(ConstValue::into_json).collect())
            }
            ConstValue::Object(object) => serde_json::Value::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value.into_json()))
                    .collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    /// Look up a key on an object-shaped value.
    pub fn get(&self, key: &str) -> Option<&ConstValue> {
        match self {
            ConstValue::Object(object) => object.get(key),
            _ => None,
        }
    }

    pub(crate) fn kind_str(&self) -> &'static str {
        match self {
            ConstValue::Null => "null",
            ConstValue::Number(_) => "number",
            ConstValue::String(_) => "string",
            ConstValue::Boolean(_) => "boolean",
            ConstValue::Enum(_) => "enum",
            ConstValue::List(_) => "list",
            ConstValue::Object(_) => "object",
        }
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Number(number) => write!(f, "{number}"),
            ConstValue::String(string) => write_quoted(string, f),
            ConstValue::Boolean(boolean) => write!(f, "{boolean}"),
            ConstValue::Enum(name) => f.write_str(name),
            ConstValue::List(list) => write_list(list, f),
            ConstValue::Object(object) => write_object(object, f),
        }
    }
}

impl Serialize for ConstValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConstValue::Null => serializer.serialize_unit(),
            ConstValue::Number(number) => number.serialize(serializer),
            ConstValue::String(string) => serializer.serialize_str(string),
            ConstValue::Boolean(boolean) => serializer.serialize_bool(*boolean),
            ConstValue::Enum(name) => serializer.serialize_str(name),
            ConstValue::List(list) => list.serialize(serializer),
            ConstValue::Object(object) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, value) in object {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConstValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(ConstValue::from_json)
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        ConstValue::Boolean(value)
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        ConstValue::Number(value.into())
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        ConstValue::Number(value.into())
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        ConstValue::String(value.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(value: String) -> Self {
        ConstValue::String(value)
    }
}

impl<T: Into<ConstValue>> From<Vec<T>> for ConstValue {
    fn from(value: Vec<T>) -> Self {
        ConstValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// A GraphQL value as it appears in argument position: a [`ConstValue`] or a
/// variable reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A variable reference, without the `$`.
    Variable(Name),
    /// `null`.
    Null,
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value.
    Enum(Name),
    /// A list of values.
    List(Vec<Value>),
    /// An object of keys to values.
    Object(IndexMap<Name, Value>),
}

impl Value {
    /// Lower into a [`ConstValue`], resolving variable references through `f`.
    pub fn into_const_with<E>(
        self,
        mut f: impl FnMut(&Name) -> Result<ConstValue, E>,
    ) -> Result<ConstValue, E> {
        self.into_const_inner(&mut f)
    }

    fn into_const_inner<E>(
        self,
        f: &mut impl FnMut(&Name) -> Result<ConstValue, E>,
    ) -> Result<ConstValue, E> {
        Ok(match self {
            Value::Variable(name) => f(&name)?,
            Value::Null => ConstValue::Null,
            Value::Number(number) => ConstValue::Number(number),
            Value::String(string) => ConstValue::String(string),
            Value::Boolean(boolean) => ConstValue::Boolean(boolean),
            Value::Enum(name) => ConstValue::Enum(name),
            Value::List(list) => ConstValue::List(
                list.into_iter()
                    .map(|value| value.into_const_inner(f))
                    .collect::<Result<_, E>>()?,
            ),
            Value::Object(object) => ConstValue::Object(
                object
                    .into_iter()
                    .map(|(key, value)| value.into_const_inner(f).map(|value| (key, value)))
                    .collect::<Result<_, E>>()?,
            ),
        })
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        match value {
            ConstValue::Null => Value::Null,
            ConstValue::Number(number) => Value::Number(number),
            ConstValue::String(string) => Value::String(string),
            ConstValue::Boolean(boolean) => Value::Boolean(boolean),
            ConstValue::Enum(name) => Value::Enum(name),
            ConstValue::List(list) => Value::List(list.into_iter().map(Into::into).collect()),
            ConstValue::Object(object) => {
                Value::Object(object.into_iter().map(|(key, value)| (key, value.into())).collect())
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Variable(name) => write!(f, "${name}"),
            Value::Null => f.write_str("null"),
            Value::Number(number) => write!(f, "{number}"),
            Value::String(string) => write_quoted(string, f),
            Value::Boolean(boolean) => write!(f, "{boolean}"),
            Value::Enum(name) => f.write_str(name),
            Value::List(list) => write_list(list, f),
            Value::Object(object) => write_object(object, f),
        }
    }
}

fn write_quoted(string: &str, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('"')?;
    for c in string.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_list<T: Display>(list: &[T], f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('[')?;
    for (index, value) in list.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        value.fmt(f)?;
    }
    f.write_char(']')
}

fn write_object<T: Display>(object: &IndexMap<Name, T>, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('{')?;
    for (index, (key, value)) in object.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    f.write_char('}')
}

/// The coerced variables of a request, keyed by variable name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<Name, ConstValue>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a JSON object into variables; any other JSON value yields an
    /// empty set.
    pub fn from_json(value: serde_json::Value) -> Self {
        match ConstValue::from_json(value) {
            ConstValue::Object(object) => Self(object),
            _ => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConstValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: Name, value: ConstValue) {
        self.0.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &ConstValue)> {
        self.0.iter()
    }
}

impl From<IndexMap<Name, ConstValue>> for Variables {
    fn from(map: IndexMap<Name, ConstValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(Name, ConstValue)> for Variables {
    fn from_iter<I: IntoIterator<Item = (Name, ConstValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn json_round_trip() {
        let json = json!({"a": 1, "b": [true, null], "c": {"d": "x"}});
        let value = ConstValue::from_json(json.clone());
        assert_eq!(value.into_json(), json);
    }

    #[test]
    fn const_value_display() {
        let value = ConstValue::from_json(json!({"a": [1, "two"], "b": null}));
        assert_eq!(value.to_string(), r#"{a: [1, "two"], b: null}"#);
    }

    #[test]
    fn into_const_resolves_variables() {
        let value = Value::Object(
            [
                (Name::new("id"), Value::Variable(Name::new("id"))),
                (Name::new("limit"), Value::Number(10.into())),
            ]
            .into_iter()
            .collect(),
        );
        let resolved = value
            .into_const_with::<Error>(|name| {
                assert_eq!(name.as_str(), "id");
                Ok(ConstValue::from("abc"))
            })
            .unwrap();
        assert_eq!(
            resolved,
            ConstValue::from_json(json!({"id": "abc", "limit": 10}))
        );
    }
}
