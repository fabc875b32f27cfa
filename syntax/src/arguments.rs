//! Per-invocation argument maps.
//!
//! [`RawArguments`] is what the matcher extracts from a message;
//! [`ValidatedArguments`] is what [`check`](crate::check) produces from it.
//! Both are keyed by argument id and owned by a single invocation.

use std::collections::BTreeMap;

use command_manual_core::{ArgumentValue, SubcommandManual};
use serde::{Deserialize, Serialize};

/// Raw argument text keyed by argument id; `None` means not supplied.
///
/// # Examples
///
/// ```
/// use command_manual_syntax::RawArguments;
///
/// let raw = RawArguments::new().with("name", "Jump One").with_absent("user");
/// assert_eq!(raw.get("name"), Some("Jump One"));
/// assert_eq!(raw.get("user"), None);
/// assert_eq!(raw.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawArguments(BTreeMap<String, Option<String>>);

impl RawArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// One absent entry per argument declared by `manual`.
    pub fn for_manual(manual: &SubcommandManual) -> Self {
        Self(
            manual
                .arguments
                .iter()
                .map(|a| (a.id.clone(), None))
                .collect(),
        )
    }

    pub fn set(&mut self, id: &str, value: impl Into<String>) {
        self.0.insert(id.to_string(), Some(value.into()));
    }

    pub fn set_absent(&mut self, id: &str) {
        self.0.insert(id.to_string(), None);
    }

    pub fn with(mut self, id: &str, value: impl Into<String>) -> Self {
        self.set(id, value);
        self
    }

    pub fn with_absent(mut self, id: &str) -> Self {
        self.set_absent(id);
        self
    }

    /// Supplied text for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).and_then(|v| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized argument values keyed by argument id.
///
/// Holds exactly one entry per declared argument; optional arguments that
/// were not supplied map to `None` (serialized as `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedArguments(BTreeMap<String, Option<ArgumentValue>>);

impl ValidatedArguments {
    pub(crate) fn insert(&mut self, id: &str, value: Option<ArgumentValue>) {
        self.0.insert(id.to_string(), value);
    }

    pub fn get(&self, id: &str) -> Option<&ArgumentValue> {
        self.0.get(id).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn is_provided(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(ArgumentValue::as_str)
    }

    pub fn integer(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(ArgumentValue::as_i64)
    }

    pub fn boolean(&self, id: &str) -> Option<bool> {
        self.get(id).and_then(ArgumentValue::as_bool)
    }

    pub fn snowflake(&self, id: &str) -> Option<u64> {
        self.get(id).and_then(ArgumentValue::as_snowflake)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ArgumentValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
