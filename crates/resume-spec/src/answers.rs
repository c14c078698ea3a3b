use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One completed entry of a multi-entry block, keyed by step id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step: &str) -> Option<&str> {
        self.0.get(step).map(String::as_str)
    }

    /// Returns the trimmed value of `step` when it is non-empty.
    pub fn non_empty(&self, step: &str) -> Option<&str> {
        self.get(step).map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn insert(&mut self, step: impl Into<String>, value: impl Into<String>) {
        self.0.insert(step.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Item of a list-valued answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Entry {
    Line(String),
    Record(Record),
}

impl Entry {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entry::Record(record) => Some(record),
            Entry::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&str> {
        match self {
            Entry::Line(line) => Some(line),
            Entry::Record(_) => None,
        }
    }
}

/// Value stored for a single question.
///
/// Images are kept as `data:` URI text so the whole set stays plain JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<Entry>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Entry]> {
        match self {
            AnswerValue::List(entries) => Some(entries),
            AnswerValue::Text(_) => None,
        }
    }

    /// Empty strings (after trimming) and empty lists count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::List(entries) => entries.is_empty(),
        }
    }
}

/// Complete collected input keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.0.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(AnswerValue::as_text)
    }

    /// Trimmed text answer, `None` when absent or blank.
    pub fn non_empty_text(&self, id: &str) -> Option<&str> {
        self.text(id).map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn set_text(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), AnswerValue::Text(value.into()));
    }

    pub fn list(&self, id: &str) -> &[Entry] {
        self.get(id).and_then(AnswerValue::as_list).unwrap_or(&[])
    }

    /// Creates an empty list for `id` when the field is absent. Legacy text
    /// answers become one line entry per non-blank line.
    pub fn ensure_list(&mut self, id: &str) {
        self.edit_list(id, |_| ());
    }

    pub fn push_entry(&mut self, id: &str, entry: Entry) {
        self.edit_list(id, |entries| entries.push(entry));
    }

    pub fn pop_entry(&mut self, id: &str) -> Option<Entry> {
        if !self.0.contains_key(id) {
            return None;
        }
        self.edit_list(id, Vec::pop)
    }

    fn edit_list<T>(&mut self, id: &str, edit: impl FnOnce(&mut Vec<Entry>) -> T) -> T {
        let mut entries = match self.0.remove(id) {
            Some(AnswerValue::List(entries)) => entries,
            Some(AnswerValue::Text(text)) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Entry::Line(line.to_string()))
                .collect(),
            None => Vec::new(),
        };
        let result = edit(&mut entries);
        self.0.insert(id.to_string(), AnswerValue::List(entries));
        result
    }

    pub fn records(&self, id: &str) -> impl Iterator<Item = &Record> {
        self.list(id).iter().filter_map(Entry::as_record)
    }

    pub fn lines(&self, id: &str) -> impl Iterator<Item = &str> {
        self.list(id).iter().filter_map(Entry::as_line)
    }

    pub fn has_value(&self, id: &str) -> bool {
        self.get(id).map(|value| !value.is_empty()).unwrap_or(false)
    }

    pub fn remove(&mut self, id: &str) -> Option<AnswerValue> {
        self.0.remove(id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}
