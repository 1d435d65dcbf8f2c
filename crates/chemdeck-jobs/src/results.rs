//! Result records, result sets and the table view derived from them.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Trailing column appended to every rendered result table.
pub const ACTIONS_COLUMN: &str = "Actions";

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value; arrays and objects are kept as compact JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Text(String::new()),
            Value::Bool(b) => Scalar::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Integer(i),
                None => Scalar::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Scalar::Text(s),
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar { fn from(v: &str) -> Self { Scalar::Text(v.to_string()) } }
impl From<String> for Scalar { fn from(v: String) -> Self { Scalar::Text(v) } }
impl From<i64> for Scalar { fn from(v: i64) -> Self { Scalar::Integer(v) } }
impl From<i32> for Scalar { fn from(v: i32) -> Self { Scalar::Integer(v.into()) } }
impl From<u32> for Scalar { fn from(v: u32) -> Self { Scalar::Integer(v.into()) } }
impl From<f64> for Scalar { fn from(v: f64) -> Self { Scalar::Number(v) } }
impl From<bool> for Scalar { fn from(v: bool) -> Self { Scalar::Bool(v) } }

/// One row of output: field name to scalar, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    fields: Vec<(String, Scalar)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Re-using a key replaces its value in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .map(|(k, v)| (k, Scalar::from_json(v)))
            .collect();
        Self { fields }
    }

    fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        keys
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A record whose key set differs from the first record of its set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {index} has fields {found:?}, expected {expected:?}")]
pub struct RecordShapeError {
    pub index: usize,
    pub expected: Vec<String>,
    pub found: Vec<String>,
}

/// An ordered, immutable sequence of records sharing one key set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    columns: Vec<String>,
    records: Vec<ResultRecord>,
}

impl ResultSet {
    /// Build a set, rejecting any record whose keys differ from the first record's.
    pub fn new(records: Vec<ResultRecord>) -> Result<Self, RecordShapeError> {
        let columns: Vec<String> = records
            .first()
            .map(|r| r.keys().map(str::to_string).collect())
            .unwrap_or_default();

        if let Some(first) = records.first() {
            let expected = first.sorted_keys();
            for (index, record) in records.iter().enumerate().skip(1) {
                let found = record.sorted_keys();
                if found != expected {
                    return Err(RecordShapeError {
                        index,
                        expected: expected.iter().map(|s| s.to_string()).collect(),
                        found: found.iter().map(|s| s.to_string()).collect(),
                    });
                }
            }
        }

        Ok(Self { columns, records })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names, taken from the first record's keys.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A record's values ordered by `columns()`.
    pub fn row_values<'a>(&'a self, record: &'a ResultRecord) -> Vec<&'a Scalar> {
        self.columns.iter().filter_map(|c| record.get(c)).collect()
    }
}

// ── View ──────────────────────────────────────────────────────────────────────

/// Inert per-row affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Download,
    View,
}

impl RowAction {
    pub const ALL: [RowAction; 2] = [RowAction::Download, RowAction::View];

    pub fn label(&self) -> &'static str {
        match self {
            RowAction::Download => "Download",
            RowAction::View => "View",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

/// What the result area should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultDisplay {
    Spinner,
    Nothing,
    Collapsed { records: usize },
    Table { columns: Vec<String>, rows: Vec<TableRow> },
}

/// Display-only state of the result area. Never owns or mutates results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultView {
    visible: bool,
}

impl Default for ResultView {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl ResultView {
    pub fn is_visible(&self) -> bool { self.visible }
    pub fn show(&mut self) { self.visible = true; }
    pub fn hide(&mut self) { self.visible = false; }

    /// Flip visibility and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn display(&self, result: Option<&ResultSet>, loading: bool) -> ResultDisplay {
        if loading {
            return ResultDisplay::Spinner;
        }
        let Some(result) = result.filter(|r| !r.is_empty()) else {
            return ResultDisplay::Nothing;
        };
        if !self.visible {
            return ResultDisplay::Collapsed { records: result.len() };
        }

        let mut columns = result.columns().to_vec();
        columns.push(ACTIONS_COLUMN.to_string());
        let rows = result
            .records()
            .iter()
            .map(|record| TableRow {
                cells: result.row_values(record).iter().map(|v| v.to_string()).collect(),
                actions: RowAction::ALL.to_vec(),
            })
            .collect();

        ResultDisplay::Table { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn poses() -> ResultSet {
        ResultSet::new(vec![
            ResultRecord::new().with("pose", 1).with("affinity", -9.2).with("rmsd", 0.0),
            ResultRecord::new().with("rmsd", 1.84).with("pose", 2).with("affinity", -8.7),
        ])
        .unwrap()
    }

    #[test]
    fn test_columns_follow_first_record() {
        let set = poses();
        assert_eq!(set.columns(), &["pose", "affinity", "rmsd"]);
        for record in set.records() {
            let mut keys: Vec<&str> = record.keys().collect();
            keys.sort_unstable();
            let mut columns: Vec<&str> = set.columns().iter().map(String::as_str).collect();
            columns.sort_unstable();
            assert_eq!(keys, columns);
        }
        let second = &set.records()[1];
        let values: Vec<String> = set.row_values(second).iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["2", "-8.7", "1.84"]);
    }

    #[test]
    fn test_mismatched_keys_rejected() {
        let err = ResultSet::new(vec![
            ResultRecord::new().with("id", "MOL-1").with("score", 0.9),
            ResultRecord::new().with("id", "MOL-2").with("similarity", 0.8),
        ])
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.expected, vec!["id".to_string(), "score".to_string()]);
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let record = ResultRecord::new().with("id", "a").with("id", "b");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("id"), Some(&Scalar::from("b")));
    }

    #[test]
    fn test_display_spinner_nothing_table() {
        let view = ResultView::default();
        let set = poses();
        assert_eq!(view.display(Some(&set), true), ResultDisplay::Spinner);
        assert_eq!(view.display(None, false), ResultDisplay::Nothing);
        assert_eq!(view.display(Some(&ResultSet::empty()), false), ResultDisplay::Nothing);

        match view.display(Some(&set), false) {
            ResultDisplay::Table { columns, rows } => {
                assert_eq!(columns, vec!["pose", "affinity", "rmsd", ACTIONS_COLUMN]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].cells, vec!["1", "-9.2", "0"]);
                assert_eq!(rows[0].actions, vec![RowAction::Download, RowAction::View]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_toggle_is_idempotent_and_leaves_data_alone() {
        let set = poses();
        let before = set.clone();
        let mut view = ResultView::default();
        let shown = view.display(Some(&set), false);

        assert!(!view.toggle());
        assert_eq!(view.display(Some(&set), false), ResultDisplay::Collapsed { records: 2 });
        assert!(view.toggle());

        assert_eq!(view, ResultView::default());
        assert_eq!(view.display(Some(&set), false), shown);
        assert_eq!(set, before);
    }

    #[test]
    fn test_record_serializes_in_insertion_order() {
        let record = ResultRecord::new().with("z", 1).with("a", "x").with("ok", true);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"z":1,"a":"x","ok":true}"#);
    }

    #[test]
    fn test_scalar_from_json() {
        assert_eq!(Scalar::from_json(serde_json::json!(3)), Scalar::Integer(3));
        assert_eq!(Scalar::from_json(serde_json::json!(0.5)), Scalar::Number(0.5));
        assert_eq!(Scalar::from_json(serde_json::json!(null)), Scalar::Text(String::new()));
        assert_eq!(Scalar::from_json(serde_json::json!([1, 2])), Scalar::Text("[1,2]".into()));
    }
}
