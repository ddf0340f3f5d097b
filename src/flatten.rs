//! Flattening of aggregate query results into a rectangular table.
//!
//! The aggregates API answers with `results → data → metrics → stats`, where every group may
//! carry a different subset of metrics and stat keys. Flattening runs in two passes: the
//! column set is discovered across all groups first, then one row per group is emitted against
//! that fixed column set, with blanks where a group lacks a metric.
//!
//! Only the first data point of each group is considered.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FlattenError;

/// Leading column holding the group's media type.
pub const MEDIA_TYPE_COLUMN: &str = "results/group/mediaType";

/// Leading column holding the interval of the group's first data point.
pub const INTERVAL_COLUMN: &str = "results/data/0/interval";

/// Typed view of an aggregates query response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub results: Option<Vec<Group>>,
}

impl QueryResult {
    /// Convert a raw JSON response into its typed form.
    pub fn from_value(value: Value) -> Result<Self, FlattenError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Groups of the response; empty when `results` is absent.
    pub fn groups(&self) -> &[Group] {
        self.results.as_deref().unwrap_or_default()
    }
}

/// One result group, segmented by its dimensions (e.g. media type).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub group: Option<Map<String, Value>>,
    #[serde(default)]
    pub data: Option<Vec<DataPoint>>,
}

impl Group {
    fn first_data_point(&self) -> Option<&DataPoint> {
        self.data.as_ref().and_then(|data| data.first())
    }

    /// Media type dimension, if present and not null.
    pub fn media_type(&self) -> Option<&Value> {
        self.group
            .as_ref()
            .and_then(|group| group.get("mediaType"))
            .filter(|value| !value.is_null())
    }

    /// Interval of the first data point, if any.
    pub fn interval(&self) -> Option<&Value> {
        self.first_data_point()
            .and_then(|point| point.interval.as_ref())
            .filter(|value| !value.is_null())
    }

    /// Metric entries of the first data point; empty when there is no data.
    pub fn metrics(&self) -> &[MetricStat] {
        self.first_data_point()
            .and_then(|point| point.metrics.as_deref())
            .unwrap_or_default()
    }
}

/// Metrics computed over one interval.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub interval: Option<Value>,
    #[serde(default)]
    pub metrics: Option<Vec<MetricStat>>,
}

/// Named statistics of one metric.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricStat {
    pub metric: String,
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
}

impl MetricStat {
    /// Stats of this entry, `None` when absent or empty.
    fn non_empty_stats(&self) -> Option<&Map<String, Value>> {
        self.stats.as_ref().filter(|stats| !stats.is_empty())
    }
}

/// A discovered column: a metric, optionally paired with one of its stat keys.
///
/// A key without a stat is a name-only column and occupies one cell; a key with a stat
/// occupies two (metric name, stat value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub metric: String,
    pub stat: Option<String>,
}

impl ColumnKey {
    fn width(&self) -> usize {
        if self.stat.is_some() {
            2
        } else {
            1
        }
    }
}

/// One output row: cells are JSON values copied from the response, blanks are empty strings.
pub type OutputRow = Vec<Value>;

/// Flattened result: header plus one row per group, every row as wide as the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<OutputRow>,
}

/// Flatten a query result, or `None` when it has no groups.
pub fn flatten(result: &QueryResult) -> Option<Table> {
    let groups = result.groups();
    if groups.is_empty() {
        return None;
    }

    let columns = discover_columns(groups);
    let header = build_header(&columns);
    let rows: Vec<OutputRow> = groups.iter().map(|group| emit_row(group, &columns)).collect();

    tracing::debug!(
        column_keys = columns.len(),
        width = header.len(),
        rows = rows.len(),
        "Flattened query result"
    );

    Some(Table { header, rows })
}

/// Pass 1: collect column keys in first-appearance order.
///
/// The first entry seen for a metric fixes its shape. A metric first seen without stats keeps
/// a single name-only column and later stat keys for it are dropped; a metric first seen with
/// stats never gains a name-only column.
pub fn discover_columns(groups: &[Group]) -> Vec<ColumnKey> {
    let mut columns: IndexSet<ColumnKey> = IndexSet::new();
    let mut shapes: HashMap<&str, bool> = HashMap::new();

    for entry in groups.iter().flat_map(Group::metrics) {
        let stats = entry.non_empty_stats();
        let has_stats = stats.is_some();
        let first_shape = *shapes.entry(entry.metric.as_str()).or_insert(has_stats);
        if first_shape != has_stats {
            continue;
        }

        match stats {
            Some(stats) => {
                for key in stats.keys() {
                    columns.insert(ColumnKey {
                        metric: entry.metric.clone(),
                        stat: Some(key.clone()),
                    });
                }
            }
            None => {
                columns.insert(ColumnKey {
                    metric: entry.metric.clone(),
                    stat: None,
                });
            }
        }
    }

    columns.into_iter().collect()
}

/// Header for a discovered column set.
pub fn build_header(columns: &[ColumnKey]) -> Vec<String> {
    let mut header = Vec::with_capacity(row_width(columns));
    header.push(MEDIA_TYPE_COLUMN.to_string());
    header.push(INTERVAL_COLUMN.to_string());

    for (index, column) in columns.iter().enumerate() {
        header.push(format!("results/data/0/metrics/{}/metric", index));
        if let Some(stat) = &column.stat {
            header.push(format!("results/data/0/metrics/{}/stats/{}", index, stat));
        }
    }

    header
}

/// Pass 2: one row for a group against a fixed column set.
pub fn emit_row(group: &Group, columns: &[ColumnKey]) -> OutputRow {
    // Keyed by name only: a repeated metric overwrites the earlier entry.
    let mut lookup: HashMap<&str, Option<&Map<String, Value>>> = HashMap::new();
    for entry in group.metrics() {
        lookup.insert(entry.metric.as_str(), entry.stats.as_ref());
    }

    let mut row = Vec::with_capacity(row_width(columns));
    row.push(group.media_type().cloned().unwrap_or_else(blank));
    row.push(group.interval().cloned().unwrap_or_else(blank));

    for column in columns {
        match lookup.get(column.metric.as_str()) {
            Some(stats) => {
                row.push(Value::String(column.metric.clone()));
                if let Some(stat) = &column.stat {
                    let value = stats.and_then(|stats| stats.get(stat)).cloned();
                    row.push(value.unwrap_or_else(blank));
                }
            }
            None => row.extend(std::iter::repeat_with(blank).take(column.width())),
        }
    }

    row
}

/// Number of cells in a row (and header) for a column set.
pub fn row_width(columns: &[ColumnKey]) -> usize {
    2 + columns.iter().map(ColumnKey::width).sum::<usize>()
}

fn blank() -> Value {
    Value::String(String::new())
}
