// Column-of-maps datasets and their transposition into row series
use super::sample::{parse_time_label, EnvelopeSample, ScatterPoint, Series};
use chrono::NaiveTime;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("invalid time label '{0}', expected HH:MM")]
    InvalidTimeLabel(String),
    #[error("duplicate sample at {0}")]
    DuplicateTime(NaiveTime),
    #[error("dataset has no '{0}' column")]
    MissingMetric(String),
    #[error("malformed dataset: {0}")]
    Malformed(String),
}

/// A dataset as published: metric name -> time label -> value.
/// `null` entries are absent values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct MetricTable {
    columns: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

/// One slot of a dataset's time grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub label: String,
    pub time: NaiveTime,
}

impl MetricTable {
    pub fn from_json(value: serde_json::Value) -> Result<Self, DatasetError> {
        serde_json::from_value(value).map_err(|e| DatasetError::Malformed(e.to_string()))
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.columns.contains_key(metric)
    }

    /// Value of `metric` at `label`; missing, null and non-finite values are absent
    pub fn value(&self, metric: &str, label: &str) -> Option<f64> {
        self.columns
            .get(metric)?
            .get(label)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    pub fn labels(&self, metric: &str) -> Result<BTreeSet<&str>, DatasetError> {
        self.columns
            .get(metric)
            .map(|column| column.keys().map(String::as_str).collect())
            .ok_or_else(|| DatasetError::MissingMetric(metric.to_string()))
    }

    /// The time grid defined by the labels of `metric`, ascending
    pub fn grid(&self, metric: &str) -> Result<Vec<GridPoint>, DatasetError> {
        let mut grid = self
            .labels(metric)?
            .into_iter()
            .map(|label| -> Result<GridPoint, DatasetError> {
                Ok(GridPoint {
                    label: label.to_string(),
                    time: parse_time_label(label)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        grid.sort_by_key(|p| p.time);
        if let Some(pair) = grid.windows(2).find(|w| w[0].time == w[1].time) {
            return Err(DatasetError::DuplicateTime(pair[0].time));
        }
        Ok(grid)
    }

    /// Rows of the envelope chart. Rows without min, max or mean are dropped;
    /// member columns are optional per row.
    pub fn envelope(&self, columns: &EnvelopeColumns) -> Result<Series<EnvelopeSample>, DatasetError> {
        let grid = self.grid(&columns.max)?;
        for metric in [&columns.min, &columns.mean] {
            if !self.has_metric(metric) {
                return Err(DatasetError::MissingMetric(metric.clone()));
            }
        }

        let rows: Vec<EnvelopeSample> = grid
            .iter()
            .filter_map(|point| {
                let min = self.value(&columns.min, &point.label)?;
                let max = self.value(&columns.max, &point.label)?;
                let mean = self.value(&columns.mean, &point.label)?;
                let members = columns
                    .members
                    .iter()
                    .filter_map(|m| Some((m.clone(), self.value(m, &point.label)?)))
                    .collect();
                Some(EnvelopeSample { time: point.time, min, max, mean, members })
            })
            .collect();

        tracing::debug!("Envelope kept {} of {} rows", rows.len(), grid.len());
        Series::new(rows)
    }

    /// Points of the scatter chart, keyed by the x column's labels
    pub fn scatter(&self, columns: &ScatterColumns) -> Result<Vec<ScatterPoint>, DatasetError> {
        let labels = self.labels(&columns.x)?;
        if !self.has_metric(&columns.y) {
            return Err(DatasetError::MissingMetric(columns.y.clone()));
        }

        Ok(labels
            .into_iter()
            .filter_map(|label| {
                Some(ScatterPoint {
                    x: self.value(&columns.x, label)?,
                    y: self.value(&columns.y, label)?,
                })
            })
            .collect())
    }
}

fn default_min() -> String {
    "min".to_string()
}

fn default_max() -> String {
    "max".to_string()
}

fn default_mean() -> String {
    "mean".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EnvelopeColumns {
    #[serde(default = "default_min")]
    pub min: String,
    #[serde(default = "default_max")]
    pub max: String,
    #[serde(default = "default_mean")]
    pub mean: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl Default for EnvelopeColumns {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            mean: default_mean(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScatterColumns {
    pub x: String,
    pub y: String,
}
