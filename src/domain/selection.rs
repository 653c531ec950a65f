// Series selection: which source feeds each channel of the line chart
use super::dataset::{DatasetError, GridPoint, MetricTable};
use super::sample::{Channel, ChannelReading, ChannelSample, Series};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Per-individual datasets keyed by identifier
pub type Individuals = BTreeMap<String, MetricTable>;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("unknown individual '{0}'")]
    UnknownIndividual(String),
    #[error("'{metric}' of {origin} does not cover the aggregate time grid")]
    MisalignedGrid { origin: String, metric: String },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// User choice per channel: `None` is the population mean
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub female: Option<String>,
    pub male: Option<String>,
}

impl Selection {
    /// Build a selection, treating empty identifiers as "no selection"
    pub fn new(female: Option<String>, male: Option<String>) -> Self {
        let keep = |id: Option<String>| id.filter(|s| !s.trim().is_empty());
        Self {
            female: keep(female),
            male: keep(male),
        }
    }

    pub fn for_channel(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Female => self.female.as_deref(),
            Channel::Male => self.male.as_deref(),
        }
    }
}

/// Column names of one channel in the aggregate dataset
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelColumns {
    pub temperature: String,
    pub activity_change: String,
    pub std_dev: String,
}

fn default_individual_columns() -> ChannelColumns {
    ChannelColumns {
        temperature: "temp".to_string(),
        activity_change: "act_chng".to_string(),
        std_dev: "std".to_string(),
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelLayout {
    pub female: ChannelColumns,
    pub male: ChannelColumns,
    /// Column names inside each individual's dataset
    #[serde(default = "default_individual_columns")]
    pub individual: ChannelColumns,
}

impl ChannelLayout {
    pub fn columns(&self, channel: Channel) -> &ChannelColumns {
        match channel {
            Channel::Female => &self.female,
            Channel::Male => &self.male,
        }
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        let columns = |prefix: &str, std_dev: &str| ChannelColumns {
            temperature: format!("{prefix}_temp"),
            activity_change: format!("{prefix}_act_chng"),
            std_dev: std_dev.to_string(),
        };
        Self {
            female: columns("female", "female_std"),
            male: columns("male", "male__std"),
            individual: default_individual_columns(),
        }
    }
}

enum Source<'a> {
    Aggregate,
    Individual(&'a MetricTable),
}

/// Materialize the line chart rows for `selection`.
///
/// An unselected channel reads the aggregate. A selected channel reads the
/// individual's temperature with no fallback; its activity change and std
/// fall back to the aggregate one metric at a time. Rows left with any
/// absent value are dropped after resolution.
pub fn select_series(
    aggregate: &MetricTable,
    individuals: Option<&Individuals>,
    layout: &ChannelLayout,
    selection: &Selection,
) -> Result<Series<ChannelSample>, SelectionError> {
    let grid = aggregate.grid(&layout.female.temperature)?;
    let labels: BTreeSet<&str> = grid.iter().map(|p| p.label.as_str()).collect();

    for channel in Channel::ALL {
        let columns = layout.columns(channel);
        for metric in [&columns.temperature, &columns.activity_change, &columns.std_dev] {
            if !aggregate.has_metric(metric) {
                return Err(DatasetError::MissingMetric(metric.clone()).into());
            }
            check_alignment(aggregate, metric, &labels, false, "aggregate")?;
        }
    }

    let female = resolve_source(individuals, selection.for_channel(Channel::Female), layout, &labels)?;
    let male = resolve_source(individuals, selection.for_channel(Channel::Male), layout, &labels)?;

    let rows: Vec<ChannelSample> = grid
        .iter()
        .filter_map(|point| {
            Some(ChannelSample {
                time: point.time,
                female: read_channel(aggregate, &female, &layout.female, &layout.individual, point)?,
                male: read_channel(aggregate, &male, &layout.male, &layout.individual, point)?,
            })
        })
        .collect();

    if rows.len() < grid.len() {
        tracing::debug!(
            "Dropped {} of {} rows with absent values",
            grid.len() - rows.len(),
            grid.len()
        );
    }

    Ok(Series::new(rows)?)
}

fn resolve_source<'a>(
    individuals: Option<&'a Individuals>,
    id: Option<&str>,
    layout: &ChannelLayout,
    labels: &BTreeSet<&str>,
) -> Result<Source<'a>, SelectionError> {
    let Some(id) = id else {
        return Ok(Source::Aggregate);
    };

    let table = individuals
        .and_then(|all| all.get(id))
        .ok_or_else(|| SelectionError::UnknownIndividual(id.to_string()))?;

    let origin = format!("individual '{id}'");
    let columns = &layout.individual;
    check_alignment(table, &columns.temperature, labels, true, &origin)?;
    check_alignment(table, &columns.activity_change, labels, false, &origin)?;
    check_alignment(table, &columns.std_dev, labels, false, &origin)?;

    Ok(Source::Individual(table))
}

/// A required column must carry exactly the grid's labels; an optional one
/// may be missing or partial but must not introduce labels off the grid.
fn check_alignment(
    table: &MetricTable,
    metric: &str,
    grid: &BTreeSet<&str>,
    required: bool,
    origin: &str,
) -> Result<(), SelectionError> {
    let aligned = match table.labels(metric) {
        Ok(labels) if required => labels == *grid,
        Ok(labels) => labels.is_subset(grid),
        Err(_) => !required,
    };

    if aligned {
        Ok(())
    } else {
        Err(SelectionError::MisalignedGrid {
            origin: origin.to_string(),
            metric: metric.to_string(),
        })
    }
}

fn read_channel(
    aggregate: &MetricTable,
    source: &Source<'_>,
    columns: &ChannelColumns,
    individual: &ChannelColumns,
    point: &GridPoint,
) -> Option<ChannelReading> {
    let label = point.label.as_str();
    let mean = |metric: &str| aggregate.value(metric, label);

    let (temperature, activity_change, std_dev) = match source {
        Source::Aggregate => (
            mean(columns.temperature.as_str()),
            mean(columns.activity_change.as_str()),
            mean(columns.std_dev.as_str()),
        ),
        Source::Individual(table) => (
            table.value(&individual.temperature, label),
            table
                .value(&individual.activity_change, label)
                .or_else(|| mean(columns.activity_change.as_str())),
            table
                .value(&individual.std_dev, label)
                .or_else(|| mean(columns.std_dev.as_str())),
        ),
    };

    Some(ChannelReading {
        temperature: temperature?,
        activity_change: activity_change?,
        std_dev: std_dev?,
    })
}
