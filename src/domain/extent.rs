// Axis domains, highlight window and linear scales
use super::sample::{serialize_time_label, Series, Timed};
use chrono::{NaiveTime, TimeDelta};
use serde::Serialize;
use thiserror::Error;

/// Padding added on both ends of the y-domain when a chart sets none
pub const DEFAULT_PADDING: f64 = 0.2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("highlight window must last at least one minute, got {0}")]
    EmptyDuration(i64),
    #[error("highlight window starting at {0} runs past midnight")]
    PastMidnight(NaiveTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeDomain {
    #[serde(serialize_with = "serialize_time_label")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_time_label")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueDomain {
    pub min: f64,
    pub max: f64,
}

impl ValueDomain {
    pub fn padded(self, padding: f64) -> Self {
        Self {
            min: self.min - padding,
            max: self.max + padding,
        }
    }
}

/// Fixed interval of interest, independent of the data it is drawn over.
/// It is never clipped to the x-domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighlightWindow {
    #[serde(serialize_with = "serialize_time_label")]
    pub start: NaiveTime,
    #[serde(serialize_with = "serialize_time_label")]
    pub end: NaiveTime,
}

impl HighlightWindow {
    pub fn new(start: NaiveTime, minutes: i64) -> Result<Self, WindowError> {
        let duration = TimeDelta::try_minutes(minutes)
            .filter(|_| minutes > 0)
            .ok_or(WindowError::EmptyDuration(minutes))?;
        match start.overflowing_add_signed(duration) {
            (end, 0) => Ok(Self { start, end }),
            _ => Err(WindowError::PastMidnight(start)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedDomains {
    pub x: TimeDomain,
    pub y: ValueDomain,
    pub highlight: Option<HighlightWindow>,
}

/// Min and max over `values`, or `None` when there are none
pub fn value_extent(values: impl IntoIterator<Item = f64>) -> Option<ValueDomain> {
    values.into_iter().fold(None, |extent, v| {
        Some(match extent {
            None => ValueDomain { min: v, max: v },
            Some(ValueDomain { min, max }) => ValueDomain {
                min: min.min(v),
                max: max.max(v),
            },
        })
    })
}

/// Compute the x-domain, padded y-domain over every accessor, and carry the
/// highlight window along. Returns `None` for an empty series.
pub fn derive_domains<T: Timed>(
    series: &Series<T>,
    accessors: &[fn(&T) -> f64],
    padding: f64,
    highlight: Option<HighlightWindow>,
) -> Option<DerivedDomains> {
    let x = TimeDomain {
        start: series.first()?.time(),
        end: series.last()?.time(),
    };
    let y = value_extent(
        series
            .samples()
            .iter()
            .flat_map(|sample| accessors.iter().map(move |accessor| accessor(sample))),
    )?;

    Some(DerivedDomains {
        x,
        y: y.padded(padding),
        highlight,
    })
}

/// Maps a continuous domain onto an output range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        // A collapsed domain maps everything to the middle of the range
        let t = if d1 == d0 { 0.5 } else { (value - d0) / (d1 - d0) };
        r0 + t * (r1 - r0)
    }
}
