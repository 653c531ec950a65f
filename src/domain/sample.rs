// Sample and series domain models
use super::dataset::DatasetError;
use chrono::NaiveTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Format of the time labels used as dataset keys
pub const TIME_LABEL_FORMAT: &str = "%H:%M";

/// Parse a dataset time label such as "12:15"
pub fn parse_time_label(label: &str) -> Result<NaiveTime, DatasetError> {
    NaiveTime::parse_from_str(label.trim(), TIME_LABEL_FORMAT)
        .map_err(|_| DatasetError::InvalidTimeLabel(label.to_string()))
}

/// Parse a pointer time, which may carry seconds ("12:00:30") unlike dataset labels
pub fn parse_query_time(value: &str) -> Result<NaiveTime, DatasetError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, TIME_LABEL_FORMAT))
        .map_err(|_| DatasetError::InvalidTimeLabel(value.to_string()))
}

pub fn serialize_time_label<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(TIME_LABEL_FORMAT))
}

/// Anything positioned on the time axis
pub trait Timed {
    fn time(&self) -> NaiveTime;
}

/// Samples ordered strictly ascending by time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series<T> {
    samples: Vec<T>,
}

impl<T: Timed> Series<T> {
    pub fn new(mut samples: Vec<T>) -> Result<Self, DatasetError> {
        samples.sort_by_key(|s| s.time());
        if let Some(pair) = samples.windows(2).find(|w| w[0].time() == w[1].time()) {
            return Err(DatasetError::DuplicateTime(pair[0].time()));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.samples.last()
    }
}

/// The two tracked subjects whose source can be selected independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Female,
    Male,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Female, Channel::Male];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelReading {
    pub temperature: f64,
    pub activity_change: f64,
    pub std_dev: f64,
}

/// One minute of the channel line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSample {
    #[serde(serialize_with = "serialize_time_label")]
    pub time: NaiveTime,
    pub female: ChannelReading,
    pub male: ChannelReading,
}

impl ChannelSample {
    pub fn reading(&self, channel: Channel) -> &ChannelReading {
        match channel {
            Channel::Female => &self.female,
            Channel::Male => &self.male,
        }
    }

    pub fn female_temperature(&self) -> f64 {
        self.female.temperature
    }

    pub fn male_temperature(&self) -> f64 {
        self.male.temperature
    }
}

impl Timed for ChannelSample {
    fn time(&self) -> NaiveTime {
        self.time
    }
}

/// One minute of the aggregate envelope chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeSample {
    #[serde(serialize_with = "serialize_time_label")]
    pub time: NaiveTime,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Individual traces drawn behind the envelope; absent values are left out
    pub members: BTreeMap<String, f64>,
}

impl EnvelopeSample {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Timed for EnvelopeSample {
    fn time(&self) -> NaiveTime {
        self.time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}
