// Chart view models handed to the renderer
use super::extent::{DerivedDomains, ValueDomain};
use super::gaussian::CurvePoint;
use super::sample::{serialize_time_label, Channel, ChannelSample, EnvelopeSample, ScatterPoint, Series};
use super::selection::Selection;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Envelope,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub available: bool,
    /// Identifiers that may be selected for either channel
    pub individuals: Vec<String>,
}

/// Everything the renderer needs for one redraw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartView {
    Line(LineView),
    Envelope(EnvelopeView),
    Scatter(ScatterView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub id: String,
    pub title: String,
    pub selection: Selection,
    pub series: Series<ChannelSample>,
    pub domains: Option<DerivedDomains>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeView {
    pub id: String,
    pub title: String,
    pub series: Series<EnvelopeSample>,
    pub domains: Option<DerivedDomains>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub id: String,
    pub title: String,
    pub points: Vec<ScatterPoint>,
    pub x: Option<ValueDomain>,
    pub y: Option<ValueDomain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelTooltip {
    pub channel: Channel,
    pub temperature: f64,
    pub activity_change: f64,
    /// Position of the temperature tick on the distribution axis
    pub tick_x: f64,
    pub activity_arrow: Arrow,
    /// Missing when the sample's std cannot describe a distribution
    pub curve: Option<Vec<CurvePoint>>,
}

/// Hover payload for the sample nearest to the pointer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    #[serde(serialize_with = "serialize_time_label")]
    pub time: NaiveTime,
    pub channels: Vec<ChannelTooltip>,
}
