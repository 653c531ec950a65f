use crate::domain::chart::ChartKind;
use crate::domain::dataset::{EnvelopeColumns, ScatterColumns};
use crate::domain::extent::{HighlightWindow, DEFAULT_PADDING};
use crate::domain::sample::parse_time_label;
use crate::domain::selection::ChannelLayout;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub datasets: DatasetSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where dataset documents come from. A base URL wins over the directory.
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetSettings {
    #[serde(default = "default_directory")]
    pub directory: String,
    pub base_url: Option<String>,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            base_url: None,
        }
    }
}

fn default_directory() -> String {
    "data".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsConfig {
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    /// Dataset holding the aggregate columns
    pub dataset: String,
    /// Dataset of per-individual tables, line charts only
    pub individuals: Option<String>,
    pub padding: Option<f64>,
    pub highlight: Option<HighlightConfig>,
    #[serde(default)]
    pub channels: Option<ChannelLayout>,
    #[serde(default)]
    pub envelope: Option<EnvelopeColumns>,
    #[serde(default)]
    pub scatter: Option<ScatterColumns>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HighlightConfig {
    pub start: String,
    pub minutes: i64,
}

impl ChartConfig {
    pub fn padding(&self) -> f64 {
        self.padding.unwrap_or(DEFAULT_PADDING)
    }

    pub fn highlight_window(&self) -> anyhow::Result<Option<HighlightWindow>> {
        let Some(highlight) = &self.highlight else {
            return Ok(None);
        };
        let start = parse_time_label(&highlight.start)
            .with_context(|| format!("chart '{}' highlight start", self.id))?;
        let window = HighlightWindow::new(start, highlight.minutes)
            .with_context(|| format!("chart '{}' highlight window", self.id))?;
        Ok(Some(window))
    }

    /// Datasets this chart reads, aggregate first
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.dataset.as_str()).chain(self.individuals.as_deref())
    }
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(config::Environment::with_prefix("THERMOCHART").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_charts_config() -> anyhow::Result<ChartsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/charts"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
