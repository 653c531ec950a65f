// Chart service - Loads every dataset once and runs the selection/domain pipeline
use crate::application::dataset_repository::DatasetRepository;
use crate::application::tooltip::compose_tooltip;
use crate::domain::chart::{
    ChartKind, ChartSummary, ChartView, EnvelopeView, LineView, ScatterView, Tooltip,
};
use crate::domain::cursor::LookupError;
use crate::domain::dataset::MetricTable;
use crate::domain::extent::{derive_domains, value_extent, HighlightWindow};
use crate::domain::sample::{ChannelSample, EnvelopeSample, Series};
use crate::domain::selection::{select_series, ChannelLayout, Individuals, Selection, SelectionError};
use crate::infrastructure::config::{ChartConfig, ChartsConfig};
use anyhow::Context;
use chrono::NaiveTime;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("unknown chart '{0}'")]
    UnknownChart(String),
    #[error("chart '{id}' is unavailable: {reason}")]
    Unavailable { id: String, reason: String },
    #[error("chart '{0}' has no tooltip")]
    NoTooltip(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

struct LineData {
    aggregate: MetricTable,
    individuals: Option<Individuals>,
    layout: ChannelLayout,
    padding: f64,
    highlight: Option<HighlightWindow>,
}

impl LineData {
    fn select(&self, selection: &Selection) -> Result<Series<ChannelSample>, SelectionError> {
        select_series(&self.aggregate, self.individuals.as_ref(), &self.layout, selection)
    }
}

enum ChartData {
    Line(LineData),
    // Selection does not apply to these, so they are computed once
    Envelope(EnvelopeView),
    Scatter(ScatterView),
}

struct LoadedChart {
    config: ChartConfig,
    data: Result<ChartData, String>,
}

#[derive(Clone)]
pub struct ChartService {
    charts: Arc<Vec<LoadedChart>>,
}

impl ChartService {
    /// Fetch each referenced dataset once, concurrently, and prepare every chart.
    /// A chart whose data cannot be prepared stays listed in a failed state.
    pub async fn load(repository: Arc<dyn DatasetRepository>, config: ChartsConfig) -> Self {
        let mut names: Vec<String> = config
            .charts
            .iter()
            .flat_map(|c| c.datasets())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();

        let fetches = names.into_iter().map(|name| {
            let repository = repository.clone();
            async move {
                let document = repository
                    .fetch_document(&name)
                    .await
                    .map_err(|e| format!("{:#}", e));
                (name, document)
            }
        });
        let documents: HashMap<String, Result<serde_json::Value, String>> =
            futures::future::join_all(fetches).await.into_iter().collect();

        for (name, document) in &documents {
            match document {
                Ok(_) => tracing::info!("Loaded dataset {}", name),
                Err(e) => tracing::error!("Error loading dataset {}: {}", name, e),
            }
        }

        let charts = config
            .charts
            .into_iter()
            .map(|config| {
                let data = prepare_chart(&config, &documents).map_err(|e| format!("{:#}", e));
                if let Err(reason) = &data {
                    tracing::error!("Chart {} is unavailable: {}", config.id, reason);
                }
                LoadedChart { config, data }
            })
            .collect();

        Self {
            charts: Arc::new(charts),
        }
    }

    pub fn list_charts(&self) -> Vec<ChartSummary> {
        self.charts
            .iter()
            .map(|chart| {
                let individuals = match &chart.data {
                    Ok(ChartData::Line(line)) => line
                        .individuals
                        .as_ref()
                        .map(|all| all.keys().cloned().collect())
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };
                ChartSummary {
                    id: chart.config.id.clone(),
                    title: chart.config.title.clone(),
                    kind: chart.config.kind,
                    available: chart.data.is_ok(),
                    individuals,
                }
            })
            .collect()
    }

    /// Rebuild the whole view for `selection`; nothing is kept between calls
    pub fn render(&self, id: &str, selection: &Selection) -> Result<ChartView, ChartError> {
        let (config, data) = self.chart(id)?;

        match data {
            ChartData::Line(line) => {
                let series = line.select(selection)?;
                let domains = derive_domains(
                    &series,
                    &[ChannelSample::female_temperature, ChannelSample::male_temperature],
                    line.padding,
                    line.highlight,
                );
                tracing::debug!("Rendered {} with {} rows for {:?}", id, series.len(), selection);

                Ok(ChartView::Line(LineView {
                    id: config.id.clone(),
                    title: config.title.clone(),
                    selection: selection.clone(),
                    series,
                    domains,
                }))
            }
            ChartData::Envelope(view) => Ok(ChartView::Envelope(view.clone())),
            ChartData::Scatter(view) => Ok(ChartView::Scatter(view.clone())),
        }
    }

    /// Resolve the pointer time `at` to the nearest row of the selected series
    pub fn tooltip(&self, id: &str, selection: &Selection, at: NaiveTime) -> Result<Tooltip, ChartError> {
        match self.chart(id)? {
            (_, ChartData::Line(line)) => {
                let series = line.select(selection)?;
                let sample = series.nearest(at)?;
                Ok(compose_tooltip(sample))
            }
            (config, _) => Err(ChartError::NoTooltip(config.id.clone())),
        }
    }

    fn chart(&self, id: &str) -> Result<(&ChartConfig, &ChartData), ChartError> {
        let chart = self
            .charts
            .iter()
            .find(|c| c.config.id == id)
            .ok_or_else(|| ChartError::UnknownChart(id.to_string()))?;

        match &chart.data {
            Ok(data) => Ok((&chart.config, data)),
            Err(reason) => Err(ChartError::Unavailable {
                id: id.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

fn prepare_chart(
    config: &ChartConfig,
    documents: &HashMap<String, Result<serde_json::Value, String>>,
) -> anyhow::Result<ChartData> {
    let document = |name: &str| -> anyhow::Result<serde_json::Value> {
        match documents.get(name) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(reason)) => anyhow::bail!("dataset '{}' failed to load: {}", name, reason),
            None => anyhow::bail!("dataset '{}' was never fetched", name),
        }
    };

    let highlight = config.highlight_window()?;
    let table = MetricTable::from_json(document(&config.dataset)?)
        .with_context(|| format!("dataset '{}'", config.dataset))?;

    match config.kind {
        ChartKind::Line => {
            let individuals = config
                .individuals
                .as_deref()
                .map(|name| -> anyhow::Result<Individuals> {
                    serde_json::from_value(document(name)?)
                        .with_context(|| format!("individuals dataset '{}'", name))
                })
                .transpose()?;

            let line = LineData {
                aggregate: table,
                individuals,
                layout: config.channels.clone().unwrap_or_default(),
                padding: config.padding(),
                highlight,
            };
            // Surface misconfigured columns at startup rather than on first request
            let rows = line.select(&Selection::default())?.len();
            tracing::info!("Chart {} ready with {} mean rows", config.id, rows);

            Ok(ChartData::Line(line))
        }
        ChartKind::Envelope => {
            let columns = config.envelope.clone().unwrap_or_default();
            let series = table.envelope(&columns)?;
            let domains = derive_domains(
                &series,
                &[EnvelopeSample::min, EnvelopeSample::max],
                config.padding(),
                highlight,
            );

            Ok(ChartData::Envelope(EnvelopeView {
                id: config.id.clone(),
                title: config.title.clone(),
                series,
                domains,
            }))
        }
        ChartKind::Scatter => {
            let columns = config
                .scatter
                .as_ref()
                .with_context(|| format!("chart '{}' needs scatter columns", config.id))?;
            let points = table.scatter(columns)?;

            Ok(ChartData::Scatter(ScatterView {
                id: config.id.clone(),
                title: config.title.clone(),
                x: value_extent(points.iter().map(|p| p.x)),
                y: value_extent(points.iter().map(|p| p.y)),
                points,
            }))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::dataset::{EnvelopeColumns, ScatterColumns};
    use crate::domain::sample::tests::hm;
    use crate::domain::selection::tests::{aggregate_json, individuals_json};
    use crate::infrastructure::config::HighlightConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub(crate) struct InMemoryRepository {
        documents: HashMap<String, serde_json::Value>,
        fetches: AtomicUsize,
    }

    impl InMemoryRepository {
        pub(crate) fn with(mut self, name: &str, document: serde_json::Value) -> Self {
            self.documents.insert(name.to_string(), document);
            self
        }
    }

    #[async_trait]
    impl DatasetRepository for InMemoryRepository {
        async fn fetch_document(&self, name: &str) -> anyhow::Result<serde_json::Value> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.documents
                .get(name)
                .cloned()
                .with_context(|| format!("no document named {}", name))
        }
    }

    pub(crate) fn chart_config(id: &str, kind: ChartKind, dataset: &str) -> ChartConfig {
        ChartConfig {
            id: id.to_string(),
            title: format!("{} chart", id),
            kind,
            dataset: dataset.to_string(),
            individuals: None,
            padding: None,
            highlight: None,
            channels: None,
            envelope: None,
            scatter: None,
        }
    }

    pub(crate) fn temperature_config() -> ChartConfig {
        ChartConfig {
            individuals: Some("individuals".to_string()),
            highlight: Some(HighlightConfig {
                start: "12:15".to_string(),
                minutes: 85,
            }),
            ..chart_config("temperature", ChartKind::Line, "data_real")
        }
    }

    pub(crate) fn repository() -> InMemoryRepository {
        InMemoryRepository::default()
            .with("data_real", aggregate_json())
            .with("individuals", individuals_json())
            .with(
                "additional_data",
                json!({
                    "max":  { "12:00": 37.4, "12:01": 37.5 },
                    "min":  { "12:00": 36.1, "12:01": 36.0 },
                    "mean": { "12:00": 36.8, "12:01": 36.9 },
                    "m1":   { "12:00": 36.7, "12:01": 36.6 }
                }),
            )
            .with(
                "checkp_data",
                json!({
                    "Activity":    { "0": 12.0, "1": 40.0 },
                    "Temperature": { "0": 36.4, "1": 37.2 }
                }),
            )
    }

    pub(crate) async fn service() -> ChartService {
        let config = ChartsConfig {
            charts: vec![
                temperature_config(),
                ChartConfig {
                    padding: Some(0.1),
                    envelope: Some(EnvelopeColumns {
                        members: vec!["m1".to_string()],
                        ..EnvelopeColumns::default()
                    }),
                    ..chart_config("envelope", ChartKind::Envelope, "additional_data")
                },
                ChartConfig {
                    scatter: Some(ScatterColumns {
                        x: "Activity".to_string(),
                        y: "Temperature".to_string(),
                    }),
                    ..chart_config("checkpoint", ChartKind::Scatter, "checkp_data")
                },
            ],
        };
        ChartService::load(Arc::new(repository()), config).await
    }

    #[tokio::test]
    async fn test_list_charts() {
        let service = service().await;
        let charts = service.list_charts();

        let ids: Vec<_> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["temperature", "envelope", "checkpoint"]);
        assert!(charts.iter().all(|c| c.available));
        assert_eq!(charts[0].individuals, vec!["f3", "m7", "short"]);
        assert!(charts[1].individuals.is_empty());
    }

    #[tokio::test]
    async fn test_render_line_recomputes_for_each_selection() {
        let service = service().await;

        let ChartView::Line(mean) = service.render("temperature", &Selection::default()).unwrap() else {
            panic!("expected a line view");
        };
        assert_eq!(mean.series.len(), 2);
        let domains = mean.domains.unwrap();
        assert_eq!((domains.x.start, domains.x.end), (hm("12:00"), hm("12:01")));
        assert!((domains.y.min - 36.0).abs() < 1e-9);
        assert!((domains.y.max - 36.8).abs() < 1e-9);
        let window = domains.highlight.unwrap();
        assert_eq!((window.start, window.end), (hm("12:15"), hm("13:40")));

        let selection = Selection::new(Some("f3".to_string()), None);
        let ChartView::Line(selected) = service.render("temperature", &selection).unwrap() else {
            panic!("expected a line view");
        };
        assert_eq!(selected.selection, selection);
        assert_eq!(selected.series.len(), 3);
        assert!((selected.domains.unwrap().y.max - 37.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_render_envelope_and_scatter() {
        let service = service().await;

        let ChartView::Envelope(envelope) = service.render("envelope", &Selection::default()).unwrap() else {
            panic!("expected an envelope view");
        };
        let y = envelope.domains.unwrap().y;
        assert!((y.min - 35.9).abs() < 1e-9);
        assert!((y.max - 37.6).abs() < 1e-9);

        let ChartView::Scatter(scatter) = service.render("checkpoint", &Selection::default()).unwrap() else {
            panic!("expected a scatter view");
        };
        assert_eq!(scatter.points.len(), 2);
        assert_eq!(scatter.x.map(|d| (d.min, d.max)), Some((12.0, 40.0)));
        assert_eq!(scatter.y.map(|d| (d.min, d.max)), Some((36.4, 37.2)));
    }

    #[tokio::test]
    async fn test_tooltip_resolves_nearest_row() {
        let service = service().await;
        let at = NaiveTime::from_hms_opt(12, 0, 30).unwrap();

        let tooltip = service.tooltip("temperature", &Selection::default(), at).unwrap();
        assert_eq!(tooltip.time, hm("12:00"));
        assert_eq!(tooltip.channels[0].temperature, 36.5);

        let late = NaiveTime::from_hms_opt(12, 0, 45).unwrap();
        let tooltip = service.tooltip("temperature", &Selection::default(), late).unwrap();
        assert_eq!(tooltip.time, hm("12:01"));
    }

    #[tokio::test]
    async fn test_request_errors() {
        let service = service().await;
        let at = hm("12:00");

        assert!(matches!(
            service.render("nope", &Selection::default()),
            Err(ChartError::UnknownChart(_))
        ));
        assert!(matches!(
            service.tooltip("envelope", &Selection::default(), at),
            Err(ChartError::NoTooltip(_))
        ));
        assert!(matches!(
            service.render("temperature", &Selection::new(None, Some("m99".to_string()))),
            Err(ChartError::Selection(SelectionError::UnknownIndividual(_)))
        ));
    }

    #[tokio::test]
    async fn test_tooltip_on_empty_series_is_not_found() {
        let repository = InMemoryRepository::default().with(
            "data_real",
            json!({
                "female_temp":     { "12:00": null },
                "male_temp":       { "12:00": 36.2 },
                "female_act_chng": { "12:00": 1.0 },
                "male_act_chng":   { "12:00": 3.0 },
                "female_std":      { "12:00": 0.3 },
                "male__std":       { "12:00": 0.2 }
            }),
        );
        let config = ChartsConfig {
            charts: vec![chart_config("temperature", ChartKind::Line, "data_real")],
        };
        let service = ChartService::load(Arc::new(repository), config).await;

        assert!(matches!(
            service.tooltip("temperature", &Selection::default(), hm("12:00")),
            Err(ChartError::Lookup(LookupError::NotFound))
        ));
        let ChartView::Line(view) = service.render("temperature", &Selection::default()).unwrap() else {
            panic!("expected a line view");
        };
        assert!(view.series.is_empty());
        assert_eq!(view.domains, None);
    }

    #[tokio::test]
    async fn test_failed_dataset_leaves_chart_unavailable() {
        let repository = InMemoryRepository::default();
        let config = ChartsConfig {
            charts: vec![chart_config("temperature", ChartKind::Line, "data_real")],
        };
        let service = ChartService::load(Arc::new(repository), config).await;

        assert!(!service.list_charts()[0].available);
        match service.render("temperature", &Selection::default()) {
            Err(ChartError::Unavailable { id, reason }) => {
                assert_eq!(id, "temperature");
                assert!(reason.contains("data_real"));
            }
            other => panic!("expected unavailable chart, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_shared_datasets_are_fetched_once() {
        let repository = Arc::new(repository());
        let config = ChartsConfig {
            charts: vec![
                temperature_config(),
                ChartConfig {
                    padding: Some(0.0),
                    ..temperature_config()
                },
            ],
        };
        ChartService::load(repository.clone(), config).await;
        assert_eq!(repository.fetches.load(Ordering::SeqCst), 2);
    }
}
