//! Prometheus collector and registry.

use super::families::{Family, Observation};
use crate::scrape::Exporter;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Adapts an [`Exporter`] to the Prometheus collector interface.
///
/// `desc` lists every data family plus the exporter's instruments.
/// `collect` runs one scrape cycle.
pub struct ExporterCollector {
    exporter: Arc<Exporter>,
    descs: Vec<Desc>,
}

impl ExporterCollector {
    /// Creates a collector for `exporter`.
    pub fn new(exporter: Arc<Exporter>) -> Result<Self, MetricsError> {
        let descs = Family::ALL
            .iter()
            .map(|family| {
                Desc::new(
                    family.name().to_string(),
                    family.help().to_string(),
                    family.label_names().iter().map(|l| l.to_string()).collect(),
                    HashMap::new(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exporter, descs })
    }

    /// The wrapped exporter.
    pub fn exporter(&self) -> &Arc<Exporter> {
        &self.exporter
    }
}

impl Collector for ExporterCollector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs: Vec<&Desc> = self.descs.iter().collect();
        descs.extend(self.exporter.instruments().desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let observations = self.exporter.scrape();
        let mut families = encode_observations(&observations);
        families.extend(self.exporter.instruments().collect());
        families
    }
}

/// Groups observations into gauge families, in [`Family::ALL`] order.
///
/// Families without observations are left out.
pub fn encode_observations(observations: &[Observation]) -> Vec<MetricFamily> {
    let mut out = Vec::new();
    for family in Family::ALL {
        let mut samples = observations.iter().filter(|o| o.family == *family).peekable();
        if samples.peek().is_none() {
            continue;
        }

        let gauges = match GaugeVec::new(
            Opts::new(family.name(), family.help()),
            family.label_names(),
        ) {
            Ok(gauges) => gauges,
            Err(e) => {
                tracing::error!(family = family.name(), error = %e, "Invalid metric family");
                continue;
            }
        };

        for sample in samples {
            let labels: Vec<&str> = sample.labels.iter().map(String::as_str).collect();
            match gauges.get_metric_with_label_values(&labels) {
                Ok(gauge) => gauge.set(sample.value),
                Err(e) => {
                    tracing::error!(family = family.name(), error = %e, "Dropping observation");
                }
            }
        }
        out.extend(gauges.collect());
    }
    out
}

/// Prometheus registry holding exporter collectors.
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Wraps an existing registry.
    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// Registers a collector for `exporter`.
    pub fn register_exporter(&self, exporter: Arc<Exporter>) -> Result<(), MetricsError> {
        let collector = ExporterCollector::new(exporter)?;
        self.registry.register(Box::new(collector))?;
        Ok(())
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gathers (scraping every registered exporter) and encodes in text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
