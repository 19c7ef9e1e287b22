//! Exporter-owned health instruments.

use super::families::METRIC_PREFIX;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, IntCounter, Opts};

/// Gauges and counters describing the exporter itself.
///
/// Owned by one exporter instance and exposed through its collector, so
/// several exporters can live in one process without sharing state.
#[derive(Clone)]
pub struct Instruments {
    /// 1 when the last scrape had a session, 0 after a failed login.
    pub up: Gauge,
    /// Failed login attempts.
    pub auth_errors: IntCounter,
    /// Failed requests during scrapes.
    pub scrape_errors: IntCounter,
    /// Permission-denied entries in router replies.
    pub permission_errors: IntCounter,
}

impl Instruments {
    /// Creates the instruments, unregistered.
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            up: Gauge::with_opts(opts(
                "up",
                "Shows if the Experia Box V10 is deemed up by the collector.",
            ))?,
            auth_errors: IntCounter::with_opts(opts(
                "auth_errors_total",
                "Counts number of authentication errors encountered by the collector.",
            ))?,
            scrape_errors: IntCounter::with_opts(opts(
                "scrape_errors_total",
                "Counts the number of scrape errors by this collector.",
            ))?,
            permission_errors: IntCounter::with_opts(opts(
                "permission_errors_total",
                "Counts the number of permission denied errors from the modem API.",
            ))?,
        })
    }

    /// Descriptors of all four instruments.
    pub fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.up.desc();
        descs.extend(self.auth_errors.desc());
        descs.extend(self.scrape_errors.desc());
        descs.extend(self.permission_errors.desc());
        descs
    }

    /// Current values of all four instruments.
    pub fn collect(&self) -> Vec<MetricFamily> {
        let mut families = self.up.collect();
        families.extend(self.auth_errors.collect());
        families.extend(self.scrape_errors.collect());
        families.extend(self.permission_errors.collect());
        families
    }
}

impl std::fmt::Debug for Instruments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruments")
            .field("up", &self.up.get())
            .field("auth_errors", &self.auth_errors.get())
            .field("scrape_errors", &self.scrape_errors.get())
            .field("permission_errors", &self.permission_errors.get())
            .finish()
    }
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(format!("{METRIC_PREFIX}{name}"), help)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruments_start_at_zero() {
        let instruments = Instruments::new().unwrap();
        assert_eq!(instruments.up.get(), 0.0);
        assert_eq!(instruments.auth_errors.get(), 0);
        assert_eq!(instruments.desc().len(), 4);
    }

    #[test]
    fn test_collect_names() {
        let instruments = Instruments::new().unwrap();
        instruments.scrape_errors.inc_by(3);
        let families = instruments.collect();
        let names: Vec<_> = families.iter().map(|f| f.get_name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "experia_v10_up",
                "experia_v10_auth_errors_total",
                "experia_v10_scrape_errors_total",
                "experia_v10_permission_errors_total",
            ]
        );
        assert_eq!(families[2].get_metric()[0].get_counter().get_value(), 3.0);
    }
}
