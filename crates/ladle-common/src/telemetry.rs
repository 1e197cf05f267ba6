//! Telemetry setup for hosts embedding the composer.
//!
//! The composer crates only emit `tracing` events and `metrics` counters.
//! Native hosts that want them on stdout / a Prometheus endpoint call
//! [`init`] once at startup.
//!
//! ```ignore
//! let config = ladle_common::telemetry::TelemetryConfig::from_env("ladle-app");
//! ladle_common::telemetry::init(config);
//! tracing::info!("composer ready");
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event.
    pub service_name: String,
    /// Console log level (DEBUG in debug builds, INFO otherwise).
    /// `RUST_LOG` overrides it when set.
    pub console_level: Level,
}

impl TelemetryConfig {
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
        }
    }
}

/// Initialize metrics recorder and tracing subscriber.
pub fn init(config: TelemetryConfig) {
    init_metrics();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    // A global subscriber installed by the host wins.
    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_err()
    {
        return;
    }

    tracing::debug!(service = %config.service_name, "telemetry initialized");
}

/// Install the Prometheus recorder, once. Returns None if another recorder won.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "failed to install prometheus recorder");
                None
            }
        })
        .as_ref()
}

/// Render metrics in Prometheus text format. Empty if no recorder is installed.
pub fn render() -> String {
    init_metrics().map(|h| h.render()).unwrap_or_default()
}
