//! Logging and OpenTelemetry setup
//!
//! The codec and client emit `tracing` events; this module installs the
//! subscriber that prints them and, when a collector endpoint is configured,
//! exports spans and metrics over OTLP/gRPC.
//!
//! # Usage Pattern
//!
//! Initialize once at application startup, before creating clients:
//!
//! ```rust,no_run
//! use jmap_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("mail-sync")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     jmap_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... run your application ...
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint; export is off when unset
//! - `RUST_LOG`: log filter directives (e.g. "info", "jmap_core=trace")

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error returned by [`init_observability`]
pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for logging and telemetry export
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to exported spans and metrics
    pub service_name: String,

    /// Service version attached to exported spans and metrics
    pub service_version: String,

    /// OTLP collector endpoint (e.g. "http://localhost:4317")
    ///
    /// `None` keeps everything local: events are only printed.
    pub otlp_endpoint: Option<String>,

    /// Export metrics alongside spans when an endpoint is set
    pub enable_metrics: bool,

    /// Print events as JSON lines instead of human-readable text
    pub json: bool,

    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "jmap".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            enable_metrics: true,
            json: false,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration for the named service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Export to an OTLP collector
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Keep telemetry local even if `OTEL_EXPORTER_OTLP_ENDPOINT` is set
    pub fn without_export(mut self) -> Self {
        self.otlp_endpoint = None;
        self
    }

    /// Set the fallback log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable metrics export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Print JSON lines
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the global subscriber and, if configured, the OTLP pipeline
///
/// Must run inside a Tokio runtime when an endpoint is configured, since the
/// exporters batch on background tasks.
///
/// # Errors
///
/// Fails if the log filter is invalid, an exporter cannot be built, or a
/// global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), InitError> {
    let tracer = match &config.otlp_endpoint {
        Some(endpoint) => {
            if config.enable_metrics {
                init_metrics(&config, endpoint)?;
            }
            Some(init_tracer(&config, endpoint)?)
        }
        None => None,
    };

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics = config.enable_metrics,
        "Observability initialized"
    );
    Ok(())
}

fn init_tracer(
    config: &ObservabilityConfig,
    endpoint: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, InitError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // the subscriber layer needs a tracer before the provider goes global
    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig, endpoint: &str) -> Result<(), InitError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), InitError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let telemetry_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    if config.json {
        tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(env_filter)
            .with(fmt_layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
