//! Tracing and log output setup.

use miette::{IntoDiagnostic, WrapErr};
use opentelemetry::InstrumentationScope;
use opentelemetry::trace::TracerProvider;
use opentelemetry_resource_detectors::{
    HostResourceDetector, K8sResourceDetector, OsResourceDetector,
};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::{EnvResourceDetector, ResourceDetector};
use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{self, Format, LogLevel};

/// The log target of the external chat client library.
const CLIENT_LOG_TARGET: &str = "irc";

/// Returns a list of resource detectors to use to enrich OTel attributes.
fn otel_resource_detectors() -> Vec<Box<dyn ResourceDetector>> {
    vec![
        Box::new(EnvResourceDetector::default()),
        Box::new(OsResourceDetector),
        Box::new(HostResourceDetector::default()),
        Box::new(K8sResourceDetector),
    ]
}

/// Builds the log filter from `RUST_LOG`, falling back to debug output for this crate, and
/// applies the configured verbosity of the client library on top.
fn env_filter(client_log_level: LogLevel) -> miette::Result<EnvFilter> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| concat!(env!("CARGO_CRATE_NAME"), "=debug").into());
    let directive: Directive = format!("{CLIENT_LOG_TARGET}={}", client_log_level.as_directive())
        .parse()
        .into_diagnostic()
        .wrap_err("invalid client log directive")?;

    Ok(filter.add_directive(directive))
}

/// Initializes the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built or a global subscriber has already been
/// set.
pub fn try_init(tracing: &config::TracingConfig, client_log_level: LogLevel) -> miette::Result<()> {
    // Create a tracing layer with the configured tracer
    let telemetry_layer = if tracing.enabled {
        // Set up the OTLP exporter
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .build()
            .into_diagnostic()
            .wrap_err("building otlp http exporter failed")?;
        // Set up resource detectors to enrich otel attributes
        let res_detectors = otel_resource_detectors();
        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(otlp_exporter)
            .with_resource(
                Resource::builder_empty()
                    .with_service_name(env!("CARGO_PKG_NAME"))
                    .with_detectors(&res_detectors)
                    .build(),
            )
            .build();
        let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_schema_url("https://opentelemetry.io/schema/1.0.0")
            .build();
        let tracer = provider.tracer_with_scope(scope);
        let layer = tracing_opentelemetry::layer().with_tracer(tracer);

        Some(layer)
    } else {
        None
    };

    let stdout_layer = match tracing.format {
        Format::Json => tracing_subscriber::fmt::layer().json().boxed(),
        Format::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        Format::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    // initialize tracing
    tracing_subscriber::registry()
        .with(env_filter(client_log_level)?)
        .with(telemetry_layer)
        .with(stdout_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("could not init registry")?;

    info!("tracing initialized");

    Ok(())
}
