use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,netlink_server=info,sqlx=warn,sea_orm=warn";

/// Installs the global subscriber: env-filtered fmt output (JSON or text) plus an OTLP span
/// exporter when an endpoint is configured.
pub fn init_telemetry(service_name: &str, config: &TelemetryConfig) -> Result<(), opentelemetry::trace::TraceError> {
    // Store chatter stays at warn unless RUST_LOG says otherwise.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let otel_layer = match &config.otlp_endpoint {
        Some(endpoint) => {
            let resource = Resource::new(vec![KeyValue::new(
                resource::SERVICE_NAME,
                service_name.to_string(),
            )]);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint.clone()),
                )
                .with_trace_config(
                    sdktrace::config()
                        .with_resource(resource)
                        .with_sampler(sdktrace::Sampler::AlwaysOn),
                )
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    if config.json_logs {
        // Event fields at the top level, no timestamp; the collector stamps lines.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .without_time();
        registry.with(otel_layer).with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        registry.with(otel_layer).with(fmt_layer).init();
    }

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!(%endpoint, "exporting traces over OTLP");
    }
    Ok(())
}
