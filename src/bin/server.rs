use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use netlink_server::{api, config::Config, db, migrator};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    netlink_server::telemetry::init_telemetry("netlink-server", &config.telemetry)
        .expect("failed to install OpenTelemetry tracer");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = db::connect(&config.database)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    netlink_server::metrics::init_metrics(&db).await;

    let cors = cors_layer(&config.cors_allow_origin);
    let app = app(db, &config, cors, prometheus_layer, metric_handle);

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

/// `*` allows any origin; otherwise a comma-separated list of exact origins.
fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origins = if allow_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let list: Vec<HeaderValue> = allow_origin
            .split(',')
            .filter_map(|o| {
                let o = o.trim();
                match o.parse::<HeaderValue>() {
                    Ok(v) if !o.is_empty() => Some(v),
                    _ => {
                        tracing::warn!(origin = o, "ignoring unparseable CORS origin");
                        None
                    }
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn app(
    db: DatabaseConnection,
    config: &Config,
    cors: CorsLayer,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    api::router(db, Arc::new(config.session.clone()))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /route/:param" keeps span names low-cardinality
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill the business fields via Span::current().record(..)
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        paddock_id = tracing::field::Empty,
                        node_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(cors)
}
