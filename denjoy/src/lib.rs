//! # denjoy: edge services for the DenJOY implant inventory platform
//!
//! The DenJOY single-page app talks to a hosted Postgres and auth platform directly for most of
//! its data. A handful of operations cannot run in the browser, either because they need a secret
//! or because they send mail. This crate serves them as HTTP functions under `/functions/v1/*`.
//!
//! ## What it serves
//!
//! - **Payment callbacks** ([`payments`]): a gateway posts the outcome of a subscription payment
//!   in whatever shape it likes (JSON, form, multipart, query string, odd key spellings). The
//!   callback is authenticated with a shared secret, normalized to
//!   `(billing_id, status, payment_ref)`, and applied by a stored procedure that owns the billing
//!   state machine.
//! - **Contact intake**: public contact and waitlist submissions with duplicate suppression and a
//!   chat notification to the operations channel.
//! - **Administration**: listing and answering inquiries, beta invite codes ([`invite_codes`]),
//!   hospital member invitations, and withdrawal notices.
//! - **Analysis reports** ([`reports`]): a free inventory analysis is parsed and mailed back as
//!   a formatted email.
//!
//! Every response is the JSON envelope defined in [`api::envelope`], carrying the request id
//! from `x-request-id`. A country gate ([`geo`]) wraps all routes.
//!
//! ## Architecture
//!
//! Handlers in [`api::handlers`] depend on [`db::Store`], implemented for Postgres by
//! [`db::PostgresStore`]. Mail goes through [`email::EmailService`] and chat notifications
//! through [`notifications::ChatNotifier`]. Both are shared in [`AppState`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use denjoy::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = denjoy::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     denjoy::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod email;
pub mod errors;
pub mod geo;
pub mod invite_codes;
pub mod notifications;
mod openapi;
pub mod payments;
pub mod reports;
pub mod telemetry;
mod templates;
pub mod types;
mod validation;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderName, HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{any::Any, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, error, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    api::envelope::{ApiError, RequestId},
    config::{CorsOrigin, PoolSettings},
    db::{PostgresStore, Store},
    email::EmailService,
    errors::Error,
    notifications::ChatNotifier,
    openapi::ApiDoc,
};

pub use types::{BillingId, HospitalId, InquiryId, InviteCodeId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .store(Arc::new(PostgresStore::new(pool)))
///     .email(Arc::new(EmailService::new(&config)?))
///     .notifier(Arc::new(ChatNotifier::new(&config.notifications)?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub email: Arc<EmailService>,
    pub notifier: Arc<ChatNotifier>,
}

/// Get the denjoy database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
}

async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = pool_options(&config.database.pool).connect(&config.database.url).await?;

    if config.database.run_migrations {
        info!("Running database migrations");
        migrator().run(&pool).await?;
    }

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.cors;

    let mut origins = Vec::new();
    for origin in &cors_config.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed = Vec::new();
    for name in &cors_config.exposed_headers {
        exposed.push(name.parse::<HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(cors_config.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            http::header::AUTHORIZATION,
            http::header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
        .expose_headers(exposed);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

async fn route_not_found(request_id: RequestId, uri: Uri) -> ApiError {
    request_id.error(Error::NotFound {
        resource: "Function".to_string(),
        id: uri.path().to_string(),
    })
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Handler panicked");

    let error = Error::Internal {
        operation: "handle request".to_string(),
    };
    (error.status_code(), Json(error.envelope(None))).into_response()
}

/// Build the main application router with all endpoints and middleware.
///
/// Layers, outermost first: request id assignment, tracing, request id propagation to the
/// response, panic recovery, CORS, the geo gate, and (when enabled) HTTP metrics.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{contact, inquiries, invite_codes, members, payments, reports, withdrawals};

    let functions = Router::new()
        .route("/submit-contact", post(contact::submit_contact))
        .route("/payment-callback", post(payments::payment_callback))
        .route("/reply-inquiry", post(inquiries::reply_inquiry))
        .route("/inquiries", get(inquiries::list_inquiries))
        .route("/inquiries/{id}", patch(inquiries::update_inquiry_status))
        .route("/invite-member", post(members::invite_member))
        .route("/send-analysis-report", post(reports::send_analysis_report))
        .route("/notify-withdrawal", post(withdrawals::notify_withdrawal))
        .route(
            "/beta-invite-codes",
            post(invite_codes::create_invite_code).get(invite_codes::list_invite_codes),
        )
        .route("/beta-invite-codes/{id}", patch(invite_codes::toggle_invite_code))
        .route("/beta-invite-codes/verify", post(invite_codes::verify_invite_code))
        .route("/beta-invite-codes/consume", post(invite_codes::consume_invite_code));

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/functions/v1", functions)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(state.config.limits.max_body_bytes))
        .with_state(state.clone());

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router
        .layer(from_fn_with_state(state.clone(), geo::geo_gate))
        .layer(create_cors_layer(&state.config)?)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    Ok(router)
}

/// The assembled service: router, configuration and database pool.
///
/// 1. **Create**: [`Application::new`] connects to Postgres, runs migrations and builds the
///    mail and notification clients
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests drain, then the pool
///    closes and telemetry flushes
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting DenJOY edge services with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState::builder()
            .config(config.clone())
            .store(Arc::new(PostgresStore::new(pool.clone())))
            .email(Arc::new(EmailService::new(&config)?))
            .notifier(Arc::new(ChatNotifier::new(&config.notifications)?))
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("DenJOY edge services listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
