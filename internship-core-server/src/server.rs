//! Router assembly and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use internship_core_postgres::migrate::run_migrations;
use internship_core_postgres::PgStore;
use internship_core_service::{NullCourier, SweepKind, SystemClock};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handlers::{approvals, auth, evaluations, health};
use crate::shutdown;
use crate::state::AppState;

/// Every route of the API, with tracing and CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health::health))
        // Sessions and credentials
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/password-reset/request", post(auth::password_reset_request))
        .route("/password-reset/confirm", post(auth::password_reset_confirm))
        .route("/password/change", post(auth::password_change))
        .route("/email-verify/request", post(auth::email_verify_request))
        .route("/email-verify/confirm", post(auth::email_verify_confirm))
        .route("/me", get(auth::me))
        // Approvals
        .route("/approvals", get(approvals::list).post(approvals::register))
        .route("/approvals/{id}", get(approvals::get))
        .route("/approvals/{id}/history", get(approvals::history))
        .route("/approvals/{id}/committee", post(approvals::assign_committee))
        .route("/approvals/{id}/advisor-approve", post(approvals::advisor_approve))
        .route("/approvals/{id}/advisor-reject", post(approvals::advisor_reject))
        .route("/approvals/{id}/committee-approve", post(approvals::committee_approve))
        .route("/approvals/{id}/committee-reject", post(approvals::committee_reject))
        .route("/approvals/{id}/withdraw", post(approvals::withdraw))
        // Trainings and evaluations
        .route("/trainings", post(evaluations::register_training))
        .route("/trainings/{id}/evaluations", get(evaluations::training_summary))
        .route("/me/evaluations", get(evaluations::my_evaluations))
        .route("/evaluations", get(evaluations::list))
        .route("/evaluations/overdue", get(evaluations::overdue))
        .route("/evaluations/stats", get(evaluations::stats))
        .route("/evaluations/sweep", post(evaluations::sweep))
        .route("/evaluations/{id}/assign", post(evaluations::assign))
        .route("/evaluations/{id}/complete", post(evaluations::complete))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Connect, optionally migrate, start the sweep workers and serve until a
/// termination signal arrives.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.store_config()).await?;
    if config.db_auto_migrate {
        run_migrations(store.pool()).await?;
        info!("Migrations applied");
    }

    let state = AppState::new(
        Arc::new(store),
        Arc::new(SystemClock),
        config.auth_settings()?,
        config.sweep_settings()?,
        config.request_timeout,
        Arc::new(NullCourier),
    )?
    .with_trusted_proxy(config.trust_forwarded_for);

    let (stop_tx, stop_rx) = watch::channel(false);
    let workers: Vec<_> = SweepKind::ALL
        .into_iter()
        .map(|kind| state.sweeper.clone().spawn_worker(kind, stop_rx.clone()))
        .collect();

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown::signal())
    .await?;

    // A send error means every worker already exited.
    _ = stop_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "Sweep worker did not stop cleanly");
        }
    }
    info!("Shutdown complete");
    Ok(())
}
