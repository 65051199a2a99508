use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The dashboard runs on its own origin
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    let max_csv_bytes = app_state.config.authoring.max_csv_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .route(
            "/api/v1/question-csv/template",
            get(handlers::authoring::download_template),
        )
        .nest("/api/v1/authoring", authoring_routes(max_csv_bytes))
        .nest("/api/v1/catalog", catalog_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn authoring_routes(max_csv_bytes: usize) -> Router<Arc<AppState>> {
    use handlers::authoring;

    Router::new()
        .route("/sessions", post(authoring::create_session))
        .route(
            "/sessions/{id}",
            get(authoring::get_session).delete(authoring::discard_session),
        )
        .route("/sessions/{id}/topics", get(authoring::list_topics))
        .route("/sessions/{id}/questions", post(authoring::add_question))
        .route(
            "/sessions/{id}/questions/{qid}",
            patch(authoring::update_question).delete(authoring::delete_question),
        )
        .route(
            "/sessions/{id}/questions/{qid}/options",
            post(authoring::add_option),
        )
        .route(
            "/sessions/{id}/questions/{qid}/options/{index}",
            patch(authoring::update_option).delete(authoring::remove_option),
        )
        .route(
            "/sessions/{id}/questions/{qid}/options/{index}/toggle-correct",
            post(authoring::toggle_option_correct),
        )
        .route(
            "/sessions/{id}/questions/{qid}/true-false-answer",
            put(authoring::set_true_false_answer),
        )
        .route(
            "/sessions/{id}/import",
            post(authoring::import_csv).layer(DefaultBodyLimit::max(max_csv_bytes)),
        )
        .route("/sessions/{id}/validate", post(authoring::validate_session))
        .route("/sessions/{id}/submit", post(authoring::submit_session))
}

fn catalog_routes() -> Router<Arc<AppState>> {
    use handlers::catalog;

    Router::new()
        .route("/subjects", post(catalog::create_subject))
        .route("/subjects/{id}", patch(catalog::update_subject))
        .route("/topics", post(catalog::create_topic))
        .route("/topics/{id}", put(catalog::update_topic))
        .route("/roles", post(catalog::create_role))
        .route("/roles/{id}/permissions", post(catalog::assign_permissions))
        .route("/permissions", post(catalog::create_permission))
}
