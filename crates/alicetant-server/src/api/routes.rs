use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{appointments, auth, availability, businesses, health};
use crate::api::middleware::{auth as auth_middleware, rate_limit};
use crate::AppState;

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "not_found",
                "message": "The requested endpoint does not exist"
            }
        })),
    )
}

pub fn build(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/me", put(auth::update_me))
        .route("/businesses", get(businesses::list))
        .route("/businesses", post(businesses::create))
        .route("/businesses/:id", get(businesses::get))
        .route("/businesses/:id", put(businesses::update))
        .route("/businesses/:id", delete(businesses::delete))
        .route("/businesses/:id/availability", get(availability::list_for_business))
        .route("/businesses/:id/slot", get(appointments::check_slot))
        .route("/availability", post(availability::create))
        .route("/availability/:id", put(availability::update))
        .route("/availability/:id", delete(availability::delete))
        .route("/appointments", get(appointments::list))
        .route("/appointments", post(appointments::create))
        .route("/appointments/:id", get(appointments::get))
        .route("/appointments/:id/cancel", post(appointments::cancel))
        .layer(from_fn_with_state(state.clone(), rate_limit::middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware::middleware));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/auth/signup", post(auth::signup))
        .route("/v1/auth/login", post(auth::login));

    let api = Router::new()
        .nest("/v1", protected)
        .merge(public)
        .fallback(fallback);

    api.with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
}
