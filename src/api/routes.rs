//! Application route configuration.

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    account_routes, auth_routes, category_routes, dashboard_routes, history_routes, order_routes,
    product_routes, ws_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Wrap a route group with bearer authentication and the general limit.
fn protected(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

fn cors_layer(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    match client_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(client_url, "CLIENT_URL is not a valid origin, allowing any");
            layer.allow_origin(Any)
        }
    }
}

/// Create the application router with all routes configured
pub fn create_router(state: AppState, client_url: &str) -> Router {
    let auth = auth_routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_auth_middleware,
        ))
        .merge(protected(account_routes(), &state));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(ws_routes())
        .nest("/auth", auth)
        .nest("/product", protected(product_routes(), &state))
        .nest("/category", protected(category_routes(), &state))
        .nest("/order", protected(order_routes(), &state))
        .nest("/history", protected(history_routes(), &state))
        .nest("/dashboard", protected(dashboard_routes(), &state))
        .layer(cors_layer(client_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Inventory API is running"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    redis: ServiceStatus,
    realtime_connections: usize,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy",
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        }
    }

    fn disabled() -> Self {
        Self {
            status: "disabled",
            error: None,
        }
    }

    fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

/// Database and Redis connectivity. A missing Redis is reported as
/// disabled and does not degrade the service.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => ServiceStatus::from_result(db.ping().await),
        None => ServiceStatus::disabled(),
    };
    let redis = match &state.cache {
        Some(cache) => ServiceStatus::from_result(cache.ping().await),
        None => ServiceStatus::disabled(),
    };

    let degraded = database.is_unhealthy() || redis.is_unhealthy();
    let response = HealthResponse {
        status: if degraded { "degraded" } else { "healthy" },
        services: ServiceHealth {
            database,
            redis,
            realtime_connections: state.realtime.registry().len(),
        },
    };

    let status_code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}
