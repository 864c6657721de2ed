use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{self, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use platform_api::ApiError;
use platform_authn::{IdentityAdmin, JwtVerifier};
use products_crm::{
    Crm,
    access::Access,
    admin::AdminGate,
    intake::ApplicationForm,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::AppConfig,
    graphql::{self, SchemaType},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub crm: Crm,
    pub schema: SchemaType,
    pub access: Access,
    pub admin: Option<AdminGate>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the engine, the token verifier and, when configured, the identity provider.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<AppConfig>,
        identity: Option<Arc<dyn IdentityAdmin>>,
    ) -> Self {
        let crm = Crm::new(db.clone());
        let access = Access::new(db.clone(), Arc::new(JwtVerifier::new(config.jwt_secret.clone())));
        let admin = identity.map(|identity| AdminGate::new(db.clone(), access.clone(), identity));
        Self {
            schema: graphql::build_schema(crm.clone()),
            crm,
            access,
            admin,
            config,
            db,
        }
    }
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "deal desk server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/graphql", post(graphql_handler))
        .route("/api/admin/users", post(admin_users_handler))
        .route("/api/applications", post(application_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Attaches the caller when the token resolves. Resolvers decide what an anonymous or
/// unprofiled request may see.
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let mut req = request.into_inner();
    if let Some(header) = authorization(&headers) {
        match state.access.authenticate(Some(header)).await {
            Ok(caller) => req = req.data(caller),
            Err(err) => tracing::debug!(code = err.code(), "graphql request without caller"),
        }
    }
    state.schema.execute(req).await.into()
}

async fn admin_users_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResult<Response> {
    let Some(gate) = state.admin.as_ref() else {
        return Err(HttpError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "identity provider not configured",
        ));
    };
    let response = gate.handle(authorization(&headers), &body).await?;
    Ok(Json(response).into_response())
}

async fn application_handler(
    State(state): State<AppState>,
    Json(form): Json<ApplicationForm>,
) -> HttpResult<Response> {
    let application = state
        .crm
        .intake
        .submit(form)
        .await
        .map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.db.get_database_backend();
    let db_ok = state
        .db
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            ok: db_ok,
            db_ok,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    body: platform_api::ErrorBody,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            body: platform_api::ErrorBody {
                error: msg.to_string(),
                code: "UNAVAILABLE",
            },
        }
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: err.body(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
