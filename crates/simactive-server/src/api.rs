use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use simactive_core::DomainServices;
use simactive_shared::{Context, EntityId, Provider, RepoResult, Service, Sim, UsedService};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::validate;

#[derive(Clone)]
pub struct AppState {
    pub services: DomainServices,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sims", post(sim_add).get(sim_list))
        .route("/sims/:id", get(sim_get).delete(sim_remove))
        .route("/sims/:id/activate", post(sim_activate))
        .route("/sims/:id/block", post(sim_block))
        .route("/sims/:id/provider", put(sim_change_provider))
        .route("/sims/:id/used", get(sim_used_services))
        .route("/services", post(service_add).get(service_list))
        .route("/services/:id", put(service_rename).delete(service_remove))
        .route("/providers", post(provider_add).get(provider_list))
        .route("/used", post(used_add).get(used_list))
        .route("/used/:id/block", post(used_block))
        .route("/used/:id", delete(used_remove))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cancels the request context when the handler future is dropped, which
/// happens when the client goes away mid-request.
struct CancelOnDrop(Context);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Run a blocking domain call on the blocking pool under a fresh request
/// context.
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&Context) -> RepoResult<T> + Send + 'static,
{
    let ctx = Context::with_timeout(state.config.request_timeout);
    let _cancel = CancelOnDrop(ctx.clone());

    let result = tokio::task::spawn_blocking(move || op(&ctx))
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?;
    Ok(result?)
}

// ─── Wire types ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct IdResponse {
    id: EntityId,
}

#[derive(Deserialize)]
struct AddSimRequest {
    number: String,
    provider_name: String,
    #[serde(default)]
    is_activated: bool,
    #[serde(default)]
    is_blocked: bool,
    #[serde(default)]
    activate_until: i64,
}

#[derive(Serialize)]
struct AddSimResponse {
    id: EntityId,
    message: String,
}

#[derive(Serialize)]
struct SimListResponse {
    sims: Vec<Sim>,
}

#[derive(Deserialize)]
struct ChangeProviderRequest {
    provider_name: String,
}

#[derive(Deserialize)]
struct NameRequest {
    name: String,
}

#[derive(Serialize)]
struct ServiceListResponse {
    services: Vec<Service>,
}

#[derive(Serialize)]
struct ProviderListResponse {
    providers: Vec<Provider>,
}

#[derive(Deserialize)]
struct UseSimRequest {
    sim_id: EntityId,
    service_id: EntityId,
}

#[derive(Deserialize)]
struct BlockUsedRequest {
    #[serde(default)]
    info: String,
}

#[derive(Serialize)]
struct UsedServiceListResponse {
    used_services: Vec<UsedService>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Sims ───

async fn sim_add(
    State(state): State<AppState>,
    Json(req): Json<AddSimRequest>,
) -> Result<Json<AddSimResponse>, ServerError> {
    validate::sim_number(&req.number)?;
    validate::provider_name(&req.provider_name)?;

    let mut sim = Sim::new(req.number, Provider::new(req.provider_name));
    sim.is_activated = req.is_activated;
    sim.is_blocked = req.is_blocked;
    sim.activate_until = req.activate_until;
    let number = sim.number.clone();

    let svc = state.services.sims.clone();
    let id = run_blocking(&state, move |ctx| svc.add(ctx, sim)).await?;

    info!(id, number = %number, "Sim added via API");
    Ok(Json(AddSimResponse {
        id,
        message: format!("sim card {number} added"),
    }))
}

async fn sim_list(State(state): State<AppState>) -> Result<Json<SimListResponse>, ServerError> {
    let svc = state.services.sims.clone();
    let sims = run_blocking(&state, move |ctx| svc.list(ctx)).await?;
    Ok(Json(SimListResponse { sims }))
}

async fn sim_get(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Sim>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.sims.clone();
    let sim = run_blocking(&state, move |ctx| svc.by_id(ctx, id)).await?;
    Ok(Json(sim))
}

async fn sim_remove(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<IdResponse>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.sims.clone();
    run_blocking(&state, move |ctx| svc.remove(ctx, id)).await?;
    Ok(Json(IdResponse { id }))
}

async fn sim_activate(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.sims.clone();
    let sim = run_blocking(&state, move |ctx| svc.activate(ctx, id)).await?;
    Ok(Json(serde_json::json!({ "is_activated": sim.is_activated })))
}

async fn sim_block(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.sims.clone();
    let sim = run_blocking(&state, move |ctx| svc.block(ctx, id)).await?;
    Ok(Json(serde_json::json!({ "is_blocked": sim.is_blocked })))
}

async fn sim_change_provider(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(req): Json<ChangeProviderRequest>,
) -> Result<Json<Sim>, ServerError> {
    let id = validate::id(id)?;
    validate::provider_name(&req.provider_name)?;

    let svc = state.services.sims.clone();
    let sim = run_blocking(&state, move |ctx| {
        svc.change_provider(ctx, id, &req.provider_name)
    })
    .await?;
    Ok(Json(sim))
}

async fn sim_used_services(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<UsedServiceListResponse>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.sims.clone();
    let used_services = run_blocking(&state, move |ctx| svc.used_services(ctx, id)).await?;
    Ok(Json(UsedServiceListResponse { used_services }))
}

// ─── Services ───

async fn service_add(
    State(state): State<AppState>,
    Json(req): Json<NameRequest>,
) -> Result<Json<IdResponse>, ServerError> {
    validate::service_name(&req.name)?;
    let svc = state.services.services.clone();
    let id = run_blocking(&state, move |ctx| svc.add(ctx, &req.name)).await?;
    Ok(Json(IdResponse { id }))
}

async fn service_list(
    State(state): State<AppState>,
) -> Result<Json<ServiceListResponse>, ServerError> {
    let svc = state.services.services.clone();
    let services = run_blocking(&state, move |ctx| svc.list(ctx)).await?;
    Ok(Json(ServiceListResponse { services }))
}

async fn service_rename(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(req): Json<NameRequest>,
) -> Result<Json<Service>, ServerError> {
    let id = validate::id(id)?;
    validate::service_name(&req.name)?;
    let svc = state.services.services.clone();
    let service = run_blocking(&state, move |ctx| svc.rename(ctx, id, &req.name)).await?;
    Ok(Json(service))
}

async fn service_remove(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<IdResponse>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.services.clone();
    run_blocking(&state, move |ctx| svc.remove(ctx, id)).await?;
    Ok(Json(IdResponse { id }))
}

// ─── Providers ───

async fn provider_add(
    State(state): State<AppState>,
    Json(req): Json<NameRequest>,
) -> Result<Json<IdResponse>, ServerError> {
    validate::provider_name(&req.name)?;
    let svc = state.services.providers.clone();
    let id = run_blocking(&state, move |ctx| svc.add(ctx, &req.name)).await?;
    Ok(Json(IdResponse { id }))
}

async fn provider_list(
    State(state): State<AppState>,
) -> Result<Json<ProviderListResponse>, ServerError> {
    let svc = state.services.providers.clone();
    let providers = run_blocking(&state, move |ctx| svc.list(ctx)).await?;
    Ok(Json(ProviderListResponse { providers }))
}

// ─── Used services ───

async fn used_add(
    State(state): State<AppState>,
    Json(req): Json<UseSimRequest>,
) -> Result<Json<IdResponse>, ServerError> {
    let sim_id = validate::id(req.sim_id)?;
    let service_id = validate::id(req.service_id)?;
    let svc = state.services.used.clone();
    let id = run_blocking(&state, move |ctx| {
        svc.use_sim_for_service(ctx, sim_id, service_id)
    })
    .await?;
    Ok(Json(IdResponse { id }))
}

async fn used_list(
    State(state): State<AppState>,
) -> Result<Json<UsedServiceListResponse>, ServerError> {
    let svc = state.services.used.clone();
    let used_services = run_blocking(&state, move |ctx| svc.list(ctx)).await?;
    Ok(Json(UsedServiceListResponse { used_services }))
}

async fn used_block(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(req): Json<BlockUsedRequest>,
) -> Result<Json<UsedService>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.used.clone();
    let used = run_blocking(&state, move |ctx| svc.block(ctx, id, &req.info)).await?;
    Ok(Json(used))
}

async fn used_remove(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> Result<Json<IdResponse>, ServerError> {
    let id = validate::id(id)?;
    let svc = state.services.used.clone();
    run_blocking(&state, move |ctx| svc.remove(ctx, id)).await?;
    Ok(Json(IdResponse { id }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
