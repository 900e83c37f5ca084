//! Web UI host for the product store.
//!
//! Serves the list/editor page and a REST API over the store. Presentation,
//! confirmation dialogs, and outbound mail live on this side of the
//! boundary; the store only ever sees rows and counts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::contract::{ProductUri, StoreContract};
use crate::error::InventoryError;
use crate::product::{NewProduct, Product, ProductPatch, ProductSummary};
use crate::quantity::{self, OrderMessage};
use crate::store::ProductStore;

/// Shared application state (store handle + addressing configuration)
#[derive(Clone)]
struct AppState {
    store: ProductStore,
    contract: StoreContract,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    reply(StatusCode::OK, data)
}

fn reply<T>(status: StatusCode, data: T) -> Reply<T> {
    (
        status,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
}

fn failure<T>(status: StatusCode, message: impl Into<String>) -> Reply<T> {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
}

fn error_reply<T>(err: InventoryError) -> Reply<T> {
    match err {
        InventoryError::InvalidArgument(message) => failure(StatusCode::BAD_REQUEST, message),
        InventoryError::Database(e) => {
            log::error!("Database error: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "database error")
        }
    }
}

fn not_found<T>(id: i64) -> Reply<T> {
    failure(StatusCode::NOT_FOUND, format!("no product with id {id}"))
}

/// GET / - Serve the web UI (single HTML page)
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Contract description exposed to external callers
#[derive(Serialize)]
struct ContractInfo {
    authority: String,
    collection_uri: String,
    collection_type: String,
    item_type: String,
}

/// GET /api/contract - How this store is addressed
async fn contract_handler(State(state): State<AppState>) -> Reply<ContractInfo> {
    let contract = &state.contract;
    ok(ContractInfo {
        authority: contract.authority().to_string(),
        collection_uri: contract.collection_uri(),
        collection_type: contract.content_type(&ProductUri::Collection),
        item_type: contract.content_type(&ProductUri::Item(0)),
    })
}

/// GET /api/products - List projection of every product
async fn list_handler(State(state): State<AppState>) -> Reply<Vec<ProductSummary>> {
    match state.store.list_summaries() {
        Ok(products) => ok(products),
        Err(e) => error_reply(e),
    }
}

/// A freshly inserted product: its id and item URI
#[derive(Serialize)]
struct InsertedProduct {
    id: i64,
    uri: String,
}

/// POST /api/products - Insert a validated new product
async fn create_handler(
    State(state): State<AppState>,
    Json(payload): Json<NewProduct>,
) -> Reply<InsertedProduct> {
    if let Err(e) = payload.validate() {
        return error_reply(e);
    }
    match state.store.insert(&payload) {
        Ok(id) => reply(
            StatusCode::CREATED,
            InsertedProduct {
                id,
                uri: state.contract.item_uri(id),
            },
        ),
        Err(e) => error_reply(e),
    }
}

/// GET /api/products/{id} - Full row for the editor
///
/// The read runs off this handler's task; tearing the request down simply
/// abandons the handle.
async fn get_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Reply<Product> {
    match state.store.spawn_query_by_id(id).await {
        Ok(Ok(Some(product))) => ok(product),
        Ok(Ok(None)) => not_found(id),
        Ok(Err(e)) => error_reply(e),
        Err(e) => {
            log::error!("Query task failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "query task failed")
        }
    }
}

/// Affected-row count of a mutating call
#[derive(Serialize)]
struct AffectedRows {
    affected: usize,
}

/// PUT /api/products/{id} - Rewrite the named columns of one row
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> Reply<AffectedRows> {
    if let Err(e) = patch.validate() {
        return error_reply(e);
    }
    match state.store.update(id, &patch) {
        Ok(0) => not_found(id),
        Ok(affected) => ok(AffectedRows { affected }),
        Err(e) => error_reply(e),
    }
}

/// DELETE /api/products/{id} - Remove one row
async fn delete_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Reply<AffectedRows> {
    match state.store.delete(id) {
        Ok(0) => not_found(id),
        Ok(affected) => ok(AffectedRows { affected }),
        Err(e) => error_reply(e),
    }
}

/// DELETE /api/products - Bulk clear; the page confirms first
async fn delete_all_handler(State(state): State<AppState>) -> Reply<AffectedRows> {
    match state.store.delete_all() {
        Ok(affected) => ok(AffectedRows { affected }),
        Err(e) => error_reply(e),
    }
}

/// Unit count for a sale/shipment/reorder action
#[derive(Deserialize)]
struct AdjustRequest {
    count: i64,
}

fn refreshed_row(state: &AppState, id: i64) -> Reply<Product> {
    match state.store.query_by_id(id) {
        Ok(Some(product)) => ok(product),
        Ok(None) => not_found(id),
        Err(e) => error_reply(e),
    }
}

/// POST /api/products/{id}/sale - Sell `count` units (clamped at zero)
async fn sale_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdjustRequest>,
) -> Reply<Product> {
    match quantity::record_sale(&state.store, id, payload.count) {
        Ok(0) => not_found(id),
        Ok(_) => refreshed_row(&state, id),
        Err(e) => error_reply(e),
    }
}

/// POST /api/products/{id}/shipment - Receive `count` units
async fn shipment_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdjustRequest>,
) -> Reply<Product> {
    match quantity::record_shipment(&state.store, id, payload.count) {
        Ok(0) => not_found(id),
        Ok(_) => refreshed_row(&state, id),
        Err(e) => error_reply(e),
    }
}

/// POST /api/products/{id}/quick-sale - The one-tap list-row action
async fn quick_sale_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<Product> {
    match quantity::record_quick_sale(&state.store, id) {
        Ok(0) => not_found(id),
        Ok(_) => refreshed_row(&state, id),
        Err(e) => error_reply(e),
    }
}

/// POST /api/products/{id}/reorder - Compose the order mail; no mutation
async fn reorder_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdjustRequest>,
) -> Reply<OrderMessage> {
    let product = match state.store.query_by_id(id) {
        Ok(Some(product)) => product,
        Ok(None) => return not_found(id),
        Err(e) => return error_reply(e),
    };
    match quantity::order_message(&product, payload.count) {
        Ok(message) => ok(message),
        Err(e) => error_reply(e),
    }
}

/// Build the web server router
pub fn create_router(store: ProductStore, contract: StoreContract) -> Router {
    let state = AppState { store, contract };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/contract", get(contract_handler))
        .route(
            "/api/products",
            get(list_handler)
                .post(create_handler)
                .delete(delete_all_handler),
        )
        .route(
            "/api/products/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/api/products/{id}/sale", post(sale_handler))
        .route("/api/products/{id}/shipment", post(shipment_handler))
        .route("/api/products/{id}/quick-sale", post(quick_sale_handler))
        .route("/api/products/{id}/reorder", post(reorder_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces); restrict exposure with firewall rules
/// or port mapping when that is not wanted.
pub async fn serve(
    store: ProductStore,
    contract: StoreContract,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(store, contract);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Web UI listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }
}
