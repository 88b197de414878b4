use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use buy_flow::{
    BuyFlowError, BuyFlowUpdate, FlowRunner, FlowStep, IdentityForm, IdentityInfo,
    InMemorySessionStorage, Phone, PhoneListItem, PlanCatalog, PlanSelectionForm, RequestKind,
    Session, SignInForm, TradeInOffer, TradeInRequest, UserInfo, assemble_cart_view,
    identity::existing_customer, prepare_plan_submission, scratch_keys,
    state::PhoneDetailsPatch,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    collaborators::{
        CartService, HttpCartService, HttpTradeInService, MockCartService, MockTradeInService,
        TradeInService,
    },
    config::Config,
    metadata::{MetadataProbe, ServerInfo},
    models::{
        ApiResponse, CartResponse, SearchQuery, SelectPhoneRequest, TradeInQuoteRequest,
        TradeInResponse,
    },
    products::ProductCatalog,
};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const CART_FAILURE_MESSAGE: &str = "Failed to add to cart. Please try again.";
pub const TRADE_IN_FAILURE_MESSAGE: &str = "Unable to get a trade-in offer. Please try again.";

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn upstream_error(message: &str) -> ApiError {
    (StatusCode::BAD_GATEWAY, Json(json!({ "error": message })))
}

fn phone_not_found(id: &str) -> ApiError {
    let body = ApiResponse::<Phone>::failure(format!("Phone not found: {id}"));
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::to_value(body).unwrap_or(Value::Null)),
    )
}

fn flow_error(err: BuyFlowError) -> ApiError {
    match &err {
        BuyFlowError::SessionNotFound(id) => not_found_error("Session not found", id),
        BuyFlowError::PhoneNotFound(id) => phone_not_found(id),
        BuyFlowError::InvalidField(_) | BuyFlowError::InvalidSelection(_) => {
            bad_request_error(&err.to_string())
        }
        BuyFlowError::InvalidSignIn(fields) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": err.to_string(),
                "fields": fields
            })),
        ),
        BuyFlowError::Collaborator(message) => upstream_error(message),
        BuyFlowError::Superseded(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": err.to_string() })),
        ),
        BuyFlowError::Serialization(_) => {
            error!(error = %err, "Buy-flow operation failed");
            internal_error("Buy-flow operation failed", &err.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runner: FlowRunner,
    pub catalog: Arc<ProductCatalog>,
    pub cart_service: Arc<dyn CartService>,
    pub trade_in_service: Arc<dyn TradeInService>,
    pub metadata: MetadataProbe,
}

impl AppState {
    /// Wire collaborators from config: HTTP clients when a URL is set,
    /// in-process mocks otherwise.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(ProductCatalog::bundled()?);

        let cart_service: Arc<dyn CartService> = match &config.cart_api_url {
            Some(url) => {
                info!(url = %url, "Using HTTP cart service");
                Arc::new(HttpCartService::new(url)?)
            }
            None => {
                info!("Using mock cart service (set CART_API_URL to use a remote one)");
                Arc::new(MockCartService::new(catalog.plans().clone()))
            }
        };

        let trade_in_service: Arc<dyn TradeInService> = match &config.trade_in_api_url {
            Some(url) => {
                info!(url = %url, "Using HTTP trade-in service");
                Arc::new(HttpTradeInService::new(url)?)
            }
            None => {
                info!("Using mock trade-in service (set TRADE_IN_API_URL to use a remote one)");
                Arc::new(MockTradeInService)
            }
        };

        Ok(Self {
            runner: FlowRunner::new(Arc::new(InMemorySessionStorage::new())),
            catalog,
            cart_service,
            trade_in_service,
            metadata: MetadataProbe::new(config.metadata.clone())?,
        })
    }
}

/// Middleware to add correlation ID to all requests
pub async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/server-info", get(server_info))
        .route("/api/phones", get(list_phones))
        .route("/api/phones/brands", get(list_brands))
        .route("/api/phones/search", get(search_phones))
        .route("/api/phones/promotions", get(promotional_phones))
        .route("/api/phones/brand/{brand}", get(phones_by_brand))
        .route("/api/phones/{id}", get(get_phone))
        .route("/api/plans", get(list_plans))
        .route("/api/cart", post(add_to_cart))
        .route("/api/trade-in-offer", post(trade_in_offer))
        .route("/api/buy-flow", post(create_session))
        .route("/api/buy-flow/{id}", get(get_session).delete(clear_session))
        .route("/api/buy-flow/{id}/update", post(update_session))
        .route("/api/buy-flow/{id}/back", post(step_back))
        .route("/api/buy-flow/{id}/phone", post(select_phone))
        .route(
            "/api/buy-flow/{id}/trade-in",
            post(quote_trade_in).delete(remove_trade_in),
        )
        .route("/api/buy-flow/{id}/plans", post(submit_plans))
        .route("/api/buy-flow/{id}/cart", get(get_cart))
        .route("/api/buy-flow/{id}/sign-in", post(sign_in))
        .route("/api/buy-flow/{id}/identity", post(verify_identity))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(state.metadata.server_info().await)
}

fn list_items(phones: &[&Phone]) -> Vec<PhoneListItem> {
    phones.iter().map(|phone| PhoneListItem::from(*phone)).collect()
}

async fn list_phones(State(state): State<AppState>) -> Json<ApiResponse<Vec<PhoneListItem>>> {
    let items = state.catalog.phones().iter().map(PhoneListItem::from).collect();
    Json(ApiResponse::ok(items))
}

async fn get_phone(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Phone>> {
    state
        .catalog
        .phone(&id)
        .map(|phone| Json(ApiResponse::ok(phone.clone())))
        .ok_or_else(|| flow_error(BuyFlowError::PhoneNotFound(id.clone())))
}

async fn phones_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> Json<ApiResponse<Vec<PhoneListItem>>> {
    Json(ApiResponse::ok(list_items(&state.catalog.by_brand(&brand))))
}

async fn list_brands(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let brands = state
        .catalog
        .brands()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(ApiResponse::ok(brands))
}

async fn search_phones(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<PhoneListItem>>> {
    let term = query.q.unwrap_or_default();
    Json(ApiResponse::ok(list_items(&state.catalog.search(&term))))
}

async fn promotional_phones(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<PhoneListItem>>> {
    Json(ApiResponse::ok(list_items(&state.catalog.with_promotions())))
}

async fn list_plans(State(state): State<AppState>) -> Json<PlanCatalog> {
    Json(state.catalog.plans().clone())
}

async fn add_to_cart(
    State(state): State<AppState>,
    Json(payload): Json<buy_flow::CartPayload>,
) -> ApiResult<Value> {
    state.cart_service.add_to_cart(&payload).await.map(Json).map_err(|e| {
        error!(error = %e, "Cart request failed");
        flow_error(BuyFlowError::Collaborator(CART_FAILURE_MESSAGE.to_string()))
    })
}

async fn trade_in_offer(
    State(state): State<AppState>,
    Json(request): Json<TradeInRequest>,
) -> ApiResult<TradeInOffer> {
    state.trade_in_service.quote(&request).await.map(Json).map_err(|e| {
        warn!(error = %e, "Trade-in quote failed");
        flow_error(BuyFlowError::Collaborator(TRADE_IN_FAILURE_MESSAGE.to_string()))
    })
}

async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<Session>), ApiError> {
    let session = state.runner.create().await.map_err(flow_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Session> {
    state.runner.load(&session_id).await.map(Json).map_err(flow_error)
}

async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Session> {
    info!(session_id = %session_id, "Clearing buy flow");
    state.runner.clear(&session_id).await.map(Json).map_err(flow_error)
}

async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(update): Json<BuyFlowUpdate>,
) -> ApiResult<Session> {
    state
        .runner
        .apply(&session_id, &update)
        .await
        .map(Json)
        .map_err(flow_error)
}

async fn step_back(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Session> {
    let (session, ()) = state
        .runner
        .modify(&session_id, |session| {
            session.step_back();
            Ok(())
        })
        .await
        .map_err(flow_error)?;
    Ok(Json(session))
}

async fn select_phone(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectPhoneRequest>,
) -> ApiResult<Session> {
    let phone = state
        .catalog
        .phone(&request.phone_id)
        .ok_or_else(|| flow_error(BuyFlowError::PhoneNotFound(request.phone_id.clone())))?;
    let patch = PhoneDetailsPatch::from_selection(
        phone,
        request.color.as_deref(),
        request.storage.as_deref(),
    );

    let (session, ()) = state
        .runner
        .modify(&session_id, |session| {
            session.state = session.state.update_phone_details(&patch);
            session.advance_to(FlowStep::Plans);
            Ok(())
        })
        .await
        .map_err(flow_error)?;

    info!(session_id = %session_id, phone_id = %phone.id, "Phone selected");
    Ok(Json(session))
}

async fn quote_trade_in(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<TradeInQuoteRequest>,
) -> ApiResult<TradeInResponse> {
    let session = state.runner.load(&session_id).await.map_err(flow_error)?;
    let ticket = state
        .runner
        .begin_request(&session_id, RequestKind::TradeIn)
        .await
        .map_err(flow_error)?;

    let quote_request = TradeInRequest {
        phone_id: session.state.phone_details.phone_id.unwrap_or_default(),
        tradein_brand: request.tradein_brand,
        tradein_model: request.tradein_model,
        condition: request.condition.clone(),
    };
    let offer = state
        .trade_in_service
        .quote(&quote_request)
        .await
        .map_err(|e| {
            warn!(session_id = %session_id, error = %e, "Trade-in quote failed");
            flow_error(BuyFlowError::Collaborator(TRADE_IN_FAILURE_MESSAGE.to_string()))
        })?;

    let (session, ()) = state
        .runner
        .modify(&session_id, |session| {
            if !ticket.is_live() {
                warn!(session_id = %session.id, "Dropping stale trade-in quote");
                return Err(BuyFlowError::Superseded(ticket.kind().to_string()));
            }
            session.state = session
                .state
                .update_trade_in_details(&offer.accepted(request.condition.as_deref()));
            session.scratch.set(scratch_keys::TRADE_IN_OFFER, &offer)?;
            Ok(())
        })
        .await
        .map_err(flow_error)?;

    Ok(Json(TradeInResponse { offer, session }))
}

async fn remove_trade_in(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Session> {
    let (session, ()) = state
        .runner
        .modify(&session_id, |session| {
            session.remove_trade_in();
            Ok(())
        })
        .await
        .map_err(flow_error)?;

    info!(session_id = %session_id, "Trade-in removed");
    Ok(Json(session))
}

async fn submit_plans(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(form): Json<PlanSelectionForm>,
) -> ApiResult<CartResponse> {
    let submission = prepare_plan_submission(state.catalog.plans(), &form)
        .map_err(|e| flow_error(e.into()))?;

    // Plan choices are recorded before the cart is called and survive a cart failure.
    let (_, ticket) = state
        .runner
        .modify(&session_id, |session| {
            session.state = submission.apply_to(&session.state);
            Ok(session.requests.begin(RequestKind::Cart))
        })
        .await
        .map_err(flow_error)?;

    let cart = state
        .cart_service
        .add_to_cart(&submission.payload)
        .await
        .map_err(|e| {
            error!(session_id = %session_id, error = %e, "Cart request failed");
            flow_error(BuyFlowError::Collaborator(CART_FAILURE_MESSAGE.to_string()))
        })?;

    let (_, view) = state
        .runner
        .modify(&session_id, |session| {
            if !ticket.is_live() {
                warn!(session_id = %session.id, "Dropping stale cart response");
                return Err(BuyFlowError::Superseded(ticket.kind().to_string()));
            }
            session.scratch.set(scratch_keys::CART_DATA, &cart)?;
            session.advance_to(FlowStep::Cart);
            Ok(assemble_cart_view(&cart))
        })
        .await
        .map_err(flow_error)?;

    info!(session_id = %session_id, empty = view.is_empty(), "Cart updated");
    Ok(Json(CartResponse {
        session_id,
        cart: view,
    }))
}

async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<CartResponse> {
    let session = state.runner.load(&session_id).await.map_err(flow_error)?;
    let cart = session
        .scratch
        .get_raw(scratch_keys::CART_DATA)
        .unwrap_or(Value::Null);

    Ok(Json(CartResponse {
        session_id,
        cart: assemble_cart_view(&cart),
    }))
}

async fn sign_in(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(form): Json<SignInForm>,
) -> ApiResult<UserInfo> {
    let user = form
        .sign_in()
        .map_err(|errors| flow_error(BuyFlowError::InvalidSignIn(errors)))?;

    state
        .runner
        .modify(&session_id, |session| {
            session.state = session.state.update_customer_details(&existing_customer());
            session.scratch.set(scratch_keys::USER_INFO, &user)?;
            session.advance_to(FlowStep::IdentityProtection);
            Ok(())
        })
        .await
        .map_err(flow_error)?;

    info!(session_id = %session_id, username = %user.username, "Customer signed in");
    Ok(Json(user))
}

async fn verify_identity(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(form): Json<IdentityForm>,
) -> ApiResult<IdentityInfo> {
    let identity = form.verify().map_err(|e| flow_error(e.into()))?;

    state
        .runner
        .modify(&session_id, |session| {
            session.scratch.set(scratch_keys::IDENTITY_INFO, &identity)?;
            session.advance_to(FlowStep::Checkout);
            Ok(())
        })
        .await
        .map_err(flow_error)?;

    info!(session_id = %session_id, "Identity verified");
    Ok(Json(identity))
}
