use crate::config::ApiConfig;
use crate::core::{Block, ChainInfo, Transaction};
use crate::mining::MiningStats;
use crate::network::{BroadcastBlock, BroadcastReport, BroadcastTransaction};
use crate::node::Node;
use crate::{LedgerError, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }
}

type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub public_key: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceInfo {
    pub participant: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction: Transaction,
    pub balance: f64,
    pub broadcast: BroadcastReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinedBlock {
    pub block: Block,
    pub balance: f64,
    pub broadcast: BroadcastReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList {
    pub all_nodes: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub chain: ChainInfo,
    pub mining: MiningStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendTransactionRequest {
    pub recipient: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddNodeRequest {
    pub node: String,
}

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<Node>,
}

pub struct RestApi {
    node: Arc<Node>,
    config: ApiConfig,
}

impl RestApi {
    pub fn new(node: Arc<Node>, config: ApiConfig) -> Self {
        Self { node, config }
    }

    pub async fn start(self, port: u16) -> Result<()> {
        let addr = format!("{}:{}", self.config.bind_address, port);
        log::info!("🚀 Starting REST API on {}", addr);

        let app = create_router(self.node.clone(), &self.config.cors_origins);
        let listener = tokio::net::TcpListener::bind(&addr).await
            .map_err(|e| LedgerError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("✅ REST API listening on http://{}", addr);

        axum::serve(listener, app).await
            .map_err(|e| LedgerError::Network(format!("Server error: {}", e)))?;

        Ok(())
    }
}

pub fn create_router(node: Arc<Node>, cors_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);

    let cors = if cors_origins.is_empty() || cors_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("⚠️  Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        cors.allow_origin(origins)
    };

    Router::new()
        .route("/", get(api_root))
        .route("/health", get(health_check))
        .route("/info", get(get_node_info))

        // Wallet
        .route("/wallet", post(create_wallet).get(load_wallet))
        .route("/balance", get(get_balance))
        .route("/balance/:participant", get(get_participant_balance))

        // Transactions and blocks
        .route("/transaction", post(add_transaction))
        .route("/broadcast-transaction", post(broadcast_transaction))
        .route("/broadcast-block", post(broadcast_block))
        .route("/mine", post(mine))
        .route("/transactions", get(get_open_transactions))
        .route("/chain", get(get_chain))

        // Peers
        .route("/nodes", get(get_nodes))
        .route("/node", post(add_node))
        .route("/node/:node_url", delete(remove_node))

        .layer(ServiceBuilder::new().layer(cors))
        .with_state(AppState { node })
}

fn status_for(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::NoWallet
        | LedgerError::MiningCancelled
        | LedgerError::StaleWork
        | LedgerError::BlockOutOfOrder { .. } => StatusCode::CONFLICT,
        LedgerError::ChainCorrupted => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        e if e.is_rejection() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ok<T>(status: StatusCode, data: T) -> ApiResult<T> {
    (status, Json(ApiResponse::success(data)))
}

fn failed<T>(error: LedgerError) -> ApiResult<T> {
    (status_for(&error), Json(ApiResponse::error(error.to_string())))
}

fn bad_body<T>(rejection: JsonRejection) -> ApiResult<T> {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(format!("Invalid request body: {}", rejection.body_text()))))
}

// Handler functions

async fn api_root() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut info = HashMap::new();
    info.insert("name".to_string(), "blocklink".to_string());
    info.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    Json(ApiResponse::success(info))
}

async fn health_check() -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

    Json(ApiResponse::success(status))
}

async fn get_node_info(State(state): State<AppState>) -> Json<ApiResponse<NodeInfo>> {
    Json(ApiResponse::success(NodeInfo {
        chain: state.node.chain_info().await,
        mining: state.node.miner_stats(),
    }))
}

async fn wallet_info(node: &Node, public_key: String) -> WalletInfo {
    let balance = node.blockchain().read().await.get_balance(&public_key);
    WalletInfo { public_key, balance }
}

async fn create_wallet(State(state): State<AppState>) -> ApiResult<WalletInfo> {
    match state.node.create_wallet().await {
        Ok(public_key) => ok(StatusCode::CREATED, wallet_info(&state.node, public_key).await),
        Err(e) => failed(e),
    }
}

async fn load_wallet(State(state): State<AppState>) -> ApiResult<WalletInfo> {
    match state.node.load_wallet().await {
        Ok(public_key) => ok(StatusCode::OK, wallet_info(&state.node, public_key).await),
        Err(e) => failed(e),
    }
}

async fn get_balance(State(state): State<AppState>) -> ApiResult<BalanceInfo> {
    match state.node.balance(None).await {
        Ok((participant, balance)) => ok(StatusCode::OK, BalanceInfo { participant, balance }),
        Err(e) => failed(e),
    }
}

async fn get_participant_balance(
    State(state): State<AppState>,
    Path(participant): Path<String>,
) -> ApiResult<BalanceInfo> {
    match state.node.balance(Some(&participant)).await {
        Ok((participant, balance)) => ok(StatusCode::OK, BalanceInfo { participant, balance }),
        Err(e) => failed(e),
    }
}

async fn add_transaction(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendTransactionRequest>, JsonRejection>,
) -> ApiResult<TransactionReceipt> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match state.node.add_transaction(&request.recipient, request.amount).await {
        Ok((transaction, broadcast)) => {
            let balance = state.node.balance(Some(&transaction.sender)).await
                .map(|(_, balance)| balance)
                .unwrap_or_default();
            ok(StatusCode::CREATED, TransactionReceipt { transaction, balance, broadcast })
        }
        Err(e) => failed(e),
    }
}

async fn broadcast_transaction(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BroadcastTransaction>, JsonRejection>,
) -> ApiResult<Transaction> {
    let Json(incoming) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match state.node.receive_transaction(incoming).await {
        Ok(transaction) => ok(StatusCode::CREATED, transaction),
        Err(e) => failed(e),
    }
}

async fn broadcast_block(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BroadcastBlock>, JsonRejection>,
) -> ApiResult<Block> {
    let Json(incoming) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    let block = incoming.block;
    match state.node.add_external_block(block.clone()).await {
        Ok(()) => ok(StatusCode::CREATED, block),
        Err(e) => failed(e),
    }
}

async fn mine(State(state): State<AppState>) -> ApiResult<MinedBlock> {
    match state.node.mine_block().await {
        Ok((block, broadcast)) => {
            let balance = state.node.balance(None).await
                .map(|(_, balance)| balance)
                .unwrap_or_default();
            ok(StatusCode::CREATED, MinedBlock { block, balance, broadcast })
        }
        Err(e) => failed(e),
    }
}

async fn get_open_transactions(State(state): State<AppState>) -> Json<ApiResponse<Vec<Transaction>>> {
    Json(ApiResponse::success(state.node.open_transactions().await))
}

async fn get_chain(State(state): State<AppState>) -> Json<ApiResponse<Vec<Block>>> {
    Json(ApiResponse::success(state.node.chain().await))
}

async fn get_nodes(State(state): State<AppState>) -> Json<ApiResponse<NodeList>> {
    Json(ApiResponse::success(NodeList { all_nodes: state.node.peer_nodes().await }))
}

async fn add_node(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddNodeRequest>, JsonRejection>,
) -> ApiResult<NodeList> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    match state.node.add_peer(&request.node).await {
        Ok(_) => ok(StatusCode::CREATED, NodeList { all_nodes: state.node.peer_nodes().await }),
        Err(e) => failed(e),
    }
}

async fn remove_node(
    State(state): State<AppState>,
    Path(node_url): Path<String>,
) -> ApiResult<NodeList> {
    if node_url.trim().is_empty() {
        return failed(LedgerError::InvalidInput("No node found".to_string()));
    }

    if !state.node.remove_peer(&node_url).await {
        return (StatusCode::NOT_FOUND, Json(ApiResponse::error(format!("Unknown peer {}", node_url))));
    }

    ok(StatusCode::OK, NodeList { all_nodes: state.node.peer_nodes().await })
}
