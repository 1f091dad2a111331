use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tinychain_core::{
    block_hash,
    pow::{self, CancelToken},
    resolve_conflicts, validate, Ledger, NodeRegistry, PeerClient, PeerError, RemoteChain,
    Transaction,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Give up on a mining request after this many seconds
    #[arg(long, default_value_t = 30)]
    mine_timeout_secs: u64,
}

#[derive(Clone)]
struct AppState {
    ledger: Arc<RwLock<Ledger>>,
    registry: Arc<RwLock<NodeRegistry>>,
    peers: HttpPeerClient,
    node_id: String,
    mine_timeout: Duration,
}

/// reqwest-backed implementation of the consensus network boundary.
#[derive(Clone)]
struct HttpPeerClient {
    client: reqwest::Client,
}

impl PeerClient for HttpPeerClient {
    fn fetch_chain(
        &self,
        peer: &str,
    ) -> impl Future<Output = Result<RemoteChain, PeerError>> + Send {
        let url = format!("http://{peer}/chain");
        let client = self.client.clone();
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|err| PeerError::Unreachable(err.to_string()))?;
            if !response.status().is_success() {
                return Err(PeerError::BadStatus(response.status().as_u16()));
            }
            response
                .json::<RemoteChain>()
                .await
                .map_err(|err| PeerError::MalformedBody(err.to_string()))
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn get_chain(State(state): State<AppState>) -> Json<RemoteChain> {
    let ledger = state.ledger.read().await;
    Json(RemoteChain {
        length: ledger.len() as u64,
        chain: ledger.chain().to_vec(),
    })
}

async fn chain_valid(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ledger = state.ledger.read().await;
    Json(json!({ "valid": validate::is_valid(ledger.chain()) }))
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: u64,
}

async fn submit_transaction(
    State(state): State<AppState>,
    Json(tx): Json<TxIn>,
) -> Response {
    let tx = Transaction {
        sender: tx.sender,
        recipient: tx.recipient,
        amount: tx.amount,
    };
    let mut ledger = state.ledger.write().await;
    match ledger.add_transaction(tx) {
        Ok(index) => (
            StatusCode::CREATED,
            Json(json!({
                "message": format!("transaction will be added to block {index}"),
                "index": index,
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Mines the next block on a blocking worker. The write lock is held for
/// the whole search so the pending pool and chain tip stay consistent; the
/// request itself is bounded by `--mine-timeout-secs` via a cancel token.
async fn mine(State(state): State<AppState>) -> Response {
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let ledger = state.ledger.clone();
    let node_id = state.node_id.clone();

    let task = tokio::task::spawn_blocking(move || {
        let mut ledger = ledger.blocking_write();
        let (last_proof, last_hash) = {
            let last = ledger.last_block();
            (last.proof, block_hash(last))
        };
        let proof = pow::find_proof_cancellable(last_proof, &last_hash, &worker_cancel)?;
        // one coin for the miner, from the network itself
        let reward = Transaction {
            sender: "0".to_string(),
            recipient: node_id,
            amount: 1,
        };
        ledger
            .add_transaction(reward)
            .expect("reward transaction is well formed");
        Some(ledger.commit_block(Some(proof), Some(last_hash)))
    });

    match tokio::time::timeout(state.mine_timeout, task).await {
        Ok(Ok(Some(block))) => (
            StatusCode::OK,
            Json(json!({ "message": "new block forged", "block": block })),
        )
            .into_response(),
        Ok(Ok(None)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "mining cancelled" })),
        )
            .into_response(),
        Ok(Err(err)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(_) => {
            cancel.cancel();
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "mining timed out" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct RegisterIn {
    nodes: Vec<String>,
}

async fn register_nodes(
    State(state): State<AppState>,
    Json(body): Json<RegisterIn>,
) -> Response {
    let mut registry = state.registry.write().await;
    for address in &body.nodes {
        if let Err(err) = registry.register(address) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    }
    let nodes: Vec<&str> = registry.nodes().collect();
    (
        StatusCode::CREATED,
        Json(json!({ "message": "nodes registered", "total_nodes": nodes })),
    )
        .into_response()
}

/// Runs longest-valid-chain consensus against every registered peer. Holds
/// the ledger write lock across the whole resolution so replacement is
/// atomic with respect to concurrent commits and reads.
async fn resolve(State(state): State<AppState>) -> Json<serde_json::Value> {
    let registry = state.registry.read().await;
    let mut ledger = state.ledger.write().await;
    let replaced = resolve_conflicts(&mut ledger, &registry, &state.peers).await;
    Json(json!({
        "replaced": replaced,
        "length": ledger.len(),
        "chain": ledger.chain(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let node_id = uuid::Uuid::new_v4().simple().to_string();
    info!(%node_id, "starting tinychain node");

    let state = AppState {
        ledger: Arc::new(RwLock::new(Ledger::new())),
        registry: Arc::new(RwLock::new(NodeRegistry::new())),
        peers: HttpPeerClient {
            client: reqwest::Client::new(),
        },
        node_id,
        mine_timeout: Duration::from_secs(args.mine_timeout_secs),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/chain", get(get_chain))
        .route("/chain/valid", get(chain_valid))
        .route("/transactions", post(submit_transaction))
        .route("/mine", post(mine))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", post(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!("tinychain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
