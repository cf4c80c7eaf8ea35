use std::time::Duration;

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::blockchain::{Block, Blockchain, CancelToken, MiningError, Transaction};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

/// Sender address used for mining-reward transactions
const REWARD_SENDER: &str = "0";

/// Amount credited to this node for mining a block
const MINING_REWARD: u64 = 1;

/// Upper bound on a single mining request's proof search
const MINING_DEADLINE: Duration = Duration::from_secs(30);

/// Identity of this node, credited as the recipient of mining rewards
#[derive(Debug, Clone)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Generates a fresh node identity (a UUID v4 without hyphens)
    pub fn generate() -> Self {
        NodeIdentity(Uuid::new_v4().simple().to_string())
    }

    /// The node's address string
    pub fn address(&self) -> &str {
        &self.0
    }
}

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    pub amount: i64,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The index of the block that will include this transaction
    pub block_index: u64,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly mined block
    pub block: Block,
}

/// Get the full blockchain
///
/// Returns the entire blockchain and its length
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    let chain = blockchain.chain();

    let response = ChainResponse {
        length: chain.len(),
        chain,
    };

    HttpResponse::Ok().json(response)
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(blockchain: BlockchainData) -> impl Responder {
    let transactions = blockchain.pending_transactions();
    HttpResponse::Ok().json(transactions)
}

/// Create a new transaction
///
/// Adds a new transaction to the pending pool
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = TransactionResponse),
        (status = 400, description = "Invalid transaction data")
    )
)]
pub async fn new_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    // The ledger takes unsigned amounts; reject negatives at the boundary
    if transaction_req.amount < 0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Invalid amount: {}", transaction_req.amount)
        }));
    }

    let block_index = blockchain.new_transaction(
        transaction_req.sender.clone(),
        transaction_req.recipient.clone(),
        transaction_req.amount as u64,
    );

    let response = TransactionResponse {
        message: format!("Transaction will be added to Block {}", block_index),
        block_index,
    };

    HttpResponse::Created().json(response)
}

/// Mine a new block
///
/// Searches for a valid proof, rewards this node, and commits a block
/// carrying all pending transactions
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 409, description = "Found proof was no longer valid at commit time"),
        (status = 503, description = "Mining aborted before a valid proof was found")
    )
)]
pub async fn mine_block(
    blockchain: BlockchainData,
    node: web::Data<NodeIdentity>,
) -> impl Responder {
    let last_proof = blockchain.last_block().proof;
    let pow = blockchain.proof_of_work().clone();
    let token = CancelToken::with_deadline(MINING_DEADLINE);

    // The search is CPU-bound and unbounded, so it runs on the blocking
    // thread pool and must not touch the ledger until it resolves
    let search = web::block(move || pow.find_proof_until(last_proof, &token)).await;

    let proof = match search {
        Ok(Ok(proof)) => proof,
        Ok(Err(MiningError::Aborted)) => {
            return HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Mining aborted before a valid proof was found"
            }));
        }
        Err(err) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Mining task failed: {}", err)
            }));
        }
    };

    // Reward this node for finding the proof
    blockchain.new_transaction(REWARD_SENDER, node.address(), MINING_REWARD);

    match blockchain.new_block(proof, None) {
        Ok(block) => {
            let response = MineResponse {
                message: "New Block Mined".to_string(),
                block,
            };

            HttpResponse::Ok().json(response)
        }
        Err(err) => {
            HttpResponse::Conflict().json(serde_json::json!({
                "error": format!("Failed to commit block: {}", err)
            }))
        }
    }
}

/// Check if the blockchain is valid
///
/// Validates the entire blockchain
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    let is_valid = blockchain.is_valid();
    HttpResponse::Ok().json(is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_get_chain_starts_at_genesis() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Blockchain::with_target("0")))
                .app_data(web::Data::new(NodeIdentity::generate()))
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/chain").to_request();
        let response: ChainResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(response.length, 1);
        assert_eq!(response.chain[0].index, 1);
    }

    #[actix_web::test]
    async fn test_new_transaction_returns_next_index() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Blockchain::with_target("0")))
                .app_data(web::Data::new(NodeIdentity::generate()))
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(TransactionRequest {
                sender: "alice".to_string(),
                recipient: "bob".to_string(),
                amount: 5,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let response: TransactionResponse = test::read_body_json(resp).await;
        assert_eq!(response.block_index, 2);
    }

    #[actix_web::test]
    async fn test_new_transaction_rejects_negative_amount() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Blockchain::with_target("0")))
                .app_data(web::Data::new(NodeIdentity::generate()))
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(TransactionRequest {
                sender: "alice".to_string(),
                recipient: "bob".to_string(),
                amount: -5,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_mine_commits_pending_transactions() {
        let blockchain = Blockchain::with_target("0");
        blockchain.new_transaction("alice", "bob", 5);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(blockchain.clone()))
                .app_data(web::Data::new(NodeIdentity::generate()))
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/mine").to_request();
        let response: MineResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(response.block.index, 2);
        // Queued transaction plus the mining reward
        assert_eq!(response.block.transactions.len(), 2);
        assert_eq!(response.block.transactions[0].sender, "alice");
        assert_eq!(response.block.transactions[1].sender, REWARD_SENDER);
        assert_eq!(blockchain.len(), 2);
        assert!(blockchain.pending_transactions().is_empty());
    }

    #[actix_web::test]
    async fn test_validate_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Blockchain::with_target("0")))
                .app_data(web::Data::new(NodeIdentity::generate()))
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/validate").to_request();
        let is_valid: bool = test::call_and_read_body_json(&app, req).await;

        assert!(is_valid);
    }
}
