use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{
    AppState, BlocksResponse, ErrorResponse, MineRequest, MineResponse, StatusResponse,
};
use crate::error::LedgerError;

/// Get the full blockchain.
#[get("/blocks")]
pub async fn get_blocks(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(BlocksResponse {
        status: true,
        chain: state.node.chain(),
    })
}

/// Mine a block holding exactly the posted transactions.
#[post("/mine")]
pub async fn mine_block(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    let data = req.into_inner().data;
    info!("POST /mine - {} transaction(s)", data.len());
    match state.node.mine_block(data).await {
        Ok(new_block) => HttpResponse::Ok().json(MineResponse {
            status: true,
            new_block,
        }),
        Err(e) => mining_failed(e),
    }
}

/// Mine the valid pool transactions plus this node's reward.
#[post("/mine-transactions")]
pub async fn mine_transactions(state: web::Data<AppState>) -> impl Responder {
    match state.node.mine_transactions().await {
        Ok(block) => {
            info!("POST /mine-transactions - mined {}", block.hash);
            HttpResponse::Ok().json(StatusResponse { status: true })
        }
        Err(e) => mining_failed(e),
    }
}

fn mining_failed(e: LedgerError) -> HttpResponse {
    warn!("mining failed: {e}");
    match e {
        // the tip moved under us; the caller may simply retry
        LedgerError::MiningAborted | LedgerError::InvalidChain(_) => {
            HttpResponse::Conflict().json(ErrorResponse::new(e.to_string()))
        }
        _ => HttpResponse::InternalServerError().json(ErrorResponse::new(e.to_string())),
    }
}
