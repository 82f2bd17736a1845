use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};
use std::time::Instant;

use super::models::{AppState, ErrorResponse, PoolResponse, TransactRequest, TransactResponse};

/// List the transaction pool.
#[get("/transaction-pool")]
pub async fn get_transaction_pool(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(PoolResponse {
        status: true,
        transactions: state.node.pool(),
    })
}

/// Send from this node's wallet: amends its pending transaction or creates one.
#[post("/transact")]
pub async fn post_transact(
    state: web::Data<AppState>,
    body: web::Json<TransactRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    let amount = body.amount();
    debug!("POST /transact - amount={} recipient={}", body.amount, body.recipient);

    match state.node.transact(&body.recipient, amount) {
        Ok(transaction) => {
            debug!(
                "POST /transact - txid={} OK ({} ms)",
                transaction.id,
                t0.elapsed().as_millis()
            );
            HttpResponse::Ok().json(TransactResponse {
                status: true,
                transaction,
            })
        }
        Err(e) if e.is_user_error() => {
            warn!("POST /transact - rejected: {e}");
            HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string()))
        }
        Err(e) => {
            warn!("POST /transact - failed: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse::new(e.to_string()))
        }
    }
}
