use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, WalletInfoResponse};

#[get("/wallet-info")]
pub async fn get_wallet_info(state: web::Data<AppState>) -> impl Responder {
    let (address, balance) = state.node.wallet_info();
    HttpResponse::Ok().json(WalletInfoResponse { address, balance })
}
