mod chain;
mod health;
pub mod models;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .service(chain::get_blocks)
            .service(chain::mine_block)
            .service(chain::mine_transactions)
            .service(tx::get_transaction_pool)
            .service(tx::post_transact)
            .service(wallet::get_wallet_info),
    );
}

#[cfg(test)]
mod tests {
    use super::models::*;
    use super::*;
    use crate::config::{MINING_REWARD, STARTING_BALANCE};
    use crate::network::LocalBus;
    use crate::node::Node;
    use crate::transaction::Transaction;
    use crate::wallet::Wallet;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;
    use std::sync::Arc;

    fn app_state() -> web::Data<AppState> {
        let bus = Arc::new(LocalBus::new());
        web::Data::new(AppState::new(Node::with_wallet(Wallet::new(), bus)))
    }

    #[actix_web::test]
    async fn blocks_starts_with_genesis() {
        let app = test::init_service(App::new().app_data(app_state()).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/blocks").to_request();
        let resp: BlocksResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.status);
        assert_eq!(resp.chain.len(), 1);
        assert_eq!(resp.chain[0].hash, "hash-genesis");
    }

    #[actix_web::test]
    async fn transact_pools_transaction() {
        let state = app_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/transact")
            .set_json(json!({ "amount": 40, "recipient": "bob" }))
            .to_request();
        let resp: TransactResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.status);
        assert_eq!(resp.transaction.output["bob"], 40);

        let req = test::TestRequest::get().uri("/api/transaction-pool").to_request();
        let pool: PoolResponse = test::call_and_read_body_json(&app, req).await;
        assert!(pool.transactions.contains_key(&resp.transaction.id));
    }

    #[actix_web::test]
    async fn transact_rejects_with_exact_messages() {
        let state = app_state();
        let own = state.node.state().address();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let cases = [
            (json!({ "amount": 0, "recipient": "bob" }), "You must set the amount!"),
            (json!({ "amount": -5, "recipient": "bob" }), "You must set the amount!"),
            (json!({ "recipient": "bob" }), "You must set the amount!"),
            (json!({ "amount": 2.5, "recipient": "bob" }), "You must set the amount!"),
            (json!({ "amount": "lots", "recipient": "bob" }), "You must set the amount!"),
            (json!({ "amount": null, "recipient": "bob" }), "You must set the amount!"),
            (
                json!({ "amount": STARTING_BALANCE + 1, "recipient": "bob" }),
                "Amount exceeds your balance!",
            ),
        ];
        for (body, message) in cases {
            let req = test::TestRequest::post()
                .uri("/api/transact")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let err: ErrorResponse = test::read_body_json(resp).await;
            assert!(!err.status);
            assert_eq!(err.message, message);
        }

        // self-send is detected when amending the pending transaction
        state.node.transact("bob", 1).unwrap();
        let req = test::TestRequest::post()
            .uri("/api/transact")
            .set_json(json!({ "amount": 1, "recipient": own }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(err.message, "You can not send to yourself!");
    }

    #[actix_web::test]
    async fn transact_accepts_numeric_string_amount() {
        let app = test::init_service(App::new().app_data(app_state()).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/transact")
            .set_json(json!({ "amount": "40", "recipient": "bob" }))
            .to_request();
        let resp: TransactResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.status);
        assert_eq!(resp.transaction.output["bob"], 40);
    }

    #[actix_web::test]
    async fn mine_transactions_then_wallet_info() {
        let state = app_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/mine-transactions")
            .to_request();
        let resp: StatusResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.status);
        assert_eq!(state.node.chain().len(), 2);

        let req = test::TestRequest::get().uri("/api/wallet-info").to_request();
        let info: WalletInfoResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(info.address, state.node.state().address());
        assert_eq!(info.balance, STARTING_BALANCE + MINING_REWARD);
    }

    #[actix_web::test]
    async fn mine_with_explicit_data() {
        let state = app_state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;
        let tx = Transaction::create_transaction(&Wallet::new(), "carol", 5).unwrap();

        let req = test::TestRequest::post()
            .uri("/api/mine")
            .set_json(json!({ "data": [tx.clone()] }))
            .to_request();
        let resp: MineResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.status);
        assert_eq!(resp.new_block.data, vec![tx]);
        assert_eq!(state.node.chain().len(), 2);
    }
}
