mod api;
mod blockchain;
mod config;
mod crypto;
mod error;
mod miner;
mod network;
mod node;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use std::sync::Arc;

use api::AppState;
use config::NodeConfig;
use network::{LocalBus, MessageBus};
use node::Node;
use wallet::Wallet;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let cfg = NodeConfig::from_env();
    let bus: Arc<dyn MessageBus> = Arc::new(LocalBus::new());
    let mut servers = Vec::with_capacity(cfg.node_count as usize);

    for i in 0..cfg.node_count {
        let port = cfg.port + i;
        let node = Node::with_wallet(Wallet::new(), bus.clone());
        node.start_replication();
        if let Some(every) = cfg.mine_interval {
            node.start_periodic_mining(every);
        }

        println!(
            "⛓️ Starting ledger node {} at http://{}:{port} (address {})",
            i,
            cfg.host,
            node.state().address()
        );

        let state = web::Data::new(AppState::new(node));
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .configure(api::init_routes)
        })
        .bind((cfg.host.as_str(), port))?
        .run();
        servers.push(actix_web::rt::spawn(server));
    }

    for server in servers {
        server.await.map_err(std::io::Error::other)??;
    }
    Ok(())
}
