use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::blockchain::Block;
use crate::node::Node;
use crate::transaction::Transaction;

/// Shared application state: the node every handler talks to.
pub struct AppState {
    pub node: Node,
}

impl AppState {
    pub fn new(node: Node) -> Self {
        Self { node }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct BlocksResponse {
    pub status: bool,
    pub chain: Vec<Block>,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: Vec<Transaction>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineResponse {
    pub status: bool,
    pub new_block: Block,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct TransactRequest {
    /// Any JSON value; see [`TransactRequest::amount`].
    #[serde(default)]
    pub amount: Value,
    pub recipient: String,
}

impl TransactRequest {
    /// The requested amount, or 0 when it is not a positive whole number.
    /// Numeric strings are accepted.
    pub fn amount(&self) -> u64 {
        match &self.amount {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole))
            }
            _ => None,
        }
        .unwrap_or(0)
    }
}

fn whole(f: f64) -> Option<u64> {
    (f.is_finite() && f > 0.0 && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

#[derive(Serialize, Deserialize)]
pub struct TransactResponse {
    pub status: bool,
    pub transaction: Transaction,
}

#[derive(Serialize, Deserialize)]
pub struct PoolResponse {
    pub status: bool,
    pub transactions: HashMap<String, Transaction>,
}

/* ---------- Shared ---------- */

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct WalletInfoResponse {
    pub address: String,
    pub balance: u64,
}
