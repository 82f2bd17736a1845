use std::env;
use std::time::Duration;

/// Difficulty of the genesis block (number of leading zero bits).
pub const INITIAL_DIFFICULTY: u32 = 3;

/// Target milliseconds between blocks for difficulty adjustment.
pub const MINE_RATE: i64 = 1000;

/// Balance every address starts with before any chain activity.
pub const STARTING_BALANCE: u64 = 5000;

/// Amount credited to the miner by the reward transaction.
pub const MINING_REWARD: u64 = 20;

/// Sentinel sender address carried by reward transactions.
pub const MINING_REWARD_INPUT_ADDRESS: &str = "*special-reward-transaction*";

pub const GENESIS_TIMESTAMP: i64 = 1;
pub const GENESIS_LAST_HASH: &str = "---";
pub const GENESIS_HASH: &str = "hash-genesis";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Number of in-process nodes sharing one bus, bound to `port..port + node_count`.
    pub node_count: u16,
    pub mine_interval: Option<Duration>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            node_count: 1,
            mine_interval: None,
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);
        let node_count = lookup("NODE_COUNT")
            .and_then(|v| v.parse().ok())
            .filter(|n: &u16| *n >= 1)
            .unwrap_or(defaults.node_count);
        let mine_interval = lookup("MINE_INTERVAL_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            host,
            port,
            node_count,
            mine_interval,
        }
    }
}
