pub mod model;
pub mod pool;

pub use model::{Transaction, TransactionInput, TransactionOutput};
pub use pool::TransactionPool;
