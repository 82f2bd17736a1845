pub mod block;
pub mod model;

pub use block::Block;
pub use model::Blockchain;
