pub mod bus;
pub mod replicator;

pub use bus::{Channel, Envelope, LocalBus, MessageBus, NodeId, Subscription};
pub use replicator::Replicator;
