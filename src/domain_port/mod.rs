mod clock;
mod distributed_lock;
mod replay_cache;
mod telemetry;
mod token_store;

pub use clock::*;
pub use distributed_lock::*;
pub use replay_cache::*;
pub use telemetry::*;
pub use token_store::*;
