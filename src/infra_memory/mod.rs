mod clock;
mod lock_memory;
mod replay_cache_memory;
mod token_store_memory;

pub use clock::*;
pub use lock_memory::*;
pub use replay_cache_memory::*;
pub use token_store_memory::*;
