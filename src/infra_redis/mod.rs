mod lock_redis;
mod replay_cache_redis;

pub use lock_redis::*;
pub use replay_cache_redis::*;
