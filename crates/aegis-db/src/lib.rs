pub mod gateway;
pub mod hash;
pub mod pool;

pub use gateway::Gateway;
pub use pool::{get_or_init_pool, init_pool};
