pub mod config;
pub mod redis_keys;
pub mod types;

pub use config::EnvConfig;
pub use redis_keys::{keys, stage_owner_key};
pub use types::*;
