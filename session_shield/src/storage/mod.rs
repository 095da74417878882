mod config;
mod database;
mod errors;
mod file;
mod memory;
mod redis;
mod types;

pub use config::create_driver;
pub use database::DatabaseSessionDriver;
pub use errors::StorageError;
pub use file::FileSessionDriver;
pub use memory::MemorySessionDriver;
pub use self::redis::RedisSessionDriver;
pub use types::{DriverKind, SessionDriver};
