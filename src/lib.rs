pub mod channel;
pub mod commands;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod encoder;
pub mod response;
pub mod server;
pub mod session;
pub mod store;
pub mod token;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
