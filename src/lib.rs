pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod github;
pub mod handler;
pub mod request;
pub mod server;
pub mod signature;

pub use error::Error;
