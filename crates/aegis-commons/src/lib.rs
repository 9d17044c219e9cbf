pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;

pub use error::CoreError;
