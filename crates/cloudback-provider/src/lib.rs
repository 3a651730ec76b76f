pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod identity;
pub mod import_id;
pub mod log_sanitize;
pub mod logging;
pub mod model;
pub mod planner;
pub mod resource;
pub mod state;
pub mod store;

pub use error::{Error, Result};
