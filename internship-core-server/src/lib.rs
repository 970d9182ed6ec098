//! HTTP+JSON boundary of the internship core.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod response;
pub mod server;
pub mod shutdown;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::{router, run};
pub use state::AppState;
