//! HTTP Layer - JSON API
//!
//! 所有接口返回 HTTP 200 + `{errno, error, data}`

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::{AppPorts, AppState};
