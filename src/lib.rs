pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod models;
pub mod service;

pub use api::{router, AppState};
pub use config::AppConfig;
pub use llm::{ChatBackend, OpenRouterClient};
pub use service::{QueryService, SessionStore};
