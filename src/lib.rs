pub mod app;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use chat::{Message, Outcome, Role, Session};
pub use client::{ChatClient, ChatResponse, ChatTransport, DEFAULT_ENDPOINT};
pub use config::Config;
pub use error::ChatError;
