pub mod app;
pub mod chat_stream;
pub mod config;
pub mod credentials;
pub mod gemini;
pub mod keyring;
pub mod message;
pub mod session;
pub mod suggestions;
pub mod transcript;
