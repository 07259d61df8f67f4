pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod embedding;
pub mod error;
pub mod init;
pub mod mcp;
pub mod models;
pub mod repository;

pub use error::LoreError;
