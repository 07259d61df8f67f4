//! MCP tool facade (§6.2): deliberately thin, no business logic beyond
//! parameter validation and dictionary shaping — everything routes straight
//! through to the repository layer.

pub mod error;
pub mod server;
pub mod types;

pub use server::{run_mcp_server, LoreKeeperServer};
