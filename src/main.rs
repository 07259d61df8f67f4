//! lorekeeper - local hybrid search cache for D&D 5e content
//!
//! Usage:
//!   lorekeeper mcp                    Start the MCP server on stdio
//!   lorekeeper get spells fireball     Structured lookup by slug
//!   lorekeeper search creatures "fire" Semantic/hybrid search
//!   lorekeeper status                  Cache stats
//!   lorekeeper --help                  Show all commands

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lorekeeper=info".parse()?),
        )
        .init();

    lorekeeper::cli::run().await
}
