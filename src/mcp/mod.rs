//! Tool front-end: an MCP-style JSON-RPC endpoint over HTTP.

pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::{tool_server, DEFAULT_PORT};
