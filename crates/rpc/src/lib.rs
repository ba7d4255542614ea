//! RPC crate
//!
//! Point lookups against a blockchain node: the [`BlockchainClient`] trait,
//! a JSON-RPC [`HttpClient`], and an in-memory [`MemoryClient`].

pub mod client;
pub mod http;
pub mod memory;
pub mod types;

pub use client::{BlockchainClient, RpcError};
pub use http::HttpClient;
pub use memory::MemoryClient;
pub use types::{parse_quantity, Block, Transaction};
