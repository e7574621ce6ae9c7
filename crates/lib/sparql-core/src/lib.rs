//! Core types and services for sparql-mcp.
//!
//! This crate owns the SPARQL 1.1 protocol client, the precedence rules that
//! turn process defaults and per-call overrides into connection parameters,
//! and the transport-agnostic tool dispatcher that wraps client outcomes into
//! the tool reply envelope.

pub mod client;
pub mod connection;
pub mod dispatch;

pub use client::{QueryResult, SparqlClient, SparqlError};
pub use connection::{ConnectionDefaults, ConnectionOverrides, ConnectionParams};
pub use dispatch::{DispatchError, Dispatcher, ToolInvocation, ToolKind, ToolReply};
