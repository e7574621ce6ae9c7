//! MCP tool modules.
//!
//! The SPARQL tools mirror the core catalog one to one; each handler only
//! flattens its typed parameters and hands them to the dispatcher.

pub mod sparql;
