//! Declarative resource graph for the web-shell stack.
//!
//! This crate owns the table, function, schedule and HTTP declarations, the
//! validation that turns them into a resolved [`graph::StackGraph`], and the
//! synthesis of that graph into a CloudFormation-shaped template. It
//! intentionally excludes any cloud SDK or provisioning engine.

pub mod api;
pub mod assets;
pub mod config;
pub mod environment;
pub mod error;
pub mod function;
pub mod graph;
pub mod log;
pub mod logical_id;
pub mod schedule;
pub mod stack;
pub mod table;
pub mod template;
pub mod web_shell;

pub use error::DeclarationError;
pub use graph::StackGraph;
pub use stack::Stack;
