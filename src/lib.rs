//! Local, deterministic authorization decision engine emulating a cloud IAM
//! policy service for development and CI. Role Catalog, Group Registry,
//! Condition Evaluator, and Policy Store feed the Decision Engine, which
//! emits structured traces through the Trace Emitter.

pub mod catalog;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod groups;
pub mod http;
pub mod policy;
pub mod principal;
pub mod resource;
pub mod store;
pub mod trace;

pub use engine::Engine;
pub use error::{AppError, WardenResult};
pub use store::Store;
