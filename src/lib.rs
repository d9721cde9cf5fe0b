//! Drift-tolerant references from notes into code and documents.
//!
//! A ref is written in a compact DSL (`impl:s=Auth.login,f=**/auth.py`) or as
//! a JSON object, validated into a [`Ref`], and resolved against a project
//! tree by trying progressively coarser strategies. Refs that no longer
//! resolve get shell search suggestions instead of an error.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod dsl;
pub mod error;
pub mod heading;
pub mod hints;
pub mod resolver;
pub mod search;
pub mod types;
pub mod validate;

pub use error::Error;
pub use types::{Location, Ref, RefFields, RefKind, SymbolQuery};
