//! wit-dbi-compiler
//!
//! This crate implements:
//!  1) A permissive extraction pass for WIT `record` declarations and their
//!     `@refine` annotations,
//!  2) A resolver for the `dbi<N>-<label>-<key|value>` naming convention and
//!     its global numbering invariants,
//!  3) A manifest reconciler that preserves curator-owned columns across
//!     regeneration,
//!  4) C code generation for packed layouts, validators, and the dbi table,
//!  5) Error types (`WitError`).

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod refine;
pub mod resolver;
pub mod types;
pub mod utils;

pub use compiler::{compile_wit, generate_outputs, record_schema, GenerateSummary, WitCompilation};
pub use error::WitError;
