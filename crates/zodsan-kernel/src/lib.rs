//! zodsan-kernel: the core of zodsan.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes schema source using logos
//! - **Parser**: Builds a spanned AST from tokens using chumsky
//! - **AST**: Type definitions for the syntax tree
//! - **Validator**: Whitelist recognizer for `z`-rooted schema expressions
//! - **Governor**: Node/time/depth budgets with deterministic failure
//! - **Sanitizer**: Statement classification, removal, auto-export, printing
//! - **Analyzer**: Reference-graph schema groups with dependency inlining

pub mod allowlist;
pub mod analyzer;
pub mod ast;
pub mod config;
pub mod governor;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod safe_regex;
pub mod sanitizer;
pub mod validator;

pub use analyzer::{GroupMetrics, SchemaGroup};
pub use config::{Config, ConfigOverrides, PropertySafety, UnificationConfig};
pub use governor::{Governor, GovernorStats, ResourceError};
pub use sanitizer::{Sanitizer, ValidationResult};
pub use validator::{Issue, IssueReporter, SchemaValidator, Severity};
