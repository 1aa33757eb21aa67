//! Schema-expression validation.
//!
//! The validator runs after parsing, before any tree edit. It recognizes the
//! whitelist grammar rooted at `z` and checks:
//!
//! - **Chains**: `z.<ctor>(...)` roots, allowed method names, no computed
//!   member access, chain depth.
//! - **Arguments**: per-method arity and type rules, function-body safety,
//!   regex safety.
//! - **Objects**: nesting depth, property count, property-name policy, no
//!   spread/method/accessor properties.
//!
//! Every recursive step goes through the resource governor; `Timeout` and
//! `NodeLimit` faults propagate out as `Err`, while depth/size trips are
//! reported as issues and returned as `Ok(false)`.

mod args;
mod chain;
mod function_body;
mod issue;
mod object;

pub use args::ArgRule;
pub use issue::{Issue, IssueReporter, LineIndex, Severity};

use std::collections::HashMap;

use crate::config::Config;
use crate::governor::Governor;

/// Validator for one run. Owns no tree data; borrows the run's governor and
/// reporter so the sanitizer keeps control of both.
pub struct SchemaValidator<'a> {
    config: &'a Config,
    governor: &'a mut Governor,
    reporter: &'a mut IssueReporter,
    /// Object-literal results memoized by node span. Never outlives the run.
    object_cache: HashMap<(usize, usize), bool>,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(
        config: &'a Config,
        governor: &'a mut Governor,
        reporter: &'a mut IssueReporter,
    ) -> Self {
        Self {
            config,
            governor,
            reporter,
            object_cache: HashMap::new(),
        }
    }
}
