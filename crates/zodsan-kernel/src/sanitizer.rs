//! The Sanitizer — top-level orchestration.
//!
//! One [`Sanitizer::validate_schema`] call runs the whole pipeline:
//!
//! 1. parse (a parse failure fails the whole input);
//! 2. require a `z` binding imported from `"zod"`;
//! 3. classify every top-level statement, chain-validating anything that
//!    looks like a schema declaration;
//! 4. drop disallowed statements, auto-export surviving bare declarations;
//! 5. print the cleaned source, comments intact;
//! 6. optionally compute dependency-inlined schema groups.
//!
//! The governor brackets each statement; `Timeout`/`NodeLimit` faults abort
//! the run with a single file-level error and an empty `cleaned_code`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::analyzer::{self, SchemaGroup};
use crate::ast::{Declarator, Expr, Stmt, VarDecl};
use crate::config::Config;
use crate::governor::{Governor, ResourceError};
use crate::parser;
use crate::printer::{self, Disposition};
use crate::validator::{Issue, IssueReporter, SchemaValidator, Severity};

/// The value returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub cleaned_code: String,
    pub issues: Vec<Issue>,
    pub root_schema_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_groups: Option<Vec<SchemaGroup>>,
}

/// Validates and sanitizes schema source. Cheap to clone; one instance can
/// serve many independent runs.
#[derive(Clone)]
pub struct Sanitizer {
    config: Arc<Config>,
}

impl Sanitizer {
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate `source`, racing the cooperative governor against a
    /// wall-clock timeout. The async facade performs no I/O.
    pub async fn validate_schema(&self, source: &str) -> ValidationResult {
        let config = Arc::clone(&self.config);
        let owned = source.to_string();
        // Grace on top of the governor's own budget: the worker should
        // always trip first, the outer race is the backstop.
        let budget = Duration::from_millis(config.timeout_ms) + Duration::from_millis(250);

        let worker = tokio::task::spawn_blocking(move || run(&config, &owned));
        match tokio::time::timeout(budget, worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!("validation worker failed: {}", join_error);
                failure_result(format!("Validation worker failed: {}", join_error))
            }
            Err(_) => {
                tracing::warn!("validation timed out at the wall-clock backstop");
                failure_result(format!(
                    "Validation timed out after {}ms",
                    self.config.timeout_ms
                ))
            }
        }
    }

    /// Synchronous variant for callers without a runtime.
    pub fn validate_schema_sync(&self, source: &str) -> ValidationResult {
        run(&self.config, source)
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// A file-level failure with no salvageable output.
fn failure_result(message: String) -> ValidationResult {
    ValidationResult {
        is_valid: false,
        cleaned_code: String::new(),
        issues: vec![Issue {
            severity: Severity::Error,
            line: 1,
            column: Some(0),
            message,
            node_kind: "File",
            suggestion: None,
        }],
        root_schema_names: Vec::new(),
        schema_groups: None,
    }
}

/// Per-run mutable state threaded through classification.
struct RunState<'a> {
    config: &'a Config,
    governor: Governor,
    reporter: IssueReporter,
    root_schema_names: Vec<String>,
    /// Set when a schema-looking declaration failed validation and was
    /// removed. Such removals invalidate the run even when every reported
    /// issue is a warning (denied property names).
    removed_invalid: bool,
    /// Set when at least one valid schema declaration survives.
    kept_schema: bool,
}

fn run(config: &Config, source: &str) -> ValidationResult {
    let mut state = RunState {
        config,
        governor: Governor::new(config),
        reporter: IssueReporter::new(source),
        root_schema_names: Vec::new(),
        removed_invalid: false,
        kept_schema: false,
    };

    let module = match parser::parse(source) {
        Ok(module) => module,
        Err(errors) => {
            let reason = errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "unknown error".to_string());
            state
                .reporter
                .error(None, "File", format!("Failed to parse schema: {}", reason));
            return finish(state, String::new(), None);
        }
    };

    if !has_zod_import(&module.program.statements) {
        state.reporter.error(None, "File", "Missing 'z' import from 'zod'");
    }

    // First pass: classify; second pass is the print with dispositions.
    let mut dispositions = Vec::with_capacity(module.program.statements.len());
    for stmt in &module.program.statements {
        let disposition = (|| -> Result<Disposition, ResourceError> {
            state.governor.check_timeout_aggressive()?;
            let disposition = classify_statement(&mut state, stmt)?;
            state.governor.check_timeout()?;
            Ok(disposition)
        })();
        match disposition {
            Ok(disposition) => dispositions.push(disposition),
            Err(fault) => {
                tracing::warn!("validation aborted: {}", fault);
                state.reporter.error(None, "File", fault.to_string());
                return finish(state, String::new(), None);
            }
        }
    }

    let cleaned_code = if state.kept_schema {
        printer::print_cleaned(source, &module.program, &dispositions, &module.comments)
    } else {
        String::new()
    };

    let schema_groups = if config.unification.enabled && !cleaned_code.is_empty() {
        match analyzer::build_schema_groups(&cleaned_code, config, &mut state.governor) {
            Ok(groups) => Some(groups),
            Err(reason) => {
                tracing::debug!("schema grouping failed: {}", reason);
                state
                    .reporter
                    .warning(None, "File", format!("Schema grouping failed: {}", reason));
                None
            }
        }
    } else {
        None
    };

    finish(state, cleaned_code, schema_groups)
}

fn finish(
    state: RunState<'_>,
    cleaned_code: String,
    schema_groups: Option<Vec<SchemaGroup>>,
) -> ValidationResult {
    let is_valid = !state.reporter.has_errors() && !state.removed_invalid;
    ValidationResult {
        is_valid,
        cleaned_code,
        issues: state.reporter.into_issues(),
        root_schema_names: state.root_schema_names,
        schema_groups,
    }
}

fn has_zod_import(statements: &[Stmt]) -> bool {
    statements.iter().any(|stmt| match stmt {
        Stmt::Import(import) => {
            import.source == "zod" && import.specifiers.iter().any(|s| s.local_name() == "z")
        }
        _ => false,
    })
}

fn classify_statement(
    state: &mut RunState<'_>,
    stmt: &Stmt,
) -> Result<Disposition, ResourceError> {
    match stmt {
        Stmt::Import(import) => {
            if import.source == "zod" {
                Ok(Disposition::Keep)
            } else {
                state.reporter.error(
                    Some(import.span),
                    "ImportDeclaration",
                    format!(
                        "Invalid import from '{}'. Only 'zod' imports are allowed",
                        import.source
                    ),
                );
                Ok(Disposition::Remove)
            }
        }
        Stmt::VarDecl(decl) => classify_declaration(state, decl, false),
        Stmt::ExportNamed(export) => classify_declaration(state, &export.decl, true),
        // Accepted at the statement level; only variable declarations are
        // validated.
        Stmt::ExportDefault(_) => Ok(Disposition::Keep),
        // A stray `;` is dropped without ceremony.
        Stmt::Empty(_) => Ok(Disposition::Remove),
        other => {
            state.reporter.error(
                Some(other.span()),
                other.kind_name(),
                format!("Invalid statement type: {}", other.kind_name()),
            );
            Ok(Disposition::Remove)
        }
    }
}

/// Classify one variable declaration. The whole declaration is removed when
/// any declarator fails; a declarator that does not look like a schema
/// triggers removal without an error.
fn classify_declaration(
    state: &mut RunState<'_>,
    decl: &VarDecl,
    already_exported: bool,
) -> Result<Disposition, ResourceError> {
    if decl.kind != crate::ast::DeclKind::Const {
        state.reporter.error(
            Some(decl.span),
            "VariableDeclaration",
            "Schema declarations must use 'const'",
        );
        state.removed_invalid = true;
        return Ok(Disposition::Remove);
    }

    let mut keep = true;
    let mut validated_any = false;

    for declarator in &decl.declarators {
        let init = match effective_init(declarator) {
            Some(init) => init,
            None => {
                state.reporter.error(
                    Some(declarator.span),
                    "VariableDeclarator",
                    "Schema declaration must have an initializer",
                );
                state.removed_invalid = true;
                keep = false;
                continue;
            }
        };

        if !looks_like_schema(declarator, init) {
            tracing::debug!(name = %declarator.name.name, "dropping non-schema declaration");
            keep = false;
            continue;
        }

        let ok = {
            let mut validator =
                SchemaValidator::new(state.config, &mut state.governor, &mut state.reporter);
            validator.validate_chain(init)?
        };
        if ok {
            validated_any = true;
            if !state.root_schema_names.contains(&declarator.name.name) {
                state.root_schema_names.push(declarator.name.name.clone());
            }
        } else {
            tracing::debug!(name = %declarator.name.name, "removing invalid schema declaration");
            state.removed_invalid = true;
            keep = false;
        }
    }

    if keep && validated_any {
        state.kept_schema = true;
        if already_exported {
            Ok(Disposition::Keep)
        } else {
            Ok(Disposition::Export)
        }
    } else {
        Ok(Disposition::Remove)
    }
}

/// An initializer that is literally `undefined` counts as missing.
fn effective_init(declarator: &Declarator) -> Option<&Expr> {
    match &declarator.init {
        Some(Expr::Ident(ident)) if ident.name == "undefined" => None,
        Some(init) => Some(init),
        None => None,
    }
}

/// A declarator is schema-like when its name mentions "schema" or its
/// initializer's leftmost identifier is `z`.
fn looks_like_schema(declarator: &Declarator, init: &Expr) -> bool {
    if declarator.name.name.to_lowercase().contains("schema") {
        return true;
    }
    matches!(init, Expr::Call(_) | Expr::Member(_))
        && init.leftmost_ident().map(|i| i.name.as_str()) == Some("z")
}
