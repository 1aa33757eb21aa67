//! Per-method argument rules.
//!
//! Methods without a table entry accept any arguments (their names were
//! already gated by the chain validator). The table is small on purpose: it
//! covers the methods whose arguments can smuggle executable or explosive
//! payloads.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::ast::{ArrayElem, ArrayLit, CallArg, CallExpr, Expr, Lit, LitKind};
use crate::governor::{DepthKind, ResourceError};
use crate::safe_regex;

use super::SchemaValidator;

/// Argument rules for one method.
#[derive(Debug, Clone, Copy)]
pub struct ArgRule {
    pub min: usize,
    pub max: usize,
    pub allow_function: bool,
    pub allow_schema: bool,
    pub validate_function: bool,
    pub validate_regex: bool,
}

impl ArgRule {
    const fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            allow_function: false,
            allow_schema: false,
            validate_function: false,
            validate_regex: false,
        }
    }

    const fn functions(mut self) -> Self {
        self.allow_function = true;
        self.validate_function = true;
        self
    }

    const fn schemas(mut self) -> Self {
        self.allow_schema = true;
        self
    }

    const fn regexes(mut self) -> Self {
        self.validate_regex = true;
        self
    }
}

/// Synthetic rule applied to array elements: no functions, no sub-schemas.
const ARRAY_ELEMENT_RULE: ArgRule = ArgRule::new(0, usize::MAX);

static ARG_RULES: Lazy<HashMap<&'static str, ArgRule>> = Lazy::new(|| {
    HashMap::from([
        ("refine", ArgRule::new(1, 2).functions()),
        ("transform", ArgRule::new(1, 1).functions()),
        ("pipe", ArgRule::new(1, 1).schemas()),
        ("regex", ArgRule::new(1, 2).regexes()),
        ("object", ArgRule::new(1, 1)),
    ])
});

impl SchemaValidator<'_> {
    /// Apply the argument rules for `method` to `call`'s arguments, if the
    /// method has an entry in the rule table.
    pub(super) fn validate_method_arguments(
        &mut self,
        method: &str,
        call: &CallExpr,
    ) -> Result<bool, ResourceError> {
        let Some(rule) = ARG_RULES.get(method) else {
            return Ok(true);
        };

        if call.args.len() < rule.min {
            self.reporter.error(
                Some(call.span),
                "CallExpression",
                format!(
                    "Method '{}' expects at least {} argument(s), got {}",
                    method,
                    rule.min,
                    call.args.len()
                ),
            );
            return Ok(false);
        }
        if call.args.len() > rule.max {
            self.reporter.error(
                Some(call.span),
                "CallExpression",
                format!(
                    "Method '{}' expects at most {} argument(s), got {}",
                    method,
                    rule.max,
                    call.args.len()
                ),
            );
            return Ok(false);
        }

        for (index, arg) in call.args.iter().enumerate() {
            let expr = match arg {
                CallArg::Spread(_, span) => {
                    self.reporter.error(
                        Some(*span),
                        "SpreadElement",
                        format!("Unexpected argument type for method {}: SpreadElement", method),
                    );
                    return Ok(false);
                }
                CallArg::Expr(expr) => expr,
            };
            if !self.validate_argument(method, rule, index, expr, 0)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Dispatch one argument value. `nesting` counts containers (arrays)
    /// crossed on the way here and is capped independently of chain and
    /// object depth.
    fn validate_argument(
        &mut self,
        method: &str,
        rule: &ArgRule,
        index: usize,
        expr: &Expr,
        nesting: usize,
    ) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        if self.governor.track_depth(nesting, DepthKind::Argument).is_err() {
            self.reporter.error(
                Some(expr.span()),
                expr.kind_name(),
                format!(
                    "Argument nesting depth exceeded maximum of {}",
                    self.config.max_argument_nesting
                ),
            );
            return Ok(false);
        }

        // refine's first argument is the predicate; nothing else goes there.
        if method == "refine"
            && index == 0
            && !matches!(expr, Expr::Arrow(_) | Expr::Function(_))
        {
            self.reporter.error(
                Some(expr.span()),
                expr.kind_name(),
                "First argument of 'refine' must be a function",
            );
            return Ok(false);
        }

        match expr {
            Expr::Arrow(_) | Expr::Function(_) => {
                if !rule.allow_function {
                    self.reporter.error(
                        Some(expr.span()),
                        expr.kind_name(),
                        format!("Function arguments are not allowed for method '{}'", method),
                    );
                    return Ok(false);
                }
                if rule.validate_function {
                    return self.validate_function_argument(expr);
                }
                Ok(true)
            }
            Expr::Object(object) => self.validate_object(object, 0),
            Expr::Array(array) => self.validate_array_argument(array, nesting),
            Expr::Lit(lit) => Ok(self.validate_literal_argument(lit)),
            // A free variable, typically a previously declared schema name.
            Expr::Ident(_) => Ok(true),
            Expr::Call(_) | Expr::Member(_) => {
                if !rule.allow_schema {
                    self.reporter.error(
                        Some(expr.span()),
                        expr.kind_name(),
                        format!(
                            "Unexpected argument type for method {}: {}",
                            method,
                            expr.kind_name()
                        ),
                    );
                    return Ok(false);
                }
                // A sub-schema: run it through the chain recognizer.
                self.validate_chain(expr)
            }
            other => {
                self.reporter.error(
                    Some(other.span()),
                    other.kind_name(),
                    format!(
                        "Unexpected argument type for method {}: {}",
                        method,
                        other.kind_name()
                    ),
                );
                Ok(false)
            }
        }
    }

    fn validate_array_argument(
        &mut self,
        array: &ArrayLit,
        nesting: usize,
    ) -> Result<bool, ResourceError> {
        if self
            .governor
            .validate_size(
                array.elements.len(),
                self.config.max_properties_per_object,
                "array length",
            )
            .is_err()
        {
            self.reporter.error(
                Some(array.span),
                "ArrayExpression",
                format!(
                    "Array exceeds maximum length of {}",
                    self.config.max_properties_per_object
                ),
            );
            return Ok(false);
        }

        for element in array.elements.iter().flatten() {
            let ok = match element {
                ArrayElem::Spread(expr, span) => {
                    self.reporter.error(
                        Some(*span),
                        expr.kind_name(),
                        "Unexpected argument type for method array: SpreadElement",
                    );
                    false
                }
                ArrayElem::Expr(expr) => {
                    self.validate_argument("array", &ARRAY_ELEMENT_RULE, 1, expr, nesting + 1)?
                }
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Literal dispatch: string caps, regex safety, everything else free.
    pub(super) fn validate_literal_argument(&mut self, lit: &Lit) -> bool {
        match &lit.kind {
            LitKind::Str { value, .. } => {
                if value.len() > self.config.max_string_length {
                    self.reporter.error(
                        Some(lit.span),
                        "StringLiteral",
                        format!(
                            "String length exceeds maximum of {}",
                            self.config.max_string_length
                        ),
                    );
                    return false;
                }
                true
            }
            LitKind::Regex { pattern, .. } => {
                if pattern.len() > self.config.max_string_length {
                    self.reporter.error(
                        Some(lit.span),
                        "RegExpLiteral",
                        format!(
                            "Regex pattern length exceeds maximum of {}",
                            self.config.max_string_length
                        ),
                    );
                    return false;
                }
                if let Err(risk) = safe_regex::check(pattern) {
                    self.reporter.error(
                        Some(lit.span),
                        "RegExpLiteral",
                        format!("Regex pattern is not safe: {}", risk),
                    );
                    return false;
                }
                true
            }
            LitKind::Template { raw, has_exprs } => {
                if *has_exprs && !self.config.allow_template_exprs {
                    self.reporter.error(
                        Some(lit.span),
                        "TemplateLiteral",
                        "Template literals with expressions are not allowed",
                    );
                    return false;
                }
                if raw.len() > self.config.max_string_length {
                    self.reporter.error(
                        Some(lit.span),
                        "TemplateLiteral",
                        format!(
                            "String length exceeds maximum of {}",
                            self.config.max_string_length
                        ),
                    );
                    return false;
                }
                true
            }
            LitKind::Num { .. } | LitKind::BigInt { .. } | LitKind::Bool(_) | LitKind::Null => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;
    use crate::config::Config;
    use crate::governor::Governor;
    use crate::parser::parse;
    use crate::validator::{IssueReporter, SchemaValidator, Severity};

    fn validate_source(source: &str, config: &Config) -> (bool, Vec<(Severity, String)>) {
        let module = parse(source).expect("should parse");
        let Some(Stmt::VarDecl(decl)) = module.program.statements.first() else {
            panic!("expected var decl");
        };
        let init = decl.declarators[0].init.as_ref().expect("initializer");

        let mut governor = Governor::new(config);
        let mut reporter = IssueReporter::new(source);
        let mut validator = SchemaValidator::new(config, &mut governor, &mut reporter);
        let ok = validator.validate_chain(init).expect("no fatal fault");
        let issues = reporter
            .issues()
            .iter()
            .map(|i| (i.severity, i.message.clone()))
            .collect();
        (ok, issues)
    }

    #[test]
    fn refine_requires_a_function_first() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source("const aSchema = z.string().refine({ msg: 1 });", &config);
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("First argument of 'refine' must be a function")));
    }

    #[test]
    fn refine_arity_is_capped() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source("const aSchema = z.string().refine(v => v, 'msg', 3);", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("at most 2 argument(s), got 3")));
    }

    #[test]
    fn unsafe_regex_is_rejected() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source(r"const aSchema = z.string().regex(/^(a+)+$/);", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("not safe")));
    }

    #[test]
    fn safe_regex_passes() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source(r"const aSchema = z.string().regex(/^[a-z0-9]+$/);", &config);
        assert!(ok, "unexpected issues: {:?}", issues);
    }

    #[test]
    fn pipe_takes_a_schema_not_a_function() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source("const aSchema = z.string().pipe(v => v);", &config);
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("Function arguments are not allowed for method 'pipe'")));

        let (ok, issues) =
            validate_source("const bSchema = z.string().pipe(z.number());", &config);
        assert!(ok, "unexpected issues: {:?}", issues);
    }

    #[test]
    fn async_refinement_is_rejected() {
        let config = Config::relaxed();
        let (ok, issues) = validate_source(
            "const aSchema = z.string().refine(async v => v.length > 1);",
            &config,
        );
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("Async functions not allowed in schema validation")));
    }

    #[test]
    fn long_string_argument_is_rejected() {
        let config = Config {
            max_string_length: 4,
            ..Config::relaxed()
        };
        let (ok, issues) =
            validate_source(r#"const aSchema = z.string().refine(v => v, "toolong");"#, &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("String length exceeds maximum of 4")));
    }

    #[test]
    fn identifier_arguments_are_schema_references() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_source("const aSchema = z.string().pipe(otherSchema);", &config);
        assert!(ok, "unexpected issues: {:?}", issues);
    }

    #[test]
    fn methods_without_rules_accept_anything() {
        let config = Config::relaxed();
        let (ok, issues) = validate_source(
            "const aSchema = z.union([z.string(), z.number()]).describe(`doc`);",
            &config,
        );
        assert!(ok, "unexpected issues: {:?}", issues);
    }
}
