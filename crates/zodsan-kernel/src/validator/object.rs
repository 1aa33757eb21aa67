//! Object-literal validation: depth, property count, property-name policy.

use crate::ast::{Expr, LitKind, ObjectLit, ObjectProp, PropKey, MethodKind, Span};
use crate::governor::{DepthKind, ResourceError};

use super::{SchemaValidator, Severity};

impl SchemaValidator<'_> {
    /// Validate an object literal at `depth` (0 for the root of an argument
    /// subtree). Stops at the first failing property; all issues reported so
    /// far stay in the reporter.
    pub fn validate_object(
        &mut self,
        object: &ObjectLit,
        depth: usize,
    ) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;

        let cache_key = (object.span.start, object.span.end);
        if self.config.enable_caching {
            if let Some(cached) = self.object_cache.get(&cache_key) {
                return Ok(*cached);
            }
        }

        let ok = self.validate_object_uncached(object, depth)?;
        if self.config.enable_caching {
            self.object_cache.insert(cache_key, ok);
        }
        Ok(ok)
    }

    fn validate_object_uncached(
        &mut self,
        object: &ObjectLit,
        depth: usize,
    ) -> Result<bool, ResourceError> {
        if self.governor.track_depth(depth, DepthKind::Object).is_err() {
            self.reporter.error(
                Some(object.span),
                "ObjectExpression",
                format!(
                    "Object exceeds maximum nesting depth of {}",
                    self.config.max_object_depth
                ),
            );
            return Ok(false);
        }

        if object.properties.len() > self.config.max_properties_per_object {
            self.reporter.error(
                Some(object.span),
                "ObjectExpression",
                format!(
                    "Object exceeds maximum property count of {}",
                    self.config.max_properties_per_object
                ),
            );
            return Ok(false);
        }

        for prop in &object.properties {
            if !self.validate_property(prop, depth)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn validate_property(&mut self, prop: &ObjectProp, depth: usize) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        match prop {
            ObjectProp::Spread { span, .. } => {
                self.reporter.error(
                    Some(*span),
                    "SpreadElement",
                    "Spread elements are not allowed in objects",
                );
                Ok(false)
            }
            ObjectProp::Method { kind, span, .. } => {
                self.reporter.error(Some(*span), "ObjectMethod", "Object methods not allowed");
                if matches!(kind, MethodKind::Get | MethodKind::Set) {
                    self.reporter.error(
                        Some(*span),
                        "ObjectMethod",
                        "Getter/setter methods are not allowed",
                    );
                }
                Ok(false)
            }
            ObjectProp::Property { key, value, .. } => {
                let name = match self.resolve_property_name(key) {
                    Some(name) => name,
                    None => return Ok(false),
                };
                if !self.check_property_name(&name, key.span()) {
                    return Ok(false);
                }
                match value {
                    Expr::Object(inner) => self.validate_object(inner, depth + 1),
                    other => self.validate_property_value(other, depth),
                }
            }
        }
    }

    /// Resolve a key to its property name, reporting when the key form is
    /// not allowed.
    fn resolve_property_name(&mut self, key: &PropKey) -> Option<String> {
        match key {
            PropKey::Ident(ident) => Some(ident.name.clone()),
            PropKey::Str { value, .. } => Some(value.clone()),
            PropKey::Computed { expr, span } => {
                if !self.config.allow_computed_properties {
                    self.reporter.error(
                        Some(*span),
                        "ObjectProperty",
                        "Computed properties are not allowed",
                    );
                    return None;
                }
                // Even when computed keys are tolerated, only a constant
                // string names a property.
                if let Expr::Lit(lit) = &**expr {
                    if let LitKind::Str { value, .. } = &lit.kind {
                        return Some(value.clone());
                    }
                }
                self.reporter.error(
                    Some(*span),
                    "ObjectProperty",
                    "Object property keys must be identifiers or string literals",
                );
                None
            }
            PropKey::Num { span, .. } => {
                self.reporter.error(
                    Some(*span),
                    "ObjectProperty",
                    "Object property keys must be identifiers or string literals",
                );
                None
            }
        }
    }

    /// Apply the property-safety policy, in order: denied names (warning),
    /// denied prefixes, then the whitelist if one is configured.
    fn check_property_name(&mut self, name: &str, span: Span) -> bool {
        let safety = &self.config.property_safety;

        if safety.denied_properties.contains(name) {
            self.reporter.report(
                Some(span),
                "ObjectProperty",
                format!("Property name '{}' is not allowed", name),
                Severity::Warning,
                None,
            );
            return false;
        }

        let prefix_allowed = safety.allowed_prefixes.iter().any(|p| name.starts_with(p.as_str()));
        if !prefix_allowed
            && safety
                .denied_prefixes
                .iter()
                .any(|p| name.starts_with(p.as_str()))
        {
            self.reporter.error(
                Some(span),
                "ObjectProperty",
                format!("Property name '{}' uses a forbidden prefix", name),
            );
            return false;
        }

        if !safety.allowed_properties.is_empty() && !safety.allowed_properties.contains(name) {
            self.reporter.error(
                Some(span),
                "ObjectProperty",
                format!("Property name '{}' is not in the allowed list", name),
            );
            return false;
        }

        true
    }

    /// Non-object property values: schema chains, references and literals
    /// are fine, anything executable is not.
    fn validate_property_value(&mut self, value: &Expr, depth: usize) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        match value {
            Expr::Call(_) | Expr::Member(_) => self.validate_chain(value),
            Expr::Ident(_) => Ok(true),
            Expr::Lit(lit) => Ok(self.validate_literal_argument(lit)),
            Expr::Object(inner) => self.validate_object(inner, depth + 1),
            Expr::Array(array) => {
                for element in array.elements.iter().flatten() {
                    let ok = match element {
                        crate::ast::ArrayElem::Expr(expr) => {
                            self.validate_property_value(expr, depth)?
                        }
                        crate::ast::ArrayElem::Spread(_, span) => {
                            self.reporter.error(
                                Some(*span),
                                "SpreadElement",
                                "Spread elements are not allowed in objects",
                            );
                            false
                        }
                    };
                    if !ok {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            other => {
                self.reporter.error(
                    Some(other.span()),
                    other.kind_name(),
                    format!("Unexpected property value type: {}", other.kind_name()),
                );
                Ok(false)
            }
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
    use crate::validator::{IssueReporter, SchemaValidator};

    fn validate_object_init(source: &str, config: &Config) -> (bool, Vec<(Severity, String)>) {
        let module = parse(source).expect("should parse");
        let Some(Stmt::VarDecl(decl)) = module.program.statements.first() else {
            panic!("expected var decl");
        };
        let Some(Expr::Object(object)) = &decl.declarators[0].init else {
            panic!("expected object initializer");
        };

        let mut governor = Governor::new(config);
        let mut reporter = IssueReporter::new(source);
        let mut validator = SchemaValidator::new(config, &mut governor, &mut reporter);
        let ok = validator.validate_object(object, 0).expect("no fatal fault");
        let issues = reporter
            .issues()
            .iter()
            .map(|i| (i.severity, i.message.clone()))
            .collect();
        (ok, issues)
    }

    #[test]
    fn denied_property_name_warns_and_fails() {
        let config = Config::medium();
        let (ok, issues) =
            validate_object_init("const o = { constructor: z.string() };", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(sev, m)| {
            *sev == Severity::Warning && m.contains("Property name 'constructor' is not allowed")
        }));
    }

    #[test]
    fn computed_property_rejected_by_default() {
        let config = Config::medium();
        let (ok, issues) =
            validate_object_init(r#"const o = { ["computed"]: "value" };"#, &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("Computed properties are not allowed")));
    }

    #[test]
    fn computed_string_key_tolerated_when_enabled() {
        let config = Config::relaxed();
        let (ok, issues) =
            validate_object_init(r#"const o = { ["named"]: z.string() };"#, &config);
        assert!(ok, "unexpected issues: {:?}", issues);
    }

    #[test]
    fn computed_dynamic_key_still_rejected() {
        let config = Config::relaxed();
        let (ok, issues) = validate_object_init("const o = { [key]: z.string() };", &config);
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("keys must be identifiers or string literals")));
    }

    #[test]
    fn forbidden_prefix_is_an_error() {
        let config = Config::medium();
        let (ok, issues) =
            validate_object_init("const o = { __secret: z.string() };", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(sev, m)| {
            *sev == Severity::Error && m.contains("Property name '__secret' uses a forbidden prefix")
        }));
    }

    #[test]
    fn spread_and_methods_are_rejected() {
        let config = Config::medium();
        let (ok, issues) = validate_object_init("const o = { ...rest };", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("Spread elements are not allowed")));

        let (ok, issues) =
            validate_object_init("const o = { get x() { return 1; } };", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("Object methods not allowed")));
        assert!(issues.iter().any(|(_, m)| m.contains("Getter/setter methods are not allowed")));
    }

    #[test]
    fn nesting_depth_is_capped() {
        let config = Config {
            max_object_depth: 2,
            ..Config::medium()
        };
        let (ok, issues) = validate_object_init(
            "const o = { a: { b: { c: { d: z.string() } } } };",
            &config,
        );
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("Object exceeds maximum nesting depth of 2")));
    }

    #[test]
    fn property_count_is_capped() {
        let config = Config {
            max_properties_per_object: 2,
            ..Config::medium()
        };
        let (ok, issues) =
            validate_object_init("const o = { a: 1, b: 2, c: 3 };", &config);
        assert!(!ok);
        assert!(issues
            .iter()
            .any(|(_, m)| m.contains("Object exceeds maximum property count of 2")));
    }

    #[test]
    fn first_failure_short_circuits() {
        let config = Config::medium();
        let (ok, issues) = validate_object_init(
            "const o = { __a: 1, __b: 2 };",
            &config,
        );
        assert!(!ok);
        let prefix_errors = issues
            .iter()
            .filter(|(_, m)| m.contains("forbidden prefix"))
            .count();
        assert_eq!(prefix_errors, 1, "iteration should stop at the first failure");
    }

    #[test]
    fn schema_valued_properties_are_chain_checked() {
        let config = Config::medium();
        let (ok, issues) =
            validate_object_init("const o = { name: q.string() };", &config);
        assert!(!ok);
        assert!(issues.iter().any(|(_, m)| m.contains("Chain must start with 'z'")));
    }

    #[test]
    fn caching_returns_stable_results() {
        let config = Config::medium().with_caching(true);
        let source = "const o = { name: z.string() };";
        let module = parse(source).expect("should parse");
        let Some(Stmt::VarDecl(decl)) = module.program.statements.first() else {
            panic!("expected var decl");
        };
        let Some(Expr::Object(object)) = &decl.declarators[0].init else {
            panic!("expected object");
        };

        let mut governor = Governor::new(&config);
        let mut reporter = IssueReporter::new(source);
        let mut validator = SchemaValidator::new(&config, &mut governor, &mut reporter);
        assert!(validator.validate_object(object, 0).expect("no fault"));
        assert!(validator.validate_object(object, 0).expect("no fault"));
        assert_eq!(reporter.issues().len(), 0);
    }
}
