//! Chain validation: the recognizer for `z`-rooted schema expressions.

use crate::allowlist::is_allowed_method;
use crate::ast::{Expr, MemberProp};
use crate::governor::{DepthKind, ResourceError};

use super::SchemaValidator;

impl SchemaValidator<'_> {
    /// Validate a full schema expression. `Ok(false)` means issues were
    /// reported; `Err` carries a run-fatal governor fault.
    pub fn validate_chain(&mut self, expr: &Expr) -> Result<bool, ResourceError> {
        self.chain_step(expr, 0)
    }

    fn chain_step(&mut self, expr: &Expr, depth: usize) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        if self.governor.track_depth(depth, DepthKind::Chain).is_err() {
            self.reporter.error(
                Some(expr.span()),
                expr.kind_name(),
                format!(
                    "Chain nesting depth exceeded maximum of {}",
                    self.config.max_chain_depth
                ),
            );
            return Ok(false);
        }

        match expr {
            Expr::Ident(ident) if ident.name == "z" => Ok(true),
            Expr::Ident(ident) => {
                self.reporter.error(
                    Some(ident.span),
                    "Identifier",
                    format!("Chain must start with 'z', found: {}", ident.name),
                );
                Ok(false)
            }
            Expr::Member(member) => {
                let property = match &member.property {
                    MemberProp::Computed(_) => {
                        self.reporter.error(
                            Some(member.span),
                            "MemberExpression",
                            "Computed properties not allowed in chain",
                        );
                        return Ok(false);
                    }
                    MemberProp::Ident(property) => property,
                };
                if !is_allowed_method(&property.name) {
                    self.reporter.error_with_suggestion(
                        Some(property.span),
                        "MemberExpression",
                        format!("Method not allowed in chain: {}", property.name),
                        "Use only allowed Zod methods",
                    );
                    return Ok(false);
                }
                // A member hop stays on the same chain link.
                self.chain_step(&member.object, depth)
            }
            Expr::Call(call) => {
                if !self.chain_step(&call.callee, depth + 1)? {
                    return Ok(false);
                }
                match call.method_name() {
                    Some(method) => self.validate_method_arguments(method, call),
                    // The callee already failed or passed structural checks;
                    // a call without a readable name has no argument rules.
                    None => Ok(true),
                }
            }
            other => {
                self.reporter.error(
                    Some(other.span()),
                    other.kind_name(),
                    format!("Unexpected node type in chain: {}", other.kind_name()),
                );
                Ok(false)
            }
        }
    }
}
