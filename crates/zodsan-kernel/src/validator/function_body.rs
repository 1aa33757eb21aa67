//! Safety checks for `refine`/`transform` callback bodies.
//!
//! A validation callback may read its parameters, branch, declare locals and
//! build derived values. It may not perform effects: no `await`, no `throw`,
//! no `new`, no assignments to names it does not own, and no calls that do
//! not root in `z`, a local binding, or a small set of pure globals.

use crate::ast::{ArrayElem, CallArg, Expr, FnBody, Ident, MemberProp, ObjectProp, Stmt};
use crate::governor::ResourceError;

use super::SchemaValidator;

/// Pure globals a predicate body may call through.
const SAFE_GLOBALS: &[&str] = &[
    "Number", "Math", "String", "Boolean", "Array", "isNaN", "isFinite", "parseInt", "parseFloat",
];

/// Names a callback body owns: its parameters, then every declaration the
/// walk has passed. Callback bodies are small, so bindings live in one flat
/// list — entering a nested scope records the current length and leaving
/// truncates back to it, and a lookup is a reverse scan.
struct Bindings {
    names: Vec<String>,
}

/// A scope boundary returned by [`Bindings::enter`].
type ScopeMark = usize;

impl Bindings {
    fn from_params(params: &[Ident]) -> Self {
        Self {
            names: params.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// Mark the current scope boundary.
    fn enter(&self) -> ScopeMark {
        self.names.len()
    }

    /// Forget everything bound since `mark`.
    fn leave(&mut self, mark: ScopeMark) {
        self.names.truncate(mark);
    }

    fn bind(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    fn is_bound(&self, name: &str) -> bool {
        self.names.iter().rev().any(|bound| bound == name)
    }
}

impl SchemaValidator<'_> {
    /// Validate a function-valued argument: async/generator gates first,
    /// then the body policy.
    pub(super) fn validate_function_argument(&mut self, expr: &Expr) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        match expr {
            Expr::Arrow(arrow) => {
                if arrow.is_async {
                    self.reporter.error(
                        Some(arrow.span),
                        "ArrowFunctionExpression",
                        "Async functions not allowed in schema validation",
                    );
                    return Ok(false);
                }
                let mut bindings = Bindings::from_params(&arrow.params);
                match &arrow.body {
                    FnBody::Expr(body) => self.validate_body_expr(body, &mut bindings),
                    FnBody::Block(block) => {
                        self.validate_body_stmts(&block.statements, &mut bindings)
                    }
                }
            }
            Expr::Function(function) => {
                if function.is_async {
                    self.reporter.error(
                        Some(function.span),
                        "FunctionExpression",
                        "Async functions not allowed in schema validation",
                    );
                    return Ok(false);
                }
                if function.is_generator {
                    self.reporter.error(
                        Some(function.span),
                        "FunctionExpression",
                        "Generator functions not allowed in schema validation",
                    );
                    return Ok(false);
                }
                let mut bindings = Bindings::from_params(&function.params);
                if let Some(name) = &function.name {
                    bindings.bind(&name.name);
                }
                self.validate_body_stmts(&function.body.statements, &mut bindings)
            }
            // The argument validator only sends functions here.
            other => {
                self.reporter.error(
                    Some(other.span()),
                    other.kind_name(),
                    format!("Expected a function, found {}", other.kind_name()),
                );
                Ok(false)
            }
        }
    }

    fn validate_body_stmts(
        &mut self,
        statements: &[Stmt],
        bindings: &mut Bindings,
    ) -> Result<bool, ResourceError> {
        for stmt in statements {
            if !self.validate_body_stmt(stmt, bindings)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn validate_body_stmt(
        &mut self,
        stmt: &Stmt,
        bindings: &mut Bindings,
    ) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        match stmt {
            Stmt::VarDecl(decl) => {
                for declarator in &decl.declarators {
                    bindings.bind(&declarator.name.name);
                    if let Some(init) = &declarator.init {
                        if !self.validate_body_expr(init, bindings)? {
                            return Ok(false);
                        }
                    }
                }
                Ok(true)
            }
            Stmt::Return(ret) => match &ret.argument {
                Some(argument) => self.validate_body_expr(argument, bindings),
                None => Ok(true),
            },
            Stmt::If(if_stmt) => {
                if !self.validate_body_expr(&if_stmt.test, bindings)? {
                    return Ok(false);
                }
                if !self.validate_body_stmt(&if_stmt.consequent, bindings)? {
                    return Ok(false);
                }
                match &if_stmt.alternate {
                    Some(alternate) => self.validate_body_stmt(alternate, bindings),
                    None => Ok(true),
                }
            }
            Stmt::Block(block) => {
                let mark = bindings.enter();
                let ok = self.validate_body_stmts(&block.statements, bindings)?;
                bindings.leave(mark);
                Ok(ok)
            }
            Stmt::Expr(expr_stmt) => self.validate_body_expr(&expr_stmt.expr, bindings),
            Stmt::Throw(throw) => {
                self.reporter.error(
                    Some(throw.span),
                    "ThrowStatement",
                    "Throw statements are not allowed in schema validation functions",
                );
                Ok(false)
            }
            Stmt::While(while_stmt) => {
                if !self.config.allow_loops {
                    self.reporter.error(
                        Some(while_stmt.span),
                        "WhileStatement",
                        "Loops are not allowed in schema validation functions",
                    );
                    return Ok(false);
                }
                if !self.validate_body_expr(&while_stmt.test, bindings)? {
                    return Ok(false);
                }
                self.validate_body_stmt(&while_stmt.body, bindings)
            }
            Stmt::Empty(_) => Ok(true),
            other => {
                self.reporter.error(
                    Some(other.span()),
                    other.kind_name(),
                    format!(
                        "Unexpected statement in validation function body: {}",
                        other.kind_name()
                    ),
                );
                Ok(false)
            }
        }
    }

    fn validate_body_expr(
        &mut self,
        expr: &Expr,
        bindings: &mut Bindings,
    ) -> Result<bool, ResourceError> {
        self.governor.increment_node()?;
        match expr {
            Expr::Ident(_) => Ok(true),
            Expr::Lit(lit) => Ok(self.validate_literal_argument(lit)),
            Expr::Member(member) => {
                if let MemberProp::Computed(index) = &member.property {
                    if !self.validate_body_expr(index, bindings)? {
                        return Ok(false);
                    }
                }
                self.validate_body_expr(&member.object, bindings)
            }
            Expr::Call(call) => {
                let root = call.callee.leftmost_ident().map(|i| i.name.clone());
                let callable = match &root {
                    Some(name) => {
                        name == "z"
                            || bindings.is_bound(name)
                            || SAFE_GLOBALS.contains(&name.as_str())
                    }
                    None => false,
                };
                if !callable {
                    self.reporter.error(
                        Some(call.span),
                        "CallExpression",
                        format!(
                            "Call to '{}' is not allowed in schema validation functions",
                            root.unwrap_or_else(|| "<expression>".into())
                        ),
                    );
                    return Ok(false);
                }
                if !self.validate_body_expr(&call.callee, bindings)? {
                    return Ok(false);
                }
                for arg in &call.args {
                    let inner = match arg {
                        CallArg::Expr(inner) | CallArg::Spread(inner, _) => inner,
                    };
                    if !self.validate_body_expr(inner, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Assign(assign) => {
                let assignable = match &*assign.target {
                    Expr::Ident(ident) => bindings.is_bound(&ident.name),
                    // Writing through a local is tolerated; writing through
                    // anything else is an effect on the outside world.
                    Expr::Member(member) => member
                        .object
                        .leftmost_ident()
                        .map(|i| bindings.is_bound(&i.name))
                        .unwrap_or(false),
                    _ => false,
                };
                if !assignable {
                    self.reporter.error(
                        Some(assign.span),
                        "AssignmentExpression",
                        "Assignments to free variables are not allowed in schema validation functions",
                    );
                    return Ok(false);
                }
                self.validate_body_expr(&assign.value, bindings)
            }
            Expr::Await(awaited) => {
                self.reporter.error(
                    Some(awaited.span),
                    "AwaitExpression",
                    "Await expressions are not allowed in schema validation functions",
                );
                Ok(false)
            }
            Expr::New(new) => {
                self.reporter.error(
                    Some(new.span),
                    "NewExpression",
                    "Object construction is not allowed in schema validation functions",
                );
                Ok(false)
            }
            Expr::Unary(unary) => self.validate_body_expr(&unary.argument, bindings),
            Expr::Binary(binary) => {
                if !self.validate_body_expr(&binary.left, bindings)? {
                    return Ok(false);
                }
                self.validate_body_expr(&binary.right, bindings)
            }
            Expr::Cond(cond) => {
                if !self.validate_body_expr(&cond.test, bindings)? {
                    return Ok(false);
                }
                if !self.validate_body_expr(&cond.consequent, bindings)? {
                    return Ok(false);
                }
                self.validate_body_expr(&cond.alternate, bindings)
            }
            Expr::Object(object) => {
                for prop in &object.properties {
                    let ok = match prop {
                        ObjectProp::Property { value, .. } => {
                            self.validate_body_expr(value, bindings)?
                        }
                        ObjectProp::Spread { argument, .. } => {
                            self.validate_body_expr(argument, bindings)?
                        }
                        ObjectProp::Method { span, .. } => {
                            self.reporter.error(
                                Some(*span),
                                "ObjectMethod",
                                "Object methods not allowed",
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
            Expr::Array(array) => {
                for element in array.elements.iter().flatten() {
                    let inner = match element {
                        ArrayElem::Expr(inner) | ArrayElem::Spread(inner, _) => inner,
                    };
                    if !self.validate_body_expr(inner, bindings)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            // Nested callbacks obey the same policy, with their own
            // parameters layered over the enclosing scope.
            Expr::Arrow(arrow) => {
                if arrow.is_async {
                    self.reporter.error(
                        Some(arrow.span),
                        "ArrowFunctionExpression",
                        "Async functions not allowed in schema validation",
                    );
                    return Ok(false);
                }
                let mark = bindings.enter();
                for param in &arrow.params {
                    bindings.bind(&param.name);
                }
                let ok = match &arrow.body {
                    FnBody::Expr(body) => self.validate_body_expr(body, bindings)?,
                    FnBody::Block(block) => {
                        self.validate_body_stmts(&block.statements, bindings)?
                    }
                };
                bindings.leave(mark);
                Ok(ok)
            }
            Expr::Function(function) => {
                if function.is_async || function.is_generator {
                    self.reporter.error(
                        Some(function.span),
                        "FunctionExpression",
                        if function.is_async {
                            "Async functions not allowed in schema validation"
                        } else {
                            "Generator functions not allowed in schema validation"
                        },
                    );
                    return Ok(false);
                }
                let mark = bindings.enter();
                for param in &function.params {
                    bindings.bind(&param.name);
                }
                if let Some(name) = &function.name {
                    bindings.bind(&name.name);
                }
                let ok = self.validate_body_stmts(&function.body.statements, bindings)?;
                bindings.leave(mark);
                Ok(ok)
            }
        }
    }
}
