//! Schema grouping: reference graph, connected components, inlining.
//!
//! Works on the cleaned source. Every variable declarator, at any depth,
//! becomes a node; an identifier anywhere inside an initializer subtree
//! (callback bodies included) that names another declarator becomes an
//! edge. Weakly-connected components are rendered one at a time: the
//! component root's initializer is deep-copied with every member reference
//! replaced by a recursively-inlined copy of that member's initializer, so
//! each group's `code` stands alone.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::ast::{
    ArrayElem, ArrayLit, ArrowFn, AssignExpr, AwaitExpr, BinaryExpr, BlockStmt, CallArg, CallExpr,
    CondExpr, Declarator, Expr, ExprStmt, FnBody, FnExpr, Ident, IfStmt, MemberExpr, MemberProp,
    NewExpr, ObjectLit, ObjectProp, PropKey, ReturnStmt, Stmt, ThrowStmt, UnaryExpr, VarDecl,
    WhileStmt,
};
use crate::config::Config;
use crate::governor::{Governor, ResourceError};
use crate::parser;
use crate::printer;

/// Size and shape measurements for one group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetrics {
    pub schema_count: usize,
    pub total_lines: usize,
    pub complexity: f64,
}

/// One connected component, rendered self-contained.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGroup {
    /// Member names, chosen root first.
    pub schema_names: Vec<String>,
    /// `export const <root> = <inlined>;`
    pub code: String,
    pub metrics: GroupMetrics,
}

/// One collected declarator.
struct SchemaInfo {
    name: String,
    init: Expr,
    /// Direct dependencies on other collected names.
    dependencies: BTreeSet<String>,
}

/// Compute schema groups for `cleaned_code`. Returns a human-readable
/// reason on failure; the caller degrades it to a warning.
pub fn build_schema_groups(
    cleaned_code: &str,
    config: &Config,
    governor: &mut Governor,
) -> Result<Vec<SchemaGroup>, String> {
    let module = parser::parse(cleaned_code).map_err(|errors| {
        errors
            .first()
            .map(|e| format!("re-parse failed: {}", e.message))
            .unwrap_or_else(|| "re-parse failed".to_string())
    })?;

    let mut infos = collect_declarators(&module.program.statements);
    if infos.is_empty() {
        return Ok(Vec::new());
    }

    let known: HashSet<String> = infos.iter().map(|i| i.name.clone()).collect();
    for info in &mut infos {
        let mut dependencies = BTreeSet::new();
        collect_references(&info.init, &known, &info.name, &mut dependencies);
        info.dependencies = dependencies;
    }

    // Reverse edges: references[n] = names whose initializers mention n.
    let mut references: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for info in &infos {
        for dep in &info.dependencies {
            references.entry(dep.as_str()).or_default().insert(info.name.as_str());
        }
    }

    let by_name: HashMap<&str, &SchemaInfo> =
        infos.iter().map(|i| (i.name.as_str(), i)).collect();
    let order: HashMap<&str, usize> = infos
        .iter()
        .enumerate()
        .map(|(i, info)| (info.name.as_str(), i))
        .collect();

    let mut groups = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    for info in &infos {
        if visited.contains(info.name.as_str()) {
            continue;
        }
        let members = component_of(info.name.as_str(), &by_name, &references, &order, &mut visited);
        match render_group(&members, &by_name, config, governor) {
            Ok(group) => groups.push(group),
            Err(fault) => return Err(fault.to_string()),
        }
    }

    groups.sort_by(|a, b| {
        b.metrics
            .schema_count
            .cmp(&a.metrics.schema_count)
            .then(b.metrics.complexity.total_cmp(&a.metrics.complexity))
            .then(b.metrics.total_lines.cmp(&a.metrics.total_lines))
    });
    Ok(groups)
}

/// Every variable declarator with an initializer, at any depth, in
/// depth-first source order. Declarations nested inside callback bodies
/// count too; on a name collision the first (outermost) declarator wins.
fn collect_declarators(statements: &[Stmt]) -> Vec<SchemaInfo> {
    let mut infos = Vec::new();
    for stmt in statements {
        collect_declarators_stmt(stmt, &mut infos);
    }
    let mut seen = HashSet::new();
    infos.retain(|info| seen.insert(info.name.clone()));
    infos
}

fn collect_declarators_stmt(stmt: &Stmt, out: &mut Vec<SchemaInfo>) {
    match stmt {
        Stmt::VarDecl(decl) => collect_declarators_decl(decl, out),
        Stmt::ExportNamed(export) => collect_declarators_decl(&export.decl, out),
        Stmt::ExportDefault(export) => collect_declarators_expr(&export.expr, out),
        Stmt::Expr(expr_stmt) => collect_declarators_expr(&expr_stmt.expr, out),
        Stmt::Return(ret) => {
            if let Some(argument) = &ret.argument {
                collect_declarators_expr(argument, out);
            }
        }
        Stmt::If(if_stmt) => {
            collect_declarators_expr(&if_stmt.test, out);
            collect_declarators_stmt(&if_stmt.consequent, out);
            if let Some(alternate) = &if_stmt.alternate {
                collect_declarators_stmt(alternate, out);
            }
        }
        Stmt::While(while_stmt) => {
            collect_declarators_expr(&while_stmt.test, out);
            collect_declarators_stmt(&while_stmt.body, out);
        }
        Stmt::Block(block) => {
            for inner in &block.statements {
                collect_declarators_stmt(inner, out);
            }
        }
        Stmt::Throw(throw) => collect_declarators_expr(&throw.argument, out),
        Stmt::Import(_) | Stmt::Unknown(_) | Stmt::Empty(_) => {}
    }
}

fn collect_declarators_decl(decl: &VarDecl, out: &mut Vec<SchemaInfo>) {
    for declarator in &decl.declarators {
        if let Some(init) = &declarator.init {
            out.push(SchemaInfo {
                name: declarator.name.name.clone(),
                init: init.clone(),
                dependencies: BTreeSet::new(),
            });
            collect_declarators_expr(init, out);
        }
    }
}

/// Only function bodies can nest further statements inside an expression.
fn collect_declarators_expr(expr: &Expr, out: &mut Vec<SchemaInfo>) {
    match expr {
        Expr::Arrow(arrow) => match &arrow.body {
            FnBody::Expr(body) => collect_declarators_expr(body, out),
            FnBody::Block(block) => {
                for inner in &block.statements {
                    collect_declarators_stmt(inner, out);
                }
            }
        },
        Expr::Function(function) => {
            for inner in &function.body.statements {
                collect_declarators_stmt(inner, out);
            }
        }
        Expr::Member(member) => {
            collect_declarators_expr(&member.object, out);
            if let MemberProp::Computed(index) = &member.property {
                collect_declarators_expr(index, out);
            }
        }
        Expr::Call(call) => {
            collect_declarators_expr(&call.callee, out);
            for arg in &call.args {
                match arg {
                    CallArg::Expr(inner) | CallArg::Spread(inner, _) => {
                        collect_declarators_expr(inner, out)
                    }
                }
            }
        }
        Expr::Object(object) => {
            for prop in &object.properties {
                match prop {
                    ObjectProp::Property { key, value, .. } => {
                        if let PropKey::Computed { expr: key_expr, .. } = key {
                            collect_declarators_expr(key_expr, out);
                        }
                        collect_declarators_expr(value, out);
                    }
                    ObjectProp::Spread { argument, .. } => {
                        collect_declarators_expr(argument, out)
                    }
                    ObjectProp::Method { .. } => {}
                }
            }
        }
        Expr::Array(array) => {
            for element in array.elements.iter().flatten() {
                match element {
                    ArrayElem::Expr(inner) | ArrayElem::Spread(inner, _) => {
                        collect_declarators_expr(inner, out)
                    }
                }
            }
        }
        Expr::New(new) => collect_declarators_expr(&new.expr, out),
        Expr::Await(awaited) => collect_declarators_expr(&awaited.argument, out),
        Expr::Unary(unary) => collect_declarators_expr(&unary.argument, out),
        Expr::Binary(binary) => {
            collect_declarators_expr(&binary.left, out);
            collect_declarators_expr(&binary.right, out);
        }
        Expr::Cond(cond) => {
            collect_declarators_expr(&cond.test, out);
            collect_declarators_expr(&cond.consequent, out);
            collect_declarators_expr(&cond.alternate, out);
        }
        Expr::Assign(assign) => {
            collect_declarators_expr(&assign.target, out);
            collect_declarators_expr(&assign.value, out);
        }
        Expr::Ident(_) | Expr::Lit(_) => {}
    }
}

/// Record every identifier in `expr` that names another collected schema.
fn collect_references(
    expr: &Expr,
    known: &HashSet<String>,
    own_name: &str,
    out: &mut BTreeSet<String>,
) {
    match expr {
        Expr::Ident(ident) => {
            if ident.name != own_name && known.contains(&ident.name) {
                out.insert(ident.name.clone());
            }
        }
        Expr::Member(member) => {
            collect_references(&member.object, known, own_name, out);
            if let MemberProp::Computed(index) = &member.property {
                collect_references(index, known, own_name, out);
            }
        }
        Expr::Call(call) => {
            collect_references(&call.callee, known, own_name, out);
            for arg in &call.args {
                match arg {
                    CallArg::Expr(inner) | CallArg::Spread(inner, _) => {
                        collect_references(inner, known, own_name, out)
                    }
                }
            }
        }
        Expr::Object(object) => {
            for prop in &object.properties {
                match prop {
                    ObjectProp::Property { key, value, .. } => {
                        if let PropKey::Computed { expr: key_expr, .. } = key {
                            collect_references(key_expr, known, own_name, out);
                        }
                        collect_references(value, known, own_name, out);
                    }
                    ObjectProp::Spread { argument, .. } => {
                        collect_references(argument, known, own_name, out)
                    }
                    ObjectProp::Method { .. } => {}
                }
            }
        }
        Expr::Array(array) => {
            for element in array.elements.iter().flatten() {
                match element {
                    ArrayElem::Expr(inner) | ArrayElem::Spread(inner, _) => {
                        collect_references(inner, known, own_name, out)
                    }
                }
            }
        }
        Expr::Arrow(arrow) => match &arrow.body {
            FnBody::Expr(body) => collect_references(body, known, own_name, out),
            FnBody::Block(block) => {
                for stmt in &block.statements {
                    collect_references_stmt(stmt, known, own_name, out);
                }
            }
        },
        Expr::Function(function) => {
            for stmt in &function.body.statements {
                collect_references_stmt(stmt, known, own_name, out);
            }
        }
        Expr::New(new) => collect_references(&new.expr, known, own_name, out),
        Expr::Await(awaited) => collect_references(&awaited.argument, known, own_name, out),
        Expr::Unary(unary) => collect_references(&unary.argument, known, own_name, out),
        Expr::Binary(binary) => {
            collect_references(&binary.left, known, own_name, out);
            collect_references(&binary.right, known, own_name, out);
        }
        Expr::Cond(cond) => {
            collect_references(&cond.test, known, own_name, out);
            collect_references(&cond.consequent, known, own_name, out);
            collect_references(&cond.alternate, known, own_name, out);
        }
        Expr::Assign(assign) => {
            collect_references(&assign.target, known, own_name, out);
            collect_references(&assign.value, known, own_name, out);
        }
        Expr::Lit(_) => {}
    }
}

/// Statement arm of the reference walk, for callback bodies.
fn collect_references_stmt(
    stmt: &Stmt,
    known: &HashSet<String>,
    own_name: &str,
    out: &mut BTreeSet<String>,
) {
    match stmt {
        Stmt::VarDecl(decl) => {
            for declarator in &decl.declarators {
                if let Some(init) = &declarator.init {
                    collect_references(init, known, own_name, out);
                }
            }
        }
        Stmt::ExportNamed(export) => {
            for declarator in &export.decl.declarators {
                if let Some(init) = &declarator.init {
                    collect_references(init, known, own_name, out);
                }
            }
        }
        Stmt::ExportDefault(export) => collect_references(&export.expr, known, own_name, out),
        Stmt::Expr(expr_stmt) => collect_references(&expr_stmt.expr, known, own_name, out),
        Stmt::Return(ret) => {
            if let Some(argument) = &ret.argument {
                collect_references(argument, known, own_name, out);
            }
        }
        Stmt::If(if_stmt) => {
            collect_references(&if_stmt.test, known, own_name, out);
            collect_references_stmt(&if_stmt.consequent, known, own_name, out);
            if let Some(alternate) = &if_stmt.alternate {
                collect_references_stmt(alternate, known, own_name, out);
            }
        }
        Stmt::While(while_stmt) => {
            collect_references(&while_stmt.test, known, own_name, out);
            collect_references_stmt(&while_stmt.body, known, own_name, out);
        }
        Stmt::Block(block) => {
            for inner in &block.statements {
                collect_references_stmt(inner, known, own_name, out);
            }
        }
        Stmt::Throw(throw) => collect_references(&throw.argument, known, own_name, out),
        Stmt::Import(_) | Stmt::Unknown(_) | Stmt::Empty(_) => {}
    }
}

/// Undirected DFS over forward + reverse edges, returning members in
/// declaration order.
fn component_of<'a>(
    start: &'a str,
    by_name: &HashMap<&'a str, &'a SchemaInfo>,
    references: &HashMap<&'a str, BTreeSet<&'a str>>,
    order: &HashMap<&'a str, usize>,
    visited: &mut HashSet<&'a str>,
) -> Vec<&'a str> {
    let mut stack = vec![start];
    let mut members: Vec<&str> = Vec::new();
    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }
        members.push(name);
        if let Some(info) = by_name.get(name) {
            for dep in &info.dependencies {
                stack.push(dep.as_str());
            }
        }
        if let Some(dependents) = references.get(name) {
            for dependent in dependents {
                stack.push(dependent);
            }
        }
    }

    // Declaration order is the stable iteration order everywhere.
    members.sort_by_key(|n| order.get(n).copied().unwrap_or(usize::MAX));
    members
}

fn render_group(
    members: &[&str],
    by_name: &HashMap<&str, &SchemaInfo>,
    config: &Config,
    governor: &mut Governor,
) -> Result<SchemaGroup, ResourceError> {
    // Root: a member that depends on other members but is referenced by
    // none of them; otherwise the first member.
    let in_group: HashSet<&str> = members.iter().copied().collect();
    let root = members
        .iter()
        .copied()
        .find(|name| {
            let info = by_name[name];
            let has_outgoing = info.dependencies.iter().any(|d| in_group.contains(d.as_str()));
            let has_incoming = members.iter().any(|other| {
                other != name && by_name[other].dependencies.contains(*name)
            });
            has_outgoing && !has_incoming
        })
        .unwrap_or(members[0]);

    let substitutions: HashMap<&str, &Expr> = members
        .iter()
        .map(|name| (*name, &by_name[name].init))
        .collect();

    let mut inlined = inline_expr(&by_name[root].init, &substitutions, governor)?;
    if config.unification.unwrap_array_root {
        inlined = unwrap_array_root(inlined);
    }

    let code = format!("export const {} = {};", root, printer::print_expr(&inlined));

    let mut schema_names = vec![root.to_string()];
    schema_names.extend(
        members
            .iter()
            .filter(|n| **n != root)
            .map(|n| n.to_string()),
    );

    let metrics = GroupMetrics {
        schema_count: members.len(),
        total_lines: code.lines().count(),
        complexity: count_occurrences(&code, "z.") as f64
            + 2.0 * count_occurrences(&code, "object(") as f64
            + 1.5 * count_occurrences(&code, "array(") as f64,
    };

    Ok(SchemaGroup { schema_names, code, metrics })
}

/// Deep copy with substitution: identifiers naming a group member are
/// replaced by that member's (recursively inlined) initializer. The
/// governor's node cap bounds the expansion of cyclic inputs.
fn inline_expr(
    expr: &Expr,
    substitutions: &HashMap<&str, &Expr>,
    governor: &mut Governor,
) -> Result<Expr, ResourceError> {
    governor.increment_node()?;
    let inlined = match expr {
        Expr::Ident(ident) => match substitutions.get(ident.name.as_str()) {
            Some(replacement) => inline_expr(replacement, substitutions, governor)?,
            None => Expr::Ident(ident.clone()),
        },
        Expr::Member(member) => Expr::Member(MemberExpr {
            object: Box::new(inline_expr(&member.object, substitutions, governor)?),
            property: match &member.property {
                MemberProp::Ident(name) => MemberProp::Ident(name.clone()),
                MemberProp::Computed(index) => {
                    MemberProp::Computed(Box::new(inline_expr(index, substitutions, governor)?))
                }
            },
            span: member.span,
        }),
        Expr::Call(call) => {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(match arg {
                    CallArg::Expr(inner) => {
                        CallArg::Expr(inline_expr(inner, substitutions, governor)?)
                    }
                    CallArg::Spread(inner, span) => {
                        CallArg::Spread(inline_expr(inner, substitutions, governor)?, *span)
                    }
                });
            }
            Expr::Call(CallExpr {
                callee: Box::new(inline_expr(&call.callee, substitutions, governor)?),
                args,
                span: call.span,
            })
        }
        Expr::Object(object) => {
            let mut properties = Vec::with_capacity(object.properties.len());
            for prop in &object.properties {
                properties.push(match prop {
                    ObjectProp::Property { key, value, shorthand, span } => {
                        // A shorthand member reference must become an
                        // explicit `key: <inlined>` pair.
                        let value = inline_expr(value, substitutions, governor)?;
                        let shorthand = *shorthand
                            && matches!(&value, Expr::Ident(i) if key_ident_name(key) == Some(i.name.as_str()));
                        ObjectProp::Property {
                            key: key.clone(),
                            value,
                            shorthand,
                            span: *span,
                        }
                    }
                    ObjectProp::Spread { argument, span } => ObjectProp::Spread {
                        argument: inline_expr(argument, substitutions, governor)?,
                        span: *span,
                    },
                    ObjectProp::Method { kind, raw, span } => ObjectProp::Method {
                        kind: *kind,
                        raw: raw.clone(),
                        span: *span,
                    },
                });
            }
            Expr::Object(ObjectLit { properties, span: object.span })
        }
        Expr::Array(array) => {
            let mut elements = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                elements.push(match element {
                    Some(ArrayElem::Expr(inner)) => {
                        Some(ArrayElem::Expr(inline_expr(inner, substitutions, governor)?))
                    }
                    Some(ArrayElem::Spread(inner, span)) => {
                        Some(ArrayElem::Spread(inline_expr(inner, substitutions, governor)?, *span))
                    }
                    None => None,
                });
            }
            Expr::Array(ArrayLit { elements, span: array.span })
        }
        Expr::Arrow(arrow) => Expr::Arrow(ArrowFn {
            params: arrow.params.clone(),
            body: match &arrow.body {
                FnBody::Expr(body) => {
                    FnBody::Expr(Box::new(inline_expr(body, substitutions, governor)?))
                }
                FnBody::Block(block) => {
                    FnBody::Block(inline_block(block, substitutions, governor)?)
                }
            },
            is_async: arrow.is_async,
            span: arrow.span,
        }),
        Expr::New(new) => Expr::New(NewExpr {
            expr: Box::new(inline_expr(&new.expr, substitutions, governor)?),
            span: new.span,
        }),
        Expr::Await(awaited) => Expr::Await(AwaitExpr {
            argument: Box::new(inline_expr(&awaited.argument, substitutions, governor)?),
            span: awaited.span,
        }),
        Expr::Unary(unary) => Expr::Unary(UnaryExpr {
            op: unary.op,
            argument: Box::new(inline_expr(&unary.argument, substitutions, governor)?),
            span: unary.span,
        }),
        Expr::Binary(binary) => Expr::Binary(BinaryExpr {
            left: Box::new(inline_expr(&binary.left, substitutions, governor)?),
            op: binary.op,
            right: Box::new(inline_expr(&binary.right, substitutions, governor)?),
            span: binary.span,
        }),
        Expr::Cond(cond) => Expr::Cond(CondExpr {
            test: Box::new(inline_expr(&cond.test, substitutions, governor)?),
            consequent: Box::new(inline_expr(&cond.consequent, substitutions, governor)?),
            alternate: Box::new(inline_expr(&cond.alternate, substitutions, governor)?),
            span: cond.span,
        }),
        Expr::Assign(assign) => Expr::Assign(AssignExpr {
            target: Box::new(inline_expr(&assign.target, substitutions, governor)?),
            value: Box::new(inline_expr(&assign.value, substitutions, governor)?),
            span: assign.span,
        }),
        Expr::Function(function) => Expr::Function(FnExpr {
            name: function.name.clone(),
            params: function.params.clone(),
            body: inline_block(&function.body, substitutions, governor)?,
            is_async: function.is_async,
            is_generator: function.is_generator,
            span: function.span,
        }),
        Expr::Lit(lit) => Expr::Lit(lit.clone()),
    };
    Ok(inlined)
}

fn inline_block(
    block: &BlockStmt,
    substitutions: &HashMap<&str, &Expr>,
    governor: &mut Governor,
) -> Result<BlockStmt, ResourceError> {
    let mut statements = Vec::with_capacity(block.statements.len());
    for stmt in &block.statements {
        statements.push(inline_stmt(stmt, substitutions, governor)?);
    }
    Ok(BlockStmt { statements, span: block.span })
}

fn inline_stmt(
    stmt: &Stmt,
    substitutions: &HashMap<&str, &Expr>,
    governor: &mut Governor,
) -> Result<Stmt, ResourceError> {
    governor.increment_node()?;
    let inlined = match stmt {
        Stmt::VarDecl(decl) => {
            let mut declarators = Vec::with_capacity(decl.declarators.len());
            for declarator in &decl.declarators {
                declarators.push(Declarator {
                    name: declarator.name.clone(),
                    init: match &declarator.init {
                        Some(init) => Some(inline_expr(init, substitutions, governor)?),
                        None => None,
                    },
                    span: declarator.span,
                });
            }
            Stmt::VarDecl(VarDecl { kind: decl.kind, declarators, span: decl.span })
        }
        Stmt::Return(ret) => Stmt::Return(ReturnStmt {
            argument: match &ret.argument {
                Some(argument) => Some(inline_expr(argument, substitutions, governor)?),
                None => None,
            },
            span: ret.span,
        }),
        Stmt::If(if_stmt) => Stmt::If(IfStmt {
            test: inline_expr(&if_stmt.test, substitutions, governor)?,
            consequent: Box::new(inline_stmt(&if_stmt.consequent, substitutions, governor)?),
            alternate: match &if_stmt.alternate {
                Some(alternate) => {
                    Some(Box::new(inline_stmt(alternate, substitutions, governor)?))
                }
                None => None,
            },
            span: if_stmt.span,
        }),
        Stmt::While(while_stmt) => Stmt::While(WhileStmt {
            test: inline_expr(&while_stmt.test, substitutions, governor)?,
            body: Box::new(inline_stmt(&while_stmt.body, substitutions, governor)?),
            span: while_stmt.span,
        }),
        Stmt::Block(block) => Stmt::Block(inline_block(block, substitutions, governor)?),
        Stmt::Throw(throw) => Stmt::Throw(ThrowStmt {
            argument: inline_expr(&throw.argument, substitutions, governor)?,
            span: throw.span,
        }),
        Stmt::Expr(expr_stmt) => Stmt::Expr(ExprStmt {
            expr: inline_expr(&expr_stmt.expr, substitutions, governor)?,
            span: expr_stmt.span,
        }),
        // Module-level statements cannot appear inside a callback body.
        other => other.clone(),
    };
    Ok(inlined)
}

fn key_ident_name(key: &PropKey) -> Option<&str> {
    match key {
        PropKey::Ident(Ident { name, .. }) => Some(name.as_str()),
        _ => None,
    }
}

/// Replace a top-level `z.array(inner)` with `inner`, exactly once.
fn unwrap_array_root(expr: Expr) -> Expr {
    match expr {
        Expr::Call(call) => {
            let is_z_array = match &*call.callee {
                Expr::Member(member) => {
                    matches!(&*member.object, Expr::Ident(obj) if obj.name == "z")
                        && matches!(&member.property, MemberProp::Ident(p) if p.name == "array")
                }
                _ => false,
            };
            if is_z_array && call.args.len() == 1 {
                if let CallArg::Expr(inner) = &call.args[0] {
                    return inner.clone();
                }
            }
            Expr::Call(call)
        }
        other => other,
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
