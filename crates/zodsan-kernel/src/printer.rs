//! Source rendering.
//!
//! Two printers live here:
//!
//! - [`print_cleaned`] emits the sanitized module by slicing surviving
//!   statements out of the original source (comments and formatting intact),
//!   inserting `export ` where the sanitizer requested auto-export;
//! - [`print_expr`] renders a synthesized expression tree (the inliner's
//!   output) back to canonical source for schema-group code.

use crate::ast::{
    ArrayElem, BlockStmt, CallArg, Expr, FnBody, LitKind, MemberProp, ObjectProp, Program,
    PropKey, Span, Stmt,
};
use crate::lexer::Comment;

/// What the sanitizer decided about one top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep the statement as written.
    Keep,
    /// Keep, wrapped in a named export.
    Export,
    /// Drop the statement (and any comments inside it).
    Remove,
}

/// Render the cleaned module. `dispositions` parallels
/// `program.statements`; comments between statements are re-attached in
/// source order unless they sat inside removed statements.
pub fn print_cleaned(
    source: &str,
    program: &Program,
    dispositions: &[Disposition],
    comments: &[Comment],
) -> String {
    debug_assert_eq!(program.statements.len(), dispositions.len());

    let removed: Vec<Span> = program
        .statements
        .iter()
        .zip(dispositions)
        .filter(|(_, d)| **d == Disposition::Remove)
        .map(|(s, _)| s.span())
        .collect();
    let kept: Vec<Span> = program
        .statements
        .iter()
        .zip(dispositions)
        .filter(|(_, d)| **d != Disposition::Remove)
        .map(|(s, _)| s.span())
        .collect();

    // Standalone comments: not inside any statement's span. Comments inside
    // kept statements ride along with the slice; comments inside removed
    // statements disappear with them.
    let standalone = |c: &Comment| {
        !removed.iter().chain(kept.iter()).any(|s| c.span.start >= s.start && c.span.end <= s.end)
    };

    let mut pieces: Vec<String> = Vec::new();
    let mut next_comment = 0;

    let flush_comments_before = |pieces: &mut Vec<String>, next_comment: &mut usize, limit: usize| {
        while *next_comment < comments.len() && comments[*next_comment].span.start < limit {
            let comment = &comments[*next_comment];
            if standalone(comment) {
                pieces.push(comment.text.clone());
            }
            *next_comment += 1;
        }
    };

    for (stmt, disposition) in program.statements.iter().zip(dispositions) {
        let span = stmt.span();
        flush_comments_before(&mut pieces, &mut next_comment, span.start);
        match disposition {
            Disposition::Remove => {}
            Disposition::Keep => pieces.push(slice(source, span)),
            Disposition::Export => pieces.push(format!("export {}", slice(source, span))),
        }
    }
    flush_comments_before(&mut pieces, &mut next_comment, usize::MAX);

    if pieces.is_empty() {
        String::new()
    } else {
        let mut out = pieces.join("\n");
        out.push('\n');
        out
    }
}

fn slice(source: &str, span: Span) -> String {
    let start = span.start.min(source.len());
    let end = span.end.min(source.len());
    source[start..end].trim_end().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expression printer
// ═══════════════════════════════════════════════════════════════════════════

const INDENT: &str = "  ";

/// Render an expression tree to canonical source.
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out
}

fn write_expr(out: &mut String, expr: &Expr, indent: usize) {
    match expr {
        Expr::Ident(ident) => out.push_str(&ident.name),
        Expr::Lit(lit) => match &lit.kind {
            LitKind::Str { raw, .. }
            | LitKind::Num { raw }
            | LitKind::BigInt { raw }
            | LitKind::Template { raw, .. } => out.push_str(raw),
            LitKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            LitKind::Null => out.push_str("null"),
            LitKind::Regex { pattern, flags } => {
                out.push('/');
                out.push_str(pattern);
                out.push('/');
                out.push_str(flags);
            }
        },
        Expr::Member(member) => {
            write_operand(out, &member.object, indent);
            match &member.property {
                MemberProp::Ident(name) => {
                    out.push('.');
                    out.push_str(&name.name);
                }
                MemberProp::Computed(inner) => {
                    out.push('[');
                    write_expr(out, inner, indent);
                    out.push(']');
                }
            }
        }
        Expr::Call(call) => {
            write_operand(out, &call.callee, indent);
            out.push('(');
            for (i, arg) in call.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match arg {
                    CallArg::Expr(inner) => write_expr(out, inner, indent),
                    CallArg::Spread(inner, _) => {
                        out.push_str("...");
                        write_expr(out, inner, indent);
                    }
                }
            }
            out.push(')');
        }
        Expr::Object(object) => {
            if object.properties.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, prop) in object.properties.iter().enumerate() {
                out.push_str(&INDENT.repeat(indent + 1));
                write_prop(out, prop, indent + 1);
                if i + 1 < object.properties.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(indent));
            out.push('}');
        }
        Expr::Array(array) => {
            out.push('[');
            for (i, element) in array.elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match element {
                    Some(ArrayElem::Expr(inner)) => write_expr(out, inner, indent),
                    Some(ArrayElem::Spread(inner, _)) => {
                        out.push_str("...");
                        write_expr(out, inner, indent);
                    }
                    None => {}
                }
            }
            out.push(']');
        }
        Expr::Arrow(arrow) => {
            if arrow.is_async {
                out.push_str("async ");
            }
            if arrow.params.len() == 1 {
                out.push_str(&arrow.params[0].name);
            } else {
                out.push('(');
                for (i, param) in arrow.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&param.name);
                }
                out.push(')');
            }
            out.push_str(" => ");
            match &arrow.body {
                FnBody::Expr(body) => {
                    // An object body needs parens to not read as a block.
                    if matches!(**body, Expr::Object(_)) {
                        out.push('(');
                        write_expr(out, body, indent);
                        out.push(')');
                    } else {
                        write_expr(out, body, indent);
                    }
                }
                FnBody::Block(block) => write_block(out, block, indent),
            }
        }
        Expr::Function(function) => {
            if function.is_async {
                out.push_str("async ");
            }
            out.push_str("function");
            if function.is_generator {
                out.push('*');
            }
            if let Some(name) = &function.name {
                out.push(' ');
                out.push_str(&name.name);
            }
            out.push('(');
            for (i, param) in function.params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&param.name);
            }
            out.push_str(") ");
            write_block(out, &function.body, indent);
        }
        Expr::New(new) => {
            out.push_str("new ");
            write_expr(out, &new.expr, indent);
        }
        Expr::Await(awaited) => {
            out.push_str("await ");
            write_expr(out, &awaited.argument, indent);
        }
        Expr::Unary(unary) => {
            out.push_str(&unary.op.to_string());
            write_operand(out, &unary.argument, indent);
        }
        Expr::Binary(binary) => {
            write_operand(out, &binary.left, indent);
            out.push(' ');
            out.push_str(&binary.op.to_string());
            out.push(' ');
            write_operand(out, &binary.right, indent);
        }
        Expr::Cond(cond) => {
            write_operand(out, &cond.test, indent);
            out.push_str(" ? ");
            write_expr(out, &cond.consequent, indent);
            out.push_str(" : ");
            write_expr(out, &cond.alternate, indent);
        }
        Expr::Assign(assign) => {
            write_expr(out, &assign.target, indent);
            out.push_str(" = ");
            write_expr(out, &assign.value, indent);
        }
    }
}

/// Like [`write_expr`] but parenthesizes expressions that would otherwise
/// bind wrong as an operand (arrow bodies, conditionals, binaries...).
fn write_operand(out: &mut String, expr: &Expr, indent: usize) {
    let needs_parens = matches!(
        expr,
        Expr::Arrow(_) | Expr::Cond(_) | Expr::Assign(_) | Expr::Binary(_) | Expr::Function(_)
    );
    if needs_parens {
        out.push('(');
        write_expr(out, expr, indent);
        out.push(')');
    } else {
        write_expr(out, expr, indent);
    }
}

fn write_prop(out: &mut String, prop: &ObjectProp, indent: usize) {
    match prop {
        ObjectProp::Property { key, value, shorthand, .. } => {
            match key {
                PropKey::Ident(ident) => out.push_str(&ident.name),
                PropKey::Str { raw, .. } => out.push_str(raw),
                PropKey::Num { raw, .. } => out.push_str(raw),
                PropKey::Computed { expr, .. } => {
                    out.push('[');
                    write_expr(out, expr, indent);
                    out.push(']');
                }
            }
            if !*shorthand {
                out.push_str(": ");
                write_expr(out, value, indent);
            }
        }
        ObjectProp::Method { raw, .. } => out.push_str(raw),
        ObjectProp::Spread { argument, .. } => {
            out.push_str("...");
            write_expr(out, argument, indent);
        }
    }
}

fn write_block(out: &mut String, block: &BlockStmt, indent: usize) {
    if block.statements.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for stmt in &block.statements {
        out.push_str(&INDENT.repeat(indent + 1));
        write_stmt(out, stmt, indent + 1);
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(indent));
    out.push('}');
}

fn write_stmt(out: &mut String, stmt: &Stmt, indent: usize) {
    match stmt {
        Stmt::VarDecl(decl) => {
            out.push_str(&decl.kind.to_string());
            out.push(' ');
            for (i, declarator) in decl.declarators.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&declarator.name.name);
                if let Some(init) = &declarator.init {
                    out.push_str(" = ");
                    write_expr(out, init, indent);
                }
            }
            out.push(';');
        }
        Stmt::Return(ret) => {
            out.push_str("return");
            if let Some(argument) = &ret.argument {
                out.push(' ');
                write_expr(out, argument, indent);
            }
            out.push(';');
        }
        Stmt::If(if_stmt) => {
            out.push_str("if (");
            write_expr(out, &if_stmt.test, indent);
            out.push_str(") ");
            write_stmt(out, &if_stmt.consequent, indent);
            if let Some(alternate) = &if_stmt.alternate {
                out.push_str(" else ");
                write_stmt(out, alternate, indent);
            }
        }
        Stmt::Throw(throw) => {
            out.push_str("throw ");
            write_expr(out, &throw.argument, indent);
            out.push(';');
        }
        Stmt::While(while_stmt) => {
            out.push_str("while (");
            write_expr(out, &while_stmt.test, indent);
            out.push_str(") ");
            write_stmt(out, &while_stmt.body, indent);
        }
        Stmt::Block(block) => write_block(out, block, indent),
        Stmt::Expr(expr_stmt) => {
            write_expr(out, &expr_stmt.expr, indent);
            out.push(';');
        }
        Stmt::Unknown(unknown) => out.push_str(&unknown.raw),
        Stmt::Empty(_) => out.push(';'),
        Stmt::Import(_) | Stmt::ExportNamed(_) | Stmt::ExportDefault(_) => {
            // Module-level statements never appear inside printed bodies.
        }
    }
}
