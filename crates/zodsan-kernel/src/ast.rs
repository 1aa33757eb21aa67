//! Abstract Syntax Tree for the schema-declaration subset of ECMAScript.
//!
//! The parser produces a `Program`; the validators walk it read-only and the
//! sanitizer/analyzer build edited copies. Every node carries a byte span
//! into the original source so diagnostics and the slice printer can point
//! back at real locations.

use chumsky::span::SimpleSpan;
use std::fmt;

/// Byte-range span used on every node.
pub type Span = SimpleSpan;

/// A parsed module: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A statement, at the top level or inside a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import { z } from 'zod';`
    Import(ImportDecl),
    /// `const xSchema = z.string();`
    VarDecl(VarDecl),
    /// `export const xSchema = ...;`
    ExportNamed(ExportNamed),
    /// `export default <expr>;`
    ExportDefault(ExportDefault),
    /// A bare expression statement.
    Expr(ExprStmt),
    /// `return <expr>?;`
    Return(ReturnStmt),
    /// `if (test) <stmt> else <stmt>?`
    If(IfStmt),
    /// `throw <expr>;`
    Throw(ThrowStmt),
    /// `while (test) <stmt>`
    While(WhileStmt),
    /// `{ ... }` used as a statement.
    Block(BlockStmt),
    /// Anything the grammar does not model, captured by balanced skipping so
    /// the sanitizer can report and remove it.
    Unknown(UnknownStmt),
    /// A stray `;`.
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(s) => s.span,
            Stmt::VarDecl(s) => s.span,
            Stmt::ExportNamed(s) => s.span,
            Stmt::ExportDefault(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::Unknown(s) => s.span,
            Stmt::Empty(span) => *span,
        }
    }

    /// ESTree-style kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Import(_) => "ImportDeclaration",
            Stmt::VarDecl(_) => "VariableDeclaration",
            Stmt::ExportNamed(_) => "ExportNamedDeclaration",
            Stmt::ExportDefault(_) => "ExportDefaultDeclaration",
            Stmt::Expr(_) => "ExpressionStatement",
            Stmt::Return(_) => "ReturnStatement",
            Stmt::If(_) => "IfStatement",
            Stmt::Throw(_) => "ThrowStatement",
            Stmt::While(_) => "WhileStatement",
            Stmt::Block(_) => "BlockStatement",
            Stmt::Unknown(s) => s.kind_name,
            Stmt::Empty(_) => "EmptyStatement",
        }
    }
}

/// `import <specifiers> from '<source>';`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    /// Cooked module source, e.g. `zod`.
    pub source: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import z from ...`
    Default { local: Ident },
    /// `import { z }` or `import { z as zz }`
    Named { imported: String, local: Ident },
    /// `import * as z from ...`
    Namespace { local: Ident },
}

impl ImportSpecifier {
    /// The name the specifier binds in module scope.
    pub fn local_name(&self) -> &str {
        match self {
            ImportSpecifier::Default { local }
            | ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Namespace { local } => &local.name,
        }
    }
}

/// Binding kind of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclKind::Const => write!(f, "const"),
            DeclKind::Let => write!(f, "let"),
            DeclKind::Var => write!(f, "var"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// One `name = init` inside a variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamed {
    pub decl: VarDecl,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDefault {
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub argument: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Expr,
    pub consequent: Box<Stmt>,
    pub alternate: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub argument: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// A statement the grammar does not model. `raw` is its exact source text,
/// filled after parsing so the printer could re-emit it if it ever survived
/// (it never does: unknown statements are always removed or rejected).
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownStmt {
    pub kind_name: &'static str,
    pub raw: String,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Member(MemberExpr),
    Call(CallExpr),
    Object(ObjectLit),
    Array(ArrayLit),
    Arrow(ArrowFn),
    Function(FnExpr),
    New(NewExpr),
    Await(AwaitExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Cond(CondExpr),
    Assign(AssignExpr),
    Lit(Lit),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Object(e) => e.span,
            Expr::Array(e) => e.span,
            Expr::Arrow(e) => e.span,
            Expr::Function(e) => e.span,
            Expr::New(e) => e.span,
            Expr::Await(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Cond(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::Lit(e) => e.span,
        }
    }

    /// ESTree-style kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident(_) => "Identifier",
            Expr::Member(_) => "MemberExpression",
            Expr::Call(_) => "CallExpression",
            Expr::Object(_) => "ObjectExpression",
            Expr::Array(_) => "ArrayExpression",
            Expr::Arrow(_) => "ArrowFunctionExpression",
            Expr::Function(_) => "FunctionExpression",
            Expr::New(_) => "NewExpression",
            Expr::Await(_) => "AwaitExpression",
            Expr::Unary(_) => "UnaryExpression",
            Expr::Binary(_) => "BinaryExpression",
            Expr::Cond(_) => "ConditionalExpression",
            Expr::Assign(_) => "AssignmentExpression",
            Expr::Lit(lit) => lit.kind_name(),
        }
    }

    /// The identifier at the far left of a member/call chain, if any.
    /// `z.object({...}).optional()` resolves to `z`.
    pub fn leftmost_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            Expr::Member(member) => member.object.leftmost_ident(),
            Expr::Call(call) => call.callee.leftmost_ident(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: MemberProp,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `.name`
    Ident(Ident),
    /// `[expr]`
    Computed(Box<Expr>),
}

impl MemberExpr {
    pub fn is_computed(&self) -> bool {
        matches!(self.property, MemberProp::Computed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<CallArg>,
    pub span: Span,
}

impl CallExpr {
    /// The called method's name: the property of a member callee, or the
    /// identifier itself for a direct call.
    pub fn method_name(&self) -> Option<&str> {
        match &*self.callee {
            Expr::Member(member) => match &member.property {
                MemberProp::Ident(ident) => Some(&ident.name),
                MemberProp::Computed(_) => None,
            },
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Expr(Expr),
    Spread(Expr, Span),
}

impl CallArg {
    pub fn span(&self) -> Span {
        match self {
            CallArg::Expr(expr) => expr.span(),
            CallArg::Spread(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLit {
    pub properties: Vec<ObjectProp>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    /// `key: value`, shorthand `key`, or computed `[key]: value`.
    Property {
        key: PropKey,
        value: Expr,
        shorthand: bool,
        span: Span,
    },
    /// `key(...) {...}`, possibly a getter or setter. `raw` is the exact
    /// source slice, filled after parsing (methods are rejected by the
    /// object validator, so this is only ever printed for diagnostics).
    Method { kind: MethodKind, raw: String, span: Span },
    /// `...expr`
    Spread { argument: Expr, span: Span },
}

impl ObjectProp {
    pub fn span(&self) -> Span {
        match self {
            ObjectProp::Property { span, .. }
            | ObjectProp::Method { span, .. }
            | ObjectProp::Spread { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Ident(Ident),
    /// String-literal key, with both the raw text and the cooked value.
    Str { raw: String, value: String, span: Span },
    Num { raw: String, span: Span },
    /// `[expr]` key.
    Computed { expr: Box<Expr>, span: Span },
}

impl PropKey {
    pub fn span(&self) -> Span {
        match self {
            PropKey::Ident(ident) => ident.span,
            PropKey::Str { span, .. } | PropKey::Num { span, .. } | PropKey::Computed { span, .. } => {
                *span
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLit {
    /// `None` entries are elisions (`[a, , b]`).
    pub elements: Vec<Option<ArrayElem>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElem {
    Expr(Expr),
    Spread(Expr, Span),
}

/// Body of an arrow function: a bare expression or a block.
#[derive(Debug, Clone, PartialEq)]
pub enum FnBody {
    Expr(Box<Expr>),
    Block(BlockStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFn {
    pub params: Vec<Ident>,
    pub body: FnBody,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnExpr {
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: BlockStmt,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwaitExpr {
    pub argument: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::TypeOf => write!(f, "typeof "),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub argument: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Nullish,
    StrictEq,
    StrictNotEq,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Nullish => "??",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondExpr {
    pub test: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternate: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub span: Span,
}

/// A literal value. Raw source text is kept for exact re-emission by the
/// expression printer.
#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
    pub kind: LitKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LitKind {
    Str { raw: String, value: String },
    Num { raw: String },
    BigInt { raw: String },
    Bool(bool),
    Null,
    Regex { pattern: String, flags: String },
    Template { raw: String, has_exprs: bool },
}

impl Lit {
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            LitKind::Str { .. } => "StringLiteral",
            LitKind::Num { .. } => "NumericLiteral",
            LitKind::BigInt { .. } => "BigIntLiteral",
            LitKind::Bool(_) => "BooleanLiteral",
            LitKind::Null => "NullLiteral",
            LitKind::Regex { .. } => "RegExpLiteral",
            LitKind::Template { .. } => "TemplateLiteral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(Ident { name: name.into(), span: (0..name.len()).into() })
    }

    #[test]
    fn leftmost_ident_walks_member_and_call_chains() {
        // z.object(...).optional()
        let chain = Expr::Call(CallExpr {
            callee: Box::new(Expr::Member(MemberExpr {
                object: Box::new(Expr::Call(CallExpr {
                    callee: Box::new(Expr::Member(MemberExpr {
                        object: Box::new(ident("z")),
                        property: MemberProp::Ident(Ident { name: "object".into(), span: (2..8).into() }),
                        span: (0..8).into(),
                    })),
                    args: vec![],
                    span: (0..10).into(),
                })),
                property: MemberProp::Ident(Ident { name: "optional".into(), span: (11..19).into() }),
                span: (0..19).into(),
            })),
            args: vec![],
            span: (0..21).into(),
        });

        assert_eq!(chain.leftmost_ident().map(|i| i.name.as_str()), Some("z"));
        assert_eq!(chain.kind_name(), "CallExpression");
    }

    #[test]
    fn method_name_reads_member_property() {
        let call = CallExpr {
            callee: Box::new(Expr::Member(MemberExpr {
                object: Box::new(ident("z")),
                property: MemberProp::Ident(Ident { name: "string".into(), span: (2..8).into() }),
                span: (0..8).into(),
            })),
            args: vec![],
            span: (0..10).into(),
        };
        assert_eq!(call.method_name(), Some("string"));
    }

    #[test]
    fn literal_kind_names_are_estree_flavored() {
        let lit = Lit {
            kind: LitKind::Regex { pattern: "a+".into(), flags: String::new() },
            span: (0..4).into(),
        };
        assert_eq!(lit.kind_name(), "RegExpLiteral");
    }
}
