//! Parser for schema-declaration source.
//!
//! Transforms the token stream from the lexer into a spanned AST. Uses
//! chumsky parser combinators; statements the grammar does not model are
//! captured as `Stmt::Unknown` via balanced-delimiter skipping so one bad
//! statement never takes down the whole parse.

use chumsky::{input::ValueInput, prelude::*};

use crate::ast::{
    ArrayElem, ArrayLit, ArrowFn, AssignExpr, AwaitExpr, BinaryExpr, BinaryOp, BlockStmt, CallArg,
    CallExpr, CondExpr, DeclKind, Declarator, ExportDefault, ExportNamed, Expr, ExprStmt, FnBody,
    FnExpr, Ident, IfStmt, ImportDecl, ImportSpecifier, Lit, LitKind, MemberExpr, MemberProp,
    MethodKind, NewExpr, ObjectLit, ObjectProp, Program, PropKey, ReturnStmt, Stmt, ThrowStmt,
    UnaryExpr, UnaryOp, UnknownStmt, VarDecl, WhileStmt,
};
use crate::lexer::{self, Comment, Token};

/// Span type used throughout the parser.
pub type Span = crate::ast::Span;

/// Parse error with location and context.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {:?}", self.message, self.span)
    }
}

impl std::error::Error for ParseError {}

/// Parser output: the AST plus comment trivia for the printer.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub program: Program,
    pub comments: Vec<Comment>,
}

/// Parse schema source into a [`ParsedModule`].
pub fn parse(source: &str) -> Result<ParsedModule, Vec<ParseError>> {
    let stream = lexer::tokenize(source).map_err(|e| {
        vec![ParseError {
            span: e.span,
            message: format!("lexer error: {}", e),
        }]
    })?;

    let comments = stream.comments;
    let tokens: Vec<(Token, Span)> = stream.tokens;

    // End-of-input span.
    let end_span: Span = (source.len()..source.len()).into();

    let parser = program_parser();
    let result = parser.parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)));

    result
        .into_result()
        .map(|mut program| {
            fill_unknown_raw_program(&mut program, source);
            ParsedModule { program, comments }
        })
        .map_err(|errs| {
            errs.into_iter()
                .map(|e| ParseError {
                    span: *e.span(),
                    message: e.to_string(),
                })
                .collect()
        })
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level program parser.
fn program_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, Span>>>
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    statement_parser()
        .repeated()
        .collect::<Vec<_>>()
        .map(|statements| Program { statements })
}

/// Statement parser - dispatches based on leading token, with a
/// balanced-skip fallback for statement kinds the grammar does not model.
fn statement_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(|stmt| {
        let expr = expr_parser(stmt.clone());
        let semi = just(Token::Semi).or_not();

        let var_decl = var_decl_parser(expr.clone());

        // `export default <expr>;` or `export const ... ;`
        enum ExportInner {
            Default(Expr),
            Var(VarDecl),
        }
        let export_stmt = just(Token::Export)
            .ignore_then(choice((
                just(Token::Default)
                    .ignore_then(expr.clone())
                    .then_ignore(semi.clone())
                    .map(ExportInner::Default),
                var_decl.clone().then_ignore(semi.clone()).map(ExportInner::Var),
            )))
            .map_with(|inner, e| match inner {
                ExportInner::Default(ex) => Stmt::ExportDefault(ExportDefault {
                    expr: Box::new(ex),
                    span: e.span(),
                }),
                ExportInner::Var(decl) => {
                    Stmt::ExportNamed(ExportNamed { decl, span: e.span() })
                }
            })
            .labelled("export declaration")
            .boxed();

        let var_decl_stmt = var_decl
            .clone()
            .then_ignore(semi.clone())
            .map_with(|mut decl, e| {
                decl.span = e.span();
                Stmt::VarDecl(decl)
            })
            .boxed();

        let return_stmt = just(Token::Return)
            .ignore_then(expr.clone().or_not())
            .then_ignore(semi.clone())
            .map_with(|argument, e| Stmt::Return(ReturnStmt { argument, span: e.span() }))
            .boxed();

        let throw_stmt = just(Token::Throw)
            .ignore_then(expr.clone())
            .then_ignore(semi.clone())
            .map_with(|argument, e| Stmt::Throw(ThrowStmt { argument, span: e.span() }))
            .boxed();

        let paren_test = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let if_stmt = just(Token::If)
            .ignore_then(paren_test.clone())
            .then(stmt.clone())
            .then(just(Token::Else).ignore_then(stmt.clone()).or_not())
            .map_with(|((test, consequent), alternate), e| {
                Stmt::If(IfStmt {
                    test,
                    consequent: Box::new(consequent),
                    alternate: alternate.map(Box::new),
                    span: e.span(),
                })
            })
            .boxed();

        let while_stmt = just(Token::While)
            .ignore_then(paren_test)
            .then(stmt.clone())
            .map_with(|(test, body), e| {
                Stmt::While(WhileStmt { test, body: Box::new(body), span: e.span() })
            })
            .boxed();

        let block_stmt = stmt
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|statements, e| Stmt::Block(BlockStmt { statements, span: e.span() }))
            .boxed();

        let expr_stmt = expr
            .clone()
            .then_ignore(semi)
            .map_with(|ex, e| Stmt::Expr(ExprStmt { expr: ex, span: e.span() }))
            .boxed();

        choice((
            just(Token::Semi).map_with(|_, e| Stmt::Empty(e.span())),
            import_parser(),
            export_stmt,
            var_decl_stmt,
            return_stmt,
            if_stmt,
            throw_stmt,
            while_stmt,
            structured_unknown_parser(),
            block_stmt,
            expr_stmt,
            fallback_unknown_parser(),
        ))
        .boxed()
    })
}

/// `const a = <expr>, b = <expr>` (binding kind recorded, semicolon handled
/// by the caller).
fn var_decl_parser<'tokens, I, E>(
    expr: E,
) -> impl Parser<'tokens, I, VarDecl, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
    E: Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone + 'tokens,
{
    let kind = select! {
        Token::Const => DeclKind::Const,
        Token::Let => DeclKind::Let,
        Token::Var => DeclKind::Var,
    };

    let declarator = ident_parser()
        .then(just(Token::Eq).ignore_then(expr).or_not())
        .map_with(|(name, init), e| Declarator { name, init, span: e.span() });

    kind.then(
        declarator
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>(),
    )
    .map_with(|(kind, declarators), e| VarDecl { kind, declarators, span: e.span() })
    .labelled("variable declaration")
    .boxed()
}

/// `import <clause> from '<source>';` or a bare `import '<source>';`
fn import_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let source = select! {
        Token::Str(raw) => lexer::cooked_string(&raw),
    };

    let named_one = name_parser()
        .then(just(Token::As).ignore_then(ident_parser()).or_not())
        .map(|(imported, renamed)| match renamed {
            Some(local) => ImportSpecifier::Named { imported: imported.name, local },
            None => ImportSpecifier::Named { imported: imported.name.clone(), local: imported },
        });

    let named_list = named_one
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBrace), just(Token::RBrace));

    let namespace = just(Token::Star)
        .ignore_then(just(Token::As))
        .ignore_then(ident_parser())
        .map(|local| vec![ImportSpecifier::Namespace { local }]);

    let default_clause = ident_parser()
        .then(just(Token::Comma).ignore_then(named_list.clone()).or_not())
        .map(|(local, extra)| {
            let mut specifiers = vec![ImportSpecifier::Default { local }];
            specifiers.extend(extra.unwrap_or_default());
            specifiers
        });

    let clause = choice((namespace, named_list, default_clause));

    just(Token::Import)
        .ignore_then(choice((
            clause.then_ignore(just(Token::From)).then(source.clone()),
            source.map(|src| (Vec::new(), src)),
        )))
        .then_ignore(just(Token::Semi).or_not())
        .map_with(|(specifiers, source), e| {
            Stmt::Import(ImportDecl { specifiers, source, span: e.span() })
        })
        .labelled("import declaration")
        .boxed()
}

/// Statement kinds recognized by their leading keyword and skipped with
/// balanced delimiters: function/class declarations, `for`, `try`.
fn structured_unknown_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let parens = balanced_group(Token::LParen, Token::RParen);
    let braces = balanced_group(Token::LBrace, Token::RBrace);

    let function_like = just(Token::Async)
        .or_not()
        .then(just(Token::Function))
        .then(just(Token::Star).or_not())
        .then(ident_parser().or_not())
        .then(parens.clone())
        .then(braces.clone())
        .map_with(|_, e| unknown("FunctionDeclaration", e.span()))
        .boxed();

    let non_brace = any()
        .filter(|t: &Token| !matches!(t, Token::LBrace | Token::RBrace))
        .ignored();

    let class_like = just(Token::Class)
        .then(non_brace.repeated())
        .then(braces.clone())
        .map_with(|_, e| unknown("ClassDeclaration", e.span()))
        .boxed();

    let tail_unit = choice((
        balanced_group(Token::LParen, Token::RParen),
        balanced_group(Token::LBracket, Token::RBracket),
        any()
            .filter(|t: &Token| {
                !matches!(
                    t,
                    Token::Semi
                        | Token::LBrace
                        | Token::RBrace
                        | Token::LParen
                        | Token::RParen
                        | Token::LBracket
                        | Token::RBracket
                )
            })
            .ignored(),
    ));

    let for_like = just(Token::For)
        .then(parens.clone())
        .then(choice((
            braces.clone(),
            tail_unit.repeated().then(just(Token::Semi).or_not()).ignored(),
        )))
        .map_with(|_, e| unknown("ForStatement", e.span()))
        .boxed();

    let try_like = just(Token::Try)
        .then(braces.clone())
        .then(
            just(Token::Catch)
                .then(parens.or_not())
                .then(braces.clone())
                .or_not(),
        )
        .then(just(Token::Finally).then(braces).or_not())
        .map_with(|_, e| unknown("TryStatement", e.span()))
        .boxed();

    choice((function_like, class_like, for_like, try_like)).boxed()
}

/// Last-resort statement: consume balanced token groups until a top-level
/// `;` (or something only a new statement could start).
fn fallback_unknown_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let first = any().filter(|t: &Token| {
        !matches!(
            t,
            Token::Semi | Token::RParen | Token::RBrace | Token::RBracket
        )
    });

    let unit = choice((
        balanced_group(Token::LParen, Token::RParen),
        balanced_group(Token::LBrace, Token::RBrace),
        balanced_group(Token::LBracket, Token::RBracket),
        any()
            .filter(|t: &Token| {
                !matches!(
                    t,
                    Token::Semi
                        | Token::LParen
                        | Token::RParen
                        | Token::LBrace
                        | Token::RBrace
                        | Token::LBracket
                        | Token::RBracket
                )
            })
            .ignored(),
    ));

    first
        .then(unit.repeated())
        .then(just(Token::Semi).or_not())
        .map_with(|((first, _), _), e| {
            Stmt::Unknown(UnknownStmt {
                kind_name: guess_kind(&first),
                raw: String::new(),
                span: e.span(),
            })
        })
        .labelled("statement")
        .boxed()
}

fn unknown(kind_name: &'static str, span: Span) -> Stmt {
    Stmt::Unknown(UnknownStmt { kind_name, raw: String::new(), span })
}

fn guess_kind(first: &Token) -> &'static str {
    match first {
        Token::Const | Token::Let | Token::Var => "VariableDeclaration",
        Token::Import => "ImportDeclaration",
        Token::Export => "ExportNamedDeclaration",
        Token::Function | Token::Async => "FunctionDeclaration",
        Token::Class => "ClassDeclaration",
        Token::For => "ForStatement",
        Token::While => "WhileStatement",
        Token::If => "IfStatement",
        Token::Return => "ReturnStatement",
        Token::Throw => "ThrowStatement",
        Token::Try => "TryStatement",
        _ => "ExpressionStatement",
    }
}

/// Consume a balanced `open ... close` group, ignoring its contents.
fn balanced_group<'tokens, I>(
    open: Token,
    close: Token,
) -> impl Parser<'tokens, I, (), extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    recursive(move |unit| {
        let inner = choice((
            unit.clone()
                .repeated()
                .delimited_by(just(Token::LParen), just(Token::RParen))
                .ignored(),
            unit.clone()
                .repeated()
                .delimited_by(just(Token::LBrace), just(Token::RBrace))
                .ignored(),
            unit.repeated()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .ignored(),
            any()
                .filter(|t: &Token| {
                    !matches!(
                        t,
                        Token::LParen
                            | Token::RParen
                            | Token::LBrace
                            | Token::RBrace
                            | Token::LBracket
                            | Token::RBracket
                    )
                })
                .ignored(),
        ));
        inner
    })
    .repeated()
    .delimited_by(just(open), just(close))
    .ignored()
    .boxed()
}

/// A plain identifier.
fn ident_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Ident, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(name) = e => Ident { name, span: e.span() },
    }
    .labelled("identifier")
}

/// An identifier or a keyword usable as a member/property name
/// (`.default(...)`, `.catch(...)`, `z.null()` are all legal schema code).
fn name_parser<'tokens, I>(
) -> impl Parser<'tokens, I, Ident, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    select! {
        Token::Ident(name) = e => Ident { name, span: e.span() },
        Token::Default = e => Ident { name: "default".into(), span: e.span() },
        Token::Catch = e => Ident { name: "catch".into(), span: e.span() },
        Token::Null = e => Ident { name: "null".into(), span: e.span() },
        Token::Function = e => Ident { name: "function".into(), span: e.span() },
        Token::From = e => Ident { name: "from".into(), span: e.span() },
        Token::As = e => Ident { name: "as".into(), span: e.span() },
        Token::New = e => Ident { name: "new".into(), span: e.span() },
        Token::If = e => Ident { name: "if".into(), span: e.span() },
        Token::While = e => Ident { name: "while".into(), span: e.span() },
        Token::For = e => Ident { name: "for".into(), span: e.span() },
    }
    .labelled("name")
}

/// Expression parser. Takes the statement parser for arrow/function bodies.
fn expr_parser<'tokens, I, S>(
    stmt: S,
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
    S: Parser<'tokens, I, Stmt, extra::Err<Rich<'tokens, Token, Span>>> + Clone + 'tokens,
{
    recursive(|expr| {
        let block = stmt
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|statements, e| BlockStmt { statements, span: e.span() })
            .boxed();

        let lit = select! {
            Token::Num(raw) = e => Lit { kind: LitKind::Num { raw }, span: e.span() },
            Token::BigInt(raw) = e => Lit { kind: LitKind::BigInt { raw }, span: e.span() },
            Token::Str(raw) = e => Lit {
                kind: LitKind::Str { value: lexer::cooked_string(&raw), raw },
                span: e.span(),
            },
            Token::True = e => Lit { kind: LitKind::Bool(true), span: e.span() },
            Token::False = e => Lit { kind: LitKind::Bool(false), span: e.span() },
            Token::Null = e => Lit { kind: LitKind::Null, span: e.span() },
            Token::Regex { pattern, flags } = e => Lit {
                kind: LitKind::Regex { pattern, flags },
                span: e.span(),
            },
            Token::Template { raw, has_exprs } = e => Lit {
                kind: LitKind::Template { raw, has_exprs },
                span: e.span(),
            },
        }
        .labelled("literal");

        // --- Object literals ---

        let prop_key = choice((
            name_parser().map(PropKey::Ident),
            select! {
                Token::Str(raw) = e => PropKey::Str {
                    value: lexer::cooked_string(&raw),
                    raw,
                    span: e.span(),
                },
                Token::Num(raw) = e => PropKey::Num { raw, span: e.span() },
            },
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map_with(|ex, e| PropKey::Computed { expr: Box::new(ex), span: e.span() }),
        ))
        .boxed();

        let raw_params = balanced_group(Token::LParen, Token::RParen);
        let raw_body = balanced_group(Token::LBrace, Token::RBrace);

        let accessor = select! { Token::Ident(name) => name }
            .try_map(|name, span| match name.as_str() {
                "get" => Ok(MethodKind::Get),
                "set" => Ok(MethodKind::Set),
                _ => Err(Rich::custom(span, "expected accessor keyword")),
            })
            .then(prop_key.clone())
            .then(raw_params.clone())
            .then(raw_body.clone())
            .map_with(|(((kind, _), _), _), e| ObjectProp::Method {
                kind,
                raw: String::new(),
                span: e.span(),
            })
            .boxed();

        let method = prop_key
            .clone()
            .then(raw_params)
            .then(raw_body)
            .map_with(|_, e| ObjectProp::Method {
                kind: MethodKind::Method,
                raw: String::new(),
                span: e.span(),
            })
            .boxed();

        let pair = prop_key
            .clone()
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .map_with(|(key, value), e| ObjectProp::Property {
                key,
                value,
                shorthand: false,
                span: e.span(),
            })
            .boxed();

        let shorthand = ident_parser().map(|id| ObjectProp::Property {
            key: PropKey::Ident(id.clone()),
            value: Expr::Ident(id.clone()),
            shorthand: true,
            span: id.span,
        });

        let spread_prop = just(Token::DotDotDot)
            .ignore_then(expr.clone())
            .map_with(|argument, e| ObjectProp::Spread { argument, span: e.span() });

        let object = choice((spread_prop, accessor, method, pair, shorthand))
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|properties, e| Expr::Object(ObjectLit { properties, span: e.span() }))
            .labelled("object literal")
            .boxed();

        // --- Array literals ---

        let array_elem = choice((
            just(Token::DotDotDot)
                .ignore_then(expr.clone())
                .map_with(|ex, e| ArrayElem::Spread(ex, e.span())),
            expr.clone().map(ArrayElem::Expr),
        ));

        let array = array_elem
            .or_not()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with(|elements, e| Expr::Array(ArrayLit { elements, span: e.span() }))
            .labelled("array literal")
            .boxed();

        // --- Functions ---

        let paren_params = ident_parser()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let arrow_params = choice((ident_parser().map(|id| vec![id]), paren_params.clone()));

        let arrow_body = choice((
            block.clone().map(FnBody::Block),
            expr.clone().map(|ex| FnBody::Expr(Box::new(ex))),
        ));

        let arrow = just(Token::Async)
            .or_not()
            .then(arrow_params)
            .then_ignore(just(Token::Arrow))
            .then(arrow_body)
            .map_with(|((is_async, params), body), e| {
                Expr::Arrow(ArrowFn {
                    params,
                    body,
                    is_async: is_async.is_some(),
                    span: e.span(),
                })
            })
            .labelled("arrow function")
            .boxed();

        let function = just(Token::Async)
            .or_not()
            .then_ignore(just(Token::Function))
            .then(just(Token::Star).or_not())
            .then(ident_parser().or_not())
            .then(paren_params)
            .then(block)
            .map_with(|((((is_async, star), name), params), body), e| {
                Expr::Function(FnExpr {
                    name,
                    params,
                    body,
                    is_async: is_async.is_some(),
                    is_generator: star.is_some(),
                    span: e.span(),
                })
            })
            .labelled("function expression")
            .boxed();

        // --- Atoms and postfix chains ---

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((
            arrow,
            function,
            object,
            array,
            lit.map(Expr::Lit),
            ident_parser().map(Expr::Ident),
            paren,
        ))
        .labelled("expression")
        .boxed();

        let call_args = choice((
            just(Token::DotDotDot)
                .ignore_then(expr.clone())
                .map_with(|ex, e| CallArg::Spread(ex, e.span())),
            expr.clone().map(CallArg::Expr),
        ))
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

        enum Postfix {
            Member(Ident),
            Computed(Expr),
            Call(Vec<CallArg>),
        }

        let postfix = choice((
            just(Token::Dot).ignore_then(name_parser()).map(Postfix::Member),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Postfix::Computed),
            call_args.map(Postfix::Call),
        ));

        let postfix_expr = atom
            .foldl_with(postfix.repeated(), |object, post, e| match post {
                Postfix::Member(property) => Expr::Member(MemberExpr {
                    object: Box::new(object),
                    property: MemberProp::Ident(property),
                    span: e.span(),
                }),
                Postfix::Computed(index) => Expr::Member(MemberExpr {
                    object: Box::new(object),
                    property: MemberProp::Computed(Box::new(index)),
                    span: e.span(),
                }),
                Postfix::Call(args) => Expr::Call(CallExpr {
                    callee: Box::new(object),
                    args,
                    span: e.span(),
                }),
            })
            .boxed();

        // --- Prefix operators ---

        #[derive(Clone, Copy)]
        enum Prefix {
            Op(UnaryOp),
            New,
            Await,
        }

        let prefix = choice((
            just(Token::Bang).to(Prefix::Op(UnaryOp::Not)),
            just(Token::Minus).to(Prefix::Op(UnaryOp::Neg)),
            just(Token::Plus).to(Prefix::Op(UnaryOp::Plus)),
            just(Token::TypeOf).to(Prefix::Op(UnaryOp::TypeOf)),
            just(Token::New).to(Prefix::New),
            just(Token::Await).to(Prefix::Await),
        ));

        let unary = prefix
            .repeated()
            .foldr_with(postfix_expr, |pre, argument, e| match pre {
                Prefix::Op(op) => Expr::Unary(UnaryExpr {
                    op,
                    argument: Box::new(argument),
                    span: e.span(),
                }),
                Prefix::New => Expr::New(NewExpr { expr: Box::new(argument), span: e.span() }),
                Prefix::Await => Expr::Await(AwaitExpr {
                    argument: Box::new(argument),
                    span: e.span(),
                }),
            })
            .boxed();

        // --- Binary operator tiers ---

        let product_op = select! {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Rem,
        };
        let product = fold_binary(unary, product_op);

        let sum_op = select! {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
        };
        let sum = fold_binary(product, sum_op);

        let compare_op = select! {
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
        };
        let compare = fold_binary(sum, compare_op);

        let equality_op = select! {
            Token::EqEqEq => BinaryOp::StrictEq,
            Token::NotEqEq => BinaryOp::StrictNotEq,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
        };
        let equality = fold_binary(compare, equality_op);

        let and_op = select! { Token::AndAnd => BinaryOp::And };
        let logical_and = fold_binary(equality, and_op);

        let or_op = select! {
            Token::OrOr => BinaryOp::Or,
            Token::QuestionQuestion => BinaryOp::Nullish,
        };
        let logical_or = fold_binary(logical_and, or_op);

        // --- Conditional and assignment ---

        let conditional = logical_or
            .clone()
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr.clone())
                    .or_not(),
            )
            .map_with(|(test, tail), e| match tail {
                Some((consequent, alternate)) => Expr::Cond(CondExpr {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                    span: e.span(),
                }),
                None => test,
            })
            .boxed();

        conditional
            .clone()
            .then(just(Token::Eq).ignore_then(expr.clone()).or_not())
            .map_with(|(target, value), e| match value {
                Some(value) => Expr::Assign(AssignExpr {
                    target: Box::new(target),
                    value: Box::new(value),
                    span: e.span(),
                }),
                None => target,
            })
            .boxed()
    })
}

/// One left-associative binary-operator tier.
fn fold_binary<'tokens, I, P, O>(
    operand: P,
    op: O,
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
    P: Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token, Span>>> + Clone + 'tokens,
    O: Parser<'tokens, I, BinaryOp, extra::Err<Rich<'tokens, Token, Span>>> + Clone + 'tokens,
{
    operand
        .clone()
        .foldl_with(op.then(operand).repeated(), |left, (op, right), e| {
            Expr::Binary(BinaryExpr {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span: e.span(),
            })
        })
        .boxed()
}

// ═══════════════════════════════════════════════════════════════════════════
// Post-parse fixups
// ═══════════════════════════════════════════════════════════════════════════

/// Fill `UnknownStmt::raw` with the exact source slice, so unknown
/// statements stay printable anywhere they might be carried.
fn fill_unknown_raw_program(program: &mut Program, source: &str) {
    for stmt in &mut program.statements {
        fill_unknown_raw_stmt(stmt, source);
    }
}

fn fill_unknown_raw_stmt(stmt: &mut Stmt, source: &str) {
    match stmt {
        Stmt::Unknown(unknown) => {
            let start = unknown.span.start.min(source.len());
            let end = unknown.span.end.min(source.len());
            unknown.raw = source[start..end].to_string();
        }
        Stmt::If(if_stmt) => {
            fill_unknown_raw_expr(&mut if_stmt.test, source);
            fill_unknown_raw_stmt(&mut if_stmt.consequent, source);
            if let Some(alt) = &mut if_stmt.alternate {
                fill_unknown_raw_stmt(alt, source);
            }
        }
        Stmt::While(while_stmt) => {
            fill_unknown_raw_expr(&mut while_stmt.test, source);
            fill_unknown_raw_stmt(&mut while_stmt.body, source);
        }
        Stmt::Block(block) => {
            for inner in &mut block.statements {
                fill_unknown_raw_stmt(inner, source);
            }
        }
        Stmt::Return(ret) => {
            if let Some(arg) = &mut ret.argument {
                fill_unknown_raw_expr(arg, source);
            }
        }
        Stmt::Throw(throw) => fill_unknown_raw_expr(&mut throw.argument, source),
        Stmt::Expr(expr_stmt) => fill_unknown_raw_expr(&mut expr_stmt.expr, source),
        Stmt::VarDecl(decl) => {
            for declarator in &mut decl.declarators {
                if let Some(init) = &mut declarator.init {
                    fill_unknown_raw_expr(init, source);
                }
            }
        }
        Stmt::ExportNamed(export) => {
            for declarator in &mut export.decl.declarators {
                if let Some(init) = &mut declarator.init {
                    fill_unknown_raw_expr(init, source);
                }
            }
        }
        Stmt::ExportDefault(export) => fill_unknown_raw_expr(&mut export.expr, source),
        Stmt::Import(_) | Stmt::Empty(_) => {}
    }
}

fn fill_unknown_raw_expr(expr: &mut Expr, source: &str) {
    match expr {
        Expr::Member(member) => {
            fill_unknown_raw_expr(&mut member.object, source);
            if let MemberProp::Computed(inner) = &mut member.property {
                fill_unknown_raw_expr(inner, source);
            }
        }
        Expr::Call(call) => {
            fill_unknown_raw_expr(&mut call.callee, source);
            for arg in &mut call.args {
                match arg {
                    CallArg::Expr(inner) | CallArg::Spread(inner, _) => {
                        fill_unknown_raw_expr(inner, source)
                    }
                }
            }
        }
        Expr::Object(object) => {
            for prop in &mut object.properties {
                match prop {
                    ObjectProp::Property { key, value, .. } => {
                        if let PropKey::Computed { expr: inner, .. } = key {
                            fill_unknown_raw_expr(inner, source);
                        }
                        fill_unknown_raw_expr(value, source);
                    }
                    ObjectProp::Spread { argument, .. } => {
                        fill_unknown_raw_expr(argument, source)
                    }
                    ObjectProp::Method { raw, span, .. } => {
                        let start = span.start.min(source.len());
                        let end = span.end.min(source.len());
                        *raw = source[start..end].to_string();
                    }
                }
            }
        }
        Expr::Array(array) => {
            for element in array.elements.iter_mut().flatten() {
                match element {
                    ArrayElem::Expr(inner) | ArrayElem::Spread(inner, _) => {
                        fill_unknown_raw_expr(inner, source)
                    }
                }
            }
        }
        Expr::Arrow(arrow) => match &mut arrow.body {
            FnBody::Expr(inner) => fill_unknown_raw_expr(inner, source),
            FnBody::Block(block) => {
                for stmt in &mut block.statements {
                    fill_unknown_raw_stmt(stmt, source);
                }
            }
        },
        Expr::Function(function) => {
            for stmt in &mut function.body.statements {
                fill_unknown_raw_stmt(stmt, source);
            }
        }
        Expr::New(new) => fill_unknown_raw_expr(&mut new.expr, source),
        Expr::Await(awaited) => fill_unknown_raw_expr(&mut awaited.argument, source),
        Expr::Unary(unary) => fill_unknown_raw_expr(&mut unary.argument, source),
        Expr::Binary(binary) => {
            fill_unknown_raw_expr(&mut binary.left, source);
            fill_unknown_raw_expr(&mut binary.right, source);
        }
        Expr::Cond(cond) => {
            fill_unknown_raw_expr(&mut cond.test, source);
            fill_unknown_raw_expr(&mut cond.consequent, source);
            fill_unknown_raw_expr(&mut cond.alternate, source);
        }
        Expr::Assign(assign) => {
            fill_unknown_raw_expr(&mut assign.target, source);
            fill_unknown_raw_expr(&mut assign.value, source);
        }
        Expr::Ident(_) | Expr::Lit(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        parse(source).expect("should parse").program
    }

    fn first_stmt(source: &str) -> Stmt {
        parse_ok(source).statements.into_iter().next().expect("one statement")
    }

    #[test]
    fn parses_zod_import() {
        let stmt = first_stmt("import { z } from 'zod';");
        match stmt {
            Stmt::Import(import) => {
                assert_eq!(import.source, "zod");
                assert_eq!(import.specifiers.len(), 1);
                assert_eq!(import.specifiers[0].local_name(), "z");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn parses_renamed_and_default_imports() {
        let stmt = first_stmt("import z, { ZodError as ZE } from 'zod';");
        match stmt {
            Stmt::Import(import) => {
                assert_eq!(import.specifiers.len(), 2);
                assert_eq!(import.specifiers[0].local_name(), "z");
                assert_eq!(import.specifiers[1].local_name(), "ZE");
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn parses_const_schema_chain() {
        let stmt = first_stmt("const userSchema = z.object({ name: z.string() }).strict();");
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        assert_eq!(decl.kind, DeclKind::Const);
        assert_eq!(decl.declarators.len(), 1);
        assert_eq!(decl.declarators[0].name.name, "userSchema");
        let init = decl.declarators[0].init.as_ref().expect("initializer");
        assert_eq!(init.kind_name(), "CallExpression");
        assert_eq!(init.leftmost_ident().map(|i| i.name.as_str()), Some("z"));
    }

    #[test]
    fn parses_export_const() {
        let stmt = first_stmt("export const aSchema = z.string();");
        let Stmt::ExportNamed(export) = stmt else {
            panic!("expected export");
        };
        assert_eq!(export.decl.declarators[0].name.name, "aSchema");
        // Span covers the whole statement including the `export` keyword.
        assert_eq!(export.span.start, 0);
    }

    #[test]
    fn parses_export_default() {
        let stmt = first_stmt("export default z.string();");
        assert!(matches!(stmt, Stmt::ExportDefault(_)));
    }

    #[test]
    fn method_names_may_be_keywords() {
        let stmt = first_stmt(r#"const aSchema = z.string().default("x").catch("y");"#);
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        let init = decl.declarators[0].init.as_ref().expect("initializer");
        let Expr::Call(call) = init else { panic!("expected call") };
        assert_eq!(call.method_name(), Some("catch"));
    }

    #[test]
    fn parses_arrow_refinement() {
        let stmt = first_stmt("const vSchema = z.string().refine(v => v.length > 3);");
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Call(call)) = &decl.declarators[0].init else {
            panic!("expected call");
        };
        let CallArg::Expr(Expr::Arrow(arrow)) = &call.args[0] else {
            panic!("expected arrow argument");
        };
        assert_eq!(arrow.params.len(), 1);
        assert!(!arrow.is_async);
        assert!(matches!(arrow.body, FnBody::Expr(_)));
    }

    #[test]
    fn parses_async_arrow_and_block_body() {
        let stmt = first_stmt("const fSchema = z.string().refine(async (v) => { return v; });");
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Call(call)) = &decl.declarators[0].init else {
            panic!("expected call");
        };
        let CallArg::Expr(Expr::Arrow(arrow)) = &call.args[0] else {
            panic!("expected arrow argument");
        };
        assert!(arrow.is_async);
        assert!(matches!(arrow.body, FnBody::Block(_)));
    }

    #[test]
    fn computed_member_is_flagged() {
        let stmt = first_stmt(r#"const xSchema = z["string"]();"#);
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Call(call)) = &decl.declarators[0].init else {
            panic!("expected call");
        };
        let Expr::Member(member) = &*call.callee else {
            panic!("expected member callee");
        };
        assert!(member.is_computed());
    }

    #[test]
    fn object_with_computed_spread_and_method() {
        let program = parse_ok(
            r#"const o = { ["k"]: 1, ...rest, m() { return 1; }, get g() { return 2; } };"#,
        );
        let Stmt::VarDecl(decl) = &program.statements[0] else {
            panic!("expected var decl");
        };
        let Some(Expr::Object(object)) = &decl.declarators[0].init else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 4);
        assert!(matches!(
            &object.properties[0],
            ObjectProp::Property { key: PropKey::Computed { .. }, .. }
        ));
        assert!(matches!(&object.properties[1], ObjectProp::Spread { .. }));
        assert!(matches!(
            &object.properties[2],
            ObjectProp::Method { kind: MethodKind::Method, .. }
        ));
        assert!(matches!(
            &object.properties[3],
            ObjectProp::Method { kind: MethodKind::Get, .. }
        ));
    }

    #[test]
    fn function_declaration_is_unknown_statement() {
        let stmt = first_stmt("function helper() { return 1; }");
        let Stmt::Unknown(unknown) = stmt else {
            panic!("expected unknown statement");
        };
        assert_eq!(unknown.kind_name, "FunctionDeclaration");
        assert_eq!(unknown.raw, "function helper() { return 1; }");
    }

    #[test]
    fn class_and_for_are_unknown_statements() {
        let program = parse_ok("class A { constructor() {} }\nfor (let i = 0; i < 2; i = i + 1) { i; }");
        assert_eq!(program.statements[0].kind_name(), "ClassDeclaration");
        assert_eq!(program.statements[1].kind_name(), "ForStatement");
    }

    #[test]
    fn unknown_statement_does_not_poison_neighbors() {
        let program = parse_ok("class A {}\nconst bSchema = z.string();");
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[1], Stmt::VarDecl(_)));
    }

    #[test]
    fn parses_regex_and_template_literals() {
        let stmt = first_stmt("const rSchema = z.string().regex(/^(a+)+$/i);");
        let Stmt::VarDecl(decl) = stmt else {
            panic!("expected var decl");
        };
        let Some(Expr::Call(call)) = &decl.declarators[0].init else {
            panic!("expected call");
        };
        let CallArg::Expr(Expr::Lit(lit)) = &call.args[0] else {
            panic!("expected literal argument");
        };
        assert!(matches!(&lit.kind, LitKind::Regex { pattern, .. } if pattern == "^(a+)+$"));
    }

    #[test]
    fn malformed_declaration_degrades_to_unknown() {
        // `const = ;` is not a declaration the grammar models; the fallback
        // captures it so surrounding statements survive.
        let stmt = first_stmt("const = ;");
        let Stmt::Unknown(unknown) = stmt else {
            panic!("expected unknown statement");
        };
        assert_eq!(unknown.kind_name, "VariableDeclaration");
    }

    #[test]
    fn spans_point_into_source() {
        let source = "const aSchema = z.string();";
        let stmt = first_stmt(source);
        let span = stmt.span();
        assert_eq!(&source[span.start..span.end], source);
    }
}
