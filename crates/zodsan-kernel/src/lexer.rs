//! Tokenizer for the ECMAScript subset that schema declarations use.
//!
//! A `logos`-derived raw scanner does the bulk of the work; [`tokenize`]
//! wraps it to resolve the two context-sensitive pieces of JS lexing:
//!
//! - `/` starts a regex literal unless the previous significant token can
//!   end an operand (identifier, literal, `)`, `]`);
//! - `` ` `` starts a template literal, scanned manually so `${}` nesting
//!   and escapes are honored.
//!
//! Comments are captured as side trivia with spans, not as tokens, so the
//! parser never sees them but the printer can put them back.

use logos::Logos;

use crate::ast::Span;

/// A lexical error with enough context to report.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub snippet: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unexpected input '{}'", self.snippet)
    }
}

impl std::error::Error for LexError {}

/// A comment, kept verbatim (including its delimiters).
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

/// Raw logos tokens. Internal; [`tokenize`] converts these to [`Token`].
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawTok {
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    // Keywords.
    #[token("import")]
    Import,
    #[token("export")]
    Export,
    #[token("from")]
    From,
    #[token("as")]
    As,
    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("default")]
    Default,
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("new")]
    New,
    #[token("async")]
    Async,
    #[token("await")]
    Await,
    #[token("throw")]
    Throw,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("class")]
    Class,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("typeof")]
    TypeOf,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,
    #[regex(r"[0-9][0-9_]*n")]
    BigInt,
    #[regex(r"[0-9][0-9_]*(\.[0-9][0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0[bB][01][01_]*")]
    #[regex(r"0[oO][0-7][0-7_]*")]
    Num,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    // Punctuation. Multi-char first is irrelevant to logos (longest match
    // wins) but keeps the list readable.
    #[token("=>")]
    Arrow,
    #[token("...")]
    DotDotDot,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    QuestionQuestion,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("`")]
    Backtick,
}

/// Public token type consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords.
    Import,
    Export,
    From,
    As,
    Const,
    Let,
    Var,
    Default,
    Function,
    Return,
    If,
    Else,
    New,
    Async,
    Await,
    Throw,
    While,
    For,
    Class,
    Try,
    Catch,
    Finally,
    TypeOf,
    True,
    False,
    Null,

    // Literals, carrying their raw source text.
    Str(String),
    Num(String),
    BigInt(String),
    Regex { pattern: String, flags: String },
    Template { raw: String, has_exprs: bool },
    Ident(String),

    // Punctuation.
    Arrow,
    DotDotDot,
    EqEqEq,
    NotEqEq,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    QuestionQuestion,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Question,
    Eq,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Str(raw) | Token::Num(raw) | Token::BigInt(raw) => write!(f, "{}", raw),
            Token::Regex { pattern, flags } => write!(f, "/{}/{}", pattern, flags),
            Token::Template { raw, .. } => write!(f, "{}", raw),
            Token::Ident(name) => write!(f, "{}", name),
            other => write!(f, "{}", other.literal_text()),
        }
    }
}

impl Token {
    fn literal_text(&self) -> &'static str {
        match self {
            Token::Import => "import",
            Token::Export => "export",
            Token::From => "from",
            Token::As => "as",
            Token::Const => "const",
            Token::Let => "let",
            Token::Var => "var",
            Token::Default => "default",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::New => "new",
            Token::Async => "async",
            Token::Await => "await",
            Token::Throw => "throw",
            Token::While => "while",
            Token::For => "for",
            Token::Class => "class",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::TypeOf => "typeof",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Arrow => "=>",
            Token::DotDotDot => "...",
            Token::EqEqEq => "===",
            Token::NotEqEq => "!==",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::QuestionQuestion => "??",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Question => "?",
            Token::Eq => "=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            _ => "",
        }
    }

    /// Whether this token can end an operand, which makes a following `/`
    /// a division sign rather than the start of a regex literal.
    fn can_end_operand(&self) -> bool {
        matches!(
            self,
            Token::Ident(_)
                | Token::Str(_)
                | Token::Num(_)
                | Token::BigInt(_)
                | Token::Regex { .. }
                | Token::Template { .. }
                | Token::True
                | Token::False
                | Token::Null
                | Token::RParen
                | Token::RBracket
        )
    }
}

/// The lexer output: spanned tokens plus comment trivia.
#[derive(Debug)]
pub struct TokenStream {
    pub tokens: Vec<(Token, Span)>,
    pub comments: Vec<Comment>,
}

/// Tokenize `source` into spanned tokens and comment trivia.
pub fn tokenize(source: &str) -> Result<TokenStream, LexError> {
    let mut lexer = RawTok::lexer(source);
    let mut tokens: Vec<(Token, Span)> = Vec::new();
    let mut comments = Vec::new();

    while let Some(raw) = lexer.next() {
        let range = lexer.span();
        let slice = lexer.slice();
        let raw = match raw {
            Ok(raw) => raw,
            Err(()) => {
                return Err(LexError {
                    span: (range.start..range.end).into(),
                    snippet: slice.to_string(),
                })
            }
        };

        match raw {
            RawTok::LineComment | RawTok::BlockComment => {
                comments.push(Comment {
                    text: slice.to_string(),
                    span: (range.start..range.end).into(),
                });
            }
            RawTok::Slash => {
                let regex_position = tokens
                    .last()
                    .map(|(t, _)| !t.can_end_operand())
                    .unwrap_or(true);
                match scan_regex_tail(lexer.remainder()).filter(|_| regex_position) {
                    Some((pattern, flags, consumed)) => {
                        lexer.bump(consumed);
                        let end = range.start + 1 + consumed;
                        tokens.push((Token::Regex { pattern, flags }, (range.start..end).into()));
                    }
                    None => tokens.push((Token::Slash, (range.start..range.end).into())),
                }
            }
            RawTok::Backtick => {
                let (body, has_exprs, consumed) =
                    scan_template_tail(lexer.remainder()).ok_or_else(|| LexError {
                        span: (range.start..range.end).into(),
                        snippet: "`".to_string(),
                    })?;
                lexer.bump(consumed);
                let end = range.start + 1 + consumed;
                let raw_text = format!("`{}", body);
                tokens.push((
                    Token::Template { raw: raw_text, has_exprs },
                    (range.start..end).into(),
                ));
            }
            other => {
                let token = convert(other, slice);
                tokens.push((token, (range.start..range.end).into()));
            }
        }
    }

    Ok(TokenStream { tokens, comments })
}

fn convert(raw: RawTok, slice: &str) -> Token {
    match raw {
        RawTok::Import => Token::Import,
        RawTok::Export => Token::Export,
        RawTok::From => Token::From,
        RawTok::As => Token::As,
        RawTok::Const => Token::Const,
        RawTok::Let => Token::Let,
        RawTok::Var => Token::Var,
        RawTok::Default => Token::Default,
        RawTok::Function => Token::Function,
        RawTok::Return => Token::Return,
        RawTok::If => Token::If,
        RawTok::Else => Token::Else,
        RawTok::New => Token::New,
        RawTok::Async => Token::Async,
        RawTok::Await => Token::Await,
        RawTok::Throw => Token::Throw,
        RawTok::While => Token::While,
        RawTok::For => Token::For,
        RawTok::Class => Token::Class,
        RawTok::Try => Token::Try,
        RawTok::Catch => Token::Catch,
        RawTok::Finally => Token::Finally,
        RawTok::TypeOf => Token::TypeOf,
        RawTok::True => Token::True,
        RawTok::False => Token::False,
        RawTok::Null => Token::Null,
        RawTok::Str => Token::Str(slice.to_string()),
        RawTok::Num => Token::Num(slice.to_string()),
        RawTok::BigInt => Token::BigInt(slice.to_string()),
        RawTok::Ident => Token::Ident(slice.to_string()),
        RawTok::Arrow => Token::Arrow,
        RawTok::DotDotDot => Token::DotDotDot,
        RawTok::EqEqEq => Token::EqEqEq,
        RawTok::NotEqEq => Token::NotEqEq,
        RawTok::EqEq => Token::EqEq,
        RawTok::NotEq => Token::NotEq,
        RawTok::LtEq => Token::LtEq,
        RawTok::GtEq => Token::GtEq,
        RawTok::AndAnd => Token::AndAnd,
        RawTok::OrOr => Token::OrOr,
        RawTok::QuestionQuestion => Token::QuestionQuestion,
        RawTok::LParen => Token::LParen,
        RawTok::RParen => Token::RParen,
        RawTok::LBrace => Token::LBrace,
        RawTok::RBrace => Token::RBrace,
        RawTok::LBracket => Token::LBracket,
        RawTok::RBracket => Token::RBracket,
        RawTok::Comma => Token::Comma,
        RawTok::Semi => Token::Semi,
        RawTok::Colon => Token::Colon,
        RawTok::Dot => Token::Dot,
        RawTok::Question => Token::Question,
        RawTok::Eq => Token::Eq,
        RawTok::Lt => Token::Lt,
        RawTok::Gt => Token::Gt,
        RawTok::Plus => Token::Plus,
        RawTok::Minus => Token::Minus,
        RawTok::Star => Token::Star,
        RawTok::Percent => Token::Percent,
        RawTok::Bang => Token::Bang,
        RawTok::Slash | RawTok::Backtick | RawTok::LineComment | RawTok::BlockComment => {
            // Handled before convert() is reached.
            Token::Slash
        }
    }
}

/// Scan the body and flags of a regex literal whose opening `/` was already
/// consumed. Returns `(pattern, flags, consumed_bytes)`, or `None` when no
/// closing `/` exists on the line (then the `/` was a division sign).
fn scan_regex_tail(rest: &str) -> Option<(String, String, usize)> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    let mut in_class = false;
    let mut escaped = false;

    let body_end = loop {
        let b = *bytes.get(i)?;
        if b == b'\n' {
            return None;
        }
        if escaped {
            escaped = false;
        } else {
            match b {
                b'\\' => escaped = true,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => break i,
                _ => {}
            }
        }
        i += 1;
    };
    // An empty body would be a `//` comment, which the raw lexer already
    // claimed; still, never produce an empty regex.
    if body_end == 0 {
        return None;
    }

    let mut flags_end = body_end + 1;
    while flags_end < bytes.len() && bytes[flags_end].is_ascii_alphabetic() {
        flags_end += 1;
    }

    let pattern = rest[..body_end].to_string();
    let flags = rest[body_end + 1..flags_end].to_string();
    Some((pattern, flags, flags_end))
}

/// Scan a template literal body whose opening backtick was already consumed.
/// Returns `(body_including_closing_backtick, has_exprs, consumed_bytes)`.
fn scan_template_tail(rest: &str) -> Option<(String, bool, usize)> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    let mut escaped = false;
    let mut interp_depth = 0usize;
    let mut has_exprs = false;

    loop {
        let b = *bytes.get(i)?;
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                has_exprs = true;
                interp_depth += 1;
                i += 1;
            }
            b'{' if interp_depth > 0 => interp_depth += 1,
            b'}' if interp_depth > 0 => interp_depth -= 1,
            b'`' if interp_depth == 0 => {
                return Some((rest[..=i].to_string(), has_exprs, i + 1));
            }
            _ => {}
        }
        i += 1;
    }
}

/// Decode the escapes of a quoted string literal's raw text (including its
/// quotes) into its runtime value.
pub fn cooked_string(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\x");
                        out.push_str(&hex);
                    }
                }
            }
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("should tokenize")
            .tokens
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn tokenizes_an_import_line() {
        let tokens = kinds("import { z } from 'zod';");
        assert_eq!(
            tokens,
            vec![
                Token::Import,
                Token::LBrace,
                Token::Ident("z".into()),
                Token::RBrace,
                Token::From,
                Token::Str("'zod'".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn comments_become_trivia_not_tokens() {
        let stream = tokenize("// leading\nconst a = 1; /* trailing */").expect("should tokenize");
        assert_eq!(stream.comments.len(), 2);
        assert_eq!(stream.comments[0].text, "// leading");
        assert_eq!(stream.comments[1].text, "/* trailing */");
        assert!(!stream.tokens.iter().any(|(t, _)| matches!(t, Token::Slash)));
    }

    #[test]
    fn regex_literal_after_call_paren() {
        let tokens = kinds("z.string().regex(/^(a+)+$/i)");
        let regex = tokens
            .iter()
            .find_map(|t| match t {
                Token::Regex { pattern, flags } => Some((pattern.clone(), flags.clone())),
                _ => None,
            })
            .expect("regex token");
        assert_eq!(regex.0, "^(a+)+$");
        assert_eq!(regex.1, "i");
    }

    #[test]
    fn regex_char_class_may_contain_slash() {
        let tokens = kinds(r"x.regex(/[/]+/)");
        assert!(tokens.iter().any(|t| matches!(
            t,
            Token::Regex { pattern, .. } if pattern == "[/]+"
        )));
    }

    #[test]
    fn slash_after_operand_is_division() {
        let tokens = kinds("a / b");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::Slash,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn template_literal_flags_interpolation() {
        let tokens = kinds("`plain` `has ${x} expr`");
        assert_eq!(
            tokens,
            vec![
                Token::Template { raw: "`plain`".into(), has_exprs: false },
                Token::Template { raw: "`has ${x} expr`".into(), has_exprs: true },
            ]
        );
    }

    #[test]
    fn bigint_and_number_literals() {
        let tokens = kinds("42 4.5 0x1F 12n");
        assert_eq!(
            tokens,
            vec![
                Token::Num("42".into()),
                Token::Num("4.5".into()),
                Token::Num("0x1F".into()),
                Token::BigInt("12n".into()),
            ]
        );
    }

    #[test]
    fn unexpected_character_is_a_lex_error() {
        let err = tokenize("const a = #;").unwrap_err();
        assert_eq!(err.snippet, "#");
    }

    #[test]
    fn cooked_string_decodes_escapes() {
        assert_eq!(cooked_string(r#""a\nb""#), "a\nb");
        assert_eq!(cooked_string(r#"'it\'s'"#), "it's");
        assert_eq!(cooked_string(r#""A""#), "A");
        assert_eq!(cooked_string(r#""plain""#), "plain");
    }

    #[test]
    fn spans_are_byte_accurate() {
        let stream = tokenize("const abc = 1;").expect("should tokenize");
        let (token, span) = &stream.tokens[1];
        assert_eq!(*token, Token::Ident("abc".into()));
        assert_eq!(span.start, 6);
        assert_eq!(span.end, 9);
    }
}
