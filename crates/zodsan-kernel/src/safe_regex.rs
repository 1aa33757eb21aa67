//! Safe-regex oracle.
//!
//! Judges whether a regex pattern is free of catastrophic-backtracking
//! constructs, without ever compiling or running it. The test is syntactic:
//! parse the pattern with `regex-syntax` and reject any unbounded repetition
//! whose body can itself match a variable number of characters — the
//! `(a+)+$` family, including disguises like `(a?)*` and `(\w{1,9})+`.
//! Patterns the parser cannot handle (backreferences, lookaround) are
//! conservatively unsafe: a sanitizer should not vouch for what it cannot
//! analyze.

use regex_syntax::ast::{Ast, RepetitionKind, RepetitionRange};

/// Why a pattern was judged unsafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexRisk {
    /// A variable-length repetition nested inside an unbounded one.
    NestedQuantifier,
    /// The pattern is outside the analyzable dialect.
    Unparseable(String),
}

impl std::fmt::Display for RegexRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexRisk::NestedQuantifier => write!(f, "nested unbounded quantifier"),
            RegexRisk::Unparseable(reason) => write!(f, "unanalyzable pattern: {}", reason),
        }
    }
}

/// Check a pattern. `Ok(())` means the oracle reports it safe.
pub fn check(pattern: &str) -> Result<(), RegexRisk> {
    let ast = regex_syntax::ast::parse::Parser::new()
        .parse(pattern)
        .map_err(|e| RegexRisk::Unparseable(e.to_string()))?;
    if has_catastrophic_repetition(&ast) {
        return Err(RegexRisk::NestedQuantifier);
    }
    Ok(())
}

/// Convenience predicate form of [`check`].
pub fn is_safe(pattern: &str) -> bool {
    check(pattern).is_ok()
}

fn has_catastrophic_repetition(ast: &Ast) -> bool {
    match ast {
        Ast::Repetition(rep) => {
            if is_unbounded(&rep.op.kind) && contains_variable_repetition(&rep.ast) {
                return true;
            }
            has_catastrophic_repetition(&rep.ast)
        }
        Ast::Group(group) => has_catastrophic_repetition(&group.ast),
        Ast::Alternation(alt) => alt.asts.iter().any(has_catastrophic_repetition),
        Ast::Concat(concat) => concat.asts.iter().any(has_catastrophic_repetition),
        _ => false,
    }
}

fn contains_variable_repetition(ast: &Ast) -> bool {
    match ast {
        Ast::Repetition(rep) => {
            is_variable(&rep.op.kind) || contains_variable_repetition(&rep.ast)
        }
        Ast::Group(group) => contains_variable_repetition(&group.ast),
        Ast::Alternation(alt) => alt.asts.iter().any(contains_variable_repetition),
        Ast::Concat(concat) => concat.asts.iter().any(contains_variable_repetition),
        _ => false,
    }
}

/// A repetition with no effective upper bound.
fn is_unbounded(kind: &RepetitionKind) -> bool {
    match kind {
        RepetitionKind::ZeroOrOne => false,
        RepetitionKind::ZeroOrMore | RepetitionKind::OneOrMore => true,
        RepetitionKind::Range(range) => match range {
            RepetitionRange::Exactly(_) => false,
            RepetitionRange::AtLeast(_) => true,
            // Large bounded ranges behave like unbounded ones in a
            // backtracking engine.
            RepetitionRange::Bounded(_, max) => *max > 1_000,
        },
    }
}

/// A repetition that can match a variable number of characters, which is
/// what makes the enclosing loop's match partition ambiguous.
fn is_variable(kind: &RepetitionKind) -> bool {
    match kind {
        RepetitionKind::ZeroOrOne | RepetitionKind::ZeroOrMore | RepetitionKind::OneOrMore => true,
        RepetitionKind::Range(range) => match range {
            RepetitionRange::Exactly(_) => false,
            RepetitionRange::AtLeast(_) => true,
            RepetitionRange::Bounded(min, max) => min != max,
        },
    }
}
