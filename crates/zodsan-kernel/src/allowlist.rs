//! Whitelists of schema-construction methods.
//!
//! Two sets: constructors reachable as `z.<name>(...)` and chain methods
//! reachable as `<schema>.<name>(...)`. Some names live in both (`array`,
//! `optional`, `nullable`, ...). Execution-side methods (`parse`,
//! `safeParse`, `parseAsync`) are deliberately absent: zodsan accepts schema
//! definitions, never schema invocations.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Names valid directly on the `z` namespace.
pub static ALLOWED_CONSTRUCTORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "string",
        "number",
        "bigint",
        "boolean",
        "date",
        "symbol",
        "undefined",
        "null",
        "void",
        "any",
        "unknown",
        "never",
        "literal",
        "array",
        "object",
        "strictObject",
        "union",
        "discriminatedUnion",
        "intersection",
        "tuple",
        "record",
        "map",
        "set",
        "function",
        "lazy",
        "promise",
        "enum",
        "nativeEnum",
        "optional",
        "nullable",
        "preprocess",
        "custom",
        "instanceof",
        "coerce",
    ]
    .into_iter()
    .collect()
});

/// Names valid as a continuation of an existing schema expression.
pub static ALLOWED_CHAIN_METHODS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // wrappers
        "optional",
        "nullable",
        "nullish",
        "array",
        "promise",
        "readonly",
        "brand",
        // combination
        "or",
        "and",
        "pipe",
        // refinement and transformation
        "refine",
        "superRefine",
        "transform",
        "default",
        "describe",
        "catch",
        // string checks
        "min",
        "max",
        "length",
        "email",
        "url",
        "emoji",
        "uuid",
        "cuid",
        "cuid2",
        "ulid",
        "regex",
        "includes",
        "startsWith",
        "endsWith",
        "datetime",
        "date",
        "time",
        "duration",
        "ip",
        "trim",
        "toLowerCase",
        "toUpperCase",
        // number checks
        "int",
        "positive",
        "nonnegative",
        "negative",
        "nonpositive",
        "multipleOf",
        "step",
        "finite",
        "safe",
        "gt",
        "gte",
        "lt",
        "lte",
        // array checks
        "nonempty",
        // object reshaping
        "extend",
        "merge",
        "pick",
        "omit",
        "partial",
        "deepPartial",
        "required",
        "passthrough",
        "strict",
        "strip",
        "catchall",
        "keyof",
        // function schemas
        "args",
        "returns",
        // misc
        "unwrap",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` may appear anywhere in a schema chain.
pub fn is_allowed_method(name: &str) -> bool {
    ALLOWED_CONSTRUCTORS.contains(name) || ALLOWED_CHAIN_METHODS.contains(name)
}
