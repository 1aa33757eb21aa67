//! Validation configuration: presets, caps and property-safety policy.
//!
//! Three presets exist, strictly ordered by permissiveness:
//! `extremely_safe` < `medium` < `relaxed`. Anything accepted under a
//! tighter preset is accepted under a looser one. `Config::default()` is
//! `medium`; the CLI defaults to `relaxed` to match its documented surface.

use std::collections::HashSet;

use serde::Deserialize;

/// Property-name policy for object literals.
#[derive(Debug, Clone, Default)]
pub struct PropertySafety {
    /// Prefixes that are explicitly fine even when a deny rule would match.
    pub allowed_prefixes: Vec<String>,
    /// Prefixes that make a property name an error.
    pub denied_prefixes: Vec<String>,
    /// Whitelist of property names. Empty means "no whitelist".
    pub allowed_properties: HashSet<String>,
    /// Names that are reported (at warning severity) and fail the object.
    pub denied_properties: HashSet<String>,
}

impl PropertySafety {
    fn with_denied(prefixes: &[&str], properties: &[&str]) -> Self {
        Self {
            allowed_prefixes: Vec::new(),
            denied_prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            allowed_properties: HashSet::new(),
            denied_properties: properties.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Union-merge an overlay into this policy. Deny and allow sets only ever
    /// grow under overlay; nothing is removed.
    pub fn merge(&mut self, overlay: PropertySafetyOverrides) {
        if let Some(prefixes) = overlay.allowed_prefixes {
            for p in prefixes {
                if !self.allowed_prefixes.contains(&p) {
                    self.allowed_prefixes.push(p);
                }
            }
        }
        if let Some(prefixes) = overlay.denied_prefixes {
            for p in prefixes {
                if !self.denied_prefixes.contains(&p) {
                    self.denied_prefixes.push(p);
                }
            }
        }
        if let Some(properties) = overlay.allowed_properties {
            self.allowed_properties.extend(properties);
        }
        if let Some(properties) = overlay.denied_properties {
            self.denied_properties.extend(properties);
        }
    }
}

/// Schema-group (unification) settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnificationConfig {
    pub enabled: bool,
    /// Replace a group's top-level `z.array(inner)` with `inner`, once.
    pub unwrap_array_root: bool,
}

/// All knobs for one validation run. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub timeout_ms: u64,
    pub max_node_count: u64,
    pub max_object_depth: usize,
    pub max_chain_depth: usize,
    pub max_argument_nesting: usize,
    pub max_properties_per_object: usize,
    pub max_string_length: usize,
    pub allow_computed_properties: bool,
    pub allow_loops: bool,
    pub allow_template_exprs: bool,
    pub enable_caching: bool,
    pub property_safety: PropertySafety,
    pub unification: UnificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::medium()
    }
}

impl Config {
    /// Tightest preset: hostile-input defaults.
    pub fn extremely_safe() -> Self {
        Self {
            timeout_ms: 1_000,
            max_node_count: 1_000,
            max_object_depth: 3,
            max_chain_depth: 3,
            max_argument_nesting: 2,
            max_properties_per_object: 20,
            max_string_length: 100,
            allow_computed_properties: false,
            allow_loops: false,
            allow_template_exprs: false,
            enable_caching: false,
            property_safety: PropertySafety::with_denied(
                &["_", "$"],
                &["__proto__", "constructor", "prototype"],
            ),
            unification: UnificationConfig::default(),
        }
    }

    /// Middle preset, and the library default.
    pub fn medium() -> Self {
        Self {
            timeout_ms: 5_000,
            max_node_count: 100_000,
            max_object_depth: 6,
            max_chain_depth: 6,
            max_argument_nesting: 4,
            max_properties_per_object: 100,
            max_string_length: 1_000,
            allow_computed_properties: false,
            allow_loops: false,
            allow_template_exprs: true,
            enable_caching: true,
            property_safety: PropertySafety::with_denied(
                &["__"],
                &[
                    "__proto__",
                    "constructor",
                    "prototype",
                    "eval",
                    "arguments",
                    "process",
                    "global",
                    "window",
                    "document",
                ],
            ),
            unification: UnificationConfig::default(),
        }
    }

    /// Loosest preset, matching the documented CLI default.
    pub fn relaxed() -> Self {
        Self {
            timeout_ms: 30_000,
            max_node_count: 1_000_000,
            max_object_depth: 10,
            max_chain_depth: 10,
            max_argument_nesting: 8,
            max_properties_per_object: 1_000,
            max_string_length: 10_000,
            allow_computed_properties: true,
            allow_loops: false,
            allow_template_exprs: true,
            enable_caching: true,
            property_safety: PropertySafety::with_denied(&["__"], &["__proto__", "constructor"]),
            unification: UnificationConfig::default(),
        }
    }

    /// Look a preset up by its wire name (the CLI `--config` values).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "extremelySafe" => Some(Self::extremely_safe()),
            "medium" => Some(Self::medium()),
            "relaxed" => Some(Self::relaxed()),
            _ => None,
        }
    }

    pub fn with_unification(mut self, enabled: bool, unwrap_array_root: bool) -> Self {
        self.unification = UnificationConfig { enabled, unwrap_array_root };
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_chain_depth(mut self, max_chain_depth: usize) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    pub fn with_caching(mut self, enable_caching: bool) -> Self {
        self.enable_caching = enable_caching;
        self
    }

    /// Overlay a partial overrides record on this preset. Scalar fields
    /// replace; the property-safety sets deep-merge (union).
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if let Some(v) = overrides.$field { self.$field = v; })*
            };
        }
        overlay!(
            timeout_ms,
            max_node_count,
            max_object_depth,
            max_chain_depth,
            max_argument_nesting,
            max_properties_per_object,
            max_string_length,
            allow_computed_properties,
            allow_loops,
            allow_template_exprs,
            enable_caching
        );
        if let Some(property_safety) = overrides.property_safety {
            self.property_safety.merge(property_safety);
        }
        if let Some(unification) = overrides.unification {
            if let Some(enabled) = unification.enabled {
                self.unification.enabled = enabled;
            }
            if let Some(unwrap) = unification.unwrap_array_root {
                self.unification.unwrap_array_root = unwrap;
            }
        }
        self
    }
}

/// A partial overrides record, deserializable from caller-provided JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
    pub timeout_ms: Option<u64>,
    pub max_node_count: Option<u64>,
    pub max_object_depth: Option<usize>,
    pub max_chain_depth: Option<usize>,
    pub max_argument_nesting: Option<usize>,
    pub max_properties_per_object: Option<usize>,
    pub max_string_length: Option<usize>,
    pub allow_computed_properties: Option<bool>,
    pub allow_loops: Option<bool>,
    pub allow_template_exprs: Option<bool>,
    pub enable_caching: Option<bool>,
    pub property_safety: Option<PropertySafetyOverrides>,
    pub unification: Option<UnificationOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertySafetyOverrides {
    pub allowed_prefixes: Option<Vec<String>>,
    pub denied_prefixes: Option<Vec<String>>,
    pub allowed_properties: Option<HashSet<String>>,
    pub denied_properties: Option<HashSet<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnificationOverrides {
    pub enabled: Option<bool>,
    pub unwrap_array_root: Option<bool>,
}
