//! End-to-end tests for the sanitizer pipeline.
//!
//! These drive the public `Sanitizer` API the way the CLI does: source text
//! in, `ValidationResult` out. Issues and cleaned code are asserted
//! together because the pipeline guarantees they agree.

use zodsan_kernel::{Config, Sanitizer, Severity};

fn sanitizer(config: Config) -> Sanitizer {
    Sanitizer::new(config)
}

// ============================================================================
// Import handling
// ============================================================================

#[tokio::test]
async fn missing_zod_import_is_an_error() {
    let result = sanitizer(Config::medium())
        .validate_schema("const aSchema = z.string();")
        .await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Missing 'z' import from 'zod'")));
}

#[tokio::test]
async fn foreign_imports_are_removed_with_an_error() {
    let source = "import { z } from 'zod';\nimport fs from 'fs';\nconst aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Invalid import from 'fs'. Only 'zod' imports are allowed")));
    assert!(!result.cleaned_code.contains("from 'fs'"));
    assert!(result.cleaned_code.contains("import { z } from 'zod';"));
}

#[tokio::test]
async fn renamed_zod_binding_does_not_count_as_z() {
    let result = sanitizer(Config::medium())
        .validate_schema("import { z as zz } from 'zod';\nconst aSchema = zz.string();")
        .await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Missing 'z' import from 'zod'")));
}

// ============================================================================
// Statement classification
// ============================================================================

#[tokio::test]
async fn valid_declarations_are_auto_exported() {
    let source = "import { z } from 'zod';\nconst userSchema = z.object({ name: z.string() });";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.cleaned_code.contains("export const userSchema"));
    assert_eq!(result.root_schema_names, vec!["userSchema"]);
}

#[tokio::test]
async fn already_exported_declarations_stay_as_written() {
    let source = "import { z } from 'zod';\nexport const aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.cleaned_code.contains("export const aSchema = z.string();"));
    assert!(!result.cleaned_code.contains("export export"));
}

#[tokio::test]
async fn let_declarations_must_use_const() {
    let source = "import { z } from 'zod';\nlet aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Schema declarations must use 'const'")));
    assert_eq!(result.cleaned_code, "");
}

#[tokio::test]
async fn missing_initializer_is_an_error() {
    let source = "import { z } from 'zod';\nconst aSchema = undefined;";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Schema declaration must have an initializer")));
}

#[tokio::test]
async fn non_schema_declarations_are_dropped_silently() {
    let source = "import { z } from 'zod';\nconst limit = 10;\nconst aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(!result.cleaned_code.contains("limit"));
    assert!(result.cleaned_code.contains("export const aSchema"));
    assert_eq!(result.root_schema_names, vec!["aSchema"]);
}

#[tokio::test]
async fn disallowed_statement_kinds_are_removed_with_errors() {
    let source = "import { z } from 'zod';\nconsole.log('hi');\nfunction f() { return 1; }\nconst aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Invalid statement type: ExpressionStatement")));
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Invalid statement type: FunctionDeclaration")));
    assert!(!result.cleaned_code.contains("console"));
    assert!(!result.cleaned_code.contains("function f"));
    assert!(result.cleaned_code.contains("export const aSchema"));
}

#[tokio::test]
async fn export_default_is_accepted_but_not_validated() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string();\nexport default aSchema;";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.cleaned_code.contains("export default aSchema;"));
}

#[tokio::test]
async fn invalid_chain_removes_the_whole_declaration() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string().exfiltrate();\nconst bSchema = z.number();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(!result.cleaned_code.contains("exfiltrate"));
    assert!(result.cleaned_code.contains("export const bSchema"));
    assert_eq!(result.root_schema_names, vec!["bSchema"]);
}

#[tokio::test]
async fn comments_survive_sanitization() {
    let source = "import { z } from 'zod';\n// user shape\nconst userSchema = z.object({ name: z.string() });";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(result.is_valid, "issues: {:?}", result.issues);
    assert!(result.cleaned_code.contains("// user shape"));
}

// ============================================================================
// Denied properties (warning severity, still invalidating)
// ============================================================================

#[tokio::test]
async fn denied_property_name_invalidates_with_a_warning() {
    let source = "import { z } from 'zod'; const s = z.object({ constructor: z.string() });";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert!(!result.is_valid);
    let warning = result
        .issues
        .iter()
        .find(|i| i.message.contains("Property name 'constructor' is not allowed"))
        .expect("denied-property issue");
    assert_eq!(warning.severity, Severity::Warning);
}

// ============================================================================
// Governor integration
// ============================================================================

#[tokio::test]
async fn node_limit_aborts_with_empty_cleaned_code() {
    let config = Config {
        max_node_count: 3,
        ..Config::medium()
    };
    let source = "import { z } from 'zod';\nconst aSchema = z.object({ a: z.string(), b: z.number(), c: z.boolean() });";
    let result = sanitizer(config).validate_schema(source).await;

    assert!(!result.is_valid);
    assert_eq!(result.cleaned_code, "");
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Node count exceeded maximum")));
}

#[tokio::test]
async fn chain_depth_cap_is_enforced_end_to_end() {
    let config = Config::relaxed().with_max_chain_depth(2);
    let source = "import { z } from 'zod';\nconst aSchema = z.string().min(1).max(2).trim().email();";
    let result = sanitizer(config).validate_schema(source).await;

    assert!(!result.is_valid);
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Chain nesting depth exceeded")));
}

// ============================================================================
// Idempotence and ordering
// ============================================================================

#[tokio::test]
async fn cleaned_output_revalidates_unchanged() {
    let source = "import { z } from 'zod';\n// keep me\nconst aSchema = z.string().min(1);\nlet junk = 5;\nconst userSchema = z.object({ name: z.string() });";
    let first = sanitizer(Config::medium()).validate_schema(source).await;
    assert!(!first.cleaned_code.is_empty());

    let second = sanitizer(Config::medium())
        .validate_schema(&first.cleaned_code)
        .await;
    assert!(second.is_valid, "issues: {:?}", second.issues);
    assert_eq!(second.cleaned_code, first.cleaned_code);
    assert_eq!(second.root_schema_names, first.root_schema_names);
}

#[tokio::test]
async fn root_schema_names_follow_source_order_without_duplicates() {
    let source = "import { z } from 'zod';\nconst bSchema = z.string();\nconst aSchema = z.number();\nconst bSchema = z.boolean();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    assert_eq!(result.root_schema_names, vec!["bSchema", "aSchema"]);
}

#[tokio::test]
async fn issues_are_reported_in_source_order() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string().nope();\nconst bSchema = q.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    let lines: Vec<u32> = result.issues.iter().map(|i| i.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

// ============================================================================
// Preset monotonicity
// ============================================================================

#[tokio::test]
async fn inputs_accepted_by_tighter_presets_pass_looser_ones() {
    let source = "import { z } from 'zod';\nconst idSchema = z.string().min(1).max(20);";

    let tight = sanitizer(Config::extremely_safe()).validate_schema(source).await;
    let mid = sanitizer(Config::medium()).validate_schema(source).await;
    let loose = sanitizer(Config::relaxed()).validate_schema(source).await;

    assert!(tight.is_valid, "issues: {:?}", tight.issues);
    assert!(mid.is_valid, "issues: {:?}", mid.issues);
    assert!(loose.is_valid, "issues: {:?}", loose.issues);
}

#[tokio::test]
async fn relaxed_accepts_what_medium_rejects() {
    // Computed string keys are a relaxed-only affordance.
    let source = r#"import { z } from 'zod';
const oSchema = z.object({ ["named"]: z.string() });"#;

    let mid = sanitizer(Config::medium()).validate_schema(source).await;
    let loose = sanitizer(Config::relaxed()).validate_schema(source).await;

    assert!(!mid.is_valid);
    assert!(loose.is_valid, "issues: {:?}", loose.issues);
}

// ============================================================================
// Failure surface
// ============================================================================

#[tokio::test]
async fn parse_failure_fails_the_whole_input() {
    let result = sanitizer(Config::medium())
        .validate_schema("import { z } from 'zod';\nconst a = @@;")
        .await;

    assert!(!result.is_valid);
    assert_eq!(result.cleaned_code, "");
    assert!(result
        .issues
        .iter()
        .any(|i| i.message.contains("Failed to parse schema:")));
    assert!(result.root_schema_names.is_empty());
}

#[tokio::test]
async fn empty_input_yields_empty_result() {
    let result = sanitizer(Config::medium()).validate_schema("").await;

    assert!(!result.is_valid); // no zod import
    assert_eq!(result.cleaned_code, "");
    assert!(result.root_schema_names.is_empty());
}

#[tokio::test]
async fn json_serialization_round_trips() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string();";
    let result = sanitizer(Config::medium()).validate_schema(source).await;

    let json = serde_json::to_value(&result).expect("should serialize");
    assert_eq!(json["isValid"], true);
    assert!(json["cleanedCode"].as_str().unwrap().contains("export const aSchema"));
    assert_eq!(json["rootSchemaNames"][0], "aSchema");
}
