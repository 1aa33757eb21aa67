//! Schema-group tests: components, inlining, unwrap, ordering, metrics.

use zodsan_kernel::{Config, Sanitizer};

fn grouping_sanitizer(unwrap_array_root: bool) -> Sanitizer {
    Sanitizer::new(Config::medium().with_unification(true, unwrap_array_root))
}

// ============================================================================
// Connected components
// ============================================================================

#[tokio::test]
async fn dependent_schemas_group_together() {
    let source = r#"import { z } from 'zod';
const addressSchema = z.object({ street: z.string(), city: z.string() });
const userSchema = z.object({ name: z.string(), address: addressSchema });
const settingsSchema = z.object({ theme: z.string() });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    assert!(result.is_valid, "issues: {:?}", result.issues);

    let groups = result.schema_groups.expect("groups should be computed");
    assert_eq!(groups.len(), 2);

    // Largest group first.
    let user_group = &groups[0];
    assert_eq!(user_group.metrics.schema_count, 2);
    assert!(user_group.schema_names.contains(&"addressSchema".to_string()));
    assert!(user_group.schema_names.contains(&"userSchema".to_string()));
    // The root (depends on others, referenced by none) leads.
    assert_eq!(user_group.schema_names[0], "userSchema");

    let settings_group = &groups[1];
    assert_eq!(settings_group.schema_names, vec!["settingsSchema"]);
    assert_eq!(settings_group.metrics.schema_count, 1);
}

#[tokio::test]
async fn groups_partition_the_schema_names() {
    let source = r#"import { z } from 'zod';
const aSchema = z.string();
const bSchema = z.object({ a: aSchema });
const cSchema = z.number();
const dSchema = z.array(cSchema);
const eSchema = z.boolean();
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");

    let mut seen: Vec<String> = groups.iter().flat_map(|g| g.schema_names.clone()).collect();
    seen.sort();
    assert_eq!(
        seen,
        vec!["aSchema", "bSchema", "cSchema", "dSchema", "eSchema"]
    );
}

#[tokio::test]
async fn group_code_is_self_contained() {
    let source = r#"import { z } from 'zod';
const addressSchema = z.object({ street: z.string() });
const userSchema = z.object({ address: addressSchema });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");
    let code = &groups[0].code;

    assert!(code.starts_with("export const userSchema = "));
    // The member reference has been replaced by its definition.
    assert!(!code.contains("address: addressSchema"));
    assert!(code.contains("street"));
}

#[tokio::test]
async fn reference_inside_block_bodied_callback_counts_as_edge() {
    let source = r#"import { z } from 'zod';
const limitSchema = z.number().min(1);
const checkedSchema = z.string().refine((v) => { return v.length > limitSchema; });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    assert!(result.is_valid, "issues: {:?}", result.issues);

    let groups = result.schema_groups.expect("groups");
    assert_eq!(groups.len(), 1, "both schemas belong to one component");
    assert_eq!(groups[0].schema_names[0], "checkedSchema");
    assert!(groups[0].schema_names.contains(&"limitSchema".to_string()));

    // The reference inside the block body is inlined away, so the group's
    // code stands alone.
    assert!(groups[0].code.contains("z.number().min(1)"));
    assert!(!groups[0].code.contains("limitSchema"));
}

#[tokio::test]
async fn reference_in_callback_inside_object_property_counts_as_edge() {
    let source = r#"import { z } from 'zod';
const minSchema = z.number();
const formSchema = z.object({ name: z.string().refine((v) => { return v.length > minSchema; }) });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    assert!(result.is_valid, "issues: {:?}", result.issues);

    let groups = result.schema_groups.expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].metrics.schema_count, 2);
    assert!(!groups[0].code.contains("minSchema"));
}

#[tokio::test]
async fn declarators_nested_in_callback_bodies_are_collected() {
    let source = r#"import { z } from 'zod';
const wrapperSchema = z.string().transform((v) => { const innerSchema = z.number(); return v; });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    assert!(result.is_valid, "issues: {:?}", result.issues);

    let groups = result.schema_groups.expect("groups");
    let all_names: Vec<String> = groups.iter().flat_map(|g| g.schema_names.clone()).collect();
    assert!(all_names.contains(&"wrapperSchema".to_string()));
    assert!(all_names.contains(&"innerSchema".to_string()));
}

#[tokio::test]
async fn reference_inside_array_constructor_counts_as_edge() {
    let source = r#"import { z } from 'zod';
const itemSchema = z.object({ sku: z.string() });
const cartSchema = z.array(itemSchema);
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].schema_names[0], "cartSchema");
    assert!(groups[0].code.contains("sku"));
}

// ============================================================================
// Array-root unwrap
// ============================================================================

#[tokio::test]
async fn top_level_array_root_is_unwrapped() {
    let source = "import { z } from 'zod';\nconst arrayRootSchema = z.array(z.object({ name: z.string() }));";
    let result = grouping_sanitizer(true).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");
    let code = &groups[0].code;

    assert!(code.contains("z.object({"));
    assert!(!code.contains("z.array("));
}

#[tokio::test]
async fn nested_arrays_unwrap_only_the_outermost() {
    let source = "import { z } from 'zod';\nconst arrayRootSchema = z.array(z.array(z.string()));";
    let result = grouping_sanitizer(true).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");
    let code = &groups[0].code;

    assert_eq!(code.matches("z.array(").count(), 1);
}

#[tokio::test]
async fn unwrap_disabled_keeps_the_array_root() {
    let source = "import { z } from 'zod';\nconst arrayRootSchema = z.array(z.object({ name: z.string() }));";
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");

    assert!(groups[0].code.contains("z.array("));
}

// ============================================================================
// Ordering and metrics
// ============================================================================

#[tokio::test]
async fn groups_sort_by_size_then_complexity() {
    let source = r#"import { z } from 'zod';
const tinySchema = z.string();
const leftSchema = z.object({ a: z.string() });
const rightSchema = z.object({ left: leftSchema, b: z.number() });
"#;
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].metrics.schema_count, 2);
    assert_eq!(groups[1].metrics.schema_count, 1);
    assert!(groups[0].metrics.complexity > groups[1].metrics.complexity);
}

#[tokio::test]
async fn metrics_count_lines_and_weighted_calls() {
    let source = "import { z } from 'zod';\nconst mSchema = z.object({ tags: z.array(z.string()) });";
    let result = grouping_sanitizer(false).validate_schema(source).await;
    let groups = result.schema_groups.expect("groups");
    let group = &groups[0];

    assert_eq!(group.metrics.schema_count, 1);
    assert_eq!(group.metrics.total_lines, group.code.lines().count());
    // z.object + z.array + z.string -> 3 "z." + 1 object( + 1 array(.
    let expected = 3.0 + 2.0 + 1.5;
    assert!((group.metrics.complexity - expected).abs() < f64::EPSILON);
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn groups_are_absent_when_unification_is_disabled() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string();";
    let result = Sanitizer::new(Config::medium()).validate_schema(source).await;
    assert!(result.schema_groups.is_none());
}

#[tokio::test]
async fn groups_are_absent_when_nothing_survives() {
    let source = "import { z } from 'zod';\nconst aSchema = z.string().hack();";
    let result = grouping_sanitizer(false).validate_schema(source).await;

    assert_eq!(result.cleaned_code, "");
    assert!(result.schema_groups.is_none());
}

#[tokio::test]
async fn cyclic_references_trip_the_node_cap_not_the_stack() {
    // A cycle cannot come out of a single sanitizer pass (each initializer
    // only sees earlier names at runtime), but the analyzer must still
    // survive one: the inliner's node budget stops the expansion.
    let config = Config {
        max_node_count: 2_000,
        ..Config::medium()
    }
    .with_unification(true, false);
    let source = r#"import { z } from 'zod';
const aSchema = z.lazy(() => bSchema);
const bSchema = z.object({ a: aSchema });
"#;
    let result = Sanitizer::new(config).validate_schema(source).await;

    // Either the group renders (lazy bodies are not inlined) or grouping
    // degrades to a warning; the run must not hang or crash.
    if result.schema_groups.is_none() {
        assert!(result
            .issues
            .iter()
            .any(|i| i.message.contains("Schema grouping failed")));
    }
}
