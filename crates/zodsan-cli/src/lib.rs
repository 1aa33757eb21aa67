//! zodsan command-line driver.
//!
//! Thin shell over `zodsan-kernel`: flag parsing, input acquisition
//! (file or stdin), output formatting. All validation semantics live in the
//! kernel; the exit code is 0 iff the run is valid.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use zodsan_kernel::{Config, Sanitizer, Severity, ValidationResult};

/// Validate, sanitize and regroup LLM-generated Zod schema source.
#[derive(Parser, Debug)]
#[command(name = "zodsan", version, about)]
pub struct Cli {
    /// Input file with schema declarations.
    pub file: Option<PathBuf>,

    /// Read the schema source from stdin instead of a file.
    #[arg(long, conflicts_with = "file")]
    pub stdin: bool,

    /// Validation preset.
    #[arg(long, value_enum, default_value_t = Preset::Relaxed)]
    pub config: Preset,

    /// Print only the cleaned source.
    #[arg(long)]
    pub clean_only: bool,

    /// Emit the entire validation result as JSON.
    #[arg(long, conflicts_with = "clean_only")]
    pub json: bool,

    /// Emit the code of the largest schema group.
    #[arg(long = "get-unified-largest", alias = "getUnifiedLargest")]
    pub get_unified_largest: bool,

    /// Unwrap a group's top-level z.array(...) call, once.
    #[arg(long = "unwrap-arrays", alias = "unwrapArrays")]
    pub unwrap_arrays: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Preset {
    #[value(name = "extremelySafe")]
    ExtremelySafe,
    #[value(name = "medium")]
    Medium,
    #[value(name = "relaxed")]
    Relaxed,
}

impl Preset {
    fn to_config(self) -> Config {
        match self {
            Preset::ExtremelySafe => Config::extremely_safe(),
            Preset::Medium => Config::medium(),
            Preset::Relaxed => Config::relaxed(),
        }
    }
}

/// Run the driver; returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let source = read_input(&cli)?;

    let unification = cli.get_unified_largest || cli.unwrap_arrays;
    let config = cli
        .config
        .to_config()
        .with_unification(unification, cli.unwrap_arrays);

    let sanitizer = Sanitizer::new(config);
    let result = sanitizer.validate_schema(&source).await;

    render(&cli, &result)?;
    Ok(if result.is_valid { 0 } else { 1 })
}

fn read_input(cli: &Cli) -> Result<String> {
    if cli.stdin {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => bail!("no input: pass a file path or --stdin (see --help)"),
    }
}

fn render(cli: &Cli, result: &ValidationResult) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if cli.clean_only {
        print!("{}", result.cleaned_code);
        return Ok(());
    }

    if cli.get_unified_largest {
        // Groups arrive sorted largest-first.
        match result.schema_groups.as_ref().and_then(|g| g.first()) {
            Some(group) => println!("{}", group.code),
            None => eprintln!("no schema groups were produced"),
        }
        return Ok(());
    }

    // Human-readable report.
    for issue in &result.issues {
        eprintln!("{}", issue.format());
    }
    let errors = result
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = result
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count();
    eprintln!(
        "{}: {} error(s), {} warning(s), {} schema(s)",
        if result.is_valid { "valid" } else { "invalid" },
        errors,
        warnings,
        result.root_schema_names.len()
    );
    if !result.cleaned_code.is_empty() {
        println!("{}", result.cleaned_code.trim_end());
    }
    if let Some(groups) = &result.schema_groups {
        for group in groups {
            tracing::info!(
                schemas = group.metrics.schema_count,
                lines = group.metrics.total_lines,
                complexity = group.metrics.complexity,
                "group: {}",
                group.schema_names.join(", ")
            );
        }
    }
    Ok(())
}
