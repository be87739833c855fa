//! Minimal CLI: repair JSON documents against a shape table, or report
//! what a repair pass would change.
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use crate::report;
use crate::schema::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// repair JSON against a shape table extracted from type declarations
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// repair each document and print (or write) the result
    Repair(RepairOut),
    /// dry run: print the repairs each document would need
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// shape table (JSON) produced by the schema extractor
    #[arg(long, short)]
    schema: PathBuf,

    /// JSON Pointer to select a subnode in each document (e.g. /data/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// treat each document as an array of records, repairing per element
    #[arg(long, default_value_t = false)]
    array: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct RepairOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted; single input only)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_schema(&self) -> Result<Schema> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        Schema::from_json_str(&src)
            .with_context(|| format!("invalid schema file {}", self.schema.display()))
    }

    /// Resolve inputs, parse each, and apply the optional pointer selection.
    fn load_documents(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let name = source_path.to_string_lossy().to_string();
            let src = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {name}"))?;
            let mut value: Value = serde_json::from_str(&src)
                .with_context(|| format!("failed to parse JSON source file {name}"))?;
            if let Some(pointer) = self.json_pointer.as_deref() {
                value = value
                    .pointer(pointer)
                    .cloned()
                    .with_context(|| format!("pointer {pointer} selects nothing in {name}"))?;
            }
            documents.push((name, value));
        }
        Ok(documents)
    }

    /// One repair pass over a loaded document.
    fn repair_document(&self, schema: &Schema, value: Value) -> Value {
        if self.array {
            match value {
                Value::Array(items) => Value::Array(crate::guard::repair_elements(schema, items)),
                other => crate::guard::repair(schema, other),
            }
        } else {
            crate::guard::repair(schema, value)
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Repair(target) => {
                let settings = &target.input_settings;
                let schema = settings.load_schema()?;
                let documents = settings.load_documents()?;
                if target.out.is_some() && documents.len() > 1 {
                    bail!("--out only makes sense with a single input");
                }
                for (_, value) in documents {
                    let repaired = settings.repair_document(&schema, value);
                    let repaired_src = serde_json::to_string_pretty(&repaired)
                        .context("failed to serialize repaired document")?;
                    if let Some(out) = target.out.as_ref() {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent).with_context(|| {
                                format!("failed to create {}", parent.display())
                            })?;
                        }
                        std::fs::write(out, &repaired_src)
                            .with_context(|| format!("failed to write {}", out.display()))?;
                    } else {
                        println!("{repaired_src}");
                    }
                }
                Ok(())
            }
            Command::Check(target) => {
                let settings = &target.input_settings;
                let schema = settings.load_schema()?;
                let mut total = 0usize;
                for (name, value) in settings.load_documents()? {
                    let repaired = settings.repair_document(&schema, value.clone());
                    let repairs = report::diff(&value, &repaired);
                    if repairs.is_empty() {
                        eprintln!("{} {name}", "ok".green());
                        continue;
                    }
                    eprintln!("{} {name}: {} repair(s)", "!!".yellow(), repairs.len());
                    for repair in &repairs {
                        if repair.was_added() {
                            eprintln!("  {} {}: {}", "+".green(), repair.path, repair.after);
                        } else {
                            let before = repair.before.as_ref().unwrap_or(&Value::Null);
                            eprintln!(
                                "  {} {}: {} -> {}",
                                "~".yellow(),
                                repair.path,
                                before,
                                repair.after
                            );
                        }
                    }
                    total += repairs.len();
                }
                if total > 0 {
                    bail!("{total} field(s) would be repaired");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in
                glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))?
            {
                let path = entry.with_context(|| format!("glob failed under {pattern}"))?;
                matched_any = true;
                out.push(path);
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
