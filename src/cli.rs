//! Minimal CLI: schema file + JSON documents → validate | defaults | models
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use json_model::schema_doc::SchemaDocument;
use json_model::{Model, ModelType, Registry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against declarative model schemas
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document and report one line per document
    Check(CheckCmd),
    /// print an instance built purely from defaults
    Defaults(DefaultsCmd),
    /// list the models a schema file declares, with canonical field order
    Models(ModelsCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema file: {"models": [{"name": ..., "fields": {...}}]}
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// model to validate against
    #[arg(long, conflicts_with = "tagged", required_unless_present = "tagged")]
    model: Option<String>,

    /// pick the model from each document's `__class_name__` key
    #[arg(long, default_value_t = false)]
    tagged: bool,

    /// print the canonical dump of each valid document
    #[arg(long, default_value_t = false)]
    dump: bool,
}

#[derive(clap::Parser, Debug)]
struct DefaultsCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// model to instantiate
    #[arg(long)]
    model: String,

    /// pretty-print the output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(clap::Parser, Debug)]
struct ModelsCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

/// One input document and where it came from.
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load_registry(&self) -> Result<Registry> {
        let source = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let document = SchemaDocument::from_json_str(&source)
            .with_context(|| format!("invalid schema file {}", self.schema.display()))?;
        let registry = Registry::new();
        document
            .register_all(&registry)
            .with_context(|| format!("failed to register models from {}", self.schema.display()))?;
        tracing::info!(
            schema = %self.schema.display(),
            models = ?registry.names(),
            "schema loaded"
        );
        Ok(registry)
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths =
            resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            for (label, value) in self.split(&source_path, &source)? {
                self.select(label, value, &mut out)?;
            }
        }
        tracing::debug!(documents = out.len(), "inputs loaded");
        Ok(out)
    }

    fn split(&self, path: &Path, source: &str) -> Result<Vec<(String, Value)>> {
        let path_str = path.to_string_lossy();
        if !self.ndjson {
            let value = serde_json::from_str::<Value>(source)
                .with_context(|| format!("failed to parse JSON source file ({path_str})"))?;
            return Ok(vec![(path_str.to_string(), value)]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(ix, line)| {
                let label = format!("{path_str}:{}", ix + 1);
                let value = serde_json::from_str::<Value>(line)
                    .with_context(|| format!("failed to parse NDJSON line ({label})"))?;
                Ok((label, value))
            })
            .collect()
    }

    fn select(&self, label: String, value: Value, out: &mut Vec<Document>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {label}"))?,
        };
        match self.jq_expr.as_ref() {
            None => out.push(Document { label, value }),
            Some(jq_expr) => {
                let results = crate::jq_exec::select_documents(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {label}"))?;
                for (ix, value) in results.into_iter().enumerate() {
                    out.push(Document { label: format!("{label}#{ix}"), value });
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns whether every checked document passed.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Defaults(target) => {
                let registry = target.schema_settings.load_registry()?;
                let ty = registry.require(&target.model)?;
                let model = ty.construct(Vec::<(String, json_model::Value)>::new())?;
                let dumped = Value::Object(model.dump());
                let text = if target.pretty {
                    serde_json::to_string_pretty(&dumped)?
                } else {
                    serde_json::to_string(&dumped)?
                };
                println!("{text}");
                Ok(true)
            }
            Command::Models(target) => {
                let registry = target.schema_settings.load_registry()?;
                for name in registry.names() {
                    let ty = registry.require(&name)?;
                    let fields = ty.field_order().collect::<Vec<_>>().join(", ");
                    let tag = if ty.is_tagged() { " (tagged)" } else { "" };
                    println!("{}{tag}: {fields}", name.bold());
                }
                Ok(true)
            }
        }
    }
}

impl CheckCmd {
    fn run(&self) -> Result<bool> {
        let registry = self.schema_settings.load_registry()?;
        let target = match self.model.as_deref() {
            Some(name) => Some(registry.require(name)?),
            None if self.tagged => None,
            None => bail!("either --model or --tagged is required"),
        };
        let documents = self.input_settings.load_documents()?;

        let outcomes: Vec<(String, Result<Model>)> = documents
            .into_par_iter()
            .map(|doc| {
                let outcome = validate_document(&registry, target.as_ref(), &doc.value);
                (doc.label, outcome)
            })
            .collect();

        let mut failed = 0usize;
        for (label, outcome) in &outcomes {
            match outcome {
                Ok(model) => {
                    println!("{} {label}", "ok".green());
                    if self.dump {
                        println!("{}", model.dump_json()?);
                    }
                }
                Err(error) => {
                    failed += 1;
                    println!("{} {label}", "FAIL".red().bold());
                    for line in format!("{error:#}").lines() {
                        println!("    {line}");
                    }
                }
            }
        }
        let summary = format!("{} checked, {failed} failed", outcomes.len());
        if failed == 0 {
            eprintln!("{}", summary.green());
        } else {
            eprintln!("{}", summary.red());
        }
        Ok(failed == 0)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn validate_document(
    registry: &Registry,
    target: Option<&Arc<ModelType>>,
    value: &Value,
) -> Result<Model> {
    let data = value
        .as_object()
        .ok_or_else(|| anyhow!("document is not a JSON object"))?;
    let model = match target {
        Some(ty) => registry.validate(ty, data)?,
        None => registry.validate_tagged(data)?,
    };
    Ok(model)
}

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
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &str = r#"{"models": [
        {"name": "Fruit", "tagged": false, "fields": {
            "name": {"type": "str", "max_len": 10},
            "quantity": {"type": "int", "default": 10}
        }}
    ]}"#;

    fn registry() -> Registry {
        let registry = Registry::new();
        SchemaDocument::from_json_str(SCHEMA).unwrap().register_all(&registry).unwrap();
        registry
    }

    #[test]
    fn documents_are_validated_against_the_target() {
        let registry = registry();
        let fruit = registry.require("Fruit").unwrap();
        assert!(validate_document(&registry, Some(&fruit), &json!({"name": "apple"})).is_ok());
        let too_long = json!({"name": "a very long name"});
        assert!(validate_document(&registry, Some(&fruit), &too_long).is_err());
        assert!(validate_document(&registry, Some(&fruit), &json!([1])).is_err());
    }

    #[test]
    fn ndjson_lines_are_labelled() {
        let settings = InputSettings {
            ndjson: true,
            json_pointer: None,
            jq_expr: None,
            input: vec![],
        };
        let docs = settings.split(Path::new("in.ndjson"), "{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        let labels = docs.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["in.ndjson:1", "in.ndjson:3"]);
    }

    #[test]
    fn json_pointer_selects_a_subnode() {
        let settings = InputSettings {
            ndjson: false,
            json_pointer: Some("/data/0".into()),
            jq_expr: None,
            input: vec![],
        };
        let mut out = Vec::new();
        settings.select("x".into(), json!({"data": [{"name": "apple"}]}), &mut out).unwrap();
        assert_eq!(out[0].value, json!({"name": "apple"}));
        assert!(settings.select("y".into(), json!({}), &mut out).is_err());
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/nonexistent-dir-for-tests/*.json"]).is_err());
        assert_eq!(
            resolve_file_path_patterns(["plain.json"]).unwrap(),
            vec![PathBuf::from("plain.json")]
        );
    }
}
