//! # Step Rewriting
//!
//! Converts a CI workflow file into a TypeScript module whose steps call the
//! generated factories.
//!
//! Each `jobs.<id>.steps` list becomes an exported `<jobId>Steps` array. A
//! step whose `uses:` names a registered action becomes a call to that
//! action's factory: its `with:` mapping is the first argument and every
//! other step field goes into the override argument. Every other step is
//! emitted as a plain object literal. Local (`./`) and container
//! (`docker://`) actions are never rewritten.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::codegen::naming::{call_identifier, disambiguate, type_identifier};
use crate::codegen::Style;
use crate::error::{Error, Result};
use crate::paths::{absolutize, relative_path, PathResolver};
use crate::registry::{EntryKey, Registry};

/// A rewritten workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenWorkflow {
    pub source: String,
    /// Names of the exported step arrays, in job order.
    pub exports: Vec<String>,
    /// Number of steps turned into factory calls.
    pub rewritten: usize,
    /// `uses:` values that name no registered action.
    pub unmatched: Vec<String>,
}

enum StepKind {
    Call(EntryKey),
    Unmatched(String),
    Plain,
}

fn classify(step: &Mapping, registry: &Registry) -> StepKind {
    let Some(uses) = step.get("uses").and_then(Value::as_str) else {
        return StepKind::Plain;
    };
    let uses = uses.trim();
    if uses.starts_with("docker://") || uses.starts_with("./") || uses.starts_with("../") {
        return StepKind::Plain;
    }

    let key = uses.rsplit_once('@').and_then(|(coordinate, _)| {
        let mut parts = coordinate.splitn(3, '/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;
        let subpath = parts.next().unwrap_or("").trim_matches('/');
        Some(EntryKey::new(format!("{}/{}", owner, repo), subpath))
    });

    match key {
        Some(key) if registry.find(&key).is_some() => StepKind::Call(key),
        _ => StepKind::Unmatched(uses.to_string()),
    }
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Spells a YAML value as a TypeScript literal.
///
/// Non-empty collections span several lines; `depth` is the indentation
/// level of the line the literal starts on.
fn literal(value: &Value, depth: usize, style: &Style) -> String {
    let indent = " ".repeat(style.indent_width);
    let pad = |level: usize| indent.repeat(level);

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => style.string_literal(s),
        Value::Tagged(tagged) => literal(&tagged.value, depth, style),
        Value::Sequence(items) if items.is_empty() => "[]".to_string(),
        Value::Sequence(items) => {
            let mut out = String::from("[\n");
            for item in items {
                out.push_str(&pad(depth + 1));
                out.push_str(&literal(item, depth + 1, style));
                out.push_str(",\n");
            }
            out.push_str(&pad(depth));
            out.push(']');
            out
        }
        Value::Mapping(map) if map.is_empty() => "{}".to_string(),
        Value::Mapping(map) => {
            let mut out = String::from("{\n");
            for (key, item) in map {
                let key = key_text(key).unwrap_or_else(|| literal(key, 0, style));
                out.push_str(&pad(depth + 1));
                out.push_str(&style.property_key(&key));
                out.push_str(": ");
                out.push_str(&literal(item, depth + 1, style));
                out.push_str(",\n");
            }
            out.push_str(&pad(depth));
            out.push('}');
            out
        }
    }
}

fn steps_export_name(job_id: &str) -> String {
    let base = match type_identifier(job_id) {
        Ok(type_ident) => {
            let mut chars = type_ident.chars();
            chars
                .next()
                .map(|c| c.to_ascii_lowercase().to_string() + chars.as_str())
                .unwrap_or_default()
        }
        Err(_) => "job".to_string(),
    };
    format!("{}Steps", base)
}

/// Rewrites one workflow document.
///
/// `origin` names the workflow in the header and in errors. Imports are made
/// relative to `module_dir`, the directory the module will be written to.
pub fn rewrite_workflow(
    yaml: &str,
    origin: &str,
    registry: &Registry,
    paths: &PathResolver,
    module_dir: &Path,
) -> Result<RewrittenWorkflow> {
    let parse_error = |message: String| Error::WorkflowParse {
        path: origin.to_string(),
        message,
    };
    let document: Value = serde_yaml::from_str(yaml).map_err(|e| parse_error(e.to_string()))?;
    let jobs = document
        .get("jobs")
        .and_then(Value::as_mapping)
        .ok_or_else(|| parse_error("no 'jobs' mapping".to_string()))?;

    let style = registry.codegen_options().style;

    // Local names for every referenced factory, in order of first use.
    let mut used: Vec<EntryKey> = Vec::new();
    for (_, job) in jobs {
        let steps = job.get("steps").and_then(Value::as_sequence);
        for step in steps.into_iter().flatten().filter_map(Value::as_mapping) {
            if let StepKind::Call(key) = classify(step, registry) {
                if !used.contains(&key) {
                    used.push(key);
                }
            }
        }
    }
    let originals: Vec<String> = used
        .iter()
        .filter_map(|key| registry.find(key))
        .map(|entry| call_identifier(&entry.generated_identifier))
        .collect();
    let locals = disambiguate(originals.clone(), &[]);
    let names: BTreeMap<EntryKey, (String, String)> = used
        .iter()
        .cloned()
        .zip(originals.into_iter().zip(locals))
        .collect();

    let module_dir = absolutize(module_dir);
    let mut imports: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, (original, local)) in &names {
        let Some(entry) = registry.find(key) else {
            continue;
        };
        let target = paths.from_output_relative(&entry.output_path);
        let relative = relative_path(&module_dir, &target)?;
        let relative = relative
            .strip_suffix(".ts")
            .unwrap_or(&relative)
            .to_string();
        let specifier = if relative.starts_with("../") {
            relative
        } else {
            format!("./{}", relative)
        };
        let binding = if original == local {
            original.clone()
        } else {
            format!("{} as {}", original, local)
        };
        imports.entry(specifier).or_default().push(binding);
    }

    let mut rewritten = 0;
    let mut unmatched = Vec::new();
    let mut exports = Vec::new();
    let mut body = Vec::new();

    for (job_id, job) in jobs {
        let Some(steps) = job.get("steps").and_then(Value::as_sequence) else {
            continue;
        };
        let job_id = key_text(job_id).unwrap_or_default();
        let export = steps_export_name(&job_id);

        let pad = " ".repeat(style.indent_width);
        let mut block = format!("export const {} = [\n", export);
        for step in steps {
            let rendered = match step.as_mapping() {
                Some(map) => match classify(map, registry) {
                    StepKind::Call(key) => {
                        rewritten += 1;
                        let local = names.get(&key).map(|(_, l)| l.as_str()).unwrap_or("");
                        render_call(local, map, &style)
                    }
                    StepKind::Unmatched(uses) => {
                        unmatched.push(uses);
                        literal(step, 1, &style)
                    }
                    StepKind::Plain => literal(step, 1, &style),
                },
                None => literal(step, 1, &style),
            };
            block.push_str(&pad);
            block.push_str(&rendered);
            block.push_str(",\n");
        }
        block.push_str("];\n");
        body.push(block);
        exports.push(export);
    }

    let mut source = format!("// Generated by action-synth from {}. Do not edit.\n", origin);
    if !imports.is_empty() {
        source.push('\n');
        for (specifier, bindings) in &imports {
            source.push_str(&format!(
                "import {{ {} }} from {};\n",
                bindings.join(", "),
                style.string_literal(specifier)
            ));
        }
    }
    for block in body {
        source.push('\n');
        source.push_str(&block);
    }

    Ok(RewrittenWorkflow {
        source,
        exports,
        rewritten,
        unmatched,
    })
}

fn render_call(local: &str, step: &Mapping, style: &Style) -> String {
    let with = step.get("with").cloned().unwrap_or(Value::Mapping(Mapping::new()));
    let mut overrides = Mapping::new();
    for (key, value) in step {
        match key.as_str() {
            Some("uses") | Some("with") => {}
            _ => {
                overrides.insert(key.clone(), value.clone());
            }
        }
    }

    let mut args = vec![literal(&with, 1, style)];
    if !overrides.is_empty() {
        args.push(literal(&Value::Mapping(overrides), 1, style));
    }
    format!("{}({})", local, args.join(", "))
}
