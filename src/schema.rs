//! # Action Schemas
//!
//! Reads the declarative schema (`action.yml` / `action.yaml`) of an action
//! from a working copy, and discovers every subpath of a repository that
//! hosts one.
//!
//! Inputs and outputs keep their declaration order so the generated code
//! reads like the schema it came from.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

use crate::defaults::{SCHEMA_FILENAMES, SKIPPED_DIRS};
use crate::error::{Error, Result};

/// A declared action input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<String>,
    pub deprecation_message: Option<String>,
}

/// A declared action output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub description: Option<String>,
}

/// The parsed schema of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub description: Option<String>,
    pub inputs: Vec<(String, InputSpec)>,
    pub outputs: Vec<(String, OutputSpec)>,
}

impl ActionSchema {
    /// True when at least one input must be supplied by the caller.
    pub fn has_required_input(&self) -> bool {
        self.inputs.iter().any(|(_, input)| input.required)
    }
}

#[derive(Deserialize)]
struct RawSchema {
    name: Option<Value>,
    description: Option<Value>,
    inputs: Option<Value>,
    outputs: Option<Value>,
}

/// Renders a YAML scalar as the text a user would have typed.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        other => serde_yaml::to_string(other)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}

fn is_required(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn entries(value: Option<Value>, origin: &str, section: &str) -> Result<Vec<(String, Mapping)>> {
    let mapping = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Mapping(m)) => m,
        Some(_) => {
            return Err(Error::SchemaParse {
                path: origin.to_string(),
                message: format!("'{}' must be a mapping", section),
            })
        }
    };

    let mut result = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = scalar_text(&key).ok_or_else(|| Error::SchemaParse {
            path: origin.to_string(),
            message: format!("'{}' contains an empty key", section),
        })?;
        let fields = match value {
            Value::Mapping(m) => m,
            _ => Mapping::new(),
        };
        result.push((key, fields));
    }
    Ok(result)
}

fn text_field(fields: &Mapping, name: &str) -> Option<String> {
    fields.get(name).and_then(scalar_text)
}

/// Parses schema text. `origin` names the file in error messages.
pub fn parse_schema(content: &str, origin: &str) -> Result<ActionSchema> {
    let raw: RawSchema = serde_yaml::from_str(content).map_err(|e| Error::SchemaParse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;

    let name = raw
        .name
        .as_ref()
        .and_then(scalar_text)
        .unwrap_or_default();

    let inputs = entries(raw.inputs, origin, "inputs")?
        .into_iter()
        .map(|(key, fields)| {
            let spec = InputSpec {
                description: text_field(&fields, "description"),
                required: is_required(fields.get("required")),
                default: text_field(&fields, "default"),
                deprecation_message: text_field(&fields, "deprecationMessage"),
            };
            (key, spec)
        })
        .collect();

    let outputs = entries(raw.outputs, origin, "outputs")?
        .into_iter()
        .map(|(key, fields)| {
            let spec = OutputSpec {
                description: text_field(&fields, "description"),
            };
            (key, spec)
        })
        .collect();

    Ok(ActionSchema {
        name,
        description: raw.description.as_ref().and_then(scalar_text),
        inputs,
        outputs,
    })
}

/// Loads the schema at `subpath` of a working copy.
pub fn load_schema(root: &Path, subpath: &str, org_repo: &str) -> Result<ActionSchema> {
    let dir = if subpath.is_empty() {
        root.to_path_buf()
    } else {
        root.join(subpath)
    };

    let file = SCHEMA_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::SchemaNotFound {
            org_repo: org_repo.to_string(),
            subpath: subpath.to_string(),
        })?;

    let content = fs::read_to_string(&file).map_err(|e| Error::SchemaParse {
        path: file.display().to_string(),
        message: e.to_string(),
    })?;

    let origin = if subpath.is_empty() {
        format!("{}/{}", org_repo, file_name(&file))
    } else {
        format!("{}/{}/{}", org_repo, subpath, file_name(&file))
    };
    parse_schema(&content, &origin)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Lists every subpath of `root` holding a schema file, sorted, with `""`
/// for the root itself. Version-control and dependency directories are
/// skipped.
pub fn discover_subpaths(root: &Path) -> Result<Vec<String>> {
    let mut found = BTreeSet::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(entry.file_type().is_dir()
                    && SKIPPED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
        });

    for entry in walker {
        let entry = entry.map_err(|e| Error::filesystem(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !SCHEMA_FILENAMES.contains(&name.as_ref()) {
            continue;
        }

        let parent = entry.path().parent().unwrap_or(root);
        let relative = parent.strip_prefix(root).unwrap_or(Path::new(""));
        let subpath = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        found.insert(subpath);
    }

    Ok(found.into_iter().collect())
}
