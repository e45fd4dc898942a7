//! # Registry
//!
//! The registry document records every synthesized action: which repository
//! and subpath it came from, the revision it is pinned to, and where its
//! module was written.
//!
//! ## Key Components
//!
//! - **`Registry`**: the in-memory document. It always has the same shape
//!   whatever serialized form it was read from.
//! - **`RegistryFormat`**: JSON, TOML, or YAML, chosen from the file
//!   extension. The form found on load is the form written back.
//! - **`RegistryStore`**: binds a document path to its [`PathResolver`] and
//!   performs the load, migrate, and save steps.
//!
//! ## Migration
//!
//! Documents written by older versions, or written by hand, are accepted as
//! long as they parse. Missing top-level fields receive their defaults,
//! legacy key names are renamed, and entries that lack a required key are
//! dropped with a warning. A document that does not parse is reported as
//! corrupt and never rewritten.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codegen::{CodegenOptions, Style};
use crate::defaults::{DEFAULT_OUTPUT_DIR, DEFAULT_RUNTIME_MODULE, REGISTRY_VERSION, TOKEN_ENV_VAR};
use crate::error::{Error, Result};
use crate::filesystem;
use crate::paths::PathResolver;

/// Where the credential for provider access comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    /// The caller's flag, then the well-known environment variable.
    #[default]
    Env,
    /// Only a token supplied explicitly by the caller.
    Config,
}

/// Text layout of generated modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Formatting {
    pub indent_width: usize,
    pub single_quote: bool,
    /// External pretty-printer, run with the written files appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            indent_width: 2,
            single_quote: true,
            command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub token_source: TokenSource,
    pub pin: bool,
    pub runtime_module: String,
    pub formatting: Formatting,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            token_source: TokenSource::Env,
            pin: true,
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
            formatting: Formatting::default(),
        }
    }
}

impl Options {
    /// The credential for provider access.
    ///
    /// An explicit token always wins. Otherwise the well-known environment
    /// variable is consulted only when `tokenSource` is `env`. `None` means
    /// unauthenticated access.
    pub fn token(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
            return Some(token.trim().to_string());
        }
        match self.token_source {
            TokenSource::Env => std::env::var(TOKEN_ENV_VAR)
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            TokenSource::Config => None,
        }
    }
}

/// The identity of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub org_repo: String,
    /// Subpath inside the repository, empty for the root.
    pub action_path: String,
}

impl EntryKey {
    pub fn new(org_repo: impl Into<String>, action_path: impl Into<String>) -> Self {
        Self {
            org_repo: org_repo.into(),
            action_path: action_path.into(),
        }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.action_path.is_empty() {
            write!(f, "{}", self.org_repo)
        } else {
            write!(f, "{}/{}", self.org_repo, self.action_path)
        }
    }
}

/// One synthesized action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub org_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_path: Option<String>,
    pub pinned_revision: String,
    pub display_version: String,
    pub generated_identifier: String,
    /// Relative to the output root, `/`-separated.
    pub output_path: String,
}

impl RegistryEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.org_repo.clone(), self.subpath())
    }

    /// The subpath, empty for the repository root.
    pub fn subpath(&self) -> &str {
        self.action_path.as_deref().unwrap_or("")
    }
}

/// The registry document.
///
/// Field order matters for the TOML form: plain values come before tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub version: String,
    pub output_dir: String,
    /// Plugin declarations, kept as written.
    #[serde(default)]
    pub plugins: Vec<Value>,
    #[serde(default)]
    pub stacks: Vec<Value>,
    #[serde(default)]
    pub actions: Vec<RegistryEntry>,
    #[serde(default)]
    pub options: Options,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            plugins: Vec::new(),
            stacks: Vec::new(),
            actions: Vec::new(),
            options: Options::default(),
        }
    }
}

fn compare_entries(a: &RegistryEntry, b: &RegistryEntry) -> Ordering {
    a.org_repo
        .cmp(&b.org_repo)
        .then_with(|| a.subpath().cmp(b.subpath()))
}

impl Registry {
    /// Inserts `entry`, replacing any entry with the same key.
    ///
    /// Returns the replaced entry.
    pub fn upsert_entry(&mut self, entry: RegistryEntry) -> Option<RegistryEntry> {
        let key = entry.key();
        let previous = self.remove_entry(&key);
        self.actions.push(entry);
        self.sort_entries();
        previous
    }

    /// Removes every entry with `key`, returning the first one removed.
    pub fn remove_entry(&mut self, key: &EntryKey) -> Option<RegistryEntry> {
        let mut removed = None;
        self.actions.retain(|entry| {
            if entry.key() == *key {
                if removed.is_none() {
                    removed = Some(entry.clone());
                }
                false
            } else {
                true
            }
        });
        self.sort_entries();
        removed
    }

    pub fn find(&self, key: &EntryKey) -> Option<&RegistryEntry> {
        self.actions.iter().find(|entry| entry.key() == *key)
    }

    /// Entries of one repository, in subpath order.
    pub fn entries_for(&self, org_repo: &str) -> Vec<&RegistryEntry> {
        self.actions
            .iter()
            .filter(|entry| entry.org_repo == org_repo)
            .collect()
    }

    /// Distinct registered repositories, sorted.
    pub fn repositories(&self) -> Vec<String> {
        let mut repos: Vec<String> = self.actions.iter().map(|e| e.org_repo.clone()).collect();
        repos.sort();
        repos.dedup();
        repos
    }

    pub fn sort_entries(&mut self) {
        self.actions.sort_by(compare_entries);
    }

    /// Code generation settings declared by this document.
    pub fn codegen_options(&self) -> CodegenOptions {
        CodegenOptions {
            pin: self.options.pin,
            runtime_module: self.options.runtime_module.clone(),
            style: Style {
                indent_width: self.options.formatting.indent_width,
                single_quote: self.options.formatting.single_quote,
            },
        }
    }
}

/// Serialized form of a registry document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Toml,
    Yaml,
}

impl RegistryFormat {
    /// Picks the form from a file extension. Unknown extensions are JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => RegistryFormat::Toml,
            Some("yaml") | Some("yml") => RegistryFormat::Yaml,
            _ => RegistryFormat::Json,
        }
    }

    fn parse(self, content: &str) -> std::result::Result<Value, String> {
        match self {
            RegistryFormat::Json => {
                if content.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(content).map_err(|e| e.to_string())
            }
            RegistryFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            RegistryFormat::Yaml => {
                serde_yaml::from_str::<Option<Value>>(content)
                    .map(|v| v.unwrap_or(Value::Null))
                    .map_err(|e| e.to_string())
            }
        }
    }

    fn render(self, registry: &Registry, path: &Path) -> Result<String> {
        let rendered = match self {
            RegistryFormat::Json => serde_json::to_string_pretty(registry)?,
            RegistryFormat::Toml => {
                toml::to_string_pretty(registry).map_err(|e| Error::Filesystem {
                    path: path.display().to_string(),
                    message: format!("cannot serialize registry as TOML: {}", e),
                })?
            }
            RegistryFormat::Yaml => serde_yaml::to_string(registry)?,
        };
        if rendered.ends_with('\n') {
            Ok(rendered)
        } else {
            Ok(rendered + "\n")
        }
    }
}

const LEGACY_TOP_LEVEL: &[(&str, &str)] = &[
    ("schemaVersion", "version"),
    ("outputRoot", "outputDir"),
    ("entries", "actions"),
    ("extensionHooks", "plugins"),
];

const LEGACY_ENTRY: &[(&str, &str)] = &[
    ("repo", "orgRepo"),
    ("path", "actionPath"),
    ("sha", "pinnedRevision"),
    ("ref", "displayVersion"),
    ("name", "generatedIdentifier"),
];

const REQUIRED_ENTRY_KEYS: &[&str] = &[
    "orgRepo",
    "pinnedRevision",
    "generatedIdentifier",
    "outputPath",
];

fn rename_legacy(object: &mut Map<String, Value>, renames: &[(&str, &str)]) {
    for (legacy, current) in renames {
        if object.contains_key(*current) {
            continue;
        }
        if let Some(value) = object.remove(*legacy) {
            object.insert((*current).to_string(), value);
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn migrate_entry(index: usize, value: Value) -> Option<Value> {
    let Value::Object(mut entry) = value else {
        warn!("Dropping registry entry #{}: not a mapping", index);
        return None;
    };
    rename_legacy(&mut entry, LEGACY_ENTRY);

    for key in REQUIRED_ENTRY_KEYS {
        match entry.get(*key).and_then(scalar_string) {
            Some(text) if !text.is_empty() => {
                entry.insert((*key).to_string(), Value::String(text));
            }
            _ => {
                warn!("Dropping registry entry #{}: missing '{}'", index, key);
                return None;
            }
        }
    }

    let display = entry.get("displayVersion").and_then(scalar_string);
    let display = display.or_else(|| entry.get("pinnedRevision").and_then(scalar_string));
    if let Some(display) = display {
        entry.insert("displayVersion".to_string(), Value::String(display));
    }

    let action_path = entry
        .get("actionPath")
        .and_then(scalar_string)
        .map(|p| p.trim_matches('/').to_string());
    match action_path {
        Some(path) if !path.is_empty() => {
            entry.insert("actionPath".to_string(), Value::String(path));
        }
        _ => {
            entry.remove("actionPath");
        }
    }

    Some(Value::Object(entry))
}

/// Fills defaults, renames legacy keys, and drops unusable entries.
pub fn migrate(document: Value, origin: &Path) -> Result<Registry> {
    let mut object = match document {
        Value::Null => Map::new(),
        Value::Object(object) => object,
        _ => {
            return Err(Error::RegistryCorrupt {
                path: origin.display().to_string(),
                message: "the document is not a mapping".to_string(),
                hint: None,
            })
        }
    };
    rename_legacy(&mut object, LEGACY_TOP_LEVEL);

    let version = object
        .get("version")
        .and_then(scalar_string)
        .unwrap_or_else(|| REGISTRY_VERSION.to_string());
    object.insert("version".to_string(), Value::String(version));

    let output_dir = object
        .get("outputDir")
        .and_then(scalar_string)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());
    object.insert("outputDir".to_string(), Value::String(output_dir));

    for list in ["plugins", "stacks"] {
        if !matches!(object.get(list), Some(Value::Array(_))) {
            object.insert(list.to_string(), Value::Array(Vec::new()));
        }
    }

    let actions = match object.remove("actions") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| migrate_entry(i, item))
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!("Ignoring 'actions' in {}: not a list", origin.display());
            Vec::new()
        }
    };
    object.insert("actions".to_string(), Value::Array(actions));

    if !matches!(object.get("options"), Some(Value::Object(_))) {
        object.remove("options");
    }

    let raw: Registry =
        serde_json::from_value(Value::Object(object)).map_err(|e| Error::RegistryCorrupt {
            path: origin.display().to_string(),
            message: e.to_string(),
            hint: Some("Check the types of the fields under 'options' and 'actions'".to_string()),
        })?;

    // One entry per key; the last occurrence in the document wins.
    let mut registry = Registry {
        actions: Vec::with_capacity(raw.actions.len()),
        ..raw.clone()
    };
    for entry in raw.actions {
        if registry.find(&entry.key()).is_some() {
            warn!("Duplicate registry entry for {}; keeping the later one", entry.key());
        }
        registry.upsert_entry(entry);
    }
    Ok(registry)
}

/// A registry document on disk together with its derived paths.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    format: RegistryFormat,
    resolver: PathResolver,
}

impl RegistryStore {
    /// Binds a store to `path`. Nothing is read yet.
    pub fn new(path: &Path) -> Self {
        Self {
            format: RegistryFormat::from_path(path),
            resolver: PathResolver::new(path, DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn path(&self) -> &Path {
        self.resolver.document_path()
    }

    pub fn format(&self) -> RegistryFormat {
        self.format
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Points the store at another document, dropping cached paths.
    pub fn set_path(&mut self, path: &Path) {
        self.format = RegistryFormat::from_path(path);
        self.resolver.set_document_path(path);
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Reads and migrates the document. A missing document is the default
    /// registry.
    pub fn load(&mut self) -> Result<Registry> {
        let path: PathBuf = self.path().to_path_buf();
        let registry = match fs::read_to_string(&path) {
            Ok(content) => {
                let document = self
                    .format
                    .parse(&content)
                    .map_err(|message| Error::RegistryCorrupt {
                        path: path.display().to_string(),
                        message,
                        hint: Some("Fix the syntax error by hand; the document is never rewritten while it is unreadable".to_string()),
                    })?;
                migrate(document, &path)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No registry at {}; starting empty", path.display());
                Registry::default()
            }
            Err(e) => return Err(Error::filesystem(&path, e)),
        };
        self.resolver.set_output_dir(&registry.output_dir);
        Ok(registry)
    }

    /// Sorts the entries and writes the document back in its own form.
    pub fn save(&mut self, registry: &mut Registry) -> Result<()> {
        registry.sort_entries();
        let path = self.path().to_path_buf();
        let text = self.format.render(registry, &path)?;
        filesystem::atomic_write(&path, text.as_bytes())?;
        debug!("Saved registry {}", path.display());
        self.resolver.set_output_dir(&registry.output_dir);
        Ok(())
    }
}
