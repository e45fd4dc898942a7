//! Identifier derivation for generated code.
//!
//! A declared action name (or a caller-supplied override) is broken into
//! words at every non-alphanumeric character. Each word is title-cased (upper
//! first letter, lower rest) and the words are concatenated into a type-style
//! identifier: `Setup node` gives `SetupNode`, `AWS CLI` gives `AwsCli`.
//! Lower-casing the first character gives the call-style identifier
//! (`setupNode`).

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Words the generated factory can never be named after.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "let", "static", "await", "uses",
];

fn property_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static pattern"))
}

/// Splits text into alphanumeric words.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}

/// Type-style identifier for free text, e.g. `"Setup Node.js"` -> `SetupNodeJs`.
pub fn type_identifier(text: &str) -> Result<String> {
    let ident: String = words(text).iter().map(|w| title_case(w)).collect();
    if ident.is_empty() {
        return Err(Error::Codegen {
            org_repo: String::new(),
            message: format!("'{}' contains no letters or digits", text),
        });
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(format!("_{}", ident));
    }
    Ok(ident)
}

/// Call-style identifier for a type-style one: `SetupNode` -> `setupNode`.
pub fn call_identifier(type_ident: &str) -> String {
    let mut chars = type_ident.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    };
    if RESERVED.contains(&lowered.as_str()) {
        format!("{}Action", lowered)
    } else {
        lowered
    }
}

/// Text the identifier of one schema is derived from.
///
/// When several schemas share a repository the subpath is appended as extra
/// words so that sibling identifiers stay distinct.
pub fn identity_text(name: &str, identity_override: Option<&str>, subpath: &str, shared: bool) -> String {
    let base = identity_override
        .filter(|o| !o.trim().is_empty())
        .unwrap_or(name);
    if shared && !subpath.is_empty() {
        format!("{} {}", base, subpath)
    } else {
        base.to_string()
    }
}

/// Derives the type-style identifier of one schema.
///
/// Falls back to the repository name when the schema declares no usable name.
pub fn derive_identifier(
    name: &str,
    identity_override: Option<&str>,
    subpath: &str,
    shared: bool,
    org_repo: &str,
) -> Result<String> {
    let text = identity_text(name, identity_override, subpath, shared);
    type_identifier(&text).or_else(|_| {
        let repo = crate::reference::split_org_repo(org_repo).1;
        let fallback = identity_text(repo, None, subpath, shared);
        type_identifier(&fallback).map_err(|_| Error::Codegen {
            org_repo: org_repo.to_string(),
            message: format!("cannot derive an identifier from '{}'", text),
        })
    })
}

/// Makes identifiers unique, in order, by appending a counter to repeats.
///
/// The first occurrence keeps its identifier unless `reserved` already holds
/// it; repeats become `Name2`, `Name3`, and so on, skipping any name taken.
pub fn disambiguate(idents: Vec<String>, reserved: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = reserved.iter().map(|r| (r.clone(), 1)).collect();
    let mut taken: HashSet<String> = idents.iter().chain(reserved).cloned().collect();
    let mut result = Vec::with_capacity(idents.len());

    for ident in idents {
        let count = seen.entry(ident.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            result.push(ident);
            continue;
        }
        let mut n = *count;
        let mut candidate = format!("{}{}", ident, n);
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{}{}", ident, n);
        }
        *count = n;
        taken.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

/// True when `key` can be written as a bare object property.
pub fn is_plain_property(key: &str) -> bool {
    property_pattern().is_match(key)
}
