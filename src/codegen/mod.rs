//! # Schema-to-Code Synthesis
//!
//! Turns one parsed [`ActionSchema`] into the source of a TypeScript module
//! exposing a typed factory for the action's step.
//!
//! ## Process
//!
//! 1. **Identify**: derive a type-style and a call-style identifier from the
//!    declared name (see [`naming`]).
//! 2. **Declare**: emit an `<Ident>Inputs` interface, with required members
//!    where the schema marks them required, and an `<Ident>Outputs` interface.
//! 3. **Call**: emit the factory, which merges explicit defaults, caller
//!    inputs and step overrides and forwards them to the runtime `uses`
//!    helper with the pinned reference as its default ref.
//!
//! Rendering is a pure function of its arguments: identical input yields
//! byte-identical text.

pub mod naming;
pub mod typescript;

use crate::defaults::DEFAULT_GIT_BASE;
use crate::error::{Error, Result};
use crate::schema::{ActionSchema, InputSpec};

pub use typescript::Style;
use typescript::{comment_lines, Emitter};

/// Options that shape every generated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Default the factory's ref to the immutable id rather than the display version.
    pub pin: bool,
    /// Module specifier the runtime helpers are imported from.
    pub runtime_module: String,
    pub style: Style,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            pin: true,
            runtime_module: crate::defaults::DEFAULT_RUNTIME_MODULE.to_string(),
            style: Style::default(),
        }
    }
}

/// Coordinates of the action a module is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTarget<'a> {
    pub org_repo: &'a str,
    pub subpath: &'a str,
    pub immutable_id: &'a str,
    pub display_version: &'a str,
}

impl ActionTarget<'_> {
    /// The `uses:` coordinate, `owner/repo[/subpath]`.
    pub fn action_path(&self) -> String {
        if self.subpath.is_empty() {
            self.org_repo.to_string()
        } else {
            format!("{}/{}", self.org_repo, self.subpath)
        }
    }

    /// Browsable link to the schema at the display version.
    pub fn source_link(&self) -> String {
        let mut link = format!(
            "{}/{}/tree/{}",
            DEFAULT_GIT_BASE, self.org_repo, self.display_version
        );
        if !self.subpath.is_empty() {
            link.push('/');
            link.push_str(self.subpath);
        }
        link
    }
}

/// A rendered module and the identifiers it exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    pub type_identifier: String,
    pub call_identifier: String,
    pub source: String,
}

/// Derives identifiers for `schema` and renders its module.
///
/// `shared` tells whether other schemas live in the same repository, in
/// which case the subpath becomes part of the identifier.
pub fn generate(
    schema: &ActionSchema,
    target: &ActionTarget<'_>,
    identity_override: Option<&str>,
    shared: bool,
    options: &CodegenOptions,
) -> Result<GeneratedModule> {
    let ident = naming::derive_identifier(
        &schema.name,
        identity_override,
        target.subpath,
        shared,
        target.org_repo,
    )
    .map_err(|e| match e {
        Error::Codegen { message, .. } => Error::Codegen {
            org_repo: target.action_path(),
            message,
        },
        other => other,
    })?;
    Ok(render(schema, target, &ident, options))
}

/// Renders a module under an already chosen type-style identifier.
pub fn render(
    schema: &ActionSchema,
    target: &ActionTarget<'_>,
    type_ident: &str,
    options: &CodegenOptions,
) -> GeneratedModule {
    let style = &options.style;
    let call_ident = naming::call_identifier(type_ident);
    let inputs_type = format!("{}Inputs", type_ident);
    let outputs_type = format!("{}Outputs", type_ident);
    let default_ref = if options.pin {
        target.immutable_id
    } else {
        target.display_version
    };

    let mut out = Emitter::new(style);

    out.line(
        0,
        &format!(
            "// Generated by action-synth from {}@{}. Do not edit.",
            target.action_path(),
            target.display_version
        ),
    );
    out.line(0, &format!("// Pinned revision: {}", target.immutable_id));
    out.line(0, &format!("// Source: {}", target.source_link()));
    out.blank();

    let runtime = style.string_literal(&options.runtime_module);
    out.line(0, &format!("import {{ uses }} from {};", runtime));
    out.line(
        0,
        &format!(
            "import type {{ ActionInput, Step, StepOverride }} from {};",
            runtime
        ),
    );
    out.blank();

    if schema.inputs.is_empty() {
        out.line(0, &format!("export interface {} {{}}", inputs_type));
    } else {
        out.line(0, &format!("export interface {} {{", inputs_type));
        for (key, input) in &schema.inputs {
            out.doc(1, &input_doc(input, style));
            let marker = if input.required { "" } else { "?" };
            out.line(
                1,
                &format!("{}{}: ActionInput;", style.property_key(key), marker),
            );
        }
        out.line(0, "}");
    }
    out.blank();

    if schema.outputs.is_empty() {
        out.line(0, &format!("export interface {} {{}}", outputs_type));
    } else {
        out.line(0, &format!("export interface {} {{", outputs_type));
        for (key, output) in &schema.outputs {
            let lines = output
                .description
                .as_deref()
                .map(comment_lines)
                .unwrap_or_default();
            out.doc(1, &lines);
            out.line(1, &format!("{}: string;", style.property_key(key)));
        }
        out.line(0, "}");
    }
    out.blank();

    if let Some(description) = schema.description.as_deref() {
        out.doc(0, &comment_lines(description));
    }
    let inputs_param = if schema.has_required_input() {
        format!("inputs: {},", inputs_type)
    } else {
        format!("inputs: {} = {{}},", inputs_type)
    };
    out.line(0, &format!("export function {}(", call_ident));
    out.line(1, &inputs_param);
    out.line(1, "override: Partial<StepOverride> = {},");
    out.line(1, &format!("ref: string = {},", style.string_literal(default_ref)));
    out.line(0, &format!("): Step<{}> {{", outputs_type));
    out.line(1, &format!("return uses<{}>(", outputs_type));
    out.line(2, &format!("{},", style.string_literal(&target.action_path())));

    let defaults: Vec<(&String, &String)> = schema
        .inputs
        .iter()
        .filter_map(|(key, input)| input.default.as_ref().map(|d| (key, d)))
        .collect();
    if defaults.is_empty() {
        out.line(2, "{ ...override, with: inputs },");
    } else {
        out.line(2, "{");
        out.line(3, "...override,");
        out.line(3, "with: {");
        for (key, value) in defaults {
            out.line(
                4,
                &format!(
                    "{}: {},",
                    style.property_key(key),
                    style.string_literal(value)
                ),
            );
        }
        out.line(4, "...inputs,");
        out.line(3, "},");
        out.line(2, "},");
    }
    out.line(2, "ref,");
    out.line(1, ");");
    out.line(0, "}");

    GeneratedModule {
        type_identifier: type_ident.to_string(),
        call_identifier: call_ident,
        source: out.finish(),
    }
}

fn input_doc(input: &InputSpec, style: &Style) -> Vec<String> {
    let mut lines = input
        .description
        .as_deref()
        .map(comment_lines)
        .unwrap_or_default();

    let mut tags = Vec::new();
    if let Some(default) = input.default.as_deref() {
        tags.push(format!("@default {}", style.string_literal(default)));
    }
    if let Some(message) = input.deprecation_message.as_deref() {
        let message = comment_lines(message).join(" ");
        tags.push(format!("@deprecated {}", message).trim_end().to_string());
    }

    if !lines.is_empty() && !tags.is_empty() {
        lines.push(String::new());
    }
    lines.extend(tags);
    lines
}
