//! # action-synth Library
//!
//! Turns reusable CI actions, each described by a declarative `action.yml`
//! schema in a hosted repository, into strongly typed TypeScript factories,
//! and keeps a project's generated tree in agreement with a registry
//! document.
//!
//! It backs the `action-synth` command-line tool but can be embedded: every
//! network and `git` access goes through the provider traits in
//! [`provider`], which have in-memory stand-ins.
//!
//! ## Quick Example
//!
//! ```
//! use action_synth::provider::MemoryRevisionProvider;
//! use action_synth::reference::ActionReference;
//! use action_synth::resolver::RevisionResolver;
//!
//! let provider = MemoryRevisionProvider::new()
//!     .with_tag("actions/checkout", "v4.2.0", "sha-420")
//!     .with_tag("actions/checkout", "v4", "sha-4");
//!
//! let reference = ActionReference::parse("actions/checkout").unwrap();
//! let resolved = RevisionResolver::new(&provider).resolve(&reference).unwrap();
//!
//! // A bare reference prefers the newest major tag.
//! assert_eq!(resolved.resolved_ref, "v4");
//! assert_eq!(resolved.immutable_id, "sha-4");
//! ```
//!
//! ## Core Concepts
//!
//! - **References (`reference`)**: `owner/repo[@ref]` strings.
//! - **Revision resolution (`resolver`, `version`)**: picks a display
//!   version and an immutable commit id for a reference.
//! - **Providers (`provider`, `git`, `cache`)**: repository metadata and
//!   working copies, backed by the system `git`.
//! - **Schemas (`schema`)**: discovery and loading of `action.yml` files.
//! - **Code generation (`codegen`)**: one TypeScript module per schema.
//! - **Registry (`registry`, `paths`)**: the persisted list of synthesized
//!   actions and the paths derived from its location.
//! - **Tree synthesis (`synthesis`)**: add, update, and remove, keeping the
//!   output tree, its aggregation files, and the registry consistent.
//! - **Step rewriting (`rewrite`)**: converts workflow files into modules
//!   that call the generated factories.
//!
//! ## Execution Flow
//!
//! Adding a repository runs these steps:
//!
//! 1.  **Resolve**: the reference becomes a display version and an
//!     immutable id.
//! 2.  **Checkout**: the repository is materialized at the immutable id.
//! 3.  **Discover**: every action schema in the checkout is found and parsed.
//! 4.  **Generate**: each schema is rendered to a module with a unique
//!     identifier.
//! 5.  **Replace**: the repository's previous modules are deleted and the
//!     new ones written.
//! 6.  **Aggregate**: barrel files are rebuilt from what is on disk.
//! 7.  **Persist**: the caller saves the registry document.

pub mod cache;
pub mod codegen;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod output;
pub mod paths;
pub mod provider;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod rewrite;
pub mod schema;
pub mod suggestions;
pub mod synthesis;
pub mod version;

#[cfg(test)]
mod paths_proptest;
