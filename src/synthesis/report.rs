//! Machine-readable summaries of a synthesis pass.

use serde::Serialize;

/// Overall result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every discovered schema was synthesized.
    Complete,
    /// Some schemas were synthesized, others failed.
    Partial,
    /// Nothing was synthesized.
    Failed,
}

/// One module written by the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAction {
    /// Subpath inside the repository, empty for the root.
    pub action_path: String,
    pub identifier: String,
    pub output_path: String,
}

/// A schema that could not be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFailure {
    pub action_path: String,
    pub message: String,
}

/// Summary of one add, update, or remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisReport {
    pub org_repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_revision: Option<String>,
    pub generated: Vec<GeneratedAction>,
    pub failures: Vec<SchemaFailure>,
    /// Output paths of modules deleted by the pass.
    pub removed: Vec<String>,
    /// Every path (relative to the output root) written or deleted,
    /// including aggregation files.
    pub touched: Vec<String>,
}

impl SynthesisReport {
    pub fn new(org_repo: impl Into<String>) -> Self {
        Self {
            org_repo: org_repo.into(),
            ..Self::default()
        }
    }

    pub fn outcome(&self) -> Outcome {
        match (self.failures.is_empty(), self.generated.is_empty()) {
            (true, _) => Outcome::Complete,
            (false, false) => Outcome::Partial,
            (false, true) => Outcome::Failed,
        }
    }

    /// Records a touched path once, keeping the list sorted.
    pub fn touch(&mut self, path: impl Into<String>) {
        let path = path.into();
        if let Err(at) = self.touched.binary_search(&path) {
            self.touched.insert(at, path);
        }
    }
}
