//! # Error Suggestions
//!
//! Helpers that build user-facing errors with hints. Errors should tell
//! users what went wrong AND how to fix it.
//!
//! ```rust,ignore
//! use action_synth::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Registry not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::registry_not_found(path));
//! ```

use std::path::Path;

use crate::synthesis::SynthesisReport;

/// The registry document does not exist.
pub fn registry_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Registry not found: {path}\n\n\
         hint: Run 'action-synth add <owner/repo>' to create it\n\
         hint: Use --registry to point at a different document\n\
         hint: Set the ACTION_SYNTH_REGISTRY environment variable",
        path = path.display()
    )
}

/// The action reference could not be parsed.
///
/// When the input carries a subpath, suggests the bare repository.
pub fn invalid_reference(input: &str, error: &crate::error::Error) -> anyhow::Error {
    let coordinate = input.trim().split('@').next().unwrap_or_default();
    let coordinate = ["https://github.com/", "http://github.com/", "github.com/"]
        .iter()
        .find_map(|prefix| coordinate.strip_prefix(prefix))
        .unwrap_or(coordinate);
    let segments: Vec<&str> = coordinate.split('/').filter(|s| !s.is_empty()).collect();

    let hint = if segments.len() > 2 {
        format!("hint: Did you mean '{}/{}'?", segments[0], segments[1])
    } else {
        "hint: Use owner/repo or owner/repo@ref (e.g., actions/checkout@v4)".to_string()
    };

    anyhow::anyhow!("{error}\n\n{hint}")
}

/// `org_repo` names no registered repository.
///
/// Suggests the closest registered name when there is one.
pub fn not_registered(org_repo: &str, registered: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = registered.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(org_repo, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "{org_repo} is not registered{did_you_mean}\n\n\
         hint: Run 'action-synth list' to see registered actions"
    )
}

/// Some or all schemas of a repository could not be synthesized.
pub fn partial_failure(report: &SynthesisReport) -> anyhow::Error {
    let details: Vec<String> = report
        .failures
        .iter()
        .map(|f| {
            let location = if f.action_path.is_empty() {
                "(root)"
            } else {
                f.action_path.as_str()
            };
            format!("  {location}: {}", f.message)
        })
        .collect();

    anyhow::anyhow!(
        "{count} action(s) in {org_repo} could not be synthesized:\n{details}\n\n\
         hint: The remaining actions were generated and registered\n\
         hint: Run with --log-level debug for details",
        count = report.failures.len(),
        org_repo = report.org_repo,
        details = details.join("\n")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
