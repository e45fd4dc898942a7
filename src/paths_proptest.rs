//! Property-based tests for path resolution and identifier derivation.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::codegen::naming::{call_identifier, type_identifier};
    use crate::paths::{encode_path_component, normalize, PathResolver};
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z0-9_-]{1,12}".prop_map(|s| s),
            Just(".".to_string()),
            Just("..".to_string()),
        ]
    }

    // ============================================================================
    // PathResolver property tests
    // ============================================================================

    proptest! {
        /// Property: any path under the output root survives to-relative and back
        #[test]
        fn output_relative_round_trip(segments in prop::collection::vec("[a-z0-9_-]{1,12}", 1..6)) {
            let resolver = PathResolver::new(
                Path::new("/work/project/.action-synth/actions.json"),
                "generated/actions",
            );
            let mut file = resolver.output_root().to_path_buf();
            for s in &segments {
                file.push(s);
            }
            file.set_extension("ts");

            let relative = resolver.to_output_relative(&file).unwrap();
            prop_assert!(!relative.contains('\\'));
            prop_assert_eq!(resolver.from_output_relative(&relative), normalize(&file));
        }

        /// Property: round trip yields the canonical form even with `.` and `..`
        #[test]
        fn output_relative_round_trip_canonical(segments in prop::collection::vec(segment(), 1..8)) {
            let resolver = PathResolver::new(
                Path::new("/work/project/.action-synth/actions.json"),
                "generated/actions",
            );
            let mut file = resolver.output_root().to_path_buf();
            for s in &segments {
                file.push(s);
            }

            let relative = resolver.to_output_relative(&file).unwrap();
            prop_assert_eq!(resolver.from_output_relative(&relative), normalize(&file));
        }

        /// Property: document-relative conversion round trips too
        #[test]
        fn document_relative_round_trip(segments in prop::collection::vec("[a-z0-9_-]{1,12}", 1..6)) {
            let resolver = PathResolver::new(
                Path::new("/work/project/.action-synth/actions.yaml"),
                "out",
            );
            let file: PathBuf = segments.iter().fold(PathBuf::from("/work"), |p, s| p.join(s));

            let relative = resolver.to_document_relative(&file).unwrap();
            prop_assert_eq!(resolver.from_document_relative(&relative), normalize(&file));
        }

        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(segments in prop::collection::vec(segment(), 0..8)) {
            let path: PathBuf = segments.iter().fold(PathBuf::from("/"), |p, s| p.join(s));
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: encoded components never contain separators
        #[test]
        fn encode_path_component_has_no_separators(input in ".*") {
            let result = encode_path_component(&input);
            prop_assert!(!result.contains('/'));
            prop_assert!(!result.contains('\\'));
            prop_assert_eq!(result.chars().count(), input.chars().count());
        }
    }

    // ============================================================================
    // Identifier property tests
    // ============================================================================

    proptest! {
        /// Property: derived identifiers are alphanumeric and start with a letter
        #[test]
        fn identifiers_are_valid(words in "[ -~]{0,40}") {
            if let Ok(ident) = type_identifier(&words) {
                prop_assert!(ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
                prop_assert!(ident.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_'));
                let call = call_identifier(&ident);
                prop_assert!(call.to_lowercase().starts_with(&ident.to_lowercase()));
                prop_assert!(call.chars().next().is_some_and(|c| !c.is_ascii_uppercase()));
            }
        }

        /// Property: identifier derivation is deterministic
        #[test]
        fn identifiers_are_deterministic(words in "[ -~]{0,40}") {
            let first = type_identifier(&words).ok();
            let second = type_identifier(&words).ok();
            prop_assert_eq!(first, second);
        }
    }
}
