//! Property-based tests for specifier normalization and document merging.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::merge::json::NativeMerger;
    use crate::merge::merge_to_string;
    use crate::permissions::{PermissionBatch, PermissionMode};
    use crate::specifier::{normalize, RepoSpec};
    use crate::validate::Validator;
    use proptest::prelude::*;

    const OWNER: &str = "[A-Za-z0-9][A-Za-z0-9-]{0,10}[A-Za-z0-9]";
    const NAME: &str = "[A-Za-z0-9_-][A-Za-z0-9._-]{0,15}[A-Za-z0-9_-]";
    const BRANCH: &str = "[a-z][a-z0-9-]{0,10}";

    fn spec_strategy() -> impl Strategy<Value = RepoSpec> {
        // a name ending in ".git" loses the suffix on purpose
        let name = NAME.prop_filter("name must not end with .git", |name: &String| {
            !name.ends_with(".git")
        });
        (OWNER, name, proptest::option::of(BRANCH)).prop_map(|(owner, name, branch)| {
            let spec = RepoSpec::new(owner, name);
            match branch {
                Some(branch) => spec.with_branch(branch),
                None => spec,
            }
        })
    }

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing the display form of a spec gives the spec back
        #[test]
        fn normalize_display_roundtrips(spec in spec_strategy()) {
            let parsed = normalize(&spec.to_string()).unwrap();
            prop_assert_eq!(parsed, spec);
        }

        /// Property: URL prefix, `.git` suffix, trailing slash and trailing
        /// words never change the result
        #[test]
        fn normalize_ignores_decorations(spec in spec_strategy(), extra in "[a-z]{1,8}") {
            let decorated = match &spec.branch {
                Some(branch) => format!(
                    "https://github.com/{}/{}.git/@{} {}",
                    spec.owner, spec.name, branch, extra
                ),
                None => format!("https://github.com/{}/{}.git/ {}", spec.owner, spec.name, extra),
            };
            prop_assert_eq!(normalize(&decorated).unwrap(), spec);
        }

        /// Property: a normalized key has exactly one '/' and no '@'
        #[test]
        fn normalized_key_has_one_slash(spec in spec_strategy()) {
            let key = normalize(&spec.to_string()).unwrap().key();
            prop_assert_eq!(key.matches('/').count(), 1);
            prop_assert!(!key.contains('@'));
        }

        /// Property: normalize never panics
        #[test]
        fn normalize_never_panics(input in ".*") {
            let _ = normalize(&input);
        }

        /// Property: the reserved owner is always rejected
        #[test]
        fn datasets_owner_is_rejected(name in NAME, branch in proptest::option::of(BRANCH)) {
            let mut spec = RepoSpec::new("datasets", name);
            spec.branch = branch;
            prop_assert!(!Validator::new().unwrap().validate(&spec));
        }
    }

    // ============================================================================
    // merge property tests
    // ============================================================================

    fn mode_strategy() -> impl Strategy<Value = PermissionMode> {
        prop_oneof![
            Just(PermissionMode::Default),
            Just(PermissionMode::All),
            Just(PermissionMode::Contents),
        ]
    }

    proptest! {
        /// Property: merging the same batch twice equals merging it once
        #[test]
        fn merge_is_idempotent(
            specs in proptest::collection::vec(spec_strategy(), 1..6),
            mode in mode_strategy(),
        ) {
            let batch = PermissionBatch::uniform(&specs, mode.permission_set());
            let once = merge_to_string(&NativeMerger, None, &batch).unwrap();
            let twice = merge_to_string(&NativeMerger, Some(&once), &batch).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: unrelated top-level keys survive the merge unchanged
        #[test]
        fn merge_preserves_other_keys(
            specs in proptest::collection::vec(spec_strategy(), 1..4),
            keys in proptest::collection::btree_map("[a-z]{1,8}", "[a-z0-9 ]{0,12}", 0..5),
        ) {
            let mut document = serde_json::Map::new();
            for (key, value) in &keys {
                if key != "customizations" {
                    document.insert(key.clone(), serde_json::Value::String(value.clone()));
                }
            }
            let existing = serde_json::Value::Object(document.clone()).to_string();
            let batch = PermissionBatch::uniform(&specs, PermissionMode::Default.permission_set());

            let merged: serde_json::Value = serde_json::from_str(
                &merge_to_string(&NativeMerger, Some(&existing), &batch).unwrap(),
            )
            .unwrap();

            for (key, value) in &document {
                prop_assert_eq!(&merged[key.as_str()], value);
            }
            for spec in &specs {
                prop_assert!(
                    merged["customizations"]["codespaces"]["repositories"][spec.key().as_str()]
                        .is_object()
                );
            }
        }
    }
}
