//! Property-based tests for specification matching.
//!
//! These tests generate random repository universes and specification lists
//! and verify that the matching invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::archive::RepoName;
    use crate::resolver::match_repos;
    use proptest::prelude::*;

    fn repo_name() -> impl Strategy<Value = RepoName> {
        ("[a-c]{1,2}", "[a-d]{1,3}").prop_map(|(group, name)| RepoName::new(group, name))
    }

    fn universe() -> impl Strategy<Value = Vec<RepoName>> {
        prop::collection::vec(repo_name(), 0..12).prop_map(|mut repos| {
            repos.sort();
            repos.dedup();
            repos
        })
    }

    /// Exact names, bare group names, and wildcard patterns.
    fn spec() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-c]{1,2}/[a-d]{1,3}",
            "[a-c]{1,2}",
            "[a-c]{0,1}\\*",
            "[a-c]{1,2}/[a-d]{0,1}\\*",
            Just("*".to_string()),
        ]
    }

    proptest! {
        /// Property: the result is strictly increasing (sorted, no duplicates)
        #[test]
        fn matching_is_sorted_and_unique(
            universe in universe(),
            specs in prop::collection::vec(spec(), 0..5),
        ) {
            let matched = match_repos(&universe, &specs, None).unwrap();
            for pair in matched.windows(2) {
                prop_assert!(pair[0] < pair[1], "{:?} not before {:?}", pair[0], pair[1]);
            }
        }

        /// Property: matching the same specs twice gives the same answer
        #[test]
        fn matching_is_idempotent(
            universe in universe(),
            specs in prop::collection::vec(spec(), 0..5),
        ) {
            let first = match_repos(&universe, &specs, None).unwrap();
            let second = match_repos(&universe, &specs, None).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: every match is a known repository
        #[test]
        fn matching_only_returns_known_repos(
            universe in universe(),
            specs in prop::collection::vec(spec(), 0..5),
        ) {
            for repo in match_repos(&universe, &specs, None).unwrap() {
                prop_assert!(universe.contains(&repo));
            }
        }

        /// Property: an existing exact name always matches itself
        #[test]
        fn exact_name_matches_itself(
            universe in universe().prop_filter("non-empty", |u| !u.is_empty()),
            index in any::<prop::sample::Index>(),
        ) {
            let repo = index.get(&universe).clone();
            let matched = match_repos(&universe, &[repo.to_string()], None).unwrap();
            prop_assert_eq!(matched, vec![repo]);
        }

        /// Property: a base group that exists never makes matching fail
        #[test]
        fn known_base_group_never_fails(
            universe in universe().prop_filter("non-empty", |u| !u.is_empty()),
            index in any::<prop::sample::Index>(),
            specs in prop::collection::vec(spec(), 0..5),
        ) {
            let group = index.get(&universe).group.clone();
            let matched = match_repos(&universe, &specs, Some(&group));
            prop_assert!(matched.is_ok());
        }
    }
}
