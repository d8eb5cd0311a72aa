//! Set algebra over permission names.
//!
//! Permission names are opaque, case-sensitive tokens. Two names are the
//! same permission only when the strings are identical. Sets keep the order
//! names were first inserted in, so reports read the way the caller wrote
//! them.

use std::fmt::Display;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The permissions required when the caller doesn't supply any: what a
/// typical application workload needs.
pub const DEFAULT_REQUIRED_PERMISSIONS: [&str; 7] = [
    "search", "read", "find", "insert", "update", "remove", "collMod",
];

/// An insertion-ordered set of permission names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(IndexSet<String>);

impl PermissionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(IndexSet::new())
    }

    /// The documented default required set.
    pub fn default_required() -> Self {
        DEFAULT_REQUIRED_PERMISSIONS.into_iter().collect()
    }

    /// Add a permission. Returns false if it was already there, in which
    /// case it keeps its original position.
    pub fn insert<S: Into<String>>(&mut self, permission: S) -> bool {
        self.0.insert(permission.into())
    }

    /// Exact-match membership.
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Number of distinct permissions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no permissions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Permissions in both sets, in the order of `self`.
    pub fn intersection(&self, other: &PermissionSet) -> PermissionSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Permissions in `self` but not in `other`, in the order of `self`.
    pub fn difference(&self, other: &PermissionSet) -> PermissionSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Copy the names out, in order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for PermissionSet {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_vec().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn set(names: &[&str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn duplicates_collapse_to_first_position() {
        let perms = set(&["read", "insert", "read", "find"]);
        assert_eq!(perms.to_vec(), vec!["read", "insert", "find"]);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let required = set(&["collMod"]);
        let actual = set(&["collmod"]);
        assert!(required.intersection(&actual).is_empty());
        assert_eq!(required.difference(&actual), required);
    }

    #[test]
    fn intersection_keeps_left_order() {
        let required = set(&["update", "find", "read"]);
        let actual = set(&["read", "update"]);
        assert_eq!(required.intersection(&actual).to_vec(), vec!["update", "read"]);
    }

    #[test]
    fn default_required_matches_workload_baseline() {
        assert_eq!(
            PermissionSet::default_required().to_vec(),
            vec!["search", "read", "find", "insert", "update", "remove", "collMod"]
        );
    }

    #[test]
    fn serializes_as_plain_list() -> anyhow::Result<()> {
        let perms = set(&["read", "find"]);
        assert_eq!(serde_json::to_string(&perms)?, r#"["read","find"]"#);
        let back: PermissionSet = serde_json::from_str(r#"["find","find","read"]"#)?;
        assert_eq!(back.to_vec(), vec!["find", "read"]);
        Ok(())
    }

    fn arb_set() -> impl Strategy<Value = PermissionSet> {
        prop::collection::vec("[a-cA-C]{1,2}", 0..8)
            .prop_map(|v| v.into_iter().collect::<PermissionSet>())
    }

    proptest! {
        #[test]
        fn present_and_missing_rebuild_required(a in arb_set(), b in arb_set()) {
            let present = a.intersection(&b);
            let missing = a.difference(&b);
            prop_assert!(present.intersection(&missing).is_empty());
            let rebuilt: PermissionSet = present.iter().chain(missing.iter()).cloned().collect();
            prop_assert_eq!(rebuilt.len(), a.len());
            for p in &a {
                prop_assert!(rebuilt.contains(p));
            }
        }

        #[test]
        fn present_and_extra_are_disjoint(a in arb_set(), b in arb_set()) {
            let present = a.intersection(&b);
            let extra = b.difference(&a);
            prop_assert!(present.intersection(&extra).is_empty());
        }
    }
}
