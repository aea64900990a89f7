//! Prefix-closed record of identifiers already processed in one run.

use crate::ident::PackageId;
use std::collections::HashSet;

/// How much of the namespace an entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coverage {
    /// The identifier and every identifier nested beneath it.
    Subtree,
    /// Only the identifier itself.
    Exact,
}

#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    subtrees: HashSet<PackageId>,
    exact: HashSet<PackageId>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` and everything below it as done. Idempotent.
    pub fn mark_done(&mut self, id: &PackageId) {
        self.subtrees.insert(id.clone());
    }

    /// Mark only `id` itself as done. Idempotent.
    pub fn mark_exact(&mut self, id: &PackageId) {
        self.exact.insert(id.clone());
    }

    pub fn mark(&mut self, id: &PackageId, coverage: Coverage) {
        match coverage {
            Coverage::Subtree => self.mark_done(id),
            Coverage::Exact => self.mark_exact(id),
        }
    }

    /// True iff a subtree entry equals or is an ancestor of `id`, or an exact entry equals it.
    pub fn is_done(&self, id: &PackageId) -> bool {
        if self.exact.contains(id) || self.subtrees.contains(id) {
            return true;
        }
        self.subtrees
            .iter()
            .any(|entry| id.is_same_or_descendant_of(entry))
    }

    pub fn len(&self) -> usize {
        self.subtrees.len() + self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty() && self.exact.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, Coverage)> {
        self.subtrees
            .iter()
            .map(|id| (id, Coverage::Subtree))
            .chain(self.exact.iter().map(|id| (id, Coverage::Exact)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtree_entry_covers_descendants() {
        let mut set = VisitedSet::new();
        set.mark_done(&PackageId::from("gh/u1/p1"));
        assert!(set.is_done(&PackageId::from("gh/u1/p1")));
        assert!(set.is_done(&PackageId::from("gh/u1/p1/s1/deep")));
        assert!(!set.is_done(&PackageId::from("gh/u1/p10")));
        assert!(!set.is_done(&PackageId::from("gh/u1")));
    }

    #[test]
    fn test_exact_entry_covers_only_itself() {
        let mut set = VisitedSet::new();
        set.mark_exact(&PackageId::from("gh/u1/p1"));
        assert!(set.is_done(&PackageId::from("gh/u1/p1")));
        assert!(!set.is_done(&PackageId::from("gh/u1/p1/s1")));
    }

    #[test]
    fn test_marking_is_idempotent() {
        let mut set = VisitedSet::new();
        let id = PackageId::from("a/b");
        set.mark_done(&id);
        set.mark_done(&id);
        set.mark(&id, Coverage::Exact);
        set.mark(&id, Coverage::Exact);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_set_covers_nothing() {
        let set = VisitedSet::new();
        assert!(set.is_empty());
        assert!(!set.is_done(&PackageId::from("a")));
    }
}
