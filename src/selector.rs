//! Selector resolution over the rule tree.

use crate::scope::{RuleId, StyleTree};

/// Parent back-reference marker.
pub const PARENT_MARKER: char = '&';

/// Compose a nested selector with its parent's resolved selector.
///
/// `&` is replaced textually; anything else is joined with a descendant
/// combinator. No selector validation happens here.
pub fn join_selector(parent: &str, selector: &str) -> String {
    if selector.contains(PARENT_MARKER) {
        selector.replace(PARENT_MARKER, parent).trim().to_string()
    } else {
        format!("{} {}", parent, selector).trim().to_string()
    }
}

/// Fully qualified selector of `id`. The root resolves to `""`.
pub fn resolve_selector(tree: &StyleTree, id: RuleId) -> String {
    let chain: Vec<RuleId> = tree.ancestors(id).collect();
    chain
        .iter()
        .rev()
        .map(|&ancestor| tree.rule(ancestor))
        .filter(|rule| !rule.is_root())
        .fold(String::new(), |parent, rule| join_selector(&parent, &rule.selector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_descendant() {
        assert_eq!(join_selector(".a", ".b"), ".a .b");
        assert_eq!(join_selector("", ".b"), ".b");
        assert_eq!(join_selector(".a", ""), ".a");
    }

    #[test]
    fn test_join_parent_reference() {
        assert_eq!(join_selector(".a", "&:hover"), ".a:hover");
        assert_eq!(join_selector(".a", "&.on, & + &"), ".a.on, .a + .a");
        assert_eq!(join_selector("", "&"), "");
    }

    #[test]
    fn test_resolve_through_tree() {
        let mut tree = StyleTree::new();
        let nav = tree.add_rule(RuleId::ROOT, "nav");
        let link = tree.add_rule(nav, "a");
        let hover = tree.add_rule(link, "&:hover");
        let media_root = tree.add_detached_rule(hover, "&");

        assert_eq!(resolve_selector(&tree, RuleId::ROOT), "");
        assert_eq!(resolve_selector(&tree, nav), "nav");
        assert_eq!(resolve_selector(&tree, link), "nav a");
        assert_eq!(resolve_selector(&tree, hover), "nav a:hover");
        assert_eq!(resolve_selector(&tree, media_root), "nav a:hover");
    }
}
