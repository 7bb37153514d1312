//! Codegen module for the style compiler
//!
//! Renders a rule tree as flat CSS. Nesting only exists at parse time: every
//! rule is emitted as its own top-level block with a fully qualified
//! selector, after its parent's block and before the parent's media blocks.
//! Variable references were substituted while the tree was built, so
//! rendering cannot fail.

use crate::ast::Property;
use crate::scope::{Child, RuleId, StyleTree};
use crate::selector::resolve_selector;

/// Resolved values that suppress their declaration entirely. Interpolating
/// a missing host value produces one of these.
const OMITTED_VALUES: [&str; 2] = ["null", "undefined"];

/// Render the whole tree.
pub fn render(tree: &StyleTree) -> String {
    let mut out = String::new();
    render_rule(tree, RuleId::ROOT, &mut out);
    out
}

fn render_rule(tree: &StyleTree, id: RuleId, out: &mut String) {
    let rule = tree.rule(id);

    let mut content = String::new();
    for child in &rule.children {
        match child {
            Child::Property(property) => {
                if let Some(value) = resolve_value(property) {
                    content.push_str(&property.key);
                    content.push(':');
                    content.push_str(&value);
                    content.push(';');
                }
            }
            Child::Comment(comment) if !comment.is_blank() => {
                content.push_str("/*");
                content.push_str(&comment.text);
                content.push_str("*/");
            }
            _ => {}
        }
    }

    if !content.is_empty() {
        let selector = resolve_selector(tree, id);
        if !selector.is_empty() {
            out.push_str(&selector);
            out.push('{');
            out.push_str(&content);
            out.push('}');
        }
    }

    for child in &rule.children {
        if let Child::Rule(nested) = child {
            render_rule(tree, *nested, out);
        }
    }

    for entry in &rule.media {
        let mut inner = String::new();
        render_rule(tree, entry.expansion, &mut inner);
        if !inner.is_empty() {
            out.push_str(&entry.block.prelude());
            out.push('{');
            out.push_str(&inner);
            out.push('}');
        }
    }
}

/// Final value of a declaration, or `None` when it must be omitted.
pub fn resolve_value(property: &Property) -> Option<String> {
    let value = property.value.trim();
    if value.is_empty() || OMITTED_VALUES.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}
