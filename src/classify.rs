//! Classify Module for the style compiler
//!
//! Turns scanned segments into typed nodes. Classification looks only at the
//! leading text of a statement or block header; bodies stay raw.

use crate::ast::{Comment, MediaBlock, MixinDef, Property, StyleNode, Variable};
use crate::scan::Segment;
use crate::validate::SourceLocation;
use lazy_static::lazy_static;
use regex::Regex;

const INCLUDE: &str = "@include";
const MIXIN: &str = "@mixin";
const MEDIA: &str = "@media";
const GLOBAL_FLAG: &str = "!global";

lazy_static! {
    /// Parameter lists are accepted on `@mixin`/`@include` but never bound.
    static ref PARAMS_RE: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Classify one scanned segment. Blank statements yield `None`.
pub fn classify(segment: Segment) -> Option<StyleNode> {
    match segment {
        Segment::Comment { text, .. } => Some(StyleNode::Comment(Comment { text })),
        Segment::Statement { text, location } => classify_statement(&text, location),
        Segment::Block {
            header,
            body,
            body_origin,
            ..
        } => Some(classify_block(&header, body, body_origin)),
    }
}

pub fn classify_statement(text: &str, location: SourceLocation) -> Option<StyleNode> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.starts_with(INCLUDE) {
        return Some(StyleNode::Include {
            name: directive_name(text, INCLUDE),
            location,
        });
    }

    if text.starts_with('$') {
        return Some(StyleNode::Variable(parse_variable(text, location)));
    }

    Some(StyleNode::Property(parse_property(text, location)))
}

pub fn classify_block(header: &str, body: String, origin: SourceLocation) -> StyleNode {
    let header = header.trim();

    if header.starts_with(MIXIN) {
        return StyleNode::MixinDef(MixinDef {
            name: directive_name(header, MIXIN),
            body,
            origin,
        });
    }

    if let Some(query) = header.strip_prefix(MEDIA) {
        let (condition, grouped) = parse_media_query(query);
        return StyleNode::MediaBlock(MediaBlock {
            condition,
            grouped,
            body,
            origin,
        });
    }

    StyleNode::Rule {
        selector: header.to_string(),
        body,
        origin,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENT PARSING
// ═══════════════════════════════════════════════════════════════════════════════

fn split_declaration(text: &str) -> (&str, &str) {
    match text.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (text.trim(), ""),
    }
}

pub fn parse_variable(text: &str, location: SourceLocation) -> Variable {
    let (key, value) = split_declaration(text);
    let key = key.strip_prefix('$').unwrap_or(key).trim();

    let (value, is_global) = match value.strip_suffix(GLOBAL_FLAG) {
        Some(rest) => (rest.trim(), true),
        None => (value, false),
    };

    Variable {
        key: key.to_string(),
        value: value.to_string(),
        is_global,
        location,
    }
}

pub fn parse_property(text: &str, location: SourceLocation) -> Property {
    let (key, value) = split_declaration(text);
    Property {
        key: key.to_string(),
        value: value.to_string(),
        location,
    }
}

/// Name following `directive`, without any parameter list.
fn directive_name(text: &str, directive: &str) -> String {
    let rest = text.strip_prefix(directive).unwrap_or(text);
    PARAMS_RE.replace_all(rest, "").trim().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEDIA QUERIES
// ═══════════════════════════════════════════════════════════════════════════════

/// `(min-width: 10px)` → (`min-width:10px`, grouped);
/// `screen and (max-width: 10px)` → (same text, whitespace collapsed).
pub fn parse_media_query(query: &str) -> (String, bool) {
    let query = query.trim();
    if is_single_group(query) {
        let inner = &query[1..query.len() - 1];
        (WHITESPACE_RE.replace_all(inner, "").to_string(), true)
    } else {
        (WHITESPACE_RE.replace_all(query, " ").to_string(), false)
    }
}

fn is_single_group(query: &str) -> bool {
    if !query.starts_with('(') || !query.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    for (index, ch) in query.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && index != query.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::start()
    }

    #[test]
    fn test_variable_statement() {
        match classify_statement("$primary : #333", loc()) {
            Some(StyleNode::Variable(v)) => {
                assert_eq!(v.key, "primary");
                assert_eq!(v.value, "#333");
                assert!(!v.is_global);
            }
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_global_marker_is_stripped() {
        let v = parse_variable("$c: red !global", loc());
        assert_eq!(v.value, "red");
        assert!(v.is_global);
    }

    #[test]
    fn test_property_splits_on_first_colon() {
        let p = parse_property("background : url(http://x/y.png)", loc());
        assert_eq!(p.key, "background");
        assert_eq!(p.value, "url(http://x/y.png)");

        let p = parse_property("stray", loc());
        assert_eq!(p.key, "stray");
        assert_eq!(p.value, "");
    }

    #[test]
    fn test_include_statement() {
        assert_eq!(
            classify_statement("@include button-base($size, $color)", loc()),
            Some(StyleNode::Include {
                name: "button-base".to_string(),
                location: loc(),
            })
        );
    }

    #[test]
    fn test_blank_statement_is_ignored() {
        assert_eq!(classify_statement("   ", loc()), None);
    }

    #[test]
    fn test_mixin_block() {
        match classify_block("@mixin card($pad)", "padding:$pad;".to_string(), loc()) {
            StyleNode::MixinDef(m) => {
                assert_eq!(m.name, "card");
                assert_eq!(m.body, "padding:$pad;");
            }
            other => panic!("expected mixin, got {:?}", other),
        }
    }

    #[test]
    fn test_media_block() {
        match classify_block("@media ( min-width : 1px )", ".a{x:y;}".to_string(), loc()) {
            StyleNode::MediaBlock(m) => {
                assert_eq!(m.condition, "min-width:1px");
                assert!(m.grouped);
                assert_eq!(m.prelude(), "@media(min-width:1px)");
            }
            other => panic!("expected media block, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_media_query_keeps_spacing() {
        let (condition, grouped) = parse_media_query(" screen  and\n(max-width: 10px)");
        assert_eq!(condition, "screen and (max-width: 10px)");
        assert!(!grouped);

        let (condition, grouped) = parse_media_query("(min-width: 1px) and (max-width: 2px)");
        assert_eq!(condition, "(min-width: 1px) and (max-width: 2px)");
        assert!(!grouped);
    }

    #[test]
    fn test_rule_block() {
        assert_eq!(
            classify_block("  .a > .b ", "x:y;".to_string(), loc()),
            StyleNode::Rule {
                selector: ".a > .b".to_string(),
                body: "x:y;".to_string(),
                origin: loc(),
            }
        );
    }

    #[test]
    fn test_classify_comment_segment() {
        let node = classify(Segment::Comment {
            text: " note ".to_string(),
            location: loc(),
        });
        assert_eq!(
            node,
            Some(StyleNode::Comment(Comment {
                text: " note ".to_string()
            }))
        );
    }
}
