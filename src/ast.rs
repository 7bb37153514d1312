//! Node types produced by the classifier.
//!
//! Variables, mixins and media blocks never become rendered children of a
//! rule: they land in the rule's scope tables instead. Only properties,
//! comments and nested rules keep a position in the output order.

use crate::validate::SourceLocation;
use serde::{Deserialize, Serialize};

/// `$name: value;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub key: String,
    pub value: String,
    pub is_global: bool,
    pub location: SourceLocation,
}

/// `key: value;` with the value kept raw until serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub key: String,
    pub value: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Unparsed mixin body, re-scanned at every `@include`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinDef {
    pub name: String,
    pub body: String,
    pub origin: SourceLocation,
}

/// `@media` block waiting to be expanded against the rule that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlock {
    pub condition: String,
    /// `true` when the query was a single parenthesized feature, rendered as
    /// `@media(condition)`. Other queries render as `@media condition`.
    pub grouped: bool,
    pub body: String,
    pub origin: SourceLocation,
}

impl MediaBlock {
    pub fn prelude(&self) -> String {
        if self.grouped {
            format!("@media({})", self.condition)
        } else {
            format!("@media {}", self.condition)
        }
    }
}

/// Result of classifying one scanned segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleNode {
    Variable(Variable),
    Property(Property),
    Comment(Comment),
    MixinDef(MixinDef),
    MediaBlock(MediaBlock),
    /// `@include name;`, expanded in place and never stored.
    Include {
        name: String,
        location: SourceLocation,
    },
    Rule {
        selector: String,
        body: String,
        origin: SourceLocation,
    },
}
