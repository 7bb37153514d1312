//! Parse Module for the style compiler
//!
//! Drives the scanner and classifier over a stylesheet and builds the rule
//! tree. Classification is online: a variable or mixin is only visible to
//! statements scanned after its declaration, and property values are
//! substituted as soon as they are read. `@include` re-scans the mixin body
//! with the including rule active, and `@media` bodies are expanded in place
//! into a detached rule.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::ast::{MediaBlock, Property, StyleNode};
use crate::classify::classify;
use crate::scan::Scanner;
use crate::scope::{RuleId, StyleTree};
use crate::validate::{CompilerError, SourceLocation};

/// Selector of a media expansion root: the declaring rule's own selector.
pub const MEDIA_ROOT_SELECTOR: &str = "&";

/// Deepest nesting of rule, media and mixin bodies below the stylesheet root.
pub const MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Fail on `@include` of a mixin that is not in scope instead of
    /// dropping the statement.
    pub strict_includes: bool,
}

/// Build the full rule tree for `source`, media blocks expanded.
pub fn parse_stylesheet(source: &str, options: &CompileOptions) -> Result<StyleTree, CompilerError> {
    let mut parser = StyleParser::new(options);
    parser.parse_into(RuleId::ROOT, source, SourceLocation::start())?;
    Ok(parser.tree)
}

struct StyleParser<'o> {
    tree: StyleTree,
    options: &'o CompileOptions,
    include_stack: Vec<String>,
    depth: usize,
}

impl<'o> StyleParser<'o> {
    fn new(options: &'o CompileOptions) -> Self {
        Self {
            tree: StyleTree::new(),
            options,
            include_stack: Vec::new(),
            depth: 0,
        }
    }

    fn parse_into(
        &mut self,
        at: RuleId,
        source: &str,
        origin: SourceLocation,
    ) -> Result<(), CompilerError> {
        for segment in Scanner::with_origin(source, origin) {
            if let Some(node) = classify(segment?) {
                self.apply(at, node)?;
            }
        }
        Ok(())
    }

    /// `parse_into` one level deeper, failing once `MAX_NESTING_DEPTH` is
    /// exceeded.
    fn parse_nested(
        &mut self,
        at: RuleId,
        source: &str,
        origin: SourceLocation,
    ) -> Result<(), CompilerError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CompilerError::nesting_too_deep(MAX_NESTING_DEPTH, origin));
        }
        self.depth += 1;
        let result = self.parse_into(at, source, origin);
        self.depth -= 1;
        result
    }

    fn apply(&mut self, at: RuleId, node: StyleNode) -> Result<(), CompilerError> {
        match node {
            StyleNode::Variable(variable) => self.tree.bind(at, variable),
            StyleNode::Property(property) => {
                let value = self
                    .tree
                    .substitute_variable(&property.value, at, property.location)?;
                self.tree.push_property(at, Property { value, ..property });
            }
            StyleNode::Comment(comment) => self.tree.push_comment(at, comment),
            StyleNode::MixinDef(mixin) => self.tree.register_mixin(at, mixin),
            StyleNode::MediaBlock(block) => self.expand_media(at, block)?,
            StyleNode::Include { name, location } => self.include(at, &name, location)?,
            StyleNode::Rule {
                selector,
                body,
                origin,
            } => {
                let child = self.tree.add_rule(at, &selector);
                self.parse_nested(child, &body, origin)?;
            }
        }
        Ok(())
    }

    fn include(
        &mut self,
        at: RuleId,
        name: &str,
        location: SourceLocation,
    ) -> Result<(), CompilerError> {
        let mixin = match self.tree.find_mixin(name, at) {
            Some(mixin) => mixin.clone(),
            None if self.options.strict_includes => {
                return Err(CompilerError::unresolved_mixin(name, location));
            }
            None => {
                log::warn!(
                    "[CssNative] Dropping @include of undefined mixin '{}' at {}",
                    name,
                    location
                );
                return Ok(());
            }
        };

        if self.include_stack.iter().any(|active| active == name) {
            let mut chain = self.include_stack.clone();
            chain.push(name.to_string());
            return Err(CompilerError::recursive_mixin(name, location, &chain));
        }

        self.include_stack.push(name.to_string());
        let result = self.parse_nested(at, &mixin.body, mixin.origin);
        self.include_stack.pop();
        result
    }

    /// Parse a media body into a detached rule parented to the declaring
    /// rule, so it resolves through the same scope chain.
    fn expand_media(&mut self, at: RuleId, block: MediaBlock) -> Result<(), CompilerError> {
        let expansion = self.tree.add_detached_rule(at, MEDIA_ROOT_SELECTOR);
        let (body, origin) = (block.body.clone(), block.origin);
        self.tree.attach_media(at, block, expansion);
        self.parse_nested(expansion, &body, origin)
    }
}
