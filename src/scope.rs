//! Rule tree and scope chain.
//!
//! Rules live in an arena owned by [`StyleTree`]; a rule's `parent` is an
//! index back into the arena and is only ever followed for lookups. Every
//! rule has its own binding and mixin tables. Lookups walk the parent chain,
//! and `!global` declarations are the only way a binding crosses into an
//! ancestor (always the root).

use crate::ast::{Comment, MediaBlock, MixinDef, Property, Variable};
use crate::validate::{CompilerError, SourceLocation};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

impl RuleId {
    pub const ROOT: RuleId = RuleId(0);

    pub(crate) const fn from_index(index: usize) -> Self {
        RuleId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Rendered children of a rule, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Property(Property),
    Comment(Comment),
    Rule(RuleId),
}

/// An expanded `@media` block: the raw block plus the detached rule its
/// body was parsed into.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub block: MediaBlock,
    pub expansion: RuleId,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: String,
    pub children: Vec<Child>,
    pub bindings: HashMap<String, Variable>,
    pub mixins: HashMap<String, MixinDef>,
    pub media: Vec<MediaEntry>,
    pub parent: Option<RuleId>,
}

impl Rule {
    fn new(selector: &str, parent: Option<RuleId>) -> Self {
        Self {
            selector: selector.to_string(),
            children: Vec::new(),
            bindings: HashMap::new(),
            mixins: HashMap::new(),
            media: Vec::new(),
            parent,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StyleTree {
    rules: Vec<Rule>,
}

impl Default for StyleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTree {
    pub fn new() -> Self {
        Self {
            rules: vec![Rule::new("", None)],
        }
    }

    pub fn root(&self) -> &Rule {
        &self.rules[RuleId::ROOT.0]
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.0]
    }

    /// Create a nested rule and append it to `parent`'s children.
    pub fn add_rule(&mut self, parent: RuleId, selector: &str) -> RuleId {
        let id = self.add_detached_rule(parent, selector);
        self.rule_mut(parent).children.push(Child::Rule(id));
        id
    }

    /// Create a rule that resolves through `parent` but is not one of its
    /// rendered children (media block expansions).
    pub fn add_detached_rule(&mut self, parent: RuleId, selector: &str) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(Rule::new(selector, Some(parent)));
        id
    }

    pub fn push_property(&mut self, at: RuleId, property: Property) {
        self.rule_mut(at).children.push(Child::Property(property));
    }

    pub fn push_comment(&mut self, at: RuleId, comment: Comment) {
        self.rule_mut(at).children.push(Child::Comment(comment));
    }

    /// Bind a variable in `at`, or in the root when it is marked `!global`.
    /// A later declaration of the same name overwrites the earlier one for
    /// every statement built after it.
    pub fn bind(&mut self, at: RuleId, variable: Variable) {
        let target = if variable.is_global { RuleId::ROOT } else { at };
        self.rule_mut(target)
            .bindings
            .insert(variable.key.clone(), variable);
    }

    pub fn register_mixin(&mut self, at: RuleId, mixin: MixinDef) {
        self.rule_mut(at).mixins.insert(mixin.name.clone(), mixin);
    }

    /// Record `block` on `at`, rendered from the detached rule `expansion`.
    pub fn attach_media(&mut self, at: RuleId, block: MediaBlock, expansion: RuleId) {
        self.rule_mut(at).media.push(MediaEntry { block, expansion });
    }

    /// `at` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, at: RuleId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(at),
        }
    }

    /// Find the nearest binding of `name`, starting at `at`.
    pub fn lookup_variable(&self, name: &str, at: RuleId) -> Option<&Variable> {
        self.ancestors(at)
            .find_map(|id| self.rule(id).bindings.get(name))
    }

    /// Like [`StyleTree::lookup_variable`], failing with `UnresolvedVariable`.
    pub fn resolve_variable(
        &self,
        name: &str,
        at: RuleId,
        location: SourceLocation,
    ) -> Result<&Variable, CompilerError> {
        self.lookup_variable(name, at)
            .ok_or_else(|| CompilerError::unresolved_variable(name, location))
    }

    /// Replace a leading `$name` in `value` with the binding visible from
    /// `at`. Text after the identifier is kept, so `$c !important` becomes
    /// `red !important`. Other values pass through trimmed.
    pub fn substitute_variable(
        &self,
        value: &str,
        at: RuleId,
        location: SourceLocation,
    ) -> Result<String, CompilerError> {
        let value = value.trim();
        let Some(reference) = value.strip_prefix('$') else {
            return Ok(value.to_string());
        };

        let end = reference
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(reference.len());
        let (name, rest) = reference.split_at(end);
        let variable = self.resolve_variable(name, at, location)?;
        Ok(format!("{}{}", variable.value, rest))
    }

    pub fn find_mixin(&self, name: &str, at: RuleId) -> Option<&MixinDef> {
        self.ancestors(at).find_map(|id| self.rule(id).mixins.get(name))
    }
}

pub struct Ancestors<'a> {
    tree: &'a StyleTree,
    next: Option<RuleId>,
}

impl Iterator for Ancestors<'_> {
    type Item = RuleId;

    fn next(&mut self) -> Option<RuleId> {
        let current = self.next?;
        self.next = self.tree.rule(current).parent;
        Some(current)
    }
}
