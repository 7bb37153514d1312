//! # Native Style Compiler
//!
//! Compiles the framework's nested stylesheet language to flat CSS.
//!
//! ## Pipeline
//!
//! 1. **Interpolation** (`template`): fragments and host values are joined
//!    into one source string. Falsy host values contribute nothing.
//! 2. **Scanning** (`scan`): the source is split into statements, blocks and
//!    block comments. Unbalanced braces fail with `CSS-ERR-BLOCK-001`.
//! 3. **Classification** (`classify`): each segment becomes a variable,
//!    property, comment, mixin, media block, include or nested rule.
//! 4. **Tree building** (`parse`, `scope`): rules form an arena tree. Every
//!    rule owns its bindings and mixins; lookups walk the parent chain.
//!    Property values are substituted as they are read.
//! 5. **Rendering** (`codegen`, `selector`): rules are emitted flat with
//!    fully qualified selectors; media blocks follow their declaring rule.
//!
//! ## Scope Invariants
//!
//! 1. A binding is visible in the rule that declares it and in every rule
//!    nested under it, and only to statements scanned after it.
//! 2. `!global` always binds in the root rule.
//! 3. A mixin is a text macro: its body resolves variables at the include
//!    site, never at the definition site.
//! 4. An unresolved variable fails the whole compilation
//!    (`CSS-ERR-VAR-001`); no partial output is returned.
//! 5. Rule, media and mixin bodies nest at most `MAX_NESTING_DEPTH` levels
//!    (`CSS-ERR-BLOCK-002`).

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod ast;
mod classify;
mod codegen;
pub mod keyframes;
mod parse;
pub mod scan;
pub mod scope;
mod selector;
mod template;
mod validate;


pub use codegen::render;
pub use keyframes::{KeyframesOptions, KeyframesRegistry, GLOBAL_KEYFRAMES};
pub use parse::{parse_stylesheet, CompileOptions, MAX_NESTING_DEPTH};
pub use selector::resolve_selector;
pub use template::{
    compile, compile_batch, compile_source, compile_with, interpolate, register_keyframes,
    register_keyframes_with, stringify_value, to_style_element, StyleSource,
};
pub use validate::{CompilerError, ErrorKind, SourceLocation};

#[cfg(feature = "napi")]
pub use template::{compile_css_batch_native, compile_css_native, register_keyframes_native};

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Style Native Bridge Connected".to_string()
}
