//! Keyframes Registry for the style compiler
//!
//! `@keyframes` bodies are registered ahead of time under a generated
//! identifier. The identifier is then interpolated into a stylesheet (e.g.
//! `animation: ${id} 1s`), and compiling that stylesheet appends the stored
//! blocks to the output.
//!
//! Lifecycle: a registry starts empty, only grows, and entries never change
//! once inserted. Reads (compilation) take a shared lock; registration takes
//! the write lock.

#[cfg(feature = "napi")]
use napi_derive::napi;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Vendor prefixes emitted for every registration, unprefixed last.
pub const DEFAULT_PREFIXES: [&str; 5] = ["-webkit-", "-moz-", "-o-", "-ms-", ""];

/// Hex digits of the digest kept in an identifier.
const ID_DIGEST_LEN: usize = 16;

lazy_static! {
    /// Process-wide registry used by the zero-configuration entry points.
    pub static ref GLOBAL_KEYFRAMES: KeyframesRegistry = KeyframesRegistry::new();

    static ref COMMENT_RE: Regex = Regex::new(r"(?m)/\*[\s\S]*?\*/|([^:]|^)//.*$").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r"\s*([{};:,])\s*").unwrap();
}

/// Mixed into every identifier digest; identifiers stay unique even for
/// identical bodies and across registries.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase", default)]
pub struct KeyframesOptions {
    pub prefixes: Vec<String>,
}

impl Default for KeyframesOptions {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframesEntry {
    pub id: String,
    pub css: String,
}

#[derive(Debug, Default)]
pub struct KeyframesRegistry {
    entries: RwLock<Vec<KeyframesEntry>>,
}

impl KeyframesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are immutable once pushed, so a poisoned lock still guards
    // consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Vec<KeyframesEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<KeyframesEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `body` as one `@keyframes` block per prefix and return the new
    /// identifier.
    pub fn register(&self, body: &str, options: &KeyframesOptions) -> String {
        let body = minify(&strip_comments(body));

        let mut entries = self.write();
        let id = loop {
            let candidate = generate_id(&body);
            if !entries.iter().any(|entry| entry.id == candidate) {
                break candidate;
            }
        };

        let css: String = options
            .prefixes
            .iter()
            .map(|prefix| format!("@{}keyframes {}{{{}}}", prefix, id, body))
            .collect();

        log::debug!(
            "[CssNative] Registered keyframes {} ({} variants)",
            id,
            options.prefixes.len()
        );
        entries.push(KeyframesEntry {
            id: id.clone(),
            css,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.read()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.css.clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Stored text of every entry whose identifier occurs in any of `texts`,
    /// concatenated in registration order. Each entry is emitted once.
    pub fn referenced_css<S: AsRef<str>>(&self, texts: &[S]) -> String {
        self.read()
            .iter()
            .filter(|entry| texts.iter().any(|text| text.as_ref().contains(&entry.id)))
            .map(|entry| entry.css.as_str())
            .collect()
    }
}

fn generate_id(body: &str) -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(body.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("_{}", &digest[..ID_DIGEST_LEN])
}

/// Remove block and line comments. `//` right after `:` is kept (URLs).
pub fn strip_comments(source: &str) -> String {
    COMMENT_RE.replace_all(source, "${1}").to_string()
}

/// Collapse whitespace and drop it around punctuation.
pub fn minify(source: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(source, " ");
    PUNCTUATION_RE
        .replace_all(&collapsed, "${1}")
        .trim()
        .to_string()
}
