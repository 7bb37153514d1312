//! Template Module for the style compiler
//!
//! Public entry points. Input arrives the way a tagged template literal
//! delivers it: N+1 literal fragments and N interpolated host values.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::codegen::render;
use crate::keyframes::{KeyframesOptions, KeyframesRegistry, GLOBAL_KEYFRAMES};
use crate::parse::{parse_stylesheet, CompileOptions};
use crate::validate::{validate_fragments, CompilerError};

// ═══════════════════════════════════════════════════════════════════════════════
// INTERPOLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Text an interpolated value contributes to the source.
///
/// Falsy host values (`null`, `false`, `0`, `""`) contribute nothing, so a
/// declaration like `color: ${maybe};` disappears when `maybe` is unset.
pub fn stringify_value(value: &Value) -> String {
    if is_falsy(value) {
        String::new()
    } else {
        host_string(value)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn host_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => host_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or_default();
    if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}

/// Concatenate fragments and values. Also returns each value's text, which
/// is where keyframes identifiers are looked for.
pub fn interpolate(
    fragments: &[&str],
    values: &[Value],
) -> Result<(String, Vec<String>), CompilerError> {
    validate_fragments(fragments, values)?;

    let texts: Vec<String> = values.iter().map(stringify_value).collect();
    let mut source = String::new();
    for (index, fragment) in fragments.iter().enumerate() {
        source.push_str(fragment);
        if let Some(text) = texts.get(index) {
            source.push_str(text);
        }
    }
    Ok((source, texts))
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile a stylesheet template against the process-wide keyframes registry.
pub fn compile(fragments: &[&str], values: &[Value]) -> Result<String, CompilerError> {
    compile_with(fragments, values, &GLOBAL_KEYFRAMES, &CompileOptions::default())
}

/// Compile a stylesheet template. Keyframes registered in `registry` whose
/// identifiers appear in `values` are appended after the compiled rules.
pub fn compile_with(
    fragments: &[&str],
    values: &[Value],
    registry: &KeyframesRegistry,
    options: &CompileOptions,
) -> Result<String, CompilerError> {
    let (source, texts) = interpolate(fragments, values)?;
    let mut css = compile_source(&source, options)?;
    css.push_str(&registry.referenced_css(texts.as_slice()));
    Ok(css)
}

/// Compile plain stylesheet text.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<String, CompilerError> {
    let tree = parse_stylesheet(source, options)?;
    Ok(render(&tree))
}

/// Register a keyframes template in the process-wide registry.
pub fn register_keyframes(fragments: &[&str], values: &[Value]) -> Result<String, CompilerError> {
    register_keyframes_with(
        fragments,
        values,
        &GLOBAL_KEYFRAMES,
        &KeyframesOptions::default(),
    )
}

pub fn register_keyframes_with(
    fragments: &[&str],
    values: &[Value],
    registry: &KeyframesRegistry,
    options: &KeyframesOptions,
) -> Result<String, CompilerError> {
    let (body, _) = interpolate(fragments, values)?;
    Ok(registry.register(&body, options))
}

/// One stylesheet template, owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSource {
    pub fragments: Vec<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl StyleSource {
    /// A template without interpolations.
    pub fn from_css(css: &str) -> Self {
        Self {
            fragments: vec![css.to_string()],
            values: vec![],
        }
    }

    fn fragment_refs(&self) -> Vec<&str> {
        self.fragments.iter().map(String::as_str).collect()
    }
}

/// Compile many stylesheets in parallel. Results keep the input order.
pub fn compile_batch(
    sources: &[StyleSource],
    registry: &KeyframesRegistry,
    options: &CompileOptions,
) -> Vec<Result<String, CompilerError>> {
    log::debug!("[CssNative] Compiling {} stylesheets", sources.len());
    sources
        .par_iter()
        .map(|source| compile_with(&source.fragment_refs(), &source.values, registry, options))
        .collect()
}

/// Wrap compiled CSS for insertion into a shadow root. Empty CSS yields an
/// empty string so no `<style>` element is created.
pub fn to_style_element(css: &str) -> String {
    if css.is_empty() {
        String::new()
    } else {
        format!("<style>{}</style>", css)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn compile_css_native(
    fragments: Vec<String>,
    values: Vec<Value>,
    options: Option<CompileOptions>,
) -> napi::Result<String> {
    let fragments: Vec<&str> = fragments.iter().map(String::as_str).collect();
    compile_with(
        &fragments,
        &values,
        &GLOBAL_KEYFRAMES,
        &options.unwrap_or_default(),
    )
    .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn register_keyframes_native(
    fragments: Vec<String>,
    values: Vec<Value>,
    options: Option<KeyframesOptions>,
) -> napi::Result<String> {
    let fragments: Vec<&str> = fragments.iter().map(String::as_str).collect();
    register_keyframes_with(
        &fragments,
        &values,
        &GLOBAL_KEYFRAMES,
        &options.unwrap_or_default(),
    )
    .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn compile_css_batch_native(
    sources: Value,
    options: Option<CompileOptions>,
) -> napi::Result<Vec<String>> {
    let sources: Vec<StyleSource> =
        serde_json::from_value(sources).map_err(|e| napi::Error::from_reason(e.to_string()))?;
    compile_batch(&sources, &GLOBAL_KEYFRAMES, &options.unwrap_or_default())
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values_stringify_empty() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert_eq!(stringify_value(&value), "", "{:?}", value);
        }
    }

    #[test]
    fn test_host_stringification() {
        assert_eq!(stringify_value(&json!("12px")), "12px");
        assert_eq!(stringify_value(&json!(true)), "true");
        assert_eq!(stringify_value(&json!(12)), "12");
        assert_eq!(stringify_value(&json!(2.0)), "2");
        assert_eq!(stringify_value(&json!(1.5)), "1.5");
        assert_eq!(stringify_value(&json!([1, null, "a", 0])), "1,,a,0");
        assert_eq!(stringify_value(&json!({"a": 1})), "[object Object]");
    }

    #[test]
    fn test_interpolate() {
        let (source, texts) =
            interpolate(&[".a{width:", ";color:", ";}"], &[json!(10), json!(null)]).unwrap();
        assert_eq!(source, ".a{width:10;color:;}");
        assert_eq!(texts, vec!["10".to_string(), String::new()]);
    }

    #[test]
    fn test_style_element() {
        assert_eq!(to_style_element(""), "");
        assert_eq!(to_style_element(".a{b:c;}"), "<style>.a{b:c;}</style>");
    }
}
