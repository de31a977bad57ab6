//! Placeholder rendering for tmplpress.
//! Templates only support plain `{{name}}` substitution; there are no
//! conditionals or loops.
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::answers::AnswerSet;
use crate::manifest::Manifest;

/// Resolved placeholder values keyed by placeholder name.
pub type Values = IndexMap<String, String>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern compiles")
});

/// Trait for placeholder rendering engines.
pub trait TemplateRenderer {
    /// Replaces every placeholder token in `template` with its value.
    /// Tokens without a value render as the empty string.
    fn render(&self, template: &str, values: &Values) -> String;

    /// Returns the distinct placeholder names found in `template`.
    fn placeholders(&self, template: &str) -> BTreeSet<String>;
}

/// Renderer for `{{name}}` tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, values: &Values) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                values.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }

    fn placeholders(&self, template: &str) -> BTreeSet<String> {
        PLACEHOLDER.captures_iter(template).map(|caps| caps[1].to_string()).collect()
    }
}

/// Merges manifest defaults with the answers; answers win.
pub fn resolve_values(manifest: &Manifest, answers: &AnswerSet) -> Values {
    let mut values = manifest.placeholders.clone();
    for (name, value) in answers {
        values.insert(name.clone(), value.clone());
    }
    values
}

/// Returns the content as text when it is safe to render, `None` for binary data.
pub fn as_text(content: &[u8]) -> Option<&str> {
    if content.contains(&0) {
        return None;
    }
    std::str::from_utf8(content).ok()
}
