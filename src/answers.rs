use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::path::Path;

/// Concrete values supplied for a template's placeholders.
pub type AnswerSet = IndexMap<String, String>;

/// Parses a flat JSON object of string values.
///
/// # Errors
/// * `Error::AnswersError` if the document is not JSON or holds a non-string value
pub fn parse_answers(content: &str) -> Result<AnswerSet> {
    let raw: IndexMap<String, serde_json::Value> = serde_json::from_str(content)
        .map_err(|e| Error::AnswersError(format!("Failed to parse answers as JSON: {e}")))?;

    raw.into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            other => Err(Error::AnswersError(format!(
                "answer for '{key}' must be a string, got {other}"
            ))),
        })
        .collect()
}

/// Reads the answers document at `path`.
pub fn load_answers<P: AsRef<Path>>(path: P) -> Result<AnswerSet> {
    let path = path.as_ref();
    debug!("Loading answers from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        Error::AnswersError(format!("could not read '{}': {}", path.display(), e))
    })?;
    parse_answers(&content)
}
