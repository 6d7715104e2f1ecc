use std::collections::BTreeMap;

use crate::foundation::error::{TpdneError, TpdneResult};

/// Text with `{{name}}` placeholders.
///
/// Templates are plain values handed to each render call; nothing is cached process-wide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_path(path: &std::path::Path) -> TpdneResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template '{}'", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of all placeholders, in order of first appearance.
    pub fn placeholders(&self) -> TpdneResult<Vec<&str>> {
        let mut out: Vec<&str> = Vec::new();
        let mut rest = self.text.as_str();
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| TpdneError::config("template has an unterminated '{{'"))?;
            let name = after[..close].trim();
            if name.is_empty() {
                return Err(TpdneError::config("template has an empty placeholder"));
            }
            if !out.contains(&name) {
                out.push(name);
            }
            rest = &after[close + 2..];
        }
        Ok(out)
    }

    /// Substitute every placeholder. Unknown names are an error, unused values are not.
    ///
    /// All unknown names are reported together.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> TpdneResult<String> {
        let missing: Vec<String> = self
            .placeholders()?
            .into_iter()
            .filter(|name| !values.contains_key(name))
            .map(|name| format!("{{{{{name}}}}}"))
            .collect();
        if !missing.is_empty() {
            return Err(TpdneError::config(format!(
                "template placeholders without a value: {}",
                missing.join(", ")
            )));
        }

        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| TpdneError::config("template has an unterminated '{{'"))?;
            if let Some(value) = values.get(after[..close].trim()) {
                out.push_str(value);
            }
            rest = &after[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deploy/template.rs"]
mod tests;
