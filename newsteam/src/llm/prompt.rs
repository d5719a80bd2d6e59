//! Fixed prompt templates with `{name}` placeholders.
//!
//! Substitution is a single pass over the template: values are inserted
//! verbatim (no escaping, no truncation) and never re-scanned, so a value
//! that itself contains `{news}` is left alone.

use anyhow::{bail, Result};

pub const SUMMARY_TEMPLATE: &str =
    "Summarize the following news article in 3 sentences:\n\n{news}";

pub const CHAT_TEMPLATE: &str = "You are an AI assistant called robot with ability to understand the emotion. Answer the question: {question}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self {
            template: template.into(),
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// "Summarize ... in 3 sentences" with the single variable `news`.
    pub fn news_summary() -> Self {
        Self::new(SUMMARY_TEMPLATE, &["news"])
    }

    /// Chat persona prompt with the single variable `question`.
    pub fn chat() -> Self {
        Self::new(CHAT_TEMPLATE, &["question"])
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Fill every declared variable. A declared variable missing from
    /// `values` is an error; braces that do not name a declared variable are
    /// copied through untouched.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        for var in &self.input_variables {
            if !values.iter().any(|(name, _)| *name == var.as_str()) {
                bail!("missing value for prompt variable '{}'", var);
            }
        }

        let mut out = String::with_capacity(self.template.len() + 256);
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    let value = self
                        .input_variables
                        .iter()
                        .any(|v| v.as_str() == name)
                        .then(|| values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v))
                        .flatten();
                    match value {
                        Some(v) => out.push_str(v),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}
