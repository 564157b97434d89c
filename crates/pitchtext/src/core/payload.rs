//! Assembly of the single text payload sent downstream for a batch of files.
//!
//! The payload is the instruction prompt followed by one `path` / `content` section per
//! file, in the order given, and a closing footer.

use crate::core::config::PayloadConfig;
use crate::types::ExtractionResult;
use crate::{PitchtextError, Result};

pub struct PayloadBuilder {
    config: PayloadConfig,
}

impl PayloadBuilder {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    /// Check that `prompt` is usable as the payload header.
    ///
    /// # Errors
    ///
    /// `Validation` if the prompt is blank or still contains the placeholder marker.
    pub fn validate_prompt(&self, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(PitchtextError::validation("Prompt is empty"));
        }
        let marker = &self.config.placeholder_marker;
        if !marker.is_empty() && prompt.contains(marker.as_str()) {
            return Err(PitchtextError::validation(format!(
                "Prompt still contains the placeholder '{}'; replace it before building the payload",
                marker
            )));
        }
        Ok(())
    }

    /// Build the payload for `files`, each given as `(display path, result)`.
    pub fn build<P: AsRef<str>>(&self, prompt: &str, files: &[(P, ExtractionResult)]) -> Result<String> {
        self.validate_prompt(prompt)?;

        let mut parts: Vec<&str> = Vec::with_capacity(1 + files.len() * 4);
        parts.push(prompt);
        for (path, result) in files {
            parts.extend(["", path.as_ref(), "", result.content.as_str()]);
        }

        let mut payload = parts.join("\n");
        payload.push_str(&self.config.footer);

        for (from, to) in &self.config.replacements {
            if from.is_empty() {
                continue;
            }
            payload = payload.replace(from.as_str(), to);
        }

        Ok(payload)
    }
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new(PayloadConfig::default())
    }
}
