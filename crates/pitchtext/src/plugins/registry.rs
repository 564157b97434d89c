//! Extractor registration and lookup by MIME type.

use crate::plugins::DocumentExtractor;
use crate::{PitchtextError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Reject empty names and names containing whitespace.
fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PitchtextError::validation("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(PitchtextError::validation(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

/// Registry of document extractors keyed by MIME type.
///
/// Each MIME type is served by one extractor. Registering another extractor for a type
/// replaces the current one; an extractor left serving no type is shut down.
pub struct DocumentExtractorRegistry {
    extractors: HashMap<String, Arc<dyn DocumentExtractor>>,
    name_index: HashMap<String, Vec<String>>,
}

impl DocumentExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            name_index: HashMap::new(),
        }
    }

    /// Register an extractor for every MIME type it supports.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid name, or whatever `initialize` returns.
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) -> Result<()> {
        let name = extractor.name().to_string();
        let mime_types: Vec<String> = extractor.supported_mime_types().iter().map(|s| s.to_string()).collect();

        validate_plugin_name(&name)?;

        extractor.initialize()?;

        if self.name_index.contains_key(&name) {
            self.remove(&name)?;
        }

        for mime_type in &mime_types {
            if let Some(replaced) = self.extractors.insert(mime_type.clone(), Arc::clone(&extractor)) {
                tracing::debug!("Extractor {} replaces {} for {}", name, replaced.name(), mime_type);
                self.release(replaced, mime_type)?;
            }
        }

        self.name_index.insert(name, mime_types);

        Ok(())
    }

    /// Extractor registered for `mime_type`.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when nothing is registered for the type.
    pub fn get(&self, mime_type: &str) -> Result<Arc<dyn DocumentExtractor>> {
        self.extractors
            .get(mime_type)
            .cloned()
            .ok_or_else(|| PitchtextError::UnsupportedFormat(mime_type.to_string()))
    }

    /// Names of all registered extractors, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_index.keys().cloned().collect();
        names.sort();
        names
    }

    /// MIME types with a registered extractor, sorted.
    pub fn mime_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.extractors.keys().cloned().collect();
        types.sort();
        types
    }

    /// Remove an extractor by name and shut it down. Unknown names are ignored.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let mime_types = match self.name_index.remove(name) {
            Some(mime_types) => mime_types,
            None => return Ok(()),
        };

        let mut extractor_to_shutdown: Option<Arc<dyn DocumentExtractor>> = None;

        for mime_type in mime_types {
            if self.extractors.get(&mime_type).is_some_and(|e| e.name() == name)
                && let Some(extractor) = self.extractors.remove(&mime_type)
                && extractor_to_shutdown.is_none()
            {
                extractor_to_shutdown = Some(extractor);
            }
        }

        if let Some(extractor) = extractor_to_shutdown {
            extractor.shutdown()?;
        }

        Ok(())
    }

    /// Shut down every extractor and clear the registry.
    pub fn shutdown_all(&mut self) -> Result<()> {
        for name in self.list() {
            self.remove(&name)?;
        }
        Ok(())
    }

    /// Drop `mime_type` from a replaced extractor's entry, shutting it down once it serves
    /// nothing.
    fn release(&mut self, replaced: Arc<dyn DocumentExtractor>, mime_type: &str) -> Result<()> {
        let name = replaced.name();
        let Some(mime_types) = self.name_index.get_mut(name) else {
            return Ok(());
        };
        mime_types.retain(|m| m != mime_type);
        if !mime_types.is_empty() {
            return Ok(());
        }

        self.name_index.remove(name);
        tracing::debug!("Extractor {} no longer serves any MIME type", name);
        replaced.shutdown()
    }
}

impl Default for DocumentExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global document extractor registry.
pub static DOCUMENT_EXTRACTOR_REGISTRY: Lazy<Arc<RwLock<DocumentExtractorRegistry>>> =
    Lazy::new(|| Arc::new(RwLock::new(DocumentExtractorRegistry::new())));

pub fn get_document_extractor_registry() -> Arc<RwLock<DocumentExtractorRegistry>> {
    DOCUMENT_EXTRACTOR_REGISTRY.clone()
}
