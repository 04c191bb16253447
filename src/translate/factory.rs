use std::sync::Arc;
use anyhow::Result;
use tracing::info;
use crate::config::TranslatorConfig;
use super::chromium::ChromiumLauncher;
use super::interface::TranslateInterface;
use super::translator::BrowserTranslator;

/// Factory for creating the translator used by the HTTP layer
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a browser-backed translator from configuration
    ///
    /// # Arguments
    /// * `config` - translator section of the service configuration
    ///
    /// # Returns
    /// Shared TranslateInterface implementation
    pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn TranslateInterface>> {
        config.validate()?;
        info!(
            "Initializing browser translator: {} -> {} via {}",
            config.source_lang,
            config.target_lang,
            config.translate_url()
        );

        let launcher = Arc::new(ChromiumLauncher::new(config.clone()));
        Ok(Arc::new(BrowserTranslator::new(launcher, config.clone())))
    }
}
