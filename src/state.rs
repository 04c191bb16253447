use std::sync::Arc;

use crate::config::Config;
use crate::translate::{TranslateInterface, TranslatorFactory};

/// Shared by every request. Holds no mutable state.
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<dyn TranslateInterface>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let translator = TranslatorFactory::create_translator(&config.translator_config)?;
        Ok(Self::with_translator(translator))
    }

    pub fn with_translator(translator: Arc<dyn TranslateInterface>) -> Self {
        Self { translator }
    }
}
