use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{bail, Result};

use crate::translate::wait::WaitConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translator_config: TranslatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Verbose logging for this crate and the HTTP layer
    #[serde(default = "default_debug")]
    pub debug: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_debug() -> bool {
    true
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: default_debug(),
        }
    }
}

/// Settings for the browser-driven translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    #[serde(default = "default_input_xpath")]
    pub input_xpath: String,
    #[serde(default = "default_output_xpath")]
    pub output_xpath: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub disable_gpu: bool,
    /// Needed when running chrome as root inside containers
    #[serde(default)]
    pub no_sandbox: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Where per-session profiles are created; the system temp dir when unset
    #[serde(default)]
    pub profile_root: Option<PathBuf>,
    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive identical reads before the output counts as rendered
    #[serde(default = "default_stable_polls")]
    pub stable_polls: u32,
}

fn default_base_url() -> String {
    "https://translate.google.com/".to_string()
}

fn default_source_lang() -> String {
    "en".to_string()
}

fn default_target_lang() -> String {
    "luo".to_string()
}

fn default_input_xpath() -> String {
    "//textarea[@aria-label='Source text']".to_string()
}

fn default_output_xpath() -> String {
    "//span[@jsname='W297wb']".to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_load_timeout_ms() -> u64 {
    10_000
}

fn default_render_timeout_ms() -> u64 {
    15_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_stable_polls() -> u32 {
    2
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            input_xpath: default_input_xpath(),
            output_xpath: default_output_xpath(),
            headless: true,
            disable_gpu: true,
            no_sandbox: false,
            chrome_executable: None,
            profile_root: None,
            page_load_timeout_ms: default_page_load_timeout_ms(),
            render_timeout_ms: default_render_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            stable_polls: default_stable_polls(),
        }
    }
}

impl TranslatorConfig {
    /// Page URL with the language pair preselected, e.g. `?sl=en&tl=luo`
    pub fn translate_url(&self) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}sl={}&tl={}",
            self.base_url,
            separator,
            urlencoding::encode(&self.source_lang),
            urlencoding::encode(&self.target_lang),
        )
    }

    pub fn page_load_wait(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(self.page_load_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    pub fn render_wait(&self) -> WaitConfig {
        WaitConfig::new(
            Duration::from_millis(self.render_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_xpath.trim().is_empty() || self.output_xpath.trim().is_empty() {
            bail!("input_xpath and output_xpath must not be empty");
        }
        if self.page_load_timeout_ms == 0 || self.render_timeout_ms == 0 {
            bail!("page_load_timeout_ms and render_timeout_ms must be greater than zero");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.stable_polls == 0 {
            bail!("stable_polls must be at least 1");
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.translator_config.validate()?;
        Ok(config)
    }

    /// Loads the first config file found, falling back to built-in defaults.
    ///
    /// Returns the path that was loaded, if any. Runs before tracing is
    /// initialised, so the caller is responsible for logging the result.
    pub fn discover() -> Result<(Self, Option<String>)> {
        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        for path in candidates {
            if Path::new(&path).exists() {
                let config = Self::load(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }
}
