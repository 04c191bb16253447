//! Headless Chrome sessions over CDP, via chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::config::TranslatorConfig;
use super::session::{BrowserSession, SessionError, SessionLauncher};
use super::wait::WaitConfig;

/// Clears a form field and lets the page's listeners see the change.
const CLEAR_VALUE_JS: &str = "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }";

/// Upper bound on waiting for the chrome process to exit after close.
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-session chrome profile. Removed on close, or best-effort on drop.
struct ProfileDir {
    path: PathBuf,
    removed: bool,
}

impl ProfileDir {
    async fn create(root: &Path) -> io::Result<Self> {
        let path = root.join(format!("dholuo-translator-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    async fn remove(&mut self) -> io::Result<()> {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if !self.removed {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}

/// Launches one Chrome process per session, each with its own profile directory.
pub struct ChromiumLauncher {
    config: TranslatorConfig,
}

impl ChromiumLauncher {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .request_timeout(Duration::from_millis(self.config.page_load_timeout_ms.max(1_000)));

        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.disable_gpu {
            builder = builder.arg("--disable-gpu");
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &self.config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(SessionError::Launch)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let root = self
            .config
            .profile_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        // Dropped (and deleted) on every early return below.
        let profile = ProfileDir::create(&root)
            .await
            .map_err(|e| SessionError::Launch(format!("cannot create profile dir: {}", e)))?;
        let config = self.browser_config(&profile.path)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The CDP handler must be polled for the browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });
        debug!("Launched chrome with profile {}", profile.path.display());

        Ok(Box::new(ChromiumSession {
            browser,
            page: None,
            handler_task,
            profile,
            closed: false,
        }))
    }
}

// Field order matters on drop: the browser (and its process) goes before the profile.
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    profile: ProfileDir,
    closed: bool,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, SessionError> {
        self.page
            .as_ref()
            .ok_or_else(|| SessionError::Browser("no page open; navigate first".to_string()))
    }
}

fn element_error(xpath: &str, error: CdpError) -> SessionError {
    match error {
        CdpError::NotFound => SessionError::ElementNotFound {
            xpath: xpath.to_string(),
        },
        other => SessionError::Browser(other.to_string()),
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let navigation_error = |e: CdpError| SessionError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        if let Some(page) = &self.page {
            page.goto(url).await.map_err(navigation_error)?;
            return Ok(());
        }
        let page = self.browser.new_page(url).await.map_err(navigation_error)?;
        self.page = Some(page);
        Ok(())
    }

    async fn wait_for(&mut self, xpath: &str, wait: WaitConfig) -> Result<(), SessionError> {
        let page = self.page()?;
        let mut poller = wait.start();
        loop {
            match page.find_xpath(xpath).await {
                Ok(_) => return Ok(()),
                Err(CdpError::NotFound) => {}
                Err(e) => return Err(SessionError::Browser(e.to_string())),
            }
            if !poller.tick().await {
                debug!("Element {} did not appear within {:?}", xpath, wait.timeout);
                return Err(SessionError::Timeout(wait.timeout));
            }
        }
    }

    async fn set_input_text(&mut self, xpath: &str, text: &str) -> Result<(), SessionError> {
        let page = self.page()?;
        let element = page.find_xpath(xpath).await.map_err(|e| element_error(xpath, e))?;

        element
            .click()
            .await
            .map_err(|e| SessionError::Browser(format!("click failed: {}", e)))?;
        element
            .call_js_fn(CLEAR_VALUE_JS, false)
            .await
            .map_err(|e| SessionError::Browser(format!("clear failed: {}", e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| SessionError::Browser(format!("typing failed: {}", e)))?;
        Ok(())
    }

    async fn read_output_text(&mut self, xpath: &str) -> Result<Option<String>, SessionError> {
        let page = self.page()?;
        let element = match page.find_xpath(xpath).await {
            Ok(element) => element,
            Err(CdpError::NotFound) => return Ok(None),
            Err(e) => return Err(SessionError::Browser(e.to_string())),
        };

        let text = element
            .inner_text()
            .await
            .map_err(|e| SessionError::Browser(e.to_string()))?;
        Ok(Some(text.unwrap_or_default()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        let closed = self.browser.close().await.map(|_| ());
        if closed.is_err() {
            // CDP is gone; the process may not be.
            if let Some(Err(e)) = self.browser.kill().await {
                debug!("Could not kill chrome: {}", e);
            }
        }
        let waited = match tokio::time::timeout(EXIT_TIMEOUT, self.browser.wait()).await {
            Ok(waited) => waited.map(|_| ()).map_err(|e| e.to_string()),
            Err(_) => {
                let _ = self.browser.kill().await;
                Err(format!("chrome did not exit within {:?}", EXIT_TIMEOUT))
            }
        };
        self.handler_task.abort();

        if let Err(e) = self.profile.remove().await {
            debug!("Could not remove profile {}: {}", self.profile.path.display(), e);
        }

        closed.map_err(|e| SessionError::Close(e.to_string()))?;
        waited.map_err(SessionError::Close)?;
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            self.handler_task.abort();
        }
    }
}
