use async_trait::async_trait;
use thiserror::Error;

use super::wait::WaitConfig;

/// Failures raised while driving a browser session.
///
/// The `Display` text is what callers see after the `"Error: "` prefix.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no such element: unable to locate element {xpath}")]
    ElementNotFound { xpath: String },

    #[error("timed out after {0:?} waiting for the page")]
    Timeout(std::time::Duration),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("failed to close browser: {0}")]
    Close(String),
}

/// One isolated browser instance, owned by a single translation call.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Poll until the element at `xpath` exists or the wait times out.
    async fn wait_for(&mut self, xpath: &str, wait: WaitConfig) -> Result<(), SessionError>;

    /// Clear the element's current content, then type `text` into it.
    async fn set_input_text(&mut self, xpath: &str, text: &str) -> Result<(), SessionError>;

    /// Rendered text of the element, or `None` when it is not in the page.
    async fn read_output_text(&mut self, xpath: &str) -> Result<Option<String>, SessionError>;

    /// Terminate the browser. Called once per session.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Starts a fresh [`BrowserSession`] for each call.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError>;
}
