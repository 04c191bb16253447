use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::TranslatorConfig;
use super::interface::{TranslateInterface, TranslationOutcome};
use super::session::{BrowserSession, SessionError, SessionLauncher};

/// Drives a third-party translation page through a fresh browser per call.
pub struct BrowserTranslator {
    launcher: Arc<dyn SessionLauncher>,
    config: TranslatorConfig,
}

impl BrowserTranslator {
    pub fn new(launcher: Arc<dyn SessionLauncher>, config: TranslatorConfig) -> Self {
        Self { launcher, config }
    }

    async fn run(&self, text: &str) -> TranslationOutcome {
        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Browser launch failed: {}", e);
                return TranslationOutcome::Failed(e.to_string());
            }
        };
        debug!("Browser session started");

        let outcome = match self.drive(session.as_mut(), text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Translation failed: {}", e);
                TranslationOutcome::Failed(e.to_string())
            }
        };

        // Teardown failures are logged only; the outcome stands.
        match session.close().await {
            Ok(()) => debug!("Browser session closed"),
            Err(e) => warn!("Browser teardown failed: {}", e),
        }

        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        text: &str,
    ) -> Result<TranslationOutcome, SessionError> {
        let url = self.config.translate_url();
        debug!("Navigating to {}", url);
        session.navigate(&url).await?;

        session
            .wait_for(&self.config.input_xpath, self.config.page_load_wait())
            .await?;
        session.set_input_text(&self.config.input_xpath, text).await?;

        self.await_rendered_output(session).await
    }

    /// Polls the output element until its text is non-empty and unchanged for
    /// `stable_polls` consecutive reads, or the render wait runs out.
    async fn await_rendered_output(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<TranslationOutcome, SessionError> {
        let xpath = &self.config.output_xpath;
        let mut poller = self.config.render_wait().start();
        let mut element_seen = false;
        let mut last: Option<String> = None;
        let mut stable = 0u32;

        loop {
            if let Some(current) = session.read_output_text(xpath).await? {
                element_seen = true;
                let current = current.trim().to_string();
                if current.is_empty() {
                    stable = 0;
                } else if last.as_deref() == Some(current.as_str()) {
                    stable += 1;
                } else {
                    stable = 1;
                }
                last = Some(current);
                if stable >= self.config.stable_polls {
                    break;
                }
            }
            if !poller.tick().await {
                break;
            }
        }

        if !element_seen {
            return Err(SessionError::ElementNotFound {
                xpath: xpath.clone(),
            });
        }
        // A non-empty read that never settled is still the best answer we have.
        match last {
            Some(text) if !text.is_empty() => Ok(TranslationOutcome::Translated(text)),
            _ => Ok(TranslationOutcome::NotFound),
        }
    }
}

#[async_trait]
impl TranslateInterface for BrowserTranslator {
    async fn translate(&self, text: &str) -> TranslationOutcome {
        let call_id = Uuid::new_v4();
        let span = info_span!("translate", %call_id);
        async move {
            info!("Translating {} chars", text.chars().count());
            let outcome = self.run(text).await;
            info!("Translation finished, success={}", outcome.is_success());
            outcome
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::wait::WaitConfig;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counters {
        launches: AtomicUsize,
        closes: AtomicUsize,
        typed: Mutex<Vec<String>>,
        visited: Mutex<Vec<String>>,
    }

    #[derive(Clone, Default)]
    struct Script {
        fail_launch: bool,
        fail_navigate: bool,
        missing_input: bool,
        fail_close: bool,
        /// Successive reads of the output element; the last one repeats
        reads: Vec<Option<String>>,
    }

    struct FakeLauncher {
        counters: Arc<Counters>,
        script: Script,
    }

    struct FakeSession {
        counters: Arc<Counters>,
        script: Script,
        reads: VecDeque<Option<String>>,
        closed: bool,
    }

    #[async_trait]
    impl SessionLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
            if self.script.fail_launch {
                return Err(SessionError::Launch("chrome not found".into()));
            }
            self.counters.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                counters: self.counters.clone(),
                script: self.script.clone(),
                reads: self.script.reads.clone().into(),
                closed: false,
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
            self.counters.visited.lock().unwrap().push(url.to_string());
            if self.script.fail_navigate {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".into(),
                });
            }
            Ok(())
        }

        async fn wait_for(&mut self, xpath: &str, wait: WaitConfig) -> Result<(), SessionError> {
            assert!(!xpath.is_empty());
            assert!(wait.timeout > std::time::Duration::ZERO);
            if self.script.missing_input {
                return Err(SessionError::Timeout(wait.timeout));
            }
            Ok(())
        }

        async fn set_input_text(&mut self, _xpath: &str, text: &str) -> Result<(), SessionError> {
            self.counters.typed.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn read_output_text(&mut self, _xpath: &str) -> Result<Option<String>, SessionError> {
            if self.reads.len() > 1 {
                return Ok(self.reads.pop_front().flatten());
            }
            Ok(self.reads.front().cloned().flatten())
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            assert!(!self.closed, "session closed twice");
            self.closed = true;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            if self.script.fail_close {
                return Err(SessionError::Close("process already exited".into()));
            }
            Ok(())
        }
    }

    fn fast_config() -> TranslatorConfig {
        TranslatorConfig {
            page_load_timeout_ms: 50,
            render_timeout_ms: 60,
            poll_interval_ms: 5,
            ..TranslatorConfig::default()
        }
    }

    fn translator(script: Script) -> (BrowserTranslator, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let launcher = FakeLauncher {
            counters: counters.clone(),
            script,
        };
        (BrowserTranslator::new(Arc::new(launcher), fast_config()), counters)
    }

    fn reads(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[tokio::test]
    async fn returns_rendered_translation_and_closes_once() {
        let (translator, counters) = translator(Script {
            reads: reads(&[Some("Amosiepo")]),
            ..Script::default()
        });

        let outcome = translator.translate("Hello").await;

        assert_eq!(outcome, TranslationOutcome::Translated("Amosiepo".into()));
        assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert_eq!(*counters.typed.lock().unwrap(), vec!["Hello".to_string()]);
        assert_eq!(
            *counters.visited.lock().unwrap(),
            vec!["https://translate.google.com/?sl=en&tl=luo".to_string()]
        );
    }

    #[tokio::test]
    async fn waits_for_output_to_settle() {
        let (translator, _) = translator(Script {
            reads: reads(&[None, Some(""), Some("Amo"), Some(" Amosiepo "), Some("Amosiepo")]),
            ..Script::default()
        });

        let outcome = translator.translate("Hello").await;

        assert_eq!(outcome, TranslationOutcome::Translated("Amosiepo".into()));
    }

    #[tokio::test]
    async fn empty_output_becomes_not_found() {
        let (translator, counters) = translator(Script {
            reads: reads(&[Some("")]),
            ..Script::default()
        });

        let outcome = translator.translate("Hello").await;

        assert_eq!(outcome, TranslationOutcome::NotFound);
        assert_eq!(outcome.into_result().translated, "Translation not found.");
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn whitespace_output_becomes_not_found() {
        let (translator, _) = translator(Script {
            reads: reads(&[Some("   "), Some("\n\t")]),
            ..Script::default()
        });

        assert_eq!(translator.translate("Hello").await, TranslationOutcome::NotFound);
    }

    #[tokio::test]
    async fn unsettled_output_is_still_returned() {
        let flicker: Vec<Option<String>> = (0..200)
            .map(|i| Some(if i % 2 == 0 { "a" } else { "b" }.to_string()))
            .collect();
        let (translator, counters) = translator(Script {
            reads: flicker,
            ..Script::default()
        });

        let outcome = translator.translate("Hello").await;

        assert!(
            matches!(&outcome, TranslationOutcome::Translated(text) if text == "a" || text == "b"),
            "unexpected outcome {:?}",
            outcome
        );
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_output_element_is_an_error() {
        let (translator, counters) = translator(Script {
            reads: reads(&[None]),
            ..Script::default()
        });

        let result = translator.translate("Hello").await.into_result();

        assert!(result.translated.starts_with("Error: "));
        assert!(result.translated.contains("W297wb"));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn navigation_failure_still_closes_session() {
        let (translator, counters) = translator(Script {
            fail_navigate: true,
            ..Script::default()
        });

        let result = translator.translate("Hello").await.into_result();

        assert!(result.translated.starts_with("Error: navigation to"));
        assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(counters.typed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_input_element_still_closes_session() {
        let (translator, counters) = translator(Script {
            missing_input: true,
            ..Script::default()
        });

        let result = translator.translate("Hello").await.into_result();

        assert_eq!(result.translated, "Error: timed out after 50ms waiting for the page");
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
        assert!(counters.typed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn launch_failure_reports_error_without_session() {
        let (translator, counters) = translator(Script {
            fail_launch: true,
            ..Script::default()
        });

        let result = translator.translate("Hello").await.into_result();

        assert_eq!(result.translated, "Error: failed to launch browser: chrome not found");
        assert_eq!(counters.launches.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn teardown_failure_does_not_change_outcome() {
        let (translator, counters) = translator(Script {
            fail_close: true,
            reads: reads(&[Some("Amosiepo")]),
            ..Script::default()
        });

        let outcome = translator.translate("Hello").await;

        assert_eq!(outcome, TranslationOutcome::Translated("Amosiepo".into()));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn identical_input_gives_identical_output() {
        let (translator, counters) = translator(Script {
            reads: reads(&[Some("Amosiepo")]),
            ..Script::default()
        });

        let first = translator.translate("Hello").await;
        let second = translator.translate("Hello").await;

        assert_eq!(first, second);
        assert_eq!(counters.launches.load(Ordering::SeqCst), 2);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 2);
    }
}
