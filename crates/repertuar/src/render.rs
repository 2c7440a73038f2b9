use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use tokio::time::error::Elapsed;
use tokio::time::{Instant, timeout, timeout_at};

use crate::settings::RenderSettings;

const RELEASE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Rendering {url} did not finish within {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("Could not load {url}: {reason}")]
    Connectivity { url: String, reason: String },
    #[error("Headless browser failure: {0}")]
    Browser(String),
}

pub trait PageRenderer {
    fn render(&self, url: &str) -> impl Future<Output = Result<String, RenderError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    timeout: Duration,
    settle: Duration,
    chrome_executable: Option<PathBuf>,
}

impl HeadlessRenderer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            settle: Duration::from_millis(settings.settle_millis),
            chrome_executable: settings.chrome_executable.clone(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .launch_timeout(self.timeout)
            .request_timeout(self.timeout);
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Browser)
    }

    // `goto` reports a failed navigation (DNS, refused connection) as an
    // error, where `new_page(url)` would hand back Chrome's error page.
    async fn load(&self, browser: &Browser, url: &str) -> Result<String, CdpError> {
        let page = browser.new_page("about:blank").await?;
        page.goto(url).await?;
        tokio::time::sleep(self.settle).await;
        page.content().await
    }

    async fn render_page(&self, url: &str) -> Result<String, RenderError> {
        let deadline = Instant::now() + self.timeout;

        let (mut browser, mut handler) =
            match timeout_at(deadline, Browser::launch(self.browser_config()?)).await {
                Ok(Ok(launched)) => launched,
                Ok(Err(e)) => return Err(launch_failure(url, self.timeout, Ok(e))),
                Err(elapsed) => return Err(launch_failure(url, self.timeout, Err(elapsed))),
            };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::warn!("Headless browser handler error: {e:?}");
                }
            }
        });

        let outcome = timeout_at(deadline, self.load(&browser, url)).await;

        release(&mut browser, RELEASE_GRACE).await;
        handler_task.abort();

        navigation_outcome(url, self.timeout, outcome)
    }
}

impl PageRenderer for HeadlessRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        log::debug!("Rendering {url} in headless browser...");
        self.render_page(url)
            .await
            .inspect_err(|e| log::error!("Render error: {e:?}"))
    }
}

fn is_timeout(e: &CdpError) -> bool {
    matches!(e, CdpError::Timeout | CdpError::LaunchTimeout(_))
}

fn timed_out(url: &str, limit: Duration) -> RenderError {
    RenderError::Timeout {
        url: url.to_string(),
        timeout: limit,
    }
}

fn launch_failure(url: &str, limit: Duration, outcome: Result<CdpError, Elapsed>) -> RenderError {
    match outcome {
        Err(_) => timed_out(url, limit),
        Ok(e) if is_timeout(&e) => timed_out(url, limit),
        Ok(e) => RenderError::Browser(e.to_string()),
    }
}

fn navigation_outcome(
    url: &str,
    limit: Duration,
    outcome: Result<Result<String, CdpError>, Elapsed>,
) -> Result<String, RenderError> {
    match outcome {
        Ok(Ok(html)) => Ok(html),
        Err(_) => Err(timed_out(url, limit)),
        Ok(Err(e)) if is_timeout(&e) => Err(timed_out(url, limit)),
        Ok(Err(e)) => Err(RenderError::Connectivity {
            url: url.to_string(),
            reason: e.to_string(),
        }),
    }
}

trait BrowserSession {
    fn shut_down(&mut self) -> impl Future<Output = Result<(), String>> + Send;
    fn reap(&mut self) -> impl Future<Output = Result<(), String>> + Send;
    fn kill_process(&mut self) -> impl Future<Output = Result<(), String>> + Send;
}

impl BrowserSession for Browser {
    async fn shut_down(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn reap(&mut self) -> Result<(), String> {
        self.wait().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill_process(&mut self) -> Result<(), String> {
        match self.kill().await {
            Some(Err(e)) => Err(e.to_string()),
            _ => Ok(()),
        }
    }
}

/// Close the browser and wait for its process, each step bounded by `grace`.
/// Falls back to killing the process when either step fails or stalls.
async fn release<S: BrowserSession>(session: &mut S, grace: Duration) {
    match timeout(grace, session.shut_down()).await {
        Ok(Ok(())) => match timeout(grace, session.reap()).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => log::warn!("Failed to reap headless browser process: {e}"),
            Err(_) => log::warn!("Headless browser did not exit within {grace:?}"),
        },
        Ok(Err(e)) => log::warn!("Failed to close headless browser: {e}"),
        Err(_) => log::warn!("Closing headless browser stalled for {grace:?}"),
    }

    match timeout(grace, session.kill_process()).await {
        Ok(Ok(())) => log::debug!("Killed headless browser process"),
        Ok(Err(e)) => log::error!("Failed to kill headless browser process: {e}"),
        Err(_) => log::error!("Killing headless browser process stalled for {grace:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    const URL: &str = "https://www.cinema-city.pl/#/buy-tickets-by-cinema";
    const LIMIT: Duration = Duration::from_secs(30);
    const GRACE: Duration = Duration::from_millis(20);

    async fn elapsed() -> Elapsed {
        timeout(Duration::ZERO, pending::<()>()).await.unwrap_err()
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Done,
        Fail,
        Stall,
    }

    async fn run(step: Step) -> Result<(), String> {
        match step {
            Step::Done => Ok(()),
            Step::Fail => Err("channel closed".to_string()),
            Step::Stall => pending().await,
        }
    }

    struct FakeSession {
        close: Step,
        wait: Step,
        calls: Vec<&'static str>,
    }

    impl FakeSession {
        fn new(close: Step, wait: Step) -> Self {
            Self {
                close,
                wait,
                calls: Vec::new(),
            }
        }
    }

    impl BrowserSession for FakeSession {
        fn shut_down(&mut self) -> impl Future<Output = Result<(), String>> + Send {
            self.calls.push("close");
            run(self.close)
        }

        fn reap(&mut self) -> impl Future<Output = Result<(), String>> + Send {
            self.calls.push("wait");
            run(self.wait)
        }

        fn kill_process(&mut self) -> impl Future<Output = Result<(), String>> + Send {
            self.calls.push("kill");
            run(Step::Done)
        }
    }

    #[test]
    fn test_headless_renderer_uses_settings() {
        let settings = RenderSettings {
            timeout_secs: 12,
            settle_millis: 250,
            chrome_executable: Some(PathBuf::from("/usr/bin/chromium")),
        };
        let renderer = HeadlessRenderer::new(&settings);
        assert_eq!(renderer.timeout, Duration::from_secs(12));
        assert_eq!(renderer.settle, Duration::from_millis(250));
        assert_eq!(
            renderer.chrome_executable.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_render_error_messages() {
        assert_eq!(
            timed_out("https://example.com", LIMIT).to_string(),
            "Rendering https://example.com did not finish within 30s"
        );

        let err = RenderError::Connectivity {
            url: "https://example.com".to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        };
        assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    }

    #[tokio::test]
    async fn test_navigation_outcome_classification() {
        assert_eq!(
            navigation_outcome(URL, LIMIT, Ok(Ok("<html></html>".to_string()))).unwrap(),
            "<html></html>"
        );

        let failed = Ok(Err(CdpError::ChromeMessage(
            "net::ERR_NAME_NOT_RESOLVED".to_string(),
        )));
        match navigation_outcome(URL, LIMIT, failed) {
            Err(RenderError::Connectivity { url, reason }) => {
                assert_eq!(url, URL);
                assert!(reason.contains("net::ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("Expected Connectivity, got {other:?}"),
        }

        assert!(matches!(
            navigation_outcome(URL, LIMIT, Err(elapsed().await)),
            Err(RenderError::Timeout { timeout, .. }) if timeout == LIMIT
        ));
        assert!(matches!(
            navigation_outcome(URL, LIMIT, Ok(Err(CdpError::Timeout))),
            Err(RenderError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_launch_failure_classification() {
        assert!(matches!(
            launch_failure(URL, LIMIT, Err(elapsed().await)),
            RenderError::Timeout { .. }
        ));
        assert!(matches!(
            launch_failure(URL, LIMIT, Ok(CdpError::Timeout)),
            RenderError::Timeout { .. }
        ));
        assert!(matches!(
            launch_failure(URL, LIMIT, Ok(CdpError::NotFound)),
            RenderError::Browser(_)
        ));
    }

    #[tokio::test]
    async fn test_release_clean_shutdown_does_not_kill() {
        let mut session = FakeSession::new(Step::Done, Step::Done);
        release(&mut session, GRACE).await;
        assert_eq!(session.calls, ["close", "wait"]);
    }

    #[tokio::test]
    async fn test_release_kills_when_close_fails() {
        let mut session = FakeSession::new(Step::Fail, Step::Stall);
        release(&mut session, GRACE).await;
        assert_eq!(session.calls, ["close", "kill"]);
    }

    #[tokio::test]
    async fn test_release_kills_when_close_stalls() {
        let mut session = FakeSession::new(Step::Stall, Step::Done);
        release(&mut session, GRACE).await;
        assert_eq!(session.calls, ["close", "kill"]);
    }

    #[tokio::test]
    async fn test_release_kills_when_process_does_not_exit() {
        let mut session = FakeSession::new(Step::Done, Step::Stall);
        tokio::time::timeout(Duration::from_secs(5), release(&mut session, GRACE))
            .await
            .expect("release must not hang");
        assert_eq!(session.calls, ["close", "wait", "kill"]);
    }
}
