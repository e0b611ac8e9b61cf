//! Browser automation over the W3C WebDriver protocol.
//!
//! Talks to a chromedriver-compatible endpoint (default
//! `http://127.0.0.1:9515`). When the endpoint is not already serving and a
//! `chromedriver` binary is on PATH, the tool starts one on first use and
//! owns it until `close_browser` or drop.
//!
//! A single browser session is kept between calls so a sequence of actions
//! (open, type, click, read) works against the same page.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::tools::{optional_u64, required_str, Tool, ToolArgs, ToolContext};

/// W3C element reference key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const OPERATIONS: &[&str] = &[
    "open_url",
    "find_element",
    "click_element",
    "type_in_element",
    "get_page_source",
    "get_element_text",
    "wait_for_element",
    "fill_form",
    "screenshot",
    "close_browser",
];

/// How often `wait_for_element` polls
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Upper bound for `wait_for_element`
const MAX_WAIT_SECS: u64 = 600;

#[derive(Default)]
struct BrowserState {
    /// chromedriver process we spawned, if any
    driver: Option<Child>,
    /// Active WebDriver session id
    session: Option<String>,
}

pub struct BrowserAutomationTool {
    endpoint: String,
    driver_path: Option<PathBuf>,
    headless: bool,
    client: reqwest::Client,
    state: Mutex<BrowserState>,
}

impl BrowserAutomationTool {
    /// Build the tool if a WebDriver can be reached or started.
    ///
    /// Fails when no endpoint is configured explicitly and no
    /// `chromedriver` binary is installed.
    pub fn discover(config: &BrowserConfig) -> Result<Self> {
        let driver_path = which::which("chromedriver").ok();
        if driver_path.is_none() && config.webdriver_url.is_none() {
            bail!("chromedriver not found on PATH and no browser.webdriver_url configured");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint(),
            driver_path,
            headless: config.headless,
            client,
            state: Mutex::new(BrowserState::default()),
        })
    }

    async fn driver_ready(&self) -> bool {
        let url = format!("{}/status", self.endpoint);
        match self.client.get(&url).timeout(Duration::from_secs(2)).send().await {
            Ok(resp) => resp
                .json::<Value>()
                .await
                .map(|v| v["value"]["ready"].as_bool().unwrap_or(true))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Start chromedriver if nothing is listening on the endpoint yet
    async fn ensure_driver(&self, state: &mut BrowserState) -> Result<()> {
        if self.driver_ready().await {
            return Ok(());
        }

        let path = match (&state.driver, &self.driver_path) {
            (None, Some(path)) => path.clone(),
            (Some(_), _) => bail!("chromedriver was started but is not responding at {}", self.endpoint),
            (None, None) => bail!("WebDriver endpoint {} is not reachable", self.endpoint),
        };

        let port = reqwest::Url::parse(&self.endpoint)
            .ok()
            .and_then(|u| u.port())
            .unwrap_or(9515);

        info!(path = %path.display(), port, "Starting chromedriver");
        let child = Command::new(&path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", path.display()))?;
        state.driver = Some(child);

        for _ in 0..20 {
            if self.driver_ready().await {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        bail!("chromedriver did not become ready at {}", self.endpoint)
    }

    /// Return the active session id, creating a session if needed
    async fn session(&self, state: &mut BrowserState) -> Result<String> {
        if let Some(ref id) = state.session {
            return Ok(id.clone());
        }

        self.ensure_driver(state).await?;

        let mut chrome_args = vec!["--window-size=1280,900"];
        if self.headless {
            chrome_args.push("--headless=new");
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": chrome_args }
                }
            }
        });

        let value = self.send(reqwest::Method::POST, "/session", Some(body)).await?;
        let id = value["sessionId"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("WebDriver did not return a session id"))?
            .to_string();

        info!(session = %id, "Browser session started");
        state.session = Some(id.clone());
        Ok(id)
    }

    /// Issue a WebDriver command and unwrap its `value`
    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%method, %url, "WebDriver command");

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("WebDriver request to {} failed", url))?;

        let status = resp.status();
        let payload: Value = resp.json().await.unwrap_or(Value::Null);
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let kind = value["error"].as_str().unwrap_or("unknown error");
            let message = value["message"].as_str().unwrap_or("");
            let first_line = message.lines().next().unwrap_or("");
            bail!("{}: {}", kind, first_line);
        }
        Ok(value)
    }

    async fn find_element(&self, session: &str, selector: &str) -> Result<String> {
        let value = self
            .send(
                reqwest::Method::POST,
                &format!("/session/{}/element", session),
                Some(json!({"using": "css selector", "value": selector})),
            )
            .await?;
        value[ELEMENT_KEY]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("no element reference returned for '{}'", selector))
    }

    async fn type_into(&self, session: &str, element: &str, text: &str) -> Result<()> {
        self.send(
            reqwest::Method::POST,
            &format!("/session/{}/element/{}/value", session, element),
            Some(json!({"text": text})),
        )
        .await?;
        Ok(())
    }

    async fn close(&self, state: &mut BrowserState) -> Result<String> {
        let Some(id) = state.session.take() else {
            return Ok("Browser not open.".to_string());
        };

        if let Err(e) = self
            .send(reqwest::Method::DELETE, &format!("/session/{}", id), None)
            .await
        {
            warn!(error = %e, "Failed to delete WebDriver session");
        }
        if let Some(mut child) = state.driver.take() {
            let _ = child.kill().await;
        }
        info!("Browser closed");
        Ok("Browser closed.".to_string())
    }

    async fn run_operation(
        &self,
        operation: &str,
        args: &ToolArgs,
        ctx: &ToolContext,
        state: &mut BrowserState,
    ) -> Result<String> {
        if !OPERATIONS.contains(&operation) {
            return Ok(format!("Error: Unknown browser automation operation '{}'.", operation));
        }
        if operation == "close_browser" {
            return self.close(state).await;
        }

        let session = self.session(state).await?;
        let get = reqwest::Method::GET;
        let post = reqwest::Method::POST;

        match operation {
            "open_url" => {
                let url = required_str(args, "url")?;
                self.send(post, &format!("/session/{}/url", session), Some(json!({"url": url})))
                    .await?;
                Ok(format!("Successfully opened URL: {}", url))
            }
            "find_element" => {
                let selector = required_str(args, "selector")?;
                let element = self.find_element(&session, selector).await?;
                let html = self
                    .send(get, &format!("/session/{}/element/{}/property/outerHTML", session, element), None)
                    .await?;
                Ok(html.as_str().unwrap_or_default().to_string())
            }
            "click_element" => {
                let selector = required_str(args, "selector")?;
                let element = self.find_element(&session, selector).await?;
                self.send(post, &format!("/session/{}/element/{}/click", session, element), Some(json!({})))
                    .await?;
                Ok(format!("Successfully clicked element with selector '{}'.", selector))
            }
            "type_in_element" => {
                let selector = required_str(args, "selector")?;
                let text = required_str(args, "text")?;
                let element = self.find_element(&session, selector).await?;
                self.type_into(&session, &element, text).await?;
                Ok(format!("Successfully typed '{}' in element with selector '{}'.", text, selector))
            }
            "get_page_source" => {
                let source = self.send(get, &format!("/session/{}/source", session), None).await?;
                Ok(source.as_str().unwrap_or_default().to_string())
            }
            "get_element_text" => {
                let selector = required_str(args, "selector")?;
                let element = self.find_element(&session, selector).await?;
                let text = self
                    .send(get, &format!("/session/{}/element/{}/text", session, element), None)
                    .await?;
                Ok(text.as_str().unwrap_or_default().to_string())
            }
            "wait_for_element" => {
                let selector = required_str(args, "selector")?;
                let timeout_secs = wait_timeout_secs(args);
                let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);
                loop {
                    match self.find_element(&session, selector).await {
                        Ok(_) => return Ok(format!("Element with selector '{}' is present.", selector)),
                        Err(e) if tokio::time::Instant::now() >= deadline => {
                            bail!("timed out after {}s waiting for '{}': {}", timeout_secs, selector, e)
                        }
                        Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
                    }
                }
            }
            "fill_form" => {
                let form: &Map<String, Value> = args
                    .get("form_data")
                    .and_then(|v| v.as_object())
                    .ok_or_else(|| anyhow::anyhow!("'form_data' must be a dictionary of selectors and values"))?;
                for (selector, value) in form {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    let element = self
                        .find_element(&session, selector)
                        .await
                        .with_context(|| format!("filling form for selector '{}'", selector))?;
                    self.type_into(&session, &element, &text)
                        .await
                        .with_context(|| format!("filling form for selector '{}'", selector))?;
                }
                Ok("Successfully filled the form.".to_string())
            }
            "screenshot" => {
                let file_path = ctx.resolve(required_str(args, "file_path")?);
                let encoded = self.send(get, &format!("/session/{}/screenshot", session), None).await?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded.as_str().unwrap_or_default())
                    .context("screenshot payload was not valid base64")?;
                if let Some(parent) = file_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&file_path, &bytes).await?;
                Ok(format!("Screenshot saved to {}", file_path.display()))
            }
            other => bail!("unhandled browser operation '{}'", other),
        }
    }
}

#[async_trait]
impl Tool for BrowserAutomationTool {
    fn name(&self) -> &str {
        "browser_automation"
    }

    fn description(&self) -> &str {
        "Performs web browser automation tasks. Args: operation (str), **kwargs. Valid operations: 'open_url', 'find_element', 'click_element', 'type_in_element', 'get_page_source', 'screenshot', 'close_browser', 'fill_form', 'get_element_text', 'wait_for_element'. For 'open_url', provide 'url'. For 'find_element', 'click_element' and 'get_element_text', provide 'selector' (CSS). For 'type_in_element', provide 'selector' and 'text'. For 'screenshot', provide 'file_path'. For 'fill_form', provide 'form_data' (a dictionary of selectors and values). For 'wait_for_element', provide 'selector' and 'timeout' (optional, default 10)."
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String> {
        let operation = required_str(args, "operation")?;
        info!(operation, "Executing browser automation operation");

        let mut state = self.state.lock().await;
        let result = self.run_operation(operation, args, ctx, &mut state).await;

        // A dead session would fail every later call; forget it so the next
        // call starts fresh.
        if let Err(ref e) = result {
            let msg = e.to_string();
            if msg.contains("invalid session id") || msg.contains("no such window") {
                state.session = None;
            }
        }
        result.map_err(|e| e.context(format!("browser operation '{}' failed", operation)))
    }
}

/// `timeout` argument of `wait_for_element`, default 10s, capped
fn wait_timeout_secs(args: &ToolArgs) -> u64 {
    optional_u64(args, "timeout").unwrap_or(10).min(MAX_WAIT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> BrowserConfig {
        BrowserConfig {
            webdriver_url: Some("http://127.0.0.1:9".to_string()),
            headless: true,
            request_timeout_secs: 2,
        }
    }

    #[test]
    fn test_discover_with_explicit_endpoint() {
        let tool = BrowserAutomationTool::discover(&unreachable_config()).unwrap();
        assert_eq!(tool.name(), "browser_automation");
        assert_eq!(tool.endpoint, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn test_close_without_session() {
        let tool = BrowserAutomationTool::discover(&unreachable_config()).unwrap();
        let args = json!({"operation": "close_browser"}).as_object().cloned().unwrap();
        let out = tool.execute(&args, &ToolContext::default()).await.unwrap();
        assert_eq!(out, "Browser not open.");
    }

    #[tokio::test]
    async fn test_unreachable_driver_is_error() {
        let mut tool = BrowserAutomationTool::discover(&unreachable_config()).unwrap();
        tool.driver_path = None;
        let args = json!({"operation": "open_url", "url": "https://example.com"})
            .as_object()
            .cloned()
            .unwrap();
        let err = tool.execute(&args, &ToolContext::default()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not reachable"));
    }

    #[tokio::test]
    async fn test_unknown_operation_needs_no_session() {
        let tool = BrowserAutomationTool::discover(&unreachable_config()).unwrap();
        let args = json!({"operation": "scroll"}).as_object().cloned().unwrap();
        let out = tool.execute(&args, &ToolContext::default()).await.unwrap();
        assert_eq!(out, "Error: Unknown browser automation operation 'scroll'.");
    }

    #[test]
    fn test_wait_timeout_is_capped() {
        let args = |v: Value| v.as_object().cloned().unwrap();
        assert_eq!(wait_timeout_secs(&args(json!({}))), 10);
        assert_eq!(wait_timeout_secs(&args(json!({"timeout": 3}))), 3);
        assert_eq!(wait_timeout_secs(&args(json!({"timeout": u64::MAX}))), MAX_WAIT_SECS);
    }
}
