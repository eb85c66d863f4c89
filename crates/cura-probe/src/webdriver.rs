//! Blocking W3C WebDriver client.
//!
//! Talks the JSON wire protocol to a running chromedriver. Every command
//! is one HTTP round trip; there is no implicit wait, so "no such element"
//! maps to `Ok(None)` and the explicit waits in [`crate::wait`] do the
//! polling.

use crate::driver::{Driver, DriverConfig, Element};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use reqwest::Method;
use serde_json::{json, Value};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// Key under which W3C element references are returned
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const NO_SUCH_ELEMENT: &str = "no such element";
const STALE_ELEMENT: &str = "stale element reference";

#[derive(Debug)]
struct Inner {
    http: Client,
    base: String,
    session_id: String,
}

impl Inner {
    fn command(&self, method: Method, path: &str, body: Option<Value>) -> ProbeResult<Value> {
        let url = format!("{}/session/{}{path}", self.base, self.session_id);
        debug!(%method, path, "webdriver command");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        decode(request.send()?)
    }

    fn get(&self, path: &str) -> ProbeResult<Value> {
        self.command(Method::GET, path, None)
    }

    fn post(&self, path: &str, body: Value) -> ProbeResult<Value> {
        self.command(Method::POST, path, Some(body))
    }
}

fn decode(response: Response) -> ProbeResult<Value> {
    let success = response.status().is_success();
    let text = response.text()?;
    let body: Value = serde_json::from_str(&text).map_err(|_| {
        ProbeError::webdriver("unknown error", format!("non-JSON response: {text}"))
    })?;
    unwrap_value(success, body)
}

/// Extract `value` from a wire response, turning error payloads into
/// [`ProbeError::WebDriver`].
fn unwrap_value(success: bool, mut body: Value) -> ProbeResult<Value> {
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(ProbeError::webdriver(error, message));
    }
    if !success {
        return Err(ProbeError::webdriver("unknown error", value.to_string()));
    }
    Ok(value)
}

fn element_id(value: &Value) -> ProbeResult<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ProbeError::webdriver("unknown error", format!("not an element reference: {value}")))
}

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = locator.to_w3c();
    json!({ "using": using, "value": value })
}

fn is_error(err: &ProbeError, code: &str) -> bool {
    matches!(err, ProbeError::WebDriver { error, .. } if error == code)
}

// =============================================================================
// SESSION
// =============================================================================

/// A live chromedriver session
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    inner: Rc<Inner>,
}

impl WebDriverSession {
    /// Start a new browser session
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Session`] if chromedriver is unreachable or
    /// refuses the capabilities.
    pub fn connect(config: &DriverConfig) -> ProbeResult<Self> {
        let base = config.webdriver_url.trim_end_matches('/').to_string();
        let http = Client::builder().timeout(config.command_timeout()).build()?;
        info!(url = %base, headless = config.headless, "starting browser session");

        let response = http
            .post(format!("{base}/session"))
            .json(&config.capabilities())
            .send()
            .map_err(|e| ProbeError::session(format!("cannot reach WebDriver at {base}: {e}")))?;
        let value = decode(response)
            .map_err(|e| ProbeError::session(format!("session not created: {e}")))?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::session("response carried no sessionId"))?
            .to_string();

        info!(session_id = %session_id, "browser session started");
        Ok(Self {
            inner: Rc::new(Inner {
                http,
                base,
                session_id,
            }),
        })
    }

    /// Session id assigned by chromedriver
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    fn element(&self, value: &Value, locator: &Locator) -> ProbeResult<RemoteElement> {
        Ok(RemoteElement {
            inner: Rc::clone(&self.inner),
            id: element_id(value)?,
            origin: locator.to_string(),
        })
    }
}

impl Driver for WebDriverSession {
    type Element = RemoteElement;

    fn navigate(&self, url: &str) -> ProbeResult<()> {
        info!(url, "navigating");
        self.inner.post("/url", json!({ "url": url })).map(|_| ())
    }

    fn current_url(&self) -> ProbeResult<String> {
        Ok(self.inner.get("/url")?.as_str().unwrap_or_default().to_string())
    }

    fn title(&self) -> ProbeResult<String> {
        Ok(self.inner.get("/title")?.as_str().unwrap_or_default().to_string())
    }

    fn back(&self) -> ProbeResult<()> {
        self.inner.post("/back", json!({})).map(|_| ())
    }

    fn find_element(&self, locator: &Locator) -> ProbeResult<Option<RemoteElement>> {
        match self.inner.post("/element", locator_body(locator)) {
            Ok(value) => self.element(&value, locator).map(Some),
            Err(e) if is_error(&e, NO_SUCH_ELEMENT) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<RemoteElement>> {
        let value = self.inner.post("/elements", locator_body(locator))?;
        value
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|v| self.element(v, locator))
            .collect()
    }

    fn execute_script(&self, script: &str) -> ProbeResult<Value> {
        self.inner
            .post("/execute/sync", json!({ "script": script, "args": [] }))
    }

    fn save_screenshot(&self, path: &Path) -> ProbeResult<()> {
        let value = self.inner.get("/screenshot")?;
        let encoded = value.as_str().unwrap_or_default();
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn quit(&self) -> ProbeResult<()> {
        info!(session_id = %self.inner.session_id, "quitting browser session");
        self.inner.command(Method::DELETE, "", None).map(|_| ())
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Reference to an element in the remote DOM
#[derive(Debug, Clone)]
pub struct RemoteElement {
    inner: Rc<Inner>,
    id: String,
    origin: String,
}

impl RemoteElement {
    /// W3C element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn call(&self, method: Method, suffix: &str, body: Option<Value>) -> ProbeResult<Value> {
        let path = format!("/element/{}{suffix}", self.id);
        self.inner
            .command(method, &path, body)
            .map_err(|e| self.map_stale(e))
    }

    fn map_stale(&self, err: ProbeError) -> ProbeError {
        if is_error(&err, STALE_ELEMENT) {
            ProbeError::StaleElement {
                locator: self.origin.clone(),
            }
        } else {
            err
        }
    }

    fn flag(&self, suffix: &str) -> ProbeResult<bool> {
        Ok(self
            .call(Method::GET, suffix, None)?
            .as_bool()
            .unwrap_or(false))
    }
}

impl Element for RemoteElement {
    fn click(&self) -> ProbeResult<()> {
        self.call(Method::POST, "/click", Some(json!({}))).map(|_| ())
    }

    fn clear(&self) -> ProbeResult<()> {
        self.call(Method::POST, "/clear", Some(json!({}))).map(|_| ())
    }

    fn send_keys(&self, text: &str) -> ProbeResult<()> {
        self.call(Method::POST, "/value", Some(json!({ "text": text })))
            .map(|_| ())
    }

    fn is_selected(&self) -> ProbeResult<bool> {
        self.flag("/selected")
    }

    fn is_displayed(&self) -> ProbeResult<bool> {
        self.flag("/displayed")
    }

    fn is_enabled(&self) -> ProbeResult<bool> {
        self.flag("/enabled")
    }

    fn text(&self) -> ProbeResult<String> {
        Ok(self
            .call(Method::GET, "/text", None)?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn attribute(&self, name: &str) -> ProbeResult<Option<String>> {
        let value = self.call(Method::GET, &format!("/attribute/{name}"), None)?;
        Ok(value.as_str().map(ToString::to_string))
    }

    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<Self>> {
        let value = self.call(Method::POST, "/elements", Some(locator_body(locator)))?;
        let origin = format!("{}>{locator}", self.origin);
        value
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|v| {
                Ok(Self {
                    inner: Rc::clone(&self.inner),
                    id: element_id(v)?,
                    origin: origin.clone(),
                })
            })
            .collect()
    }
}
