//! Driver contract - the browser session consumed by pages.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  Driver (trait)                                                │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐      │
//! │  │  WebDriverSession    │        │  MockDriver          │      │
//! │  │  W3C wire protocol   │        │  in-memory DOM       │      │
//! │  │  (chromedriver)      │        │  (unit/integration)  │      │
//! │  └──────────────────────┘        └──────────────────────┘      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All calls are synchronous and take `&self`: one session is shared by
//! reference among every page of a scenario. Waiting lives in
//! [`crate::wait`], never in the driver.

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default chromedriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// A handle to one element in the remote DOM.
///
/// Handles are borrowed for a single interaction and never cached.
pub trait Element {
    /// Click the element
    fn click(&self) -> ProbeResult<()>;

    /// Clear an editable element
    fn clear(&self) -> ProbeResult<()>;

    /// Send keystrokes
    fn send_keys(&self, text: &str) -> ProbeResult<()>;

    /// Whether a checkbox/radio/option is selected
    fn is_selected(&self) -> ProbeResult<bool>;

    /// Whether the element is rendered
    fn is_displayed(&self) -> ProbeResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&self) -> ProbeResult<bool>;

    /// Visible text
    fn text(&self) -> ProbeResult<String>;

    /// Attribute or property value
    fn attribute(&self, name: &str) -> ProbeResult<Option<String>>;

    /// Find descendants of this element
    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<Self>>
    where
        Self: Sized;
}

/// A running browser session.
pub trait Driver {
    /// Element handle type produced by this driver
    type Element: Element;

    /// Navigate to URL
    fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    fn current_url(&self) -> ProbeResult<String>;

    /// Get document title
    fn title(&self) -> ProbeResult<String>;

    /// Go back in history
    fn back(&self) -> ProbeResult<()>;

    /// Find the first element matching `locator`, `None` if absent
    fn find_element(&self, locator: &Locator) -> ProbeResult<Option<Self::Element>>;

    /// Find all elements matching `locator`
    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<Self::Element>>;

    /// Execute JavaScript in page context
    fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Save a PNG screenshot of the viewport
    fn save_screenshot(&self, path: &Path) -> ProbeResult<()>;

    /// End the session. Called exactly once by [`crate::scenario::Session`].
    fn quit(&self) -> ProbeResult<()>;
}

/// Select the `<option>` of `select` whose visible text equals `text`.
///
/// # Errors
///
/// Returns [`ProbeError::OptionNotFound`] if no option matches.
pub fn select_by_visible_text<E: Element>(select: &E, text: &str) -> ProbeResult<()> {
    const OPTION: Locator = Locator::tag_name("option");

    for option in select.find_elements(&OPTION)? {
        if option.text()?.trim() == text {
            if !option.is_selected()? {
                option.click()?;
            }
            return Ok(());
        }
    }
    Err(ProbeError::OptionNotFound {
        text: text.to_string(),
    })
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl WindowSize {
    /// Create a new window size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Browser session configuration.
///
/// Every recognized option is listed here; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// chromedriver endpoint
    pub webdriver_url: String,
    /// Run without a visible window (`--headless=new`)
    pub headless: bool,
    /// Window size (`--window-size=W,H`)
    pub window_size: WindowSize,
    /// Fresh profile without history (`--incognito`)
    pub incognito: bool,
    /// Disable Chrome's credential service and password bubble
    pub disable_password_manager: bool,
    /// Page load timeout in milliseconds
    pub page_load_timeout_ms: u64,
    /// HTTP timeout for each wire-protocol command in milliseconds
    pub command_timeout_ms: u64,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            window_size: WindowSize::default(),
            incognito: true,
            disable_password_manager: true,
            page_load_timeout_ms: 30_000,
            command_timeout_ms: 60_000,
            extra_args: Vec::new(),
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chromedriver endpoint
    #[must_use]
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = WindowSize::new(width, height);
        self
    }

    /// Set incognito mode
    #[must_use]
    pub const fn incognito(mut self, incognito: bool) -> Self {
        self.incognito = incognito;
        self
    }

    /// Add an extra Chrome argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Page load timeout
    #[must_use]
    pub const fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    /// Per-command HTTP timeout
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Chrome command-line arguments implied by this config
    #[must_use]
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            format!(
                "--window-size={},{}",
                self.window_size.width, self.window_size.height
            ),
        ];
        if self.incognito {
            args.push("--incognito".to_string());
        }
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if self.disable_password_manager {
            args.push("--disable-save-password-bubble".to_string());
            args.push("--disable-notifications".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// W3C capabilities for a new session
    #[must_use]
    pub fn capabilities(&self) -> serde_json::Value {
        let mut chrome_options = serde_json::json!({
            "args": self.chrome_args(),
            "excludeSwitches": ["enable-automation"],
        });
        if self.disable_password_manager {
            chrome_options["prefs"] = serde_json::json!({
                "credentials_enable_service": false,
                "profile.password_manager_enabled": false,
            });
        }
        serde_json::json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "timeouts": { "pageLoad": self.page_load_timeout_ms },
                    "goog:chromeOptions": chrome_options,
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    mod driver_config_tests {
        use super::*;

        #[test]
        fn test_config_default() {
            let config = DriverConfig::default();
            assert!(!config.headless);
            assert!(config.incognito);
            assert_eq!(config.window_size, WindowSize::new(1920, 1080));
            assert_eq!(config.webdriver_url, DEFAULT_WEBDRIVER_URL);
        }

        #[test]
        fn test_config_builder() {
            let config = DriverConfig::new()
                .headless(true)
                .window_size(800, 600)
                .incognito(false)
                .arg("--lang=en");

            assert!(config.headless);
            assert_eq!(config.window_size.width, 800);
            let args = config.chrome_args();
            assert!(args.contains(&"--headless=new".to_string()));
            assert!(args.contains(&"--window-size=800,600".to_string()));
            assert!(!args.contains(&"--incognito".to_string()));
            assert_eq!(args.last().unwrap(), "--lang=en");
        }

        #[test]
        fn test_headful_has_no_headless_flag() {
            let args = DriverConfig::default().chrome_args();
            assert!(!args.iter().any(|a| a.starts_with("--headless")));
            assert!(args.contains(&"--incognito".to_string()));
        }

        #[test]
        fn test_capabilities_shape() {
            let caps = DriverConfig::default().capabilities();
            let chrome = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"];
            assert!(chrome["args"].as_array().unwrap().len() >= 4);
            assert_eq!(chrome["prefs"]["credentials_enable_service"], false);
            assert_eq!(
                caps["capabilities"]["alwaysMatch"]["timeouts"]["pageLoad"],
                30_000
            );
        }

        #[test]
        fn test_config_partial_yaml() {
            let config: DriverConfig =
                serde_yaml_ng::from_str("headless: true\nwindow_size: {width: 1280, height: 720}")
                    .unwrap();
            assert!(config.headless);
            assert_eq!(config.window_size, WindowSize::new(1280, 720));
            assert!(config.incognito);
        }
    }

    mod select_tests {
        use super::*;

        fn facility_select(driver: &MockDriver) -> MockElement {
            driver.add_element(
                Locator::id("combo_facility"),
                MockElement::new("select").with_options(&[
                    "Tokyo CURA Healthcare Center",
                    "Hongkong CURA Healthcare Center",
                    "Seoul CURA Healthcare Center",
                ]),
            );
            driver
                .find_element(&Locator::id("combo_facility"))
                .unwrap()
                .unwrap()
        }

        #[test]
        fn test_select_by_visible_text() {
            let driver = MockDriver::new();
            let select = facility_select(&driver);
            select_by_visible_text(&select, "Seoul CURA Healthcare Center").unwrap();
            assert_eq!(
                select.selected_option().as_deref(),
                Some("Seoul CURA Healthcare Center")
            );
        }

        #[test]
        fn test_select_missing_option() {
            let driver = MockDriver::new();
            let select = facility_select(&driver);
            let err = select_by_visible_text(&select, "Berlin").unwrap_err();
            assert!(matches!(err, ProbeError::OptionNotFound { ref text } if text == "Berlin"));
        }
    }
}
