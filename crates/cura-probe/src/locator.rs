//! Locator value type.
//!
//! A [`Locator`] is an immutable `(strategy, selector)` pair. Pages declare
//! their locators as `const` items; every interaction re-resolves its locator
//! because the remote DOM may have been replaced since the last lookup.
//!
//! Selector validity is only checked remotely, on lookup. Locally we only
//! reject empty selectors.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// How an element is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Element `id` attribute
    Id,
    /// Element `name` attribute
    Name,
    /// Exact visible text of an anchor
    LinkText,
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath,
    /// CSS selector
    CssSelector,
    /// Tag name
    TagName,
}

impl Strategy {
    /// All strategies, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Id,
        Self::Name,
        Self::LinkText,
        Self::XPath,
        Self::CssSelector,
        Self::TagName,
    ];

    /// Selenium-style name of the strategy
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::LinkText => "link text",
            Self::XPath => "xpath",
            Self::CssSelector => "css selector",
            Self::TagName => "tag name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "link text" | "link" => Ok(Self::LinkText),
            "xpath" => Ok(Self::XPath),
            "css selector" | "css" => Ok(Self::CssSelector),
            "tag name" | "tag" => Ok(Self::TagName),
            _ => Err(ProbeError::InvalidLocator {
                message: format!("unknown strategy {s:?}"),
            }),
        }
    }
}

/// An immutable element locator.
///
/// Two locators are equal iff strategy and selector are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LocatorRepr")]
pub struct Locator {
    strategy: Strategy,
    selector: Cow<'static, str>,
}

#[derive(Deserialize)]
struct LocatorRepr {
    strategy: Strategy,
    selector: String,
}

impl TryFrom<LocatorRepr> for Locator {
    type Error = ProbeError;

    fn try_from(repr: LocatorRepr) -> ProbeResult<Self> {
        Self::new(repr.strategy, repr.selector)
    }
}

impl Locator {
    const fn constant(strategy: Strategy, selector: &'static str) -> Self {
        assert!(!selector.is_empty(), "locator selector must not be empty");
        Self {
            strategy,
            selector: Cow::Borrowed(selector),
        }
    }

    /// Locate by `id` attribute
    #[must_use]
    pub const fn id(selector: &'static str) -> Self {
        Self::constant(Strategy::Id, selector)
    }

    /// Locate by `name` attribute
    #[must_use]
    pub const fn name(selector: &'static str) -> Self {
        Self::constant(Strategy::Name, selector)
    }

    /// Locate an anchor by its exact visible text
    #[must_use]
    pub const fn link_text(selector: &'static str) -> Self {
        Self::constant(Strategy::LinkText, selector)
    }

    /// Locate by XPath
    #[must_use]
    pub const fn xpath(selector: &'static str) -> Self {
        Self::constant(Strategy::XPath, selector)
    }

    /// Locate by CSS selector
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self::constant(Strategy::CssSelector, selector)
    }

    /// Locate by tag name
    #[must_use]
    pub const fn tag_name(selector: &'static str) -> Self {
        Self::constant(Strategy::TagName, selector)
    }

    /// Build a locator from runtime data
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidLocator`] if the selector is empty.
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> ProbeResult<Self> {
        let selector = selector.into();
        if selector.trim().is_empty() {
            return Err(ProbeError::InvalidLocator {
                message: format!("empty selector for strategy {strategy}"),
            });
        }
        Ok(Self {
            strategy,
            selector: Cow::Owned(selector),
        })
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the selector
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Translate into a W3C WebDriver `(using, value)` pair.
    ///
    /// The W3C protocol has no id/name strategies, so those become CSS
    /// attribute selectors.
    #[must_use]
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self.strategy {
            Strategy::Id => ("css selector", attribute_selector("id", &self.selector)),
            Strategy::Name => ("css selector", attribute_selector("name", &self.selector)),
            Strategy::LinkText => ("link text", self.selector.to_string()),
            Strategy::XPath => ("xpath", self.selector.to_string()),
            Strategy::CssSelector => ("css selector", self.selector.to_string()),
            Strategy::TagName => ("tag name", self.selector.to_string()),
        }
    }
}

fn attribute_selector(attribute: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{attribute}=\"{escaped}\"]")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}

impl FromStr for Locator {
    type Err = ProbeError;

    /// Parse `strategy=selector`, e.g. `id=txt-username` or `xpath=//h2`.
    fn from_str(s: &str) -> ProbeResult<Self> {
        let (strategy, selector) = s.split_once('=').ok_or_else(|| ProbeError::InvalidLocator {
            message: format!("expected strategy=selector, got {s:?}"),
        })?;
        Self::new(strategy.parse()?, selector)
    }
}
