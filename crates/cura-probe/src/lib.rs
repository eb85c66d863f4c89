//! cura-probe: page objects, explicit waits and probes for the CURA
//! Healthcare demo site.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CURA-PROBE Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario / │    │ Page       │    │ Driver     │            │
//! │   │ Probe      │───►│ Objects    │───►│ (W3C or    │            │
//! │   │            │    │ + waits    │    │  mock)     │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Waits never sleep a fixed time: every element access polls until a
//! condition holds or a deadline passes. Clicks retry with backoff; typing
//! does not.

#![warn(missing_docs)]

/// Typed application settings loaded from YAML
pub mod config;

/// Browser session and element contracts
pub mod driver;

/// Bounded retry for element interactions
pub mod interaction;

/// Element locators
pub mod locator;

/// `tracing` subscriber setup
pub mod logging;

/// Scriptable in-memory driver
pub mod mock;

/// Page Object Model base
pub mod page;

/// CURA page objects
pub mod pages;

mod result;

/// Session lifetime and the booking scenario
pub mod scenario;

/// SQL injection, XSS and authentication probes
pub mod security;

/// Explicit wait engine
pub mod wait;

/// Blocking W3C WebDriver backend
#[cfg(feature = "webdriver")]
pub mod webdriver;

/// Async Petstore REST client
#[cfg(feature = "api")]
pub mod api;

pub use config::{
    AppointmentConfig, Credentials, Facility, HealthcareProgram, ProbeConfig, SiteConfig,
};
pub use driver::{select_by_visible_text, Driver, DriverConfig, Element, WindowSize};
pub use interaction::{retry, InteractionPolicy};
pub use locator::{Locator, Strategy};
pub use logging::LogConfig;
pub use mock::{ClickEffect, MockDriver, MockElement};
pub use page::{BasePage, Page};
pub use pages::{
    AppointmentDetails, AppointmentPage, ConfirmationPage, FieldMismatch, LoginPage, MenuPage,
};
pub use result::{ProbeError, ProbeResult};
pub use scenario::{BookingOutcome, BookingScenario, Session};
pub use security::{AuthProbe, Finding, SecurityReport, Severity, SqlInjectionProbe, XssProbe};
pub use wait::{Condition, WaitOptions, Waiter};

#[cfg(feature = "webdriver")]
pub use webdriver::{RemoteElement, WebDriverSession};

#[cfg(feature = "api")]
pub use api::{ApiMessage, ApiResponse, Pet, PetStatus, PetstoreClient, User};
