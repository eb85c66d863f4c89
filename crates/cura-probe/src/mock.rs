//! Scriptable in-memory driver for unit and integration tests.
//!
//! A [`MockDriver`] holds a tiny fake DOM: elements registered under a
//! [`Locator`] with state that tests can script (appear after N lookups,
//! hidden, disabled, failing clicks, stale checks, click side effects).
//! Every action and every lookup is recorded so tests can assert ordering.

use crate::driver::{Driver, Element};
use crate::locator::{Locator, Strategy};
use crate::result::{ProbeError, ProbeResult};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// What a click on an element does besides its own state change
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Change the current URL (pushes history)
    Navigate(String),
    /// Make another element present
    Show(MockElement),
    /// Make another element absent
    Hide(MockElement),
    /// Replace another element's visible text
    SetText(MockElement, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Checkbox,
    Radio,
    Option,
}

#[derive(Debug)]
struct ElementState {
    label: String,
    tag: String,
    kind: Kind,
    text: String,
    value: String,
    present: bool,
    displayed: bool,
    enabled: bool,
    selected: bool,
    appear_after: u32,
    lookups: u32,
    click_failures: u32,
    stale_checks: u32,
    clicks: u32,
    effects: Vec<ClickEffect>,
    children: Vec<MockElement>,
    parent: Weak<RefCell<ElementState>>,
    dom: Weak<MockDom>,
}

/// Handle to a scripted element. Clones share state.
#[derive(Clone)]
pub struct MockElement {
    state: Rc<RefCell<ElementState>>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockElement")
            .field("label", &state.label)
            .field("tag", &state.tag)
            .finish_non_exhaustive()
    }
}

impl MockElement {
    /// Create a present, displayed, enabled element
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_kind(tag, Kind::Plain)
    }

    fn with_kind(tag: impl Into<String>, kind: Kind) -> Self {
        let tag = tag.into();
        Self {
            state: Rc::new(RefCell::new(ElementState {
                label: tag.clone(),
                tag,
                kind,
                text: String::new(),
                value: String::new(),
                present: true,
                displayed: true,
                enabled: true,
                selected: false,
                appear_after: 0,
                lookups: 0,
                click_failures: 0,
                stale_checks: 0,
                clicks: 0,
                effects: Vec::new(),
                children: Vec::new(),
                parent: Weak::new(),
                dom: Weak::new(),
            })),
        }
    }

    /// A checkbox; clicking toggles selection
    #[must_use]
    pub fn checkbox() -> Self {
        Self::with_kind("input", Kind::Checkbox)
    }

    /// A radio button; clicking selects it
    #[must_use]
    pub fn radio() -> Self {
        Self::with_kind("input", Kind::Radio)
    }

    /// Set visible text
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.state.borrow_mut().text = text.into();
        self
    }

    /// Set the current input value
    #[must_use]
    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.state.borrow_mut().value = value.into();
        self
    }

    /// Set selection state
    #[must_use]
    pub fn selected(self, selected: bool) -> Self {
        self.state.borrow_mut().selected = selected;
        self
    }

    /// Start hidden (present but not displayed)
    #[must_use]
    pub fn hidden(self) -> Self {
        self.state.borrow_mut().displayed = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub fn disabled(self) -> Self {
        self.state.borrow_mut().enabled = false;
        self
    }

    /// Start absent from the DOM
    #[must_use]
    pub fn absent(self) -> Self {
        self.state.borrow_mut().present = false;
        self
    }

    /// Only resolve on the (n+1)-th lookup
    #[must_use]
    pub fn appear_after(self, lookups: u32) -> Self {
        self.state.borrow_mut().appear_after = lookups;
        self
    }

    /// Fail the next `n` clicks with `element click intercepted`
    #[must_use]
    pub fn fail_clicks(self, n: u32) -> Self {
        self.state.borrow_mut().click_failures = n;
        self
    }

    /// Report a stale reference on the next `n` state checks
    #[must_use]
    pub fn stale_checks(self, n: u32) -> Self {
        self.state.borrow_mut().stale_checks = n;
        self
    }

    /// Add a click side effect
    #[must_use]
    pub fn on_click(self, effect: ClickEffect) -> Self {
        self.state.borrow_mut().effects.push(effect);
        self
    }

    /// Add `<option>` children to a select element
    #[must_use]
    pub fn with_options(self, options: &[&str]) -> Self {
        for text in options {
            let option = Self::with_kind("option", Kind::Option).with_text(*text);
            option.state.borrow_mut().parent = Rc::downgrade(&self.state);
            self.state.borrow_mut().children.push(option);
        }
        self
    }

    /// Number of successful clicks
    #[must_use]
    pub fn click_count(&self) -> u32 {
        self.state.borrow().clicks
    }

    /// Current input value
    #[must_use]
    pub fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    /// Current selection state
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.state.borrow().selected
    }

    /// Text of the selected `<option>` child, if any
    #[must_use]
    pub fn selected_option(&self) -> Option<String> {
        self.state
            .borrow()
            .children
            .iter()
            .find(|c| c.state.borrow().selected)
            .map(|c| c.state.borrow().text.clone())
    }

    /// Make the element present or absent
    pub fn set_present(&self, present: bool) {
        self.state.borrow_mut().present = present;
    }

    /// Make the element displayed or hidden
    pub fn set_displayed(&self, displayed: bool) {
        self.state.borrow_mut().displayed = displayed;
    }

    fn attach(&self, label: &str, dom: &Rc<MockDom>) {
        let children = {
            let mut state = self.state.borrow_mut();
            state.label = label.to_string();
            state.dom = Rc::downgrade(dom);
            state.children.clone()
        };
        for child in children {
            let text = child.state.borrow().text.clone();
            child.attach(&format!("{label}>option[{text}]"), dom);
        }
    }

    fn resolves(&self) -> bool {
        let mut state = self.state.borrow_mut();
        state.lookups += 1;
        state.present && state.lookups > state.appear_after
    }

    fn record(&self, call: String) {
        if let Some(dom) = self.state.borrow().dom.upgrade() {
            dom.calls.borrow_mut().push(call);
        }
    }

    fn label(&self) -> String {
        self.state.borrow().label.clone()
    }

    fn check_stale(&self) -> ProbeResult<()> {
        let mut state = self.state.borrow_mut();
        if state.stale_checks > 0 {
            state.stale_checks -= 1;
            return Err(ProbeError::StaleElement {
                locator: state.label.clone(),
            });
        }
        Ok(())
    }

    fn apply_effects(&self) {
        let (effects, dom) = {
            let state = self.state.borrow();
            (state.effects.clone(), state.dom.upgrade())
        };
        for effect in effects {
            match effect {
                ClickEffect::Navigate(url) => {
                    if let Some(dom) = &dom {
                        dom.go_to(&url);
                    }
                }
                ClickEffect::Show(other) => other.set_present(true),
                ClickEffect::Hide(other) => other.set_present(false),
                ClickEffect::SetText(other, text) => other.state.borrow_mut().text = text,
            }
        }
    }
}

impl Element for MockElement {
    fn click(&self) -> ProbeResult<()> {
        self.check_stale()?;
        let label = self.label();
        {
            let mut state = self.state.borrow_mut();
            if state.click_failures > 0 {
                state.click_failures -= 1;
                drop(state);
                self.record(format!("click-failed:{label}"));
                return Err(ProbeError::webdriver(
                    "element click intercepted",
                    format!("{label} is covered by another element"),
                ));
            }
            state.clicks += 1;
            match state.kind {
                Kind::Checkbox => state.selected = !state.selected,
                Kind::Radio => state.selected = true,
                Kind::Option => {
                    state.selected = true;
                    if let Some(parent) = state.parent.upgrade() {
                        for sibling in &parent.borrow().children {
                            if !Rc::ptr_eq(&sibling.state, &self.state) {
                                sibling.state.borrow_mut().selected = false;
                            }
                        }
                    }
                }
                Kind::Plain => {}
            }
        }
        self.record(format!("click:{label}"));
        self.apply_effects();
        Ok(())
    }

    fn clear(&self) -> ProbeResult<()> {
        self.check_stale()?;
        self.state.borrow_mut().value.clear();
        self.record(format!("clear:{}", self.label()));
        Ok(())
    }

    fn send_keys(&self, text: &str) -> ProbeResult<()> {
        self.check_stale()?;
        self.state.borrow_mut().value.push_str(text);
        self.record(format!("send_keys:{}:{text}", self.label()));
        Ok(())
    }

    fn is_selected(&self) -> ProbeResult<bool> {
        self.check_stale()?;
        Ok(self.state.borrow().selected)
    }

    fn is_displayed(&self) -> ProbeResult<bool> {
        self.check_stale()?;
        Ok(self.state.borrow().displayed)
    }

    fn is_enabled(&self) -> ProbeResult<bool> {
        self.check_stale()?;
        Ok(self.state.borrow().enabled)
    }

    fn text(&self) -> ProbeResult<String> {
        self.check_stale()?;
        Ok(self.state.borrow().text.clone())
    }

    fn attribute(&self, name: &str) -> ProbeResult<Option<String>> {
        self.check_stale()?;
        let state = self.state.borrow();
        Ok(match name {
            "value" => Some(state.value.clone()),
            "tagName" => Some(state.tag.clone()),
            _ => None,
        })
    }

    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<Self>> {
        self.check_stale()?;
        if locator.strategy() != Strategy::TagName {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .borrow()
            .children
            .iter()
            .filter(|c| c.state.borrow().tag == locator.selector())
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct MockDom {
    url: RefCell<String>,
    history: RefCell<Vec<String>>,
    title: RefCell<String>,
    elements: RefCell<Vec<(Locator, MockElement)>>,
    calls: RefCell<Vec<String>>,
    lookups: RefCell<Vec<Locator>>,
    script_results: RefCell<VecDeque<serde_json::Value>>,
    redirects: RefCell<Vec<(String, String)>>,
    quits: Cell<u32>,
}

impl MockDom {
    fn go_to(&self, url: &str) {
        let previous = self.url.replace(url.to_string());
        if !previous.is_empty() {
            self.history.borrow_mut().push(previous);
        }
    }
}

/// In-memory [`Driver`] implementation. Clones share the same DOM.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    dom: Rc<MockDom>,
}

impl MockDriver {
    /// Create an empty mock session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element under `locator` and return a shared handle to it
    pub fn add_element(&self, locator: Locator, element: MockElement) -> MockElement {
        element.attach(&locator.to_string(), &self.dom);
        self.dom
            .elements
            .borrow_mut()
            .push((locator, element.clone()));
        element
    }

    /// Set current URL without recording a navigation call
    pub fn set_url(&self, url: impl Into<String>) {
        self.dom.url.replace(url.into());
    }

    /// Set document title
    pub fn set_title(&self, title: impl Into<String>) {
        self.dom.title.replace(title.into());
    }

    /// Serve `to` whenever `from` is navigated to
    pub fn add_redirect(&self, from: impl Into<String>, to: impl Into<String>) {
        self.dom.redirects.borrow_mut().push((from.into(), to.into()));
    }

    /// Queue a result for the next `execute_script`
    pub fn push_script_result(&self, value: serde_json::Value) {
        self.dom.script_results.borrow_mut().push_back(value);
    }

    /// Recorded actions, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.dom.calls.borrow().clone()
    }

    /// Whether any recorded action starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.dom.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    /// Recorded lookups, in order
    #[must_use]
    pub fn lookups(&self) -> Vec<Locator> {
        self.dom.lookups.borrow().clone()
    }

    /// Number of lookups for `locator`
    #[must_use]
    pub fn lookup_count(&self, locator: &Locator) -> usize {
        self.dom
            .lookups
            .borrow()
            .iter()
            .filter(|l| *l == locator)
            .count()
    }

    /// Number of `quit` calls so far
    #[must_use]
    pub fn quit_count(&self) -> u32 {
        self.dom.quits.get()
    }

    fn matching(&self, locator: &Locator) -> Vec<MockElement> {
        self.dom.lookups.borrow_mut().push(locator.clone());
        let candidates: Vec<MockElement> = self
            .dom
            .elements
            .borrow()
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, e)| e.clone())
            .collect();
        candidates.into_iter().filter(MockElement::resolves).collect()
    }
}

impl Driver for MockDriver {
    type Element = MockElement;

    fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.dom.calls.borrow_mut().push(format!("navigate:{url}"));
        let target = self
            .dom
            .redirects
            .borrow()
            .iter()
            .find(|(from, _)| from == url)
            .map_or_else(|| url.to_string(), |(_, to)| to.clone());
        self.dom.go_to(&target);
        Ok(())
    }

    fn current_url(&self) -> ProbeResult<String> {
        Ok(self.dom.url.borrow().clone())
    }

    fn title(&self) -> ProbeResult<String> {
        Ok(self.dom.title.borrow().clone())
    }

    fn back(&self) -> ProbeResult<()> {
        self.dom.calls.borrow_mut().push("back".to_string());
        if let Some(previous) = self.dom.history.borrow_mut().pop() {
            self.dom.url.replace(previous);
        }
        Ok(())
    }

    fn find_element(&self, locator: &Locator) -> ProbeResult<Option<MockElement>> {
        Ok(self.matching(locator).into_iter().next())
    }

    fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<MockElement>> {
        Ok(self.matching(locator))
    }

    fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        self.dom.calls.borrow_mut().push(format!("script:{script}"));
        Ok(self
            .dom
            .script_results
            .borrow_mut()
            .pop_front()
            .unwrap_or(serde_json::Value::Null))
    }

    fn save_screenshot(&self, path: &Path) -> ProbeResult<()> {
        std::fs::write(path, PNG_SIGNATURE)?;
        self.dom
            .calls
            .borrow_mut()
            .push(format!("screenshot:{}", path.display()));
        Ok(())
    }

    fn quit(&self) -> ProbeResult<()> {
        self.dom.quits.set(self.dom.quits.get() + 1);
        self.dom.calls.borrow_mut().push("quit".to_string());
        Ok(())
    }
}
