//! Scripted CURA site on top of `MockDriver`.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::NaiveDate;
use cura_probe::pages::{appointment, confirmation, login, menu};
use cura_probe::scenario::BODY;
use cura_probe::{
    AppointmentConfig, ClickEffect, Facility, HealthcareProgram, InteractionPolicy, MockDriver,
    MockElement, ProbeConfig, WaitOptions,
};
use std::path::Path;

pub const BASE_URL: &str = "https://cura.test/";
pub const LOGIN_FAILED: &str = "Login failed! Please ensure the username and password are valid.";

/// Config with short waits pointing at the fake site
pub fn fast_config(artifacts: &Path) -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.site.base_url = BASE_URL.to_string();
    config.wait = WaitOptions::new().with_timeout(200).with_poll_interval(5);
    config.interaction = InteractionPolicy::new().with_backoff(1);
    config.artifacts_dir = artifacts.to_path_buf();
    config.appointment = AppointmentConfig::new(Facility::Hongkong, HealthcareProgram::Medicaid)
        .with_readmission(true)
        .with_visit_date(NaiveDate::from_ymd_opt(2025, 7, 25).unwrap())
        .with_comment("Integration booking");
    config
}

/// Handles to the interesting elements of the fake site
#[derive(Debug)]
pub struct CuraSite {
    pub driver: MockDriver,
    pub facility: MockElement,
    pub readmission: MockElement,
    pub visit_date: MockElement,
    pub comment: MockElement,
    pub book: MockElement,
    pub header: MockElement,
    pub logout: MockElement,
}

/// How the fake login form reacts to a submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBehavior {
    /// Any input logs in
    Accept,
    /// Every submit shows the error banner
    Reject,
}

/// Build the site; the confirmation page echoes `config.appointment`.
pub fn cura_site(config: &ProbeConfig, behavior: LoginBehavior) -> CuraSite {
    let driver = MockDriver::new();
    let site = &config.site;
    let booked = &config.appointment;

    driver.add_element(BODY, MockElement::new("body"));
    driver.add_element(
        login::MAKE_APPOINTMENT,
        MockElement::new("a").on_click(ClickEffect::Navigate(site.login_url())),
    );
    driver.add_element(login::USERNAME, MockElement::new("input"));
    driver.add_element(login::PASSWORD, MockElement::new("input"));

    let facility = driver.add_element(
        appointment::FACILITY,
        MockElement::new("select")
            .with_options(&Facility::ALL.map(|f| f.visible_text()))
            .absent(),
    );
    let error = driver.add_element(
        login::ERROR_MESSAGE,
        MockElement::new("p").with_text(LOGIN_FAILED).absent(),
    );
    let login_btn = MockElement::new("button");
    let login_btn = match behavior {
        LoginBehavior::Accept => login_btn
            .on_click(ClickEffect::Navigate(site.url("#appointment")))
            .on_click(ClickEffect::Show(facility.clone())),
        LoginBehavior::Reject => login_btn.on_click(ClickEffect::Show(error)),
    };
    driver.add_element(login::LOGIN_BTN, login_btn);

    let readmission = driver.add_element(appointment::READMISSION, MockElement::checkbox());
    for program in HealthcareProgram::ALL {
        driver.add_element(appointment::program_locator(program), MockElement::radio());
    }
    let visit_date = driver.add_element(appointment::VISIT_DATE, MockElement::new("input"));
    let comment = driver.add_element(appointment::COMMENT, MockElement::new("textarea"));

    let header = driver.add_element(
        confirmation::HEADER,
        MockElement::new("h2").with_text("Appointment Confirmation").absent(),
    );
    let book = driver.add_element(
        appointment::BOOK_BTN,
        MockElement::new("button")
            .on_click(ClickEffect::Navigate(site.url("appointment.php#summary")))
            .on_click(ClickEffect::Show(header.clone())),
    );
    driver.add_element(
        confirmation::FACILITY,
        MockElement::new("p").with_text(booked.facility.visible_text()),
    );
    driver.add_element(
        confirmation::READMISSION,
        MockElement::new("p").with_text(booked.readmission_text()),
    );
    driver.add_element(
        confirmation::PROGRAM,
        MockElement::new("p").with_text(booked.program.label()),
    );
    driver.add_element(
        confirmation::VISIT_DATE,
        MockElement::new("p").with_text(booked.visit_date_text()),
    );
    driver.add_element(
        confirmation::COMMENT,
        MockElement::new("p").with_text(format!(" {} ", booked.comment)),
    );

    let logout = driver.add_element(
        menu::LOGOUT,
        MockElement::new("a")
            .on_click(ClickEffect::Navigate(site.base_url.clone()))
            .on_click(ClickEffect::Hide(facility.clone()))
            .absent(),
    );
    driver.add_element(
        menu::MENU_TOGGLE,
        MockElement::new("a").on_click(ClickEffect::Show(logout.clone())),
    );

    CuraSite {
        driver,
        facility,
        readmission,
        visit_date,
        comment,
        book,
        header,
        logout,
    }
}

/// Collapse consecutive duplicates (polling repeats a lookup)
pub fn dedup<T: PartialEq>(mut items: Vec<T>) -> Vec<T> {
    items.dedup();
    items
}
