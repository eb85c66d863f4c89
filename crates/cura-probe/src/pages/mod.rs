//! CURA Healthcare page objects.
//!
//! One type per page of the demo site. Locators are module-level constants
//! so scenarios and tests can refer to them without a session.

pub mod appointment;
pub mod confirmation;
pub mod login;
pub mod menu;

pub use appointment::AppointmentPage;
pub use confirmation::{AppointmentDetails, ConfirmationPage, FieldMismatch};
pub use login::LoginPage;
pub use menu::MenuPage;
