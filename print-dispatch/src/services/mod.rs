//! External collaborators of the print dispatcher
//!
//! - [`BackendApi`] - post-print status sync
//! - [`SettingsStore`] - selected printer, auto-print toggle
//! - [`Notifier`] - new-order alerts

pub mod backend;
pub mod notification;
pub mod settings;

pub use backend::{BackendApi, BackendError, BackendResult, HttpBackendApi};
pub use notification::{LogNotifier, NewOrderAlert, Notifier};
pub use settings::{PrintSettings, SettingsError, SettingsResult, SettingsStore};
