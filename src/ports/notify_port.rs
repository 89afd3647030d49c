//! Notification sink port trait.

use crate::domain::error::ScreenerError;

/// Port for delivering a rendered report.
pub trait NotifyPort {
    fn send(&self, payload: &str) -> Result<(), ScreenerError>;
}
