//! Port traits for external collaborators.

pub mod config_port;
pub mod data_port;
pub mod listing_port;
pub mod notify_port;
