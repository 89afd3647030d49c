//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod discord_webhook;
pub mod file_config_adapter;
pub mod krx_listing_adapter;
pub mod naver_adapter;
