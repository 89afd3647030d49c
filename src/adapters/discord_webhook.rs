//! Discord webhook notifier.
//!
//! Posts `{"content": ...}` to the webhook URL. Discord answers a successful
//! execution with 204 No Content; any other status is a failure.

use crate::domain::error::ScreenerError;
use crate::ports::notify_port::NotifyPort;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Discord rejects message content longer than this many characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

pub struct DiscordWebhook {
    url: String,
    client: reqwest::blocking::Client,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScreenerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(std::io::Error::other)?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    fn post(&self, content: &str) -> Result<(), ScreenerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookMessage { content })
            .send()
            .map_err(|e| ScreenerError::Notify {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(ScreenerError::Notify {
                reason: format!("webhook returned {}", status),
            })
        }
    }
}

impl NotifyPort for DiscordWebhook {
    fn send(&self, payload: &str) -> Result<(), ScreenerError> {
        let chunks = split_content(payload, MAX_CONTENT_CHARS);
        for chunk in &chunks {
            self.post(chunk)?;
        }
        info!(messages = chunks.len(), "report delivered to webhook");
        Ok(())
    }
}

/// Splits `payload` into pieces of at most `limit` characters, breaking on
/// line boundaries where possible.
pub fn split_content(payload: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in payload.split_inclusive('\n') {
        let mut line = line;
        let mut line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        // A single line longer than the limit is cut hard.
        while line_len > limit {
            let cut = line
                .char_indices()
                .nth(limit)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
            line_len -= limit;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
