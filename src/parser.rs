use crate::chat::{ChatLog, ChatMessage, RawTimestamp, SourceFormat};
use crate::error::ChatSubsError;

use anyhow::Context;
use log::debug;
use serde::Deserialize;

const TEXT_MESSAGE: &str = "text_message";
const DEFAULT_AUTHOR: &str = "Unknown";
const DEFAULT_COLOR: &str = "FFFFFF";
// About 36 000 years either side of zero.
const MAX_TIMESTAMP_US: i64 = 1 << 60;
const MAX_ELAPSED_SECS: f64 = (MAX_TIMESTAMP_US / 1_000_000) as f64;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    display_name: Option<String>,
    colour: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    message_type: Option<String>,
    action_type: Option<String>,
    author: Option<RawAuthor>,
    message: Option<String>,
    time_in_seconds: Option<f64>,
    timestamp: Option<i64>,
    colour: Option<String>,
    color: Option<String>,
}

impl RawRecord {
    fn is_text_message(&self) -> bool {
        self.message_type.as_deref() == Some(TEXT_MESSAGE)
            || self.action_type.as_deref() == Some(TEXT_MESSAGE)
    }

    fn into_message(self, format: SourceFormat) -> Result<ChatMessage, ChatSubsError> {
        let raw_timestamp = match format {
            SourceFormat::Elapsed => {
                let secs = self.time_in_seconds.unwrap_or(0.0);
                if !secs.is_finite() || secs.abs() > MAX_ELAPSED_SECS {
                    return Err(ChatSubsError::Parse(format!(
                        "time_in_seconds out of range: {}",
                        secs
                    )));
                }
                RawTimestamp::ElapsedSeconds(secs)
            }
            SourceFormat::Epoch => {
                let us = self.timestamp.unwrap_or(0);
                if us.unsigned_abs() > MAX_TIMESTAMP_US as u64 {
                    return Err(ChatSubsError::Parse(format!(
                        "timestamp out of range: {}",
                        us
                    )));
                }
                RawTimestamp::EpochMicros(us)
            }
        };
        let author = self.author.unwrap_or_default();
        let color = author
            .colour
            .or(author.color)
            .or(self.colour)
            .or(self.color)
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        Ok(ChatMessage {
            author: author
                .display_name
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            text: self.message.unwrap_or_default().trim().to_string(),
            raw_timestamp,
            color: color.trim_start_matches('#').to_string(),
        })
    }
}

pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads a chat log: a JSON array of message records.
    ///
    /// Only text messages are kept. Fails when the JSON is malformed or when the
    /// log holds no text messages at all.
    pub fn parse(&mut self, input: &str) -> Result<ChatLog, anyhow::Error> {
        let records: Vec<RawRecord> = serde_json::from_str(input)
            .map_err(|err| ChatSubsError::Parse(err.to_string()))
            .context("Failed to parse chat log")?;
        let total_records = records.len();

        let format = if records.iter().any(|r| r.time_in_seconds.is_some()) {
            SourceFormat::Elapsed
        } else {
            SourceFormat::Epoch
        };
        debug!("Detected {:?} timestamps in {} records", format, total_records);

        let messages: Vec<ChatMessage> = records
            .into_iter()
            .filter(RawRecord::is_text_message)
            .map(|r| r.into_message(format))
            .collect::<Result<_, _>>()
            .context("Failed to parse chat log")?;
        if messages.is_empty() {
            return Err(ChatSubsError::NoTextMessages.into());
        }

        Ok(ChatLog {
            total_records,
            format,
            messages,
        })
    }
}
