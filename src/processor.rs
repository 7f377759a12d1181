use crate::chat::{
    ChatLog, ChatMessage, NormalizedMessage, OverlayOpts, RawTimestamp, SubtitleEvent,
};
use crate::slots::SlotAllocator;
use crate::style;

use std::collections::HashMap;

use log::{debug, info};

pub fn compile(log: ChatLog, opts: &OverlayOpts) -> Vec<SubtitleEvent> {
    let messages = normalize(log, opts);
    allocate(messages, opts)
}

/// Messages sharing a time keep their log order.
pub fn normalize(log: ChatLog, opts: &OverlayOpts) -> Vec<NormalizedMessage> {
    let normalizer = TimeNormalizer::new(&log, opts.origin_secs);
    let mut dedup = Deduplicator::new();

    let mut messages: Vec<NormalizedMessage> = log
        .messages
        .into_iter()
        .filter(|m| dedup.accept(m))
        .map(|message| NormalizedMessage {
            relative_time_us: normalizer.relative_time_us(message.raw_timestamp),
            message,
        })
        .collect();
    messages.sort_by_key(|m| m.relative_time_us);
    info!("Kept {} messages after filtering", messages.len());
    messages
}

fn allocate(messages: Vec<NormalizedMessage>, opts: &OverlayOpts) -> Vec<SubtitleEvent> {
    let mut allocator = SlotAllocator::new(opts.slot_count, opts.display_us);
    messages
        .into_iter()
        .map(|m| {
            let placement = allocator.place(m.relative_time_us);
            SubtitleEvent {
                start_us: placement.start_us,
                end_us: placement.end_us,
                slot: placement.slot,
                color_bgr: style::encode_bgr(&m.message.color),
                author: m.message.author,
                text: m.message.text,
            }
        })
        .collect()
}

struct TimeNormalizer {
    origin_secs: f64,
    epoch_base_us: i64,
}

impl TimeNormalizer {
    fn new(log: &ChatLog, origin_secs: u64) -> Self {
        let epoch_base_us = match log.messages.first().map(|m| m.raw_timestamp) {
            Some(RawTimestamp::EpochMicros(us)) => us,
            _ => 0,
        };
        debug!("Time origin: {}s, epoch base: {}us", origin_secs, epoch_base_us);
        TimeNormalizer {
            origin_secs: origin_secs as f64,
            epoch_base_us,
        }
    }

    fn relative_time_us(&self, timestamp: RawTimestamp) -> i64 {
        let us = match timestamp {
            RawTimestamp::ElapsedSeconds(secs) => {
                ((secs - self.origin_secs) * 1_000_000.0) as i64
            }
            RawTimestamp::EpochMicros(us) => us.saturating_sub(self.epoch_base_us),
        };
        us.max(0)
    }
}

struct Deduplicator {
    last_accepted: HashMap<String, (String, i64)>,
}

impl Deduplicator {
    fn new() -> Self {
        Deduplicator {
            last_accepted: HashMap::new(),
        }
    }

    fn accept(&mut self, message: &ChatMessage) -> bool {
        let second = message.raw_timestamp.second();
        if let Some((text, at)) = self.last_accepted.get(&message.author) {
            if *text == message.text && *at == second {
                debug!("Dropping repeated message from {}: '{}'", message.author, text);
                return false;
            }
        }
        if message.text.is_empty() {
            return false;
        }
        self.last_accepted
            .insert(message.author.clone(), (message.text.clone(), second));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::SourceFormat;

    fn message(author: &str, text: &str, raw_timestamp: RawTimestamp) -> ChatMessage {
        ChatMessage {
            author: author.to_string(),
            text: text.to_string(),
            raw_timestamp,
            color: "FFFFFF".to_string(),
        }
    }

    fn elapsed_log(messages: &[(&str, &str, f64)]) -> ChatLog {
        ChatLog {
            total_records: messages.len(),
            format: SourceFormat::Elapsed,
            messages: messages
                .iter()
                .map(|&(a, t, s)| message(a, t, RawTimestamp::ElapsedSeconds(s)))
                .collect(),
        }
    }

    fn epoch_log(messages: &[(&str, &str, i64)]) -> ChatLog {
        ChatLog {
            total_records: messages.len(),
            format: SourceFormat::Epoch,
            messages: messages
                .iter()
                .map(|&(a, t, us)| message(a, t, RawTimestamp::EpochMicros(us)))
                .collect(),
        }
    }

    fn texts(messages: &[NormalizedMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.message.text.as_str()).collect()
    }

    #[test]
    fn elapsed_times_are_shifted_by_origin_and_clamped() {
        let log = elapsed_log(&[("a", "early", 10.0), ("a", "late", 95.25)]);
        let opts = OverlayOpts {
            origin_secs: 60,
            ..OverlayOpts::default()
        };

        let messages = normalize(log, &opts);

        assert_eq!(messages[0].relative_time_us, 0);
        assert_eq!(messages[1].relative_time_us, 35_250_000);
    }

    #[test]
    fn epoch_times_are_relative_to_first_text_message() {
        let log = epoch_log(&[
            ("a", "", 1_000_500_000),
            ("b", "one", 1_002_000_000),
            ("c", "two", 1_000_000_000),
        ]);
        let opts = OverlayOpts {
            origin_secs: 30,
            ..OverlayOpts::default()
        };

        let messages = normalize(log, &opts);

        assert_eq!(texts(&messages), vec!["two", "one"]);
        assert_eq!(messages[0].relative_time_us, 0);
        assert_eq!(messages[1].relative_time_us, 1_500_000);
    }

    #[test]
    fn repeats_within_a_second_collapse() {
        let log = elapsed_log(&[
            ("a", "gg", 5.1),
            ("a", "gg", 5.9),
            ("a", "gg", 6.0),
            ("b", "gg", 6.0),
        ]);

        let messages = normalize(log, &OverlayOpts::default());

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].relative_time_us, 6_000_000);
        assert_eq!(messages[2].message.author, "b");
    }

    #[test]
    fn dedup_only_compares_against_previous_accepted_message() {
        let log = epoch_log(&[
            ("a", "hi", 0),
            ("a", "yo", 100),
            ("a", "hi", 200),
        ]);

        let messages = normalize(log, &OverlayOpts::default());

        assert_eq!(texts(&messages), vec!["hi", "yo", "hi"]);
    }

    #[test]
    fn dedup_follows_log_order_not_time_order() {
        let log = epoch_log(&[
            ("a", "hi", 3_000_000),
            ("a", "hi", 3_500_000),
            ("a", "hi", 0),
        ]);

        let messages = normalize(log, &OverlayOpts::default());

        assert_eq!(messages.len(), 2);
        // Both survivors clamp to the start of the track.
        assert_eq!(messages[0].relative_time_us, 0);
    }

    #[test]
    fn empty_messages_do_not_reset_dedup() {
        let log = elapsed_log(&[("a", "x", 1.0), ("a", "", 1.0), ("a", "x", 1.0)]);

        let messages = normalize(log, &OverlayOpts::default());

        assert_eq!(texts(&messages), vec!["x"]);
    }

    #[test]
    fn equal_times_keep_log_order() {
        let log = elapsed_log(&[("a", "1", 2.0), ("b", "2", 1.0), ("c", "3", 2.0), ("d", "4", 1.0)]);

        let messages = normalize(log, &OverlayOpts::default());

        assert_eq!(texts(&messages), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn three_messages_get_three_rows() {
        let log = elapsed_log(&[("a", "one", 0.0), ("a", "two", 1.0), ("a", "three", 2.0)]);

        let events = compile(log, &OverlayOpts::default());

        assert_eq!(events.len(), 3);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.slot, i);
            assert_eq!(event.start_us, i as i64 * 1_000_000);
            assert_eq!(event.end_us - event.start_us, 4_000_000);
        }
        assert_eq!(events[2].text, "three");
    }

    #[test]
    fn preempted_message_waits_for_earliest_row() {
        let log = elapsed_log(&[("a", "1", 0.0), ("b", "2", 0.0), ("c", "3", 0.0)]);
        let opts = OverlayOpts {
            slot_count: 2,
            ..OverlayOpts::default()
        };

        let events = compile(log, &opts);

        assert_eq!(events[2].slot, 0);
        assert_eq!(events[2].start_us, 4_000_000);
    }

    #[test]
    fn author_colour_is_reordered() {
        let mut log = elapsed_log(&[("a", "hi", 0.0), ("b", "yo", 0.0)]);
        log.messages[0].color = "1A2B3C".to_string();
        log.messages[1].color = "bad".to_string();

        let events = compile(log, &OverlayOpts::default());

        assert_eq!(events[0].color_bgr, "3C2B1A");
        assert_eq!(events[1].color_bgr, "FFFFFF");
    }

    #[test]
    fn recompiling_filtered_messages_is_stable() {
        let raw = [
            ("a", "x", 0.0),
            ("a", "x", 0.5),
            ("b", "y", 0.2),
            ("c", "z", 0.2),
            ("a", "w", 3.0),
        ];
        let opts = OverlayOpts {
            slot_count: 2,
            ..OverlayOpts::default()
        };
        let first = normalize(elapsed_log(&raw), &opts);
        let again = ChatLog {
            total_records: first.len(),
            format: SourceFormat::Elapsed,
            messages: first.iter().map(|m| m.message.clone()).collect(),
        };

        let events = compile(elapsed_log(&raw), &opts);

        assert_eq!(compile(again, &opts), events);
    }
}
