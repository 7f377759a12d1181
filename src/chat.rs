/// `Elapsed` when any record carries `time_in_seconds` (VOD replays).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Elapsed,
    Epoch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawTimestamp {
    /// Seconds since the start of the VOD. May be fractional.
    ElapsedSeconds(f64),
    EpochMicros(i64),
}

impl RawTimestamp {
    pub fn second(&self) -> i64 {
        match *self {
            RawTimestamp::ElapsedSeconds(secs) => secs.floor() as i64,
            RawTimestamp::EpochMicros(us) => us.div_euclid(1_000_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub(crate) author: String,
    pub(crate) text: String,
    pub(crate) raw_timestamp: RawTimestamp,
    pub(crate) color: String,
}

#[derive(Debug)]
pub struct ChatLog {
    /// Number of records in the log, text messages or not.
    pub(crate) total_records: usize,
    pub(crate) format: SourceFormat,
    pub(crate) messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessage {
    pub(crate) message: ChatMessage,
    pub(crate) relative_time_us: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEvent {
    pub(crate) start_us: i64,
    pub(crate) end_us: i64,
    pub(crate) slot: usize,
    pub(crate) color_bgr: String,
    pub(crate) author: String,
    pub(crate) text: String,
}

pub const DEFAULT_SLOT_COUNT: usize = 20;
pub const DEFAULT_DISPLAY_US: i64 = 4_000_000;

#[derive(Debug, Clone)]
pub struct OverlayOpts {
    pub(crate) slot_count: usize,
    pub(crate) display_us: i64,
    // Only applied to elapsed-format logs.
    pub(crate) origin_secs: u64,
}

impl Default for OverlayOpts {
    fn default() -> Self {
        OverlayOpts {
            slot_count: DEFAULT_SLOT_COUNT,
            display_us: DEFAULT_DISPLAY_US,
            origin_secs: 0,
        }
    }
}
