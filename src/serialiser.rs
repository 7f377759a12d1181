use crate::chat::SubtitleEvent;

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

const PLAY_RES_Y: i64 = 1080;
const SLOT_HEIGHT: i64 = 32;
const ROW_X: i64 = 50;
const TEXT_BGR: &str = "FFFFFF";

const HEADER: &str = "[Script Info]
ScriptType: v4.00+
PlayResX: 1920
PlayResY: 1080
ScaledBorderAndShadow: yes

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, BackColour, Bold, Italic, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Chat,Arial,28,&H00FFFFFF,&H00000000,-1,0,1,2,3,1,10,10,10,1


[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Writes the track to `output`. The file only appears once it is complete.
pub fn serialise<P: AsRef<Path>>(events: &[SubtitleEvent], output: P) -> Result<()> {
    let output = output.as_ref();
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = create_temp(dir).context("Failed to create file!")?;
    let mut writer = BufWriter::new(tmp);
    write_track(&mut writer, events).context("Failed to write to output file.")?;
    let tmp = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("Failed to write to output file.")?;
    tmp.persist(output)
        .map_err(|err| err.error)
        .context(format!("Failed to move output into place: '{}'", output.display()))?;
    Ok(())
}

// Same mode as `File::create`, so the umask decides who can read the track.
fn create_temp(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

fn write_track<W: Write>(buf: &mut W, events: &[SubtitleEvent]) -> Result<()> {
    write!(buf, "{}", HEADER)?;
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            writeln!(buf)?;
        }
        write_event(buf, event)?;
    }
    Ok(())
}

fn write_event<W: Write>(buf: &mut W, event: &SubtitleEvent) -> Result<()> {
    write!(buf, "Dialogue: 0,")?;
    write_ts(buf, event.start_us)?;
    write!(buf, ",")?;
    write_ts(buf, event.end_us)?;
    write!(
        buf,
        ",Chat,,0,0,0,,{{\\an1\\pos({},{})\\c&H{}&\\3a&H00&\\bord4\\blur2\\1a&H00&\\3c&H000000&}}",
        ROW_X,
        row_y(event.slot),
        event.color_bgr
    )?;
    write!(buf, "{}: {{\\c&H{}&}}{}", event.author, TEXT_BGR, event.text)?;
    Ok(())
}

/// Rows stack upwards from the bottom edge of the frame.
fn row_y(slot: usize) -> i64 {
    PLAY_RES_Y - SLOT_HEIGHT * (slot as i64 + 1)
}

/// `H:MM:SS.CC`, truncated to centiseconds.
fn write_ts<W: Write>(buf: &mut W, timestamp_us: i64) -> Result<()> {
    let total_secs = timestamp_us / 1_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let centis = (timestamp_us % 1_000_000) / 10_000;
    write!(buf, "{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)?;
    Ok(())
}
