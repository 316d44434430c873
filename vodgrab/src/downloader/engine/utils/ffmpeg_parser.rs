//! FFmpeg stderr parsing.
//!
//! FFmpeg reports its position on stderr with lines such as
//! `frame=  100 fps=25 q=-1.0 size=    1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.00x`.
//! The format is informal and varies between builds, so everything the rest
//! of the crate needs from it goes through [`parse_status_line`].

/// Parse time string in HH:MM:SS.ms format to seconds.
///
/// # Examples
/// ```ignore
/// assert_eq!(parse_time("00:00:10.50"), Some(10.5));
/// assert_eq!(parse_time("01:30:00.00"), Some(5400.0));
/// assert_eq!(parse_time("invalid"), None);
/// ```
pub fn parse_time(time_str: &str) -> Option<f64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Raw `time=` token, e.g. `00:01:30.50`. Only digits, `:` and `.` are taken,
/// so `time=N/A` and negative start offsets yield `None`.
fn time_token(line: &str) -> Option<&str> {
    let start = line.find("time=")? + "time=".len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ':' || c == '.'))
        .unwrap_or(rest.len());
    let token = &rest[..end];
    (!token.is_empty()).then_some(token)
}

/// Parse time field from FFmpeg output line (e.g., "time=00:01:30.50") into seconds.
pub fn parse_time_field(line: &str) -> Option<f64> {
    parse_time(time_token(line)?)
}

/// Size label following `size=`, e.g. `1024kB` (leading padding skipped).
pub fn parse_size_label(line: &str) -> Option<&str> {
    let start = line.find("size=")? + "size=".len();
    let rest = line[start..].trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let label = &rest[..end];
    (!label.is_empty()).then_some(label)
}

/// Position report extracted from one stderr record.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine<'a> {
    /// The `time=` token as printed.
    pub timecode: &'a str,
    pub elapsed_secs: f64,
    pub size: Option<&'a str>,
}

impl StatusLine<'_> {
    /// `HH:MM` part of the timecode.
    pub fn hours_minutes(&self) -> String {
        self.timecode
            .splitn(3, ':')
            .take(2)
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Parse a status line. Any record with a valid `time=` token counts;
/// `size=` is optional.
pub fn parse_status_line(line: &str) -> Option<StatusLine<'_>> {
    let timecode = time_token(line)?;
    let elapsed_secs = parse_time(timecode)?;

    Some(StatusLine {
        timecode,
        elapsed_secs,
        size: parse_size_label(line),
    })
}

/// `round(elapsed / expected * 100)`.
///
/// Not clamped: an underestimated `expected_secs` produces values above 100.
/// A zero expected duration yields 0.
pub fn percentage(elapsed_secs: f64, expected_secs: u64) -> u32 {
    if expected_secs == 0 || !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0;
    }
    // `as` saturates on overflow
    (elapsed_secs / expected_secs as f64 * 100.0).round() as u32
}
