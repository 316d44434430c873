//! Output file naming.

use std::path::{Path, PathBuf};

/// Container extension of every acquired file.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Characters rejected by at least one mainstream filesystem.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows refuses as file stems (case-insensitive).
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make a user-supplied name safe as a file stem.
///
/// Invalid and control characters become `_` (runs collapsed), surrounding
/// spaces and dots are trimmed and reserved device names get a `_` prefix.
/// Returns `None` when nothing usable is left.
pub fn sanitize_stem(input: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(input.len());
    let mut replaced = false;

    for c in input.chars() {
        if c.is_control() || INVALID_CHARS.contains(&c) {
            if !replaced {
                cleaned.push('_');
            }
            replaced = true;
        } else {
            cleaned.push(c);
            replaced = false;
        }
    }

    let trimmed = cleaned.trim_matches(|c| c == ' ' || c == '.');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return None;
    }

    let base = trimmed.split('.').next().unwrap_or(trimmed);
    if RESERVED_STEMS
        .iter()
        .any(|reserved| base.eq_ignore_ascii_case(reserved))
    {
        return Some(format!("_{trimmed}"));
    }

    Some(trimmed.to_string())
}

/// `<output_dir>/<stem>.mp4`, the stem being the sanitized `filename`, else
/// the video id, else `fallback` (a timestamp at the call site).
///
/// A trailing `.mp4` on `filename` is not doubled.
pub fn default_output_path(
    output_dir: &Path,
    filename: Option<&str>,
    video_id: Option<u64>,
    fallback: impl FnOnce() -> String,
) -> PathBuf {
    let stem = filename
        .map(|name| {
            let suffix = format!(".{OUTPUT_EXTENSION}");
            match name.len().checked_sub(suffix.len()) {
                Some(idx) if name.is_char_boundary(idx) && name[idx..].eq_ignore_ascii_case(&suffix) => {
                    &name[..idx]
                }
                _ => name,
            }
        })
        .and_then(sanitize_stem)
        .or_else(|| video_id.map(|id| id.to_string()))
        .unwrap_or_else(fallback);

    output_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("hello?world").as_deref(), Some("hello_world"));
        assert_eq!(sanitize_stem("a<>:b").as_deref(), Some("a_b"));
        assert_eq!(sanitize_stem("  My Video. ").as_deref(), Some("My Video"));
        assert_eq!(sanitize_stem("観る動画").as_deref(), Some("観る動画"));
        assert_eq!(sanitize_stem("line\nbreak").as_deref(), Some("line_break"));
    }

    #[test]
    fn test_sanitize_stem_rejects_empty_results() {
        assert_eq!(sanitize_stem(""), None);
        assert_eq!(sanitize_stem("..."), None);
        assert_eq!(sanitize_stem("???"), None);
    }

    #[test]
    fn test_reserved_names() {
        assert_eq!(sanitize_stem("con").as_deref(), Some("_con"));
        assert_eq!(sanitize_stem("LPT1.part").as_deref(), Some("_LPT1.part"));
        assert_eq!(sanitize_stem("console").as_deref(), Some("console"));
    }

    #[test]
    fn test_default_output_path_precedence() {
        let dir = Path::new("downloads");
        let never = || -> String { panic!("fallback not expected") };

        assert_eq!(
            default_output_path(dir, Some("talk"), Some(42), never),
            dir.join("talk.mp4")
        );
        assert_eq!(
            default_output_path(dir, Some("talk.MP4"), Some(42), never),
            dir.join("talk.mp4")
        );
        assert_eq!(
            default_output_path(dir, Some("///"), Some(42), never),
            dir.join("42.mp4")
        );
        assert_eq!(
            default_output_path(dir, None, None, || "1700000000000".to_string()),
            dir.join("1700000000000.mp4")
        );
    }
}
