//! HLS playlist generation functions.

use super::types::{MediaPart, MediaPlaylist};
use chrono::SecondsFormat;
use std::fmt::{self, Write};
use std::time::Duration;

/// Format a duration in seconds with the fixed five decimals used by every
/// duration attribute in generated playlists.
pub fn format_duration(d: Duration) -> String {
    format!("{:.5}", d.as_secs_f64())
}

/// Generate an HLS media playlist (M3U8) from a [`MediaPlaylist`].
///
/// Tag order:
/// - `#EXTM3U`, `#EXT-X-VERSION`, optional `#EXT-X-ALLOW-CACHE`
/// - `#EXT-X-TARGETDURATION`, `#EXT-X-MEDIA-SEQUENCE`
/// - optional `#EXT-X-SERVER-CONTROL` and `#EXT-X-PART-INF`
/// - `#EXT-X-MAP` or `#EXT-X-SKIP`
/// - per segment: `#EXT-X-GAP`, `#EXT-X-PROGRAM-DATE-TIME`, `#EXT-X-PART`
///   lines, `#EXTINF`, URI
/// - trailing `#EXT-X-PART` lines and `#EXT-X-PRELOAD-HINT`
pub fn generate_media_playlist(playlist: &MediaPlaylist) -> String {
    let mut out = String::new();
    let _ = write_media_playlist(&mut out, playlist);
    out
}

fn write_media_playlist(out: &mut String, playlist: &MediaPlaylist) -> fmt::Result {
    writeln!(out, "#EXTM3U")?;
    writeln!(out, "#EXT-X-VERSION:{}", playlist.version)?;

    if let Some(allow_cache) = playlist.allow_cache {
        writeln!(out, "#EXT-X-ALLOW-CACHE:{}", yes_no(allow_cache))?;
    }

    writeln!(out, "#EXT-X-TARGETDURATION:{}", playlist.target_duration)?;
    writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{}", playlist.media_sequence)?;

    if let Some(ref sc) = playlist.server_control {
        write!(out, "#EXT-X-SERVER-CONTROL:CAN-BLOCK-RELOAD={}", yes_no(sc.can_block_reload))?;
        if let Some(hold_back) = sc.part_hold_back {
            write!(out, ",PART-HOLD-BACK={}", format_duration(hold_back))?;
        }
        if let Some(skip_until) = sc.can_skip_until {
            write!(out, ",CAN-SKIP-UNTIL={}", format_duration(skip_until))?;
        }
        writeln!(out)?;
    }

    if let Some(ref part_inf) = playlist.part_inf {
        writeln!(
            out,
            "#EXT-X-PART-INF:PART-TARGET={}",
            format_duration(part_inf.part_target)
        )?;
    }

    if let Some(ref map_uri) = playlist.map_uri {
        writeln!(out, "#EXT-X-MAP:URI=\"{}\"", map_uri)?;
    }

    if let Some(skipped) = playlist.skipped_segments {
        writeln!(out, "#EXT-X-SKIP:SKIPPED-SEGMENTS={}", skipped)?;
    }

    for segment in &playlist.segments {
        if segment.gap {
            writeln!(out, "#EXT-X-GAP")?;
        }
        if let Some(date_time) = segment.date_time {
            writeln!(
                out,
                "#EXT-X-PROGRAM-DATE-TIME:{}",
                date_time.to_rfc3339_opts(SecondsFormat::Millis, true)
            )?;
        }
        for part in &segment.parts {
            write_part(out, part)?;
        }
        writeln!(out, "#EXTINF:{},", format_duration(segment.duration))?;
        writeln!(out, "{}", segment.uri)?;
    }

    for part in &playlist.parts {
        write_part(out, part)?;
    }

    if let Some(ref hint) = playlist.preload_hint {
        writeln!(out, "#EXT-X-PRELOAD-HINT:TYPE=PART,URI=\"{}\"", hint)?;
    }

    Ok(())
}

fn write_part(out: &mut String, part: &MediaPart) -> fmt::Result {
    write!(
        out,
        "#EXT-X-PART:DURATION={},URI=\"{}\"",
        format_duration(part.duration),
        part.uri
    )?;
    if part.independent {
        write!(out, ",INDEPENDENT=YES")?;
    }
    writeln!(out)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}
