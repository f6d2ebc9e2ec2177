//! Location-independent measure titles.
//!
//! Series titles look like `"Unemployment Rate in Autauga County, AL"` or
//! `"Resident Population for Los Angeles County, CA"`. The measure is the text
//! before the last location marker, so titles for the same measure in
//! different counties collapse to one key.

const MARKERS: [&str; 2] = [" in ", " for "];

/// Reduce a raw series title to its measure.
///
/// The marker is whichever of `" in "` / `" for "` occurs last. When a comma
/// precedes the marker the title is cut at the nearest such comma instead,
/// which also drops qualifiers written as `"Measure, Qualifier in Place"`.
/// Titles without a marker are only trimmed.
pub fn canonicalize(raw: &str) -> String {
    let Some(marker_at) = MARKERS.iter().filter_map(|m| raw.rfind(m)).max() else {
        return raw.trim().to_string();
    };

    let cut = raw[..marker_at].rfind(',').unwrap_or(marker_at);
    raw[..cut].trim().to_string()
}
