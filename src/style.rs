/// Colour used when an author colour is missing or malformed.
pub const FALLBACK_BGR: &str = "FFFFFF";

/// Converts an `RRGGBB` hex colour into the `BBGGRR` order used by ASS colour tags.
///
/// Only the length is checked, so six characters of garbage come out reordered.
pub fn encode_bgr(hex: &str) -> String {
    let chars: Vec<char> = hex.trim_start_matches('#').chars().collect();
    if chars.len() != 6 {
        return FALLBACK_BGR.to_string();
    }
    chars[4..6]
        .iter()
        .chain(&chars[2..4])
        .chain(&chars[0..2])
        .collect()
}
