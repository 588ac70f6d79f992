//! Color-space conversion for render configs.
//!
//! Print-oriented clients submit module colors as CMYK percentages; the
//! rasterizer works in RGB hex. Conversion happens once at config
//! normalization time, so everything persisted is already hex.

/// Convert CMYK components (each in `0..=100`) to an uppercase `#RRGGBB`
/// hex string.
///
/// Per-channel formula: `x = 1 − min(1, v·(1−k) + k)` with `v` and `k`
/// normalized to `0..=1`, scaled to `0..=255`. Inputs outside `0..=100`
/// are clamped.
pub fn cmyk_to_hex(c: f64, m: f64, y: f64, k: f64) -> String {
    let k = norm(k);
    let r = channel(norm(c), k);
    let g = channel(norm(m), k);
    let b = channel(norm(y), k);
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Normalize a percentage component to `0.0..=1.0`.
fn norm(v: f64) -> f64 {
    (v / 100.0).clamp(0.0, 1.0)
}

/// One RGB channel from its CMYK counterpart and the key component.
fn channel(v: f64, k: f64) -> u8 {
    let x = 1.0 - (v * (1.0 - k) + k).min(1.0);
    (x * 255.0).round() as u8
}

/// Parse a `#RRGGBB` (or `RRGGBB`) hex string into RGB components.
///
/// Returns `None` for anything that is not exactly six hex digits.
pub fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some([r, g, b])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmyk_zero_is_white() {
        assert_eq!(cmyk_to_hex(0.0, 0.0, 0.0, 0.0), "#FFFFFF");
    }

    #[test]
    fn cmyk_full_key_is_black() {
        assert_eq!(cmyk_to_hex(0.0, 0.0, 0.0, 100.0), "#000000");
    }

    #[test]
    fn cmyk_full_cyan_is_primary() {
        // c=100 drives red to zero, leaves green and blue fully on.
        assert_eq!(cmyk_to_hex(100.0, 0.0, 0.0, 0.0), "#00FFFF");
    }

    #[test]
    fn cmyk_components_clamp_out_of_range() {
        assert_eq!(cmyk_to_hex(-20.0, 0.0, 0.0, 150.0), "#000000");
    }

    #[test]
    fn parse_hex_accepts_with_and_without_hash() {
        assert_eq!(parse_hex("#0A0B0C"), Some([10, 11, 12]));
        assert_eq!(parse_hex("ff00ff"), Some([255, 0, 255]));
    }

    #[test]
    fn parse_hex_rejects_malformed_input() {
        assert_eq!(parse_hex("#FFF"), None);
        assert_eq!(parse_hex("#GGGGGG"), None);
        assert_eq!(parse_hex(""), None);
    }
}
