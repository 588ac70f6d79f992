//! Render configuration: normalization, clamping, and the canonical
//! string map used for structural equality.
//!
//! A raw submission config is merged over hard-coded defaults exactly once,
//! at intake. The normalized form is a flat string-to-string map so two
//! configs are equal iff their persisted JSONB values are equal, which is
//! what makes the image cache dedup reliable.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::color::cmyk_to_hex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed millimetre→pixel ratio used by the rasterizer.
pub const MM_TO_PX: f64 = 2.6;

/// Default module (foreground) color.
pub const DEFAULT_COLOR: &str = "#000000";

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// QR side length bounds in millimetres.
pub const MIN_SIZE_MM: f64 = 30.0;
pub const MAX_SIZE_MM: f64 = 32.0;

/// Quiet-zone margin bounds in millimetres.
pub const MIN_MARGIN_MM: f64 = 3.0;
pub const MAX_MARGIN_MM: f64 = 100.0;

/// Default border thickness in pixels.
pub const DEFAULT_BORDER_PX: u32 = 1;

// ---------------------------------------------------------------------------
// Error correction level
// ---------------------------------------------------------------------------

/// QR error-correction level. Anything unrecognized falls back to `H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcLevel {
    L,
    M,
    Q,
    #[default]
    H,
}

impl EcLevel {
    /// Parse a level string, case-insensitively, defaulting to `H`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => EcLevel::L,
            "M" => EcLevel::M,
            "Q" => EcLevel::Q,
            "H" => EcLevel::H,
            _ => EcLevel::H,
        }
    }

    /// Canonical single-letter form.
    pub fn as_str(self) -> &'static str {
        match self {
            EcLevel::L => "L",
            EcLevel::M => "M",
            EcLevel::Q => "Q",
            EcLevel::H => "H",
        }
    }
}

// ---------------------------------------------------------------------------
// RenderConfig
// ---------------------------------------------------------------------------

/// Normalized visual parameters for one batch's QR images.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Module color as `#RRGGBB`.
    pub color: String,
    /// Background color as `#RRGGBB`.
    pub background_color: String,
    /// Side length in millimetres, clamped to `[30, 32]`.
    pub width_mm: f64,
    /// Side length in millimetres, clamped to `[30, 32]`.
    pub height_mm: f64,
    /// Quiet-zone margin in millimetres, clamped to `[3, 100]`.
    pub margin_mm: f64,
    /// Border thickness in pixels.
    pub border_px: u32,
    /// Whether to composite the human-readable code text and border.
    pub show_text: bool,
    /// Error-correction level.
    pub error_correction: EcLevel,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            width_mm: MIN_SIZE_MM,
            height_mm: MIN_SIZE_MM,
            margin_mm: MIN_MARGIN_MM,
            border_px: DEFAULT_BORDER_PX,
            show_text: true,
            error_correction: EcLevel::H,
        }
    }
}

impl RenderConfig {
    /// Build a config from a raw submission value, merging over defaults.
    ///
    /// Accepts both freshly-submitted configs (numbers, bools, CMYK color
    /// objects) and previously-normalized stringified maps, so a persisted
    /// batch config round-trips through this same function.
    pub fn from_value(raw: &Value) -> Self {
        let empty = Map::new();
        let raw = raw.as_object().unwrap_or(&empty);
        let mut cfg = Self::default();

        if let Some(v) = raw.get("color") {
            cfg.color = parse_color(v).unwrap_or_else(|| DEFAULT_COLOR.to_string());
        }
        if let Some(v) = raw.get("backgroundColor") {
            cfg.background_color =
                parse_color(v).unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());
        }
        if let Some(n) = raw.get("widthMm").and_then(as_f64) {
            cfg.width_mm = n;
        }
        if let Some(n) = raw.get("heightMm").and_then(as_f64) {
            cfg.height_mm = n;
        }
        if let Some(n) = raw.get("marginMm").and_then(as_f64) {
            cfg.margin_mm = n;
        }
        if let Some(n) = raw.get("borderPx").and_then(as_f64) {
            cfg.border_px = n.max(0.0).round() as u32;
        }
        if let Some(b) = raw.get("showText").and_then(as_bool) {
            cfg.show_text = b;
        }
        if let Some(s) = raw.get("errorCorrectionLevel").and_then(Value::as_str) {
            cfg.error_correction = EcLevel::parse(s);
        }

        cfg.width_mm = cfg.width_mm.clamp(MIN_SIZE_MM, MAX_SIZE_MM);
        cfg.height_mm = cfg.height_mm.clamp(MIN_SIZE_MM, MAX_SIZE_MM);
        cfg.margin_mm = cfg.margin_mm.clamp(MIN_MARGIN_MM, MAX_MARGIN_MM);
        cfg
    }

    /// The canonical stringified map persisted on Batch and Image rows.
    ///
    /// Every value is a string, so equality of two stored configs is
    /// structural equality of the maps.
    pub fn to_config_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("color".into(), self.color.clone());
        map.insert("backgroundColor".into(), self.background_color.clone());
        map.insert("widthMm".into(), fmt_num(self.width_mm));
        map.insert("heightMm".into(), fmt_num(self.height_mm));
        map.insert("marginMm".into(), fmt_num(self.margin_mm));
        map.insert("borderPx".into(), self.border_px.to_string());
        map.insert("showText".into(), self.show_text.to_string());
        map.insert(
            "errorCorrectionLevel".into(),
            self.error_correction.as_str().to_string(),
        );
        map
    }

    /// The canonical map as a JSON value, ready to persist.
    pub fn to_config_value(&self) -> Value {
        serde_json::to_value(self.to_config_map()).unwrap_or(Value::Null)
    }

    /// QR side length in pixels: `round(width_mm × 2.6)`.
    pub fn size_px(&self) -> u32 {
        (self.width_mm * MM_TO_PX).round() as u32
    }

    /// Quiet-zone margin in pixels, same fixed ratio as the QR body.
    pub fn margin_px(&self) -> u32 {
        (self.margin_mm * MM_TO_PX).round() as u32
    }
}

/// A color value: a hex string, or a CMYK object `{c, m, y, k}` with
/// percentage components.
fn parse_color(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_uppercase()),
        Value::Object(obj) => {
            let get = |key: &str| obj.get(key).and_then(as_f64);
            match (get("c"), get("m"), get("y"), get("k")) {
                (Some(c), Some(m), Some(y), Some(k)) => Some(cmyk_to_hex(c, m, y, k)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Read a JSON number, or a numeric string from an already-normalized map.
fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON bool, or a `"true"`/`"false"` string.
fn as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Format a number without a trailing `.0` for whole values.
fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
