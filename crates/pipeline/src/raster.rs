//! QR rasterization and compositing.
//!
//! Pure local-file rendering: encode the dialcode, paint modules onto an
//! RGB canvas at a fixed mm→px ratio, then optionally composite the
//! south-aligned human-readable text and a solid border.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use qrcode::QrCode;

use dialbatch_core::color::parse_hex;
use dialbatch_core::render::{EcLevel, RenderConfig};

use crate::error::PipelineError;

/// Height of the text band composited below the QR body.
const TEXT_BAND_PX: u32 = 18;

/// Font pixel size for the human-readable code text.
const TEXT_SCALE_PX: f32 = 14.0;

/// Renders dialcode QR images to local PNG files.
///
/// The text overlay needs a TTF font; if none is configured or it fails to
/// load, text compositing is skipped with a warning and everything else
/// still renders.
pub struct Rasterizer {
    font: Option<FontVec>,
}

impl Rasterizer {
    /// Build a rasterizer, loading the text font from `font_path` if given.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(|path| match std::fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid font file; text overlay disabled");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read font file; text overlay disabled");
                None
            }
        });
        Self { font }
    }

    /// Render one dialcode to `out` as a PNG.
    pub fn render_to_file(
        &self,
        dialcode: &str,
        cfg: &RenderConfig,
        out: &Path,
    ) -> Result<(), PipelineError> {
        let code = QrCode::with_error_correction_level(
            dialcode.as_bytes(),
            map_ec_level(cfg.error_correction),
        )?;
        let modules = code.width() as u32;

        // Integer module scale so the matrix stays crisp; the final side
        // length is the closest multiple of the module count at or under
        // round(size_mm × 2.6).
        let scale = (cfg.size_px() / modules).max(1);
        let qr_px = modules * scale;
        let margin = cfg.margin_px();

        let fg = rgb_or(&cfg.color, Rgb([0, 0, 0]));
        let bg = rgb_or(&cfg.background_color, Rgb([255, 255, 255]));

        let text_band = if cfg.show_text && self.font.is_some() {
            TEXT_BAND_PX
        } else {
            0
        };

        let width = qr_px + 2 * margin;
        let height = qr_px + 2 * margin + text_band;
        let mut img = RgbImage::from_pixel(width, height, bg);

        // Paint dark modules.
        let colors = code.to_colors();
        for (i, module) in colors.iter().enumerate() {
            if *module == qrcode::Color::Dark {
                let mx = margin + (i as u32 % modules) * scale;
                let my = margin + (i as u32 / modules) * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(mx + dx, my + dy, fg);
                    }
                }
            }
        }

        if cfg.show_text {
            if let Some(font) = &self.font {
                let px = PxScale::from(TEXT_SCALE_PX);
                let (tw, th) = text_size(px, font, dialcode);
                let x = width.saturating_sub(tw) / 2;
                let y = margin + qr_px + text_band.saturating_sub(th) / 2;
                draw_text_mut(&mut img, fg, x as i32, y as i32, px, font, dialcode);
            }
            draw_border(&mut img, cfg.border_px, fg);
        }

        img.save(out)?;
        Ok(())
    }
}

/// Draw a solid frame of `thickness` pixels around the whole canvas.
fn draw_border(img: &mut RgbImage, thickness: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let t = thickness.min(w / 2).min(h / 2);
    for y in 0..h {
        for x in 0..w {
            if x < t || y < t || x >= w - t || y >= h - t {
                img.put_pixel(x, y, color);
            }
        }
    }
}

fn rgb_or(hex: &str, fallback: Rgb<u8>) -> Rgb<u8> {
    parse_hex(hex).map(Rgb).unwrap_or(fallback)
}

fn map_ec_level(level: EcLevel) -> qrcode::EcLevel {
    match level {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
