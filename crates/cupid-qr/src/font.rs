use std::sync::OnceLock;

use ab_glyph::{FontArc, PxScale};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

/// Candidate TTF locations tried after `CUPID_QR_FONT`.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// The face used for badge labels. A missing font never aborts a render:
/// when no TTF can be loaded we fall back to the built-in 8x8 bitmap face.
pub enum BadgeFont {
    Ttf(FontArc),
    Bitmap,
}

static FONT: OnceLock<BadgeFont> = OnceLock::new();

/// The process-wide badge font, loaded once on first use.
pub fn badge_font() -> &'static BadgeFont {
    FONT.get_or_init(load_font)
}

fn load_font() -> BadgeFont {
    let mut candidates: Vec<String> = Vec::new();
    if let Ok(path) = std::env::var("CUPID_QR_FONT") {
        candidates.push(path);
    }
    candidates.extend(SYSTEM_FONTS.iter().map(|p| (*p).to_string()));

    for path in &candidates {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                return BadgeFont::Ttf(font);
            }
        }
    }

    BadgeFont::Bitmap
}

impl BadgeFont {
    /// Bounding box (width, height) of `text` rendered at `scale` pixels.
    pub fn measure(&self, text: &str, scale: f32) -> (u32, u32) {
        match self {
            BadgeFont::Ttf(font) => text_size(PxScale::from(scale), font, text),
            BadgeFont::Bitmap => {
                let cell = bitmap_cell(scale);
                (text.chars().count() as u32 * cell, cell)
            }
        }
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn draw(&self, canvas: &mut RgbImage, text: &str, scale: f32, x: i32, y: i32, color: Rgb<u8>) {
        match self {
            BadgeFont::Ttf(font) => {
                draw_text_mut(canvas, color, x, y, PxScale::from(scale), font, text)
            }
            BadgeFont::Bitmap => draw_bitmap_text(canvas, text, scale, x, y, color),
        }
    }
}

/// Pixel size of one 8x8 glyph cell scaled up to roughly `scale` pixels.
fn bitmap_cell(scale: f32) -> u32 {
    let mult = (scale / 8.0).round().max(1.0) as u32;
    mult * 8
}

fn draw_bitmap_text(canvas: &mut RgbImage, text: &str, scale: f32, x0: i32, y0: i32, color: Rgb<u8>) {
    let mult = (bitmap_cell(scale) / 8) as i32;
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    let mut cx = x0;
    for ch in text.chars() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0u8; 8]);

        for (gy, row) in glyph.iter().enumerate() {
            for gx in 0..8i32 {
                if row & (1 << gx) == 0 {
                    continue;
                }
                for dy in 0..mult {
                    for dx in 0..mult {
                        let px = cx + gx * mult + dx;
                        let py = y0 + gy as i32 * mult + dy;
                        if px >= 0 && px < width && py >= 0 && py < height {
                            canvas.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }

        cx += 8 * mult;
    }
}
