use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::{DynamicImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

use crate::font;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
/// Valentine crimson, used for the badge border and label.
const ACCENT: Rgb<u8> = Rgb([220, 20, 60]);

const LABEL_SCALE: f32 = 20.0;
const BADGE_PADDING: u32 = 8;
/// Largest share of the module area the badge may cover. EC level H decodes
/// through ~30% damage; a quarter leaves headroom for print wear.
const MAX_BADGE_COVERAGE: f32 = 0.25;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("label badge would cover {got:.0}% of the code (limit {limit:.0}%)")]
    BadgeTooLarge { got: f32, limit: f32 },
    #[error("PNG serialization failed: {0}")]
    Png(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy)]
pub struct QrOptions {
    /// Pixel size of one QR module.
    pub box_size: u32,
    /// Quiet-zone width in modules.
    pub border: u32,
    pub ec: EcLevel,
}

impl QrOptions {
    /// Plain link codes: low redundancy, generous quiet zone.
    pub fn link() -> Self {
        Self {
            box_size: 10,
            border: 5,
            ec: EcLevel::L,
        }
    }

    /// Codes that will carry a centered label badge. The badge obscures
    /// center modules, so high error correction is mandatory: EC level H
    /// keeps the code scannable with up to ~30% of it covered.
    pub fn badge() -> Self {
        Self {
            box_size: 10,
            border: 2,
            ec: EcLevel::H,
        }
    }
}

impl Default for QrOptions {
    fn default() -> Self {
        Self::link()
    }
}

/// Render `url` as a QR code PNG, optionally overlaying a centered label
/// badge. Every failure mode comes back as a `QrError` value; callers treat
/// any error as "no image produced" and carry on.
pub fn render_qr(url: &str, label: Option<&str>, opts: &QrOptions) -> Result<Vec<u8>, QrError> {
    if url.is_empty() {
        return Err(QrError::EmptyPayload);
    }

    let code = QrCode::with_error_correction_level(url.as_bytes(), opts.ec)?;
    let modules: image::GrayImage = code
        .render::<Luma<u8>>()
        .quiet_zone(false)
        .module_dimensions(opts.box_size, opts.box_size)
        .build();

    // Pad the quiet zone ourselves so `border` is honored exactly.
    let code_px = modules.width();
    let margin = opts.border * opts.box_size;
    let mut canvas = RgbImage::from_pixel(code_px + 2 * margin, code_px + 2 * margin, WHITE);
    image::imageops::replace(
        &mut canvas,
        &DynamicImage::ImageLuma8(modules).to_rgb8(),
        margin as i64,
        margin as i64,
    );

    if let Some(label) = label {
        let label = label.trim();
        if !label.is_empty() {
            overlay_badge(&mut canvas, code_px, label)?;
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// `render_qr`, base64-encoded for a `data:image/png;base64,...` URI or
/// storage as an opaque text blob.
pub fn render_qr_base64(
    url: &str,
    label: Option<&str>,
    opts: &QrOptions,
) -> Result<String, QrError> {
    let png = render_qr(url, label, opts)?;
    Ok(B64.encode(png))
}

/// Paint a centered white badge with an accent border and the label text.
/// `code_px` is the side length of the module area (quiet zone excluded),
/// which bounds how much of the code the badge may cover.
fn overlay_badge(canvas: &mut RgbImage, code_px: u32, label: &str) -> Result<(), QrError> {
    let font = font::badge_font();
    let (text_w, text_h) = font.measure(label, LABEL_SCALE);

    let badge_w = text_w + 2 * BADGE_PADDING;
    let badge_h = text_h + 2 * BADGE_PADDING;

    let coverage = (badge_w * badge_h) as f32 / (code_px * code_px) as f32;
    if badge_w >= code_px || badge_h >= code_px || coverage > MAX_BADGE_COVERAGE {
        return Err(QrError::BadgeTooLarge {
            got: coverage * 100.0,
            limit: MAX_BADGE_COVERAGE * 100.0,
        });
    }

    let bx = (canvas.width() - badge_w) / 2;
    let by = (canvas.height() - badge_h) / 2;

    draw_filled_rect_mut(
        canvas,
        Rect::at(bx as i32, by as i32).of_size(badge_w, badge_h),
        WHITE,
    );
    // Two nested hollow rects give a 2px border
    for inset in 0..2i32 {
        draw_hollow_rect_mut(
            canvas,
            Rect::at(bx as i32 + inset, by as i32 + inset)
                .of_size(badge_w - 2 * inset as u32, badge_h - 2 * inset as u32),
            ACCENT,
        );
    }

    font.draw(
        canvas,
        label,
        LABEL_SCALE,
        (bx + BADGE_PADDING) as i32,
        (by + BADGE_PADDING) as i32,
        ACCENT,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> String {
        let img = image::load_from_memory(png).unwrap().to_luma8();
        let (w, h) = img.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            w as usize,
            h as usize,
            |x, y| img.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR code in the image");
        let (_meta, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn unlabeled_render_round_trips() {
        let url = "https://example.com/instructor/ABCD1234/messages";
        let png = render_qr(url, None, &QrOptions::link()).unwrap();

        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode(&png), url);
    }

    #[test]
    fn unlabeled_dimensions_honor_box_size_and_border() {
        let url = "https://example.com/instructor/ABCD1234/messages";
        let opts = QrOptions::link();
        let png = render_qr(url, None, &opts).unwrap();

        let modules = QrCode::with_error_correction_level(url.as_bytes(), opts.ec)
            .unwrap()
            .width() as u32;
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), (modules + 2 * opts.border) * opts.box_size);
        assert_eq!(img.height(), img.width());
    }

    #[test]
    fn labeled_render_stays_decodable() {
        let url = "https://example.com/instructor/TEMP0001/messages";
        let png = render_qr(url, Some("Dr. Smith"), &QrOptions::badge()).unwrap();
        assert_eq!(decode(&png), url);
    }

    #[test]
    fn labeled_render_paints_the_badge() {
        let url = "https://example.com/instructor/TEMP0001/messages";
        let png = render_qr(url, Some("Dr. Smith"), &QrOptions::badge()).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgb8();

        // The central region holds the badge: white fill plus the accent
        // border, neither of which a bare QR center would contain together.
        let (w, h) = img.dimensions();
        let mut saw_white = false;
        let mut saw_accent = false;
        for y in h / 4..3 * h / 4 {
            for x in w / 4..3 * w / 4 {
                let px = img.get_pixel(x, y);
                saw_white |= *px == Rgb([255, 255, 255]);
                saw_accent |= *px == Rgb([220, 20, 60]);
            }
        }
        assert!(saw_white);
        assert!(saw_accent);
    }

    #[test]
    fn blank_label_is_ignored() {
        let url = "https://example.com/instructor/ABCD1234";
        let plain = render_qr(url, None, &QrOptions::badge()).unwrap();
        let blank = render_qr(url, Some("   "), &QrOptions::badge()).unwrap();
        assert_eq!(plain, blank);
        assert_eq!(decode(&blank), url);
    }

    #[test]
    fn empty_payload_is_an_error_not_a_panic() {
        assert!(matches!(
            render_qr("", None, &QrOptions::link()),
            Err(QrError::EmptyPayload)
        ));
    }

    #[test]
    fn oversized_payload_is_an_encode_error() {
        let url = "x".repeat(5000);
        assert!(matches!(
            render_qr(&url, None, &QrOptions::link()),
            Err(QrError::Encode(_))
        ));
    }

    #[test]
    fn oversized_label_is_rejected() {
        let url = "https://example.com";
        let label = "W".repeat(80);
        assert!(matches!(
            render_qr(url, Some(&label), &QrOptions::badge()),
            Err(QrError::BadgeTooLarge { .. })
        ));
    }

    #[test]
    fn base64_output_decodes_back_to_the_png() {
        let url = "https://example.com/instructor/ABCD1234";
        let encoded = render_qr_base64(url, None, &QrOptions::link()).unwrap();
        let png = B64.decode(encoded).unwrap();
        assert_eq!(decode(&png), url);
    }

    #[test]
    fn presets_match_their_use_cases() {
        let link = QrOptions::link();
        assert_eq!(link.ec, EcLevel::L);
        assert_eq!(link.border, 5);
        assert_eq!(link.box_size, 10);

        let badge = QrOptions::badge();
        assert_eq!(badge.ec, EcLevel::H);
        assert_eq!(badge.border, 2);
    }
}
