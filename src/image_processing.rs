//! Logo color extraction
//!
//! - Decode the logo (PNG, JPEG or SVG)
//! - Drop transparent and pure-white pixels
//! - Cluster the rest into three colors

use image::{DynamicImage, ImageFormat, RgbaImage};
use rand::Rng;
use resvg::{tiny_skia, usvg};
use std::io::Cursor;

use crate::error::AppError;
use crate::gradient::TeamColors;
use crate::kmeans;
use crate::palette;

/// Number of colors pulled from every logo
pub const LOGO_COLORS: usize = 3;

/// How far into a body to look for an `<svg` tag
const SVG_SNIFF_LEN: usize = 1024;

fn looks_like_svg(data: &[u8]) -> bool {
    data[..data.len().min(SVG_SNIFF_LEN)]
        .windows(4)
        .any(|w| w == b"<svg")
}

/// True for SVG documents, by content type or by an `<svg` tag near the start
pub fn is_svg(content_type: &str, data: &[u8]) -> bool {
    content_type.contains("svg") || looks_like_svg(data)
}

/// Render an SVG at its intrinsic size into straight-alpha RGBA
pub fn rasterize_svg(svg_data: &[u8]) -> Result<RgbaImage, AppError> {
    let tree = usvg::Tree::from_data(svg_data, &usvg::Options::default())
        .map_err(|e| AppError::ImageProcessing(format!("Failed to parse SVG: {}", e)))?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        AppError::ImageProcessing(format!(
            "Invalid SVG size {}x{}",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied color
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    RgbaImage::from_raw(size.width(), size.height(), raw)
        .ok_or_else(|| AppError::ImageProcessing("Rasterized SVG has the wrong length".to_string()))
}

/// Decode image bytes into RGBA; SVG input is rasterized
pub fn decode_rgba(image_data: &[u8]) -> Result<RgbaImage, AppError> {
    if looks_like_svg(image_data) {
        return rasterize_svg(image_data);
    }

    let img = image::load_from_memory(image_data)
        .map_err(|e| AppError::ImageProcessing(format!("Failed to decode image: {}", e)))?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA image as PNG
pub fn encode_png(img: RgbaImage) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| AppError::ImageProcessing(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf)
}

/// Extract the three cluster colors of a logo
pub fn extract_team_colors<R: Rng + ?Sized>(
    image_data: &[u8],
    rng: &mut R,
) -> Result<TeamColors, AppError> {
    let img = decode_rgba(image_data)?;
    let pixels = palette::eligible_pixels(&img);

    let result = kmeans::cluster(&pixels, LOGO_COLORS, rng)?;
    tracing::debug!(
        "Clustered {} of {} logo pixels in {} rounds",
        pixels.len(),
        img.width() * img.height(),
        result.iterations
    );

    Ok(TeamColors::from_centroids(&result.centroids)?)
}
