use std::sync::Arc;

use anyhow::Context;

use crate::assets::store::PreparedImage;
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Shorter SVG edges are rasterized up to this many pixels so scaled-up vectors stay sharp.
const SVG_MIN_RASTER_EDGE: f32 = 512.0;
const SVG_MAX_RASTER_EDGE: f32 = 4096.0;

/// Longest image side the raster surface can paint.
const MAX_RASTER_EDGE: u32 = u16::MAX as u32;

fn check_raster_size(width: u32, height: u32) -> EasyAnimResult<()> {
    if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
        return Err(EasyAnimError::validation(format!(
            "image is {width}x{height}; each side must be at most {MAX_RASTER_EDGE} pixels"
        )));
    }
    Ok(())
}

/// Decode PNG/JPEG/GIF/WebP/BMP bytes into premultiplied RGBA8.
pub(crate) fn decode_image(bytes: &[u8]) -> EasyAnimResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    check_raster_size(width, height)?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Parse SVG bytes and rasterize them into premultiplied RGBA8.
pub(crate) fn rasterize_svg(
    bytes: &[u8],
    fontdb: Arc<usvg::fontdb::Database>,
) -> EasyAnimResult<PreparedImage> {
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(EasyAnimError::evaluation("svg has invalid width/height"));
    }
    let scale = (SVG_MIN_RASTER_EDGE / w.min(h))
        .max(1.0)
        .min(SVG_MAX_RASTER_EDGE / w.max(h));
    let width = (w * scale).round().max(1.0) as u32;
    let height = (h * scale).round().max(1.0) as u32;
    check_raster_size(width, height)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| EasyAnimError::evaluation("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / w,
        height as f32 / h,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}

/// Return `true` when `source` names an SVG file.
pub(crate) fn is_svg_path(source: &str) -> bool {
    source
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("svg"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
