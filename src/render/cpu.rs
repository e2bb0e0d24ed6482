use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::store::{PreparedImage, PreparedText, TextLayoutEngine};
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::render::backend::FrameRGBA;
use crate::render::pipeline::{AssetGeometry, DrawPayload, DrawSurface};
use crate::scene::color::Color;

/// Smallest and largest text size in pixels.
const TEXT_SIZE_MIN: f64 = 12.0;
const TEXT_SIZE_MAX: f64 = 48.0;
/// Text size as a fraction of the box height.
const TEXT_SIZE_RATIO: f64 = 0.4;

/// Font size used for a text box of `height` pixels.
pub fn text_size_for_height(height: f64) -> f32 {
    (height * TEXT_SIZE_RATIO).clamp(TEXT_SIZE_MIN, TEXT_SIZE_MAX) as f32
}

/// Offscreen CPU raster surface powered by `vello_cpu`.
///
/// Decoded images and registered fonts are cached across frames, so one surface should be reused
/// for a whole export.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    text_engine: TextLayoutEngine,
    image_cache: HashMap<usize, vello_cpu::Image>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    /// Create a surface of `canvas` size. Each side must fit in `u16`.
    pub fn new(canvas: Canvas) -> EasyAnimResult<Self> {
        canvas.validate()?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| EasyAnimError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| EasyAnimError::validation("canvas height exceeds u16"))?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            width,
            height,
            text_engine: TextLayoutEngine::new(),
            image_cache: HashMap::new(),
        })
    }

    /// Surface size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    /// Rasterize everything drawn since the last [`DrawSurface::clear`] and read the pixels back.
    pub fn finish(&mut self) -> EasyAnimResult<FrameRGBA> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        self.ctx.reset();
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn image_paint_for(&mut self, img: &PreparedImage) -> EasyAnimResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&img.rgba8_premul) as usize;
        if let Some(p) = self.image_cache.get(&key) {
            return Ok(p.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_cache.insert(key, paint.clone());
        Ok(paint)
    }

    fn draw_image(&mut self, geom: &AssetGeometry, img: &PreparedImage) -> EasyAnimResult<()> {
        if img.width == 0 || img.height == 0 {
            return Ok(());
        }
        let paint = self.image_paint_for(img)?;
        let (iw, ih) = (f64::from(img.width), f64::from(img.height));
        let stretch = Affine::scale_non_uniform(geom.width / iw, geom.height / ih);
        self.ctx
            .set_transform(affine_to_cpu(geom.transform * stretch));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        Ok(())
    }

    fn draw_text(
        &mut self,
        geom: &AssetGeometry,
        text: &str,
        prepared: &PreparedText,
    ) -> EasyAnimResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let size = text_size_for_height(geom.height);
        let layout =
            self.text_engine
                .layout_line(text, &prepared.font, size, prepared.color.to_array())?;

        // Centre the line inside the box.
        let dx = (geom.width - f64::from(layout.width())) / 2.0;
        let dy = (geom.height - f64::from(layout.height())) / 2.0;
        self.ctx
            .set_transform(affine_to_cpu(geom.transform * Affine::translate((dx, dy))));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let [r, g, b, a] = run.style().brush;
                self.ctx
                    .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                // Paint with the face parley shaped the run with.
                let font = run.run().font();
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

impl DrawSurface for CpuSurface {
    fn clear(&mut self, background: Color) -> EasyAnimResult<()> {
        self.ctx.reset();
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let [r, g, b, a] = background.to_array();
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    fn draw_asset(
        &mut self,
        geometry: &AssetGeometry,
        payload: DrawPayload<'_>,
    ) -> EasyAnimResult<()> {
        match payload {
            DrawPayload::Image(img) => self.draw_image(geometry, img),
            DrawPayload::Text { text, prepared } => self.draw_text(geometry, text, prepared),
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> EasyAnimResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| EasyAnimError::evaluation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| EasyAnimError::evaluation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(EasyAnimError::evaluation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
