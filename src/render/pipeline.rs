use crate::assets::store::{PreparedAsset, PreparedAssetStore, PreparedImage, PreparedText};
use crate::foundation::core::{Affine, Canvas, Point, Rect, Transform};
use crate::foundation::error::EasyAnimResult;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::CpuSurface;
use crate::scene::asset::{Asset, AssetKind};
use crate::scene::color::Color;
use crate::timeline::context::EditorContext;

/// Where an asset box lands on the canvas.
///
/// `transform` maps box-local coordinates (`0..width`, `0..height`) into canvas space, rotating
/// about the box centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetGeometry {
    /// Box-local to canvas transform.
    pub transform: Affine,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

impl AssetGeometry {
    /// Geometry of an asset with transform `t`.
    pub fn from_transform(t: &Transform) -> Self {
        let half_w = t.width / 2.0;
        let half_h = t.height / 2.0;
        let transform = Affine::translate((t.x + half_w, t.y + half_h))
            * Affine::rotate(t.rotation.to_radians())
            * Affine::translate((-half_w, -half_h));
        Self {
            transform,
            width: t.width,
            height: t.height,
        }
    }

    /// Axis-aligned canvas-space bounds of the (possibly rotated) box.
    pub fn bounds(&self) -> Rect {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(self.width, 0.0),
            Point::new(self.width, self.height),
            Point::new(0.0, self.height),
        ]
        .map(|p| self.transform * p);
        corners[1..]
            .iter()
            .fold(Rect::from_points(corners[0], corners[0]), |r, p| {
                r.union_pt(*p)
            })
    }
}

/// Kind-specific content handed to a [`DrawSurface`].
#[derive(Clone, Copy, Debug)]
pub enum DrawPayload<'a> {
    /// Decoded image, stretched to the box.
    Image(&'a PreparedImage),
    /// Text content with its resolved font and colour.
    Text {
        /// Content to draw.
        text: &'a str,
        /// Font and colour.
        prepared: &'a PreparedText,
    },
}

/// Target of the render pipeline.
pub trait DrawSurface {
    /// Reset the surface and fill it with `background`.
    fn clear(&mut self, background: Color) -> EasyAnimResult<()>;
    /// Draw one asset box.
    fn draw_asset(&mut self, geometry: &AssetGeometry, payload: DrawPayload<'_>)
    -> EasyAnimResult<()>;
}

/// Counts reported by [`render_assets`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Assets drawn.
    pub drawn: usize,
    /// Assets without a prepared payload (failed loads), left as empty slots.
    pub skipped: usize,
}

/// Draw `assets` back to front onto `surface`.
///
/// Transforms are read, never written.
pub fn render_assets(
    assets: &[Asset],
    prepared: &PreparedAssetStore,
    surface: &mut dyn DrawSurface,
) -> EasyAnimResult<RenderReport> {
    let mut report = RenderReport::default();
    for asset in assets {
        let payload = match (&asset.kind, prepared.get(&asset.id)) {
            (AssetKind::Image { .. }, Some(PreparedAsset::Image(img))) => DrawPayload::Image(img),
            (AssetKind::Text { text, .. }, Some(PreparedAsset::Text(t))) => DrawPayload::Text {
                text,
                prepared: t,
            },
            _ => {
                report.skipped += 1;
                continue;
            }
        };
        surface.draw_asset(&AssetGeometry::from_transform(&asset.transform), payload)?;
        report.drawn += 1;
    }
    Ok(report)
}

/// Render the current state of `ctx` into a fresh frame of size `canvas`.
pub fn render_frame(
    ctx: &EditorContext,
    prepared: &PreparedAssetStore,
    canvas: Canvas,
) -> EasyAnimResult<FrameRGBA> {
    let mut surface = CpuSurface::new(canvas)?;
    surface.clear(ctx.scene().background)?;
    render_assets(ctx.assets(), prepared, &mut surface)?;
    surface.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
