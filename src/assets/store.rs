use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::assets::decode::{decode_image, is_svg_path, rasterize_svg};
use crate::assets::fonts::{FontBook, ResolvedFont};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::scene::asset::{Asset, AssetId, AssetKind};
use crate::scene::color::Color;

/// Prepared raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub(crate) width: u32,
    /// Height in pixels.
    pub(crate) height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub(crate) rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.rgba8_premul
    }
}

/// Font and colour resolved for one text asset.
#[derive(Clone, Debug)]
pub struct PreparedText {
    pub(crate) font: ResolvedFont,
    pub(crate) color: Color,
}

impl PreparedText {
    /// Fill colour.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Raw bytes of the selected font file.
    pub fn font_bytes(&self) -> &[u8] {
        &self.font.bytes
    }
}

/// Render-ready payload of one asset.
#[derive(Clone, Debug)]
pub(crate) enum PreparedAsset {
    Image(PreparedImage),
    Text(PreparedText),
}

/// One asset whose payload could not be prepared. The asset renders as an empty slot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AssetLoadFailure {
    /// Failed asset.
    pub asset: AssetId,
    /// Human-readable cause.
    pub reason: String,
}

/// Payloads for every asset of a scene, loaded up front.
///
/// Loading is parallel and failure-isolated: one unreadable file never prevents the others from
/// loading, and the store is complete (with failures recorded) before it is returned.
#[derive(Clone, Debug, Default)]
pub struct PreparedAssetStore {
    entries: HashMap<AssetId, PreparedAsset>,
    failures: Vec<AssetLoadFailure>,
}

impl PreparedAssetStore {
    /// Load the payload of every asset in `assets`. Image sources resolve against `root`.
    #[tracing::instrument(skip(assets, fonts), fields(root = %root.display(), assets = assets.len()))]
    pub fn prepare(root: &Path, assets: &[Asset], fonts: &FontBook) -> Self {
        let results: Vec<(AssetId, EasyAnimResult<PreparedAsset>)> = assets
            .par_iter()
            .map(|asset| (asset.id.clone(), prepare_one(root, asset, fonts)))
            .collect();

        let mut entries = HashMap::with_capacity(results.len());
        let mut failures = Vec::new();
        for (id, res) in results {
            match res {
                Ok(p) => {
                    entries.insert(id, p);
                }
                Err(e) => {
                    tracing::warn!(asset = %id, error = %e, "asset failed to load, rendering empty slot");
                    failures.push(AssetLoadFailure {
                        asset: id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            entries,
            failures,
        }
    }

    /// Assets that failed to load, in scene order.
    pub fn failures(&self) -> &[AssetLoadFailure] {
        &self.failures
    }

    /// Number of successfully prepared assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing was prepared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(&self, id: &AssetId) -> Option<&PreparedAsset> {
        self.entries.get(id)
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, id: AssetId, asset: PreparedAsset) {
        self.entries.insert(id, asset);
    }
}

fn prepare_one(root: &Path, asset: &Asset, fonts: &FontBook) -> EasyAnimResult<PreparedAsset> {
    let wrap = |e: EasyAnimError| EasyAnimError::asset_load(asset.id.clone(), e.to_string());
    match &asset.kind {
        AssetKind::Image { source } => {
            let norm = normalize_rel_path(source).map_err(wrap)?;
            let path = root.join(Path::new(&norm));
            let bytes = std::fs::read(&path)
                .with_context(|| format!("read image '{}'", path.display()))
                .map_err(|e| wrap(e.into()))?;
            let img = if is_svg_path(&norm) {
                rasterize_svg(&bytes, fonts.database())
            } else {
                decode_image(&bytes)
            }
            .map_err(wrap)?;
            Ok(PreparedAsset::Image(img))
        }
        AssetKind::Text { style, .. } => {
            let color = Color::parse(&style.color).map_err(wrap)?;
            let font = fonts.resolve(&style.font, style.bold).map_err(wrap)?;
            Ok(PreparedAsset::Text(PreparedText { font, color }))
        }
    }
}

/// Parley layout state plus the family name each registered font resolved to.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<[u8; 4]>,
    families: HashMap<usize, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    // Fonts are registered once per distinct byte buffer.
    fn family_for(&mut self, font: &ResolvedFont) -> EasyAnimResult<String> {
        let key = Arc::as_ptr(&font.bytes) as usize;
        if let Some(name) = self.families.get(&key) {
            return Ok(name.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families
            .iter()
            .find(|(_, infos)| infos.iter().any(|info| info.index() == font.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                EasyAnimError::validation("no font families registered from font bytes")
            })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| EasyAnimError::validation("registered font family has no name"))?
            .to_string();
        self.families.insert(key, name.clone());
        Ok(name)
    }

    /// Shape a single unwrapped line of text with the face `font` was resolved to.
    ///
    /// Several faces of one family can be registered on the same engine, so the weight is pinned
    /// along with the family name.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        font: &ResolvedFont,
        size_px: f32,
        brush: [u8; 4],
    ) -> EasyAnimResult<parley::Layout<[u8; 4]>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(EasyAnimError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(font.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<[u8; 4]> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Normalize and validate project-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> EasyAnimResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(EasyAnimError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(EasyAnimError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(EasyAnimError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(EasyAnimError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
