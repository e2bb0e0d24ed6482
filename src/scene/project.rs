use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context as _;

use crate::animation::keyframe::{Keyframe, KeyframeStore};
use crate::foundation::core::{Canvas, MIN_ASSET_SIZE, TIMELINE_END, TIMELINE_START};
use crate::foundation::error::{EasyAnimError, EasyAnimResult};
use crate::scene::asset::{Asset, AssetId, AssetKind};
use crate::scene::color::Color;
use crate::timeline::context::{EditorContext, Scene};

/// JSON shape of a project file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProjectDef {
    #[serde(default)]
    pub(crate) canvas: Canvas,
    #[serde(default = "ProjectDef::default_background")]
    pub(crate) background: String,
    #[serde(default)]
    pub(crate) assets: Vec<Asset>,
    #[serde(default)]
    pub(crate) keyframes: BTreeMap<AssetId, Vec<Keyframe>>,
}

impl ProjectDef {
    fn default_background() -> String {
        "#0f172a".to_owned()
    }
}

/// Saved animation project: canvas, background, assets in z-order and their keyframes.
///
/// Asset image paths are relative to the directory passed to the export driver (the CLI uses the
/// project file's directory).
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    def: ProjectDef,
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> EasyAnimResult<Self> {
        let def: ProjectDef = serde_json::from_reader(r)
            .map_err(|e| EasyAnimError::serde(format!("parse project JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> EasyAnimResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EasyAnimError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Snapshot the scene and keyframes of `ctx`.
    pub fn from_context(ctx: &EditorContext) -> Self {
        let scene = ctx.scene();
        let [r, g, b, a] = scene.background.to_array();
        let background = if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        };
        Self {
            def: ProjectDef {
                canvas: scene.canvas,
                background,
                assets: scene.assets.clone(),
                keyframes: ctx
                    .keyframes()
                    .iter()
                    .map(|(id, track)| (id.clone(), track.to_vec()))
                    .collect(),
            },
        }
    }

    /// Write pretty-printed JSON.
    pub fn to_writer<W: Write>(&self, w: W) -> EasyAnimResult<()> {
        serde_json::to_writer_pretty(w, &self.def)
            .map_err(|e| EasyAnimError::serde(format!("write project JSON: {e}")))
    }

    /// Write pretty-printed JSON to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> EasyAnimResult<()> {
        let path = path.as_ref();
        let f = File::create(path)
            .with_context(|| format!("create project file '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        self.to_writer(&mut w)?;
        w.flush()
            .with_context(|| format!("flush project file '{}'", path.display()))?;
        Ok(())
    }

    /// Check structural rules: unique ids, finite transforms of at least the minimum size, keyframe
    /// times inside the timeline, keyframes only for known assets, parseable colours.
    pub fn validate(&self) -> EasyAnimResult<()> {
        let def = &self.def;
        def.canvas.validate()?;
        Color::parse(&def.background)?;

        let mut ids = HashSet::new();
        for asset in &def.assets {
            if asset.id.as_str().is_empty() {
                return Err(EasyAnimError::validation("asset id must be non-empty"));
            }
            if !ids.insert(&asset.id) {
                return Err(EasyAnimError::validation(format!(
                    "duplicate asset id '{}'",
                    asset.id
                )));
            }
            check_size(&asset.id, asset.transform.width, asset.transform.height)?;
            asset.transform.validate()?;
            if let AssetKind::Text { style, .. } = &asset.kind {
                Color::parse(&style.color)?;
            }
        }

        for (id, track) in &def.keyframes {
            if !ids.contains(id) {
                return Err(EasyAnimError::validation(format!(
                    "keyframes reference unknown asset '{id}'"
                )));
            }
            for k in track {
                if !k.time.is_finite() || !(TIMELINE_START..=TIMELINE_END).contains(&k.time) {
                    return Err(EasyAnimError::validation(format!(
                        "asset '{id}': keyframe time {} outside [0, 100]",
                        k.time
                    )));
                }
                k.transform.validate()?;
                check_size(id, k.transform.width, k.transform.height)?;
            }
        }
        Ok(())
    }

    /// Validate and build the engine state. Keyframes go through the store's coalescing upsert.
    pub fn into_context(self) -> EasyAnimResult<EditorContext> {
        self.validate()?;
        let def = self.def;
        let mut keyframes = KeyframeStore::new();
        for (id, track) in &def.keyframes {
            for k in track {
                keyframes.upsert(id, k.time, k.transform)?;
            }
        }
        let scene = Scene {
            canvas: def.canvas,
            background: Color::parse(&def.background)?,
            assets: def.assets,
        };
        Ok(EditorContext::with_keyframes(scene, keyframes))
    }

    /// Interactive canvas size.
    pub fn canvas(&self) -> Canvas {
        self.def.canvas
    }

    /// Assets in z-order.
    pub fn assets(&self) -> &[Asset] {
        &self.def.assets
    }
}

fn check_size(id: &AssetId, width: f64, height: f64) -> EasyAnimResult<()> {
    if width < MIN_ASSET_SIZE || height < MIN_ASSET_SIZE {
        return Err(EasyAnimError::validation(format!(
            "asset '{id}': size {width}x{height} below minimum {MIN_ASSET_SIZE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;
