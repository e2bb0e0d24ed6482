use crate::foundation::core::{Canvas, Transform};

/// Opaque, immutable identity of an asset.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap a raw identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Styling of a text asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font family name, resolved against system and project fonts at render time.
    #[serde(default = "TextStyle::default_font")]
    pub font: String,
    /// CSS-like colour string (`#RRGGBB`, `#RRGGBBAA` or `rgb(r, g, b)`).
    #[serde(default = "TextStyle::default_color")]
    pub color: String,
    /// Bold weight.
    #[serde(default)]
    pub bold: bool,
}

impl TextStyle {
    fn default_font() -> String {
        "Arial".to_owned()
    }

    fn default_color() -> String {
        "#ffffff".to_owned()
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: Self::default_font(),
            color: Self::default_color(),
            bold: false,
        }
    }
}

/// Kind-specific render payload. The sampler never looks at this.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetKind {
    /// Bitmap (or SVG) image referenced by a project-relative path.
    Image {
        /// Project-relative source path.
        source: String,
    },
    /// Editable text line.
    Text {
        /// Text content.
        text: String,
        /// Font, colour and weight.
        #[serde(flatten)]
        style: TextStyle,
    },
}

/// Editing state of an asset.
///
/// `text_focus` is what the host uses for keyboard focus; `hold_sampling` is what the engine
/// reads to leave the asset alone on playback ticks and seeks. [`EditState::set`] keeps them
/// coupled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EditState {
    /// Asset owns text-input focus.
    #[serde(default)]
    pub text_focus: bool,
    /// Engine must not overwrite the asset's transform.
    #[serde(default)]
    pub hold_sampling: bool,
}

impl EditState {
    /// Set both flags together.
    pub fn set(&mut self, editing: bool) {
        self.text_focus = editing;
        self.hold_sampling = editing;
    }

    /// Return `true` when either flag is raised.
    pub fn is_editing(self) -> bool {
        self.text_focus || self.hold_sampling
    }
}

/// A placeable visual element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Asset {
    /// Identity, immutable for the asset's lifetime.
    pub id: AssetId,
    /// Render payload.
    pub kind: AssetKind,
    /// Current spatial state.
    pub transform: Transform,
    /// Editing flags.
    #[serde(default)]
    pub edit: EditState,
}

impl Asset {
    /// Edge length of a freshly dropped image.
    pub const IMAGE_SIZE: f64 = 160.0;

    /// New image asset, 160x160 and centred on `canvas`.
    pub fn image(id: AssetId, source: impl Into<String>, canvas: Canvas) -> Self {
        let half = Self::IMAGE_SIZE / 2.0;
        Self {
            id,
            kind: AssetKind::Image {
                source: source.into(),
            },
            transform: Transform::new(
                f64::from(canvas.width) / 2.0 - half,
                f64::from(canvas.height) / 2.0 - half,
                Self::IMAGE_SIZE,
                Self::IMAGE_SIZE,
                0.0,
            ),
            edit: EditState::default(),
        }
    }

    /// New text asset with placeholder content, focused for typing.
    pub fn text(id: AssetId, style: TextStyle) -> Self {
        let mut edit = EditState::default();
        edit.set(true);
        Self {
            id,
            kind: AssetKind::Text {
                text: "Type here...".to_owned(),
                style,
            },
            transform: Transform::new(400.0, 200.0, 200.0, 50.0, 0.0),
            edit,
        }
    }

    /// Return `true` for image assets.
    pub fn is_image(&self) -> bool {
        matches!(self.kind, AssetKind::Image { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/asset.rs"]
mod tests;
