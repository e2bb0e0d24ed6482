use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{EasyAnimError, EasyAnimResult};

/// Raw face bytes selected for a text asset.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedFont {
    /// Whole font file contents.
    pub(crate) bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub(crate) index: u32,
    /// CSS weight of the selected face (400 regular, 700 bold).
    pub(crate) weight: u16,
}

/// Font lookup over system fonts plus project-local `fonts/` and `assets/` directories.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .finish()
    }
}

impl FontBook {
    /// Load system fonts and any `.ttf`/`.otf`/`.ttc` under `root/fonts` and `root/assets`.
    pub fn load(root: &Path) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        load_fonts_from_dir(&mut db, &root.join("fonts"));
        load_fonts_from_dir(&mut db, &root.join("assets"));
        tracing::debug!(faces = db.len(), root = %root.display(), "font database loaded");
        Self { db: Arc::new(db) }
    }

    /// Wrap an already populated database.
    pub fn from_database(db: usvg::fontdb::Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Number of known faces.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub(crate) fn database(&self) -> Arc<usvg::fontdb::Database> {
        Arc::clone(&self.db)
    }

    /// Pick a face for `family`, falling back to generic families and finally to any face.
    pub(crate) fn resolve(&self, family: &str, bold: bool) -> EasyAnimResult<ResolvedFont> {
        let requested = generic_family(family);
        let families = [
            requested,
            usvg::fontdb::Family::SansSerif,
            usvg::fontdb::Family::Serif,
            usvg::fontdb::Family::Monospace,
        ];
        let query = usvg::fontdb::Query {
            families: &families,
            weight: if bold {
                usvg::fontdb::Weight::BOLD
            } else {
                usvg::fontdb::Weight::NORMAL
            },
            ..Default::default()
        };

        let id = self
            .db
            .query(&query)
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or_else(|| EasyAnimError::evaluation("no fonts available"))?;

        let weight = self.db.face(id).map_or(400, |f| f.weight.0);
        self.db
            .with_face_data(id, |data, index| ResolvedFont {
                bytes: Arc::new(data.to_vec()),
                index,
                weight,
            })
            .ok_or_else(|| {
                EasyAnimError::evaluation(format!("font face for '{family}' could not be read"))
            })
    }
}

fn generic_family(name: &str) -> usvg::fontdb::Family<'_> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => usvg::fontdb::Family::Serif,
        "sans-serif" => usvg::fontdb::Family::SansSerif,
        "monospace" => usvg::fontdb::Family::Monospace,
        "cursive" => usvg::fontdb::Family::Cursive,
        "fantasy" => usvg::fontdb::Family::Fantasy,
        _ => usvg::fontdb::Family::Name(name.trim()),
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}
