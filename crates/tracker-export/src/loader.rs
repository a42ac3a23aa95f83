use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracker_gfx::resources::{BitmapData, ResourceError, ResourceLoader, ScaleVariant};

/// Looks bitmaps up as `<root>/<name><suffix>.png`, where the suffix names
/// the scale variant (`""`, `"@1.5x"`, `"@2x"`).
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str, variant: ScaleVariant) -> PathBuf {
        self.root.join(format!("{name}{}.png", variant.suffix()))
    }
}

impl ResourceLoader for DirLoader {
    fn load(
        &self,
        name: &str,
        variant: ScaleVariant,
    ) -> Result<Option<BitmapData>, ResourceError> {
        let path = self.path(name, variant);
        if !path.is_file() {
            log::trace!("no {}", path.display());
            return Ok(None);
        }
        decode(&path).map(Some).map_err(|e| ResourceError::Malformed {
            name: name.to_owned(),
            variant,
            reason: format!("{e:#}"),
        })
    }
}

/// Decodes an image file into straight-alpha RGBA8.
pub fn decode(path: &Path) -> Result<BitmapData> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(BitmapData::new(width, height, image.into_raw())?)
}
