//! Include files staged next to a scene.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ldpov_ir::ColorTable;
use log::{info, warn};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::materials::write_materials;

/// Built-in header include: finishes, lights and background.
pub const HEADER_INCLUDE: &str = include_str!("../resources/header.inc");

/// Files written by [`stage_resources`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedResources {
    /// Header include.
    pub header: PathBuf,
    /// Materials include.
    pub materials: PathBuf,
    /// Copy of the primitive manifest, when one was configured and found.
    pub primitives: Option<PathBuf>,
}

/// Write the header and materials includes into `dir`, and copy the
/// primitive manifest there if it exists.
pub fn stage_resources(
    dir: impl AsRef<Path>,
    config: &RenderConfig,
    colors: &dyn ColorTable,
) -> Result<StagedResources> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let header = dir.join(&config.header_file);
    fs::write(&header, HEADER_INCLUDE)?;

    let materials = dir.join(&config.materials_file);
    let file = File::create(&materials)?;
    let mut writer = BufWriter::new(file);
    write_materials(colors, &mut writer)?;
    writer.flush()?;

    let primitives = match &config.primitives_manifest {
        Some(source) if source.is_file() => {
            let target = dir.join(&config.primitives_file);
            if fs::canonicalize(source).ok() != fs::canonicalize(&target).ok() {
                fs::copy(source, &target)?;
            }
            Some(target)
        }
        Some(source) => {
            warn!("Primitive manifest {} not found, not staged", source.display());
            None
        }
        None => None,
    };

    info!("Staged scene includes in {}", dir.display());
    Ok(StagedResources {
        header,
        materials,
        primitives,
    })
}
