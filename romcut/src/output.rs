//! Writing artifacts to disk.

use std::{
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
};

use font_rom::{Compilation, Consolidated};
use miette::miette;
use tempfile::NamedTempFile;

/// The file name of the assembled image.
pub const IMAGE_NAME: &str = "FontRomCombined.bin";

/// A file to be written, relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    fn text(name: String, file: &impl Display) -> Self {
        Artifact {
            name,
            contents: file.to_string().into_bytes(),
        }
    }
}

/// The names of the consolidated files derived from `stem`.
pub fn consolidated_names(stem: &str) -> (String, String) {
    (format!("{stem}_combined.mif"), format!("{stem}_combined_bin.mif"))
}

/// The names of the split halves derived from `stem`.
pub fn split_names(stem: &str) -> (String, String) {
    (format!("{stem}_High.mif"), format!("{stem}_Low.mif"))
}

/// Every artifact of a compilation, in the order they should be written.
///
/// The image always comes last. With `emit_mif` unset only the image is
/// produced.
pub fn artifacts(compilation: &Compilation, emit_mif: bool) -> Vec<Artifact> {
    let mut out = Vec::new();
    if emit_mif {
        for section in &compilation.sections {
            let stem = &section.file_stem;
            out.push(Artifact::text(format!("{stem}.xbm"), &section.xbm));
            out.push(Artifact::text(format!("{stem}.mif"), &section.mif));
            if let Some((high, low)) = &section.split {
                let (high_name, low_name) = split_names(stem);
                out.push(Artifact::text(high_name, high));
                out.push(Artifact::text(low_name, low));
            }
            let (hex_name, bin_name) = consolidated_names(stem);
            match &section.consolidated {
                Some(Consolidated::Single(file)) => out.push(Artifact::text(hex_name, file)),
                Some(Consolidated::Dual { hex, binary }) => {
                    out.push(Artifact::text(hex_name, hex));
                    out.push(Artifact::text(bin_name, binary));
                }
                None => (),
            }
        }
    }
    out.push(Artifact {
        name: IMAGE_NAME.to_owned(),
        contents: compilation.image.as_bytes().to_vec(),
    });
    out
}

/// Write `artifacts` into `dir`, creating it if needed.
pub fn write_all(dir: &Path, artifacts: &[Artifact]) -> miette::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| miette!("failed to create directory '{}': {e}", dir.display()))?;
    artifacts
        .iter()
        .map(|artifact| {
            let path = dir.join(&artifact.name);
            write_atomic(&path, &artifact.contents)?;
            Ok(path)
        })
        .collect()
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, so an interrupted write never leaves a partial file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> miette::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| {
        miette!(
            "failed to create temporary file in '{}': {e}",
            dir.display()
        )
    })?;
    file.write_all(contents)
        .map_err(|e| miette!("error writing '{}': {e}", path.display()))?;
    file.persist(path)
        .map_err(|e| miette!("error writing '{}': {}", path.display(), e.error))?;
    log::info!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
