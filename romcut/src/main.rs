//! binary ROM compiler
//!
//! Renders the characters of a font into the sections of a character ROM,
//! and works with the memory-initialization files and images it produces.

mod outline;
mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use font_rom::{
    compile, consolidate, split_file, Consolidated, MifFile, OutputMode, RomConfig, RomImage,
};
use miette::{miette, IntoDiagnostic, WrapErr};

use crate::outline::FontRasterizer;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print more progress; repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// The encoding of consolidated records.
#[derive(clap::ValueEnum, Copy, Clone, Default, Debug, PartialEq)]
enum Mode {
    /// Concatenated hex digits.
    #[default]
    Hex,
    /// Each field as zero-padded binary digits.
    Binary,
    /// Concatenated data, header left as it was.
    Raw,
    /// Hex and binary files side by side.
    HexAndBinary,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Hex => OutputMode::Hex,
            Mode::Binary => OutputMode::Binary,
            Mode::Raw => OutputMode::Raw,
            Mode::HexAndBinary => OutputMode::HexAndBinary,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Render a font into memory-initialization files and a ROM image
    Compile {
        /// The font file to render
        #[arg(short, long)]
        font: PathBuf,
        /// Where to write the artifacts
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// A TOML file describing the sections and layout of the ROM
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the characters to render
        #[arg(long)]
        chars: Option<String>,
        /// Also write consolidated files in this encoding
        #[arg(long, value_enum)]
        consolidate: Option<Mode>,
        /// Only write the ROM image
        #[arg(long)]
        no_mif: bool,
    },
    /// Merge every eight records of a file into one
    Consolidate {
        /// The file to consolidate
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t)]
        mode: Mode,
        /// Defaults to <input>_combined.mif
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Where the binary file of hex-and-binary mode goes; defaults to
        /// <input>_combined_bin.mif
        #[arg(long)]
        binary_output: Option<PathBuf>,
    },
    /// Split 32-bit records into high and low 16-bit files
    Split {
        /// The file to split
        input: PathBuf,
        /// Defaults to <input>_High.mif
        #[arg(long)]
        high: Option<PathBuf>,
        /// Defaults to <input>_Low.mif
        #[arg(long)]
        low: Option<PathBuf>,
    },
    /// Check the checksum of a ROM image
    Verify {
        /// The image to check
        image: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Compile {
            font,
            out_dir,
            config,
            chars,
            consolidate,
            no_mif,
        } => {
            let mut config = match config {
                Some(path) => RomConfig::load(&path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("failed to load '{}'", path.display()))?,
                None => RomConfig::default(),
            };
            if let Some(chars) = chars {
                config.chars = chars;
            }
            if let Some(mode) = consolidate {
                config.consolidate = Some(mode.into());
            }
            run_compile(&font, &config, &out_dir, !no_mif)
        }
        Command::Consolidate {
            input,
            mode,
            output,
            binary_output,
        } => run_consolidate(&input, mode.into(), output, binary_output),
        Command::Split { input, high, low } => run_split(&input, high, low),
        Command::Verify { image } => run_verify(&image),
    }
}

fn run_compile(
    font_path: &Path,
    config: &RomConfig,
    out_dir: &Path,
    emit_mif: bool,
) -> miette::Result<()> {
    let data = std::fs::read(font_path)
        .map_err(|e| miette!("error reading '{}': {e}", font_path.display()))?;
    let mut rasterizer = FontRasterizer::new(&data)
        .wrap_err_with(|| format!("failed to load '{}'", font_path.display()))?;
    let compilation = compile(config, &mut rasterizer).into_diagnostic()?;

    for section in &compilation.sections {
        if !section.skipped.is_empty() {
            let skipped: String = section.skipped.iter().collect();
            log::warn!("section '{}' is missing {skipped:?}", section.name);
        }
    }
    let written = output::write_all(out_dir, &output::artifacts(&compilation, emit_mif))?;
    println!(
        "wrote {} files to {} (checksum {:#06X})",
        written.len(),
        out_dir.display(),
        compilation.image.stored_checksum()
    );
    Ok(())
}

fn load_mif(path: &Path) -> miette::Result<MifFile> {
    MifFile::load(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load '{}'", path.display()))
}

/// `dir/stem.mif` becomes `dir/<name>` where name is derived from stem.
fn sibling(input: &Path, name: impl FnOnce(&str) -> String) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    input.with_file_name(name(&stem))
}

fn consolidate_file(input: &Path, mode: OutputMode) -> miette::Result<Consolidated> {
    let file = load_mif(input)?;
    consolidate(&file, mode)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to consolidate '{}'", input.display()))
}

fn run_consolidate(
    input: &Path,
    mode: OutputMode,
    hex_path: Option<PathBuf>,
    binary_path: Option<PathBuf>,
) -> miette::Result<()> {
    let hex_path =
        hex_path.unwrap_or_else(|| sibling(input, |s| output::consolidated_names(s).0));
    let mut files = vec![];
    match consolidate_file(input, mode)? {
        Consolidated::Single(file) => files.push((hex_path, file)),
        Consolidated::Dual { hex, binary } => {
            let binary_path = binary_path
                .unwrap_or_else(|| sibling(input, |s| output::consolidated_names(s).1));
            files.push((hex_path, hex));
            files.push((binary_path, binary));
        }
    }
    for (path, file) in files {
        output::write_atomic(&path, file.to_string().as_bytes())?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn run_split(input: &Path, high: Option<PathBuf>, low: Option<PathBuf>) -> miette::Result<()> {
    let file = load_mif(input)?;
    let (high_file, low_file) = split_file(&file);
    let high = high.unwrap_or_else(|| sibling(input, |s| output::split_names(s).0));
    let low = low.unwrap_or_else(|| sibling(input, |s| output::split_names(s).1));
    for (path, file) in [(high, high_file), (low, low_file)] {
        output::write_atomic(&path, file.to_string().as_bytes())?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn run_verify(path: &Path) -> miette::Result<()> {
    let data =
        std::fs::read(path).map_err(|e| miette!("error reading '{}': {e}", path.display()))?;
    let image = RomImage::from_bytes(data).into_diagnostic()?;
    let (stored, computed) = (image.stored_checksum(), image.computed_checksum());
    if stored != computed {
        return Err(miette!(
            "checksum mismatch in '{}': stored {stored:#06X}, computed {computed:#06X}",
            path.display()
        ));
    }
    println!(
        "{}: {} bytes, checksum {stored:#06X} ok",
        path.display(),
        image.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use font_rom::{MemoryRecord, MifHeader};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_file(width: u32, records: usize) -> MifFile {
        let mut file = MifFile::new(MifHeader::new(width, 8192));
        file.push_comment("Character: 'A'");
        for i in 0..records {
            let data = match width {
                32 => format!("{:04X}{:04X}", i, 0xFFFF - i),
                _ => format!("{:04X}", i),
            };
            file.push_record(MemoryRecord::new(i as u32, data));
        }
        file
    }

    #[test]
    fn parse_compile_args() {
        let args = Args::try_parse_from([
            "romcut",
            "-vv",
            "compile",
            "--font",
            "font.ttf",
            "--consolidate",
            "hex-and-binary",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Compile {
                font,
                out_dir,
                consolidate,
                no_mif,
                ..
            } => {
                assert_eq!(font, PathBuf::from("font.ttf"));
                assert_eq!(out_dir, PathBuf::from("."));
                assert_eq!(consolidate, Some(Mode::HexAndBinary));
                assert!(!no_mif);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sibling_names() {
        let input = Path::new("out/FontRom64.mif");
        assert_eq!(
            sibling(input, |s| output::split_names(s).0),
            Path::new("out/FontRom64_High.mif")
        );
        assert_eq!(
            sibling(input, |s| output::consolidated_names(s).1),
            Path::new("out/FontRom64_combined_bin.mif")
        );
    }

    #[test]
    fn consolidate_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("FontRom32.mif");
        std::fs::write(&input, sample_file(16, 12).to_string()).unwrap();
        run_consolidate(&input, OutputMode::HexAndBinary, None, None).unwrap();

        let hex = MifFile::load(dir.path().join("FontRom32_combined.mif")).unwrap();
        let binary = MifFile::load(dir.path().join("FontRom32_combined_bin.mif")).unwrap();
        let bases: Vec<_> = hex.records().map(|r| r.address).collect();
        assert_eq!(bases, [0, 8]);
        assert_eq!(hex.records().next().unwrap().data.len(), 32);
        assert_eq!(binary.records().nth(1).unwrap().data.len(), 4 * 16);
    }

    #[test]
    fn split_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("FontRom64.mif");
        std::fs::write(&input, sample_file(32, 2).to_string()).unwrap();
        run_split(&input, None, None).unwrap();

        let high = MifFile::load(dir.path().join("FontRom64_High.mif")).unwrap();
        let low = MifFile::load(dir.path().join("FontRom64_Low.mif")).unwrap();
        let highs: Vec<_> = high.records().map(|r| r.data.as_str()).collect();
        let lows: Vec<_> = low.records().map(|r| r.data.as_str()).collect();
        assert_eq!(highs, ["0000", "0001"]);
        assert_eq!(lows, ["FFFF", "FFFE"]);
    }

    #[test]
    fn verify_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rom.bin");
        let mut data = vec![1, 2, 3, 4, 0, 10];
        std::fs::write(&path, &data).unwrap();
        run_verify(&path).unwrap();

        data[0] = 9;
        std::fs::write(&path, &data).unwrap();
        let err = run_verify(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn malformed_input_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.mif");
        std::fs::write(&input, "WIDTH=16;\nDEPTH=8;\nCONTENT BEGIN\n0000 : 12;\nEND;\n").unwrap();
        let err = run_consolidate(&input, OutputMode::Hex, None, None).unwrap_err();
        assert!(err.to_string().contains("broken.mif"));
    }
}
