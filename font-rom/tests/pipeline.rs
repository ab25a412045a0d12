//! Run the whole pipeline over a synthetic font.

use font_rom::{
    compile, consolidate, Consolidated, Coverage, Error, MifFile, OutputMode, RasterError,
    RomConfig, RomImage, RomLayout,
};
use pretty_assertions::assert_eq;

/// A font where every glyph is a solid block, except '#', which it lacks.
fn block_font(ch: char, pixel_size: f32) -> Result<Coverage, RasterError> {
    if ch == '#' {
        return Err(RasterError::MissingGlyph(ch));
    }
    let height = (pixel_size / 2.0) as u32;
    let width = height / 2;
    Ok(Coverage {
        width,
        height,
        data: vec![255; (width * height) as usize],
    })
}

fn config(chars: &str) -> RomConfig {
    RomConfig {
        chars: chars.into(),
        ..RomConfig::default()
    }
}

#[test]
fn legacy_layout() {
    let _ = env_logger::builder().is_test(true).try_init();
    let compilation = compile(&config("AB"), &mut block_font).unwrap();
    assert_eq!(compilation.image.len(), 73728);
    assert!(compilation.image.verify());

    let names: Vec<_> = compilation
        .sections
        .iter()
        .map(|s| s.file_stem.as_str())
        .collect();
    assert_eq!(names, ["FontRom32", "FontRom64", "FontRomCustom"]);

    let small = &compilation.sections[0];
    let addresses: Vec<_> = small.mif.records().map(|r| r.address).collect();
    assert_eq!(addresses, (0..64).collect::<Vec<_>>());
    assert!(small.split.is_none());

    // the first row with ink in the small section lands at the start of the image
    let first_ink = small
        .mif
        .records()
        .find(|r| r.data != "0000")
        .unwrap();
    let word = u16::from_str_radix(&first_ink.data, 16).unwrap();
    assert_eq!(
        compilation.image.word_at(first_ink.address as usize * 2),
        Some(word)
    );

    // the high half of the first wide glyph goes to 0x2000, the low half to 0x6000
    let wide = &compilation.sections[1];
    let (high, low) = wide.split.as_ref().unwrap();
    let row = wide.mif.records().find(|r| r.data != "00000000").unwrap();
    let offset = row.address as usize * 2;
    let high_word = high.records().find(|r| r.address == row.address).unwrap();
    let low_word = low.records().find(|r| r.address == row.address).unwrap();
    assert_eq!(&row.data[..4], high_word.data);
    assert_eq!(&row.data[4..], low_word.data);
    assert_eq!(
        compilation.image.word_at(0x2000 + offset),
        Some(u16::from_str_radix(&high_word.data, 16).unwrap())
    );
    assert_eq!(
        compilation.image.word_at(0x6000 + offset),
        Some(u16::from_str_radix(&low_word.data, 16).unwrap())
    );
}

#[test]
fn missing_glyphs_take_no_addresses() {
    let with_gap = compile(&config("A#B"), &mut block_font).unwrap();
    let without = compile(&config("AB"), &mut block_font).unwrap();
    for (a, b) in with_gap.sections.iter().zip(&without.sections) {
        assert_eq!(a.skipped, ['#']);
        assert_eq!(a.mif, b.mif);
    }
    assert_eq!(with_gap.image, without.image);
}

#[test]
fn consolidated_sections() {
    let mut config = config("A");
    config.consolidate = Some(OutputMode::HexAndBinary);
    let compilation = compile(&config, &mut block_font).unwrap();
    let Some(Consolidated::Dual { hex, binary }) = &compilation.sections[0].consolidated else {
        panic!("expected both encodings");
    };
    let bases: Vec<_> = hex.records().map(|r| r.address).collect();
    assert_eq!(bases, [0, 8, 0x10, 0x18]);
    assert!(hex.records().all(|r| r.data.len() == 32));
    assert!(binary.records().all(|r| r.data.len() == 128));
    assert_eq!(binary.header.data_radix, font_rom::Radix::Bin);
}

#[test]
fn files_survive_a_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let compilation = compile(&config("AB"), &mut block_font).unwrap();

    let mif_path = dir.path().join("FontRom32.mif");
    std::fs::write(&mif_path, compilation.sections[0].mif.to_string()).unwrap();
    let reloaded = MifFile::load(&mif_path).unwrap();
    assert_eq!(reloaded, compilation.sections[0].mif);
    assert_eq!(
        consolidate(&reloaded, OutputMode::Hex).unwrap(),
        consolidate(&compilation.sections[0].mif, OutputMode::Hex).unwrap()
    );

    let bin_path = dir.path().join("FontRomCombined.bin");
    std::fs::write(&bin_path, compilation.image.as_bytes()).unwrap();
    let image = RomImage::from_bytes(std::fs::read(&bin_path).unwrap()).unwrap();
    assert!(image.verify());
}

#[test]
fn missing_files_report_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.mif");
    match MifFile::load(&path) {
        Err(Error::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn custom_layout() {
    let text = r#"
        chars = "AB"

        [layout]
        total_size = 258
        regions = [{ name = "only", offset = 0, size = 256 }]

        [[sections]]
        name = "tiny"
        file_stem = "Tiny"
        placement = { direct = { region = "only" } }
        glyph = { canvas_width = 16, canvas_height = 32, forced_height = 28, max_width = 13 }
    "#;
    let config = RomConfig::from_toml_str(text).unwrap();
    assert_ne!(config.layout, RomLayout::legacy());
    let compilation = compile(&config, &mut block_font).unwrap();
    assert_eq!(compilation.image.len(), 258);
    assert!(compilation.image.verify());
    assert_eq!(compilation.sections[0].mif.records().count(), 64);
}
