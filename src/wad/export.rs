//! Export Session
//!
//! Drives the lifecycle of one archive:
//!
//! 1. `start_archive` opens the container and writes the `OBLIGDAT` info lump
//! 2. for every level: `begin_level`, add records, `end_level(name)`
//! 3. `end_archive` writes the patch block and closes the container
//!
//! All state of the archive being written lives in the session, so only
//! one level can be built at a time and the record format cannot change
//! once level building has begun.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::level::LevelBuilder;
use super::patch::{encode_patch, PatchLayout, Pixels};
use super::wad_types::{GeometryLump, RecordFormat};
use super::wad_writer::{ArchiveWriter, FileWadWriter};
use crate::lump::Lump;
use crate::sky::generate_sky;
use crate::Config;

/// Name of the info lump written at the start of every archive
pub const INFO_LUMP: &str = "OBLIGDAT";

/// Marker lumps bracketing the patch block
pub const PATCH_START: &str = "PP_START";
pub const PATCH_END: &str = "PP_END";

/// Compiled script lump of extended format levels
pub const BEHAVIOR_LUMP: &str = "BEHAVIOR";

/// Node builder output this exporter leaves empty
pub const EMPTY_NODE_LUMPS: [&str; 3] = ["SEGS", "SSECTORS", "NODES"];

/// Info lump terminator: ^Z and a NUL
const INFO_TERMINATOR: [u8; 2] = [26, 0];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unable to create wad file {path}: {source}")]
    CreateArchive { path: PathBuf, source: io::Error },
    #[error("an archive is already open")]
    ArchiveAlreadyOpen,
    #[error("no archive is open")]
    NoArchiveOpen,
    #[error("a level is already being built")]
    LevelAlreadyOpen,
    #[error("no level is being built")]
    NoLevelOpen,
    #[error("the archive cannot be finished while a level is being built")]
    LevelStillOpen,
    #[error("the record format cannot change once level building has started")]
    FormatLocked,
    #[error("missing data file: {name}.lmp")]
    MissingDataFile { name: String, source: io::Error },
    #[error("archive finished with {write_errors} write errors and {seek_errors} seek errors")]
    ArchiveFailed { write_errors: u32, seek_errors: u32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to serialize configuration: {0}")]
    Config(#[from] toml::ser::Error),
    #[error("failed to format info lump")]
    Format(#[from] std::fmt::Error),
}

/// State of one archive export
pub struct ExportSession<A: ArchiveWriter = FileWadWriter> {
    config: Config,
    archive: Option<A>,
    format: RecordFormat,
    level: Option<LevelBuilder>,
    levels_begun: usize,
    levels_written: usize,
}

impl ExportSession<FileWadWriter> {
    /// Create the archive file at `path` and start writing it
    pub fn start_archive(&mut self, path: &Path) -> Result<(), ExportError> {
        if self.archive.is_some() {
            return Err(ExportError::ArchiveAlreadyOpen);
        }

        let writer = FileWadWriter::create(path).map_err(|source| {
            log::error!("[Export] Unable to create wad file {}: {}", path.display(), source);
            ExportError::CreateArchive {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.start_archive_with(writer)
    }
}

impl<A: ArchiveWriter> ExportSession<A> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            archive: None,
            format: RecordFormat::Baseline,
            level: None,
            levels_begun: 0,
            levels_written: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start writing into an already opened archive
    pub fn start_archive_with(&mut self, mut archive: A) -> Result<(), ExportError> {
        if self.archive.is_some() {
            return Err(ExportError::ArchiveAlreadyOpen);
        }

        validate_config(&self.config)?;

        self.format = RecordFormat::Baseline;
        self.level = None;
        self.levels_begun = 0;
        self.levels_written = 0;

        let info = info_lump(&self.config)?;
        archive.write_lump(INFO_LUMP, info.as_bytes());
        self.archive = Some(archive);

        log::info!("[Export] Archive started");
        Ok(())
    }

    pub fn record_format(&self) -> RecordFormat {
        self.format
    }

    /// Select the record format for this archive. Only allowed before the
    /// first level is begun.
    pub fn set_record_format(&mut self, format: RecordFormat) -> Result<(), ExportError> {
        if self.archive.is_none() {
            return Err(ExportError::NoArchiveOpen);
        }
        if self.levels_begun > 0 {
            return Err(ExportError::FormatLocked);
        }

        log::info!("[Export] Record format: {:?}", format);
        self.format = format;
        Ok(())
    }

    /// Start building a new level
    pub fn begin_level(&mut self) -> Result<&mut LevelBuilder, ExportError> {
        if self.archive.is_none() {
            return Err(ExportError::NoArchiveOpen);
        }
        if self.level.is_some() {
            return Err(ExportError::LevelAlreadyOpen);
        }

        self.levels_begun += 1;
        Ok(self.level.insert(LevelBuilder::new(self.format)))
    }

    /// The level currently being built
    pub fn level_mut(&mut self) -> Result<&mut LevelBuilder, ExportError> {
        self.level.as_mut().ok_or(ExportError::NoLevelOpen)
    }

    /// Write the current level under the marker lump `name` and discard it
    pub fn end_level(&mut self, name: &str) -> Result<(), ExportError> {
        let archive = self.archive.as_mut().ok_or(ExportError::NoArchiveOpen)?;
        let level = self.level.take().ok_or(ExportError::NoLevelOpen)?;

        log::info!(
            "[Export] Writing level {}: {} things, {} linedefs, {} sidedefs, {} vertexes, {} sectors",
            name,
            level.thing_count(),
            level.linedef_count(),
            level.sidedef_count(),
            level.vertex_count(),
            level.sector_count()
        );

        archive.write_lump(name, &[]);

        for kind in [
            GeometryLump::Things,
            GeometryLump::Linedefs,
            GeometryLump::Sidedefs,
            GeometryLump::Vertexes,
        ] {
            archive.write_lump(kind.lump_name(), level.lump(kind));
        }

        for empty in EMPTY_NODE_LUMPS {
            archive.write_lump(empty, &[]);
        }

        archive.write_lump(
            GeometryLump::Sectors.lump_name(),
            level.lump(GeometryLump::Sectors),
        );

        if level.format() == RecordFormat::Extended {
            archive.write_lump(BEHAVIOR_LUMP, &empty_behavior());
        }

        self.levels_written += 1;
        Ok(())
    }

    pub fn levels_written(&self) -> usize {
        self.levels_written
    }

    /// Write the patch block, close the archive and report whether every
    /// write since `start_archive` succeeded. Returns the closed writer.
    pub fn end_archive(&mut self) -> Result<A, ExportError> {
        if self.level.is_some() {
            return Err(ExportError::LevelStillOpen);
        }
        let mut archive = self.archive.take().ok_or(ExportError::NoArchiveOpen)?;

        write_patches(&self.config, &mut archive)?;
        archive.close();

        let errors = archive.errors();
        if !errors.is_clean() {
            log::error!(
                "[Export] Archive finished with {} write errors and {} seek errors",
                errors.write_errors,
                errors.seek_errors
            );
            return Err(ExportError::ArchiveFailed {
                write_errors: errors.write_errors,
                seek_errors: errors.seek_errors,
            });
        }

        log::info!("[Export] Archive finished: {} levels", self.levels_written);
        Ok(archive)
    }
}

/// Reject configuration values the encoders cannot handle
fn validate_config(config: &Config) -> Result<(), ExportError> {
    let sky = &config.sky;
    if sky.width == 0 || sky.height == 0 {
        log::error!("[Export] Invalid sky size {}x{}", sky.width, sky.height);
        return Err(ExportError::InvalidConfig(format!(
            "sky size {}x{} must not be empty",
            sky.width, sky.height
        )));
    }
    Ok(())
}

/// Text lump describing the generator and the configuration used
fn info_lump(config: &Config) -> Result<Lump, ExportError> {
    let mut lump = Lump::new();
    lump.set_crlf(true);

    writeln!(lump)?;
    writeln!(
        lump,
        "-- Levels created by {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(lump, "-- Procedural level export for id Tech 1 engines")?;
    writeln!(lump)?;

    for line in config.to_lines()? {
        writeln!(lump, "{}", line)?;
    }

    write!(lump, "\n\n\n")?;
    lump.append(&INFO_TERMINATOR);

    Ok(lump)
}

/// ACS object with no scripts and no strings
fn empty_behavior() -> [u8; 16] {
    let mut raw = [0u8; 16];
    raw[0..4].copy_from_slice(b"ACS\0");
    // directory offset, pointing at the two zero counts that follow
    raw[4..8].copy_from_slice(&8u32.to_le_bytes());
    raw
}

fn write_patches<A: ArchiveWriter>(config: &Config, archive: &mut A) -> Result<(), ExportError> {
    archive.write_lump(PATCH_START, &[]);

    let game = config.game.game;
    for &name in game.external_patches() {
        let path = config.data.lump_path(name);
        let data = std::fs::read(&path).map_err(|source| {
            log::error!("[Export] Missing data file {}: {}", path.display(), source);
            ExportError::MissingDataFile {
                name: name.to_string(),
                source,
            }
        })?;
        archive.write_lump(name, &data);
    }

    let sky = &config.sky;
    let pixels = generate_sky(sky);
    let patch = encode_patch(
        PatchLayout::new(sky.width, sky.height),
        Pixels::new(&pixels, sky.width as usize, sky.height as usize),
        None,
    );
    archive.write_lump(game.sky_lump_name(), &patch);

    archive.write_lump(PATCH_END, &[]);
    Ok(())
}
