//! WAD Export
//!
//! This module writes generated levels and images into a PWAD archive.
//!
//! # Architecture
//!
//! - `wad_types`: Level records and their baseline/extended binary layouts
//! - `patch`: Column based patch image encoder
//! - `level`: Per-level geometry accumulator
//! - `wad_writer`: PWAD container writer
//! - `export`: Export session driving the archive lifecycle

pub mod export;
pub mod level;
pub mod patch;
pub mod wad_types;
pub mod wad_writer;

pub use export::{ExportError, ExportSession};
pub use level::LevelBuilder;
pub use patch::{encode_patch, PatchLayout, Pixels};
pub use wad_types::*;
pub use wad_writer::{ArchiveErrors, ArchiveWriter, FileWadWriter, WadWriter};
