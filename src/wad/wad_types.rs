//! Level Record Data Structures
//!
//! Records written into the geometry lumps of a level, and the encoders that
//! turn them into the on-disk layouts. Two layouts exist: the baseline
//! (Doom) layout and the extended (Hexen) layout, which adds action
//! specials and arguments to things and linedefs.

use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// Byte length of a lump name in the archive directory
pub const LUMP_NAME_LEN: usize = 8;

/// Byte length of a texture or flat name inside a record
pub const TEXTURE_NAME_LEN: usize = 8;

/// Sidedef index written for a missing side
pub const NO_SIDEDEF: u16 = 0xFFFF;

pub const VERTEX_SIZE: usize = 4;
pub const SECTOR_SIZE: usize = 26;
pub const SIDEDEF_SIZE: usize = 30;

/// On-disk record shape used for the level geometry of one archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Doom layout
    #[default]
    Baseline,
    /// Hexen layout with action specials on things and linedefs
    Extended,
}

impl RecordFormat {
    pub fn linedef_size(self) -> usize {
        match self {
            RecordFormat::Baseline => 14,
            RecordFormat::Extended => 16,
        }
    }

    pub fn thing_size(self) -> usize {
        match self {
            RecordFormat::Baseline => 10,
            RecordFormat::Extended => 20,
        }
    }

    /// Size of one record of `kind` in this format
    pub fn record_size(self, kind: GeometryLump) -> usize {
        match kind {
            GeometryLump::Things => self.thing_size(),
            GeometryLump::Linedefs => self.linedef_size(),
            GeometryLump::Sidedefs => SIDEDEF_SIZE,
            GeometryLump::Vertexes => VERTEX_SIZE,
            GeometryLump::Sectors => SECTOR_SIZE,
        }
    }
}

/// The five geometry lumps accumulated while a level is built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum)]
pub enum GeometryLump {
    Things,
    Linedefs,
    Sidedefs,
    Vertexes,
    Sectors,
}

impl GeometryLump {
    pub fn lump_name(self) -> &'static str {
        match self {
            GeometryLump::Things => "THINGS",
            GeometryLump::Linedefs => "LINEDEFS",
            GeometryLump::Sidedefs => "SIDEDEFS",
            GeometryLump::Vertexes => "VERTEXES",
            GeometryLump::Sectors => "SECTORS",
        }
    }
}

bitflags::bitflags! {
    /// Linedef flag bits
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct LinedefFlags: u16 {
        const IMPASSIBLE = 0x0001;
        const BLOCK_MONSTERS = 0x0002;
        const TWO_SIDED = 0x0004;
        const UPPER_UNPEGGED = 0x0008;
        const LOWER_UNPEGGED = 0x0010;
        const SECRET = 0x0020;
        const BLOCK_SOUND = 0x0040;
        const NOT_ON_MAP = 0x0080;
        const ALREADY_ON_MAP = 0x0100;
    }
}

bitflags::bitflags! {
    /// Thing option bits (skill levels and deafness)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ThingOptions: u16 {
        const EASY = 0x0001;
        const MEDIUM = 0x0002;
        const HARD = 0x0004;
        const AMBUSH = 0x0008;
        const NOT_SINGLE = 0x0010;
        const ALL_SKILLS = Self::EASY.bits() | Self::MEDIUM.bits() | Self::HARD.bits();
    }
}

/// Map vertex
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

/// Map sector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sector {
    pub floor_h: i16,
    pub floor_tex: String,
    pub ceil_h: i16,
    pub ceil_tex: String,
    pub light: u16,
    pub special: u16,
    pub tag: i16,
}

/// One side of a linedef
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sidedef {
    /// Index of the sector this side faces
    pub sector: i16,
    pub lower_tex: String,
    pub mid_tex: String,
    pub upper_tex: String,
    pub x_offset: i16,
    pub y_offset: i16,
}

/// Map line between two vertices
///
/// `line_type` and `tag` are written by the baseline layout. The extended
/// layout stores the low 8 bits of `line_type` as the action special,
/// followed by `args`, and has no tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Linedef {
    pub start: u16,
    pub end: u16,
    pub front: Option<u16>,
    pub back: Option<u16>,
    pub line_type: u16,
    pub flags: LinedefFlags,
    pub tag: i16,
    pub args: [u8; 5],
}

/// Map object (player start, monster, item, decoration)
///
/// `height`, `tid`, `special` and `args` only exist in the extended layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Thing {
    pub x: i16,
    pub y: i16,
    pub height: i16,
    pub thing_type: u16,
    pub angle: i16,
    pub options: ThingOptions,
    pub tid: i16,
    pub special: u8,
    pub args: [u8; 5],
}

/// Copy a texture name into a fixed 8-byte field.
/// Longer names are truncated, shorter names are NUL padded.
pub fn texture_name(name: &str) -> [u8; TEXTURE_NAME_LEN] {
    let mut raw = [0u8; TEXTURE_NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(TEXTURE_NAME_LEN);
    raw[..len].copy_from_slice(&bytes[..len]);
    raw
}

fn side_index(side: Option<u16>) -> u16 {
    side.unwrap_or(NO_SIDEDEF)
}

impl Vertex {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
    }
}

impl Sector {
    /// Engine `raw_sector_t` order: heights, flats, light, special, tag
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.floor_h.to_le_bytes());
        out.extend_from_slice(&self.ceil_h.to_le_bytes());
        out.extend_from_slice(&texture_name(&self.floor_tex));
        out.extend_from_slice(&texture_name(&self.ceil_tex));
        out.extend_from_slice(&self.light.to_le_bytes());
        out.extend_from_slice(&self.special.to_le_bytes());
        out.extend_from_slice(&self.tag.to_le_bytes());
    }
}

impl Sidedef {
    /// Engine `raw_sidedef_t` order: offsets, upper/lower/mid textures, sector
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x_offset.to_le_bytes());
        out.extend_from_slice(&self.y_offset.to_le_bytes());
        out.extend_from_slice(&texture_name(&self.upper_tex));
        out.extend_from_slice(&texture_name(&self.lower_tex));
        out.extend_from_slice(&texture_name(&self.mid_tex));
        out.extend_from_slice(&self.sector.to_le_bytes());
    }
}

impl Linedef {
    pub fn encode(&self, format: RecordFormat, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.start.to_le_bytes());
        out.extend_from_slice(&self.end.to_le_bytes());
        out.extend_from_slice(&self.flags.bits().to_le_bytes());

        match format {
            RecordFormat::Baseline => {
                out.extend_from_slice(&self.line_type.to_le_bytes());
                out.extend_from_slice(&self.tag.to_le_bytes());
            }
            RecordFormat::Extended => {
                // 8 bit special, tag is unused
                out.push(self.line_type as u8);
                out.extend_from_slice(&self.args);
            }
        }

        out.extend_from_slice(&side_index(self.front).to_le_bytes());
        out.extend_from_slice(&side_index(self.back).to_le_bytes());
    }
}

impl Thing {
    /// Engine `raw_thing_t` / `raw_hexen_thing_t` order
    pub fn encode(&self, format: RecordFormat, out: &mut Vec<u8>) {
        match format {
            RecordFormat::Baseline => {
                out.extend_from_slice(&self.x.to_le_bytes());
                out.extend_from_slice(&self.y.to_le_bytes());
                out.extend_from_slice(&self.angle.to_le_bytes());
                out.extend_from_slice(&self.thing_type.to_le_bytes());
                out.extend_from_slice(&self.options.bits().to_le_bytes());
            }
            RecordFormat::Extended => {
                out.extend_from_slice(&self.tid.to_le_bytes());
                out.extend_from_slice(&self.x.to_le_bytes());
                out.extend_from_slice(&self.y.to_le_bytes());
                out.extend_from_slice(&self.height.to_le_bytes());
                out.extend_from_slice(&self.angle.to_le_bytes());
                out.extend_from_slice(&self.thing_type.to_le_bytes());
                out.extend_from_slice(&self.options.bits().to_le_bytes());
                out.push(self.special);
                out.extend_from_slice(&self.args);
            }
        }
    }
}
