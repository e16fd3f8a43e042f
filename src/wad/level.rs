//! Level Geometry Accumulator
//!
//! Collects the records of the level currently being built into one lump
//! per geometry kind. Record indices are assigned in insertion order, so a
//! caller can reference a vertex or sidedef by the index returned when it
//! was added.

use enum_map::EnumMap;

use super::wad_types::*;
use crate::lump::Lump;

/// Geometry of one level under construction
#[derive(Debug)]
pub struct LevelBuilder {
    format: RecordFormat,
    lumps: EnumMap<GeometryLump, Lump>,
}

impl LevelBuilder {
    pub fn new(format: RecordFormat) -> Self {
        Self {
            format,
            lumps: EnumMap::default(),
        }
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    fn push(&mut self, kind: GeometryLump, encode: impl FnOnce(&mut Vec<u8>)) -> usize {
        let index = self.count(kind);
        let mut record = Vec::with_capacity(self.format.record_size(kind));
        encode(&mut record);
        debug_assert_eq!(record.len(), self.format.record_size(kind));
        self.lumps[kind].append(&record);
        index
    }

    /// Number of records of `kind` added so far
    pub fn count(&self, kind: GeometryLump) -> usize {
        self.lumps[kind].len() / self.format.record_size(kind)
    }

    /// Add a vertex, returning its index
    pub fn add_vertex(&mut self, x: i16, y: i16) -> usize {
        self.push(GeometryLump::Vertexes, |out| Vertex { x, y }.encode(out))
    }

    pub fn add_sector(&mut self, sector: &Sector) -> usize {
        self.push(GeometryLump::Sectors, |out| sector.encode(out))
    }

    pub fn add_sidedef(&mut self, side: &Sidedef) -> usize {
        self.push(GeometryLump::Sidedefs, |out| side.encode(out))
    }

    pub fn add_linedef(&mut self, line: &Linedef) -> usize {
        let format = self.format;
        self.push(GeometryLump::Linedefs, |out| line.encode(format, out))
    }

    pub fn add_thing(&mut self, thing: &Thing) -> usize {
        let format = self.format;
        self.push(GeometryLump::Things, |out| thing.encode(format, out))
    }

    pub fn vertex_count(&self) -> usize {
        self.count(GeometryLump::Vertexes)
    }

    pub fn sector_count(&self) -> usize {
        self.count(GeometryLump::Sectors)
    }

    pub fn sidedef_count(&self) -> usize {
        self.count(GeometryLump::Sidedefs)
    }

    pub fn linedef_count(&self) -> usize {
        self.count(GeometryLump::Linedefs)
    }

    pub fn thing_count(&self) -> usize {
        self.count(GeometryLump::Things)
    }

    /// Raw bytes accumulated for `kind`
    pub fn lump(&self, kind: GeometryLump) -> &[u8] {
        self.lumps[kind].as_bytes()
    }
}
