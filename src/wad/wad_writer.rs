//! PWAD Archive Writer
//!
//! Writes lumps into a PWAD container:
//! - header: `"PWAD"`, lump count (u32), directory offset (u32)
//! - lump data, in the order the lumps were written
//! - directory: per lump, offset (u32) + size (u32) + name (8 bytes)
//!
//! The header is written as a placeholder first and rewritten when the
//! archive is closed. Write and seek failures do not abort the archive;
//! they are logged and counted, and the caller checks the counters at the
//! end.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::wad_types::LUMP_NAME_LEN;

/// PWAD header magic
pub const PWAD_MAGIC: &[u8; 4] = b"PWAD";

/// Size of the PWAD header in bytes
pub const WAD_HEADER_SIZE: u32 = 12;

/// Size of one directory entry in bytes
pub const DIRECTORY_ENTRY_SIZE: usize = 16;

/// Failures observed by an archive writer since it was opened
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveErrors {
    pub write_errors: u32,
    pub seek_errors: u32,
}

impl ArchiveErrors {
    pub fn is_clean(&self) -> bool {
        self.write_errors == 0 && self.seek_errors == 0
    }
}

/// Named-chunk container the exporter writes into
pub trait ArchiveWriter {
    /// Start a new lump. Names longer than 8 bytes are a caller bug.
    fn begin_lump(&mut self, name: &str);

    /// Append data to the current lump
    fn append(&mut self, data: &[u8]);

    /// Finish the current lump
    fn finish_lump(&mut self);

    /// Write the directory and finalize the container
    fn close(&mut self);

    fn errors(&self) -> ArchiveErrors;

    /// Write a complete lump in one go
    fn write_lump(&mut self, name: &str, data: &[u8]) {
        self.begin_lump(name);
        if !data.is_empty() {
            self.append(data);
        }
        self.finish_lump();
    }
}

#[derive(Clone, Debug)]
struct DirectoryEntry {
    name: [u8; LUMP_NAME_LEN],
    offset: u32,
    size: u32,
}

/// PWAD writer over any seekable sink
pub struct WadWriter<W: Write + Seek> {
    inner: W,
    directory: Vec<DirectoryEntry>,
    current: Option<DirectoryEntry>,
    /// Bytes written so far, including the header
    position: u32,
    errors: ArchiveErrors,
}

/// WAD writer backed by a file on disk
pub type FileWadWriter = WadWriter<BufWriter<File>>;

impl FileWadWriter {
    /// Create the archive file at `path`
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        log::info!("[WadWriter] Created {}", path.display());
        Ok(WadWriter::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> WadWriter<W> {
    /// Wrap `inner` and write the placeholder header
    pub fn new(inner: W) -> Self {
        let mut writer = Self {
            inner,
            directory: Vec::new(),
            current: None,
            position: 0,
            errors: ArchiveErrors::default(),
        };
        writer.write_header(0, 0);
        writer.position = WAD_HEADER_SIZE;
        writer
    }

    fn write_header(&mut self, num_lumps: u32, directory_offset: u32) {
        let mut header = [0u8; WAD_HEADER_SIZE as usize];
        header[0..4].copy_from_slice(PWAD_MAGIC);
        header[4..8].copy_from_slice(&num_lumps.to_le_bytes());
        header[8..12].copy_from_slice(&directory_offset.to_le_bytes());
        self.write_raw(&header);
    }

    fn write_raw(&mut self, data: &[u8]) {
        if let Err(e) = self.inner.write_all(data) {
            self.errors.write_errors += 1;
            log::error!("[WadWriter] Failed to write {} bytes: {}", data.len(), e);
        }
    }

    fn flush_inner(&mut self) -> bool {
        match self.inner.flush() {
            Ok(()) => true,
            Err(e) => {
                self.errors.write_errors += 1;
                log::error!("[WadWriter] Failed to flush archive: {}", e);
                false
            }
        }
    }

    /// Number of lumps finished so far
    pub fn lump_count(&self) -> usize {
        self.directory.len()
    }

    /// Unwrap the underlying sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> ArchiveWriter for WadWriter<W> {
    fn begin_lump(&mut self, name: &str) {
        assert!(name.len() <= LUMP_NAME_LEN, "lump name too long: {}", name);
        assert!(self.current.is_none(), "lump started while another is open");

        let mut raw_name = [0u8; LUMP_NAME_LEN];
        raw_name[..name.len()].copy_from_slice(name.as_bytes());

        self.current = Some(DirectoryEntry {
            name: raw_name,
            offset: self.position,
            size: 0,
        });
    }

    fn append(&mut self, data: &[u8]) {
        assert!(self.current.is_some(), "append without an open lump");

        self.write_raw(data);
        self.position += data.len() as u32;
    }

    fn finish_lump(&mut self) {
        let Some(mut entry) = self.current.take() else {
            panic!("finish_lump without an open lump");
        };

        entry.size = self.position - entry.offset;
        log::debug!(
            "[WadWriter] Lump {} at offset {}: {} bytes",
            String::from_utf8_lossy(&entry.name).trim_end_matches('\0'),
            entry.offset,
            entry.size
        );
        self.directory.push(entry);
    }

    fn close(&mut self) {
        let directory_offset = self.position;
        let mut raw = Vec::with_capacity(self.directory.len() * DIRECTORY_ENTRY_SIZE);
        for entry in &self.directory {
            raw.extend_from_slice(&entry.offset.to_le_bytes());
            raw.extend_from_slice(&entry.size.to_le_bytes());
            raw.extend_from_slice(&entry.name);
        }
        self.write_raw(&raw);
        self.position += raw.len() as u32;

        // buffered data must reach the sink before seeking, so a failed
        // write is not reported by the seek
        if self.flush_inner() {
            match self.inner.seek(SeekFrom::Start(0)) {
                Ok(_) => {
                    let num_lumps = self.directory.len() as u32;
                    self.write_header(num_lumps, directory_offset);
                    self.flush_inner();
                }
                Err(e) => {
                    self.errors.seek_errors += 1;
                    log::error!("[WadWriter] Failed to seek to header: {}", e);
                }
            }
        } else {
            log::error!("[WadWriter] Header not rewritten, archive data was lost");
        }

        log::info!(
            "[WadWriter] Closed archive: {} lumps, {} bytes",
            self.directory.len(),
            self.position
        );
    }

    fn errors(&self) -> ArchiveErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_u32(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
    }

    /// Sink that rejects every write
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenSink {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Other, "not seekable"))
        }
    }

    /// Seekable sink whose writes never reach the disk
    #[derive(Default)]
    struct FullDisk {
        seeks: u32,
    }

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FullDisk {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            self.seeks += 1;
            Ok(0)
        }
    }

    #[test]
    fn test_header_and_directory() {
        let mut writer = WadWriter::new(Cursor::new(Vec::new()));
        writer.write_lump("MAP01", &[]);
        writer.write_lump("DATA", b"abc");
        writer.close();
        assert!(writer.errors().is_clean());

        let data = writer.into_inner().into_inner();
        assert_eq!(&data[0..4], b"PWAD");
        assert_eq!(read_u32(&data, 4), 2);

        let dir = read_u32(&data, 8) as usize;
        assert_eq!(dir, 12 + 3);
        assert_eq!(data.len(), dir + 2 * DIRECTORY_ENTRY_SIZE);

        // MAP01: empty lump at offset 12
        assert_eq!(read_u32(&data, dir), 12);
        assert_eq!(read_u32(&data, dir + 4), 0);
        assert_eq!(&data[dir + 8..dir + 16], b"MAP01\0\0\0");

        // DATA
        assert_eq!(read_u32(&data, dir + 16), 12);
        assert_eq!(read_u32(&data, dir + 20), 3);
        assert_eq!(&data[dir + 24..dir + 32], b"DATA\0\0\0\0");
        assert_eq!(&data[12..15], b"abc");
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let mut writer = WadWriter::new(BrokenSink);
        writer.write_lump("THINGS", &[1, 2, 3]);
        writer.write_lump("SEGS", &[]);
        writer.close();

        let errors = writer.errors();
        assert!(!errors.is_clean());
        // header, lump data, directory
        assert_eq!(errors.write_errors, 3);
        assert_eq!(errors.seek_errors, 1);
        assert_eq!(writer.lump_count(), 2);
    }

    #[test]
    fn test_buffered_write_failure_counts_as_write_error() {
        let mut writer = WadWriter::new(BufWriter::new(FullDisk::default()));
        writer.write_lump("THINGS", &[1, 2, 3]);
        writer.close();

        let errors = writer.errors();
        assert_eq!(errors.write_errors, 1);
        assert_eq!(errors.seek_errors, 0);
        assert_eq!(writer.into_inner().get_ref().seeks, 0);
    }

    #[test]
    #[should_panic]
    fn test_long_lump_name_panics() {
        let mut writer = WadWriter::new(Cursor::new(Vec::new()));
        writer.begin_lump("TOOLONGNAME");
    }
}
