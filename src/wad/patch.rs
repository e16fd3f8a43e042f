//! Patch Encoder
//!
//! Converts an indexed-color pixel grid into the column based, run-length
//! encoded patch format used for sprites, wall patches and skies.
//!
//! Layout of an encoded patch:
//! - header: width u16, height u16, x offset i16, y offset i16
//! - one u32 offset per output column, measured from the start of the lump
//! - per source column: a list of posts terminated by `255`
//!
//! A post is `row, length, pad, pixels.., pad` where the pad bytes repeat
//! the first and last pixel of the run.

use arrayvec::ArrayVec;

use crate::lump::Lump;

/// Size of the patch header in bytes
pub const PATCH_HEADER_SIZE: usize = 8;

/// Longest run of pixels a single post may hold
pub const MAX_POST_LENGTH: usize = 240;

/// Last row a post may start on; the renderer cannot address later rows
pub const MAX_POST_START: usize = 252;

/// Terminates the post list of a column
pub const END_OF_COLUMN: u8 = 255;

const POST_BUFFER_SIZE: usize = 512;

/// Dimensions and anchor of the encoded patch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchLayout {
    pub width: u16,
    pub height: u16,
    pub x_offset: i16,
    pub y_offset: i16,
}

impl PatchLayout {
    /// Layout with the anchor at the top-left corner
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
        }
    }
}

/// Row-major grid of palette indices
#[derive(Clone, Copy, Debug)]
pub struct Pixels<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
}

impl<'a> Pixels<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }

    /// Pixel of column `x`, wrapping rows past the source height
    fn at(&self, x: usize, y: usize) -> u8 {
        self.data[(y % self.height) * self.width + x]
    }
}

fn write_post(lump: &mut Lump, source: &Pixels, x: usize, y: usize, len: usize) {
    let mut post = ArrayVec::<u8, POST_BUFFER_SIZE>::new();

    post.push(y as u8);
    post.push(len as u8);

    // top padding
    post.push(source.at(x, y));

    for row in y..y + len {
        post.push(source.at(x, row));
    }

    // bottom padding
    post.push(source.at(x, y + len - 1));

    lump.append(&post);
}

/// Encode `source` as a patch of the given layout.
///
/// Output columns beyond the source width reuse the post data of
/// `column % source.width`, and output rows beyond the source height wrap
/// around vertically. When `transparent` is set, pixels with that index are
/// left out of the posts.
pub fn encode_patch(layout: PatchLayout, source: Pixels, transparent: Option<u8>) -> Vec<u8> {
    let out_w = layout.width as usize;
    let out_h = layout.height as usize;

    assert!(source.width > 0 && source.height > 0, "empty patch source");
    assert!(out_w >= source.width, "patch narrower than its source");
    assert!(source.data.len() >= source.width * source.height, "patch source too short");

    let is_transparent = |x: usize, y: usize| transparent == Some(source.at(x, y));

    let mut lump = Lump::new();
    let mut offsets = vec![0u32; out_w];
    let beginning = (PATCH_HEADER_SIZE + out_w * 4) as u32;

    for x in 0..source.width {
        offsets[x] = beginning + lump.len() as u32;

        let mut y = 0;
        while y < out_h {
            if is_transparent(x, y) {
                y += 1;
                continue;
            }

            let mut len = 1;
            while y + len < out_h && len < MAX_POST_LENGTH && !is_transparent(x, y + len) {
                len += 1;
            }

            if y <= MAX_POST_START {
                write_post(&mut lump, &source, x, y, len);
            }

            y += len;
        }

        lump.append(&[END_OF_COLUMN]);
    }

    for x in source.width..out_w {
        offsets[x] = offsets[x % source.width];
    }

    let table: Vec<u8> = offsets.iter().flat_map(|offset| offset.to_le_bytes()).collect();
    lump.prepend(&table);

    let mut header = [0u8; PATCH_HEADER_SIZE];
    header[0..2].copy_from_slice(&layout.width.to_le_bytes());
    header[2..4].copy_from_slice(&layout.height.to_le_bytes());
    header[4..6].copy_from_slice(&layout.x_offset.to_le_bytes());
    header[6..8].copy_from_slice(&layout.y_offset.to_le_bytes());
    lump.prepend(&header);

    log::debug!(
        "[Patch] Encoded {}x{} patch from {}x{} source: {} bytes",
        out_w,
        out_h,
        source.width,
        source.height,
        lump.len()
    );

    lump.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(data: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([data[at], data[at + 1]])
    }

    fn column_offset(data: &[u8], x: usize) -> usize {
        let at = PATCH_HEADER_SIZE + x * 4;
        u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]) as usize
    }

    /// Returns (row, pixels) for every post of column `x`
    fn read_posts(data: &[u8], x: usize) -> Vec<(usize, Vec<u8>)> {
        let mut posts = Vec::new();
        let mut pos = column_offset(data, x);
        while data[pos] != END_OF_COLUMN {
            let row = data[pos] as usize;
            let len = data[pos + 1] as usize;
            assert_eq!(data[pos + 2], data[pos + 3], "top padding");
            assert_eq!(data[pos + 3 + len], data[pos + 2 + len], "bottom padding");
            posts.push((row, data[pos + 3..pos + 3 + len].to_vec()));
            pos += len + 4;
        }
        posts
    }

    #[test]
    fn test_header_and_offset_table() {
        let pixels = [1, 2, 3, 4, 5, 6];
        let layout = PatchLayout {
            width: 2,
            height: 3,
            x_offset: -4,
            y_offset: 10,
        };
        let data = encode_patch(layout, Pixels::new(&pixels, 2, 3), None);

        assert_eq!(read_u16(&data, 0), 2);
        assert_eq!(read_u16(&data, 2), 3);
        assert_eq!(read_u16(&data, 4) as i16, -4);
        assert_eq!(read_u16(&data, 6), 10);

        // first column starts right after the header and the table
        assert_eq!(column_offset(&data, 0), 8 + 2 * 4);
        // 3 pixel post (7 bytes) plus the terminator
        assert_eq!(column_offset(&data, 1), 8 + 2 * 4 + 8);
        assert_eq!(data.len(), 8 + 8 + 8 + 8);

        assert_eq!(read_posts(&data, 0), vec![(0, vec![1, 3, 5])]);
        assert_eq!(read_posts(&data, 1), vec![(0, vec![2, 4, 6])]);
    }

    #[test]
    fn test_fully_transparent_column() {
        let pixels = [0, 9, 0, 9];
        let data = encode_patch(PatchLayout::new(2, 2), Pixels::new(&pixels, 2, 2), Some(0));

        let first = column_offset(&data, 0);
        assert_eq!(data[first], END_OF_COLUMN);
        assert_eq!(column_offset(&data, 1), first + 1);
        assert_eq!(read_posts(&data, 1), vec![(0, vec![9, 9])]);
    }

    #[test]
    fn test_column_with_several_runs() {
        let pixels = [5, 0, 6, 7, 0, 8];
        let data = encode_patch(PatchLayout::new(1, 6), Pixels::new(&pixels, 1, 6), Some(0));

        assert_eq!(
            read_posts(&data, 0),
            vec![(0, vec![5]), (2, vec![6, 7]), (5, vec![8])]
        );
        assert_eq!(*data.last().unwrap(), END_OF_COLUMN);
    }

    #[test]
    fn test_tiling_reuses_columns() {
        let pixels: Vec<u8> = (0..12).collect();
        let data = encode_patch(PatchLayout::new(8, 3), Pixels::new(&pixels, 4, 3), None);

        for x in 0..4 {
            assert_eq!(column_offset(&data, x + 4), column_offset(&data, x));
        }
        // posts are only stored once
        assert_eq!(data.len(), 8 + 8 * 4 + 4 * 8);
    }

    #[test]
    fn test_vertical_wrap() {
        let pixels = [1, 2];
        let data = encode_patch(PatchLayout::new(1, 5), Pixels::new(&pixels, 1, 2), None);

        assert_eq!(read_posts(&data, 0), vec![(0, vec![1, 2, 1, 2, 1])]);
    }

    #[test]
    fn test_run_cap_splits_tall_columns() {
        let pixels = vec![3u8; 300];
        let data = encode_patch(PatchLayout::new(1, 300), Pixels::new(&pixels, 1, 300), None);

        let posts = read_posts(&data, 0);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].0, 0);
        assert_eq!(posts[0].1.len(), MAX_POST_LENGTH);
        assert_eq!(posts[1].0, 240);
        assert_eq!(posts[1].1.len(), 60);
    }

    #[test]
    fn test_rows_past_start_limit_are_dropped() {
        let pixels = vec![3u8; 500];
        let data = encode_patch(PatchLayout::new(1, 500), Pixels::new(&pixels, 1, 500), None);

        let posts = read_posts(&data, 0);
        // the third run would start at 480
        assert_eq!(posts.len(), 2);
        for (row, run) in &posts {
            assert!(*row <= MAX_POST_START);
            assert!(run.len() <= MAX_POST_LENGTH);
        }
    }

    #[test]
    fn test_post_starting_at_limit_is_kept() {
        // transparent down to row 252, then one opaque run to the bottom
        let mut pixels = vec![0u8; 260];
        for p in pixels.iter_mut().skip(252) {
            *p = 4;
        }
        let data = encode_patch(PatchLayout::new(1, 260), Pixels::new(&pixels, 1, 260), Some(0));
        assert_eq!(read_posts(&data, 0), vec![(252, vec![4; 8])]);

        pixels[252] = 0;
        let data = encode_patch(PatchLayout::new(1, 260), Pixels::new(&pixels, 1, 260), Some(0));
        assert!(read_posts(&data, 0).is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let pixels: Vec<u8> = (0..64).map(|i| (i * 7 % 5) as u8).collect();
        let source = Pixels::new(&pixels, 8, 8);

        let a = encode_patch(PatchLayout::new(16, 8), source, Some(0));
        let b = encode_patch(PatchLayout::new(16, 8), source, Some(0));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_narrower_than_source_panics() {
        let pixels = [0u8; 4];
        encode_patch(PatchLayout::new(1, 2), Pixels::new(&pixels, 2, 2), None);
    }
}
