//! FIFF tag headers and payload readers.
//!
//! On-disk layout, always big-endian:
//!
//! ```text
//! kind : i32 | type : u32 | size : i32 | next : i32    (16-byte header)
//! <size bytes of payload>
//! ```
//!
//! `next == 0` means the next tag follows immediately, `next > 0` is an
//! absolute byte offset, `next == -1` ends the chain.
use std::io::{Read, Seek, SeekFrom};
use anyhow::{bail, Context, Result};

use super::constants::*;

/// A tag header with its file position; the payload is read on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub kind:  i32,
    pub ftype: u32,
    pub size:  i32,
    pub next:  i32,
    /// Byte offset of the header in the file.
    pub pos:   u64,
}

impl TagHeader {
    #[inline]
    pub fn data_pos(&self) -> u64 {
        self.pos + 16
    }

    #[inline]
    pub fn payload_len(&self) -> usize {
        self.size.max(0) as usize
    }

    /// Position of the following tag header, `None` at the end of the chain.
    pub fn next_pos(&self) -> Option<u64> {
        match self.next {
            FIFFV_NEXT_SEQ => Some(self.data_pos() + self.payload_len() as u64),
            n if n > 0 => Some(n as u64),
            _ => None,
        }
    }

    fn from_be(buf: &[u8; 16], pos: u64) -> Self {
        let word = |i: usize| [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]];
        TagHeader {
            kind:  i32::from_be_bytes(word(0)),
            ftype: u32::from_be_bytes(word(4)),
            size:  i32::from_be_bytes(word(8)),
            next:  i32::from_be_bytes(word(12)),
            pos,
        }
    }
}

pub fn read_tag_header<R: Read + Seek>(reader: &mut R, pos: u64) -> Result<TagHeader> {
    reader.seek(SeekFrom::Start(pos))
        .with_context(|| format!("seek to tag header @ {pos:#x}"))?;
    let mut buf = [0u8; 16];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read tag header @ {pos:#x}"))?;
    Ok(TagHeader::from_be(&buf, pos))
}

/// Read the whole payload of `tag`.
pub fn read_raw_bytes<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<u8>> {
    reader
        .seek(SeekFrom::Start(tag.data_pos()))
        .with_context(|| format!("seek to tag data @ {:#x}", tag.data_pos()))?;
    let mut buf = vec![0u8; tag.payload_len()];
    reader.read_exact(&mut buf)
        .with_context(|| format!("read {} payload bytes of tag kind {}", buf.len(), tag.kind))?;
    Ok(buf)
}

/// Read the first four payload bytes, for scalar int/float tags.
fn read_word<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<[u8; 4]> {
    if tag.payload_len() < 4 {
        bail!("tag kind {} has a {}-byte payload, expected at least 4", tag.kind, tag.size);
    }
    reader.seek(SeekFrom::Start(tag.data_pos()))?;
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_i32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<i32> {
    Ok(i32::from_be_bytes(read_word(reader, tag)?))
}

pub fn read_f32<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<f32> {
    Ok(f32::from_be_bytes(read_word(reader, tag)?))
}

/// FIFF strings are Latin-1, so each byte maps to one `char`.
pub fn read_string<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<String> {
    Ok(read_raw_bytes(reader, tag)?.into_iter().map(char::from).collect())
}

/// Read an embedded tag directory (`FIFFT_DIR_ENTRY_STRUCT`).
///
/// Each 16-byte entry mirrors a tag header except that its last word is the
/// absolute file position of the tag it describes.
pub fn read_directory<R: Read + Seek>(reader: &mut R, tag: &TagHeader) -> Result<Vec<TagHeader>> {
    if tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
        bail!("expected FIFFT_DIR_ENTRY_STRUCT, got type {}", tag.ftype);
    }
    let raw = read_raw_bytes(reader, tag)?;
    Ok(raw
        .chunks_exact(16)
        .map(|chunk| {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(chunk);
            let entry = TagHeader::from_be(&buf, 0);
            TagHeader { next: FIFFV_NEXT_NONE, pos: entry.next as u32 as u64, ..entry }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tag_bytes(kind: i32, ftype: u32, payload: &[u8], next: i32) -> Vec<u8> {
        let mut b = Vec::with_capacity(16 + payload.len());
        b.extend_from_slice(&kind.to_be_bytes());
        b.extend_from_slice(&ftype.to_be_bytes());
        b.extend_from_slice(&(payload.len() as i32).to_be_bytes());
        b.extend_from_slice(&next.to_be_bytes());
        b.extend_from_slice(payload);
        b
    }

    #[test]
    fn reads_int_payload() {
        let bytes = tag_bytes(FIFF_NCHAN, FIFFT_INT, &61_i32.to_be_bytes(), FIFFV_NEXT_SEQ);
        let mut cur = Cursor::new(bytes);
        let tag = read_tag_header(&mut cur, 0).unwrap();
        assert_eq!(tag.kind, FIFF_NCHAN);
        assert_eq!(read_i32(&mut cur, &tag).unwrap(), 61);
    }

    #[test]
    fn reads_float_payload() {
        let bytes = tag_bytes(FIFF_SFREQ, FIFFT_FLOAT, &600.615_f32.to_be_bytes(), FIFFV_NEXT_NONE);
        let mut cur = Cursor::new(bytes);
        let tag = read_tag_header(&mut cur, 0).unwrap();
        approx::assert_abs_diff_eq!(read_f32(&mut cur, &tag).unwrap(), 600.615_f32, epsilon = 1e-4);
    }

    #[test]
    fn short_payload_is_an_error() {
        let bytes = tag_bytes(FIFF_NCHAN, FIFFT_INT, &[0u8, 1], FIFFV_NEXT_NONE);
        let mut cur = Cursor::new(bytes);
        let tag = read_tag_header(&mut cur, 0).unwrap();
        assert!(read_i32(&mut cur, &tag).is_err());
    }

    #[test]
    fn reads_latin1_string() {
        let bytes = tag_bytes(FIFF_BAD_CHS, FIFFT_STRING, b"EEG 053", FIFFV_NEXT_NONE);
        let mut cur = Cursor::new(bytes);
        let tag = read_tag_header(&mut cur, 0).unwrap();
        assert_eq!(read_string(&mut cur, &tag).unwrap(), "EEG 053");
    }

    #[test]
    fn next_pos_variants() {
        let seq = TagHeader { kind: 1, ftype: 3, size: 8, next: FIFFV_NEXT_SEQ, pos: 100 };
        assert_eq!(seq.next_pos(), Some(124));
        let jump = TagHeader { next: 5000, ..seq };
        assert_eq!(jump.next_pos(), Some(5000));
        let end = TagHeader { next: FIFFV_NEXT_NONE, ..seq };
        assert_eq!(end.next_pos(), None);
    }

    #[test]
    fn directory_entries_carry_positions() {
        let mut payload = Vec::new();
        for (kind, pos) in [(FIFF_FILE_ID, 0_i32), (FIFF_NCHAN, 40)] {
            payload.extend_from_slice(&kind.to_be_bytes());
            payload.extend_from_slice(&FIFFT_INT.to_be_bytes());
            payload.extend_from_slice(&4_i32.to_be_bytes());
            payload.extend_from_slice(&pos.to_be_bytes());
        }
        let bytes = tag_bytes(0, FIFFT_DIR_ENTRY_STRUCT, &payload, FIFFV_NEXT_NONE);
        let mut cur = Cursor::new(bytes);
        let tag = read_tag_header(&mut cur, 0).unwrap();
        let dir = read_directory(&mut cur, &tag).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir[1].kind, FIFF_NCHAN);
        assert_eq!(dir[1].pos, 40);
    }
}
