//! WOFF 1.0 wrapping.
//!
//! WOFF is the compiled sfnt re-packaged: a 44-byte header, a 20-byte
//! directory entry per table, and each table's data individually
//! zlib-compressed. Tables whose compressed form is not smaller are
//! stored uncompressed, and every data block is padded to a 4-byte
//! boundary, both per the W3C WOFF File Format 1.0 spec.
//!
//! The input is the TTF this tool just produced (possibly hinted), read
//! back through `write_fonts::read` to enumerate the table directory.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use write_fonts::read::FontRef;

use crate::error::FontError;

const WOFF_SIGNATURE: u32 = 0x774F_4646; // 'wOFF'
const HEADER_SIZE: usize = 44;
const DIR_ENTRY_SIZE: usize = 20;

/// Wrap compiled sfnt bytes into a WOFF 1.0 container.
pub fn wrap(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = FontRef::new(sfnt).map_err(|e| FontError::Compile(format!("sfnt read: {e}")))?;
    let directory = &font.table_directory;
    let records = directory.table_records();
    let num_tables = records.len();

    // Compress each table up front so directory offsets can be computed.
    struct Entry {
        tag: [u8; 4],
        checksum: u32,
        orig_len: u32,
        data: Vec<u8>,
    }

    let mut entries = Vec::with_capacity(num_tables);
    let mut total_sfnt_size = 12 + 16 * num_tables;

    for record in records {
        let offset = record.offset() as usize;
        let length = record.length() as usize;
        let table = sfnt
            .get(offset..offset + length)
            .ok_or_else(|| FontError::Compile("table extends past end of font".to_owned()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(table)
            .and_then(|()| encoder.finish())
            .map_err(|e| FontError::Compile(format!("zlib: {e}")))
            .map(|compressed| {
                let data = if compressed.len() < table.len() {
                    compressed
                } else {
                    table.to_vec()
                };
                entries.push(Entry {
                    tag: record.tag().into_bytes(),
                    checksum: record.checksum(),
                    orig_len: record.length(),
                    data,
                });
            })?;
        total_sfnt_size += padded(length);
    }

    let mut data_offset = HEADER_SIZE + DIR_ENTRY_SIZE * num_tables;
    let total_len: usize = data_offset
        + entries
            .iter()
            .map(|e| padded(e.data.len()))
            .sum::<usize>();

    let mut out = Vec::with_capacity(total_len);
    push_u32(&mut out, WOFF_SIGNATURE);
    push_u32(&mut out, directory.sfnt_version());
    push_u32(&mut out, as_u32(total_len)?);
    push_u16(&mut out, as_u16(num_tables)?);
    push_u16(&mut out, 0); // reserved
    push_u32(&mut out, as_u32(total_sfnt_size)?);
    push_u16(&mut out, 1); // majorVersion
    push_u16(&mut out, 0); // minorVersion
    push_u32(&mut out, 0); // metaOffset
    push_u32(&mut out, 0); // metaLength
    push_u32(&mut out, 0); // metaOrigLength
    push_u32(&mut out, 0); // privOffset
    push_u32(&mut out, 0); // privLength

    for entry in &entries {
        out.extend_from_slice(&entry.tag);
        push_u32(&mut out, as_u32(data_offset)?);
        push_u32(&mut out, as_u32(entry.data.len())?);
        push_u32(&mut out, entry.orig_len);
        push_u32(&mut out, entry.checksum);
        data_offset += padded(entry.data.len());
    }

    for entry in &entries {
        out.extend_from_slice(&entry.data);
        out.resize(out.len() + pad_bytes(entry.data.len()), 0);
    }

    Ok(out)
}

const fn pad_bytes(len: usize) -> usize {
    (4 - len % 4) % 4
}

const fn padded(len: usize) -> usize {
    len + pad_bytes(len)
}

fn as_u32(v: usize) -> Result<u32, FontError> {
    u32::try_from(v).map_err(|_| FontError::Compile("font exceeds 4 GiB".to_owned()))
}

fn as_u16(v: usize) -> Result<u16, FontError> {
    u16::try_from(v).map_err(|_| FontError::Compile("too many tables".to_owned()))
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
