use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::input::InputError;
use crate::input::io::tmp_path_for;
use crate::model::annotations::AnnotationTable;
use crate::store::{ChunkedMatrixSource, DenseMatrix, check_range, column_chunks};

const MAGIC: &[u8; 4] = b"KSTO";
const VERSION_MAJOR: u16 = 1;
const VERSION_MINOR: u16 = 0;
const ENDIAN_TAG: u32 = 0x1234_5678;
const HEADER_SIZE: usize = 64;
const CRC_RANGE: std::ops::Range<usize> = 56..64;

#[derive(Debug, Clone)]
pub struct HeaderV1 {
    pub n_rows: u64,
    pub n_cols: u64,
    pub annotations_offset: u64,
    pub annotations_bytes: u64,
    pub data_offset: u64,
    pub header_crc64: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnnotationBlock {
    rows: AnnotationTable,
    cols: AnnotationTable,
}

pub struct MatrixStore {
    mmap: Mmap,
    header: HeaderV1,
    rows: AnnotationTable,
    cols: AnnotationTable,
}

impl MatrixStore {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let file = File::open(path).map_err(|e| {
            InputError::MissingInput(format!("cannot open {}: {e}", path.display()))
        })?;
        // The store is only ever read; writers replace it through rename.
        let mmap = unsafe { Mmap::map(&file)? };
        let bytes = &mmap[..];
        if bytes.len() < HEADER_SIZE {
            return Err(InputError::InvalidInput(format!(
                "{} too small for a kstore header",
                path.display()
            )));
        }

        let header = parse_header(bytes)?;
        validate_header(&header, bytes)?;

        let start = header.annotations_offset as usize;
        let end = start + header.annotations_bytes as usize;
        let block: AnnotationBlock = serde_json::from_slice(&bytes[start..end])?;
        block
            .rows
            .check_lengths(header.n_rows as usize)
            .map_err(InputError::SchemaMismatch)?;
        block
            .cols
            .check_lengths(header.n_cols as usize)
            .map_err(InputError::SchemaMismatch)?;

        Ok(Self {
            mmap,
            header,
            rows: block.rows,
            cols: block.cols,
        })
    }

    pub fn header(&self) -> &HeaderV1 {
        &self.header
    }

    #[inline]
    fn value_at(&self, row: usize, col: usize) -> f32 {
        let n_rows = self.header.n_rows as usize;
        let offset = self.header.data_offset as usize + 4 * (col * n_rows + row);
        read_f32(&self.mmap, offset)
    }
}

impl ChunkedMatrixSource for MatrixStore {
    fn shape(&self) -> (usize, usize) {
        (self.header.n_rows as usize, self.header.n_cols as usize)
    }

    fn row_annotations(&self) -> &AnnotationTable {
        &self.rows
    }

    fn column_annotations(&self) -> &AnnotationTable {
        &self.cols
    }

    fn read_columns(&self, start: usize, end: usize) -> Result<DenseMatrix, InputError> {
        check_range(self.shape(), None, start, end)?;
        let n_rows = self.header.n_rows as usize;
        let from = self.header.data_offset as usize + 4 * start * n_rows;
        let to = self.header.data_offset as usize + 4 * end * n_rows;
        let data = self.mmap[from..to]
            .chunks_exact(4)
            .map(|chunk| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(chunk);
                f32::from_le_bytes(raw)
            })
            .collect();
        DenseMatrix::from_column_major(n_rows, end - start, data)
            .ok_or_else(|| InputError::InvalidInput("column slice size mismatch".to_string()))
    }

    fn read_columns_rows(
        &self,
        rows: &[usize],
        start: usize,
        end: usize,
    ) -> Result<DenseMatrix, InputError> {
        check_range(self.shape(), Some(rows), start, end)?;
        let mut out = DenseMatrix::zeros(rows.len(), end - start);
        for (j, col) in (start..end).enumerate() {
            let dst = out.column_mut(j);
            for (i, &r) in rows.iter().enumerate() {
                dst[i] = self.value_at(r, col);
            }
        }
        Ok(out)
    }
}

fn parse_header(bytes: &[u8]) -> Result<HeaderV1, InputError> {
    if &bytes[0..4] != MAGIC {
        return Err(InputError::InvalidInput(
            "invalid magic; expected KSTO".to_string(),
        ));
    }
    let version_major = read_u16(bytes, 4);
    let version_minor = read_u16(bytes, 6);
    if version_major != VERSION_MAJOR || version_minor != VERSION_MINOR {
        return Err(InputError::InvalidInput(format!(
            "unsupported version: {}.{}",
            version_major, version_minor
        )));
    }
    if read_u32(bytes, 8) != ENDIAN_TAG {
        return Err(InputError::InvalidInput(
            "unsupported endianness tag".to_string(),
        ));
    }
    if read_u32(bytes, 12) as usize != HEADER_SIZE {
        return Err(InputError::InvalidInput(
            "invalid header_size; expected 64".to_string(),
        ));
    }

    Ok(HeaderV1 {
        n_rows: read_u64(bytes, 16),
        n_cols: read_u64(bytes, 24),
        annotations_offset: read_u64(bytes, 32),
        annotations_bytes: read_u64(bytes, 40),
        data_offset: read_u64(bytes, 48),
        header_crc64: read_u64(bytes, 56),
    })
}

fn validate_header(header: &HeaderV1, bytes: &[u8]) -> Result<(), InputError> {
    let mut hdr = bytes[0..HEADER_SIZE].to_vec();
    hdr[CRC_RANGE].fill(0);
    if crc64_ecma(&hdr) != header.header_crc64 {
        return Err(InputError::InvalidInput(
            "header_crc64 mismatch".to_string(),
        ));
    }
    let ann_end = header
        .annotations_offset
        .checked_add(header.annotations_bytes)
        .ok_or_else(|| InputError::InvalidInput("annotation size overflow".to_string()))?;
    if (header.annotations_offset as usize) < HEADER_SIZE || ann_end > header.data_offset {
        return Err(InputError::InvalidInput(
            "annotation block out of bounds".to_string(),
        ));
    }
    if header.data_offset % 4 != 0 {
        return Err(InputError::InvalidInput(
            "data_offset not 4-byte aligned".to_string(),
        ));
    }
    let data_bytes = header
        .n_rows
        .checked_mul(header.n_cols)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(header.data_offset))
        .ok_or_else(|| InputError::InvalidInput("matrix size overflow".to_string()))?;
    if data_bytes != bytes.len() as u64 {
        return Err(InputError::InvalidInput(
            "file length does not match header dimensions".to_string(),
        ));
    }
    Ok(())
}

/// Persist any source as a `.kstore`, streaming its columns `chunk_size` at a time.
/// The file appears at `path` only once it has been fully written.
pub fn write_store(
    path: &Path,
    source: &dyn ChunkedMatrixSource,
    chunk_size: usize,
) -> Result<(), InputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let (n_rows, n_cols) = source.shape();
    let block = AnnotationBlock {
        rows: source.row_annotations().clone(),
        cols: source.column_annotations().clone(),
    };
    let annotations = serde_json::to_vec(&block)?;
    let annotations_offset = HEADER_SIZE;
    let data_offset = align4(annotations_offset + annotations.len());

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(MAGIC);
    header[4..6].copy_from_slice(&VERSION_MAJOR.to_le_bytes());
    header[6..8].copy_from_slice(&VERSION_MINOR.to_le_bytes());
    header[8..12].copy_from_slice(&ENDIAN_TAG.to_le_bytes());
    header[12..16].copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
    header[16..24].copy_from_slice(&(n_rows as u64).to_le_bytes());
    header[24..32].copy_from_slice(&(n_cols as u64).to_le_bytes());
    header[32..40].copy_from_slice(&(annotations_offset as u64).to_le_bytes());
    header[40..48].copy_from_slice(&(annotations.len() as u64).to_le_bytes());
    header[48..56].copy_from_slice(&(data_offset as u64).to_le_bytes());
    let crc = crc64_ecma(&header);
    header[CRC_RANGE].copy_from_slice(&crc.to_le_bytes());

    let tmp_path = tmp_path_for(path);
    {
        let mut w = BufWriter::new(File::create(&tmp_path)?);
        w.write_all(&header)?;
        w.write_all(&annotations)?;
        let padding = data_offset - annotations_offset - annotations.len();
        w.write_all(&[0u8; 3][..padding])?;
        for (start, end) in column_chunks(n_cols, chunk_size) {
            let chunk = source.read_columns(start, end)?;
            for &v in chunk.as_slice() {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        w.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn align4(offset: usize) -> usize {
    offset.div_ceil(4) * 4
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&bytes[offset..offset + 2]);
    u16::from_le_bytes(raw)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(raw)
}

pub fn crc64_ecma(bytes: &[u8]) -> u64 {
    let mut crc = 0u64;
    for &b in bytes {
        crc ^= (b as u64) << 56;
        for _ in 0..8 {
            if (crc & 0x8000_0000_0000_0000) != 0 {
                crc = (crc << 1) ^ 0x42F0_E1EB_A9EA_3693;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
#[path = "../../tests/src_inline/store/kstore.rs"]
mod tests;
