//! Minimal NumPy `.npy` / `.npz` codec.
//!
//! Only plain numeric arrays are supported: little- or big-endian floats
//! (`f4`, `f8`) and integers (`i1`..`i8`, `u1`..`u8`). Object arrays,
//! which NumPy stores pickled, are rejected.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::Column;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Header blocks are padded so the data starts on this boundary.
const HEADER_ALIGN: usize = 64;

/// Errors raised while reading or writing `.npy` data.
#[derive(Debug, thiserror::Error)]
pub enum NpyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] ZipError),

    #[error("not a .npy stream (bad magic)")]
    BadMagic,

    #[error("unsupported .npy format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("malformed .npy header: {0}")]
    Header(String),

    #[error("unsupported dtype '{0}'")]
    UnsupportedDtype(String),

    #[error("array data truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("integer value {0} does not fit in a signed 64-bit column")]
    IntegerOverflow(u64),
}

// ---------------------------------------------------------------------------
// dtype descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Float,
    Int,
    UInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Descr {
    kind: ScalarKind,
    size: usize,
    order: ByteOrder,
}

impl Descr {
    /// Parse a NumPy type string such as `<f8` or `|u1`.
    fn parse(s: &str) -> Result<Self, NpyError> {
        let unsupported = || NpyError::UnsupportedDtype(s.to_string());
        let mut chars = s.chars();
        let order = match chars.next().ok_or_else(unsupported)? {
            '<' | '|' => ByteOrder::Little,
            '>' => ByteOrder::Big,
            '=' if cfg!(target_endian = "big") => ByteOrder::Big,
            '=' => ByteOrder::Little,
            _ => return Err(unsupported()),
        };
        let kind = match chars.next().ok_or_else(unsupported)? {
            'f' => ScalarKind::Float,
            'i' => ScalarKind::Int,
            'u' => ScalarKind::UInt,
            _ => return Err(unsupported()),
        };
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        let valid = match kind {
            ScalarKind::Float => matches!(size, 4 | 8),
            ScalarKind::Int | ScalarKind::UInt => matches!(size, 1 | 2 | 4 | 8),
        };
        if !valid {
            return Err(unsupported());
        }
        Ok(Self { kind, size, order })
    }

    fn for_column(column: &Column) -> Self {
        let (kind, size) = match column {
            Column::F64(_) => (ScalarKind::Float, 8),
            Column::F32(_) => (ScalarKind::Float, 4),
            Column::Int(_) => (ScalarKind::Int, 8),
        };
        Self {
            kind,
            size,
            order: ByteOrder::Little,
        }
    }

    fn type_string(&self) -> String {
        let order = match (self.size, self.order) {
            (1, _) => '|',
            (_, ByteOrder::Little) => '<',
            (_, ByteOrder::Big) => '>',
        };
        let kind = match self.kind {
            ScalarKind::Float => 'f',
            ScalarKind::Int => 'i',
            ScalarKind::UInt => 'u',
        };
        format!("{order}{kind}{}", self.size)
    }

    /// Decode the packed scalars in `bytes`.
    fn decode(&self, bytes: &[u8]) -> Result<Column, NpyError> {
        let chunks = bytes.chunks_exact(self.size);
        let column = match (self.kind, self.size) {
            (ScalarKind::Float, 8) => {
                Column::F64(chunks.map(|c| f64::from_bits(self.read_u64(c))).collect())
            }
            (ScalarKind::Float, _) => {
                Column::F32(chunks.map(|c| f32::from_bits(self.read_u64(c) as u32)).collect())
            }
            (ScalarKind::Int, size) => {
                let shift = 64 - 8 * size as u32;
                // Sign-extend from the stored width.
                Column::Int(
                    chunks
                        .map(|c| ((self.read_u64(c) << shift) as i64) >> shift)
                        .collect(),
                )
            }
            (ScalarKind::UInt, _) => Column::Int(
                chunks
                    .map(|c| {
                        let raw = self.read_u64(c);
                        i64::try_from(raw).map_err(|_| NpyError::IntegerOverflow(raw))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(column)
    }

    fn read_u64(&self, chunk: &[u8]) -> u64 {
        match self.order {
            ByteOrder::Little => chunk
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
            ByteOrder::Big => chunk.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        }
    }
}

// ---------------------------------------------------------------------------
// NpyArray
// ---------------------------------------------------------------------------

/// A decoded n-dimensional numeric array, stored flat.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub fortran_order: bool,
    pub values: Column,
}

impl NpyArray {
    /// Build a C-ordered 2-D array from equally long rows.
    ///
    /// Returns `None` if `rows` is empty, the rows differ in length, or mix
    /// numeric kinds.
    pub fn from_rows(rows: &[Column]) -> Option<Self> {
        let first = rows.first()?;
        let cols = first.len();
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let values = match first {
            Column::F64(_) => Column::F64(
                rows.iter()
                    .map(|r| match r {
                        Column::F64(v) => Some(v.as_slice()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?
                    .concat(),
            ),
            Column::F32(_) => Column::F32(
                rows.iter()
                    .map(|r| match r {
                        Column::F32(v) => Some(v.as_slice()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?
                    .concat(),
            ),
            Column::Int(_) => Column::Int(
                rows.iter()
                    .map(|r| match r {
                        Column::Int(v) => Some(v.as_slice()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?
                    .concat(),
            ),
        };
        Some(Self {
            shape: vec![rows.len(), cols],
            fortran_order: false,
            values,
        })
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Row `r` of a 2-D array, honouring the memory order.
    pub fn row(&self, r: usize) -> Option<Column> {
        let &[rows, cols] = self.shape.as_slice() else {
            return None;
        };
        if r >= rows {
            return None;
        }
        let index = |c: usize| {
            if self.fortran_order {
                c * rows + r
            } else {
                r * cols + c
            }
        };
        let row = match &self.values {
            Column::F64(v) => Column::F64((0..cols).map(|c| v[index(c)]).collect()),
            Column::F32(v) => Column::F32((0..cols).map(|c| v[index(c)]).collect()),
            Column::Int(v) => Column::Int((0..cols).map(|c| v[index(c)]).collect()),
        };
        Some(row)
    }
}

// ---------------------------------------------------------------------------
// .npy reading
// ---------------------------------------------------------------------------

/// Read one `.npy` stream.
pub fn read_npy<R: Read>(reader: &mut R) -> Result<NpyArray, NpyError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).map_err(|_| NpyError::BadMagic)?;
    if &magic != MAGIC {
        return Err(NpyError::BadMagic);
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version {
        [1, 0] => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        [2 | 3, 0] => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        [major, minor] => return Err(NpyError::UnsupportedVersion { major, minor }),
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header)
        .map_err(|_| NpyError::Header("header is not valid text".into()))?;

    let descr = Descr::parse(header_str_field(&header, "descr")?)?;
    let fortran_order = header_bool_field(&header, "fortran_order")?;
    let shape = header_shape_field(&header)?;

    let count: usize = shape.iter().product();
    let expected = count * descr.size;
    let mut data = Vec::with_capacity(expected);
    reader.take(expected as u64).read_to_end(&mut data)?;
    if data.len() != expected {
        return Err(NpyError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    Ok(NpyArray {
        shape,
        fortran_order,
        values: descr.decode(&data)?,
    })
}

/// Locate the text following `'key':` in the header dictionary.
fn header_field<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let start = [format!("'{key}'"), format!("\"{key}\"")]
        .iter()
        .find_map(|quoted| header.find(quoted.as_str()).map(|i| i + quoted.len()))
        .ok_or_else(|| NpyError::Header(format!("missing '{key}'")))?;
    header[start..]
        .trim_start()
        .strip_prefix(':')
        .map(str::trim_start)
        .ok_or_else(|| NpyError::Header(format!("expected ':' after '{key}'")))
}

fn header_str_field<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let rest = header_field(header, key)?;
    let quote = rest
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| NpyError::Header(format!("'{key}' is not a string")))?;
    let body = &rest[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| NpyError::Header(format!("unterminated string for '{key}'")))?;
    Ok(&body[..end])
}

fn header_bool_field(header: &str, key: &str) -> Result<bool, NpyError> {
    let rest = header_field(header, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(NpyError::Header(format!("'{key}' is not a boolean")))
    }
}

fn header_shape_field(header: &str) -> Result<Vec<usize>, NpyError> {
    let rest = header_field(header, "shape")?;
    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.find(')').map(|end| &r[..end]))
        .ok_or_else(|| NpyError::Header("'shape' is not a tuple".into()))?;
    body.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        // Python 2 era writers emit `3L`.
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad shape dimension '{s}'")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// .npy writing
// ---------------------------------------------------------------------------

/// Write `array` as a version 1.0 `.npy` stream (little-endian).
pub fn write_npy<W: Write>(writer: &mut W, array: &NpyArray) -> Result<(), NpyError> {
    let descr = Descr::for_column(&array.values);
    let shape = match array.shape.as_slice() {
        [single] => format!("({single},)"),
        dims => format!(
            "({})",
            dims.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let order = if array.fortran_order { "True" } else { "False" };
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': {order}, 'shape': {shape}, }}",
        descr.type_string()
    );
    // magic + version + u16 length + header + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(&" ".repeat(padding));
    header.push('\n');
    let header_len = u16::try_from(header.len())
        .map_err(|_| NpyError::Header("header too long for format 1.0".into()))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;
    match &array.values {
        Column::F64(v) => v.iter().try_for_each(|x| writer.write_all(&x.to_le_bytes()))?,
        Column::F32(v) => v.iter().try_for_each(|x| writer.write_all(&x.to_le_bytes()))?,
        Column::Int(v) => v.iter().try_for_each(|x| writer.write_all(&x.to_le_bytes()))?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// .npz archives
// ---------------------------------------------------------------------------

/// Read member `name` (without the `.npy` suffix) from an open `.npz` archive.
///
/// Returns `Ok(None)` when the archive has no such member.
pub fn read_npz_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<NpyArray>, NpyError> {
    let member = format!("{name}.npy");
    match archive.by_name(&member) {
        Ok(mut file) => read_npy(&mut file).map(Some),
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Open an `.npz` archive on disk.
pub fn open_npz(path: &Path) -> Result<ZipArchive<File>, NpyError> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Array names stored in an archive (member names without `.npy`).
pub fn npz_member_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    archive
        .file_names()
        .map(|n| n.strip_suffix(".npy").unwrap_or(n).to_string())
        .collect()
}

/// Write a deflate-compressed `.npz` archive, the layout produced by
/// `numpy.savez_compressed`.
pub fn write_npz(path: &Path, members: &[(&str, &NpyArray)]) -> Result<(), NpyError> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, array) in members {
        zip.start_file(format!("{name}.npy"), options)?;
        write_npy(&mut zip, array)?;
    }
    zip.finish()?;
    Ok(())
}
