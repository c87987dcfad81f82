// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Persisted matrix records.
//!
//! ## Record Layout
//!
//! ```text
//! offset  size          field
//! 0       8             rows   (u64, little-endian)
//! 8       8             cols   (u64, little-endian)
//! 16      rows*cols*W   payload, row-major, little-endian, no padding
//! ```
//!
//! `W` is the element width: 1 for bit matrices (`u8`), 4 for integer
//! matrices (`i32`). There is no magic number or version field; readers must
//! know which element type to expect. Fields are encoded one by one, so the
//! on-disk layout does not depend on host struct layout or endianness.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{BitGemmError, Result};
use crate::kernels::binary::types::{IntegerMatrix, UnpackedBitMatrix};

/// Width of each dimension field in bytes.
pub const DIM_BYTES: usize = 8;

/// Size of the `(rows, cols)` header in bytes.
pub const HEADER_BYTES: usize = 2 * DIM_BYTES;

/// Element type of a persisted record.
pub trait Scalar: Copy + Default {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Append the little-endian encoding of `self`.
    fn encode(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Self::WIDTH`] little-endian bytes.
    fn decode(bytes: &[u8]) -> Self;
}

impl Scalar for u8 {
    const WIDTH: usize = 1;

    fn encode(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Scalar for i32 {
    const WIDTH: usize = 4;

    fn encode(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

fn encode_dim(dim: usize, path: &Path) -> Result<[u8; DIM_BYTES]> {
    u64::try_from(dim)
        .map(u64::to_le_bytes)
        .map_err(|_| BitGemmError::format(path, format!("dimension {dim} does not fit in u64")))
}

fn decode_dim(bytes: &[u8], path: &Path) -> Result<usize> {
    let mut raw = [0u8; DIM_BYTES];
    raw.copy_from_slice(bytes);
    let value = u64::from_le_bytes(raw);
    usize::try_from(value)
        .map_err(|_| BitGemmError::format(path, format!("dimension {value} exceeds usize")))
}

/// Payload size in bytes for a `rows × cols` record of `T`.
fn payload_bytes<T: Scalar>(rows: usize, cols: usize, path: &Path) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(BitGemmError::format(
            path,
            format!("zero dimension {rows}x{cols}"),
        ));
    }
    rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(T::WIDTH))
        .ok_or_else(|| BitGemmError::format(path, format!("{rows}x{cols} overflows")))
}

/// Write one record to `writer`.
///
/// `path` only labels errors.
///
/// # Errors
///
/// Returns an error if `data.len() != rows * cols` or writing fails.
pub fn write_record<W: Write, T: Scalar>(
    writer: &mut W,
    data: &[T],
    rows: usize,
    cols: usize,
    path: &Path,
) -> Result<()> {
    let expected = payload_bytes::<T>(rows, cols, path)? / T::WIDTH;
    if data.len() != expected {
        return Err(BitGemmError::ShapeMismatch {
            expected: vec![rows, cols],
            actual: vec![data.len()],
        });
    }

    writer.write_all(&encode_dim(rows, path)?)?;
    writer.write_all(&encode_dim(cols, path)?)?;

    let mut payload = Vec::with_capacity(data.len() * T::WIDTH);
    for &value in data {
        value.encode(&mut payload);
    }
    writer.write_all(&payload)?;
    Ok(())
}

/// Read one record from `reader`, requiring it to be the whole stream.
///
/// `path` only labels errors.
///
/// # Errors
///
/// Returns [`BitGemmError::Format`] on a short header or payload, a zero or
/// overflowing dimension, or trailing bytes.
pub fn read_record<R: Read, T: Scalar>(
    reader: &mut R,
    path: &Path,
) -> Result<(Vec<T>, usize, usize)> {
    let mut header = [0u8; HEADER_BYTES];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => BitGemmError::format(path, "truncated header"),
        _ => BitGemmError::Io(e),
    })?;

    let rows = decode_dim(&header[..DIM_BYTES], path)?;
    let cols = decode_dim(&header[DIM_BYTES..], path)?;
    let len = payload_bytes::<T>(rows, cols, path)?;

    // Allocation is bounded by the bytes present in the stream.
    let mut payload = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() != len {
        return Err(BitGemmError::format(
            path,
            format!(
                "truncated payload, expected {len} bytes for {rows}x{cols}, found {}",
                payload.len()
            ),
        ));
    }

    let mut extra = [0u8; 1];
    if reader.read(&mut extra)? != 0 {
        return Err(BitGemmError::format(path, "trailing bytes after payload"));
    }

    let data = payload.chunks_exact(T::WIDTH).map(T::decode).collect();
    Ok((data, rows, cols))
}

/// Write a record to the file at `path`, replacing it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_matrix<T: Scalar>(
    path: impl AsRef<Path>,
    data: &[T],
    rows: usize,
    cols: usize,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_record(&mut writer, data, rows, cols, path)?;
    writer.flush()?;
    Ok(())
}

/// Read a record from the file at `path`.
///
/// The file size is checked against the header before the payload is
/// allocated.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed.
pub fn read_matrix<T: Scalar>(path: impl AsRef<Path>) -> Result<(Vec<T>, usize, usize)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let mut reader = BufReader::new(file);
    let mut header = [0u8; HEADER_BYTES];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => BitGemmError::format(path, "truncated header"),
        _ => BitGemmError::Io(e),
    })?;
    let rows = decode_dim(&header[..DIM_BYTES], path)?;
    let cols = decode_dim(&header[DIM_BYTES..], path)?;
    let expected = payload_bytes::<T>(rows, cols, path)? as u64 + HEADER_BYTES as u64;
    if file_len != expected {
        return Err(BitGemmError::format(
            path,
            format!("file is {file_len} bytes, {rows}x{cols} record needs {expected}"),
        ));
    }

    let mut stream = (&header[..]).chain(reader);
    read_record(&mut stream, path)
}

/// Persist a bit matrix as a `u8` record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn save_bit_matrix(path: impl AsRef<Path>, matrix: &UnpackedBitMatrix) -> Result<()> {
    write_matrix(path, matrix.as_slice(), matrix.rows(), matrix.cols())
}

/// Load a bit matrix from a `u8` record.
///
/// # Errors
///
/// Returns an error if the file is malformed or holds values other than 0/1.
pub fn load_bit_matrix(path: impl AsRef<Path>) -> Result<UnpackedBitMatrix> {
    let (bits, rows, cols) = read_matrix::<u8>(path)?;
    UnpackedBitMatrix::new(bits, rows, cols)
}

/// Persist an integer matrix as an `i32` record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn save_int_matrix(path: impl AsRef<Path>, matrix: &IntegerMatrix) -> Result<()> {
    write_matrix(path, matrix.as_slice(), matrix.rows(), matrix.cols())
}

/// Load an integer matrix from an `i32` record.
///
/// # Errors
///
/// Returns an error if the file is malformed.
pub fn load_int_matrix(path: impl AsRef<Path>) -> Result<IntegerMatrix> {
    let (data, rows, cols) = read_matrix::<i32>(path)?;
    IntegerMatrix::new(data, rows, cols)
}
