//! Encode, decode, preview, and multi-stream helpers.
//!
//! The codec operates on owned byte buffers and never performs I/O
//! itself; chunked preview pulls its input through a caller-supplied
//! fetch callback, which is the seam file readers plug into.

use bytes::Bytes;
use pax_dtype::PaxType;
use pax_error::{pax_bail, pax_err, PaxError, PaxResult};

use crate::header::{parse_header, parse_type_line};
use crate::scanner::Scanner;
use crate::writer::encode_stream;
use crate::{PaxModel, CHUNK_LEN, MIN_PAX_LEN};

/// The outcome of a header-only parse of a possibly-truncated stream.
#[derive(Debug)]
pub enum Preview {
    /// The whole header was present; the model carries no raster bytes.
    Complete(PaxModel),
    /// The buffer ended before `DATA_LENGTH`. Carries the number of
    /// bytes consumed before the parse ran out of input; append more and
    /// retry.
    NeedMoreBytes(usize),
}

/// Decode one PAX stream.
pub fn decode(bytes: &[u8]) -> PaxResult<PaxModel> {
    if bytes.len() < MIN_PAX_LEN {
        pax_bail!(
            FileTooShort: "a PAX stream is at least {} bytes, found {}",
            MIN_PAX_LEN,
            bytes.len()
        );
    }
    decode_one(bytes)
}

fn decode_one(bytes: &[u8]) -> PaxResult<PaxModel> {
    let mut scanner = Scanner::new(bytes);
    let header = parse_header(&mut scanner)?;
    let start = scanner.pos();
    let datalen = usize::try_from(header.datalen).unwrap_or(usize::MAX);
    let data = start
        .checked_add(datalen)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            pax_err!(
                TruncatedPayload: "{} raster bytes declared, {} remain",
                datalen,
                bytes.len().saturating_sub(start)
            )
        })?;
    Ok(PaxModel::from_decode(
        header,
        Bytes::copy_from_slice(data),
        start + datalen,
    ))
}

/// Serialize one model to a complete PAX stream.
pub fn encode(model: &PaxModel) -> Vec<u8> {
    encode_stream(model)
}

/// Parse only the header of a stream, tolerating truncated input.
///
/// The buffer is cut back to its last linefeed first, so a half-received
/// line is never interpreted.
pub fn preview(bytes: &[u8]) -> PaxResult<Preview> {
    let end = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut scanner = Scanner::new(&bytes[..end]);
    match parse_header(&mut scanner) {
        Ok(header) => {
            let consumed = scanner.pos();
            Ok(Preview::Complete(PaxModel::from_preview(header, consumed)))
        }
        Err(PaxError::IncompleteHeader(_)) => Ok(Preview::NeedMoreBytes(scanner.pos())),
        Err(e) => Err(e),
    }
}

/// Preview a header by pulling [`CHUNK_LEN`]-byte chunks on demand.
///
/// `fetch_chunk(index)` returns the `index`-th chunk of the underlying
/// stream, or `None` past the end. A short chunk marks the end of input.
pub fn preview_from_chunks<F>(mut fetch_chunk: F) -> PaxResult<PaxModel>
where
    F: FnMut(usize) -> Option<Bytes>,
{
    let mut buffer: Vec<u8> = Vec::new();
    for index in 0.. {
        let Some(chunk) = fetch_chunk(index) else {
            pax_bail!(
                IncompleteHeader: "chunk source ended after {} bytes without DATA_LENGTH",
                buffer.len()
            );
        };
        let at_end = chunk.len() < CHUNK_LEN;
        buffer.extend_from_slice(&chunk);
        match preview(&buffer)? {
            Preview::Complete(model) => return Ok(model),
            Preview::NeedMoreBytes(_) if !at_end => {}
            Preview::NeedMoreBytes(consumed) => pax_bail!(
                IncompleteHeader: "no DATA_LENGTH in {} bytes ({} consumed)",
                buffer.len(),
                consumed
            ),
        }
    }
    unreachable!("the chunk loop returns or bails")
}

/// Read just the type and version off a stream's first line.
pub fn peek_type(bytes: &[u8]) -> PaxResult<(PaxType, f32)> {
    parse_type_line(&mut Scanner::new(bytes))
}

/// Split a buffer holding several concatenated PAX streams, one per
/// expected type. Boundaries are implicit: each stream's header declares
/// its own length.
pub fn decode_many(bytes: &[u8], expected_types: &[PaxType]) -> PaxResult<Vec<PaxModel>> {
    if bytes.len() < MIN_PAX_LEN {
        pax_bail!(
            FileTooShort: "a PAX stream is at least {} bytes, found {}",
            MIN_PAX_LEN,
            bytes.len()
        );
    }
    let mut offset = 0usize;
    let mut models = Vec::with_capacity(expected_types.len());
    for (index, &expected) in expected_types.iter().enumerate() {
        let model = decode_one(&bytes[offset..])?;
        if model.ptype() != expected {
            pax_bail!(
                TypeMismatch: "stream {} decoded as {} but {} was expected",
                index,
                model.ptype(),
                expected
            );
        }
        offset += model.consumed_len();
        models.push(model);
    }
    Ok(models)
}

/// Concatenate the streams of several models into one buffer.
pub fn encode_many(models: &[PaxModel]) -> Vec<u8> {
    let mut out = Vec::new();
    for model in models {
        out.extend_from_slice(&encode(model));
    }
    out
}
