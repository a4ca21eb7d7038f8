//! Header grammar: line classification and parsing.
//!
//! The header is line-oriented and loosely delimited. Each line is
//! classified by its first non-whitespace byte (`#` comment, `##`
//! metadata) or by a case-insensitive structural tag; unrecognized lines
//! are skipped. Failures on a recognized structural tag are fatal, while
//! a bad `##` line is logged and dropped from the model.

use pax_dtype::{MetaKind, PaxType};
use pax_error::{pax_bail, pax_err, PaxError, PaxResult};
use pax_scalar::{MValue, MetaArray, MetaText, MetaValue};

use crate::scanner::Scanner;
use crate::store::MetadataStore;
use crate::{MetaLocation, DEFAULT_VERSION};

pub(crate) const PAX_TAG: &str = "PAX";
pub(crate) const BPV_TAG: &str = "BYTES_PER_VALUE";
pub(crate) const VPE_TAG: &str = "VALUES_PER_ELEMENT";
pub(crate) const DATALEN_TAG: &str = "DATA_LENGTH";

/// Dimension tags, legacy two-dimensional names first. The ordinal forms
/// exist for forward compatibility with higher-dimensional headers.
pub(crate) const DIM_TAGS: &[(&str, usize)] = &[
    ("ELEMENTS_IN_SEQUENTIAL_DIMENSION", 0),
    ("ELEMENTS_IN_STRIDED_DIMENSION", 1),
    ("ELEMENTS_IN_FIRST_DIMENSION", 0),
    ("ELEMENTS_IN_SECOND_DIMENSION", 1),
    ("ELEMENTS_IN_THIRD_DIMENSION", 2),
    ("ELEMENTS_IN_FOURTH_DIMENSION", 3),
];

/// Ordinal labels for metadata array dimensions, in dimension order.
pub(crate) const ORDINAL_TAGS: [&str; 4] = ["first", "second", "third", "fourth"];

/// A fully parsed header, positioned just before the raster payload.
pub(crate) struct Header {
    pub ptype: PaxType,
    pub version: f32,
    pub dims: Vec<u32>,
    pub datalen: u64,
    pub meta: MetadataStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Comment,
    Metadata,
    PaxTag,
    Bpv,
    Vpe,
    Dim(usize),
    DataLen,
    Unknown,
}

/// Classify the line under the cursor. Returns the kind and, for
/// structural tags, the number of tag bytes the caller should consume.
fn classify(s: &Scanner<'_>) -> (LineKind, usize) {
    match (s.peek(), s.peek_at(1)) {
        (Some(b'#'), Some(b'#')) => return (LineKind::Metadata, 0),
        (Some(b'#'), _) => return (LineKind::Comment, 0),
        _ => {}
    }
    if s.eq_ci(BPV_TAG) {
        return (LineKind::Bpv, BPV_TAG.len());
    }
    if s.eq_ci(VPE_TAG) {
        return (LineKind::Vpe, VPE_TAG.len());
    }
    if s.eq_ci(DATALEN_TAG) {
        return (LineKind::DataLen, DATALEN_TAG.len());
    }
    for &(tag, index) in DIM_TAGS {
        if s.eq_ci(tag) {
            return (LineKind::Dim(index), tag.len());
        }
    }
    if s.eq_ci(PAX_TAG) {
        return (LineKind::PaxTag, PAX_TAG.len());
    }
    (LineKind::Unknown, 0)
}

/// A numeric failure after a recognized structural tag is fatal, unless
/// the buffer simply ended (which preview treats as "feed me more").
fn structural_err(tag: &'static str) -> impl Fn(PaxError) -> PaxError {
    move |e| match e {
        PaxError::IncompleteHeader(_) => e,
        e => pax_err!(InvalidShape: "bad value after {}: {}", tag, e),
    }
}

/// Validate the `PAX<code> [: v<version>] [: <name>]` type line.
pub(crate) fn parse_type_line(s: &mut Scanner<'_>) -> PaxResult<(PaxType, f32)> {
    s.skip_ws(true);
    if s.eof() {
        pax_bail!(IncompleteHeader: "buffer ended before the type line");
    }
    if !s.match_ci(PAX_TAG) {
        pax_bail!(InvalidTag: "header does not begin with the PAX tag");
    }
    match s.peek() {
        Some(b) if b.is_ascii_digit() || b == b'+' || b == b'-' => {}
        _ => pax_bail!(InvalidTag: "no type code follows the PAX tag"),
    }
    let code = s.get_i32(false).map_err(|e| match e {
        PaxError::IncompleteHeader(_) => e,
        e => pax_err!(InvalidTag: "unreadable type code: {}", e),
    })?;
    let ptype = PaxType::from_code(code)
        .filter(|t| *t != PaxType::Invalid)
        .ok_or_else(|| pax_err!(UnknownType: "no PAX type has code {}", code))?;

    // The version clause did not exist before format version 1.0.
    let mut version = DEFAULT_VERSION;
    s.skip_ws(false);
    if matches!(s.peek(), Some(b':') | Some(b'=')) {
        s.skip_delimiter()?;
        if matches!(s.peek(), Some(b'v') | Some(b'V')) {
            s.advance(1);
            s.skip_ws(false);
            match s.get_f32(false) {
                Ok(v) => version = v,
                Err(e @ PaxError::IncompleteHeader(_)) => return Err(e),
                // Not a version clause; the field was the type name.
                Err(_) => {}
            }
        }
    }
    // The rest of the line is the printable type name; it is advisory.
    s.skip_line()?;
    Ok((ptype, version))
}

/// Parse the full header, leaving the cursor at the first raster byte.
pub(crate) fn parse_header(s: &mut Scanner<'_>) -> PaxResult<Header> {
    let (ptype, version) = parse_type_line(s)?;

    let mut meta = MetadataStore::new();
    meta.set_location(MetaLocation::AfterTag);

    let mut bpv = 0u64;
    let mut vpe = 0u64;
    let mut bpv_count = 0usize;
    let mut vpe_count = 0usize;
    let mut dims: Vec<u32> = Vec::new();
    let mut dim_counts: Vec<usize> = Vec::new();
    let datalen;

    loop {
        s.skip_ws(true);
        if s.eof() {
            pax_bail!(IncompleteHeader: "no DATA_LENGTH before end of buffer");
        }
        let (kind, tag_len) = classify(s);
        match kind {
            LineKind::Unknown => {
                log::warn!("skipping unrecognized header line at byte {}", s.pos());
                s.skip_line()?;
            }
            LineKind::PaxTag => {
                meta.set_location(MetaLocation::AfterTag);
                s.skip_line()?;
            }
            LineKind::Bpv => {
                s.advance(tag_len);
                bpv = s.get_uint(true).map_err(structural_err(BPV_TAG))?;
                s.skip_line()?;
                bpv_count += 1;
                meta.set_location(MetaLocation::AfterBpv);
            }
            LineKind::Vpe => {
                s.advance(tag_len);
                vpe = s.get_uint(true).map_err(structural_err(VPE_TAG))?;
                s.skip_line()?;
                vpe_count += 1;
                meta.set_location(MetaLocation::AfterVpe);
            }
            LineKind::Dim(index) => {
                s.advance(tag_len);
                let value = s.get_u32(true).map_err(structural_err("dimension tag"))?;
                s.skip_line()?;
                if dims.len() <= index {
                    dims.resize(index + 1, 0);
                    dim_counts.resize(index + 1, 0);
                }
                dims[index] = value;
                dim_counts[index] += 1;
                meta.set_location(if index == 0 {
                    MetaLocation::AfterFirstDim
                } else {
                    MetaLocation::AfterSecondDim
                });
            }
            LineKind::DataLen => {
                s.advance(tag_len);
                datalen = s.get_uint(true).map_err(structural_err(DATALEN_TAG))?;
                s.skip_line()?;
                break;
            }
            LineKind::Comment => parse_comment(s, &mut meta)?,
            LineKind::Metadata => {
                if let Err(e) = parse_metadata(s, &mut meta) {
                    if !matches!(e, PaxError::MalformedMetadata(_)) {
                        return Err(e);
                    }
                    log::warn!("skipping malformed metadata line: {}", e);
                    s.skip_ws(true);
                    if !s.eof() && classify(s).0 == LineKind::Unknown {
                        s.skip_line()?;
                    }
                }
            }
        }
    }

    if bpv_count != 1 || vpe_count != 1 || dims.is_empty() || dim_counts.iter().any(|&c| c != 1) {
        pax_bail!(
            InvalidShape: "header must carry BYTES_PER_VALUE once, VALUES_PER_ELEMENT once, and each dimension once (found {}, {}, {:?})",
            bpv_count,
            vpe_count,
            dim_counts
        );
    }
    if bpv != ptype.bpv() as u64 {
        pax_bail!(InvalidShape: "BYTES_PER_VALUE is {} but {} requires {}", bpv, ptype, ptype.bpv());
    }
    if vpe != ptype.vpe() as u64 {
        pax_bail!(InvalidShape: "VALUES_PER_ELEMENT is {} but {} requires {}", vpe, ptype, ptype.vpe());
    }
    let elements: u64 = dims.iter().map(|&d| u64::from(d)).product();
    let expected = elements * bpv * vpe;
    if datalen != expected {
        pax_bail!(
            InvalidShape: "DATA_LENGTH is {} but {} elements of {} occupy {}",
            datalen,
            elements,
            ptype,
            expected
        );
    }

    Ok(Header {
        ptype,
        version,
        dims,
        datalen,
        meta,
    })
}

/// `#` comment: everything up to the linefeed, minus one leading space.
fn parse_comment(s: &mut Scanner<'_>, meta: &mut MetadataStore) -> PaxResult<()> {
    s.advance(1);
    let line = s.take_until(|b| b == b'\n');
    if s.eof() {
        pax_bail!(IncompleteHeader: "comment line extends past end of buffer");
    }
    s.advance(1);

    let mut text = line;
    if let Some((&b'\r', head)) = text.split_last() {
        text = head;
    }
    let stripped = text.first() == Some(&b' ');
    if stripped {
        text = &text[1..];
    }
    meta.add_comment_value(MetaText::new(text, stripped));
    Ok(())
}

fn name_stop(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\t' | b':' | b'=' | b'[' | b']' | b'\n' | b'\r'
    )
}

/// `## [tag] name [dims] = values`: one typed metadata entry, possibly
/// spanning continuation lines for array values.
fn parse_metadata(s: &mut Scanner<'_>, meta: &mut MetadataStore) -> PaxResult<()> {
    s.advance(2);
    s.skip_ws(false);
    if s.peek() != Some(b'[') {
        pax_bail!(MalformedMetadata: "missing '[' before the type tag");
    }
    s.advance(1);
    s.skip_ws(false);

    let tag = s.take_until(name_stop);
    let kind = std::str::from_utf8(tag)
        .ok()
        .and_then(MetaKind::from_tag)
        .ok_or_else(|| {
            pax_err!(MalformedMetadata: "unknown metadata type tag {:?}", String::from_utf8_lossy(tag))
        })?;
    s.skip_ws(false);
    if s.peek() != Some(b']') {
        pax_bail!(MalformedMetadata: "missing ']' after the type tag");
    }
    s.advance(1);
    s.skip_ws(false);

    let name_bytes = s.take_until(name_stop);
    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| pax_err!(MalformedMetadata: "metadata name is not valid UTF-8"))?
        .to_string();
    if name.is_empty() {
        pax_bail!(MalformedMetadata: "missing metadata name");
    }
    if name.starts_with(crate::store::COMMENT_NAME_DELIM) {
        pax_bail!(MalformedMetadata: "metadata names cannot begin with ';'");
    }
    s.skip_ws(false);

    let mut dims: Vec<u32> = Vec::new();
    if s.peek() == Some(b'[') {
        s.advance(1);
        s.skip_ws(false);
        for ordinal in ORDINAL_TAGS {
            if s.match_ci(ordinal) {
                dims.push(s.get_u32(true)?);
            } else {
                break;
            }
        }
        if dims.is_empty() {
            // Covers malformed ordinals like "2st" as well as an empty list.
            pax_bail!(MalformedMetadata: "dimension list of '{}' has no recognized ordinal", name);
        }
        s.skip_ws(false);
        if s.peek() != Some(b']') {
            pax_bail!(MalformedMetadata: "missing ']' after the dimension list of '{}'", name);
        }
        s.advance(1);
        s.skip_ws(false);
    }

    if !matches!(s.peek(), Some(b':') | Some(b'=')) {
        pax_bail!(MalformedMetadata: "missing delimiter after '{}'", name);
    }
    s.advance(1);

    let count: usize = dims.iter().map(|&d| d as usize).product();
    let value = if kind == MetaKind::String {
        // Strings run to the end of the line; a dimension list is ignored,
        // since a string entry holds exactly one string by definition.
        let line = s.take_until(|b| b == b'\n');
        if s.eof() {
            pax_bail!(IncompleteHeader: "string value extends past end of buffer");
        }
        let mut text = line;
        if let Some((&b'\r', head)) = text.split_last() {
            text = head;
        }
        let stripped = text.first() == Some(&b' ');
        if stripped {
            text = &text[1..];
        }
        MetaValue::String(MetaText::new(text, stripped))
    } else if dims.is_empty() || count <= 1 {
        MetaValue::Scalar(parse_scalar(s, kind)?)
    } else {
        let mut bytes = Vec::with_capacity(count * kind.byte_size());
        for _ in 0..count {
            parse_scalar(s, kind)?.extend_le_bytes(&mut bytes);
        }
        MetaValue::Array(MetaArray::from_le_bytes(kind, dims, bytes)?)
    };
    s.skip_line()?;
    meta.add(name, value);
    Ok(())
}

/// One numeric value of the given kind. Integers narrow from their
/// 64-bit readers the way the original format stored them.
fn parse_scalar(s: &mut Scanner<'_>, kind: MetaKind) -> PaxResult<MValue> {
    Ok(match kind {
        MetaKind::Float => MValue::Float(s.get_f32(false)?),
        MetaKind::Double => MValue::Double(s.get_f64(false)?),
        MetaKind::Int64 => MValue::Int64(s.get_int(false)?),
        MetaKind::Int32 => MValue::Int32(s.get_int(false)? as i32),
        MetaKind::Int16 => MValue::Int16(s.get_int(false)? as i16),
        MetaKind::Int8 => MValue::Int8(s.get_int(false)? as i8),
        MetaKind::Uint64 => MValue::Uint64(s.get_uint(false)?),
        MetaKind::Uint32 => MValue::Uint32(s.get_uint(false)? as u32),
        MetaKind::Uint16 => MValue::Uint16(s.get_uint(false)? as u16),
        MetaKind::Uint8 => MValue::Uint8(s.get_uint(false)? as u8),
        MetaKind::Comment | MetaKind::String => {
            pax_bail!(MalformedMetadata: "{} metadata has no numeric value", kind)
        }
    })
}

#[cfg(test)]
mod tests {
    use pax_dtype::MetaKind;

    use super::*;

    fn parse(input: &[u8]) -> PaxResult<Header> {
        parse_header(&mut Scanner::new(input))
    }

    const MINIMAL: &[u8] = b"PAX101 : v1.00 : PAX_UCHAR\n\
        BYTES_PER_VALUE : 1\n\
        VALUES_PER_ELEMENT : 1\n\
        ELEMENTS_IN_SEQUENTIAL_DIMENSION : 2\n\
        ELEMENTS_IN_STRIDED_DIMENSION : 2\n\
        DATA_LENGTH : 4\n";

    #[test]
    fn minimal_header() {
        let h = parse(MINIMAL).unwrap();
        assert_eq!(h.ptype, PaxType::Uchar);
        assert_eq!(h.version, 1.0);
        assert_eq!(h.dims, vec![2, 2]);
        assert_eq!(h.datalen, 4);
        assert!(h.meta.is_empty());
    }

    #[test]
    fn tags_are_case_insensitive() {
        let lowered: Vec<u8> = MINIMAL.to_ascii_lowercase();
        let h = parse(&lowered).unwrap();
        assert_eq!(h.ptype, PaxType::Uchar);
        assert_eq!(h.dims, vec![2, 2]);
    }

    #[test]
    fn version_defaults_when_absent() {
        let (ptype, version) =
            parse_type_line(&mut Scanner::new(b"PAX109\nrest")).unwrap();
        assert_eq!(ptype, PaxType::Float);
        assert_eq!(version, DEFAULT_VERSION);
    }

    #[test]
    fn bad_type_line() {
        assert!(matches!(
            parse_type_line(&mut Scanner::new(b"BMP6 : nope\n")),
            Err(PaxError::InvalidTag(_))
        ));
        assert!(matches!(
            parse_type_line(&mut Scanner::new(b"PAX9999 : v1.00\n")),
            Err(PaxError::UnknownType(_))
        ));
    }

    #[test]
    fn unknown_lines_are_skipped() {
        let mut input = MINIMAL.to_vec();
        input.splice(27..27, b"FOO_BAR : 42\n".iter().copied());
        let h = parse(&input).unwrap();
        assert_eq!(h.dims, vec![2, 2]);
        assert!(h.meta.is_empty());
    }

    #[test]
    fn comments_and_metadata_take_their_location() {
        let input = b"PAX101 : v1.00 : PAX_UCHAR\n\
            # leading note\n\
            BYTES_PER_VALUE : 1\n\
            ## [double]   pi = 3.25\n\
            VALUES_PER_ELEMENT : 1\n\
            ELEMENTS_IN_SEQUENTIAL_DIMENSION : 2\n\
            ELEMENTS_IN_STRIDED_DIMENSION : 2\n\
            DATA_LENGTH : 4\n";
        let h = parse(input).unwrap();
        assert_eq!(h.meta.len(), 2);
        let comment = h.meta.get(";0;0").unwrap();
        assert_eq!(comment.location(), MetaLocation::AfterTag);
        assert_eq!(
            comment.value().as_text().unwrap().as_bytes(),
            b"leading note"
        );
        let pi = h.meta.get("pi").unwrap();
        assert_eq!(pi.location(), MetaLocation::AfterBpv);
        assert_eq!(pi.value().as_scalar().unwrap().as_double().unwrap(), 3.25);
    }

    #[test]
    fn malformed_metadata_is_dropped() {
        let input = b"PAX101 : v1.00 : PAX_UCHAR\n\
            ## [floot]   x = 1\n\
            ## [int32]   y [ 2st = 4 ] = 1 2 3 4\n\
            BYTES_PER_VALUE : 1\n\
            VALUES_PER_ELEMENT : 1\n\
            ELEMENTS_IN_SEQUENTIAL_DIMENSION : 2\n\
            ELEMENTS_IN_STRIDED_DIMENSION : 2\n\
            DATA_LENGTH : 4\n";
        let h = parse(input).unwrap();
        assert!(h.meta.is_empty());
    }

    #[test]
    fn array_metadata_spans_lines() {
        let input = b"PAX101 : v1.00 : PAX_UCHAR\n\
            ## [int32]   grid [ first = 2 second = 3 ] =\n\
              1 2\n 3 4\n 5 6\n\
            BYTES_PER_VALUE : 1\n\
            VALUES_PER_ELEMENT : 1\n\
            ELEMENTS_IN_SEQUENTIAL_DIMENSION : 2\n\
            ELEMENTS_IN_STRIDED_DIMENSION : 2\n\
            DATA_LENGTH : 4\n";
        let h = parse(input).unwrap();
        let grid = h.meta.get("grid").unwrap().value().as_array().unwrap();
        assert_eq!(grid.kind(), MetaKind::Int32);
        assert_eq!(grid.dims(), &[2, 3]);
        assert_eq!(grid.value::<i32>(&[0, 0]).unwrap(), 1);
        assert_eq!(grid.value::<i32>(&[1, 2]).unwrap(), 6);
    }

    #[test]
    fn shape_mismatches_are_fatal() {
        let input = String::from_utf8(MINIMAL.to_vec())
            .unwrap()
            .replace("DATA_LENGTH : 4", "DATA_LENGTH : 40");
        assert!(matches!(
            parse(input.as_bytes()),
            Err(PaxError::InvalidShape(_))
        ));

        let input = String::from_utf8(MINIMAL.to_vec())
            .unwrap()
            .replace("BYTES_PER_VALUE : 1", "BYTES_PER_VALUE : 2");
        assert!(matches!(
            parse(input.as_bytes()),
            Err(PaxError::InvalidShape(_))
        ));
    }

    #[test]
    fn missing_datalen_is_incomplete() {
        let input = &MINIMAL[..MINIMAL.len() - 16];
        assert!(matches!(
            parse(input),
            Err(PaxError::IncompleteHeader(_))
        ));
    }

    #[test]
    fn hex_and_scientific_metadata_values() {
        let input = b"PAX101 : v1.00 : PAX_UCHAR\n\
            ## [double]   crc = 0xFB29C8B3\n\
            ## [double]   far = 4.12E16\n\
            ## [uint32]   mask = 0xff\n\
            BYTES_PER_VALUE : 1\n\
            VALUES_PER_ELEMENT : 1\n\
            ELEMENTS_IN_SEQUENTIAL_DIMENSION : 2\n\
            ELEMENTS_IN_STRIDED_DIMENSION : 2\n\
            DATA_LENGTH : 4\n";
        let h = parse(input).unwrap();
        assert_eq!(
            h.meta.get("crc").unwrap().value().as_scalar().unwrap().as_double().unwrap(),
            4213819571.0
        );
        assert_eq!(
            h.meta.get("far").unwrap().value().as_scalar().unwrap().as_double().unwrap(),
            4.12e16
        );
        assert_eq!(
            h.meta.get("mask").unwrap().value().as_scalar().unwrap().as_uint32().unwrap(),
            255
        );
    }
}
