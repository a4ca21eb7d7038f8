//! Header serialization.
//!
//! The output layout is fully determined by the model, which is what
//! makes encode/decode idempotent: the type line, the structural tags
//! with each location's metadata between them, `DATA_LENGTH`, then the
//! raster bytes verbatim.

use pax_dtype::MetaKind;
use pax_error::PaxExpect;
use pax_scalar::{MValue, MetaArray, MetaValue};

use crate::header::{BPV_TAG, DATALEN_TAG, DIM_TAGS, ORDINAL_TAGS, VPE_TAG};
use crate::store::MetadataStore;
use crate::{MetaLocation, PaxModel};

/// Floating-point metadata precision. Deliberately over-precise for f32;
/// readers accept the trailing digits.
const SIG_DIGITS: usize = 15;

/// Values per output row in a multi-dimensional array literal.
const ROW_TARGET: usize = 16;

pub(crate) fn encode_stream(model: &PaxModel) -> Vec<u8> {
    let mut out = encode_header(model);
    out.extend_from_slice(model.raster().data());
    out
}

pub(crate) fn encode_header(model: &PaxModel) -> Vec<u8> {
    let ptype = model.ptype();
    let dims = model.raster().dims();
    let meta = model.meta();
    let mut out = Vec::new();

    out.extend_from_slice(
        format!(
            "PAX{} : v{:.2} : {}\n",
            ptype.code(),
            model.version(),
            ptype.name()
        )
        .as_bytes(),
    );
    write_meta(&mut out, meta, MetaLocation::AfterTag);

    out.extend_from_slice(format!("{} : {}\n", BPV_TAG, ptype.bpv()).as_bytes());
    write_meta(&mut out, meta, MetaLocation::AfterBpv);

    out.extend_from_slice(format!("{} : {}\n", VPE_TAG, ptype.vpe()).as_bytes());
    write_meta(&mut out, meta, MetaLocation::AfterVpe);

    out.extend_from_slice(
        format!("{} : {}\n", DIM_TAGS[0].0, dims.first().copied().unwrap_or(0)).as_bytes(),
    );
    write_meta(&mut out, meta, MetaLocation::AfterFirstDim);

    // A missing second dimension serializes as a trivial one so the
    // declared element count keeps matching DATA_LENGTH.
    out.extend_from_slice(
        format!("{} : {}\n", DIM_TAGS[1].0, dims.get(1).copied().unwrap_or(1)).as_bytes(),
    );
    for (ordinal, dim) in ORDINAL_TAGS.iter().zip(dims.iter()).skip(2) {
        out.extend_from_slice(
            format!(
                "ELEMENTS_IN_{}_DIMENSION : {}\n",
                ordinal.to_ascii_uppercase(),
                dim
            )
            .as_bytes(),
        );
    }
    write_meta(&mut out, meta, MetaLocation::AfterSecondDim);

    out.extend_from_slice(format!("{} : {}\n", DATALEN_TAG, model.datalen()).as_bytes());
    out
}

fn write_meta(out: &mut Vec<u8>, store: &MetadataStore, location: MetaLocation) {
    for (name, entry) in store.entries_at(location) {
        match entry.value() {
            MetaValue::Comment(text) => {
                out.push(b'#');
                if text.stripped() {
                    out.push(b' ');
                }
                out.extend_from_slice(text.as_bytes());
                out.push(b'\n');
            }
            MetaValue::String(text) => {
                out.extend_from_slice(
                    format!("## {:<11}{}", tag_field(MetaKind::String), name).as_bytes(),
                );
                out.extend_from_slice(if text.stripped() { " = " } else { " =" }.as_bytes());
                out.extend_from_slice(text.as_bytes());
                out.push(b'\n');
            }
            MetaValue::Scalar(value) => {
                out.extend_from_slice(
                    format!(
                        "## {:<11}{} = {}\n",
                        tag_field(value.kind()),
                        name,
                        format_scalar(value)
                    )
                    .as_bytes(),
                );
            }
            MetaValue::Array(array) => write_array(out, name, array),
        }
    }
}

fn tag_field(kind: MetaKind) -> String {
    format!("[{}]", kind.tag())
}

fn write_array(out: &mut Vec<u8>, name: &str, array: &MetaArray) {
    let mut line = format!("## {:<11}{} [", tag_field(array.kind()), name);
    for (ordinal, dim) in ORDINAL_TAGS.iter().zip(array.dims().iter()) {
        line.push_str(&format!(" {} = {}", ordinal, dim));
    }
    line.push_str(" ] =");

    let row_len = row_length(array.dims());
    let multi_dim = array.dims().len() > 1;
    for i in 0..array.count() {
        if multi_dim && i % row_len == 0 {
            line.push_str("\n ");
        }
        line.push(' ');
        line.push_str(&format_element(array, i));
    }
    line.push('\n');
    out.extend_from_slice(line.as_bytes());
}

/// Accumulate dimensions left-to-right until a row holds at least
/// [`ROW_TARGET`] values.
fn row_length(dims: &[u32]) -> usize {
    let mut row_len = 1usize;
    for &dim in dims {
        if row_len >= ROW_TARGET {
            break;
        }
        row_len *= dim as usize;
    }
    row_len.max(1)
}

fn format_scalar(value: &MValue) -> String {
    match value {
        MValue::Float(v) => format_sig(f64::from(*v), SIG_DIGITS),
        MValue::Double(v) => format_sig(*v, SIG_DIGITS),
        other => other.to_string(),
    }
}

fn format_element(array: &MetaArray, flat: usize) -> String {
    let read = "array element within count";
    match array.kind() {
        MetaKind::Float => format_sig(
            f64::from(array.value_at::<f32>(flat).pax_expect(read)),
            SIG_DIGITS,
        ),
        MetaKind::Double => format_sig(array.value_at::<f64>(flat).pax_expect(read), SIG_DIGITS),
        MetaKind::Int64 => array.value_at::<i64>(flat).pax_expect(read).to_string(),
        MetaKind::Uint64 => array.value_at::<u64>(flat).pax_expect(read).to_string(),
        MetaKind::Int32 => array.value_at::<i32>(flat).pax_expect(read).to_string(),
        MetaKind::Uint32 => array.value_at::<u32>(flat).pax_expect(read).to_string(),
        MetaKind::Int16 => array.value_at::<i16>(flat).pax_expect(read).to_string(),
        MetaKind::Uint16 => array.value_at::<u16>(flat).pax_expect(read).to_string(),
        MetaKind::Int8 => array.value_at::<i8>(flat).pax_expect(read).to_string(),
        MetaKind::Uint8 => array.value_at::<u8>(flat).pax_expect(read).to_string(),
        MetaKind::Comment | MetaKind::String => String::new(),
    }
}

/// Format with at most `sig` significant digits, trailing zeros trimmed,
/// switching to scientific notation for extreme exponents. This matches
/// the default C++ stream formatting the original files were written
/// with, so existing readers see familiar digits.
pub(crate) fn format_sig(value: f64, sig: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*e}", sig - 1, value);
    let (mantissa, exp) = formatted
        .split_once('e')
        .pax_expect("scientific formatting always yields an exponent");
    let exp: i32 = exp.parse().ok().pax_expect("exponent is an integer");
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if exp < -4 || exp >= sig as i32 {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push_str(&exp.to_string());
    } else if exp >= 0 {
        let point = exp as usize + 1;
        if digits.len() > point {
            out.push_str(&digits[..point]);
            out.push('.');
            out.push_str(&digits[point..]);
        } else {
            out.push_str(digits);
            out.push_str(&"0".repeat(point - digits.len()));
        }
    } else {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exp - 1) as usize));
        out.push_str(digits);
    }
    out
}
