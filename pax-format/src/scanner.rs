//! Line-oriented lexical scanner over a PAX header.
//!
//! A forward-only byte cursor shared by the type-line, structural-tag,
//! and metadata parsers. Everything works at the byte level: the header
//! grammar is ASCII, and non-ASCII bytes only ever pass through opaquely
//! inside comment and string values.

use pax_error::{pax_bail, pax_err, PaxError, PaxResult};

/// Legal intra-line whitespace. LF is handled separately everywhere.
fn is_ws(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r')
}

/// Bytes that terminate a run of junk: delimiters, braces, whitespace,
/// comment markers, and the line end.
fn is_junk_stop(byte: u8) -> bool {
    matches!(
        byte,
        b'#' | b':' | b'=' | b'[' | b']' | b' ' | b'\t' | b'\r' | b'\n'
    )
}

pub(crate) struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos + offset).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// The unread remainder of the buffer.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Advance over whitespace, optionally including linefeeds.
    pub fn skip_ws(&mut self, skip_lf: bool) {
        while let Some(byte) = self.peek() {
            if is_ws(byte) || (skip_lf && byte == b'\n') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Advance past the next linefeed. Failing to find one means the
    /// header continues beyond this buffer.
    pub fn skip_line(&mut self) -> PaxResult<()> {
        match self.rest().iter().position(|&b| b == b'\n') {
            Some(offset) => {
                self.pos += offset + 1;
                Ok(())
            }
            None => {
                self.pos = self.buf.len();
                Err(pax_err!(IncompleteHeader: "line extends past end of buffer"))
            }
        }
    }

    /// Advance over `ws (':' | '=') ws`, staying on the current line.
    pub fn skip_delimiter(&mut self) -> PaxResult<()> {
        self.skip_ws(false);
        match self.peek() {
            Some(b':') | Some(b'=') => self.pos += 1,
            Some(other) => {
                pax_bail!(MalformedMetadata: "expected ':' or '=', found {:?}", other as char)
            }
            None => pax_bail!(IncompleteHeader: "buffer ended where a delimiter was expected"),
        }
        self.skip_ws(false);
        Ok(())
    }

    /// Advance until the next delimiter, brace, whitespace, or comment
    /// marker. With `skip_lf`, a linefeed at the stopping point is also
    /// consumed (exactly one).
    pub fn skip_junk(&mut self, skip_lf: bool) {
        while let Some(byte) = self.peek() {
            if is_junk_stop(byte) {
                break;
            }
            self.pos += 1;
        }
        if skip_lf && self.peek() == Some(b'\n') {
            self.pos += 1;
        }
    }

    /// The scanner's rendition of `strtol` tail handling: junk, then
    /// whitespace, stopping short of the line end.
    fn skip_value_tail(&mut self) {
        self.skip_junk(false);
        self.skip_ws(false);
    }

    /// Case-insensitive prefix match at the cursor, without consuming.
    pub fn eq_ci(&self, tag: &str) -> bool {
        let tag = tag.as_bytes();
        self.rest().len() >= tag.len()
            && self.rest()[..tag.len()].eq_ignore_ascii_case(tag)
    }

    /// Case-insensitive prefix match; consumes the tag when it matches.
    pub fn match_ci(&mut self, tag: &str) -> bool {
        if self.eq_ci(tag) {
            self.pos += tag.len();
            true
        } else {
            false
        }
    }

    /// Consume bytes until one of the given stop bytes (or EOL/EOF).
    pub fn take_until(&mut self, stop: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if stop(byte) {
                break;
            }
            self.pos += 1;
        }
        &self.buf[start..self.pos]
    }

    fn no_digits_err(&self) -> PaxError {
        if self.eof() {
            pax_err!(IncompleteHeader: "buffer ended where a number was expected")
        } else {
            pax_err!(MalformedMetadata: "expected a number at byte {}", self.pos)
        }
    }

    fn lex_digits(&mut self, radix: u32) -> Option<&'a [u8]> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if (byte as char).is_digit(radix) {
                self.pos += 1;
            } else {
                break;
            }
        }
        (self.pos > start).then(|| &self.buf[start..self.pos])
    }

    fn token_str(token: &[u8]) -> &str {
        // The lexers above only accept ASCII, so this cannot fail.
        std::str::from_utf8(token).unwrap_or("")
    }

    /// Extract an unsigned integer: decimal or `0x` hex.
    pub fn get_uint(&mut self, skip_delimiter: bool) -> PaxResult<u64> {
        if skip_delimiter {
            self.skip_delimiter()?;
        }
        self.skip_ws(true);
        if self.peek() == Some(b'+') {
            self.pos += 1;
        }
        let value = if self.match_ci("0x") {
            let digits = self.lex_digits(16).ok_or_else(|| self.no_digits_err())?;
            u64::from_str_radix(Self::token_str(digits), 16)
        } else {
            let digits = self.lex_digits(10).ok_or_else(|| self.no_digits_err())?;
            Self::token_str(digits).parse::<u64>()
        }
        .map_err(|e| pax_err!(MalformedMetadata: "unsigned integer out of range: {}", e))?;
        self.skip_value_tail();
        Ok(value)
    }

    /// Extract a signed integer: decimal or `0x` hex, optional sign.
    pub fn get_int(&mut self, skip_delimiter: bool) -> PaxResult<i64> {
        if skip_delimiter {
            self.skip_delimiter()?;
        }
        self.skip_ws(true);
        let negative = match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                true
            }
            Some(b'+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        let magnitude = if self.match_ci("0x") {
            let digits = self.lex_digits(16).ok_or_else(|| self.no_digits_err())?;
            i64::from_str_radix(Self::token_str(digits), 16)
        } else {
            let digits = self.lex_digits(10).ok_or_else(|| self.no_digits_err())?;
            Self::token_str(digits).parse::<i64>()
        }
        .map_err(|e| pax_err!(MalformedMetadata: "integer out of range: {}", e))?;
        self.skip_value_tail();
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// Extract a floating-point number: decimal with optional fraction
    /// and exponent, or a `0x` hex integer.
    pub fn get_f64(&mut self, skip_delimiter: bool) -> PaxResult<f64> {
        if skip_delimiter {
            self.skip_delimiter()?;
        }
        self.skip_ws(true);
        let negative = match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                true
            }
            Some(b'+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };

        // Hex values are read as integer bit patterns, the way strtod
        // accepts the crc32-style entries the format documents.
        if self.eq_ci("0x") {
            self.advance(2);
            let digits = self.lex_digits(16).ok_or_else(|| self.no_digits_err())?;
            let value = u64::from_str_radix(Self::token_str(digits), 16)
                .map_err(|e| pax_err!(MalformedMetadata: "hex value out of range: {}", e))?
                as f64;
            self.skip_value_tail();
            return Ok(if negative { -value } else { value });
        }

        let start = self.pos;
        let int_digits = self.lex_digits(10).is_some();
        let mut frac_digits = false;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            frac_digits = self.lex_digits(10).is_some();
        }
        if !int_digits && !frac_digits {
            self.pos = start;
            return Err(self.no_digits_err());
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.lex_digits(10).is_none() {
                // "1.5elephant" - the exponent wasn't one after all.
                self.pos = mark;
            }
        }
        let value = Self::token_str(&self.buf[start..self.pos])
            .parse::<f64>()
            .map_err(|e| pax_err!(MalformedMetadata: "bad floating-point value: {}", e))?;
        self.skip_value_tail();
        Ok(if negative { -value } else { value })
    }

    pub fn get_f32(&mut self, skip_delimiter: bool) -> PaxResult<f32> {
        self.get_f64(skip_delimiter).map(|v| v as f32)
    }

    pub fn get_u32(&mut self, skip_delimiter: bool) -> PaxResult<u32> {
        let value = self.get_uint(skip_delimiter)?;
        u32::try_from(value)
            .map_err(|_| pax_err!(MalformedMetadata: "value {} does not fit in 32 bits", value))
    }

    pub fn get_i32(&mut self, skip_delimiter: bool) -> PaxResult<i32> {
        let value = self.get_int(skip_delimiter)?;
        i32::try_from(value)
            .map_err(|_| pax_err!(MalformedMetadata: "value {} does not fit in 32 bits", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_whitespace_but_not_lf_unless_asked() {
        let mut s = Scanner::new(b"  \t\r\n  x");
        s.skip_ws(false);
        assert_eq!(s.peek(), Some(b'\n'));
        s.skip_ws(true);
        assert_eq!(s.peek(), Some(b'x'));
    }

    #[test]
    fn skip_line_reports_missing_lf() {
        let mut s = Scanner::new(b"abc\ndef");
        s.skip_line().unwrap();
        assert_eq!(s.peek(), Some(b'd'));
        assert!(matches!(
            s.skip_line(),
            Err(PaxError::IncompleteHeader(_))
        ));
        assert!(s.eof());
    }

    #[test]
    fn delimiter_accepts_both_forms() {
        let mut s = Scanner::new(b" : 4");
        s.skip_delimiter().unwrap();
        assert_eq!(s.peek(), Some(b'4'));

        let mut s = Scanner::new(b"= 4");
        s.skip_delimiter().unwrap();
        assert_eq!(s.peek(), Some(b'4'));

        let mut s = Scanner::new(b" x 4");
        assert!(s.skip_delimiter().is_err());
    }

    #[test]
    fn case_insensitive_match() {
        let mut s = Scanner::new(b"Bytes_Per_Value : 2");
        assert!(s.eq_ci("BYTES_PER_VALUE"));
        assert!(s.match_ci("bytes_per_value"));
        assert_eq!(s.peek(), Some(b' '));
        assert!(!s.match_ci("extra"));
    }

    #[test]
    fn uint_decimal_and_hex() {
        assert_eq!(Scanner::new(b"1234").get_uint(false).unwrap(), 1234);
        assert_eq!(Scanner::new(b"0xFB29C8B3").get_uint(false).unwrap(), 0xFB29C8B3);
        assert_eq!(Scanner::new(b" : 16").get_uint(true).unwrap(), 16);
        assert!(Scanner::new(b"pear").get_uint(false).is_err());
    }

    #[test]
    fn int_signs() {
        assert_eq!(Scanner::new(b"-42").get_int(false).unwrap(), -42);
        assert_eq!(Scanner::new(b"+42").get_int(false).unwrap(), 42);
        assert_eq!(Scanner::new(b"-0x10").get_int(false).unwrap(), -16);
    }

    #[test]
    fn floats() {
        assert_eq!(Scanner::new(b"3.5").get_f64(false).unwrap(), 3.5);
        assert_eq!(Scanner::new(b"4.12E16").get_f64(false).unwrap(), 4.12e16);
        assert_eq!(Scanner::new(b"-2.5e-3").get_f64(false).unwrap(), -0.0025);
        assert_eq!(Scanner::new(b".5").get_f64(false).unwrap(), 0.5);
        assert_eq!(Scanner::new(b"7").get_f64(false).unwrap(), 7.0);
        assert_eq!(
            Scanner::new(b"0xFB29C8B3").get_f64(false).unwrap(),
            4213819571.0
        );
    }

    #[test]
    fn float_values_cross_linefeeds() {
        let mut s = Scanner::new(b" 1.0 2.0\n 3.0\n");
        assert_eq!(s.get_f64(false).unwrap(), 1.0);
        assert_eq!(s.get_f64(false).unwrap(), 2.0);
        assert_eq!(s.get_f64(false).unwrap(), 3.0);
    }

    #[test]
    fn value_tail_stays_on_the_line() {
        let mut s = Scanner::new(b"16cm \nnext");
        assert_eq!(s.get_uint(false).unwrap(), 16);
        // Junk and whitespace after the value are consumed, the LF is not.
        assert_eq!(s.peek(), Some(b'\n'));
    }

    #[test]
    fn eof_is_incomplete_header() {
        assert!(matches!(
            Scanner::new(b"   ").get_uint(false),
            Err(PaxError::IncompleteHeader(_))
        ));
    }
}
