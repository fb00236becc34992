//! Scalar resolution
//!
//! Decides the type of a scalar from its text and quoting style. Only plain
//! scalars are typed implicitly; quoted and block scalars are always strings.
//! For plain scalars the first matching grammar wins:
//!
//! 1. Null: empty, `~`, `null`, `Null`, `NULL`
//! 2. Bool: `true`, `True`, `TRUE`, `false`, `False`, `FALSE`
//! 3. Special floats: `.inf`, `-.inf`, `.nan` and their capitalized forms
//! 4. Integer: decimal, `0x` hexadecimal, `0o` octal
//! 5. Float: digits with a decimal point and/or an exponent
//! 6. Timestamp: `YYYY-MM-DD`, optionally with a time of day and a zone
//! 7. String: everything else, unchanged
//!
//! A `!!binary` tag overrides all of this and base64-decodes the content;
//! `!!str` forces a string.

use base64::prelude::*;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use num_bigint::BigInt;

use crate::error::{Result, SyntaxError};
use crate::position::Position;
use crate::token::ScalarStyle;
use crate::value::{ScalarValue, Timestamp};

/// Resolve a scalar's type from its decoded text and style.
pub fn resolve(raw: &str, style: ScalarStyle) -> ScalarValue {
    if style != ScalarStyle::Plain {
        return ScalarValue::String(raw.to_string());
    }
    if let Some(v) = parse_keyword(raw) {
        return v;
    }
    if let Some(v) = parse_number(raw) {
        return v;
    }
    if let Some(t) = parse_timestamp(raw) {
        return ScalarValue::Timestamp(t);
    }
    ScalarValue::String(raw.to_string())
}

/// Resolve a scalar, letting a core-schema tag override implicit typing.
///
/// `at` locates the scalar for the error raised when `!!binary` content is
/// not valid base64.
pub fn resolve_tagged(
    raw: &str,
    style: ScalarStyle,
    tag: Option<&str>,
    at: Position,
) -> Result<ScalarValue> {
    match tag.and_then(core_tag_name) {
        Some("binary") => decode_binary(raw).map(ScalarValue::Binary).ok_or_else(|| {
            SyntaxError::resolution("!!binary content is not valid base64", at)
        }),
        Some("str") => Ok(ScalarValue::String(raw.to_string())),
        _ => Ok(resolve(raw, style)),
    }
}

/// The name of a `tag:yaml.org,2002:` tag written as `!!name` or verbatim.
pub fn core_tag_name(tag: &str) -> Option<&str> {
    if let Some(name) = tag.strip_prefix("!!") {
        return Some(name);
    }
    tag.strip_prefix("!<tag:yaml.org,2002:")
        .and_then(|rest| rest.strip_suffix('>'))
}

/// Base64-decode scalar content, ignoring whitespace and line breaks.
fn decode_binary(raw: &str) -> Option<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64_STANDARD.decode(compact.as_bytes()).ok()
}

// ============================================================================
// Keyword Parsing
// ============================================================================

/// Check if s is a null, boolean or special float keyword.
fn parse_keyword(s: &str) -> Option<ScalarValue> {
    match s {
        "" | "~" | "null" | "Null" | "NULL" => Some(ScalarValue::Null),
        "true" | "True" | "TRUE" => Some(ScalarValue::Bool(true)),
        "false" | "False" | "FALSE" => Some(ScalarValue::Bool(false)),
        ".nan" | ".NaN" | ".NAN" => Some(ScalarValue::Float(f64::NAN)),
        _ => {
            let (negative, rest) = split_sign(s);
            match rest {
                ".inf" | ".Inf" | ".INF" => Some(ScalarValue::Float(if negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                })),
                _ => None,
            }
        }
    }
}

/// Split an optional leading sign off a string.
fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

// ============================================================================
// Number Parsing
// ============================================================================

/// Attempt to parse s as an integer or a float.
fn parse_number(s: &str) -> Option<ScalarValue> {
    if let Some(n) = parse_integer(s) {
        return Some(ScalarValue::Integer(n));
    }
    if is_float_pattern(s) {
        if let Ok(f) = s.parse::<f64>() {
            return Some(ScalarValue::Float(f));
        }
    }
    None
}

/// Integers: `[-+]?[0-9]+`, `0x[0-9a-fA-F]+`, `0o[0-7]+`.
fn parse_integer(s: &str) -> Option<BigInt> {
    if let Some(hex) = s.strip_prefix("0x") {
        return parse_radix(hex, 16);
    }
    if let Some(oct) = s.strip_prefix("0o") {
        return parse_radix(oct, 8);
    }
    let (negative, digits) = split_sign(s);
    if !is_integer_pattern(digits) {
        return None;
    }
    let n = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    Some(if negative { -n } else { n })
}

fn parse_radix(digits: &str, radix: u32) -> Option<BigInt> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    BigInt::parse_bytes(digits.as_bytes(), radix)
}

/// Check if string is a non-empty run of decimal digits.
fn is_integer_pattern(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Check if string matches `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`.
fn is_float_pattern(s: &str) -> bool {
    let (_, s) = split_sign(s);

    // Split off exponent part if present
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(e_pos) => (&s[..e_pos], Some(&s[e_pos + 1..])),
        None => (s, None),
    };

    if let Some(exp) = exponent {
        let (_, exp) = split_sign(exp);
        if !is_integer_pattern(exp) {
            return false;
        }
    }

    let (before, after) = match mantissa.split_once('.') {
        Some((before, after)) => (before, after),
        None => (mantissa, ""),
    };
    let digits_ok = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    // A second dot lands in `after` and fails the digit check.
    digits_ok(before) && digits_ok(after) && (!before.is_empty() || !after.is_empty())
}

// ============================================================================
// Timestamp Parsing
// ============================================================================

/// Byte cursor over a candidate timestamp.
struct Cursor<'a> {
    s: &'a [u8],
    i: usize,
}

impl<'a> Cursor<'a> {
    fn digits(&mut self, min: usize, max: usize) -> Option<(u32, usize)> {
        let start = self.i;
        let mut value: u32 = 0;
        while self.i < self.s.len() && self.i - start < max && self.s[self.i].is_ascii_digit() {
            value = value
                .saturating_mul(10)
                .saturating_add(u32::from(self.s[self.i] - b'0'));
            self.i += 1;
        }
        let n = self.i - start;
        (n >= min).then_some((value, n))
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.s.get(self.i) == Some(&b) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn eat_blanks(&mut self) -> usize {
        let start = self.i;
        while matches!(self.s.get(self.i), Some(b' ') | Some(b'\t')) {
            self.i += 1;
        }
        self.i - start
    }

    fn peek(&self) -> Option<u8> {
        self.s.get(self.i).copied()
    }

    fn at_end(&self) -> bool {
        self.i >= self.s.len()
    }
}

/// `YYYY-MM-DD`, or `YYYY-M-D` followed by `T`, `t` or blanks, a time
/// `H:MM:SS(.fraction)?` and an optional zone `Z` or `±H(:MM)?`.
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let mut c = Cursor { s: s.as_bytes(), i: 0 };
    let (year, _) = c.digits(4, 4)?;
    if !c.eat(b'-') {
        return None;
    }
    let (month, month_len) = c.digits(1, 2)?;
    if !c.eat(b'-') {
        return None;
    }
    let (day, day_len) = c.digits(1, 2)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    if c.at_end() {
        return (month_len == 2 && day_len == 2).then_some(Timestamp::Date(date));
    }

    if !(c.eat(b'T') || c.eat(b't') || c.eat_blanks() > 0) {
        return None;
    }
    let (hour, _) = c.digits(1, 2)?;
    if !c.eat(b':') {
        return None;
    }
    let (minute, _) = c.digits(2, 2)?;
    if !c.eat(b':') {
        return None;
    }
    let (second, _) = c.digits(2, 2)?;
    let mut nanos = 0;
    if c.eat(b'.') {
        let start = c.i;
        c.digits(1, usize::MAX)?;
        let fraction = &s[start..c.i];
        let padded: String = fraction.chars().chain("000000000".chars()).take(9).collect();
        nanos = padded.parse().ok()?;
    }
    let local = date.and_time(NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?);

    c.eat_blanks();
    if c.at_end() {
        return Some(Timestamp::Local(local));
    }
    let offset_seconds = match c.peek()? {
        b'Z' => {
            c.i += 1;
            0
        }
        sign @ (b'+' | b'-') => {
            c.i += 1;
            let (h, _) = c.digits(1, 2)?;
            let m = if c.eat(b':') { c.digits(2, 2)?.0 } else { 0 };
            let secs = (h * 3600 + m * 60) as i32;
            if sign == b'-' {
                -secs
            } else {
                secs
            }
        }
        _ => return None,
    };
    if !c.at_end() {
        return None;
    }
    let offset = FixedOffset::east_opt(offset_seconds)?;
    let zoned = local.and_local_timezone(offset).single()?;
    Some(Timestamp::Zoned(zoned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarType;
    use proptest::prelude::*;

    fn plain(s: &str) -> ScalarValue {
        resolve(s, ScalarStyle::Plain)
    }

    #[test]
    fn test_parse_keyword() {
        assert_eq!(parse_keyword("null"), Some(ScalarValue::Null));
        assert_eq!(parse_keyword("~"), Some(ScalarValue::Null));
        assert_eq!(parse_keyword(""), Some(ScalarValue::Null));
        assert_eq!(parse_keyword("NULL"), Some(ScalarValue::Null));
        assert_eq!(parse_keyword("True"), Some(ScalarValue::Bool(true)));
        assert_eq!(parse_keyword("FALSE"), Some(ScalarValue::Bool(false)));
        assert!(parse_keyword(".NaN").unwrap().as_float().unwrap().is_nan());
        assert_eq!(
            parse_keyword("-.inf"),
            Some(ScalarValue::Float(f64::NEG_INFINITY))
        );
        assert_eq!(parse_keyword("+.Inf"), Some(ScalarValue::Float(f64::INFINITY)));
        assert_eq!(parse_keyword("tRuE"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(plain("42"), ScalarValue::from(42i64));
        assert_eq!(plain("-10"), ScalarValue::from(-10i64));
        assert_eq!(plain("+7"), ScalarValue::from(7i64));
        assert_eq!(plain("4294967296").as_i64(), Some(4294967296));
        assert_eq!(plain("0x1F"), ScalarValue::from(31i64));
        assert_eq!(plain("0o17"), ScalarValue::from(15i64));
        assert_eq!(plain("0.1"), ScalarValue::Float(0.1));
        assert_eq!(plain("-0.1"), ScalarValue::Float(-0.1));
        assert_eq!(plain("100.5"), ScalarValue::Float(100.5));
        assert_eq!(plain(".5"), ScalarValue::Float(0.5));
        assert_eq!(plain("1."), ScalarValue::Float(1.0));
        assert_eq!(plain("1e10"), ScalarValue::Float(1e10));
        assert_eq!(plain("1.5E-3"), ScalarValue::Float(1.5e-3));
    }

    #[test]
    fn test_big_integer_promotes() {
        let v = plain("123456789012345678901234567890");
        assert_eq!(v.scalar_type(), ScalarType::Integer);
        assert_eq!(v.as_i64(), None);
        assert_eq!(
            v.as_integer().unwrap().to_string(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn test_lookalikes_are_strings() {
        for s in ["bogus", "1:1", "1.2.3.4", "3s", "<foo>", ".", "-", "0x", "0o8", "1e", "e5"] {
            assert_eq!(plain(s), ScalarValue::String(s.to_string()), "{}", s);
        }
    }

    #[test]
    fn test_quoted_is_always_string() {
        assert_eq!(
            resolve("true", ScalarStyle::DoubleQuoted),
            ScalarValue::String("true".into())
        );
        assert_eq!(
            resolve("10", ScalarStyle::SingleQuoted),
            ScalarValue::String("10".into())
        );
        assert_eq!(
            resolve("null", ScalarStyle::Literal),
            ScalarValue::String("null".into())
        );
    }

    #[test]
    fn test_timestamps() {
        let date = plain("2002-12-14");
        assert_eq!(
            date,
            ScalarValue::Timestamp(Timestamp::Date(NaiveDate::from_ymd_opt(2002, 12, 14).unwrap()))
        );
        let zoned = plain("2018-01-09T10:40:47Z");
        match zoned.as_timestamp() {
            Some(Timestamp::Zoned(dt)) => {
                assert_eq!(dt.to_rfc3339(), "2018-01-09T10:40:47+00:00")
            }
            other => panic!("unexpected {:?}", other),
        }
        let spaced = plain("2001-12-14 21:59:43.10 -5");
        match spaced.as_timestamp() {
            Some(Timestamp::Zoned(dt)) => {
                assert_eq!(dt.to_rfc3339(), "2001-12-14T21:59:43.100-05:00")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            plain("2001-12-14t21:59:43").as_timestamp(),
            Some(Timestamp::Local(_))
        ));
    }

    #[test]
    fn test_invalid_dates_are_strings() {
        assert_eq!(plain("2001-02-30").scalar_type(), ScalarType::String);
        assert_eq!(plain("2001-2-3").scalar_type(), ScalarType::String);
        assert_eq!(plain("2001-12-14T25:00:00").scalar_type(), ScalarType::String);
    }

    #[test]
    fn test_binary_tag() {
        let v = resolve_tagged("gIGC", ScalarStyle::Plain, Some("!!binary"), Position::start())
            .unwrap();
        assert_eq!(v, ScalarValue::Binary(vec![0x80, 0x81, 0x82]));

        let multiline = format!("{}kJ\nCQ\n", "kJCQ".repeat(17));
        let v = resolve_tagged(
            &multiline,
            ScalarStyle::Literal,
            Some("!<tag:yaml.org,2002:binary>"),
            Position::start(),
        )
        .unwrap();
        assert_eq!(v.as_bytes().unwrap(), &[0x90u8; 54][..]);
    }

    #[test]
    fn test_binary_tag_rejects_bad_base64() {
        let err = resolve_tagged("not base64!", ScalarStyle::Plain, Some("!!binary"), Position::start())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resolution);
    }

    #[test]
    fn test_str_tag_and_unknown_tags() {
        let v = resolve_tagged("10", ScalarStyle::Plain, Some("!!str"), Position::start()).unwrap();
        assert_eq!(v, ScalarValue::String("10".into()));
        let v = resolve_tagged("10", ScalarStyle::Plain, Some("!custom"), Position::start()).unwrap();
        assert_eq!(v, ScalarValue::from(10i64));
    }

    proptest! {
        #[test]
        fn prop_words_resolve_to_themselves(s in "[g-wyzG-WYZ][a-zA-Z ]{0,12}") {
            prop_assume!(parse_keyword(&s).is_none());
            prop_assert_eq!(plain(&s), ScalarValue::String(s.clone()));
        }

        #[test]
        fn prop_decimal_integers_round_trip(n in any::<i64>()) {
            prop_assert_eq!(plain(&n.to_string()).as_i64(), Some(n));
        }

        #[test]
        fn prop_dotted_quads_are_strings(
            a in any::<u8>(),
            b in any::<u8>(),
            c in any::<u8>(),
            d in any::<u8>()
        ) {
            let s = format!("{}.{}.{}.{}", a, b, c, d);
            prop_assert_eq!(plain(&s), ScalarValue::String(s.clone()));
        }

        #[test]
        fn prop_quoted_text_is_string(s in "[ -~]{0,16}") {
            prop_assert_eq!(resolve(&s, ScalarStyle::DoubleQuoted), ScalarValue::String(s.clone()));
        }
    }
}
