//! Strict parsers for the typed column encodings.
//!
//! A value is stored in a typed encoding only if it parses here, so every
//! parser is deliberately narrow: it accepts the forms whose canonical string
//! rendering is unambiguous.

use chrono::{NaiveDate, NaiveDateTime};

const NANOS_PER_SEC: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

/// Parse a non-negative decimal integer. `_` separators are allowed.
pub fn try_parse_uint64(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > "18_446_744_073_709_551_615".len() {
        return None;
    }
    let mut n: u64 = 0;
    let mut digits = 0;
    for b in s.bytes() {
        if b == b'_' {
            continue;
        }
        if !b.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    Some(n)
}

/// Parse a decimal integer with an optional leading `-`.
pub fn try_parse_int64(s: &str) -> Option<i64> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let n = try_parse_uint64(rest)?;
            if n > i64::MAX as u64 + 1 {
                return None;
            }
            Some((n as i64).wrapping_neg())
        }
        None => i64::try_from(try_parse_uint64(s)?).ok(),
    }
}

/// Parse a decimal number with an optional sign and fraction. Exponents are
/// rejected.
pub fn try_parse_float64(s: &str) -> Option<f64> {
    if s.is_empty() || s.len() > 20 {
        return None;
    }
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let is_digits = |part: &str| {
        part.bytes().any(|b| b.is_ascii_digit())
            && part.bytes().all(|b| b.is_ascii_digit() || b == b'_')
    };
    if !is_digits(int_part) || !frac_part.map_or(true, is_digits) {
        return None;
    }
    s.replace('_', "").parse::<f64>().ok()
}

/// Parse a dotted-quad IPv4 address into its big-endian `u32` form.
pub fn try_parse_ipv4(s: &str) -> Option<u32> {
    if s.len() < "1.1.1.1".len() || s.len() > "255.255.255.255".len() {
        return None;
    }
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 {
            return None;
        }
        let v = try_parse_uint64(part)?;
        *octet = u8::try_from(v).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(u32::from_be_bytes(octets))
}

/// Parse `YYYY-MM-DDThh:mm:ss.mmmZ` into Unix nanoseconds.
pub fn try_parse_timestamp_iso8601(s: &str) -> Option<i64> {
    if s.len() != "2006-01-02T15:04:05.000Z".len() || !s.is_ascii() {
        return None;
    }
    let (secs, tail) = parse_timestamp_secs(s)?;
    let millis = tail.strip_prefix('.')?.strip_suffix('Z')?;
    if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = try_parse_uint64(millis)? as i64;
    secs.checked_mul(NANOS_PER_SEC)?
        .checked_add(millis * 1_000_000)
}

/// Parse an RFC3339 timestamp with an optional fraction of up to nine digits
/// and a `Z` or `±hh:mm` offset. A space may replace the `T`.
pub fn try_parse_timestamp_rfc3339_nano(s: &str) -> Option<i64> {
    if s.len() < "2006-01-02T15:04:05Z".len() || !s.is_ascii() {
        return None;
    }
    let (secs, tail) = parse_timestamp_secs(s)?;
    let mut nanos = secs.checked_mul(NANOS_PER_SEC)?;

    let tz_pos = tail.find(['Z', '+', '-'])?;
    let (frac, tz) = tail.split_at(tz_pos);
    let offset = &tz[1..];
    match tz.as_bytes()[0] {
        b'Z' => {
            if !offset.is_empty() {
                return None;
            }
        }
        sign => {
            let mut offset_nanos = parse_timezone_offset(offset)?;
            if sign == b'-' {
                offset_nanos = -offset_nanos;
            }
            nanos = nanos.checked_sub(offset_nanos)?;
        }
    }

    if frac.is_empty() {
        return Some(nanos);
    }
    let digits = frac.strip_prefix('.')?;
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let scale = 10i64.pow(9 - digits.len() as u32);
    let frac_nanos = try_parse_uint64(digits)? as i64 * scale;
    nanos.checked_add(frac_nanos)
}

fn parse_timezone_offset(s: &str) -> Option<i64> {
    let (hours, minutes) = s.split_once(':')?;
    let hours = try_parse_uint64(hours)?;
    let minutes = try_parse_uint64(minutes)?;
    if hours > 24 || minutes > 60 {
        return None;
    }
    Some(hours as i64 * NANOS_PER_HOUR + minutes as i64 * NANOS_PER_MINUTE)
}

/// Parse the `YYYY-MM-DDThh:mm:ss` head of `s` into Unix seconds and return
/// the rest. `s` must be ASCII.
fn parse_timestamp_secs(s: &str) -> Option<(i64, &str)> {
    let b = s.as_bytes();
    if b.len() < 19 || b[4] != b'-' || b[7] != b'-' || (b[10] != b'T' && b[10] != b' ') {
        return None;
    }
    if b[13] != b':' || b[16] != b':' {
        return None;
    }
    let field = |range: std::ops::Range<usize>| -> Option<u32> {
        let part = &s[range];
        if !part.bytes().all(|c| c.is_ascii_digit()) {
            return None;
        }
        u32::try_from(try_parse_uint64(part)?).ok()
    };
    let year = field(0..4)?;
    if !(1677..=2262).contains(&year) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year as i32, field(5..7)?, field(8..10)?)?;
    let dt: NaiveDateTime = date.and_hms_opt(field(11..13)?, field(14..16)?, field(17..19)?)?;
    let secs = dt.and_utc().timestamp();
    if secs < i64::MIN / NANOS_PER_SEC || secs >= i64::MAX / NANOS_PER_SEC {
        return None;
    }
    Some((secs, &s[19..]))
}
