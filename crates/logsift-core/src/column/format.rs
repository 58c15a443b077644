//! Canonical string forms of typed values.
//!
//! Filters match against these forms, so they must stay stable: a value
//! ingested as a string and stored in a typed encoding reads back exactly as
//! written here.

use std::fmt::Write;

use chrono::{DateTime, Utc};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Append the decimal form of `n`.
pub fn write_uint64(buf: &mut String, n: u64) {
    let _ = write!(buf, "{n}");
}

/// Append the decimal form of `n`.
pub fn write_int64(buf: &mut String, n: i64) {
    let _ = write!(buf, "{n}");
}

/// Append the shortest decimal form of `f` that parses back to `f`.
pub fn write_float64(buf: &mut String, f: f64) {
    let _ = write!(buf, "{f}");
}

/// Append the dotted-quad form of a big-endian packed IPv4 address.
pub fn write_ipv4(buf: &mut String, ip: u32) {
    let [a, b, c, d] = ip.to_be_bytes();
    let _ = write!(buf, "{a}.{b}.{c}.{d}");
}

/// Append `YYYY-MM-DDThh:mm:ss.mmmZ` for Unix nanoseconds.
pub fn write_timestamp_iso8601(buf: &mut String, nanos: i64) {
    let dt = to_datetime(nanos);
    let _ = write!(buf, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
}

/// Append RFC3339 with a nanosecond fraction stripped of trailing zeros.
pub fn write_timestamp_rfc3339_nano(buf: &mut String, nanos: i64) {
    let dt = to_datetime(nanos);
    let _ = write!(buf, "{}", dt.format("%Y-%m-%dT%H:%M:%S"));
    let frac = nanos.rem_euclid(NANOS_PER_SEC);
    if frac != 0 {
        let digits = format!("{frac:09}");
        buf.push('.');
        buf.push_str(digits.trim_end_matches('0'));
    }
    buf.push('Z');
}

fn to_datetime(nanos: i64) -> DateTime<Utc> {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let sub = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    DateTime::from_timestamp(secs, sub).unwrap_or_default()
}

/// Decimal form of `n`.
pub fn uint64_to_string(n: u64) -> String {
    let mut s = String::new();
    write_uint64(&mut s, n);
    s
}

/// Dotted-quad form of `ip`.
pub fn ipv4_to_string(ip: u32) -> String {
    let mut s = String::new();
    write_ipv4(&mut s, ip);
    s
}

/// ISO8601 form of `nanos`.
pub fn timestamp_iso8601_to_string(nanos: i64) -> String {
    let mut s = String::new();
    write_timestamp_iso8601(&mut s, nanos);
    s
}

/// RFC3339 form of `nanos`.
pub fn timestamp_rfc3339_nano_to_string(nanos: i64) -> String {
    let mut s = String::new();
    write_timestamp_rfc3339_nano(&mut s, nanos);
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::parse::{
        try_parse_float64, try_parse_timestamp_iso8601, try_parse_timestamp_rfc3339_nano,
    };

    #[test]
    fn test_float_forms() {
        let mut s = String::new();
        let cases = [
            (1.5, "1.5"),
            (-0.25, "-0.25"),
            (42.0, "42"),
            (1e21, "1000000000000000000000"),
        ];
        for (f, want) in cases {
            s.clear();
            write_float64(&mut s, f);
            assert_eq!(s, want);
        }
        s.clear();
        write_float64(&mut s, try_parse_float64("123.456").unwrap());
        assert_eq!(s, "123.456");
    }

    #[test]
    fn test_ipv4_form() {
        assert_eq!(ipv4_to_string(0x0a00_0001), "10.0.0.1");
        assert_eq!(ipv4_to_string(0), "0.0.0.0");
    }

    #[test]
    fn test_iso8601_form() {
        for s in ["2024-03-05T10:20:30.123Z", "1969-12-31T23:59:59.999Z"] {
            let nanos = try_parse_timestamp_iso8601(s).unwrap();
            assert_eq!(timestamp_iso8601_to_string(nanos), s);
        }
    }

    #[test]
    fn test_rfc3339_form() {
        assert_eq!(timestamp_rfc3339_nano_to_string(0), "1970-01-01T00:00:00Z");
        assert_eq!(
            timestamp_rfc3339_nano_to_string(1_500_000_000),
            "1970-01-01T00:00:01.5Z"
        );
        let s = "2024-03-05T10:20:30.000000123Z";
        assert_eq!(
            timestamp_rfc3339_nano_to_string(try_parse_timestamp_rfc3339_nano(s).unwrap()),
            s
        );
    }
}
