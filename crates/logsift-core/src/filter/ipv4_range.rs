//! `ipv4_range(min, max)`: the value is an IPv4 address within the range.

use std::fmt;

use crate::bitmap::Bitmap;
use crate::column::format::ipv4_to_string;
use crate::column::parse::try_parse_ipv4;
use crate::error::{Error, Result};

use super::column::{ColumnFilter, ColumnView, Typed};
use super::matchers::match_ipv4_range;
use super::render::quote_field_name_if_needed;

#[derive(Debug, Clone)]
pub struct Ipv4RangeFilter {
    field: String,
    min: u32,
    max: u32,
}

impl Ipv4RangeFilter {
    pub fn new(field: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            field: field.into(),
            min,
            max,
        }
    }

    /// Range between two dotted-quad addresses.
    pub fn parse(field: impl Into<String>, min: &str, max: &str) -> Result<Self> {
        let parse = |s: &str| {
            try_parse_ipv4(s)
                .ok_or_else(|| Error::InvalidFilter(format!("invalid ipv4 address {s:?}")))
        };
        Ok(Self::new(field, parse(min)?, parse(max)?))
    }

    /// Range covering an address block in CIDR notation, e.g. `10.0.0.0/8`.
    pub fn from_cidr(field: impl Into<String>, cidr: &str) -> Result<Self> {
        let invalid = || Error::InvalidFilter(format!("invalid ipv4 cidr {cidr:?}"));
        let (addr, bits) = cidr.split_once('/').ok_or_else(invalid)?;
        let ip = try_parse_ipv4(addr).ok_or_else(invalid)?;
        let bits: u32 = bits.parse().map_err(|_| invalid())?;
        if bits > 32 {
            return Err(invalid());
        }
        let mask = u32::MAX.checked_shl(32 - bits).unwrap_or(0);
        Ok(Self::new(field, ip & mask, ip | !mask))
    }
}

impl ColumnFilter for Ipv4RangeFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        let (min, max) = (self.min, self.max);
        if min > max {
            bm.reset_bits();
            return;
        }
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                if !match_ipv4_range(col.const_value().unwrap_or_default(), min, max) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(_) => bm.reset_bits(),
            ColumnView::Encoded(ev) => match ev.typed() {
                Typed::String(values) => {
                    bm.for_each_set_bit(|i| match_ipv4_range(&values[i], min, max))
                }
                Typed::Dict(ids) => ev.match_dict(ids, bm, |s| match_ipv4_range(s, min, max)),
                Typed::Ipv4(values) => {
                    let header = ev.header;
                    if u64::from(min) > header.max_value || u64::from(max) < header.min_value {
                        bm.reset_bits();
                        return;
                    }
                    bm.for_each_set_bit(|i| (min..=max).contains(&values[i]));
                }
                // Canonical forms of the other encodings never parse as an address.
                Typed::Uint(_) | Typed::Int64(_) | Typed::Float64(_) | Typed::Iso8601(_) => {
                    bm.reset_bits()
                }
            },
        }
    }
}

impl fmt::Display for Ipv4RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ipv4_range({}, {})",
            quote_field_name_if_needed(&self.field),
            ipv4_to_string(self.min),
            ipv4_to_string(self.max)
        )
    }
}
