//! `in(a, b, ...)`: the value equals one of the listed values.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use once_cell::sync::OnceCell;

use crate::bitmap::Bitmap;
use crate::column::format::{
    write_float64, write_int64, write_ipv4, write_timestamp_iso8601, write_timestamp_rfc3339_nano,
    write_uint64,
};
use crate::column::parse::{
    try_parse_float64, try_parse_int64, try_parse_ipv4, try_parse_timestamp_iso8601,
    try_parse_timestamp_rfc3339_nano, try_parse_uint64,
};

use super::column::{ColumnFilter, ColumnView, EncodedView, TokenSets, Typed};
use super::matchers::parse_canonical;
use super::render::{join_tokens, quote_field_name_if_needed};

/// Operand sets, each built on first use.
#[derive(Debug, Clone, Default)]
struct InSets {
    strings: OnceCell<HashSet<String>>,
    token_sets: OnceCell<TokenSets>,
    uint: OnceCell<HashSet<u64>>,
    int64: OnceCell<HashSet<i64>>,
    /// Bit patterns of the float operands.
    float64: OnceCell<HashSet<u64>>,
    ipv4: OnceCell<HashSet<u32>>,
    iso8601: OnceCell<HashSet<i64>>,
    timestamps: OnceCell<HashSet<i64>>,
}

#[derive(Debug, Clone)]
pub struct InFilter {
    field: String,
    values: Vec<String>,
    sets: InSets,
}

impl InFilter {
    pub fn new<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            sets: InSets::default(),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn strings(&self) -> &HashSet<String> {
        self.sets
            .strings
            .get_or_init(|| self.values.iter().cloned().collect())
    }

    fn token_sets(&self) -> &TokenSets {
        self.sets.token_sets.get_or_init(|| TokenSets::new(&self.values))
    }

    fn match_encoded(&self, ev: &EncodedView<'_>, bm: &mut Bitmap) {
        let header = ev.header;
        let sets = &self.sets;
        match ev.typed() {
            Typed::String(values) => {
                if !ev.bloom_contains_any_set(self.token_sets(), "in") {
                    bm.reset_bits();
                    return;
                }
                let strings = self.strings();
                bm.for_each_set_bit(|i| strings.contains(&values[i]));
            }
            Typed::Dict(ids) => {
                let strings = self.strings();
                ev.match_dict(ids, bm, |v| strings.contains(v));
            }
            Typed::Uint(values) => {
                let set = parsed_set(&sets.uint, &self.values, try_parse_uint64, write_uint64);
                let range = header.min_value..=header.max_value;
                if !set.iter().any(|n| range.contains(n)) {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&values.get(i)));
            }
            Typed::Int64(values) => {
                let set = parsed_set(&sets.int64, &self.values, try_parse_int64, write_int64);
                let range = header.min_i64()..=header.max_i64();
                if !set.iter().any(|n| range.contains(n)) {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&values[i]));
            }
            Typed::Float64(values) => {
                let set = parsed_set(
                    &sets.float64,
                    &self.values,
                    |s| try_parse_float64(s).map(f64::to_bits),
                    |buf, bits| write_float64(buf, f64::from_bits(bits)),
                );
                let (min, max) = (header.min_f64(), header.max_f64());
                if !set.iter().any(|&bits| (min..=max).contains(&f64::from_bits(bits))) {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&values[i].to_bits()));
            }
            Typed::Ipv4(values) => {
                let set = parsed_set(&sets.ipv4, &self.values, try_parse_ipv4, write_ipv4);
                let range = header.min_value..=header.max_value;
                if !set.iter().any(|&ip| range.contains(&u64::from(ip))) {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&values[i]));
            }
            Typed::Iso8601(values) => {
                let set = parsed_set(
                    &sets.iso8601,
                    &self.values,
                    try_parse_timestamp_iso8601,
                    write_timestamp_iso8601,
                );
                let range = header.min_i64()..=header.max_i64();
                if !set.iter().any(|ts| range.contains(ts)) {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&values[i]));
            }
        }
    }
}

/// Canonical operands that parse into `T`, built once per cell.
fn parsed_set<'a, T: Copy + Eq + Hash>(
    cell: &'a OnceCell<HashSet<T>>,
    values: &[String],
    parse: impl Fn(&str) -> Option<T>,
    write: impl Fn(&mut String, T),
) -> &'a HashSet<T> {
    cell.get_or_init(|| {
        values
            .iter()
            .filter_map(|v| parse_canonical(v, &parse, &write))
            .collect()
    })
}

impl ColumnFilter for InFilter {
    fn field_name(&self) -> &str {
        &self.field
    }

    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap) {
        if self.values.is_empty() {
            bm.reset_bits();
            return;
        }
        match col {
            ColumnView::Missing | ColumnView::Const(_) => {
                let v = col.const_value().unwrap_or_default();
                if !self.values.iter().any(|x| x == v) {
                    bm.reset_bits();
                }
            }
            ColumnView::Time(timestamps) => {
                let set = parsed_set(
                    &self.sets.timestamps,
                    &self.values,
                    try_parse_timestamp_rfc3339_nano,
                    write_timestamp_rfc3339_nano,
                );
                if set.is_empty() {
                    bm.reset_bits();
                    return;
                }
                bm.for_each_set_bit(|i| set.contains(&timestamps[i]));
            }
            ColumnView::Encoded(ev) => self.match_encoded(ev, bm),
        }
    }
}

impl fmt::Display for InFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}in({})",
            quote_field_name_if_needed(&self.field),
            join_tokens(&self.values)
        )
    }
}
