//! Column views shared by both evaluation surfaces.
//!
//! A leaf filter resolves its field to a [`ColumnView`] once per block and
//! then runs the same matching code whether the block is persisted or an
//! in-memory result. Only persisted columns carry a bloom filter.

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::bitmap::{with_scratch_buffer, Bitmap};
use crate::block::{BlockResult, BlockSearch, ColumnHeader, ResultColumnData, TIME_FIELD};
use crate::bloom::BloomFilter;
use crate::column::format::write_timestamp_rfc3339_nano;
use crate::column::ColumnValues;
use crate::config::SearchConfig;
use crate::tokenizer::{hash_tokens, tokenize};

/// A leaf filter that reads a single field.
pub(crate) trait ColumnFilter {
    fn field_name(&self) -> &str;

    /// Narrow `bm` to the rows of `col` matching the filter.
    fn apply_to_column(&self, col: &ColumnView<'_>, bm: &mut Bitmap);
}

/// One field of a block as seen by a leaf filter.
pub(crate) enum ColumnView<'a> {
    /// The field is absent; it reads as "" in every row.
    Missing,
    /// One value shared by every row.
    Const(&'a str),
    /// Row timestamps in Unix nanoseconds.
    Time(&'a [i64]),
    Encoded(EncodedView<'a>),
}

impl<'a> ColumnView<'a> {
    pub(crate) fn from_search(bs: &'a BlockSearch, name: &str) -> Self {
        if name == TIME_FIELD {
            return ColumnView::Time(bs.timestamps());
        }
        if let Some(v) = bs.const_column_value(name) {
            return if v.is_empty() {
                ColumnView::Missing
            } else {
                ColumnView::Const(v)
            };
        }
        let Some(col) = bs.column(name) else {
            return ColumnView::Missing;
        };
        let config = bs.config();
        let bloom = col
            .header
            .bloom
            .as_ref()
            .filter(|_| config.use_bloom_filters)
            .map(|filter| BloomCheck {
                filter,
                config,
                rows: bs.rows_count(),
            });
        ColumnView::Encoded(EncodedView::new(
            bs.location(),
            &col.header,
            &col.values,
            bloom,
            None,
        ))
    }

    pub(crate) fn from_result(br: &'a BlockResult, name: &str) -> Self {
        let Some(col) = br.column(name) else {
            return ColumnView::Missing;
        };
        match col.data() {
            ResultColumnData::Const(v) if v.is_empty() => ColumnView::Missing,
            ResultColumnData::Const(v) => ColumnView::Const(v),
            ResultColumnData::Time(timestamps) => ColumnView::Time(timestamps),
            ResultColumnData::Encoded(data) => ColumnView::Encoded(EncodedView::new(
                "block result",
                &data.header,
                &data.values,
                None,
                Some(col.decoded_cell()),
            )),
        }
    }

    /// The value shared by every row, if there is one.
    pub(crate) fn const_value(&self) -> Option<&'a str> {
        match self {
            ColumnView::Missing => Some(""),
            ColumnView::Const(v) => Some(v),
            ColumnView::Time(_) | ColumnView::Encoded(_) => None,
        }
    }

    /// Append the string form of row `idx` to `buf`.
    pub(crate) fn write_row(&self, idx: usize, buf: &mut String) {
        match self {
            ColumnView::Missing => {}
            ColumnView::Const(v) => buf.push_str(v),
            ColumnView::Time(timestamps) => write_timestamp_rfc3339_nano(buf, timestamps[idx]),
            ColumnView::Encoded(ev) => match ev.decoded.and_then(OnceCell::get) {
                Some(decoded) => buf.push_str(&decoded[idx]),
                None => ev.values.write_value(idx, &ev.header.dict_values, buf),
            },
        }
    }
}

/// Narrow `bm` to rows whose string form satisfies `f`.
pub(crate) fn match_strings(col: &ColumnView<'_>, bm: &mut Bitmap, f: impl Fn(&str) -> bool) {
    match col {
        ColumnView::Missing | ColumnView::Const(_) => {
            if !f(col.const_value().unwrap_or_default()) {
                bm.reset_bits();
            }
        }
        ColumnView::Time(timestamps) => match_time_strings(timestamps, bm, f),
        ColumnView::Encoded(ev) => ev.match_strings(bm, f),
    }
}

/// Narrow `bm` to rows whose RFC3339 timestamp satisfies `f`.
pub(crate) fn match_time_strings(timestamps: &[i64], bm: &mut Bitmap, f: impl Fn(&str) -> bool) {
    with_scratch_buffer(|buf| {
        bm.for_each_set_bit(|i| {
            buf.clear();
            write_timestamp_rfc3339_nano(buf, timestamps[i]);
            f(buf)
        })
    });
}

struct BloomCheck<'a> {
    filter: &'a BloomFilter,
    config: &'a SearchConfig,
    rows: usize,
}

/// An encoded column plus what is needed to match it.
pub(crate) struct EncodedView<'a> {
    pub(crate) location: &'a str,
    pub(crate) header: &'a ColumnHeader,
    pub(crate) values: &'a ColumnValues,
    bloom: Option<BloomCheck<'a>>,
    decoded: Option<&'a OnceCell<Vec<String>>>,
}

/// Per-row values of an encoded column, with the unsigned widths merged.
pub(crate) enum Typed<'a> {
    String(&'a [String]),
    Dict(&'a [u8]),
    Uint(UintValues<'a>),
    Int64(&'a [i64]),
    Float64(&'a [f64]),
    Ipv4(&'a [u32]),
    Iso8601(&'a [i64]),
}

#[derive(Clone, Copy)]
pub(crate) enum UintValues<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
    U64(&'a [u64]),
}

impl UintValues<'_> {
    #[inline]
    pub(crate) fn get(&self, idx: usize) -> u64 {
        match self {
            UintValues::U8(v) => u64::from(v[idx]),
            UintValues::U16(v) => u64::from(v[idx]),
            UintValues::U32(v) => u64::from(v[idx]),
            UintValues::U64(v) => v[idx],
        }
    }
}

impl<'a> EncodedView<'a> {
    fn new(
        location: &'a str,
        header: &'a ColumnHeader,
        values: &'a ColumnValues,
        bloom: Option<BloomCheck<'a>>,
        decoded: Option<&'a OnceCell<Vec<String>>>,
    ) -> Self {
        if header.value_type != values.value_type() {
            panic!(
                "FATAL: {location}: column {:?} declares value type {} but holds {} values",
                header.name,
                header.value_type,
                values.value_type()
            );
        }
        Self {
            location,
            header,
            values,
            bloom,
            decoded,
        }
    }

    pub(crate) fn typed(&self) -> Typed<'a> {
        match self.values {
            ColumnValues::String(v) => Typed::String(v),
            ColumnValues::Dict(v) => Typed::Dict(v),
            ColumnValues::Uint8(v) => Typed::Uint(UintValues::U8(v)),
            ColumnValues::Uint16(v) => Typed::Uint(UintValues::U16(v)),
            ColumnValues::Uint32(v) => Typed::Uint(UintValues::U32(v)),
            ColumnValues::Uint64(v) => Typed::Uint(UintValues::U64(v)),
            ColumnValues::Int64(v) => Typed::Int64(v),
            ColumnValues::Float64(v) => Typed::Float64(v),
            ColumnValues::Ipv4(v) => Typed::Ipv4(v),
            ColumnValues::TimestampIso8601(v) => Typed::Iso8601(v),
        }
    }

    /// Whether the column may hold every token in `hashes`.
    ///
    /// Always true without a bloom filter or with an empty token list.
    pub(crate) fn bloom_contains_all(&self, hashes: &[u64], filter: &'static str) -> bool {
        let Some(bloom) = &self.bloom else {
            return true;
        };
        if hashes.is_empty() || bloom.filter.contains_all(hashes) {
            return true;
        }
        self.trace_rejected(filter);
        false
    }

    /// Whether the column may hold the tokens of at least one of the values
    /// behind `sets`.
    pub(crate) fn bloom_contains_any_set(&self, sets: &TokenSets, filter: &'static str) -> bool {
        let Some(bloom) = &self.bloom else {
            return true;
        };
        if !sets.common.is_empty() && !bloom.filter.contains_all(&sets.common) {
            self.trace_rejected(filter);
            return false;
        }
        if sets.sets.is_empty()
            || !bloom.config.token_sets_worth_checking(sets.sets.len(), bloom.rows)
        {
            return true;
        }
        if bloom.filter.contains_any_set(&sets.sets) {
            return true;
        }
        self.trace_rejected(filter);
        false
    }

    fn trace_rejected(&self, filter: &'static str) {
        trace!(
            filter,
            column = %self.header.name,
            location = self.location,
            "bloom filter rejected column"
        );
    }

    /// Narrow `bm` to rows whose string form satisfies `f`.
    pub(crate) fn match_strings(&self, bm: &mut Bitmap, f: impl Fn(&str) -> bool) {
        match self.values {
            ColumnValues::String(values) => bm.for_each_set_bit(|i| f(&values[i])),
            ColumnValues::Dict(ids) => self.match_dict(ids, bm, f),
            values => {
                if let Some(decoded) = self.decoded.and_then(OnceCell::get) {
                    bm.for_each_set_bit(|i| f(&decoded[i]));
                    return;
                }
                let dict_values = &self.header.dict_values;
                with_scratch_buffer(|buf| {
                    bm.for_each_set_bit(|i| {
                        buf.clear();
                        values.write_value(i, dict_values, buf);
                        f(buf)
                    })
                });
            }
        }
    }

    /// Evaluate `f` once per dictionary entry and spread the result over the
    /// rows. Out-of-range indexes read as "".
    pub(crate) fn match_dict(&self, ids: &[u8], bm: &mut Bitmap, f: impl Fn(&str) -> bool) {
        let matched: Vec<bool> = self.header.dict_values.iter().map(|v| f(v)).collect();
        let missing = f("");
        if !missing && !matched.contains(&true) {
            bm.reset_bits();
            return;
        }
        bm.for_each_set_bit(|i| matched.get(ids[i] as usize).copied().unwrap_or(missing));
    }
}

/// Token hashes of a value list, split for the "any value" bloom check.
///
/// Tokens present in every value are `common` and must all be in the bloom
/// filter. The rest are kept per value in `sets`, where one fully present set
/// is enough. `sets` is empty when some value has no tokens beyond the common
/// ones.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenSets {
    pub(crate) common: Vec<u64>,
    pub(crate) sets: Vec<Vec<u64>>,
}

impl TokenSets {
    pub(crate) fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let per_value: Vec<Vec<String>> = values.iter().map(|v| tokenize(v.as_ref())).collect();
        let Some((first, rest)) = per_value.split_first() else {
            return Self::default();
        };
        let common: Vec<&String> = first
            .iter()
            .filter(|t| rest.iter().all(|tokens| tokens.contains(t)))
            .collect();

        let mut sets = Vec::with_capacity(per_value.len());
        for tokens in &per_value {
            let remaining: Vec<&String> = tokens.iter().filter(|t| !common.contains(t)).collect();
            if remaining.is_empty() {
                sets.clear();
                break;
            }
            sets.push(hash_tokens(&remaining));
        }
        Self {
            common: hash_tokens(&common),
            sets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::column::ValueType;
    use crate::tokenizer::hash_token;

    #[test]
    fn test_view_kinds() {
        let bs = BlockBuilder::new(vec![1, 2])
            .column("host", ["web", "web"])
            .column("msg", ["a", "b"])
            .build()
            .unwrap();
        assert!(matches!(ColumnView::from_search(&bs, "_time"), ColumnView::Time(_)));
        assert!(matches!(ColumnView::from_search(&bs, "host"), ColumnView::Const("web")));
        assert!(matches!(ColumnView::from_search(&bs, "msg"), ColumnView::Encoded(_)));
        assert!(matches!(ColumnView::from_search(&bs, "nope"), ColumnView::Missing));

        let br = BlockResult::from_block_search(&bs);
        assert!(matches!(ColumnView::from_result(&br, "_time"), ColumnView::Time(_)));
        assert!(matches!(ColumnView::from_result(&br, "host"), ColumnView::Const("web")));
        assert!(matches!(ColumnView::from_result(&br, "nope"), ColumnView::Missing));
    }

    #[test]
    fn test_match_strings_typed() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column_as("n", ["5", "17", "300"], ValueType::Uint16)
            .build()
            .unwrap();
        let col = ColumnView::from_search(&bs, "n");
        let mut bm = Bitmap::new_all_set(3);
        match_strings(&col, &mut bm, |s| s.len() > 1);
        assert_eq!(bm.to_indices(), vec![1, 2]);
    }

    #[test]
    fn test_match_dict_precomputes() {
        let bs = BlockBuilder::new(vec![1, 2, 3])
            .column("level", ["info", "warn", "info"])
            .build()
            .unwrap();
        let col = ColumnView::from_search(&bs, "level");
        let mut bm = Bitmap::new_all_set(3);
        match_strings(&col, &mut bm, |s| s == "info");
        assert_eq!(bm.to_indices(), vec![0, 2]);

        let mut bm = Bitmap::new_all_set(3);
        match_strings(&col, &mut bm, |s| s == "error");
        assert!(bm.is_zero());
    }

    #[test]
    fn test_missing_reads_empty() {
        let mut bm = Bitmap::new_all_set(4);
        match_strings(&ColumnView::Missing, &mut bm, str::is_empty);
        assert!(bm.is_all_set());
        match_strings(&ColumnView::Missing, &mut bm, |s| s == "x");
        assert!(bm.is_zero());
    }

    #[test]
    fn test_time_strings() {
        let ts = [1_000_000_000, 2_500_000_000];
        let mut bm = Bitmap::new_all_set(2);
        match_time_strings(&ts, &mut bm, |s| s.ends_with(".5Z"));
        assert_eq!(bm.to_indices(), vec![1]);
    }

    #[test]
    fn test_token_sets() {
        let sets = TokenSets::new(&["GET /api", "POST /api", "PUT /api/users"]);
        assert_eq!(sets.common, vec![hash_token("api")]);
        assert_eq!(
            sets.sets,
            vec![
                vec![hash_token("GET")],
                vec![hash_token("POST")],
                vec![hash_token("PUT"), hash_token("users")],
            ]
        );

        let sets = TokenSets::new(&["api", "GET api"]);
        assert_eq!(sets.common, vec![hash_token("api")]);
        assert!(sets.sets.is_empty());

        let sets = TokenSets::new(&["", "foo"]);
        assert!(sets.common.is_empty());
        assert!(sets.sets.is_empty());
    }

    #[test]
    fn test_bloom_checks_disabled_on_results() {
        let bs = BlockBuilder::new(vec![1, 2])
            .column("msg", ["alpha beta", "gamma"])
            .build()
            .unwrap();
        let ColumnView::Encoded(ev) = ColumnView::from_search(&bs, "msg") else {
            panic!("expected encoded column");
        };
        assert!(ev.bloom_contains_all(&[hash_token("alpha")], "test"));
        assert!(!ev.bloom_contains_all(&[hash_token("missing_token_xyz")], "test"));

        let br = BlockResult::from_block_search(&bs);
        let ColumnView::Encoded(ev) = ColumnView::from_result(&br, "msg") else {
            panic!("expected encoded column");
        };
        assert!(ev.bloom_contains_all(&[hash_token("missing_token_xyz")], "test"));
    }
}
