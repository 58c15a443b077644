//! Column value model: type tags, typed arrays, parsing, canonical string
//! forms and the ingestion-side encoder.

mod encoder;
pub mod format;
pub mod parse;
mod value_type;
mod values;

pub use encoder::{encode_values, encode_values_as, EncodedValues, ValuesEncoder};
pub use value_type::ValueType;
pub use values::ColumnValues;
