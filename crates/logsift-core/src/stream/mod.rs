//! Log streams: identifiers, tag selectors and selector resolution.

mod context;
mod id;
mod index;
mod selector;

pub use context::QueryContext;
pub use id::{StreamId, TenantId};
pub use index::{MemoryStreamIndex, StreamIndex};
pub use selector::{AndStreamFilter, StreamSelector, TagFilter, TagOp};

/// Render stream tags as `{name="value",...}`.
pub fn format_stream_tags(tags: &[(String, String)]) -> String {
    let mut s = String::from("{");
    for (i, (name, value)) in tags.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        s.push_str(name);
        s.push('=');
        s.push_str(&format!("{value:?}"));
    }
    s.push('}');
    s
}
