pub mod canonical;
pub mod digest;
pub mod source;
pub mod splitter;

pub use canonical::get_canonical_query;
