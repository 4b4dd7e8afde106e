//! Data model

mod record;

pub use record::Record;
