pub mod error;
pub mod record;
pub mod value;

pub use error::{GridError, Result};
pub use record::{EntityRecord, ID_KEY, SENTINEL_ID};
pub use value::FieldValue;
