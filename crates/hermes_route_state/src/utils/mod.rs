pub mod newtype_index;
pub mod time;
pub mod zip_padded;
