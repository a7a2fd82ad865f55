//! Input handling for submitted sites and fetched pages.
//!
//! - URL validation and scheme+host normalization (`address`)
//! - Title / first heading / meta description extraction (`extract`)

pub mod address;
pub mod extract;

pub use address::{MAX_URL_LEN, URL_FIELD, UrlError, ValidationErrors, normalize, validate};
pub use extract::{PageMeta, extract};
