//! File input: discovery, validation and decoding.
//!
//! ```text
//! Paths → FileDiscovery → Validator → ImageLoader → PixelBuffer (R8G8B8)
//! ```

mod decode;
mod discovery;
mod error;
mod validate;

pub use decode::ImageLoader;
pub use discovery::FileDiscovery;
pub use error::InputError;
pub use validate::Validator;
