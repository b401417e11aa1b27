//! Image processing stages feeding the hash engine.
//!
//! - **desaturate**: RGB to 8-bit luma
//! - **resize**: coverage-filter resampling of luma buffers
//! - **transform**: 2D DCT-II into signed 32-bit coefficients

pub mod desaturate;
pub mod resize;
pub mod transform;

pub use desaturate::desaturate;
pub use resize::resize;
pub use transform::transform;
