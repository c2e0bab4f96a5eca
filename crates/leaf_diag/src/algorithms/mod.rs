pub mod color;
pub mod masking;
pub mod extraction;
pub mod overlay;

pub use color::*;
pub use masking::*;
pub use extraction::*;
pub use overlay::*;
