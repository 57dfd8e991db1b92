pub mod intrinsics;
pub mod orientation;

pub use intrinsics::Intrinsics;
pub use orientation::{apply_to_image, remap_intrinsics, Orientation};
