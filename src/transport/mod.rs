pub mod traits;
#[cfg(target_os = "linux")]
pub mod raw;

pub use traits::*;
#[cfg(target_os = "linux")]
pub use raw::*;
