//! Disk-backed swap for planned arena regions.

mod backing;
mod device;
pub mod platform;
mod preload;

pub use backing::BackingKind;
pub use device::{BufferHandle, ExecutionMode, SwapConfig, SwapDevice, SwapError};
pub use preload::{PreloadEntry, WeightId, WeightPreloadTable};
