//! Display side: frame buffer, driver seam and the exclusive-access arbiter

pub mod arbiter;
pub mod draw;
pub mod driver;
pub mod frame;

pub use arbiter::{BusyPolicy, DisplayArbiter, DisplayError};
pub use driver::{test_pattern, DisplayDriver, FileDriver};
pub use frame::{ColorMode, Frame, FrameSpec};
