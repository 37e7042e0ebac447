pub mod device;
pub mod error;
pub mod mock;

pub use device::{Device, DeviceInfo, Frame};
pub use error::DeviceError;
pub use mock::MockDevice;
