mod controller;
mod driver;
mod encoding;
mod simulated;
mod types;

use thiserror::Error;

pub use crate::controller::DeviceController;
pub use crate::driver::{DriverMatch, VirtualDriver};
pub use crate::encoding::{
    decode_axis, decode_continuous_pov, encode_axis, encode_continuous_pov,
    AXIS_CENTER, AXIS_MAX, AXIS_MIN, POV_NEUTRAL,
};
pub use crate::simulated::{SimulatedDriver, SlotOwner, SlotSnapshot};
pub use crate::types::{
    Axis, AxisSet, Capabilities, DeviceInfo, Ownership, PovDirection, SlotId,
    SlotStatus, SLOT_COUNT,
};

/// Error type for virtual device operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The controller has not been initialized against a driver yet.
    #[error("driver not initialized")]
    NotInitialized,
    /// The driver is not installed or not enabled.
    #[error("virtual joystick driver is not enabled")]
    DriverUnavailable,
    /// The slot id is outside of the 1..=16 pool.
    #[error("invalid slot id: {0}")]
    InvalidSlot(u32),
    /// The slot is not owned by this controller.
    #[error("slot {0} is not owned by this controller")]
    NotOwned(SlotId),
    /// The slot can not be acquired in its current state.
    #[error("slot {id} is not available ({status})")]
    SlotUnavailable { id: SlotId, status: SlotStatus },
    /// The slot does not declare the axis.
    #[error("slot {id} has no {axis} axis")]
    AxisUnsupported { id: SlotId, axis: Axis },
    /// The button index is zero or above the declared button count.
    #[error("slot {id} has no button {index}")]
    ButtonOutOfRange { id: SlotId, index: u8 },
    /// The POV index is zero or above the declared POV count.
    #[error("slot {id} has no POV hat {index}")]
    PovOutOfRange { id: SlotId, index: u8 },
    /// The discrete POV direction code is not one of -1, 0, 1, 2, 3.
    #[error("invalid discrete POV direction: {0}")]
    InvalidPovDirection(i32),
    /// The driver rejected the call.
    #[error("driver rejected {op} on slot {id}")]
    Driver { id: SlotId, op: &'static str },
}

/// Convenient result alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
