use crate::types::{Axis, Capabilities, SlotId, SlotStatus};

/// Library and driver versions reported during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverMatch {
    pub library: u16,
    pub driver: u16,
}

impl DriverMatch {
    pub fn is_match(&self) -> bool {
        self.library == self.driver
    }
}

/// Capability interface of a virtual joystick driver.
///
/// Values passed to the setters are already in wire format (see
/// [`encoding`](crate::encode_axis)). Every call returns whether the driver
/// accepted it; none of them may panic.
pub trait VirtualDriver {
    /// Whether the driver is installed and enabled.
    fn enabled(&self) -> bool;
    /// Driver version.
    fn version(&self) -> u16;
    fn driver_match(&self) -> DriverMatch;

    fn slot_exists(&self, id: SlotId) -> bool;
    fn slot_status(&self, id: SlotId) -> SlotStatus;
    fn capabilities(&self, id: SlotId) -> Capabilities;

    fn acquire(&self, id: SlotId) -> bool;
    fn relinquish(&self, id: SlotId) -> bool;
    /// Return every control on the slot to neutral.
    fn reset(&self, id: SlotId) -> bool;

    fn set_axis(&self, id: SlotId, axis: Axis, value: i32) -> bool;
    /// `button` is 1-based.
    fn set_button(&self, id: SlotId, button: u8, pressed: bool) -> bool;
    fn set_discrete_pov(&self, id: SlotId, pov: u8, direction: i32) -> bool;
    /// `value` is hundredths of a degree, or -1 for neutral.
    fn set_continuous_pov(&self, id: SlotId, pov: u8, value: i32) -> bool;
}
