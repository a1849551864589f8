use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use smallvec::{smallvec, SmallVec};

use crate::driver::{DriverMatch, VirtualDriver};
use crate::encoding::{AXIS_CENTER, POV_NEUTRAL};
use crate::types::{Axis, Capabilities, SlotId, SlotStatus};

const DEFAULT_VERSION: u16 = 0x0219;

/// Who holds a simulated slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOwner {
    Nobody,
    ThisProcess,
    OtherProcess,
}

/// Observable state of a simulated slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSnapshot {
    pub capabilities: Capabilities,
    pub owner: SlotOwner,
    pub axes: [i32; 8],
    pub buttons: Vec<bool>,
    pub discrete_povs: SmallVec<[i32; 4]>,
    pub continuous_povs: SmallVec<[i32; 4]>,
    pub resets: u32,
}

impl SlotSnapshot {
    fn new(capabilities: Capabilities, owner: SlotOwner) -> Self {
        Self {
            capabilities,
            owner,
            axes: [AXIS_CENTER; 8],
            buttons: vec![false; usize::from(capabilities.buttons)],
            discrete_povs: smallvec![POV_NEUTRAL; usize::from(capabilities.discrete_povs)],
            continuous_povs: smallvec![POV_NEUTRAL; usize::from(capabilities.continuous_povs)],
            resets: 0,
        }
    }

    pub fn axis(&self, axis: Axis) -> i32 {
        self.axes[axis.index()]
    }

    /// `index` is 1-based.
    pub fn button(&self, index: u8) -> bool {
        usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.buttons.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub fn discrete_pov(&self, index: u8) -> Option<i32> {
        slot_value(&self.discrete_povs, index)
    }

    pub fn continuous_pov(&self, index: u8) -> Option<i32> {
        slot_value(&self.continuous_povs, index)
    }

    fn neutralize(&mut self) {
        self.axes = [AXIS_CENTER; 8];
        self.buttons.iter_mut().for_each(|b| *b = false);
        self.discrete_povs.iter_mut().for_each(|p| *p = POV_NEUTRAL);
        self.continuous_povs.iter_mut().for_each(|p| *p = POV_NEUTRAL);
        self.resets += 1;
    }
}

fn slot_value(values: &[i32], index: u8) -> Option<i32> {
    usize::from(index)
        .checked_sub(1)
        .and_then(|i| values.get(i))
        .copied()
}

#[derive(Debug)]
struct SimState {
    enabled: bool,
    library_version: u16,
    driver_version: u16,
    slots: AHashMap<SlotId, SlotSnapshot>,
    stuck: Vec<SlotId>,
}

/// In-process driver that behaves like the real one without touching the OS.
///
/// Clones share state, so a test can keep a handle while a controller owns
/// another one.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    /// Enabled driver with matching versions and no slots.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                enabled: true,
                library_version: DEFAULT_VERSION,
                driver_version: DEFAULT_VERSION,
                slots: AHashMap::new(),
                stuck: Vec::new(),
            })),
        }
    }

    /// Driver that reports itself as not installed.
    pub fn disabled() -> Self {
        let driver = Self::new();
        driver.with_state(|s| s.enabled = false);
        driver
    }

    #[must_use]
    pub fn with_slot(self, id: SlotId, capabilities: Capabilities) -> Self {
        self.with_state(|s| {
            s.slots
                .insert(id, SlotSnapshot::new(capabilities, SlotOwner::Nobody));
        });
        self
    }

    /// Slot that another process already holds.
    #[must_use]
    pub fn with_foreign_slot(self, id: SlotId, capabilities: Capabilities) -> Self {
        self.with_state(|s| {
            s.slots
                .insert(id, SlotSnapshot::new(capabilities, SlotOwner::OtherProcess));
        });
        self
    }

    #[must_use]
    pub fn with_versions(self, library: u16, driver: u16) -> Self {
        self.with_state(|s| {
            s.library_version = library;
            s.driver_version = driver;
        });
        self
    }

    /// Make `relinquish` fail for `id`; the slot stays owned by this process.
    #[must_use]
    pub fn with_stuck_slot(self, id: SlotId) -> Self {
        self.with_state(|s| s.stuck.push(id));
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.with_state(|s| s.enabled = enabled);
    }

    /// Hand a slot to another process, as if it grabbed it meanwhile.
    pub fn seize(&self, id: SlotId) {
        self.with_state(|s| {
            if let Some(slot) = s.slots.get_mut(&id) {
                slot.owner = SlotOwner::OtherProcess;
            }
        });
    }

    pub fn snapshot(&self, id: SlotId) -> Option<SlotSnapshot> {
        self.with_state(|s| s.slots.get(&id).cloned())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Run `f` on a slot this process owns.
    fn with_owned(&self, id: SlotId, f: impl FnOnce(&mut SlotSnapshot) -> bool) -> bool {
        self.with_state(|s| match s.slots.get_mut(&id) {
            Some(slot) if slot.owner == SlotOwner::ThisProcess => f(slot),
            _ => false,
        })
    }
}

fn write_indexed(values: &mut [i32], index: u8, value: i32) -> bool {
    match usize::from(index).checked_sub(1).and_then(|i| values.get_mut(i)) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

impl VirtualDriver for SimulatedDriver {
    fn enabled(&self) -> bool {
        self.with_state(|s| s.enabled)
    }

    fn version(&self) -> u16 {
        self.with_state(|s| s.driver_version)
    }

    fn driver_match(&self) -> DriverMatch {
        self.with_state(|s| DriverMatch {
            library: s.library_version,
            driver: s.driver_version,
        })
    }

    fn slot_exists(&self, id: SlotId) -> bool {
        self.with_state(|s| s.slots.contains_key(&id))
    }

    fn slot_status(&self, id: SlotId) -> SlotStatus {
        self.with_state(|s| match s.slots.get(&id) {
            None => SlotStatus::Missing,
            Some(slot) => match slot.owner {
                SlotOwner::Nobody => SlotStatus::Free,
                SlotOwner::ThisProcess => SlotStatus::Own,
                SlotOwner::OtherProcess => SlotStatus::Busy,
            },
        })
    }

    fn capabilities(&self, id: SlotId) -> Capabilities {
        self.with_state(|s| {
            s.slots
                .get(&id)
                .map(|slot| slot.capabilities)
                .unwrap_or_default()
        })
    }

    fn acquire(&self, id: SlotId) -> bool {
        self.with_state(|s| match s.slots.get_mut(&id) {
            Some(slot) if slot.owner != SlotOwner::OtherProcess => {
                slot.owner = SlotOwner::ThisProcess;
                true
            }
            _ => false,
        })
    }

    fn relinquish(&self, id: SlotId) -> bool {
        self.with_state(|s| {
            if s.stuck.contains(&id) {
                return false;
            }
            match s.slots.get_mut(&id) {
                Some(slot) if slot.owner == SlotOwner::ThisProcess => {
                    slot.owner = SlotOwner::Nobody;
                    true
                }
                _ => false,
            }
        })
    }

    fn reset(&self, id: SlotId) -> bool {
        self.with_owned(id, |slot| {
            slot.neutralize();
            true
        })
    }

    fn set_axis(&self, id: SlotId, axis: Axis, value: i32) -> bool {
        self.with_owned(id, |slot| {
            if !slot.capabilities.axes.contains(axis) {
                return false;
            }
            slot.axes[axis.index()] = value;
            true
        })
    }

    fn set_button(&self, id: SlotId, button: u8, pressed: bool) -> bool {
        self.with_owned(id, |slot| {
            match usize::from(button)
                .checked_sub(1)
                .and_then(|i| slot.buttons.get_mut(i))
            {
                Some(b) => {
                    *b = pressed;
                    true
                }
                None => false,
            }
        })
    }

    fn set_discrete_pov(&self, id: SlotId, pov: u8, direction: i32) -> bool {
        self.with_owned(id, |slot| write_indexed(&mut slot.discrete_povs, pov, direction))
    }

    fn set_continuous_pov(&self, id: SlotId, pov: u8, value: i32) -> bool {
        self.with_owned(id, |slot| write_indexed(&mut slot.continuous_povs, pov, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AxisSet;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).expect("valid slot")
    }

    fn caps() -> Capabilities {
        Capabilities {
            buttons: 4,
            discrete_povs: 1,
            continuous_povs: 1,
            axes: AxisSet::new(&[Axis::X, Axis::Y]),
        }
    }

    #[test]
    fn status_follows_owner() {
        let driver = SimulatedDriver::new()
            .with_slot(slot(1), caps())
            .with_foreign_slot(slot(2), caps());

        assert_eq!(driver.slot_status(slot(1)), SlotStatus::Free);
        assert_eq!(driver.slot_status(slot(2)), SlotStatus::Busy);
        assert_eq!(driver.slot_status(slot(3)), SlotStatus::Missing);

        assert!(driver.acquire(slot(1)));
        assert_eq!(driver.slot_status(slot(1)), SlotStatus::Own);
        assert!(!driver.acquire(slot(2)));
    }

    #[test]
    fn writes_require_ownership() {
        let driver = SimulatedDriver::new().with_slot(slot(1), caps());
        assert!(!driver.set_axis(slot(1), Axis::X, 0));

        assert!(driver.acquire(slot(1)));
        assert!(driver.set_axis(slot(1), Axis::X, 0));
        assert!(!driver.set_axis(slot(1), Axis::Z, 0));
        assert!(driver.set_button(slot(1), 4, true));
        assert!(!driver.set_button(slot(1), 5, true));
        assert!(!driver.set_button(slot(1), 0, true));

        let snap = driver.snapshot(slot(1)).expect("slot exists");
        assert_eq!(snap.axis(Axis::X), 0);
        assert!(snap.button(4));
    }

    #[test]
    fn reset_neutralizes_every_control() {
        let driver = SimulatedDriver::new().with_slot(slot(1), caps());
        assert!(driver.acquire(slot(1)));
        driver.set_axis(slot(1), Axis::Y, 1);
        driver.set_button(slot(1), 1, true);
        driver.set_discrete_pov(slot(1), 1, 2);
        driver.set_continuous_pov(slot(1), 1, 9000);

        assert!(driver.reset(slot(1)));
        let snap = driver.snapshot(slot(1)).expect("slot exists");
        assert_eq!(snap.axis(Axis::Y), AXIS_CENTER);
        assert!(!snap.button(1));
        assert_eq!(snap.discrete_pov(1), Some(POV_NEUTRAL));
        assert_eq!(snap.continuous_pov(1), Some(POV_NEUTRAL));
        assert_eq!(snap.resets, 1);
    }

    #[test]
    fn stuck_slot_refuses_relinquish() {
        let driver = SimulatedDriver::new()
            .with_slot(slot(1), caps())
            .with_stuck_slot(slot(1));
        assert!(driver.acquire(slot(1)));
        assert!(!driver.relinquish(slot(1)));
        assert_eq!(driver.slot_status(slot(1)), SlotStatus::Own);
    }
}
