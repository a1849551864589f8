use ahash::AHashMap;
use smallvec::SmallVec;

use crate::driver::{DriverMatch, VirtualDriver};
use crate::encoding::{encode_axis, encode_continuous_pov};
use crate::types::{
    Axis, Capabilities, DeviceInfo, Ownership, PovDirection, SlotId, SlotStatus,
    SLOT_COUNT,
};
use crate::{DeviceError, Result};

type SlotList<T> = SmallVec<[T; SLOT_COUNT as usize]>;

#[derive(Debug, Clone, Copy)]
struct SlotEntry {
    ownership: Ownership,
    capabilities: Capabilities,
}

/// Owns slots of a [`VirtualDriver`] and writes normalized control values to them.
///
/// Not synchronized: bind one controller to one input thread. Every slot
/// still owned when the controller is dropped gets released.
pub struct DeviceController<D: VirtualDriver> {
    driver: D,
    initialized: bool,
    slots: AHashMap<SlotId, SlotEntry>,
}

impl<D: VirtualDriver> DeviceController<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            initialized: false,
            slots: AHashMap::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Probe the driver. Repeated calls after a success are no-ops.
    ///
    /// A library/driver version mismatch is logged and tolerated.
    pub fn initialize(&mut self) -> Result<DriverMatch> {
        let versions = self.driver.driver_match();
        if self.initialized {
            return Ok(versions);
        }
        if !self.driver.enabled() {
            log::error!("virtual joystick driver is not enabled");
            return Err(DeviceError::DriverUnavailable);
        }

        log::info!(
            "virtual joystick driver enabled, version {:#06x}",
            self.driver.version()
        );
        if !versions.is_match() {
            log::warn!(
                "driver version mismatch: library {:#06x}, driver {:#06x}",
                versions.library,
                versions.driver
            );
        }
        self.initialized = true;
        Ok(versions)
    }

    /// Existing slots in ascending order. Empty until initialized.
    pub fn enumerate_devices(&self) -> SlotList<DeviceInfo> {
        if !self.initialized {
            log::debug!("enumerate_devices called before initialize");
            return SlotList::new();
        }
        SlotId::all()
            .filter(|id| self.driver.slot_exists(*id))
            .map(|id| self.get_device_info(id))
            .collect()
    }

    pub fn get_device_info(&self, id: SlotId) -> DeviceInfo {
        if !self.driver.slot_exists(id) {
            return DeviceInfo::missing(id);
        }
        DeviceInfo {
            id,
            exists: true,
            status: self.driver.slot_status(id),
            capabilities: self.driver.capabilities(id),
        }
    }

    /// Ownership of `id` as last observed by this controller.
    pub fn ownership(&self, id: SlotId) -> Ownership {
        self.slots
            .get(&id)
            .map(|e| e.ownership)
            .unwrap_or_default()
    }

    pub fn is_owned(&self, id: SlotId) -> bool {
        self.ownership(id) == Ownership::OwnedBySelf
    }

    /// Slots owned by this controller, ascending.
    pub fn owned(&self) -> SlotList<SlotId> {
        let mut ids: SlotList<SlotId> = self
            .slots
            .iter()
            .filter(|(_, e)| e.ownership == Ownership::OwnedBySelf)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Take exclusive write access to a slot.
    ///
    /// Succeeds without side effects when the slot is already owned. A slot
    /// acquired from the free state is reset to neutral right away.
    pub fn acquire(&mut self, id: SlotId) -> Result<()> {
        if !self.initialized {
            return Err(DeviceError::NotInitialized);
        }
        if self.is_owned(id) {
            return Ok(());
        }

        let status = self.driver.slot_status(id);
        match status {
            SlotStatus::Own => {
                log::debug!("slot {id} already held by this process, adopting it");
            }
            SlotStatus::Free => {
                if !self.driver.acquire(id) {
                    self.observe(id, Ownership::Free);
                    log::warn!("driver refused to acquire slot {id}");
                    return Err(DeviceError::Driver { id, op: "acquire" });
                }
                if !self.driver.reset(id) {
                    log::warn!("failed to reset slot {id} after acquiring it");
                }
            }
            other => {
                self.observe(id, other.into());
                log::warn!("cannot acquire slot {id}: {other}");
                return Err(DeviceError::SlotUnavailable { id, status: other });
            }
        }

        let capabilities = self.driver.capabilities(id);
        self.slots.insert(
            id,
            SlotEntry {
                ownership: Ownership::OwnedBySelf,
                capabilities,
            },
        );
        log::info!("acquired slot {id}");
        Ok(())
    }

    /// Give up a slot. Does nothing if this controller does not own it.
    ///
    /// The slot is recorded as `Free` even when the driver refuses to
    /// relinquish it, so writes through this controller stop either way. A
    /// later `acquire` adopts the slot if the driver still reports it as ours.
    pub fn release(&mut self, id: SlotId) {
        if !self.is_owned(id) {
            return;
        }
        if !self.driver.relinquish(id) {
            log::warn!("driver failed to relinquish slot {id}");
        }
        self.observe(id, Ownership::Free);
        log::info!("released slot {id}");
    }

    /// Release every owned slot, continuing past individual failures.
    pub fn release_all(&mut self) {
        for id in self.owned() {
            self.release(id);
        }
    }

    pub fn set_axis(&self, id: SlotId, axis: Axis, value: f32) -> Result<()> {
        let caps = self.owned_capabilities(id)?;
        if !caps.axes.contains(axis) {
            return Err(DeviceError::AxisUnsupported { id, axis });
        }
        let raw = encode_axis(value);
        self.accepted(id, "set_axis", self.driver.set_axis(id, axis, raw))
    }

    /// `index` is 1-based.
    pub fn set_button(&self, id: SlotId, index: u8, pressed: bool) -> Result<()> {
        let caps = self.owned_capabilities(id)?;
        if index == 0 || index > caps.buttons {
            return Err(DeviceError::ButtonOutOfRange { id, index });
        }
        self.accepted(
            id,
            "set_button",
            self.driver.set_button(id, index, pressed),
        )
    }

    /// `pov` is 1-based.
    pub fn set_discrete_pov(
        &self,
        id: SlotId,
        pov: u8,
        direction: PovDirection,
    ) -> Result<()> {
        let caps = self.owned_capabilities(id)?;
        if pov == 0 || pov > caps.discrete_povs {
            return Err(DeviceError::PovOutOfRange { id, index: pov });
        }
        self.accepted(
            id,
            "set_discrete_pov",
            self.driver.set_discrete_pov(id, pov, direction.code()),
        )
    }

    /// `pov` is 1-based; a negative angle centers the hat.
    pub fn set_continuous_pov(
        &self,
        id: SlotId,
        pov: u8,
        angle_degrees: f32,
    ) -> Result<()> {
        let caps = self.owned_capabilities(id)?;
        if pov == 0 || pov > caps.continuous_povs {
            return Err(DeviceError::PovOutOfRange { id, index: pov });
        }
        let raw = encode_continuous_pov(angle_degrees);
        self.accepted(
            id,
            "set_continuous_pov",
            self.driver.set_continuous_pov(id, pov, raw),
        )
    }

    pub fn reset(&self, id: SlotId) -> Result<()> {
        self.owned_capabilities(id)?;
        self.accepted(id, "reset", self.driver.reset(id))
    }

    fn owned_capabilities(&self, id: SlotId) -> Result<Capabilities> {
        match self.slots.get(&id) {
            Some(entry) if entry.ownership == Ownership::OwnedBySelf => {
                Ok(entry.capabilities)
            }
            _ => Err(DeviceError::NotOwned(id)),
        }
    }

    fn observe(&mut self, id: SlotId, ownership: Ownership) {
        let entry = self.slots.entry(id).or_insert(SlotEntry {
            ownership,
            capabilities: Capabilities::default(),
        });
        entry.ownership = ownership;
    }

    fn accepted(&self, id: SlotId, op: &'static str, ok: bool) -> Result<()> {
        if ok {
            Ok(())
        } else {
            log::debug!("driver rejected {op} on slot {id}");
            Err(DeviceError::Driver { id, op })
        }
    }
}

impl<D: VirtualDriver> Drop for DeviceController<D> {
    fn drop(&mut self) {
        self.release_all();
    }
}
