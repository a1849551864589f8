use std::fmt;

use crate::DeviceError;

/// Number of slots a driver can expose.
pub const SLOT_COUNT: u8 = 16;

/// Identifier of a virtual device slot, always within `1..=SLOT_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    /// Returns `None` when `id` is outside of the slot pool.
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id <= SLOT_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// All slot ids in ascending order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT).map(SlotId)
    }
}

impl TryFrom<u32> for SlotId {
    type Error = DeviceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(SlotId::new)
            .ok_or(DeviceError::InvalidSlot(value))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Named axes a virtual device may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    Rx = 3,
    Ry = 4,
    Rz = 5,
    Slider0 = 6,
    Slider1 = 7,
}

impl Axis {
    pub const ALL: [Axis; 8] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Rx,
        Axis::Ry,
        Axis::Rz,
        Axis::Slider0,
        Axis::Slider1,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::Rx => "Rx",
            Axis::Ry => "Ry",
            Axis::Rz => "Rz",
            Axis::Slider0 => "Slider0",
            Axis::Slider1 => "Slider1",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of axes packed into a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisSet(u8);

impl AxisSet {
    /// Create a new set from a slice of axes.
    pub fn new(axes: &[Axis]) -> Self {
        let mut set = Self::empty();
        for axis in axes {
            set.insert(*axis);
        }
        set
    }

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(u8::MAX)
    }

    #[inline]
    pub fn contains(&self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    #[inline]
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= axis.bit();
    }

    #[inline]
    pub fn remove(&mut self, axis: Axis) {
        self.0 &= !axis.bit();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate the contained axes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

/// Controls declared by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub buttons: u8,
    pub discrete_povs: u8,
    pub continuous_povs: u8,
    pub axes: AxisSet,
}

/// Slot status as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// Owned by this process.
    Own,
    /// Exists and nobody owns it.
    Free,
    /// Owned by another process.
    Busy,
    /// Not instantiated by the driver.
    Missing,
    Unknown,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotStatus::Own => "owned",
            SlotStatus::Free => "free",
            SlotStatus::Busy => "busy",
            SlotStatus::Missing => "missing",
            SlotStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Ownership of a slot as tracked by a [`DeviceController`](crate::DeviceController).
///
/// Only `acquire` and `release` move a slot between states; everything a
/// controller has not tried to acquire stays `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ownership {
    #[default]
    Unknown,
    Free,
    OwnedByOther,
    OwnedBySelf,
    Missing,
}

impl From<SlotStatus> for Ownership {
    fn from(status: SlotStatus) -> Self {
        match status {
            SlotStatus::Own => Ownership::OwnedBySelf,
            SlotStatus::Free => Ownership::Free,
            SlotStatus::Busy => Ownership::OwnedByOther,
            SlotStatus::Missing => Ownership::Missing,
            SlotStatus::Unknown => Ownership::Unknown,
        }
    }
}

/// Snapshot of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: SlotId,
    pub exists: bool,
    pub status: SlotStatus,
    pub capabilities: Capabilities,
}

impl DeviceInfo {
    /// Record used for slots the driver did not instantiate.
    pub fn missing(id: SlotId) -> Self {
        Self {
            id,
            exists: false,
            status: SlotStatus::Missing,
            capabilities: Capabilities::default(),
        }
    }
}

/// Direction of a discrete (4-way) POV hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PovDirection {
    Neutral,
    North,
    East,
    South,
    West,
}

impl PovDirection {
    /// Wire code: -1 for neutral, 0..=3 clockwise from north.
    pub const fn code(self) -> i32 {
        match self {
            PovDirection::Neutral => -1,
            PovDirection::North => 0,
            PovDirection::East => 1,
            PovDirection::South => 2,
            PovDirection::West => 3,
        }
    }
}

impl TryFrom<i32> for PovDirection {
    type Error = DeviceError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Ok(match code {
            -1 => PovDirection::Neutral,
            0 => PovDirection::North,
            1 => PovDirection::East,
            2 => PovDirection::South,
            3 => PovDirection::West,
            other => return Err(DeviceError::InvalidPovDirection(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_display_honors_width() {
        let id = SlotId::new(3).expect("valid slot");
        assert_eq!(format!("{id}"), "3");
        assert_eq!(format!("{id:>2}"), " 3");
        assert_eq!(format!("{id:<3}|"), "3  |");
    }

    #[test]
    fn slot_id_rejects_values_outside_pool() {
        assert!(SlotId::new(0).is_none());
        assert!(SlotId::new(17).is_none());
        assert_eq!(SlotId::new(16).map(SlotId::get), Some(16));
        assert_eq!(SlotId::try_from(300u32), Err(DeviceError::InvalidSlot(300)));
    }

    #[test]
    fn slot_ids_iterate_ascending() {
        let ids: Vec<u8> = SlotId::all().map(SlotId::get).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn axis_set_insert_and_remove_toggle_bits() {
        let mut set = AxisSet::empty();
        assert!(set.is_empty());

        set.insert(Axis::X);
        set.insert(Axis::Slider1);
        assert!(set.contains(Axis::X));
        assert!(set.contains(Axis::Slider1));
        assert!(!set.contains(Axis::Y));
        assert_eq!(set.count(), 2);

        set.remove(Axis::X);
        assert!(!set.contains(Axis::X));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Axis::Slider1]);
    }

    #[test]
    fn axis_set_all_contains_every_axis() {
        let all = AxisSet::all();
        assert!(Axis::ALL.iter().all(|a| all.contains(*a)));
        assert_eq!(all.count(), 8);
    }

    #[test]
    fn pov_direction_codes_round_trip() {
        for code in -1..=3 {
            let dir = PovDirection::try_from(code).expect("valid code");
            assert_eq!(dir.code(), code);
        }
        assert_eq!(
            PovDirection::try_from(4),
            Err(DeviceError::InvalidPovDirection(4))
        );
    }

    #[test]
    fn driver_status_maps_to_ownership() {
        assert_eq!(Ownership::from(SlotStatus::Busy), Ownership::OwnedByOther);
        assert_eq!(Ownership::from(SlotStatus::Own), Ownership::OwnedBySelf);
        assert_eq!(Ownership::default(), Ownership::Unknown);
    }
}
