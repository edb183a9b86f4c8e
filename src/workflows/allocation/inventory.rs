use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::FlatType;

/// Names one of the three bounded counters a project carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCounter {
    Units(FlatType),
    StaffSlots,
}

impl fmt::Display for InventoryCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryCounter::Units(flat_type) => write!(f, "{} units", flat_type.label()),
            InventoryCounter::StaffSlots => f.write_str("staff slots"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    available: u32,
    capacity: u32,
}

impl Counter {
    pub const fn full(capacity: u32) -> Self {
        Self {
            available: capacity,
            capacity,
        }
    }

    pub const fn available(&self) -> u32 {
        self.available
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Raised when a counter would leave `[0, capacity]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("{counter} cannot drop below zero")]
    Negative { counter: InventoryCounter },
    #[error("{counter} already at capacity {capacity}")]
    OverRelease {
        counter: InventoryCounter,
        capacity: u32,
    },
    #[error("{counter} has {available} available but capacity {capacity}")]
    Inconsistent {
        counter: InventoryCounter,
        available: u32,
        capacity: u32,
    },
}

/// Per-project unit and staff-slot counters.
///
/// Counters only move one step at a time through [`ProjectInventory::decrement`] and
/// [`ProjectInventory::increment`], which refuse to leave the `[0, capacity]` range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInventory {
    two_room: Counter,
    three_room: Counter,
    staff_slots: Counter,
}

impl ProjectInventory {
    pub const fn new(two_room_units: u32, three_room_units: u32, staff_slots: u32) -> Self {
        Self {
            two_room: Counter::full(two_room_units),
            three_room: Counter::full(three_room_units),
            staff_slots: Counter::full(staff_slots),
        }
    }

    /// Rebuild an inventory from persisted `(available, capacity)` pairs.
    pub fn restore(
        two_room: (u32, u32),
        three_room: (u32, u32),
        staff_slots: (u32, u32),
    ) -> Result<Self, InventoryError> {
        let build = |counter: InventoryCounter, (available, capacity): (u32, u32)| {
            if available > capacity {
                Err(InventoryError::Inconsistent {
                    counter,
                    available,
                    capacity,
                })
            } else {
                Ok(Counter {
                    available,
                    capacity,
                })
            }
        };

        Ok(Self {
            two_room: build(InventoryCounter::Units(FlatType::TwoRoom), two_room)?,
            three_room: build(InventoryCounter::Units(FlatType::ThreeRoom), three_room)?,
            staff_slots: build(InventoryCounter::StaffSlots, staff_slots)?,
        })
    }

    pub fn counter(&self, counter: InventoryCounter) -> Counter {
        match counter {
            InventoryCounter::Units(FlatType::TwoRoom) => self.two_room,
            InventoryCounter::Units(FlatType::ThreeRoom) => self.three_room,
            InventoryCounter::StaffSlots => self.staff_slots,
        }
    }

    fn counter_mut(&mut self, counter: InventoryCounter) -> &mut Counter {
        match counter {
            InventoryCounter::Units(FlatType::TwoRoom) => &mut self.two_room,
            InventoryCounter::Units(FlatType::ThreeRoom) => &mut self.three_room,
            InventoryCounter::StaffSlots => &mut self.staff_slots,
        }
    }

    pub fn available(&self, counter: InventoryCounter) -> u32 {
        self.counter(counter).available
    }

    pub fn units_available(&self, flat_type: FlatType) -> u32 {
        self.available(InventoryCounter::Units(flat_type))
    }

    pub fn staff_slots(&self) -> u32 {
        self.available(InventoryCounter::StaffSlots)
    }

    /// Take one from `counter`, returning the remaining count.
    pub fn decrement(&mut self, counter: InventoryCounter) -> Result<u32, InventoryError> {
        let slot = self.counter_mut(counter);
        slot.available = slot
            .available
            .checked_sub(1)
            .ok_or(InventoryError::Negative { counter })?;
        Ok(slot.available)
    }

    /// Return one to `counter`, returning the new count.
    pub fn increment(&mut self, counter: InventoryCounter) -> Result<u32, InventoryError> {
        let slot = self.counter_mut(counter);
        if slot.available >= slot.capacity {
            return Err(InventoryError::OverRelease {
                counter,
                capacity: slot.capacity,
            });
        }
        slot.available += 1;
        Ok(slot.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROOM: InventoryCounter = InventoryCounter::Units(FlatType::TwoRoom);
    const THREE_ROOM: InventoryCounter = InventoryCounter::Units(FlatType::ThreeRoom);

    #[test]
    fn counters_are_independent() {
        let mut inventory = ProjectInventory::new(2, 1, 3);

        assert_eq!(inventory.decrement(TWO_ROOM), Ok(1));
        assert_eq!(inventory.units_available(FlatType::ThreeRoom), 1);
        assert_eq!(inventory.staff_slots(), 3);
    }

    #[test]
    fn decrement_stops_at_zero_without_mutation() {
        let mut inventory = ProjectInventory::new(0, 1, 0);

        assert_eq!(
            inventory.decrement(TWO_ROOM),
            Err(InventoryError::Negative { counter: TWO_ROOM })
        );
        assert_eq!(
            inventory.decrement(InventoryCounter::StaffSlots),
            Err(InventoryError::Negative {
                counter: InventoryCounter::StaffSlots
            })
        );
        assert_eq!(inventory, ProjectInventory::new(0, 1, 0));
    }

    #[test]
    fn increment_refuses_to_exceed_capacity() {
        let mut inventory = ProjectInventory::new(1, 1, 1);

        assert_eq!(
            inventory.increment(THREE_ROOM),
            Err(InventoryError::OverRelease {
                counter: THREE_ROOM,
                capacity: 1
            })
        );

        inventory.decrement(THREE_ROOM).expect("one unit to take");
        assert_eq!(inventory.increment(THREE_ROOM), Ok(1));
        assert!(inventory.increment(THREE_ROOM).is_err());
        assert_eq!(inventory.counter(THREE_ROOM).capacity(), 1);
    }

    #[test]
    fn restore_rejects_available_above_capacity() {
        let err = ProjectInventory::restore((3, 2), (0, 0), (1, 1)).expect_err("invalid counts");
        assert_eq!(
            err,
            InventoryError::Inconsistent {
                counter: TWO_ROOM,
                available: 3,
                capacity: 2
            }
        );

        let restored = ProjectInventory::restore((1, 2), (0, 4), (0, 1)).expect("valid counts");
        assert_eq!(restored.units_available(FlatType::TwoRoom), 1);
        assert_eq!(restored.counter(THREE_ROOM).capacity(), 4);
        assert_eq!(restored.staff_slots(), 0);
    }
}
