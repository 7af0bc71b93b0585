use core::fmt;
use core::num::NonZeroU32;

/// Slot handle into a network arena (quantities, elements).
///
/// Stored off-by-one in a `NonZeroU32` so `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Handle for the 0-based arena index `index`.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Handle for a `usize` arena slot.
    pub fn from_slot(slot: usize) -> Self {
        Self::from_index(slot as u32)
    }

    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Arena slot this handle points at.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Column of a quantity in the network registry.
pub type QuantityId = Id;
/// Registered element (compartment, valve, chamber).
pub type ElementId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_survive_the_offset() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
            assert_eq!(Id::from_slot(i as usize).slot(), i as usize);
        }
    }

    #[test]
    fn optional_handle_has_no_overhead() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
