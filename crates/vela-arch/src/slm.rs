//! Trap arrays and site addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an SLM within [`crate::Architecture::slms`].
///
/// Two sites are only comparable within the same architecture; the index
/// doubles as a stable, deterministic ordering key so that caches and
/// placement decisions never depend on allocation addresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlmId(pub usize);

/// Index of an entanglement zone within
/// [`crate::Architecture::entanglement_zones`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ZoneId(pub usize);

/// A rectangular grid of static optical traps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slm {
    /// External id from the spec, used only in output.
    pub id: u64,
    /// Separation of adjacent sites in x and y direction, in µm.
    pub site_separation: (u64, u64),
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Location of the upper-left site in the global coordinate system.
    pub location: (u64, u64),
    /// The entanglement zone this SLM belongs to, if any. `None` marks a
    /// storage SLM.
    pub entanglement_zone: Option<ZoneId>,
}

impl Slm {
    /// True if the SLM is one half of an entanglement zone pair.
    #[must_use]
    pub fn is_entanglement(&self) -> bool {
        self.entanglement_zone.is_some()
    }

    /// True if the SLM is a storage array.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.entanglement_zone.is_none()
    }

    /// The largest x-coordinate of any site in this SLM.
    #[must_use]
    pub fn max_x(&self) -> u64 {
        self.location.0 + (self.cols as u64 - 1) * self.site_separation.0
    }

    /// The largest y-coordinate of any site in this SLM.
    #[must_use]
    pub fn max_y(&self) -> u64 {
        self.location.1 + (self.rows as u64 - 1) * self.site_separation.1
    }
}

/// A movable 2D grid of tweezers used to shuttle atoms between SLM sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aod {
    /// External id from the spec.
    pub id: u64,
    /// Separation of adjacent tweezers, in µm.
    pub site_separation: u64,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

/// An unambiguous trap address: an SLM plus a grid index into it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Site {
    pub slm: SlmId,
    pub row: usize,
    pub col: usize,
}

impl Site {
    #[must_use]
    pub fn new(slm: SlmId, row: usize, col: usize) -> Self {
        Self { slm, row, col }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slm{}[{}][{}]", self.slm.0, self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_ordering_is_lexicographic() {
        let a = Site::new(SlmId(0), 1, 5);
        let b = Site::new(SlmId(0), 2, 0);
        let c = Site::new(SlmId(1), 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_slm_extent() {
        let slm = Slm {
            id: 0,
            site_separation: (3, 3),
            rows: 20,
            cols: 20,
            location: (0, 0),
            entanglement_zone: None,
        };
        assert!(slm.is_storage());
        assert_eq!(slm.max_x(), 57);
        assert_eq!(slm.max_y(), 57);
    }
}
