//! Placement Module
//!
//! Initial placement of newly mapped windows.

use crate::config::GeometryConfig;
use crate::shared::Geometry;
use crate::wm::moveresize::centered;

/// Initial placement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPolicy {
    /// Size given to windows that request a zero dimension
    pub default_width: u32,
    pub default_height: u32,
}

impl PlacementPolicy {
    pub fn new(config: &GeometryConfig) -> Self {
        Self {
            default_width: config.default_width,
            default_height: config.default_height,
        }
    }

    /// Decide where a window mapping with `requested` geometry goes
    ///
    /// * zero width or height: default size, centered
    /// * origin at (0, 0): requested size, centered
    /// * anything else: honored as requested
    pub fn place(&self, requested: Geometry, screen: (u32, u32)) -> Geometry {
        if requested.is_degenerate() {
            let sized = Geometry::new(0, 0, self.default_width, self.default_height);
            return centered(sized, screen);
        }

        if requested.x == 0 && requested.y == 0 {
            return centered(requested, screen);
        }

        requested
    }
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self::new(&GeometryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: (u32, u32) = (1920, 1080);

    #[test]
    fn zero_sized_windows_get_default_centered_size() {
        let policy = PlacementPolicy::default();
        for requested in [
            Geometry::new(0, 0, 0, 0),
            Geometry::new(40, 40, 0, 300),
            Geometry::new(40, 40, 300, 0),
        ] {
            assert_eq!(policy.place(requested, SCREEN), Geometry::new(560, 240, 800, 600));
        }
    }

    #[test]
    fn origin_requests_are_centered_keeping_size() {
        let policy = PlacementPolicy::default();
        let placed = policy.place(Geometry::new(0, 0, 400, 300), SCREEN);
        assert_eq!(placed, Geometry::new(760, 390, 400, 300));
    }

    #[test]
    fn explicit_positions_are_honored() {
        let policy = PlacementPolicy::default();
        let requested = Geometry::new(0, 25, 400, 300);
        assert_eq!(policy.place(requested, SCREEN), requested);
    }
}
