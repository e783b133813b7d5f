use std::fmt;

/// Work pending on one tile slot.
///
/// A slot cycles `NEEDS_COMPUTE -> (in flight) -> NEEDS_DRAW -> idle`. The
/// compute bit is cleared when the tile is handed to a compute task; while
/// the task runs the slot holds no tile, so nothing can dispatch it twice.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileStatus(u8);

impl TileStatus {
    pub const IDLE: Self = Self(0);
    pub const NEEDS_COMPUTE: Self = Self(0x1);
    pub const NEEDS_DRAW: Self = Self(0x2);

    /// Status of every slot in a freshly built map.
    pub const INIT: Self = Self::NEEDS_COMPUTE;

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_idle(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.contains(Self::NEEDS_COMPUTE),
            self.contains(Self::NEEDS_DRAW),
        ) {
            (false, false) => write!(f, "TileStatus(IDLE)"),
            (true, false) => write!(f, "TileStatus(NEEDS_COMPUTE)"),
            (false, true) => write!(f, "TileStatus(NEEDS_DRAW)"),
            (true, true) => write!(f, "TileStatus(NEEDS_COMPUTE | NEEDS_DRAW)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_needs_compute() {
        assert!(TileStatus::INIT.contains(TileStatus::NEEDS_COMPUTE));
        assert!(!TileStatus::INIT.contains(TileStatus::NEEDS_DRAW));
    }

    #[test]
    fn insert_and_remove_bits() {
        let mut status = TileStatus::IDLE;
        assert!(status.is_idle());

        status.insert(TileStatus::NEEDS_DRAW);
        assert!(status.contains(TileStatus::NEEDS_DRAW));
        assert!(!status.is_idle());

        status.insert(TileStatus::NEEDS_COMPUTE);
        assert_eq!(status.bits(), 0x3);

        status.remove(TileStatus::NEEDS_DRAW);
        assert_eq!(status, TileStatus::NEEDS_COMPUTE);

        status.remove(TileStatus::NEEDS_COMPUTE);
        assert!(status.is_idle());
    }

    #[test]
    fn debug_names_bits() {
        assert_eq!(format!("{:?}", TileStatus::NEEDS_DRAW), "TileStatus(NEEDS_DRAW)");
        assert_eq!(format!("{:?}", TileStatus::IDLE), "TileStatus(IDLE)");
    }
}
