//! The board record the host hands to a plugin: dimensions, grid, ground
//! plane flags, and the parsed element tree.

use core::fmt::Write as _;

use bitflags::bitflags;
use itertools::Itertools;

use crate::element::Element;
use crate::primitives::{size_valid, write_dist, Dist, Format, Point};

bitflags! {
    /// Ground plane and stackup flags of the board.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BoardFlags: u32 {
        /// Ground plane enabled on the top copper layer.
        const PLANE_TOP = 1 << 0;
        /// Ground plane enabled on the bottom copper layer.
        const PLANE_BOTTOM = 1 << 1;
        /// Ground plane enabled on the first inner copper layer.
        const PLANE_INNER1 = 1 << 2;
        /// Ground plane enabled on the second inner copper layer.
        const PLANE_INNER2 = 1 << 3;
        /// The board has four instead of two layers.
        const MULTILAYER = 1 << 4;
    }
}

impl BoardFlags {
    /// Human readable flag list for diagnostics, `|`-joined.
    pub fn describe(self) -> String {
        if self.is_empty() {
            return "none".to_owned();
        }
        [
            (BoardFlags::PLANE_TOP, "top fill"),
            (BoardFlags::PLANE_BOTTOM, "bottom fill"),
            (BoardFlags::PLANE_INNER1, "inner fill 1"),
            (BoardFlags::PLANE_INNER2, "inner fill 2"),
            (BoardFlags::MULTILAYER, "multilayer"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .join("|")
    }
}

/// The snap grid of the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    /// Where the grid is anchored.
    pub origin: Point,
    /// Horizontal grid pitch.
    pub width: Dist,
    /// Vertical grid pitch.
    pub height: Dist,
}

impl Grid {
    /// Creates a grid from its origin and pitch.
    pub fn new(origin: Point, width: Dist, height: Dist) -> Grid {
        Grid {
            origin,
            width,
            height,
        }
    }

    /// Whether origin and pitch are within range.
    pub fn valid(&self) -> bool {
        self.origin.valid() && size_valid(self.width) && size_valid(self.height)
    }
}

/// The board a plugin operates on.
///
/// Populated from the host command line flags and the parsed input file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board {
    /// Board width.
    pub width: Dist,
    /// Board height.
    pub height: Dist,
    /// The snap grid.
    pub grid: Grid,
    /// Ground plane and stackup flags.
    pub flags: BoardFlags,
    /// The parsed top-level elements, in input order.
    pub elements: Vec<Element>,
    /// Whether malformed elements were discarded while parsing the input.
    pub salvaged: bool,
}

impl Board {
    /// Whether the board metadata is within range.
    pub fn valid(&self) -> bool {
        size_valid(self.width) && size_valid(self.height) && self.grid.valid()
    }

    /// One-line cooked self-description for diagnostics.
    pub fn describe(&self) -> String {
        let mut out = String::from("board{width=");
        write_dist(&mut out, self.width, Format::cooked());
        out.push_str(", height=");
        write_dist(&mut out, self.height, Format::cooked());
        out.push_str(", grid=");
        write_dist(&mut out, self.grid.width, Format::cooked());
        out.push('/');
        write_dist(&mut out, self.grid.height, Format::cooked());
        out.push_str(", flags=");
        out.push_str(&self.flags.describe());
        let _ = write!(out, ", elements={}}}", self.elements.len());
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_describe() {
        assert_eq!(BoardFlags::empty().describe(), "none");
        assert_eq!(
            (BoardFlags::PLANE_TOP | BoardFlags::MULTILAYER).describe(),
            "top fill|multilayer"
        );
    }

    #[test]
    fn flags_from_bits() {
        let flags = BoardFlags::from_bits_truncate(0b1_0011);
        assert!(flags.contains(BoardFlags::PLANE_TOP));
        assert!(flags.contains(BoardFlags::PLANE_BOTTOM));
        assert!(flags.contains(BoardFlags::MULTILAYER));
        assert!(!flags.contains(BoardFlags::PLANE_INNER1));
    }

    #[test]
    fn board_describe() {
        let board = Board {
            width: 100_000,
            height: 80_000,
            grid: Grid::new(Point::new(0, 0), 12_700, 12_700),
            flags: BoardFlags::PLANE_TOP,
            elements: vec![],
            salvaged: false,
        };
        assert_eq!(
            board.describe(),
            "board{width=10.0000mm, height=8.0000mm, grid=1.2700mm/1.2700mm, flags=top fill, elements=0}"
        );
    }
}
