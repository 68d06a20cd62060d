//! Coordinate types used to address cells on a [`crate::grid::Grid`].
//!
//! Lines grow downward from the top of the active viewport (`Line(0)`);
//! scrollback history sits at negative line numbers. Columns grow rightward
//! from `Column(0)`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Range, Sub, SubAssign};

use crate::grid::Dimensions;

/// Column index, growing rightward from zero.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(pub usize);

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for Column {
    fn from(value: usize) -> Self {
        Column(value)
    }
}

impl Add<usize> for Column {
    type Output = Column;

    fn add(self, rhs: usize) -> Column {
        Column(self.0 + rhs)
    }
}

impl AddAssign<usize> for Column {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}

impl Sub<usize> for Column {
    type Output = Column;

    fn sub(self, rhs: usize) -> Column {
        Column(self.0.saturating_sub(rhs))
    }
}

impl SubAssign<usize> for Column {
    fn sub_assign(&mut self, rhs: usize) {
        self.0 = self.0.saturating_sub(rhs);
    }
}

impl Sub<Column> for Column {
    type Output = Column;

    fn sub(self, rhs: Column) -> Column {
        Column(self.0.saturating_sub(rhs.0))
    }
}

impl PartialEq<usize> for Column {
    fn eq(&self, other: &usize) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<usize> for Column {
    fn partial_cmp(&self, other: &usize) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

/// Line index, growing downward. Negative values address scrollback history.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(pub i32);

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Line {
    fn from(value: i32) -> Self {
        Line(value)
    }
}

impl Add<usize> for Line {
    type Output = Line;

    fn add(self, rhs: usize) -> Line {
        Line(self.0 + rhs as i32)
    }
}

impl AddAssign<usize> for Line {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs as i32;
    }
}

impl Sub<usize> for Line {
    type Output = Line;

    fn sub(self, rhs: usize) -> Line {
        Line(self.0 - rhs as i32)
    }
}

impl SubAssign<usize> for Line {
    fn sub_assign(&mut self, rhs: usize) {
        self.0 -= rhs as i32;
    }
}

impl Add<i32> for Line {
    type Output = Line;

    fn add(self, rhs: i32) -> Line {
        Line(self.0 + rhs)
    }
}

impl Sub<i32> for Line {
    type Output = Line;

    fn sub(self, rhs: i32) -> Line {
        Line(self.0 - rhs)
    }
}

impl Sub<Line> for Line {
    type Output = Line;

    fn sub(self, rhs: Line) -> Line {
        Line(self.0 - rhs.0)
    }
}

/// A location on the grid, generic over the line representation.
///
/// [`Surface`](crate::Surface) addresses cells with `Point<Line>` (absolute
/// coordinates, reaching into scrollback history at negative lines), while
/// viewport-relative code (damage tracking, hyperlink lookup) uses
/// `Point<usize>` instead.
#[derive(Debug, Copy, Clone, Default, Hash)]
pub struct Point<L = Line> {
    pub line: L,
    pub column: Column,
}

impl<L> Point<L> {
    pub fn new(line: L, column: Column) -> Point<L> {
        Point { line, column }
    }
}

impl<L: PartialEq> PartialEq for Point<L> {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.column == other.column
    }
}

impl<L: Eq> Eq for Point<L> {}

impl<L: PartialOrd> PartialOrd for Point<L> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.line.partial_cmp(&other.line) {
            Some(Ordering::Equal) => self.column.partial_cmp(&other.column),
            other => other,
        }
    }
}

impl<L: Ord> Ord for Point<L> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.line.cmp(&other.line) {
            Ordering::Equal => self.column.cmp(&other.column),
            ord => ord,
        }
    }
}

/// Side of a cell a selection anchor or match boundary refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Horizontal direction used by cursor movement, expansion and search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// How a [`Point`] arithmetic operation should treat the edge of the grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Stop at the edge of the allocated grid (including scrollback).
    Grid,
    /// Wrap around, treating the grid as a torus.
    None,
}

/// Clamp a [`Line`] into the range addressable by a grid of the given
/// dimensions.
pub trait GridClamp {
    fn grid_clamp<D: Dimensions>(self, dimensions: &D, boundary: Boundary) -> Self;
}

impl GridClamp for Line {
    fn grid_clamp<D: Dimensions>(self, dimensions: &D, boundary: Boundary) -> Self {
        let screen_lines = dimensions.screen_lines() as i32;
        let topmost = -(dimensions.history_size() as i32);

        match boundary {
            Boundary::Grid => Line(self.0.clamp(topmost, screen_lines - 1)),
            Boundary::None => {
                let total = screen_lines - topmost;
                Line(((self.0 - topmost).rem_euclid(total)) + topmost)
            },
        }
    }
}

impl Point {
    /// Add `rhs` cells to this point, honoring `boundary` at the grid edge.
    pub fn add<D: Dimensions>(
        self,
        dimensions: &D,
        boundary: Boundary,
        rhs: usize,
    ) -> Point {
        let columns = dimensions.columns();
        let line_delta = (self.column.0 + rhs) / columns;
        let column = Column((self.column.0 + rhs) % columns);
        let line = (self.line + line_delta).grid_clamp(dimensions, boundary);

        Point::new(line, column)
    }

    /// Subtract `rhs` cells from this point, honoring `boundary` at the grid
    /// edge.
    pub fn sub<D: Dimensions>(
        self,
        dimensions: &D,
        boundary: Boundary,
        rhs: usize,
    ) -> Point {
        let columns = dimensions.columns();
        let total = self.line.0 as i64 * columns as i64 + self.column.0 as i64;
        let total = total - rhs as i64;

        let line = Line((total.div_euclid(columns as i64)) as i32);
        let column = Column(total.rem_euclid(columns as i64) as usize);

        Point::new(line.grid_clamp(dimensions, boundary), column)
    }
}

/// Inclusive range of lines, used for scroll-region rotation bookkeeping.
pub type LineRange = Range<Line>;
