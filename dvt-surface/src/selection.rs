//! Text selection on a [`crate::Surface`].
//!
//! A [`Selection`] is a pair of [`Anchor`]s: `region.start` is where the
//! selection began, `region.end` tracks the pointer as it moves. Resolving a
//! selection into grid coordinates is deferred to [`Selection::to_range`],
//! since the answer depends on the selection type (simple drag, double-click
//! word, triple-click line, or column block) and on live grid content for the
//! semantic and line variants.

use std::cmp::{max, min};
use std::mem;
use std::ops::{Bound, Range, RangeBounds};

use crate::grid::Dimensions;
use crate::index::{Boundary, Column, Line, Point, Side};
use crate::surface::Surface;

/// How the two endpoints of a [`Selection`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionType {
    /// Plain left-to-right, top-to-bottom drag selection.
    Simple,
    /// Rectangular selection, independent per line.
    Block,
    /// Word (or bracket-pair) selection, as produced by a double-click.
    Semantic,
    /// Whole-line selection, as produced by a triple-click.
    Lines,
}

/// One endpoint of a [`Selection`].
///
/// `side` disambiguates which half of `point`'s cell the endpoint refers to,
/// so that a drag which never leaves a single cell can still distinguish
/// "selected nothing yet" from "selected this cell".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    point: Point,
    side: Side,
}

impl Anchor {
    fn new(point: Point, side: Side) -> Self {
        Self { point, side }
    }
}

/// An in-progress or completed text selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub ty: SelectionType,
    region: Range<Anchor>,
}

impl Selection {
    /// Start a new selection of `ty` anchored at `point`.
    pub fn new(ty: SelectionType, point: Point, side: Side) -> Self {
        Self {
            ty,
            region: Anchor::new(point, side)..Anchor::new(point, side),
        }
    }

    /// Move the selection's free endpoint to `point`.
    pub fn update(&mut self, point: Point, side: Side) {
        self.region.end = Anchor::new(point, side);
    }

    /// Switch the selection type in place, keeping both endpoints.
    pub fn rotate(
        mut self,
        surface: &Surface,
        range: &Range<Line>,
        delta: i32,
    ) -> Option<Self> {
        let range_top = range.start;
        let range_bottom = range.end - 1;

        let shift = |line: Line| -> Line {
            if line >= range_top && line <= range_bottom {
                max(line + delta, range_top)
            } else {
                line
            }
        };

        let mut start_line = shift(self.region.start.point.line);
        let mut end_line = shift(self.region.end.point.line);

        let dropped_below =
            start_line > range_bottom && end_line > range_bottom;
        let dropped_above = start_line < range_top && end_line < range_top;
        if dropped_below || dropped_above {
            return None;
        }

        let lowest = surface.topmost_line();
        let highest = surface.bottommost_line();
        start_line = start_line.clamp(lowest, highest);
        end_line = end_line.clamp(lowest, highest);

        self.region.start.point.line = start_line;
        self.region.end.point.line = end_line;

        Some(self)
    }

    /// Whether the selection has any endpoint within `range`.
    pub fn intersects_range<R: RangeBounds<Line>>(&self, range: R) -> bool {
        let (mut top, mut bottom) =
            (self.region.start.point.line, self.region.end.point.line);
        if top > bottom {
            mem::swap(&mut top, &mut bottom);
        }

        let after_start = match range.start_bound() {
            Bound::Included(&line) => bottom >= line,
            Bound::Excluded(&line) => bottom > line,
            Bound::Unbounded => true,
        };
        let before_end = match range.end_bound() {
            Bound::Included(&line) => top <= line,
            Bound::Excluded(&line) => top < line,
            Bound::Unbounded => true,
        };

        after_start && before_end
    }

    /// Resolve the selection into absolute grid coordinates, or `None` if it
    /// covers no cells.
    pub fn to_range(&self, surface: &Surface) -> Option<SelectionRange> {
        let start = self.region.start;
        let end = self.region.end;

        match self.ty {
            SelectionType::Simple => Self::range_simple(surface, start, end),
            SelectionType::Block => Self::range_block(start, end),
            SelectionType::Semantic => {
                Self::range_semantic(surface, start.point, end.point)
            },
            SelectionType::Lines => {
                Self::range_lines(surface, start.point, end.point)
            },
        }
    }

    fn range_simple(
        surface: &Surface,
        mut start: Anchor,
        mut end: Anchor,
    ) -> Option<SelectionRange> {
        if start.point > end.point {
            mem::swap(&mut start, &mut end);
        }

        // A `Right`-side start anchor excludes its own cell; a `Left`-side
        // end anchor does the same.
        if start.side == Side::Right {
            start.point = start.point.add(surface, Boundary::Grid, 1);
        }
        if end.side == Side::Left {
            end.point = end.point.sub(surface, Boundary::Grid, 1);
        }

        if start.point > end.point {
            return None;
        }

        Some(SelectionRange::new(start.point, end.point, false))
    }

    fn range_block(start: Anchor, end: Anchor) -> Option<SelectionRange> {
        let (top, bottom) = if start.point.line <= end.point.line {
            (start, end)
        } else {
            (end, start)
        };

        let boundary = |anchor: &Anchor| -> i64 {
            anchor.point.column.0 as i64
                + if anchor.side == Side::Right { 1 } else { 0 }
        };

        let left = min(boundary(&start), boundary(&end));
        let right = max(boundary(&start), boundary(&end)) - 1;
        if left > right {
            return None;
        }

        Some(SelectionRange::new(
            Point::new(top.point.line, Column(left as usize)),
            Point::new(bottom.point.line, Column(right as usize)),
            true,
        ))
    }

    fn range_semantic(
        surface: &Surface,
        start: Point,
        end: Point,
    ) -> Option<SelectionRange> {
        if start == end {
            if let Some(other) = surface.bracket_search(start) {
                let (start, end) =
                    if other < start { (other, start) } else { (start, other) };
                return Some(SelectionRange::new(start, end, false));
            }
        }

        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = surface.semantic_search_left(start);
        let end = surface.semantic_search_right(end);

        Some(SelectionRange::new(start, end, false))
    }

    fn range_lines(
        surface: &Surface,
        start: Point,
        end: Point,
    ) -> Option<SelectionRange> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = surface.line_search_left(start);
        let end = surface.line_search_right(end);

        Some(SelectionRange::new(start, end, false))
    }
}

/// A [`Selection`] resolved to absolute grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: Point,
    pub end: Point,
    /// Whether the range spans independent columns per line (a [`Selection`]
    /// of [`SelectionType::Block`]) rather than wrapping start-to-end.
    pub is_block: bool,
}

impl SelectionRange {
    fn new(start: Point, end: Point, is_block: bool) -> Self {
        Self {
            start,
            end,
            is_block,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Dimensions;
    use crate::surface::SurfaceConfig;

    struct SurfaceSize {
        columns: usize,
        screen_lines: usize,
    }

    impl Dimensions for SurfaceSize {
        fn total_lines(&self) -> usize {
            self.screen_lines
        }

        fn screen_lines(&self) -> usize {
            self.screen_lines
        }

        fn columns(&self) -> usize {
            self.columns
        }
    }

    #[test]
    fn intersects_range_matches_inclusive_and_exclusive_bounds() {
        let selection = Selection::new(
            SelectionType::Simple,
            Point::new(Line(2), Column(0)),
            Side::Left,
        );

        assert!(selection.intersects_range(Line(0)..=Line(2)));
        assert!(!selection.intersects_range(Line(3)..Line(5)));
        assert!(selection.intersects_range(..Line(3)));
        assert!(!selection.intersects_range(..Line(2)));
    }

    #[test]
    fn rotate_drops_selection_scrolled_out_of_range() {
        let size = SurfaceSize {
            columns: 5,
            screen_lines: 5,
        };
        let surface = Surface::new(SurfaceConfig::default(), &size);

        let selection = Selection::new(
            SelectionType::Simple,
            Point::new(Line(0), Column(0)),
            Side::Left,
        );

        let range = Line(0)..Line(5);
        assert!(selection.rotate(&surface, &range, -5).is_none());
    }

    #[test]
    fn rotate_shifts_selection_within_range() {
        let size = SurfaceSize {
            columns: 5,
            screen_lines: 5,
        };
        let surface = Surface::new(SurfaceConfig::default(), &size);

        let mut selection = Selection::new(
            SelectionType::Simple,
            Point::new(Line(1), Column(0)),
            Side::Left,
        );
        selection.update(Point::new(Line(2), Column(0)), Side::Right);

        let range = Line(0)..Line(5);
        let rotated = selection.rotate(&surface, &range, -1).unwrap();

        assert_eq!(rotated.region.start.point.line, Line(0));
        assert_eq!(rotated.region.end.point.line, Line(1));
    }
}
