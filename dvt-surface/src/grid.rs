//! The cell buffer backing a [`crate::Surface`]: a resizable 2D array of
//! cells with scrollback history and a cursor.
//!
//! Lines are stored as a flat deque of rows. The last `screen_lines` rows are
//! the live viewport; everything before that is scrollback. Scrolling the
//! full screen grows or shrinks that boundary instead of copying cells
//! around, the same trick used by every VT100-descended terminal emulator.

use std::collections::VecDeque;
use std::ops::{
    Bound, Deref, DerefMut, Index, IndexMut, Range, RangeBounds, RangeFrom,
    RangeFull, RangeTo,
};

use crate::escape::{Charset, CharsetIndex};
use crate::index::{Boundary, Column, GridClamp, Line, Point};

/// Types that describe the size of a grid.
///
/// [`crate::Surface`] and [`Grid`] both implement this; most of the
/// coordinate arithmetic in [`crate::index`] is generic over it so it works
/// the same whether it's handed a live surface or a bare size descriptor.
pub trait Dimensions {
    /// Total number of lines, including scrollback history.
    fn total_lines(&self) -> usize;

    /// Number of lines in the live viewport.
    fn screen_lines(&self) -> usize;

    /// Number of columns.
    fn columns(&self) -> usize;

    /// Number of lines currently held in scrollback history.
    #[inline]
    fn history_size(&self) -> usize {
        self.total_lines() - self.screen_lines()
    }

    /// Index of the last column.
    #[inline]
    fn last_column(&self) -> Column {
        Column(self.columns().saturating_sub(1))
    }

    /// Topmost addressable line, reaching into scrollback.
    #[inline]
    fn topmost_line(&self) -> Line {
        Line(-(self.history_size() as i32))
    }

    /// Bottommost addressable line, the last row of the viewport.
    #[inline]
    fn bottommost_line(&self) -> Line {
        Line(self.screen_lines() as i32 - 1)
    }
}

/// Direction in which to move the viewport relative to scrollback history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Scroll all the way back to the start of history.
    Top,
    /// Scroll up by a full viewport.
    PageUp,
    /// Scroll down by a full viewport.
    PageDown,
    /// Scroll by a signed number of lines; positive moves toward history.
    Delta(i32),
}

/// The four VT100 character set slots (G0-G3) a cursor can designate into.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Charsets([Charset; 4]);

impl Index<CharsetIndex> for Charsets {
    type Output = Charset;

    #[inline]
    fn index(&self, index: CharsetIndex) -> &Charset {
        &self.0[index as usize]
    }
}

impl IndexMut<CharsetIndex> for Charsets {
    #[inline]
    fn index_mut(&mut self, index: CharsetIndex) -> &mut Charset {
        &mut self.0[index as usize]
    }
}

/// Cursor position plus the rendering state new cells inherit when printed.
#[derive(Debug, Clone, Default)]
pub struct Cursor<T> {
    /// Current cursor position.
    pub point: Point,
    /// Cell template new content is stamped from (carries fg/bg/flags).
    pub template: T,
    /// Designated character sets for G0-G3.
    pub charsets: Charsets,
    /// Set once printing reaches the last column; the next printable
    /// character wraps to the next line instead of overwriting it.
    pub input_needs_wrap: bool,
}

/// One row of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row<T> {
    inner: Vec<T>,
}

impl<T: Clone + Default> Row<T> {
    fn new(columns: usize) -> Row<T> {
        Row {
            inner: vec![T::default(); columns],
        }
    }
}

impl<T> Deref for Row<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.inner
    }
}

impl<T> DerefMut for Row<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.inner
    }
}

impl<T> Index<Column> for Row<T> {
    type Output = T;

    #[inline]
    fn index(&self, column: Column) -> &T {
        &self.inner[column.0]
    }
}

impl<T> IndexMut<Column> for Row<T> {
    #[inline]
    fn index_mut(&mut self, column: Column) -> &mut T {
        &mut self.inner[column.0]
    }
}

impl<T> Index<Range<Column>> for Row<T> {
    type Output = [T];

    #[inline]
    fn index(&self, range: Range<Column>) -> &[T] {
        &self.inner[range.start.0..range.end.0]
    }
}

impl<T> IndexMut<Range<Column>> for Row<T> {
    #[inline]
    fn index_mut(&mut self, range: Range<Column>) -> &mut [T] {
        &mut self.inner[range.start.0..range.end.0]
    }
}

impl<T> Index<RangeTo<Column>> for Row<T> {
    type Output = [T];

    #[inline]
    fn index(&self, range: RangeTo<Column>) -> &[T] {
        &self.inner[..range.end.0]
    }
}

impl<T> IndexMut<RangeTo<Column>> for Row<T> {
    #[inline]
    fn index_mut(&mut self, range: RangeTo<Column>) -> &mut [T] {
        &mut self.inner[..range.end.0]
    }
}

impl<T> Index<RangeFrom<Column>> for Row<T> {
    type Output = [T];

    #[inline]
    fn index(&self, range: RangeFrom<Column>) -> &[T] {
        &self.inner[range.start.0..]
    }
}

impl<T> IndexMut<RangeFrom<Column>> for Row<T> {
    #[inline]
    fn index_mut(&mut self, range: RangeFrom<Column>) -> &mut [T] {
        &mut self.inner[range.start.0..]
    }
}

impl<T> Index<RangeFull> for Row<T> {
    type Output = [T];

    #[inline]
    fn index(&self, _: RangeFull) -> &[T] {
        &self.inner[..]
    }
}

impl<T> IndexMut<RangeFull> for Row<T> {
    #[inline]
    fn index_mut(&mut self, _: RangeFull) -> &mut [T] {
        &mut self.inner[..]
    }
}

/// A cell paired with the point it was read from.
///
/// Dereferences to the cell itself, so callers that only care about content
/// (`cell.c`, `cell.flags`, ...) don't need to reach through `.cell`.
#[derive(Debug, Clone, Copy)]
pub struct Indexed<T, L = Line> {
    pub point: Point<L>,
    pub cell: T,
}

impl<T, L> Deref for Indexed<T, L> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.cell
    }
}

impl<T, L> DerefMut for Indexed<T, L> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.cell
    }
}

/// A forward iterator that can also walk backward from its current position.
pub trait BidirectionalIterator: Iterator {
    fn prev(&mut self) -> Option<Self::Item>;
}

/// Cell-by-cell iterator produced by [`Grid::iter_from`].
///
/// Walks in reading order (left to right, top to bottom), wrapping at column
/// boundaries, and is bounded by the grid's topmost/bottommost lines rather
/// than the current scroll region.
pub struct GridIterator<'a, T> {
    grid: &'a Grid<T>,
    point: Point,
}

impl<'a, T> Iterator for GridIterator<'a, T> {
    type Item = Indexed<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        let last_column = self.grid.last_column();
        let last_line = self.grid.bottommost_line();

        match self.point {
            Point { line, column } if line == last_line && column == last_column => {
                None
            },
            Point { column, .. } if column == last_column => {
                self.point.line += 1;
                self.point.column = Column(0);
                Some(Indexed {
                    point: self.point,
                    cell: &self.grid[self.point],
                })
            },
            _ => {
                self.point.column += 1;
                Some(Indexed {
                    point: self.point,
                    cell: &self.grid[self.point],
                })
            },
        }
    }
}

impl<'a, T> BidirectionalIterator for GridIterator<'a, T> {
    fn prev(&mut self) -> Option<Self::Item> {
        let topmost_line = self.grid.topmost_line();

        match self.point {
            Point { line, column: Column(0) } if line == topmost_line => None,
            Point { column: Column(0), .. } => {
                self.point.line -= 1;
                self.point.column = self.grid.last_column();
                Some(Indexed {
                    point: self.point,
                    cell: &self.grid[self.point],
                })
            },
            _ => {
                self.point.column -= 1;
                Some(Indexed {
                    point: self.point,
                    cell: &self.grid[self.point],
                })
            },
        }
    }
}

/// The cell buffer itself: scrollback history plus a live viewport, a
/// cursor, and the cursor saved by the last DECSC/enter-alt-screen.
#[derive(Debug, Clone)]
pub struct Grid<T> {
    /// All rows, history first, the live viewport occupying the last
    /// `screen_lines` entries.
    raw: VecDeque<Row<T>>,
    screen_lines: usize,
    columns: usize,
    max_scrollback: usize,
    /// How many lines the viewport is scrolled back into history, from 0
    /// (live, at the bottom) up to `history_size()`.
    display_offset: usize,
    pub cursor: Cursor<T>,
    pub saved_cursor: Cursor<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(lines: usize, columns: usize, max_scrollback: usize) -> Grid<T> {
        let raw = (0..lines).map(|_| Row::new(columns)).collect();

        Grid {
            raw,
            screen_lines: lines,
            columns,
            max_scrollback,
            display_offset: 0,
            cursor: Cursor::default(),
            saved_cursor: Cursor::default(),
        }
    }

    #[inline]
    fn line_to_raw(&self, line: Line) -> usize {
        (self.raw.len() as i32 - self.screen_lines as i32 + line.0) as usize
    }

    #[inline]
    pub fn display_offset(&self) -> usize {
        self.display_offset
    }

    pub fn scroll_display(&mut self, scroll: Scroll) {
        let history_size = self.history_size();

        self.display_offset = match scroll {
            Scroll::Top => history_size,
            Scroll::PageUp => {
                (self.display_offset + self.screen_lines).min(history_size)
            },
            Scroll::PageDown => {
                self.display_offset.saturating_sub(self.screen_lines)
            },
            Scroll::Delta(delta) if delta > 0 => {
                (self.display_offset + delta as usize).min(history_size)
            },
            Scroll::Delta(delta) => {
                self.display_offset.saturating_sub((-delta) as usize)
            },
        };
    }

    /// Scroll the content within `region` up by `positions`, discarding
    /// rows pushed off the top unless `region` is the entire screen, in
    /// which case they're preserved as scrollback.
    pub fn scroll_up(&mut self, region: &Range<Line>, positions: usize) {
        let region_len = (region.end - region.start).0 as usize;
        let positions = positions.min(region_len);
        if positions == 0 {
            return;
        }

        let full_screen =
            region.start == Line(0) && region.end.0 as usize == self.screen_lines;

        if full_screen {
            for _ in 0..positions {
                self.raw.push_back(Row::new(self.columns));
            }
            let max_len = self.screen_lines + self.max_scrollback;
            while self.raw.len() > max_len {
                self.raw.pop_front();
            }
        } else {
            let start = self.line_to_raw(region.start);
            let end = self.line_to_raw(region.end);
            for _ in 0..positions {
                self.raw.remove(start);
                self.raw.insert(end - 1, Row::new(self.columns));
            }
        }
    }

    /// Scroll the content within `region` down by `positions`, discarding
    /// rows pushed off the bottom and inserting blank rows at the top.
    pub fn scroll_down(&mut self, region: &Range<Line>, positions: usize) {
        let region_len = (region.end - region.start).0 as usize;
        let positions = positions.min(region_len);
        if positions == 0 {
            return;
        }

        let start = self.line_to_raw(region.start);
        let end = self.line_to_raw(region.end);
        for _ in 0..positions {
            self.raw.remove(end - 1);
            self.raw.insert(start, Row::new(self.columns));
        }
    }

    /// Resize to the given dimensions.
    ///
    /// `reflow` mirrors the escape-sequence parameter asking for wrapped
    /// lines to be reflowed across the resize; rows are preserved as-is and
    /// only truncated/padded, which keeps cursor and damage tracking simple
    /// at the cost of not rejoining/rewrapping existing wrapped lines.
    pub fn resize(&mut self, _reflow: bool, lines: usize, columns: usize) {
        if columns != self.columns {
            for row in self.raw.iter_mut() {
                row.inner.resize(columns, T::default());
            }
            self.columns = columns;
        }

        if lines > self.screen_lines {
            let additional = lines - self.screen_lines;
            for _ in 0..additional {
                if self.history_size() == 0 {
                    self.raw.push_back(Row::new(self.columns));
                }
                self.screen_lines += 1;
            }
        } else if lines < self.screen_lines {
            let removed = self.screen_lines - lines;
            for _ in 0..removed {
                self.raw.pop_back();
            }
            self.screen_lines = lines;
        }

        self.display_offset = self.display_offset.min(self.history_size());
        self.cursor.point.line =
            self.cursor.point.line.grid_clamp(self, Boundary::Grid);
        self.cursor.point.column =
            Column(self.cursor.point.column.0.min(self.columns.saturating_sub(1)));
    }

    /// Reset every cell and the cursor back to power-on defaults.
    pub fn reset(&mut self) {
        self.reset_region(..);
        self.cursor = Cursor::default();
        self.saved_cursor = Cursor::default();
        self.display_offset = 0;
    }

    /// Reset every cell within `range` to the cursor's template.
    pub fn reset_region<R: RangeBounds<Line>>(&mut self, range: R) {
        let template = self.cursor.template.clone();
        let start = match range.start_bound() {
            Bound::Included(line) => *line,
            Bound::Excluded(line) => *line + 1,
            Bound::Unbounded => self.topmost_line(),
        };
        let end = match range.end_bound() {
            Bound::Included(line) => *line,
            Bound::Excluded(line) => *line - 1,
            Bound::Unbounded => self.bottommost_line(),
        };

        let mut line = start;
        while line <= end {
            let raw_index = self.line_to_raw(line);
            if let Some(row) = self.raw.get_mut(raw_index) {
                for cell in row.inner.iter_mut() {
                    cell.clone_from(&template);
                }
            }
            line += 1;
        }
    }

    /// Clear the live viewport, keeping scrollback history untouched.
    pub fn clear_viewport(&mut self) {
        self.reset_region(Line(0)..);
        self.display_offset = 0;
    }

    /// Drop all scrollback history.
    pub fn clear_history(&mut self) {
        let history_size = self.history_size();
        for _ in 0..history_size {
            self.raw.pop_front();
        }
        self.display_offset = 0;
    }

    /// A mutable reference to the cell under the cursor.
    pub fn cursor_cell(&mut self) -> &mut T {
        let point = self.cursor.point;
        &mut self[point.line][point.column]
    }

    /// Iterate cells starting just after `point`, in reading order.
    pub fn iter_from(&self, point: Point) -> GridIterator<'_, T> {
        GridIterator { grid: self, point }
    }
}

impl<T> Dimensions for Grid<T> {
    #[inline]
    fn total_lines(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    fn screen_lines(&self) -> usize {
        self.screen_lines
    }

    #[inline]
    fn columns(&self) -> usize {
        self.columns
    }
}

impl<T: Clone + Default> Index<Line> for Grid<T> {
    type Output = Row<T>;

    #[inline]
    fn index(&self, line: Line) -> &Row<T> {
        &self.raw[self.line_to_raw(line)]
    }
}

impl<T: Clone + Default> IndexMut<Line> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, line: Line) -> &mut Row<T> {
        let index = self.line_to_raw(line);
        &mut self.raw[index]
    }
}

impl<T: Clone + Default> Index<Point> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, point: Point) -> &T {
        &self[point.line][point.column]
    }
}

impl<T: Clone + Default> IndexMut<Point> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, point: Point) -> &mut T {
        &mut self[point.line][point.column]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn new_grid_is_blank() {
        let grid: Grid<Cell> = Grid::new(3, 5, 0);
        assert_eq!(grid.screen_lines(), 3);
        assert_eq!(grid.columns(), 5);
        assert_eq!(grid.total_lines(), 3);
        assert_eq!(grid[Line(0)][Column(0)].c, ' ');
    }

    #[test]
    fn scroll_up_full_screen_grows_history() {
        let mut grid: Grid<Cell> = Grid::new(2, 2, 5);
        grid[Line(0)][Column(0)].c = 'a';
        grid[Line(1)][Column(0)].c = 'b';

        let region = Line(0)..Line(2);
        grid.scroll_up(&region, 1);

        assert_eq!(grid.history_size(), 1);
        assert_eq!(grid[Line(1)][Column(0)].c, 'b');
        assert_eq!(grid[Line(-1)][Column(0)].c, 'a');
    }

    #[test]
    fn scroll_up_restricted_region_drops_top_row() {
        let mut grid: Grid<Cell> = Grid::new(3, 2, 5);
        grid[Line(0)][Column(0)].c = 'a';
        grid[Line(1)][Column(0)].c = 'b';
        grid[Line(2)][Column(0)].c = 'c';

        let region = Line(0)..Line(2);
        grid.scroll_up(&region, 1);

        assert_eq!(grid.history_size(), 0);
        assert_eq!(grid[Line(0)][Column(0)].c, 'b');
        assert_eq!(grid[Line(1)][Column(0)].c, ' ');
        assert_eq!(grid[Line(2)][Column(0)].c, 'c');
    }

    #[test]
    fn iter_from_walks_forward_and_back() {
        let mut grid: Grid<Cell> = Grid::new(2, 2, 0);
        grid[Line(0)][Column(0)].c = 'a';
        grid[Line(0)][Column(1)].c = 'b';
        grid[Line(1)][Column(0)].c = 'c';
        grid[Line(1)][Column(1)].c = 'd';

        let start = Point::new(Line(0), Column(0));
        let mut iter = grid.iter_from(start);
        assert_eq!(iter.next().map(|i| i.c), Some('b'));
        assert_eq!(iter.next().map(|i| i.c), Some('c'));
        assert_eq!(iter.next().map(|i| i.c), Some('d'));
        assert_eq!(iter.next().map(|i| i.c), None);

        assert_eq!(iter.prev().map(|i| i.c), Some('d'));
        assert_eq!(iter.prev().map(|i| i.c), Some('c'));
    }

    #[test]
    fn resize_preserves_existing_content() {
        let mut grid: Grid<Cell> = Grid::new(2, 2, 0);
        grid[Line(0)][Column(0)].c = 'a';
        grid.resize(false, 2, 4);
        assert_eq!(grid.columns(), 4);
        assert_eq!(grid[Line(0)][Column(0)].c, 'a');
        assert_eq!(grid[Line(0)][Column(3)].c, ' ');
    }
}
