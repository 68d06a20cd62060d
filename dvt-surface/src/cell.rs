//! Cell content and per-cell rendering attributes.

use std::rc::Rc;

use bitflags::bitflags;

use crate::escape::{Color, StdColor};

bitflags! {
    /// Flags describing a cell's rendering attributes.
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Flags: u16 {
        const INVERSE                  = 0b0000_0000_0000_0001;
        const BOLD                     = 0b0000_0000_0000_0010;
        const ITALIC                   = 0b0000_0000_0000_0100;
        const BOLD_ITALIC               = Self::BOLD.bits() | Self::ITALIC.bits();
        const UNDERLINE                 = 0b0000_0000_0000_1000;
        const WRAPLINE                  = 0b0000_0000_0001_0000;
        const WIDE_CHAR                 = 0b0000_0000_0010_0000;
        const WIDE_CHAR_SPACER          = 0b0000_0000_0100_0000;
        const DIM                       = 0b0000_0000_1000_0000;
        const DIM_BOLD                  = Self::DIM.bits() | Self::BOLD.bits();
        const HIDDEN                    = 0b0000_0001_0000_0000;
        const STRIKEOUT                 = 0b0000_0010_0000_0000;
        const LEADING_WIDE_CHAR_SPACER  = 0b0000_0100_0000_0000;
        const DOUBLE_UNDERLINE          = 0b0000_1000_0000_0000;
        const UNDERCURL                 = 0b0001_0000_0000_0000;
        const DOTTED_UNDERLINE          = 0b0010_0000_0000_0000;
        const DASHED_UNDERLINE          = 0b0100_0000_0000_0000;
        const PROTECTED                 = 0b1000_0000_0000_0000;
        const ALL_UNDERLINES = Self::UNDERLINE.bits()
            | Self::DOUBLE_UNDERLINE.bits()
            | Self::UNDERCURL.bits()
            | Self::DOTTED_UNDERLINE.bits()
            | Self::DASHED_UNDERLINE.bits();
    }
}

/// Shared, reference-counted hyperlink payload stored on a cell.
///
/// Distinct from [`crate::escape::Hyperlink`] (the value produced by an OSC 8
/// dispatch): many adjacent cells in a span share one allocation here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    inner: Rc<HyperlinkInner>,
}

#[derive(Debug, PartialEq, Eq)]
struct HyperlinkInner {
    id: Option<String>,
    uri: String,
}

impl Hyperlink {
    pub fn new<S: Into<String>>(id: Option<S>, uri: String) -> Self {
        Self {
            inner: Rc::new(HyperlinkInner {
                id: id.map(Into::into),
                uri,
            }),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    pub fn uri(&self) -> &str {
        &self.inner.uri
    }
}

impl From<crate::escape::Hyperlink> for Hyperlink {
    fn from(link: crate::escape::Hyperlink) -> Self {
        Hyperlink::new(link.id, link.uri)
    }
}

/// Rarely-set cell state, boxed to keep the common case of [`Cell`] small.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct CellExtra {
    zerowidth: Vec<char>,
    underline_color: Option<Color>,
    hyperlink: Option<Hyperlink>,
}

/// A single terminal cell: one visible character plus its rendering
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub c: char,
    pub fg: Color,
    pub bg: Color,
    pub flags: Flags,
    pub(crate) extra: Option<Box<CellExtra>>,
}

impl Default for Cell {
    fn default() -> Cell {
        Cell {
            c: ' ',
            bg: Color::Std(StdColor::Background),
            fg: Color::Std(StdColor::Foreground),
            flags: Flags::empty(),
            extra: None,
        }
    }
}

impl Cell {
    /// Reset this cell back to `template`, keeping no residual state.
    #[inline]
    pub fn reset(&mut self, template: &Cell) {
        *self = Cell {
            c: template.c,
            fg: template.fg,
            bg: template.bg,
            flags: template.flags,
            extra: template.extra.clone(),
        };
    }

    /// Zero-width characters combined onto this cell (e.g. combining marks).
    #[inline]
    pub fn zerowidth(&self) -> Option<&[char]> {
        self.extra.as_ref().map(|extra| extra.zerowidth.as_slice())
    }

    /// Append a zero-width character to this cell.
    pub fn push_zerowidth(&mut self, c: char) {
        let extra = self.extra.get_or_insert_with(Default::default);
        extra.zerowidth.push(c);
    }

    /// Clear this cell of any wide-character state, keeping its attributes.
    #[inline]
    pub fn clear_wide(&mut self) {
        self.flags.remove(Flags::WIDE_CHAR_SPACER | Flags::WIDE_CHAR);
        self.c = ' ';
    }

    /// The hyperlink assigned to this cell, if any.
    #[inline]
    pub fn hyperlink(&self) -> Option<Hyperlink> {
        self.extra.as_ref()?.hyperlink.clone()
    }

    /// Set (or clear) this cell's hyperlink.
    pub fn set_hyperlink(&mut self, hyperlink: Option<Hyperlink>) {
        let had_hyperlink = hyperlink.is_some();
        let extra = self.extra.get_or_insert_with(Default::default);
        extra.hyperlink = hyperlink;

        if !had_hyperlink && extra.zerowidth.is_empty() && extra.underline_color.is_none() {
            self.extra = None;
        }
    }

    /// The color of the underline drawn under this cell, if overridden.
    #[inline]
    pub fn underline_color(&self) -> Option<Color> {
        self.extra.as_ref()?.underline_color
    }

    /// Override (or clear) the color of the underline drawn under this cell.
    pub fn set_underline_color(&mut self, color: Option<Color>) {
        let had_color = color.is_some();
        let extra = self.extra.get_or_insert_with(Default::default);
        extra.underline_color = color;

        if !had_color && extra.hyperlink.is_none() && extra.zerowidth.is_empty() {
            self.extra = None;
        }
    }
}

impl From<Color> for Cell {
    fn from(bg: Color) -> Self {
        Cell {
            bg,
            ..Cell::default()
        }
    }
}

/// Length of the meaningful (non-trailing-blank) content of a line.
pub trait LineLength {
    /// Number of occupied columns, not counting a trailing run of blanks
    /// that isn't part of a wrapped line.
    fn line_length(&self) -> crate::index::Column;
}

impl LineLength for [Cell] {
    fn line_length(&self) -> crate::index::Column {
        let mut length = self.len();

        if length == 0 {
            return crate::index::Column(0);
        }

        if self[length - 1].flags.contains(Flags::WRAPLINE) {
            return crate::index::Column(length);
        }

        while length > 0
            && self[length - 1].c == ' '
            && !self[length - 1].flags.intersects(
                Flags::WIDE_CHAR
                    | Flags::WIDE_CHAR_SPACER
                    | Flags::LEADING_WIDE_CHAR_SPACER,
            )
        {
            length -= 1;
        }

        crate::index::Column(length)
    }
}
