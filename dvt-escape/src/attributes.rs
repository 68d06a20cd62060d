use crate::color::Color;

/// A single SGR (Select Graphic Rendition) attribute change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterAttribute {
    /// Clear all attributes back to the default rendition.
    Reset,
    Bold,
    Dim,
    Italic,
    Underline,
    DoubleUnderline,
    Undercurl,
    DottedUnderline,
    DashedUnderline,
    BlinkSlow,
    BlinkFast,
    Reverse,
    Hidden,
    Strike,
    CancelBold,
    CancelBoldDim,
    CancelItalic,
    CancelUnderline,
    CancelBlink,
    CancelReverse,
    CancelHidden,
    CancelStrike,
    Foreground(Color),
    Background(Color),
    UnderlineColor(Option<Color>),
}
