//! High-level escape sequence consumer interface.
//!
//! The [`Parser`](crate::Parser) translates the raw byte stream into a
//! sequence of [`Action`]s and relays them to an [`EscapeActor`]
//! implementation. Downstream crates implement this trait to mutate their
//! terminal model, update UI state or collect metrics without
//! re-implementing the escape sequence finite state machine.

use cursor_icon::CursorIcon;

use crate::attributes::CharacterAttribute;
use crate::charset::{Charset, CharsetIndex};
use crate::color::Rgb;
use crate::cursor::{CursorShape, CursorStyle};
use crate::hyperlink::Hyperlink;
use crate::keyboard::{
    KeyboardMode, KeyboardModeApplyBehavior, ModifyOtherKeysState,
};
use crate::mode::{
    ClearMode, LineClearMode, Mode, PrivateMode, ScpCharPath, ScpUpdateMode,
    TabClearMode,
};

/// Semantic event produced by the parser for an [`EscapeActor`] to apply.
///
/// Every control code, CSI, ESC, OSC and DCS sequence the parser understands
/// is translated into exactly one of these variants before it reaches the
/// consumer, so the consumer never has to deal with raw parameter bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Print(char),
    Backspace,
    Bell,
    CarriageReturn,
    LineFeed,
    NewLine,
    NextLine,
    Substitute,
    SetHorizontalTab,
    ReverseIndex,
    ResetState,
    ScreenAlignmentDisplay,
    IdentifyTerminal(Option<char>),
    ReportDeviceStatus(usize),

    SaveCursorPosition,
    RestoreCursorPosition,
    Goto(i32, usize),
    GotoRow(i32),
    GotoColumn(usize),
    MoveUp { rows: usize, carrage_return_needed: bool },
    MoveDown { rows: usize, carrage_return_needed: bool },
    MoveForward(usize),
    MoveBackward(usize),
    MoveForwardTabs(u16),
    MoveBackwardTabs(u16),

    InsertBlank(usize),
    InsertBlankLines(usize),
    InsertTabs(u16),
    DeleteLines(usize),
    DeleteChars(usize),
    EraseChars(usize),
    ClearScreen(ClearMode),
    ClearLine(LineClearMode),
    SetTabs(u16),
    ClearTabs(TabClearMode),

    SetScrollingRegion(usize, usize),
    ScrollUp(usize),
    ScrollDown(usize),

    SetActiveCharsetIndex(CharsetIndex),
    ConfigureCharset(Charset, CharsetIndex),

    SetCharacterAttribute(CharacterAttribute),
    SetColor { index: usize, color: Rgb },
    QueryColor(usize),
    ResetColor(usize),

    SetHyperlink(Option<Hyperlink>),
    SetCursorShape(CursorShape),
    SetCursorStyle(Option<CursorStyle>),
    SetCursorIcon(CursorIcon),

    SetKeypadApplicationMode,
    UnsetKeypadApplicationMode,

    SetModifyOtherKeysState(ModifyOtherKeysState),
    ReportModifyOtherKeysState,
    ReportKeyboardMode,
    SetKeyboardMode(KeyboardMode, KeyboardModeApplyBehavior),
    PushKeyboardMode(KeyboardMode),
    PopKeyboardModes(u16),

    SetMode(Mode),
    UnsetMode(Mode),
    ReportMode(Mode),
    SetPrivateMode(PrivateMode),
    UnsetPrivateMode(PrivateMode),
    ReportPrivateMode(PrivateMode),

    SetSCP(ScpCharPath, ScpUpdateMode),

    /// DECSCA: mark subsequently printed cells as protected (or not) from
    /// DECSERA/selective erase.
    SetCharacterProtection(bool),

    RequestTextAreaSizeByChars,
    RequestTextAreaSizeByPixels,

    PushWindowTitle,
    PopWindowTitle,
    SetWindowTitle(Option<String>),

    /// DECCRA: copy a rectangular area to another position on the page.
    CopyRectangle { source: RectangleArea, dest_top: usize, dest_left: usize },
    /// DECERA: erase a rectangular area unconditionally.
    EraseRectangle(RectangleArea),
    /// DECFRA: fill a rectangular area with a single character.
    FillRectangle { ch: char, area: RectangleArea },
    /// DECSERA: erase a rectangular area honoring character protection.
    SelectiveEraseRectangle(RectangleArea),
    /// DECCARA: apply SGR attributes to a rectangular area.
    ChangeAttributesRectangle { area: RectangleArea, attrs: Vec<CharacterAttribute> },
    /// DECRARA: toggle SGR attributes within a rectangular area.
    ReverseAttributesRectangle { area: RectangleArea, attrs: Vec<CharacterAttribute> },
    /// DECRQCRA: request a checksum of a rectangular area, identified by `id`.
    RequestChecksumRectangle { id: i64, area: RectangleArea },

    /// DECSLRM: set the left/right margins, gated on DECLRMM being enabled.
    SetLeftRightMargin(usize, usize),

    /// DECSTR: soft reset, a subset of RIS (see spec §6).
    SoftReset,

    /// DECSCL: select conformance level, optionally toggling 8-bit C1
    /// transmission.
    SetConformanceLevel { level: i64, eight_bit_controls: Option<bool> },

    /// `CSI ? Pm s`: snapshot the listed DEC private modes (XTSAVE).
    SaveModes(Vec<PrivateMode>),
    /// `CSI ? Pm r`: restore the listed DEC private modes (XTRESTORE).
    RestoreModes(Vec<PrivateMode>),

    /// `DCS + q <hex-name>...ST`: termcap/terminfo capability query.
    TermcapQuery(Vec<String>),
}

/// A 1-based, inclusive rectangle in screen coordinates.
///
/// `0` in any field means "unspecified"; resolves to the corresponding page
/// edge (first/last row or column) per DEC rectangular-area conventions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RectangleArea {
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

/// Consumer-facing trait implemented by whatever owns the terminal's state.
///
/// [`Parser::advance`](crate::Parser::advance) is generic over this trait; it
/// never constructs a concrete surface or engine type itself. The only
/// required method is [`handle`](EscapeActor::handle) - everything else has a
/// default that simply funnels into it, so most implementors only need to
/// override `handle`.
pub trait EscapeActor {
    /// Apply a single semantic action.
    fn handle(&mut self, action: Action);

    /// A printable character was decoded from the input stream.
    ///
    /// Defaults to `self.handle(Action::Print(c))`. `REP` (repeat preceding
    /// character) tracking happens one layer up, in the parser's own
    /// low-level print hook, so implementors normally don't need to override
    /// this.
    #[inline]
    fn print(&mut self, c: char) {
        self.handle(Action::Print(c));
    }

    /// Unset a DEC private mode.
    ///
    /// Defaults to `self.handle(Action::UnsetPrivateMode(mode))`. The parser
    /// calls this directly (bypassing `handle`) when a synchronized update's
    /// buffering timeout expires, so implementors can override it if they
    /// need to distinguish that from an explicit `CSI ? 2026 l`.
    #[inline]
    fn unset_private_mode(&mut self, mode: PrivateMode) {
        self.handle(Action::UnsetPrivateMode(mode));
    }

    /// A synchronized update (`CSI ? 2026 h`) has begun.
    fn begin_sync(&mut self) {}

    /// A synchronized update (`CSI ? 2026 l`, or its timeout) has ended.
    fn end_sync(&mut self) {}
}
