use std::collections::VecDeque;

use dvt_escape::{Action, EscapeActor, PrivateMode};

use crate::surface::SurfaceActor;
use crate::terminal::TerminalEvent;

use super::SyncState;

/// Bridges [`dvt_escape::Action`]s coming out of the parser onto a
/// [`SurfaceActor`], translating the subset that the surface itself
/// doesn't know about (titles, bell, cursor shape/icon, hyperlinks) into
/// [`TerminalEvent`]s queued for the front-end.
///
/// Reply-bearing actions (device attributes, status reports, mode reports,
/// text-area-size queries) write their encoded response directly into
/// `pending_input`, the same buffer user keystrokes are queued into, so they
/// leave on the outbound PTY stream in parse order.
pub(super) struct TerminalSurfaceActor<'a, S> {
    pub surface: &'a mut S,
    pub events: &'a mut VecDeque<TerminalEvent>,
    pub pending_input: &'a mut VecDeque<u8>,
    pub sync_state: &'a mut SyncState,
}

impl<'a, S: SurfaceActor> TerminalSurfaceActor<'a, S> {
    fn dispatch(&mut self, event: TerminalEvent) {
        self.events.push_back(event);
    }

    /// Apply any actions buffered while a synchronized update was active and
    /// whose deadline has now passed.
    ///
    /// Returns whether anything was flushed, so callers know whether a frame
    /// needs to be emitted.
    pub fn flush_sync_timeout(&mut self) -> bool {
        if !self.sync_state.is_active() || !self.sync_state.is_expired() {
            return false;
        }

        let actions = self.sync_state.cancel();
        for action in actions {
            self.apply(action);
        }
        true
    }

    fn apply(&mut self, action: Action) {
        use Action::*;

        match action {
            Print(ch) => self.surface.print(ch),
            Bell => self.dispatch(TerminalEvent::Bell),
            InsertBlank(count) => self.surface.insert_blank(count),
            InsertBlankLines(count) => self.surface.insert_blank_lines(count),
            DeleteLines(count) => self.surface.delete_lines(count),
            DeleteChars(count) => self.surface.delete_chars(count),
            EraseChars(count) => self.surface.erase_chars(count),
            Backspace => self.surface.backspace(),
            CarriageReturn => self.surface.carriage_return(),
            LineFeed => self.surface.line_feed(),
            NewLine => self.surface.new_line(),
            NextLine => {
                self.surface.line_feed();
                self.surface.carriage_return();
            },
            Substitute => {},
            SetHorizontalTab => self.surface.set_horizontal_tab(),
            ReverseIndex => self.surface.reverse_index(),
            ResetState => self.surface.reset(),
            ScreenAlignmentDisplay => self.surface.screen_alignment_display(),
            IdentifyTerminal(attr) => {
                self.surface.identify_terminal(attr, self.pending_input);
            },
            ReportDeviceStatus(status) => {
                self.surface
                    .report_device_status(status, self.pending_input);
            },
            SaveCursorPosition => self.surface.save_cursor(),
            RestoreCursorPosition => self.surface.restore_cursor(),
            Goto(row, col) => self.surface.goto(row, col),
            GotoRow(row) => self.surface.goto_row(row),
            GotoColumn(col) => self.surface.goto_column(col),
            MoveUp {
                rows,
                carrage_return_needed,
            } => self.surface.move_up(rows, carrage_return_needed),
            MoveDown {
                rows,
                carrage_return_needed,
            } => self.surface.move_down(rows, carrage_return_needed),
            MoveForward(cols) => self.surface.move_forward(cols),
            MoveBackward(cols) => self.surface.move_backward(cols),
            MoveForwardTabs(count) => {
                self.surface.move_forward_tabs(count as usize);
            },
            MoveBackwardTabs(count) => {
                self.surface.move_backward_tabs(count as usize);
            },
            InsertTabs(count) => self.surface.insert_tabs(count as usize),
            ClearScreen(mode) => self.surface.clear_screen(mode),
            ClearLine(mode) => self.surface.clear_line(mode),
            SetTabs(interval) => {
                self.surface.reset_tabstops(interval as usize);
            },
            ClearTabs(mode) => self.surface.clear_tabs(mode),
            SetScrollingRegion(top, bottom) => {
                self.surface.set_scrolling_region(top, bottom);
            },
            ScrollUp(count) => self.surface.scroll_up(count),
            ScrollDown(count) => self.surface.scroll_down(count),
            SetActiveCharsetIndex(index) => {
                self.surface.set_active_charset_index(index);
            },
            ConfigureCharset(charset, index) => {
                self.surface.configure_charset(charset, index);
            },
            SetCharacterAttribute(attribute) => self.surface.sgr(attribute),
            SetColor { index, color } => self.surface.set_color(index, color),
            QueryColor(index) => self.surface.query_color(index),
            ResetColor(index) => self.surface.reset_color(index),
            SetHyperlink(link) => {
                self.surface.set_hyperlink(link.clone());
                self.dispatch(TerminalEvent::Hyperlink { link });
            },
            SetCursorShape(shape) => {
                self.surface.set_cursor_shape(shape);
                self.dispatch(TerminalEvent::CursorShapeChanged { shape });
            },
            SetCursorStyle(style) => {
                self.surface.set_cursor_style(style);
                self.dispatch(TerminalEvent::CursorStyleChanged { style });
            },
            SetCursorIcon(icon) => {
                self.dispatch(TerminalEvent::CursorIconChanged { icon });
            },
            SetKeypadApplicationMode => {
                self.surface.set_keypad_application_mode(true);
            },
            UnsetKeypadApplicationMode => {
                self.surface.set_keypad_application_mode(false);
            },
            SetModifyOtherKeysState(_) | ReportModifyOtherKeysState => {},
            ReportKeyboardMode => {
                self.surface.report_keyboard_mode(self.pending_input);
            },
            SetKeyboardMode(mode, behavior) => {
                self.surface.set_keyboard_mode(mode, behavior);
            },
            PushKeyboardMode(mode) => self.surface.push_keyboard_mode(mode),
            PopKeyboardModes(amount) => {
                self.surface.pop_keyboard_modes(amount);
            },
            SetMode(mode) => self.surface.set_mode(mode),
            UnsetMode(mode) => self.surface.unset_mode(mode),
            ReportMode(mode) => {
                self.surface.report_mode(mode, self.pending_input);
            },
            SetPrivateMode(mode) => self.handle_private_mode(mode, true),
            UnsetPrivateMode(mode) => self.handle_private_mode(mode, false),
            ReportPrivateMode(mode) => {
                self.surface.report_private_mode(mode, self.pending_input);
            },
            SetSCP(_, _) => {},
            RequestTextAreaSizeByChars => {
                self.surface.request_text_area_by_chars(self.pending_input);
            },
            RequestTextAreaSizeByPixels => {
                self.surface.request_text_area_by_pixels(self.pending_input);
            },
            PushWindowTitle => self.surface.push_window_title(),
            PopWindowTitle => match self.surface.pop_window_title() {
                Some(title) => self.dispatch(TerminalEvent::TitleChanged { title }),
                None => self.dispatch(TerminalEvent::ResetTitle),
            },
            SetWindowTitle(Some(title)) => {
                self.surface.set_window_title(Some(title.clone()));
                self.dispatch(TerminalEvent::TitleChanged { title });
            },
            SetWindowTitle(None) => {
                self.surface.set_window_title(None);
                self.dispatch(TerminalEvent::ResetTitle);
            },
            SetCharacterProtection(protected) => {
                self.surface.set_character_protection(protected);
            },
            CopyRectangle {
                source,
                dest_top,
                dest_left,
            } => {
                self.surface.copy_rectangle(source, dest_top, dest_left);
            },
            EraseRectangle(area) => self.surface.erase_rectangle(area),
            FillRectangle { ch, area } => self.surface.fill_rectangle(ch, area),
            SelectiveEraseRectangle(area) => {
                self.surface.selective_erase_rectangle(area);
            },
            ChangeAttributesRectangle { area, attrs } => {
                self.surface.change_attributes_rectangle(area, &attrs);
            },
            ReverseAttributesRectangle { area, attrs } => {
                self.surface.reverse_attributes_rectangle(area, &attrs);
            },
            RequestChecksumRectangle { id, area } => {
                self.surface
                    .report_checksum_rectangle(id, area, self.pending_input);
            },
            SetLeftRightMargin(left, right) => {
                self.surface.set_left_right_margin(left, right);
            },
            SoftReset => self.surface.soft_reset(),
            SetConformanceLevel { level, eight_bit_controls } => {
                self.surface
                    .set_conformance_level(level, eight_bit_controls);
            },
            SaveModes(modes) => self.surface.save_modes(&modes),
            RestoreModes(modes) => self.surface.restore_modes(&modes),
            TermcapQuery(names) => {
                self.surface.report_termcap(&names, self.pending_input);
            },
        }
    }

    fn handle_private_mode(&mut self, mode: PrivateMode, enabled: bool) {
        if enabled {
            self.surface.set_private_mode(mode);
        } else {
            self.surface.unset_private_mode(mode);
        }
    }
}

impl<'a, S: SurfaceActor> EscapeActor for TerminalSurfaceActor<'a, S> {
    fn handle(&mut self, action: Action) {
        if self.sync_state.is_active() {
            if let Err(action) = self.sync_state.push(action) {
                self.apply(action);
            }
            return;
        }

        self.apply(action);
    }

    fn begin_sync(&mut self) {
        self.sync_state.begin();
    }

    fn end_sync(&mut self) {
        let actions = self.sync_state.end();
        for action in actions {
            self.apply(action);
        }
    }
}
