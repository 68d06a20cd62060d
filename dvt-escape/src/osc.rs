use log::debug;

use crate::actor::{Action, EscapeActor};
use crate::color::{StdColor, xparse_color};
use crate::cursor::{CursorShape, CursorStyle};
use crate::hyperlink::Hyperlink;
use crate::parser::parse_number;

/// Index of the dynamic foreground color in the palette's extended range.
const FOREGROUND_INDEX: usize = StdColor::Foreground as usize;
/// Index of the dynamic background color in the palette's extended range.
const BACKGROUND_INDEX: usize = StdColor::Background as usize;
/// Index of the dynamic text cursor color in the palette's extended range.
const CURSOR_INDEX: usize = StdColor::Cursor as usize;

/// Operating system command, classified by its first (numeric) parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatingSystemCommand {
    SetWindowTitle,
    SetColorIndex,
    Hyperlink,
    SetForegroundColor,
    SetBackgroundColor,
    SetCursorColor,
    SetMouseCursorShape,
    SetCursorStyle,
    Clipboard,
    ResetIndexedColors,
    ResetForegroundColor,
    ResetBackgroundColor,
    ResetCursorColor,
    Unhandled,
}

impl From<&[u8]> for OperatingSystemCommand {
    fn from(action: &[u8]) -> Self {
        match action {
            b"0" | b"1" | b"2" => Self::SetWindowTitle,
            b"4" => Self::SetColorIndex,
            b"8" => Self::Hyperlink,
            b"10" => Self::SetForegroundColor,
            b"11" => Self::SetBackgroundColor,
            b"12" => Self::SetCursorColor,
            b"22" => Self::SetMouseCursorShape,
            b"50" => Self::SetCursorStyle,
            b"52" => Self::Clipboard,
            b"104" => Self::ResetIndexedColors,
            b"110" => Self::ResetForegroundColor,
            b"111" => Self::ResetBackgroundColor,
            b"112" => Self::ResetCursorColor,
            _ => Self::Unhandled,
        }
    }
}

pub(crate) fn perform<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    let Some(command) = params.first() else {
        return unexpected(params);
    };

    match OperatingSystemCommand::from(*command) {
        OperatingSystemCommand::SetWindowTitle => {
            let title = params[1..].join(&b';');
            actor.handle(Action::SetWindowTitle(Some(
                String::from_utf8_lossy(&title).into_owned(),
            )));
        },
        OperatingSystemCommand::SetColorIndex => set_indexed_colors(actor, params),
        OperatingSystemCommand::Hyperlink => set_hyperlink(actor, params),
        OperatingSystemCommand::SetForegroundColor => {
            set_dynamic_color(actor, params, FOREGROUND_INDEX)
        },
        OperatingSystemCommand::SetBackgroundColor => {
            set_dynamic_color(actor, params, BACKGROUND_INDEX)
        },
        OperatingSystemCommand::SetCursorColor => {
            set_dynamic_color(actor, params, CURSOR_INDEX)
        },
        OperatingSystemCommand::SetMouseCursorShape => {
            set_mouse_cursor_shape(actor, params)
        },
        OperatingSystemCommand::SetCursorStyle => set_cursor_style(actor, params),
        OperatingSystemCommand::Clipboard => {
            debug!("[unhandled osc] clipboard access requested");
        },
        OperatingSystemCommand::ResetIndexedColors => {
            reset_indexed_colors(actor, params)
        },
        OperatingSystemCommand::ResetForegroundColor => {
            actor.handle(Action::ResetColor(FOREGROUND_INDEX))
        },
        OperatingSystemCommand::ResetBackgroundColor => {
            actor.handle(Action::ResetColor(BACKGROUND_INDEX))
        },
        OperatingSystemCommand::ResetCursorColor => {
            actor.handle(Action::ResetColor(CURSOR_INDEX))
        },
        OperatingSystemCommand::Unhandled => unexpected(params),
    }
}

fn set_indexed_colors<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    let mut rest = &params[1..];

    while let [index_param, spec, tail @ ..] = rest {
        rest = tail;

        let Some(index) = parse_number(index_param) else {
            return unexpected(params);
        };

        if *spec == b"?" {
            actor.handle(Action::QueryColor(index as usize));
            continue;
        }

        match xparse_color(spec) {
            Some(color) => actor.handle(Action::SetColor {
                index: index as usize,
                color,
            }),
            None => return unexpected(params),
        }
    }
}

fn reset_indexed_colors<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    if params.len() < 2 {
        for index in 0..256 {
            actor.handle(Action::ResetColor(index));
        }
        return;
    }

    for index_param in &params[1..] {
        if let Some(index) = parse_number(index_param) {
            actor.handle(Action::ResetColor(index as usize));
        }
    }
}

fn set_dynamic_color<A: EscapeActor>(
    actor: &mut A,
    params: &[&[u8]],
    index: usize,
) {
    let Some(spec) = params.get(1) else {
        return unexpected(params);
    };

    if *spec == b"?" {
        actor.handle(Action::QueryColor(index));
        return;
    }

    match xparse_color(spec) {
        Some(color) => actor.handle(Action::SetColor { index, color }),
        None => unexpected(params),
    }
}

fn set_hyperlink<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    let uri = params.get(2).copied().unwrap_or(&[]);

    if uri.is_empty() {
        actor.handle(Action::SetHyperlink(None));
        return;
    }

    let id = params.get(1).and_then(|fields| {
        fields
            .split(|&b| b == b':')
            .find_map(|field| field.strip_prefix(b"id="))
            .map(|id| String::from_utf8_lossy(id).into_owned())
            .filter(|id| !id.is_empty())
    });

    actor.handle(Action::SetHyperlink(Some(Hyperlink {
        id,
        uri: String::from_utf8_lossy(uri).into_owned(),
    })));
}

fn set_mouse_cursor_shape<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    let Some(name) = params.get(1) else { return };

    let icon = match *name {
        b"default" => cursor_icon::CursorIcon::Default,
        b"pointer" | b"hand" | b"hand2" => cursor_icon::CursorIcon::Pointer,
        b"text" | b"xterm" => cursor_icon::CursorIcon::Text,
        b"wait" | b"watch" => cursor_icon::CursorIcon::Wait,
        b"progress" => cursor_icon::CursorIcon::Progress,
        b"crosshair" | b"cross" => cursor_icon::CursorIcon::Crosshair,
        b"move" | b"fleur" => cursor_icon::CursorIcon::Move,
        b"not-allowed" | b"X_cursor" => cursor_icon::CursorIcon::NotAllowed,
        b"grab" => cursor_icon::CursorIcon::Grab,
        b"grabbing" => cursor_icon::CursorIcon::Grabbing,
        b"help" | b"question_arrow" => cursor_icon::CursorIcon::Help,
        b"none" => cursor_icon::CursorIcon::Default,
        _ => return,
    };

    actor.handle(Action::SetCursorIcon(icon));
}

fn set_cursor_style<A: EscapeActor>(actor: &mut A, params: &[&[u8]]) {
    let Some(raw) = params.get(1) else {
        actor.handle(Action::SetCursorStyle(None));
        return;
    };

    let Some(raw_shape) = parse_number(raw) else { return };

    let shape = match raw_shape {
        0 => None,
        1 | 2 => Some(CursorShape::Block),
        3 | 4 => Some(CursorShape::Underline),
        5 | 6 => Some(CursorShape::Beam),
        _ => return,
    };

    let style = shape.map(|shape| CursorStyle {
        shape,
        blinking: raw_shape % 2 == 1,
    });

    actor.handle(Action::SetCursorStyle(style));
}

fn unexpected(params: &[&[u8]]) {
    debug!("[unexpected osc] params: {params:?}");
}
