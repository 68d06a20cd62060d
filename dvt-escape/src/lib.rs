mod actor;
mod attributes;
mod charset;
mod color;
mod control;
mod csi;
mod cursor;
mod dcs;
mod esc;
mod hyperlink;
mod keyboard;
mod mode;
mod osc;
mod parser;
mod sync;

pub use actor::{Action, EscapeActor, RectangleArea};
pub use attributes::CharacterAttribute;
pub use charset::{Charset, CharsetIndex};
pub use color::{Color, Rgb, StdColor};
pub use cursor::{CursorShape, CursorStyle};
pub use hyperlink::Hyperlink;
pub use keyboard::*;
pub use mode::*;
pub use sync::{SyncHandler, Timeout};
pub use dvt_vte as vte;
pub use parser::Parser;

pub(crate) use color::parse_sgr_color;

pub trait EscapeParser {
    fn advance<A: EscapeActor>(&mut self, _bytes: &[u8], _actor: &mut A) {}
}
