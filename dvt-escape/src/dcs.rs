//! Device Control String dispatch.
//!
//! Only the termcap/terminfo query (`DCS + q ... ST`) is understood; every
//! other DCS sequence (Sixel graphics, ReGIS, the VT420 "lock memory" hook)
//! is outside the spec's scope and is logged, then discarded.

use log::debug;

use crate::actor::{Action, EscapeActor};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Dcs {
    /// `DCS + q <hex-name> [; <hex-name>]* ST`
    TermcapQuery,
    Unspecified { intermediates: Vec<u8>, final_byte: u8 },
}

impl From<(&[u8], u8)> for Dcs {
    fn from(value: (&[u8], u8)) -> Self {
        let (intermediates, final_byte) = value;
        match (intermediates, final_byte) {
            ([b'+'], b'q') => Self::TermcapQuery,
            _ => Self::Unspecified {
                intermediates: intermediates.to_vec(),
                final_byte,
            },
        }
    }
}

/// Decode a single `;`-separated hex-encoded name from a termcap query
/// payload into a display string. Malformed (odd-length, non-hex) names
/// decode to an empty string, which the termcap table simply won't match.
fn hex_decode(bytes: &[u8]) -> String {
    let mut out = Vec::with_capacity(bytes.len() / 2);
    let mut chunks = bytes.chunks_exact(2);

    for pair in &mut chunks {
        let hi = (pair[0] as char).to_digit(16);
        let lo = (pair[1] as char).to_digit(16);
        match (hi, lo) {
            (Some(hi), Some(lo)) => out.push(((hi << 4) | lo) as u8),
            _ => return String::new(),
        }
    }

    if !chunks.remainder().is_empty() {
        return String::new();
    }

    String::from_utf8(out).unwrap_or_default()
}

pub(crate) fn perform<A: EscapeActor>(
    actor: &mut A,
    intermediates: &[u8],
    final_byte: u8,
    payload: &[u8],
) {
    match Dcs::from((intermediates, final_byte)) {
        Dcs::TermcapQuery => {
            let names = payload
                .split(|&b| b == b';')
                .filter(|chunk| !chunk.is_empty())
                .map(hex_decode)
                .collect();
            actor.handle(Action::TermcapQuery(names));
        },
        Dcs::Unspecified {
            intermediates,
            final_byte,
        } => debug!(
            "[unexpected dcs] intermediates: {:?}, final: {}",
            intermediates, final_byte as char
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_name() {
        assert_eq!(hex_decode(b"636f"), "co");
    }

    #[test]
    fn rejects_odd_length() {
        assert_eq!(hex_decode(b"636"), "");
    }
}
