//! A quick pass over raw XML to measure how deeply its elements nest.
//!
//! `xmltree` builds elements recursively. Running out of stack aborts the
//! whole process and can't be caught, so hostile packets are turned away
//! before they reach it. `quick_xml` reads events without recursing, so it
//! can count any depth safely.

use quick_xml::{Reader, events::Event};

/// The deepest element nesting we'll hand to `xmltree`.
///
/// Real XMP rarely goes past ten or so.
pub const MAX_DEPTH: usize = 256;

/// Finds the deepest element nesting in `xml`.
///
/// This isn't validation. If `quick_xml` gives up partway, the depth seen so
/// far is returned, and `xmltree` reports the actual problem later.
///
/// Stops early once `limit` is passed, returning a value above it.
pub fn max_depth(xml: &str, limit: usize) -> usize {
    let mut reader = Reader::from_str(xml);

    // mismatched tags are `xmltree`'s problem. keep counting
    reader.config_mut().check_end_names = false;

    let mut depth: usize = 0;
    let mut deepest: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                deepest = deepest.max(depth);
                if deepest > limit {
                    return deepest;
                }
            }
            Ok(Event::Empty(_)) => deepest = deepest.max(depth + 1),
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => break,
            Ok(_) => (),
            Err(e) => {
                log::debug!(
                    "Stopped measuring XML depth at byte `{}`. err: {e}",
                    reader.buffer_position()
                );
                break;
            }
        }
    }

    deepest
}
