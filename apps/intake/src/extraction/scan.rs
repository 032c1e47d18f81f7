//! Delimiter-depth scanning used by the heuristic strategy and the fallback pass.

use std::collections::HashMap;

/// Maps the position of every opener that gets closed to the position of its
/// closer. One pass with a stack, so lookups for many openers stay linear.
pub fn matching_closers(text: &str, open: u8, close: u8) -> HashMap<usize, usize> {
    let mut stack = Vec::new();
    let mut closers = HashMap::new();
    for (i, &b) in text.as_bytes().iter().enumerate() {
        if b == open {
            stack.push(i);
        } else if b == close {
            if let Some(start) = stack.pop() {
                closers.insert(start, i);
            }
        }
    }
    closers
}

/// Collects every outermost balanced `open ... close` span, in text order,
/// with one pass over the bytes.
///
/// A span counts as outermost when no enclosing opener ever closes. An opener
/// that is left dangling therefore does not hide complete spans that follow it.
/// Stray closers with nothing open are ignored.
pub fn balanced_spans(text: &str, open: u8, close: u8) -> Vec<&str> {
    // (opener position, closed?) for every opener seen so far
    let mut openers: Vec<(usize, bool)> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    // (start, end, index of the enclosing opener)
    let mut spans: Vec<(usize, usize, Option<usize>)> = Vec::new();

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if b == open {
            stack.push(openers.len());
            openers.push((i, false));
        } else if b == close {
            let Some(idx) = stack.pop() else { continue };
            openers[idx].1 = true;
            spans.push((openers[idx].0, i, stack.last().copied()));
        }
    }

    let mut outermost: Vec<(usize, usize)> = spans
        .into_iter()
        .filter(|(_, _, parent)| parent.map_or(true, |p| !openers[p].1))
        .map(|(start, end, _)| (start, end))
        .collect();
    outermost.sort_unstable_by_key(|(start, _)| *start);

    // delimiters are ASCII, so these are always char boundaries
    outermost
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .collect()
}
