//! Frame codec
//!
//! `decode` turns one transport delivery into zero or more frames and `encode`
//! renders a single frame to its wire form. The decoder keeps no state between
//! calls: every delivery is expected to hold complete, NUL-terminated frames.
//! Content after the last NUL is an unterminated fragment and is dropped.

use std::collections::HashMap;

use tracing::debug;

use super::frame::Frame;

const FRAME_TERMINATOR: char = '\0';
const HEADER_BLOCK_END: &str = "\n\n";

/// Decodes every complete frame in `raw`, in order.
///
/// Empty segments and bare newlines are heartbeats and produce nothing, as do
/// segments that contain no command line. Malformed header lines are skipped.
pub fn decode(raw: &str) -> Vec<Frame> {
    let mut segments: Vec<&str> = raw.split(FRAME_TERMINATOR).collect();

    // split always yields a final element: whatever follows the last NUL.
    if let Some(rest) = segments.pop() {
        if !rest.trim().is_empty() {
            debug!(bytes = rest.len(), "dropping unterminated frame fragment");
        }
    }

    segments.into_iter().filter_map(decode_segment).collect()
}

fn decode_segment(segment: &str) -> Option<Frame> {
    if segment.is_empty() || segment == "\n" {
        return None;
    }

    // Heartbeats and other blank lines may precede the command line.
    let mut segment = segment;
    while let Some((line, rest)) = segment.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        segment = rest;
    }

    let (head, body) = match segment.find(HEADER_BLOCK_END) {
        Some(idx) => (&segment[..idx], &segment[idx + HEADER_BLOCK_END.len()..]),
        None => (segment, ""),
    };

    let mut lines = head.split('\n');
    let command = lines.next().map(str::trim).filter(|c| !c.is_empty());
    let Some(command) = command else {
        debug!("dropping segment without a command line");
        return None;
    };

    let mut headers = HashMap::new();
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        headers.insert(key.to_string(), value.trim().to_string());
    }

    Some(Frame::new(command, headers, body))
}

/// Renders a frame to wire form. Headers are written in the order given.
pub fn encode(command: &str, headers: &[(&str, &str)], body: &str) -> String {
    let header_len: usize = headers.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut out = String::with_capacity(command.len() + header_len + body.len() + 3);

    out.push_str(command);
    out.push('\n');
    for (key, value) in headers {
        out.push_str(key);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(body);
    out.push(FRAME_TERMINATOR);
    out
}
