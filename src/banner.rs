//! Banner grabbing for open TCP connections.
//!
//! A banner is the first newline-terminated line a service sends right
//! after the handshake. The read is bounded in both time and size.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::time::timeout;

/// Maximum bytes to read for a banner line.
const MAX_BANNER_SIZE: u64 = 1024;

/// Read a single banner line from `stream` within `deadline`.
///
/// Returns `None` on timeout, read error, end of stream before a newline,
/// or an empty line. None of these are errors for the caller.
pub async fn grab_banner<S>(stream: &mut S, deadline: Duration) -> Option<String>
where
    S: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream.take(MAX_BANNER_SIZE));
    let mut line = Vec::new();

    match timeout(deadline, reader.read_until(b'\n', &mut line)).await {
        Ok(Ok(n)) if n > 0 && line.ends_with(b"\n") => sanitize_banner(&line),
        _ => None,
    }
}

/// Strip the line terminator and replace non-printable bytes with `.`.
fn sanitize_banner(data: &[u8]) -> Option<String> {
    let data = data.strip_suffix(b"\n").unwrap_or(data);
    let data = data.strip_suffix(b"\r").unwrap_or(data);

    let banner: String = String::from_utf8_lossy(data)
        .chars()
        .map(|c| if c.is_control() { '.' } else { c })
        .collect();

    if banner.is_empty() {
        None
    } else {
        Some(banner)
    }
}
