// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing for stream transports (`spec.md` §4.2:
//! `<json>\n`).
//!
//! Streams are chunk-safe: [`read_frame`] buffers until a `\n` delimiter is
//! seen, so callers never need to worry about partial reads splitting a
//! JSON object across two `poll_read` calls.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("connection closed before a complete frame was read")]
    ClosedMidFrame,
}

/// Serialize `value` to a single `<json>\n` line and write it.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one `<json>\n` line and deserialize it.
///
/// Returns `Ok(None)` on a clean EOF between frames (the remote end
/// closed the connection); returns [`FramingError::ClosedMidFrame`] if EOF
/// arrives after a partial line with no trailing newline.
pub async fn read_frame<R, T>(reader: &mut BufReader<R>) -> Result<Option<T>, FramingError>
where
    R: tokio::io::AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') {
        return Err(FramingError::ClosedMidFrame);
    }
    let value = serde_json::from_str(line.trim_end())?;
    Ok(Some(value))
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
