use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Overlong frames are rejected and the connection is closed.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Read one LF-terminated frame, stripping the delimiter. Returns `Ok(None)`
/// on clean EOF (peer closed before sending a partial frame).
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.take(MAX_FRAME_LEN as u64 + 1).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_FRAME_LEN || (buf.len() == MAX_FRAME_LEN + 1 && buf.last() != Some(&b'\n')) {
        return Err(ProtocolError::FrameTooLarge(MAX_FRAME_LEN));
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    let line = String::from_utf8_lossy(&buf).into_owned();
    Ok(Some(line))
}

/// Write one frame, appending the LF delimiter.
pub async fn write_frame<W>(writer: &mut W, frame: &str) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Split a frame's fields with a hard cap: the final field absorbs any
/// remaining `|`-delimited text verbatim (it may itself be JSON containing
/// the separator character).
pub fn split_fields(line: &str, max_fields: usize) -> Vec<&str> {
    if max_fields == 0 {
        return Vec::new();
    }
    line.splitn(max_fields, '|').collect()
}
