use crate::messages::{ConnInfo, FrontendMessage, WireEvent};
use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads the handshake line. Anything other than a well-formed connection
/// info object is fatal.
pub async fn read_conn_info<R: AsyncBufRead + Unpin>(stream: &mut R) -> Result<ConnInfo> {
    let mut line = Vec::new();
    let n = stream
        .read_until(b'\n', &mut line)
        .await
        .context("cannot read connection info")?;
    let line = trim_line(&line[..n]);
    if line.is_empty() {
        return Err(anyhow!("connection info missing"));
    }
    let info = serde_json::from_slice(line).context("malformed connection info")?;
    Ok(info)
}

/// Reads the next event line, skipping blank lines. End of input maps to
/// [`FrontendMessage::Terminate`].
pub async fn read_message<R: AsyncBufRead + Unpin>(stream: &mut R) -> Result<FrontendMessage> {
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = stream.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Ok(FrontendMessage::Terminate);
        }
        let trimmed = trim_line(&line);
        if trimmed.is_empty() {
            continue;
        }
        return Ok(match serde_json::from_slice::<WireEvent>(trimmed) {
            Ok(wire) => FrontendMessage::Event {
                event: wire.event,
                data: wire.data,
            },
            Err(err) => FrontendMessage::Malformed {
                reason: format!("malformed message: {err}"),
            },
        });
    }
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let start = buf
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buf.len());
    let end = buf
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &buf[start..end]
}
