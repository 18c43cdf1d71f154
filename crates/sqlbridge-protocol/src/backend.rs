use crate::messages::{BackendMessage, WireReply};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encodes one reply as a single JSON line and flushes it.
pub async fn write_message<S: AsyncWrite + Unpin>(
    stream: &mut S,
    access_token: &str,
    msg: &BackendMessage,
) -> Result<()> {
    let mut buf = BytesMut::new();
    serde_json::to_writer((&mut buf).writer(), &WireReply::new(access_token, msg))?;
    buf.put_u8(b'\n');
    stream.write_all(&buf).await?;
    stream.flush().await?;
    Ok(())
}
