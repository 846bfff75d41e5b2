//! Frames are a 4-byte big-endian length followed by the JSON encoding of a
//! single [`ProtocolMessage`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use crate::error::{Result, RouterError};
use crate::protocol::messages::ProtocolMessage;

pub async fn write_frame<W>(writer: &mut W, message: &ProtocolMessage, max_len: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body = message.serialize()?;
    if body.len() > max_len || body.len() > u32::MAX as usize {
        return Err(RouterError::FrameTooLarge {
            size: body.len(),
            max: max_len,
        });
    }

    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<ProtocolMessage>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    if len > max_len {
        return Err(RouterError::FrameTooLarge { size: len, max: max_len });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(ProtocolMessage::deserialize(&body)?)
}
