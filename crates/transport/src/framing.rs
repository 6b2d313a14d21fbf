//! Length prefixed frames.
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::error::Error;
use crate::error::Result;

/// Largest accepted frame body.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Write `data` as one frame.
pub async fn write_frame<W>(stream: &mut W, data: &[u8]) -> Result<()>
where W: AsyncWrite + Unpin {
    if data.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(data.len(), MAX_FRAME_LEN));
    }
    stream.write_u32(data.len() as u32).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one frame. `None` when the stream ends cleanly before a new frame.
pub async fn read_frame<R>(stream: &mut R) -> Result<Option<Vec<u8>>>
where R: AsyncRead + Unpin {
    let len = match stream.read_u32().await {
        Ok(v) => v as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge(len, MAX_FRAME_LEN));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Encode `msg` with bincode and write it as one frame.
pub async fn send<W, T>(stream: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = bincode::serialize(msg)?;
    write_frame(stream, &data).await
}

/// Read one frame and decode it with bincode.
pub async fn recv<R, T>(stream: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    match read_frame(stream).await? {
        Some(data) => Ok(Some(bincode::deserialize(&data)?)),
        None => Ok(None),
    }
}
