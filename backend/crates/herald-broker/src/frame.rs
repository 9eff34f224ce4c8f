//! Length-prefixed framing: a big-endian `u32` byte count followed by one
//! protobuf-encoded message.

use crate::{BrokerError, Result as BrokerResult};

use herald_core::Message;
use herald_proto::{FRAME_HEADER_LEN, MAX_FRAME_SIZE};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read one frame. `Ok(None)` means the peer closed cleanly between frames.
pub async fn read_frame<R>(reader: &mut R) -> BrokerResult<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];

    let first = reader.read(&mut header).await?;
    if first == 0 {
        return Ok(None);
    }
    if first < FRAME_HEADER_LEN {
        reader.read_exact(&mut header[first..]).await?;
    }

    let size = u32::from_be_bytes(header) as usize;
    if size > MAX_FRAME_SIZE {
        return Err(BrokerError::FrameTooLarge {
            size,
            max: MAX_FRAME_SIZE,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;

    Ok(Some(Message::decode(&body)?))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, message: &Message) -> BrokerResult<()>
where
    W: AsyncWrite + Unpin,
{
    let body = message.encode();
    if body.len() > MAX_FRAME_SIZE {
        return Err(BrokerError::FrameTooLarge {
            size: body.len(),
            max: MAX_FRAME_SIZE,
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
