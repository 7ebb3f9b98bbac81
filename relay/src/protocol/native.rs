//! Native messaging wire codec.
//!
//! Format: 4-byte length prefix in native byte order + UTF-8 JSON payload.
//!
//! - Host-to-relay messages are capped at [`MAX_INBOUND_MESSAGE_SIZE`]
//! - Relay-to-host messages are capped at [`MAX_OUTBOUND_MESSAGE_SIZE`]
//! - Partial buffers decode to `Ok(None)` so callers can keep reading

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Length of the frame header (4 bytes, native-endian u32).
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest message a native host may send.
pub const MAX_INBOUND_MESSAGE_SIZE: usize = 1024 * 1024;

/// Largest message sent to a native host.
pub const MAX_OUTBOUND_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Codec for length-prefixed JSON messages.
pub struct NativeCodec;

impl NativeCodec {
    /// Encode a message with its length prefix.
    pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
        let payload = serde_json::to_vec(msg)?;

        if payload.len() > MAX_OUTBOUND_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge {
                len: payload.len(),
                max: MAX_OUTBOUND_MESSAGE_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
        buf.put_u32_ne(payload.len() as u32);
        buf.put_slice(&payload);

        Ok(buf.freeze())
    }

    /// Decode one message from a buffer.
    ///
    /// Returns:
    /// - Ok(Some(msg)) if a complete message was decoded (buffer is advanced)
    /// - Ok(None) if more data is needed (buffer unchanged)
    /// - Err if the frame is oversized or its payload is not valid JSON
    pub fn decode<T: DeserializeOwned>(buf: &mut BytesMut, max_len: usize) -> Result<Option<T>> {
        if buf.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let len = u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        if len > max_len {
            return Err(Error::MessageTooLarge { len, max: max_len });
        }

        if buf.len() < FRAME_HEADER_LEN + len {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_LEN);
        let payload = buf.split_to(len);
        let msg = serde_json::from_slice(&payload)?;

        Ok(Some(msg))
    }
}

/// Read one message from a stream.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
pub async fn read_message<R, T>(reader: &mut R, max_len: usize) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    let mut filled = 0;
    while filled < FRAME_HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::Codec("stream ended inside a frame header".to_string()));
        }
        filled += n;
    }

    let len = u32::from_ne_bytes(header) as usize;
    if len > max_len {
        return Err(Error::MessageTooLarge { len, max: max_len });
    }

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + len);
    buf.put_slice(&header);
    buf.resize(FRAME_HEADER_LEN + len, 0);
    reader
        .read_exact(&mut buf[FRAME_HEADER_LEN..])
        .await
        .map_err(|e| Error::Codec(format!("stream ended inside a message: {}", e)))?;

    NativeCodec::decode(&mut buf, max_len)?
        .ok_or_else(|| Error::Codec("incomplete message".to_string()))
        .map(Some)
}

/// Write one message to a stream and flush it.
pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let encoded = NativeCodec::encode(msg)?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}
