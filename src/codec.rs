//! Length-prefixed JSON framing
//!
//! Each frame is a 4-byte big-endian payload length followed by a UTF-8
//! JSON payload. This replaces the fixed 512-byte padded buffers of the
//! legacy wire format, which truncated long messages and tore coalesced
//! writes; peers speaking the padded format are not supported.

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::RelayError;

/// Maximum frame payload size.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

const LEN_PREFIX: usize = 4;

/// Encode a record into a length-prefixed frame.
pub fn encode_frame<T: Serialize>(record: &T) -> Result<Vec<u8>, RelayError> {
    let payload = serde_json::to_vec(record)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(RelayError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let mut out = Vec::with_capacity(LEN_PREFIX + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Append an encoded frame to the provided buffer.
pub fn encode_frame_into<T: Serialize>(
    buf: &mut BytesMut,
    record: &T,
) -> Result<(), RelayError> {
    let payload = serde_json::to_vec(record)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(RelayError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    buf.reserve(LEN_PREFIX + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(&payload);
    Ok(())
}

/// Try to decode a single frame from the front of a growable buffer.
///
/// Returns `Ok(None)` when the buffer does not yet hold a complete
/// frame; the decoded frame is consumed from the buffer on success.
pub fn try_decode_frame<T: DeserializeOwned>(
    buf: &mut BytesMut,
) -> Result<Option<T>, RelayError> {
    if buf.len() < LEN_PREFIX {
        return Ok(None);
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(RelayError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }

    if buf.len() < LEN_PREFIX + len {
        return Ok(None);
    }

    buf.advance(LEN_PREFIX);
    let payload = buf.split_to(len);
    Ok(Some(serde_json::from_slice(&payload)?))
}

/// Write one record as a frame to the byte channel.
pub async fn write_frame<W, T>(writer: &mut W, record: &T) -> Result<(), RelayError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(record)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one record from the byte channel.
///
/// Returns `Ok(None)` on clean end-of-stream at a frame boundary;
/// end-of-stream in the middle of a frame is `UnexpectedEof`.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, RelayError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; LEN_PREFIX];
    let mut filled = 0;
    while filled < LEN_PREFIX {
        let n = reader.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(RelayError::UnexpectedEof);
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(RelayError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RelayError::UnexpectedEof
        } else {
            RelayError::Io(e)
        }
    })?;

    Ok(Some(serde_json::from_slice(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Envelope;

    #[test]
    fn test_frame_round_trip() {
        let env = Envelope::chat("alice", None, "hi");
        let bytes = encode_frame(&env).unwrap();

        let mut buf = BytesMut::from(&bytes[..]);
        let decoded: Envelope = try_decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.sender_name, "alice");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_incremental_decode() {
        let env = Envelope::chat("alice", None, "hi");
        let bytes = encode_frame(&env).unwrap();

        let mut buf = BytesMut::new();
        // Feed one byte at a time; no frame until the last byte lands.
        for (i, b) in bytes.iter().enumerate() {
            buf.put_u8(*b);
            let decoded: Option<Envelope> = try_decode_frame(&mut buf).unwrap();
            if i + 1 < bytes.len() {
                assert!(decoded.is_none());
            } else {
                assert_eq!(decoded.unwrap().text, "hi");
            }
        }
    }

    #[test]
    fn test_two_coalesced_frames_decode_separately() {
        let a = Envelope::chat("alice", None, "first");
        let b = Envelope::chat("alice", None, "second");

        let mut buf = BytesMut::new();
        encode_frame_into(&mut buf, &a).unwrap();
        encode_frame_into(&mut buf, &b).unwrap();

        let first: Envelope = try_decode_frame(&mut buf).unwrap().unwrap();
        let second: Envelope = try_decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
        let rest: Option<Envelope> = try_decode_frame(&mut buf).unwrap();
        assert!(rest.is_none());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let env = Envelope::chat("alice", None, &"x".repeat(MAX_FRAME_SIZE + 1));
        assert!(matches!(
            encode_frame(&env),
            Err(RelayError::FrameTooLarge { .. })
        ));

        let mut buf = BytesMut::new();
        buf.put_u32((MAX_FRAME_SIZE + 1) as u32);
        buf.put_slice(b"junk");
        let decoded: Result<Option<Envelope>, _> = try_decode_frame(&mut buf);
        assert!(matches!(decoded, Err(RelayError::FrameTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_async_read_write_frame() {
        let env = Envelope::chat("bob", Some("alice"), "psst");
        let mut wire = Vec::new();
        write_frame(&mut wire, &env).await.unwrap();

        let mut reader = &wire[..];
        let decoded: Envelope = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded.to_name.as_deref(), Some("alice"));
        assert_eq!(decoded.text, "psst");

        // Clean EOF at the frame boundary.
        let eof: Option<Envelope> = read_frame(&mut reader).await.unwrap();
        assert!(eof.is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_an_error() {
        let env = Envelope::chat("bob", None, "cut short");
        let mut wire = Vec::new();
        write_frame(&mut wire, &env).await.unwrap();
        wire.truncate(wire.len() - 3);

        let mut reader = &wire[..];
        let result: Result<Option<Envelope>, _> = read_frame(&mut reader).await;
        assert!(matches!(result, Err(RelayError::UnexpectedEof)));
    }
}
