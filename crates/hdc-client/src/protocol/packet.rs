/*!
 * Length-prefixed packet framing.
 *
 * ```text
 * +------------------+
 * | 4 bytes: length  |  (big-endian u32)
 * +------------------+
 * | N bytes: data    |
 * +------------------+
 * ```
 */
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::{MAX_PACKET_SIZE, PACKET_LENGTH_SIZE};
use crate::error::{HdcError, Result};

/// Codec for the HDC packet framing
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl PacketCodec {
    /// Create a new packet codec
    pub fn new() -> Self {
        Self
    }

    /// Encode data into a packet with length prefix
    pub fn encode(&self, data: &[u8]) -> Result<Bytes> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(HdcError::BufferError(format!(
                "Data size {} exceeds maximum packet size {}",
                data.len(),
                MAX_PACKET_SIZE
            )));
        }

        let mut buf = BytesMut::with_capacity(PACKET_LENGTH_SIZE + data.len());
        buf.put_u32(data.len() as u32);
        buf.put_slice(data);

        trace!("Encoded packet: data_len={}", data.len());
        Ok(buf.freeze())
    }

    /// Read and decode one packet from a stream
    pub async fn decode<S>(&self, stream: &mut S) -> Result<Vec<u8>>
    where
        S: AsyncRead + Unpin,
    {
        let mut len_buf = [0u8; PACKET_LENGTH_SIZE];
        stream.read_exact(&mut len_buf).await?;
        let packet_len = u32::from_be_bytes(len_buf) as usize;

        if packet_len == 0 {
            return Err(HdcError::protocol("Received zero-length packet"));
        }

        if packet_len > MAX_PACKET_SIZE {
            return Err(HdcError::Protocol(format!(
                "Packet size {} exceeds maximum {}",
                packet_len, MAX_PACKET_SIZE
            )));
        }

        let mut data = vec![0u8; packet_len];
        stream.read_exact(&mut data).await?;

        trace!("Decoded packet: size={}", packet_len);
        Ok(data)
    }

    /// Encode `data` and write it to a stream, then flush
    pub async fn write_packet<S>(&self, stream: &mut S, data: &[u8]) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        let packet = self.encode(data)?;
        stream.write_all(&packet).await?;
        stream.flush().await?;
        trace!("Wrote packet: {} bytes", packet.len());
        Ok(())
    }

    /// Read one packet from a stream
    pub async fn read_packet<S>(&self, stream: &mut S) -> Result<Vec<u8>>
    where
        S: AsyncRead + Unpin,
    {
        self.decode(stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_encode() {
        let codec = PacketCodec::new();
        let data = b"Hello, HDC!";
        let packet = codec.encode(data).unwrap();

        assert_eq!(packet.len(), 4 + data.len());
        assert_eq!(&packet[..4], &(data.len() as u32).to_be_bytes());
        assert_eq!(&packet[4..], data);
    }

    #[test]
    fn test_encode_empty() {
        let packet = PacketCodec::new().encode(b"").unwrap();
        assert_eq!(&packet[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_too_large() {
        let data = vec![0u8; MAX_PACKET_SIZE + 1];
        let result = PacketCodec::new().encode(&data);
        assert!(matches!(result, Err(HdcError::BufferError(_))));
    }

    #[tokio::test]
    async fn test_decode_split_reads() {
        let mut stream = Builder::new()
            .read(&[0, 0])
            .read(&[0, 5, b'h', b'e'])
            .read(b"llo")
            .build();

        let data = PacketCodec::new().decode(&mut stream).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn test_decode_zero_length() {
        let mut stream = Builder::new().read(&[0, 0, 0, 0]).build();
        let result = PacketCodec::new().decode(&mut stream).await;
        assert!(matches!(result, Err(HdcError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_decode_oversize() {
        let len = (MAX_PACKET_SIZE as u32 + 1).to_be_bytes();
        let mut stream = Builder::new().read(&len).build();
        let result = PacketCodec::new().decode(&mut stream).await;
        assert!(matches!(result, Err(HdcError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_decode_truncated_stream() {
        let mut stream = Builder::new().read(&[0, 0, 0, 8, b'a']).build();
        let result = PacketCodec::new().decode(&mut stream).await;
        assert!(matches!(result, Err(HdcError::Io(_))));
    }

    #[tokio::test]
    async fn test_write_packet() {
        let mut stream = Builder::new().write(&[0, 0, 0, 4]).write(b"list").build();
        // The mock accepts the frame in one write as long as the bytes match in order
        PacketCodec::new()
            .write_packet(&mut stream, b"list")
            .await
            .unwrap();
    }
}
