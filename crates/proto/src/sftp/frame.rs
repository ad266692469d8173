//! Reading and writing whole frames on an async byte stream.

use super::error::{Error, Result};
use super::packet::{Frame, Packet, RequestPacket, ResponsePacket};
use bytes::BytesMut;
use filexfer_platform::CodecConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

/// Reads one frame.
///
/// The declared length is checked against `config.max_packet_length`
/// before the body is allocated.
pub async fn read_frame<R>(reader: &mut R, config: &CodecConfig) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let length = reader.read_u32().await?;
    if length > config.max_packet_length {
        warn!(
            length,
            max = config.max_packet_length,
            "rejecting oversized SFTP frame"
        );
        return Err(Error::LongPacket {
            length,
            max: config.max_packet_length,
        });
    }

    let mut body = BytesMut::zeroed(length as usize);
    reader.read_exact(&mut body).await?;
    Frame::decode_unprefixed(body)
}

/// Reads and decodes one request.
pub async fn read_request<R>(reader: &mut R, config: &CodecConfig) -> Result<RequestPacket>
where
    R: AsyncRead + Unpin,
{
    RequestPacket::from_frame(read_frame(reader, config).await?)
}

/// Reads and decodes one response.
pub async fn read_response<R>(reader: &mut R, config: &CodecConfig) -> Result<ResponsePacket>
where
    R: AsyncRead + Unpin,
{
    ResponsePacket::from_frame(read_frame(reader, config).await?)
}

/// Writes a marshaled header followed by its payload, if any.
pub async fn write_frame<W>(writer: &mut W, header: &[u8], payload: Option<&[u8]>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(header).await?;
    if let Some(payload) = payload {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    trace!(
        header_len = header.len(),
        payload_len = payload.map_or(0, <[u8]>::len),
        "wrote SFTP frame"
    );
    Ok(())
}

/// Marshals and writes one packet.
pub async fn write_packet<W, P>(writer: &mut W, packet: &P, request_id: u32) -> Result<()>
where
    W: AsyncWrite + Unpin,
    P: Packet + ?Sized,
{
    let (header, payload) = packet.marshal(request_id);
    write_frame(writer, &header, payload.as_deref()).await
}
