// ABOUTME: Provides TCP connection management for SMPP protocol communication
// ABOUTME: Implements frame-based I/O with buffering for optimal network performance

use crate::codec::{CodecError, Frame};
use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// Framed SMPP transport over one TCP stream
///
/// A transmitter session only ever walks a short path through the SMPP
/// session states:
///
/// ```text
/// CLOSED -> OPEN -> BOUND_TX (or BOUND_TRX) -> UNBOUND -> CLOSED
/// ```
///
/// - **OPEN**: TCP connected, bind_transmitter/bind_transceiver pending
/// - **BOUND_TX**: submit_sm, enquire_link and unbind may be sent; the SMSC
///   may itself send enquire_link or unbind
/// - **UNBOUND**: unbind exchanged, socket about to close
///
/// ## Implementation Notes
/// This `Connection` struct handles the transport layer (frame I/O) but does not
/// track session state. `client::Session` drives the state machine on top of it.
#[derive(Debug)]
pub struct Connection {
    // The `TcpStream`. It is decorated with a `BufWriter`, which provides write
    // level buffering. The `BufWriter` implementation provided by Tokio is
    // sufficient for our needs.
    stream: BufWriter<TcpStream>,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl Connection {
    /// Create a new `Connection`, backed by `socket`. Read and write buffers
    /// are initialized.
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            // submit_sm PDUs rarely exceed a few hundred octets
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// The function waits until it has retrieved enough data to parse a frame.
    /// Any data remaining in the read buffer after the frame has been parsed is
    /// kept there for the next call to `read_frame`.
    ///
    /// # Returns
    ///
    /// On success, the received frame is returned. If the `TcpStream`
    /// is closed in a way that doesn't break a frame in half, it returns
    /// `None`. Otherwise, an error is returned.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        loop {
            // Attempt to parse a frame from the buffered data. If enough data
            // has been buffered, the frame is returned.
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // There is not enough buffered data to read a frame. Attempt to
            // read more data from the socket.
            //
            // On success, the number of bytes is returned. `0` indicates "end
            // of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // The remote closed the connection. For this to be a clean
                // shutdown, there should be no data in the read buffer. If
                // there is, this means that the peer closed the socket while
                // sending a frame.
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(CodecError::ConnectionReset)
                };
            }
        }
    }

    /// Tries to parse a frame from the buffer. If the buffer contains enough
    /// data, the frame is returned and the data removed from the buffer. If not
    /// enough data has been buffered yet, `Ok(None)` is returned. If the
    /// buffered data does not represent a valid frame, `Err` is returned.
    fn parse_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        let mut buf = Cursor::new(&self.buffer[..]);

        // The first step is to check if enough data has been buffered to parse
        // a single frame. This step is usually much faster than doing a full
        // parse of the frame, and allows us to skip allocating data structures
        // to hold the frame data unless we know the full frame has been
        // received.
        match Frame::check(&mut buf) {
            Ok(len) => {
                // If the encoded frame representation is invalid, an error is
                // returned. This should terminate the **current** connection.
                let frame = Frame::parse(&self.buffer[..len]);

                // Discard the PDU from the read buffer even when it failed to
                // decode, so the stream stays aligned on PDU boundaries.
                self.buffer.advance(len);

                frame.map(Some)
            }
            // There is not enough data present in the read buffer to parse a
            // single frame. We must wait for more data to be received from the
            // socket.
            Err(CodecError::Incomplete) => Ok(None),
            // An error was encountered while parsing the frame. The connection
            // is now in an invalid state.
            Err(e) => Err(e),
        }
    }

    /// Write a single `Frame` value to the underlying stream and flush it.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), CodecError> {
        let bytes = frame.to_bytes()?;
        self.stream.write_all(&bytes).await?;

        // Ensure the encoded frame is written to the socket. The call above
        // is to the buffered stream. Calling `flush` writes the remaining
        // contents of the buffer to the socket.
        self.stream.flush().await?;
        Ok(())
    }

    /// Flush pending writes and close the write half of the socket
    pub async fn shutdown(&mut self) -> Result<(), CodecError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;
    use crate::datatypes::{EnquireLink, SubmitSmResponse};
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (Connection::new(client.unwrap()), server.unwrap().0)
    }

    #[tokio::test]
    async fn test_reads_frames_split_across_writes() {
        let (mut connection, mut peer) = pair().await;

        let first = SubmitSmResponse::new(1, "abc").to_bytes().unwrap();
        let second = EnquireLink::new(2).to_bytes().unwrap();
        let mut wire = first.to_vec();
        wire.extend_from_slice(&second);

        // Deliver the two PDUs in awkward chunks
        peer.write_all(&wire[..5]).await.unwrap();
        peer.flush().await.unwrap();
        tokio::task::yield_now().await;
        peer.write_all(&wire[5..]).await.unwrap();
        peer.flush().await.unwrap();

        let frame = connection.read_frame().await.unwrap().unwrap();
        assert!(matches!(frame, Frame::SubmitSmResp(ref resp) if resp.message_id == "abc"));

        let frame = connection.read_frame().await.unwrap().unwrap();
        assert!(matches!(frame, Frame::EnquireLink(ref pdu) if pdu.sequence_number == 2));
    }

    #[tokio::test]
    async fn test_clean_close_returns_none() {
        let (mut connection, peer) = pair().await;
        drop(peer);

        assert!(connection.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_mid_frame_is_a_reset() {
        let (mut connection, mut peer) = pair().await;
        let bytes = EnquireLink::new(9).to_bytes().unwrap();
        peer.write_all(&bytes[..10]).await.unwrap();
        peer.flush().await.unwrap();
        drop(peer);

        assert!(matches!(
            connection.read_frame().await,
            Err(CodecError::ConnectionReset)
        ));
    }
}
