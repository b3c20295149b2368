/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/

//! Tokio codec for FIX message streams.
//!
//! The decoder frames bytes with the [`FrameScanner`] and decodes each frame
//! with the [`StructuralDecoder`]. Framing and decode faults are yielded as
//! [`Inbound`] items, never as stream errors, so one corrupt message does
//! not end the connection. The encoder writes message trees through the
//! [`StructuralEncoder`] and passes pre-encoded frames through unchanged.

use bytes::{Buf, BufMut, BytesMut};
use fixlane_core::{EncodeError, MessageTree};
use fixlane_dictionary::Dictionary;
use fixlane_tagvalue::{
    CodecConfig, ConfigError, DecodeFailure, DecodedMessage, FrameScanner, FramingFault,
    StructuralDecoder, StructuralEncoder,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

/// Errors that end a codec stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A message tree could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// One item read from the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A decoded message.
    Message(DecodedMessage),
    /// A framed message that failed to decode; carries the raw frame.
    DecodeFailed(DecodeFailure),
    /// Bytes the scanner discarded.
    FramingFault(FramingFault),
}

/// Tokio codec for FIX messages.
#[derive(Debug, Clone)]
pub struct FixMessageCodec {
    scanner: FrameScanner,
    decoder: StructuralDecoder,
    encoder: StructuralEncoder,
}

impl FixMessageCodec {
    /// Creates a codec from a dictionary and configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` for an invalid separator or filter expression.
    pub fn new(dictionary: Arc<Dictionary>, config: CodecConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            scanner: FrameScanner::from_config(&config)?,
            decoder: StructuralDecoder::new(Arc::clone(&dictionary), config.clone())?,
            encoder: StructuralEncoder::new(dictionary, config)?,
        })
    }

    /// Returns the structural decoder.
    #[must_use]
    pub const fn decoder(&self) -> &StructuralDecoder {
        &self.decoder
    }

    /// Returns the structural encoder.
    #[must_use]
    pub const fn encoder(&self) -> &StructuralEncoder {
        &self.encoder
    }
}

impl Decoder for FixMessageCodec {
    type Item = Inbound;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = 0;
        let span = match self.scanner.next_frame(&src[..], &mut cursor) {
            Ok(Some(frame)) => (cursor - frame.len(), frame.len()),
            Ok(None) => return Ok(None),
            Err(fault) => {
                src.advance(cursor.min(src.len()));
                return Ok(Some(Inbound::FramingFault(fault)));
            }
        };

        let (offset, len) = span;
        src.advance(offset);
        let frame = src.split_to(len).freeze();
        debug!(len, "framed message");
        Ok(Some(match self.decoder.decode_bytes(frame) {
            Ok(message) => Inbound::Message(message),
            Err(failure) => Inbound::DecodeFailed(failure),
        }))
    }
}

impl Encoder<&MessageTree> for FixMessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &MessageTree, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = self.encoder.encode(item)?;
        dst.reserve(frame.len());
        dst.put_slice(&frame);
        Ok(())
    }
}

impl Encoder<MessageTree> for FixMessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: MessageTree, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&MessageTree>::encode(self, &item, dst)
    }
}

impl Encoder<BytesMut> for FixMessageCodec {
    type Error = CodecError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlane_core::{DecodeError, FieldValue, FramingError, SchemaError, Timestamp};
    use fixlane_dictionary::embedded;
    use fixlane_tagvalue::calculate_checksum;
    use futures::{SinkExt, StreamExt};
    use tokio_util::codec::{Framed, FramedRead};

    fn codec() -> FixMessageCodec {
        FixMessageCodec::new(Arc::new(embedded::fix44().unwrap()), CodecConfig::default())
            .unwrap()
    }

    fn frame(msg_type: &str, body: &str) -> Vec<u8> {
        let body = format!(
            "35={msg_type}\x0149=A\x0156=B\x0134=1\x0152=20240101-12:30:00.000\x01{body}"
        );
        let mut msg = format!("8=FIX.4.4\x019={}\x01{body}", body.len());
        let sum = calculate_checksum(msg.as_bytes());
        msg.push_str(&format!("10={sum:03}\x01"));
        msg.into_bytes()
    }

    #[test]
    fn test_decode_complete_and_incomplete() {
        let mut codec = codec();
        let msg = frame("0", "");

        let mut partial = BytesMut::from(&msg[..msg.len() - 1]);
        assert_eq!(codec.decode(&mut partial).unwrap(), None);
        assert_eq!(partial.len(), msg.len() - 1);

        let mut buf = BytesMut::from(&msg[..]);
        let item = codec.decode(&mut buf).unwrap();
        assert!(matches!(item, Some(Inbound::Message(ref m)) if m.is_admin()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_garbage_yields_fault_then_message() {
        let mut codec = codec();
        let mut buf = BytesMut::from(&b"junk"[..]);
        buf.extend_from_slice(&frame("0", ""));

        let fault = codec.decode(&mut buf).unwrap();
        assert!(matches!(
            fault,
            Some(Inbound::FramingFault(FramingFault {
                cause: FramingError::GarbageBeforeBeginString { skipped: 4 },
                ..
            }))
        ));
        assert!(buf.starts_with(b"8=FIX"));
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(Inbound::Message(_))));
    }

    #[test]
    fn test_markerless_input_does_not_grow_buffer() {
        let mut codec = codec();
        let mut buf = BytesMut::from(&vec![b'x'; 4 * 1024 * 1024][..]);
        match codec.decode(&mut buf).unwrap() {
            Some(Inbound::FramingFault(fault)) => {
                assert!(matches!(
                    fault.cause,
                    FramingError::GarbageBeforeBeginString { .. }
                ));
                assert_eq!(fault.discarded, 4 * 1024 * 1024 - 4);
            }
            other => panic!("expected framing fault, got {other:?}"),
        }
        assert_eq!(buf.len(), 4);

        buf.extend_from_slice(&frame("0", ""));
        assert!(matches!(
            codec.decode(&mut buf).unwrap(),
            Some(Inbound::FramingFault(_))
        ));
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(Inbound::Message(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_failure_keeps_raw_bytes() {
        let mut codec = codec();
        let msg = frame("1", "");
        let mut buf = BytesMut::from(&msg[..]);
        match codec.decode(&mut buf).unwrap() {
            Some(Inbound::DecodeFailed(failure)) => {
                assert_eq!(&failure.raw[..], &msg[..]);
                assert_eq!(
                    failure.cause,
                    DecodeError::Schema(SchemaError::MissingRequiredField { tag: 112 })
                );
            }
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_tree() {
        let mut codec = codec();
        let mut tree = MessageTree::new("FIX.4.4", "0");
        let header = tree.header_mut();
        header.set_field("SenderCompID", 49, "A");
        header.set_field("TargetCompID", 56, "B");
        header.set_field("MsgSeqNum", 34, 1i64);
        header.set_field("SendingTime", 52, Timestamp::from_millis(1_704_112_200_000));

        let mut dst = BytesMut::new();
        codec.encode(&tree, &mut dst).unwrap();
        assert_eq!(&dst[..], &frame("0", "")[..]);
    }

    #[tokio::test]
    async fn test_framed_read_stream() {
        let mut stream = frame("0", "");
        stream.extend_from_slice(b"\r\n");
        stream.extend_from_slice(&frame("1", "112=PING\x01"));

        let mut reader = FramedRead::new(&stream[..], codec());
        let first = reader.next().await.unwrap().unwrap();
        assert!(matches!(first, Inbound::Message(_)));
        let second = reader.next().await.unwrap().unwrap();
        assert!(matches!(second, Inbound::FramingFault(_)));
        match reader.next().await.unwrap().unwrap() {
            Inbound::Message(message) => {
                let tree = message.tree().unwrap();
                assert_eq!(
                    tree.body().value(112).and_then(FieldValue::as_str),
                    Some("PING")
                );
            }
            other => panic!("expected message, got {other:?}"),
        }
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_framed_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let mut client = Framed::new(client, codec());
        let mut server = Framed::new(server, codec());

        let mut tree = MessageTree::new("FIX.4.4", "1");
        let header = tree.header_mut();
        header.set_field("SenderCompID", 49, "A");
        header.set_field("TargetCompID", 56, "B");
        header.set_field("MsgSeqNum", 34, 2i64);
        header.set_field("SendingTime", 52, Timestamp::from_millis(1_704_112_200_000));
        tree.body_mut().set_field("TestReqID", 112, "T1");

        client.send(tree.clone()).await.unwrap();
        match server.next().await.unwrap().unwrap() {
            Inbound::Message(message) => assert_eq!(message.into_tree(), Some(tree)),
            other => panic!("expected message, got {other:?}"),
        }
    }
}
