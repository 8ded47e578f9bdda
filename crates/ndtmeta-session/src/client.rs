//! Client side of the meta test.

use ndtmeta_frame::MessageType;

use crate::error::ProtocolError;
use crate::messager::Messager;

/// Submit `lines` as meta data in response to a server-driven meta test.
///
/// Waits for TestPrepare and TestStart, sends each line as a TestMsg, ends the
/// data with an empty TestMsg and waits for TestFinalize. Lines are sent
/// verbatim; the server decides what it keeps.
pub fn submit_meta<M, S>(messager: &mut M, lines: &[S]) -> Result<(), ProtocolError>
where
    M: Messager + ?Sized,
    S: AsRef<str>,
{
    messager.receive_message(MessageType::TestPrepare)?;
    messager.receive_message(MessageType::TestStart)?;

    for line in lines {
        let line = line.as_ref();
        if line.is_empty() {
            // An empty TestMsg would end the data early.
            continue;
        }
        messager.send_message(MessageType::TestMsg, line.as_bytes())?;
    }
    messager.send_message(MessageType::TestMsg, &[])?;

    messager.receive_message(MessageType::TestFinalize)?;
    tracing::debug!(lines = lines.len(), "meta data submitted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use ndtmeta_frame::{
        decode_message, encode_message, FrameReader, FrameWriter, DEFAULT_MAX_PAYLOAD,
    };

    use super::*;
    use crate::messager::{Encoding, FramedMessager};

    fn server_script(kinds: &[MessageType]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for &kind in kinds {
            encode_message(kind, b"", &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn sends_lines_then_terminator() {
        let script = server_script(&[
            MessageType::TestPrepare,
            MessageType::TestStart,
            MessageType::TestFinalize,
        ]);
        let mut messager = FramedMessager::new(
            FrameReader::new(Cursor::new(script)),
            FrameWriter::new(Cursor::new(Vec::new())),
            Encoding::Plain,
        );

        submit_meta(&mut messager, &["os:linux", "", "browser:firefox"]).unwrap();

        let (_, writer) = messager.into_parts();
        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let mut payloads = Vec::new();
        while let Some(message) = decode_message(&mut wire, DEFAULT_MAX_PAYLOAD).unwrap() {
            assert_eq!(message.kind, MessageType::TestMsg);
            payloads.push(message.payload);
        }
        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0].as_ref(), b"os:linux");
        assert_eq!(payloads[1].as_ref(), b"browser:firefox");
        assert!(payloads[2].is_empty());
    }

    #[test]
    fn missing_finalize_is_an_error() {
        let script = server_script(&[MessageType::TestPrepare, MessageType::TestStart]);
        let mut messager = FramedMessager::new(
            FrameReader::new(Cursor::new(script)),
            FrameWriter::new(Cursor::new(Vec::new())),
            Encoding::Plain,
        );

        let err = submit_meta(&mut messager, &["os:linux"]).unwrap_err();
        assert!(matches!(err, ProtocolError::Disconnected(_)));
    }

    #[test]
    fn out_of_order_server_message_is_an_error() {
        let script = server_script(&[MessageType::TestStart]);
        let mut messager = FramedMessager::new(
            FrameReader::new(Cursor::new(script)),
            FrameWriter::new(Cursor::new(Vec::new())),
            Encoding::Plain,
        );

        let lines: Vec<String> = Vec::new();
        let err = submit_meta(&mut messager, lines.as_slice()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedMessage { .. }));
    }
}
