//! Incremental server-sent-events framing.
//!
//! Bytes arrive in arbitrary chunks; complete lines are cut from the front of
//! the buffer, `data:` lines are accumulated and a blank line dispatches the
//! accumulated payload.

use bytes::{Buf, BytesMut};

/// Splits an SSE byte stream into event payloads
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    data: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every payload it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = find_newline(&self.buf) {
            let line = self.buf.split_to(line_end);
            self.buf.advance(1);

            let line = String::from_utf8_lossy(&line);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.is_empty() {
                if let Some(data) = self.data.take() {
                    events.push(data);
                }
                continue;
            }

            // Comments and non-data fields (event, id, retry) carry nothing we use
            let Some(value) = line.strip_prefix("data:") else {
                continue;
            };
            let value = value.strip_prefix(' ').unwrap_or(value);

            match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            }
        }

        events
    }

    /// Drop any partial line or event (used when a connection is replaced)
    pub fn reset(&mut self) {
        self.buf.clear();
        self.data = None;
    }
}

fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"type\": \"heartbeat\"}\n\n");
        assert_eq!(events, vec![r#"{"type": "heartbeat"}"#.to_string()]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        assert!(decoder.push(b" 1}\n").is_empty());
        let events = decoder.push(b"\ndata: x\n\n");
        assert_eq!(events, vec![r#"{"a": 1}"#.to_string(), "x".to_string()]);
    }

    #[test]
    fn test_multiline_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data:first\r\ndata: second\r\n\r\n");
        assert_eq!(events, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": ping\n\nevent: log\nid: 7\ndata: payload\n\n");
        assert_eq!(events, vec!["payload".to_string()]);
    }

    #[test]
    fn test_reset_discards_partial_event() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: partial\n");
        decoder.reset();
        assert!(decoder.push(b"\n").is_empty());
    }
}
