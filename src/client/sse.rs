//! Incremental `text/event-stream` decoder.

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Connection preamble or keep-alive; carries no stream unit.
    pub fn is_control(&self) -> bool {
        self.event.as_deref() == Some("open") || self.data.is_empty()
    }
}

/// Splits a byte stream into events. Chunks may cut events anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&String::from_utf8_lossy(&block)) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = SseEvent::default();
    let mut data_lines: Vec<&str> = Vec::new();
    let mut seen = false;

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "id" => event.id = Some(value.to_string()),
            "event" => event.event = Some(value.to_string()),
            "data" => data_lines.push(value),
            "retry" => event.retry = value.trim().parse().ok(),
            _ => continue,
        }
        seen = true;
    }

    if !seen {
        return None;
    }
    event.data = data_lines.join("\n");
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"id: 1\nda").is_empty());
        let events = decoder.feed(b"ta: {\"a\":1}\n\nid: 2\ndata: {}\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id.as_deref(), Some("1"));
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\r\n\r\nretry: 250\r\nevent: open\r\ndata: \"hello\"\r\n\r\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].retry, Some(250));
        assert!(events[0].is_control());
    }

    #[test]
    fn test_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: line one\ndata: line two\n\n");
        assert_eq!(events[0].data, "line one\nline two");
        assert!(!events[0].is_control());
    }
}
