//! Minimal STOMP 1.2 framing.
//!
//! Only the client side of the subscribe path is needed: CONNECT /
//! CONNECTED, SUBSCRIBE / UNSUBSCRIBE, MESSAGE, ERROR, DISCONNECT.
//! Frames are `COMMAND\nheader:value\n...\n\nbody\0`; header values in
//! non-CONNECT frames use the STOMP escape sequences.

use fraudfeed_core::StreamError;

/// One STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Client CONNECT frame. Heart-beats are disabled; the broker's bare
    /// newline heart-beats are tolerated on the read side regardless.
    pub fn connect(host: &str) -> Self {
        Self::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new("SUBSCRIBE")
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Self::new("UNSUBSCRIBE").with_header("id", id)
    }

    pub fn disconnect() -> Self {
        Self::new("DISCONNECT")
    }

    /// Serialize to wire format.
    pub fn encode(&self) -> String {
        let escape = self.command != "CONNECT" && self.command != "CONNECTED";
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse a frame from wire format. The trailing NUL is optional on
    /// input; some brokers strip it at the WebSocket layer.
    pub fn parse(raw: &str) -> Result<Self, StreamError> {
        let raw = raw.strip_suffix('\0').unwrap_or(raw);
        let raw = raw
            .strip_prefix("\r\n")
            .or_else(|| raw.strip_prefix('\n'))
            .unwrap_or(raw); // leading heart-beat
        let (head, body) = split_head_body(raw);

        let mut lines = head.lines();
        let command = lines
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| StreamError::Protocol("empty frame".into()))?
            .trim_end_matches('\r')
            .to_string();

        let unescape_needed = command != "CONNECT" && command != "CONNECTED";
        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StreamError::Protocol(format!("malformed header line '{line}'")))?;
            if unescape_needed {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        Ok(Self { command, headers, body: body.to_string() })
    }
}

/// Split head from body at the first blank line. STOMP 1.2 allows either
/// LF or CRLF line endings, so both separators must be recognized.
fn split_head_body(raw: &str) -> (&str, &str) {
    let lf = raw.find("\n\n").map(|i| (i, i + 2));
    let crlf = raw.find("\n\r\n").map(|i| (i, i + 3));
    match (lf, crlf) {
        (Some((h, b)), Some((h2, _))) if h < h2 => (&raw[..h], &raw[b..]),
        (_, Some((h, b))) | (Some((h, b)), None) => (&raw[..h], &raw[b..]),
        (None, None) => (raw, ""),
    }
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, StreamError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            other => {
                return Err(StreamError::Protocol(format!(
                    "invalid header escape '\\{}'",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
