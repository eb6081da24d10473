//! The inbound message as handed over by a protocol listener.

use serde::{Deserialize, Serialize};

use crate::routing::normalize_address;

/// Sender, receiver, subject and body of one inbound message, before routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope sender (MAIL FROM), normalized.
    pub sender: String,
    /// Envelope receiver (RCPT TO), normalized.
    pub receiver: String,
    /// Subject line.
    pub subject: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl Envelope {
    /// Create an envelope, normalizing both addresses.
    #[must_use]
    pub fn new(
        sender: &str,
        receiver: &str,
        subject: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            sender: normalize_address(sender),
            receiver: normalize_address(receiver),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Build an envelope from an RFC 822 message.
    ///
    /// The subject comes from the `Subject` header (name matched
    /// case-insensitively, folded lines joined); the body is everything
    /// after the first blank line. A message without headers has an empty
    /// subject.
    #[must_use]
    pub fn from_rfc822(sender: &str, receiver: &str, raw: &[u8]) -> Self {
        let (head, body) = split_message(raw);
        let head = String::from_utf8_lossy(head);
        let subject = header_value(&head, "subject").unwrap_or_default();
        Self::new(sender, receiver, subject, body)
    }

    /// The body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Split at the first empty line (LF or CRLF).
fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut line_start = 0;
    for (i, &byte) in raw.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        let line = &raw[line_start..i];
        if line.is_empty() || line == b"\r" {
            return (&raw[..line_start], &raw[i + 1..]);
        }
        line_start = i + 1;
    }
    (raw, &[])
}

/// Unfolded value of the first header called `name`.
fn header_value(head: &str, name: &str) -> Option<String> {
    let mut value: Option<String> = None;
    for line in head.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some(current) = value.as_mut() {
                current.push(' ');
                current.push_str(line.trim());
            }
            continue;
        }
        if value.is_some() {
            break;
        }
        if let Some((key, rest)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case(name) {
                value = Some(rest.trim().to_string());
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_addresses() {
        let env = Envelope::new("<S@Y.COM>", " a@X.com ", "Hi", b"body".to_vec());
        assert_eq!(env.sender, "S@y.com");
        assert_eq!(env.receiver, "a@x.com");
    }

    #[test]
    fn test_from_rfc822_crlf() {
        let raw = b"From: s@y.com\r\nSubject: Hello there\r\nTo: a@x.com\r\n\r\nLine one\r\nLine two\r\n";
        let env = Envelope::from_rfc822("s@y.com", "a@x.com", raw);
        assert_eq!(env.subject, "Hello there");
        assert_eq!(env.body, b"Line one\r\nLine two\r\n");
    }

    #[test]
    fn test_from_rfc822_folded_subject() {
        let raw = b"subject: Quarterly\n\treport\nX-Other: 1\n\nbody\n";
        let env = Envelope::from_rfc822("s@y.com", "a@x.com", raw);
        assert_eq!(env.subject, "Quarterly report");
        assert_eq!(env.body_text(), "body\n");
    }

    #[test]
    fn test_from_rfc822_without_subject() {
        let env = Envelope::from_rfc822("s@y.com", "a@x.com", b"From: s@y.com\n\nhi");
        assert_eq!(env.subject, "");
        assert_eq!(env.body, b"hi");
    }

    #[test]
    fn test_from_rfc822_headers_only() {
        let env = Envelope::from_rfc822("s@y.com", "a@x.com", b"Subject: ping");
        assert_eq!(env.subject, "ping");
        assert!(env.body.is_empty());
    }

    #[test]
    fn test_body_text_is_lossy() {
        let env = Envelope::new("s@y.com", "a@x.com", "", vec![b'o', b'k', 0xff]);
        assert_eq!(env.body_text(), "ok\u{fffd}");
    }
}
