//! Bus payload `"<username>:<content>"`, split on the first colon.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub username: String,
    pub content: String,
}

impl Envelope {
    pub fn new(username: impl Into<String>, content: impl Into<String>) -> Envelope {
        Envelope {
            username: username.into(),
            content: content.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// `None` when the payload has no colon or is not UTF-8.
    pub fn decode(payload: &[u8]) -> Option<Envelope> {
        let text = std::str::from_utf8(payload).ok()?;
        let (username, content) = text.split_once(':')?;
        Some(Envelope::new(username, content))
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.username, self.content)
    }
}
