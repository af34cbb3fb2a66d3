use super::{Error, ErrorKind};

use std::fmt;

/// Free-form error used for contextual wrapping and conditions without a
/// dedicated kind.
#[derive(Debug)]
pub(super) struct Message {
    message: String,
}

impl Message {
    pub(super) fn new(message: impl Into<String>) -> Message {
        Message {
            message: message.into(),
        }
    }

    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("message", self.message.clone())]
    }
}

impl Error {
    /// Creates an ad-hoc error from a message.
    pub fn msg(message: impl Into<String>) -> Error {
        ErrorKind::Message(Message::new(message)).into()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
