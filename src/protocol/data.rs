use crate::error::MessageError;

/// Byte repeated to pad a data payload to the configured size.
pub const FILLER_BYTE: u8 = b'x';
const FIELD_SEPARATOR: u8 = b':';

/// One sequenced data message: `"{sequence}:{emitted_at_ms}:{filler}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataMessage {
    pub sequence: u64,
    pub emitted_at_ms: u64,
}

impl DataMessage {
    #[must_use]
    pub const fn new(sequence: u64, emitted_at_ms: u64) -> Self {
        Self {
            sequence,
            emitted_at_ms,
        }
    }

    /// Wire form with `payload_size` filler bytes appended.
    #[must_use]
    pub fn encode(&self, payload_size: usize) -> Vec<u8> {
        let header = format!("{}:{}:", self.sequence, self.emitted_at_ms);
        let mut out = Vec::with_capacity(header.len().saturating_add(payload_size));
        out.extend_from_slice(header.as_bytes());
        out.resize(out.len().saturating_add(payload_size), FILLER_BYTE);
        out
    }

    /// Parses the two leading fields; whatever follows the second separator
    /// is filler and is not inspected.
    ///
    /// # Errors
    ///
    /// Returns an error when a field is missing, not UTF-8, or not an integer.
    pub fn parse(payload: &[u8]) -> Result<Self, MessageError> {
        let mut fields = payload.splitn(3, |byte| *byte == FIELD_SEPARATOR);
        let sequence = parse_field(fields.next(), "sequence")?;
        let emitted_at_ms = parse_field(fields.next(), "timestamp")?;
        Ok(Self {
            sequence,
            emitted_at_ms,
        })
    }
}

fn parse_field(raw: Option<&[u8]>, field: &'static str) -> Result<u64, MessageError> {
    let raw = raw.ok_or(MessageError::MissingField { field })?;
    let text = std::str::from_utf8(raw)
        .map_err(|err| MessageError::InvalidUtf8 { field, source: err })?;
    text.trim()
        .parse::<u64>()
        .map_err(|err| MessageError::InvalidInteger {
            field,
            value: text.to_owned(),
            source: err,
        })
}
