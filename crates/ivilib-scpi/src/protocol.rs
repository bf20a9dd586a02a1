//! SCPI framing: newline-terminated ASCII lines and IEEE-488.2 blocks.
//!
//! Commands and replies are single lines terminated by `\n` (an optional
//! preceding `\r` is stripped). Bulk data arrives as an IEEE-488.2 block:
//!
//! * definite form `#<n><len><payload>`, where `<n>` is one digit giving the
//!   number of length digits that follow,
//! * indefinite form `#0<payload>\n`, terminated by the end of the message.
//!
//! Both decoders work on a byte buffer and report how many bytes they
//! consumed, or that more data is needed.

/// Line terminator for commands and replies.
pub const TERMINATOR: u8 = b'\n';

/// Result of attempting to decode one reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineResult {
    /// A complete line was decoded.
    Line {
        /// The reply text without terminator.
        text: String,
        /// Number of bytes consumed from the input buffer.
        consumed: usize,
    },
    /// No terminator yet. More data is needed.
    Incomplete,
}

/// Result of attempting to decode one binary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockResult {
    /// A complete block was decoded.
    Block {
        /// Payload bytes.
        payload: Vec<u8>,
        /// Number of bytes consumed, including any trailing terminator.
        consumed: usize,
    },
    /// The block header or payload is not complete yet.
    Incomplete,
    /// The buffer does not start with a valid block header.
    Invalid(String),
}

/// Encode a command for the wire, appending the terminator.
///
/// # Examples
///
/// ```
/// use ivilib_scpi::protocol::encode_command;
///
/// assert_eq!(encode_command(":source1:frequency?"), b":source1:frequency?\n");
/// assert_eq!(encode_command("*RST\n"), b"*RST\n");
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let body = command.trim_end_matches(['\r', '\n']);
    let mut out = Vec::with_capacity(body.len() + 1);
    out.extend_from_slice(body.as_bytes());
    out.push(TERMINATOR);
    out
}

/// Decode one reply line from the front of `buf`.
pub fn decode_line(buf: &[u8]) -> LineResult {
    let Some(pos) = buf.iter().position(|&b| b == TERMINATOR) else {
        return LineResult::Incomplete;
    };
    let mut body = &buf[..pos];
    if body.last() == Some(&b'\r') {
        body = &body[..body.len() - 1];
    }
    LineResult::Line {
        text: String::from_utf8_lossy(body).into_owned(),
        consumed: pos + 1,
    }
}

/// Decode one IEEE-488.2 block from the front of `buf`.
///
/// Leading whitespace before `#` is skipped.
pub fn decode_block(buf: &[u8]) -> BlockResult {
    let skip = buf
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(buf.len());
    let buf_all = buf;
    let buf = &buf[skip..];
    if buf.is_empty() {
        return BlockResult::Incomplete;
    }
    if buf[0] != b'#' {
        return BlockResult::Invalid(format!(
            "expected '#' block header, got {:?}",
            String::from_utf8_lossy(&buf[..buf.len().min(16)])
        ));
    }
    if buf.len() < 2 {
        return BlockResult::Incomplete;
    }
    let digits = match (buf[1] as char).to_digit(10) {
        Some(d) => d as usize,
        None => {
            return BlockResult::Invalid(format!(
                "block header digit count {:?} is not a digit",
                buf[1] as char
            ));
        }
    };

    if digits == 0 {
        // Indefinite form: the message terminator closes the block.
        return match buf.last() {
            Some(&TERMINATOR) if buf.len() > 2 => BlockResult::Block {
                payload: buf[2..buf.len() - 1].to_vec(),
                consumed: buf_all.len(),
            },
            _ => BlockResult::Incomplete,
        };
    }

    let header_len = 2 + digits;
    if buf.len() < header_len {
        return BlockResult::Incomplete;
    }
    let len_str = match std::str::from_utf8(&buf[2..header_len]) {
        Ok(s) => s,
        Err(_) => return BlockResult::Invalid("block length is not ASCII".into()),
    };
    let len: usize = match len_str.parse() {
        Ok(n) => n,
        Err(_) => {
            return BlockResult::Invalid(format!("block length {len_str:?} is not a number"));
        }
    };
    let end = header_len + len;
    if buf.len() < end {
        return BlockResult::Incomplete;
    }

    let mut consumed = skip + end;
    if buf_all.get(consumed) == Some(&b'\r') {
        consumed += 1;
    }
    if buf_all.get(consumed) == Some(&TERMINATOR) {
        consumed += 1;
    }
    BlockResult::Block {
        payload: buf[header_len..end].to_vec(),
        consumed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_single_terminator() {
        assert_eq!(encode_command(":output1 1"), b":output1 1\n");
        assert_eq!(encode_command(":output1 1\r\n"), b":output1 1\n");
    }

    #[test]
    fn decode_line_incomplete() {
        assert_eq!(decode_line(b""), LineResult::Incomplete);
        assert_eq!(decode_line(b"1.000000E+03"), LineResult::Incomplete);
    }

    #[test]
    fn decode_line_strips_crlf() {
        assert_eq!(
            decode_line(b"OMEG\r\nrest"),
            LineResult::Line {
                text: "OMEG".into(),
                consumed: 6,
            }
        );
    }

    #[test]
    fn decode_definite_block() {
        assert_eq!(
            decode_block(b"#15hello\n"),
            BlockResult::Block {
                payload: b"hello".to_vec(),
                consumed: 9,
            }
        );
        assert_eq!(
            decode_block(b"#210\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09"),
            BlockResult::Block {
                payload: (0u8..10).collect(),
                consumed: 14,
            }
        );
    }

    #[test]
    fn definite_block_may_contain_newlines() {
        assert_eq!(
            decode_block(b"#13\n\n\n\n"),
            BlockResult::Block {
                payload: b"\n\n\n".to_vec(),
                consumed: 7,
            }
        );
    }

    #[test]
    fn decode_block_waits_for_payload() {
        assert_eq!(decode_block(b"#"), BlockResult::Incomplete);
        assert_eq!(decode_block(b"#3"), BlockResult::Incomplete);
        assert_eq!(decode_block(b"#3100abc"), BlockResult::Incomplete);
    }

    #[test]
    fn decode_indefinite_block() {
        assert_eq!(
            decode_block(b"#0\x01\x02\x03\n"),
            BlockResult::Block {
                payload: vec![1, 2, 3],
                consumed: 6,
            }
        );
        assert_eq!(decode_block(b"#0\x01\x02"), BlockResult::Incomplete);
    }

    #[test]
    fn decode_block_skips_leading_whitespace() {
        assert_eq!(
            decode_block(b"\r\n#12ab"),
            BlockResult::Block {
                payload: b"ab".to_vec(),
                consumed: 7,
            }
        );
    }

    #[test]
    fn decode_block_rejects_garbage() {
        assert!(matches!(decode_block(b"1,2,3\n"), BlockResult::Invalid(_)));
        assert!(matches!(decode_block(b"#x12"), BlockResult::Invalid(_)));
        assert!(matches!(decode_block(b"#2ab"), BlockResult::Invalid(_)));
    }
}
