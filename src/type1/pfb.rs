//! PFB framing.
//!
//! A PFB stream is a sequence of records `0x80 <type> <len-le-u32> <bytes>`
//! with type 1 for ASCII text, 2 for binary (the eexec section) and 3 for
//! end of file. The reader concatenates record payloads into the logical
//! font program regardless of how the producer split them; the writer emits
//! exactly three records plus the EOF marker.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, ErrorKind, PostScriptError, Result};

/// First byte of every PFB record.
pub const MARKER: u8 = 0x80;
/// Record type for ASCII segments.
pub const TYPE_ASCII: u8 = 1;
/// Record type for binary segments.
pub const TYPE_BINARY: u8 = 2;
/// Record type terminating the stream.
pub const TYPE_EOF: u8 = 3;

fn framing_error(message: impl Into<String>) -> Error {
    Error::Interpreter(PostScriptError::new(ErrorKind::IoError, message))
}

/// True if the buffer starts like a PFB stream.
pub fn is_pfb(data: &[u8]) -> bool {
    data.first() == Some(&MARKER)
}

/// Peel the PFB framing, concatenating all segment payloads into the
/// logical byte stream the scanner consumes.
pub fn unwrap(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut pos = 0;
    loop {
        if pos == data.len() {
            // A missing EOF record is tolerated.
            return Ok(out);
        }
        if pos + 2 > data.len() || data[pos] != MARKER {
            return Err(framing_error("malformed PFB record header"));
        }
        match data[pos + 1] {
            TYPE_EOF => return Ok(out),
            TYPE_ASCII | TYPE_BINARY => {
                if pos + 6 > data.len() {
                    return Err(framing_error("truncated PFB record length"));
                }
                let len = LittleEndian::read_u32(&data[pos + 2..pos + 6]) as usize;
                pos += 6;
                let end = pos
                    .checked_add(len)
                    .filter(|&e| e <= data.len())
                    .ok_or_else(|| framing_error("PFB record runs past end of stream"))?;
                out.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            t => return Err(framing_error(format!("unknown PFB record type {}", t))),
        }
    }
}

fn push_record(out: &mut Vec<u8>, record_type: u8, payload: &[u8]) {
    out.push(MARKER);
    out.push(record_type);
    let mut len = [0u8; 4];
    LittleEndian::write_u32(&mut len, payload.len() as u32);
    out.extend_from_slice(&len);
    out.extend_from_slice(payload);
}

/// Frame the three canonical segments of a Type 1 font program.
pub fn wrap(ascii_head: &[u8], binary: &[u8], ascii_tail: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ascii_head.len() + binary.len() + ascii_tail.len() + 26);
    push_record(&mut out, TYPE_ASCII, ascii_head);
    push_record(&mut out, TYPE_BINARY, binary);
    push_record(&mut out, TYPE_ASCII, ascii_tail);
    out.push(MARKER);
    out.push(TYPE_EOF);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let framed = wrap(b"head ", b"\x00\x01\x02", b" tail");
        assert!(is_pfb(&framed));
        let logical = unwrap(&framed).unwrap();
        assert_eq!(logical, b"head \x00\x01\x02 tail");
    }

    #[test]
    fn test_unwrap_accepts_arbitrary_splits() {
        // The same logical stream cut into many records.
        let mut framed = Vec::new();
        for chunk in [b"he".as_slice(), b"ad", b" x ", b"tail"] {
            push_record(&mut framed, TYPE_ASCII, chunk);
        }
        framed.extend_from_slice(&[MARKER, TYPE_EOF]);
        assert_eq!(unwrap(&framed).unwrap(), b"head x tail");
    }

    #[test]
    fn test_unwrap_without_eof_record() {
        let mut framed = Vec::new();
        push_record(&mut framed, TYPE_ASCII, b"only");
        assert_eq!(unwrap(&framed).unwrap(), b"only");
    }

    #[test]
    fn test_unwrap_rejects_bad_marker() {
        let err = unwrap(b"\x79\x01\x00\x00\x00\x00").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::IoError));
    }

    #[test]
    fn test_unwrap_rejects_unknown_type() {
        let err = unwrap(&[MARKER, 7, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::IoError));
    }

    #[test]
    fn test_unwrap_rejects_overlong_record() {
        let err = unwrap(&[MARKER, TYPE_ASCII, 10, 0, 0, 0, b'x']).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::IoError));
    }

    #[test]
    fn test_wrap_produces_three_records_and_eof() {
        let framed = wrap(b"a", b"b", b"c");
        // Record 1 header + "a", record 2 header + "b", record 3 header +
        // "c", then the two-byte EOF marker.
        assert_eq!(framed.len(), 3 * 7 + 2);
        assert_eq!(&framed[framed.len() - 2..], &[MARKER, TYPE_EOF]);
        assert_eq!(framed[1], TYPE_ASCII);
        assert_eq!(framed[8], TYPE_BINARY);
    }
}
