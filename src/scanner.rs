//! PostScript scanner (tokenizer).
//!
//! This module provides low-level tokenization of PostScript byte streams.
//! It recognizes all Level-1 token types: numbers (including radix literals),
//! literal/hex/base-85 strings, literal names, and executable names.
//!
//! The scanner is hand-written rather than combinator-based because it is
//! stateful in ways a pure parser cannot be: the `eexec` operator switches
//! the *same* input position into a decrypting mode (ASCII-hex or binary
//! framing), and `closefile` switches it back mid-stream. Keeping decryption
//! inside the scanner preserves accurate line/column reporting across mode
//! changes.
//!
//! # Token overview
//!
//! - Numbers: integers (42, -17), reals (3.14, -2.5, 6e3), radix (16#FF)
//! - Strings: literal `(Hello)`, hex `<48656C6C6F>`, base-85 `<~87cUR~>`
//! - Names: literal `/Type` and executable `moveto`
//! - Structure: `[`, `]`, `<<`, `>>`, `{`, `}` are emitted as executable
//!   names and handled by the interpreter
//!
//! Comments (`%` to end of line) are skipped; line-initial `%%Key: value`
//! records (DSC comments) are captured for the caller.

use std::collections::VecDeque;

use crate::crypt::{self, Decrypt};
use crate::error::{ErrorKind, PostScriptError};
use crate::object::{Name, Object, PsString};

/// A captured `%%Key: value` document-structuring comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DscComment {
    /// The key between `%%` and `:`.
    pub key: String,
    /// The value after `:`, with `%%+` continuations joined by single spaces.
    pub value: String,
}

/// Decryption framing of the `eexec` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EexecMode {
    Off,
    Hex,
    Binary,
}

/// A byte-level tokenizer over a fully-buffered PostScript program.
pub struct Scanner {
    data: Vec<u8>,
    pos: usize,
    /// 0-based position of the next raw byte.
    line: usize,
    col: usize,
    /// Column of the most recently decoded byte (line-initial detection).
    last_col: usize,
    /// CR seen, so that a following LF does not count as a second newline.
    cr_pending: bool,
    /// Decoded-but-unconsumed bytes (populated by `peek` in decrypting modes).
    lookahead: VecDeque<u8>,
    mode: EexecMode,
    decrypt: Decrypt,
    dsc_comments: Vec<DscComment>,
}

type ScanResult<T> = std::result::Result<T, PostScriptError>;

fn syntax_error(message: impl Into<String>) -> PostScriptError {
    PostScriptError::new(ErrorKind::SyntaxError, message)
}

/// PostScript whitespace: NUL, TAB, LF, FF, CR, SPACE.
fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Regular characters are bytes > 32 that are not delimiters.
fn is_regular(b: u8) -> bool {
    b > 32 && !matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

impl Scanner {
    /// Create a scanner over a buffered program.
    pub fn new(data: Vec<u8>) -> Self {
        Scanner {
            data,
            pos: 0,
            line: 0,
            col: 0,
            last_col: 0,
            cr_pending: false,
            lookahead: VecDeque::new(),
            mode: EexecMode::Off,
            decrypt: Decrypt::new(crypt::EEXEC_KEY),
            dsc_comments: Vec::new(),
        }
    }

    /// 0-based line of the next byte.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 0-based column of the next byte.
    pub fn column(&self) -> usize {
        self.col
    }

    /// Drain the DSC comments captured so far.
    pub fn take_dsc_comments(&mut self) -> Vec<DscComment> {
        std::mem::take(&mut self.dsc_comments)
    }

    /// True while the scanner is decrypting an `eexec` section.
    pub fn in_eexec(&self) -> bool {
        self.mode != EexecMode::Off
    }

    // ------------------------------------------------------------------
    // Byte layer
    // ------------------------------------------------------------------

    /// Advance line/column bookkeeping for one raw byte.
    fn advance_position(&mut self, b: u8) {
        self.last_col = self.col;
        match b {
            b'\r' => {
                self.line += 1;
                self.col = 0;
                self.cr_pending = true;
            }
            b'\n' => {
                if !self.cr_pending {
                    self.line += 1;
                }
                self.col = 0;
                self.cr_pending = false;
            }
            _ => {
                self.col += 1;
                self.cr_pending = false;
            }
        }
    }

    /// Take the next raw byte out of the buffer.
    fn raw_byte(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        self.advance_position(b);
        Some(b)
    }

    /// Decode the next logical byte according to the current mode.
    fn decode_byte(&mut self) -> ScanResult<Option<u8>> {
        match self.mode {
            EexecMode::Off => Ok(self.raw_byte()),
            EexecMode::Binary => Ok(self.raw_byte().map(|c| self.decrypt.byte(c))),
            EexecMode::Hex => {
                let mut digits = [0u8; 2];
                let mut have = 0;
                while have < 2 {
                    match self.raw_byte() {
                        None => break,
                        Some(b) if is_whitespace(b) => continue,
                        Some(b) if b.is_ascii_hexdigit() => {
                            digits[have] = b;
                            have += 1;
                        }
                        Some(b) => {
                            return Err(syntax_error(format!(
                                "invalid character {:#04x} in hex-framed eexec data",
                                b
                            )))
                        }
                    }
                }
                match have {
                    0 => Ok(None),
                    1 => {
                        let hi = hex_value(digits[0]);
                        Ok(Some(self.decrypt.byte(hi << 4)))
                    }
                    _ => {
                        let cipher = (hex_value(digits[0]) << 4) | hex_value(digits[1]);
                        Ok(Some(self.decrypt.byte(cipher)))
                    }
                }
            }
        }
    }

    /// Next logical byte, honoring lookahead.
    fn next_byte(&mut self) -> ScanResult<Option<u8>> {
        if let Some(b) = self.lookahead.pop_front() {
            return Ok(Some(b));
        }
        self.decode_byte()
    }

    /// Look at the next logical byte without consuming it.
    fn peek_byte(&mut self) -> ScanResult<Option<u8>> {
        if let Some(&b) = self.lookahead.front() {
            return Ok(Some(b));
        }
        match self.decode_byte()? {
            Some(b) => {
                self.lookahead.push_front(b);
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }

    /// Read up to `n` logical bytes (used by `readstring`).
    pub fn read_bytes(&mut self, n: usize) -> ScanResult<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.next_byte()? {
                Some(b) => out.push(b),
                None => break,
            }
        }
        Ok(out)
    }

    /// Consume and discard a single logical byte (the delimiter that
    /// separates `readstring` from its data).
    pub fn skip_byte(&mut self) -> ScanResult<()> {
        self.next_byte()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // eexec mode control
    // ------------------------------------------------------------------

    /// Enter `eexec` decryption.
    ///
    /// Skips intervening whitespace, inspects the next four non-whitespace
    /// bytes (all ASCII hex digits selects hex framing, anything else binary),
    /// then consumes and discards the 4-byte IV.
    pub fn begin_eexec(&mut self) -> ScanResult<()> {
        // Leftover decoded bytes can only be whitespace here; drop them.
        while matches!(self.lookahead.front(), Some(b) if is_whitespace(*b)) {
            self.lookahead.pop_front();
        }
        while self.pos < self.data.len() && is_whitespace(self.data[self.pos]) {
            let b = self.data[self.pos];
            self.pos += 1;
            self.advance_position(b);
        }

        let probe: Vec<u8> = self.data[self.pos..]
            .iter()
            .copied()
            .filter(|b| !is_whitespace(*b))
            .take(4)
            .collect();
        let hex = probe.len() == 4 && probe.iter().all(|b| b.is_ascii_hexdigit());
        self.mode = if hex { EexecMode::Hex } else { EexecMode::Binary };
        self.decrypt = Decrypt::new(crypt::EEXEC_KEY);
        log::debug!(
            "entering eexec section at line {} ({} framing)",
            self.line,
            if hex { "hex" } else { "binary" }
        );

        for _ in 0..crypt::DEFAULT_LENIV {
            self.next_byte()?;
        }
        Ok(())
    }

    /// Leave `eexec` decryption (the `closefile` operator).
    pub fn end_eexec(&mut self) {
        if self.mode != EexecMode::Off {
            log::debug!("leaving eexec section at line {}", self.line);
        }
        self.mode = EexecMode::Off;
    }

    // ------------------------------------------------------------------
    // Token layer
    // ------------------------------------------------------------------

    /// Skip whitespace and comments, capturing DSC records.
    fn skip_filler(&mut self) -> ScanResult<Option<u8>> {
        loop {
            let b = match self.next_byte()? {
                Some(b) => b,
                None => return Ok(None),
            };
            if is_whitespace(b) {
                continue;
            }
            if b == b'%' {
                let line_initial = self.last_col == 0;
                self.consume_comment(line_initial)?;
                continue;
            }
            return Ok(Some(b));
        }
    }

    /// Consume a `%` comment to end of line, recording DSC entries.
    fn consume_comment(&mut self, line_initial: bool) -> ScanResult<()> {
        let mut text = Vec::new();
        loop {
            match self.peek_byte()? {
                None => break,
                Some(b'\r') | Some(b'\n') => break,
                Some(b) => {
                    self.next_byte()?;
                    text.push(b);
                }
            }
        }
        if line_initial && text.first() == Some(&b'%') {
            self.record_dsc(&text[1..]);
        }
        Ok(())
    }

    /// Record a DSC comment body (the text after `%%`).
    fn record_dsc(&mut self, body: &[u8]) {
        let body = String::from_utf8_lossy(body);
        if let Some(rest) = body.strip_prefix('+') {
            // Continuation line: joined to the previous record.
            if let Some(last) = self.dsc_comments.last_mut() {
                if !last.value.is_empty() {
                    last.value.push(' ');
                }
                last.value.push_str(rest.trim());
            }
        } else if let Some((key, value)) = body.split_once(':') {
            self.dsc_comments.push(DscComment {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
    }

    /// Scan the next token, or None at end of input.
    pub fn next_token(&mut self) -> ScanResult<Option<Object>> {
        let first = match self.skip_filler()? {
            Some(b) => b,
            None => return Ok(None),
        };
        match first {
            b'(' => self.scan_literal_string().map(Some),
            b'<' => match self.peek_byte()? {
                Some(b'<') => {
                    self.next_byte()?;
                    Ok(Some(Object::Operator(Name::new("<<"))))
                }
                Some(b'~') => {
                    self.next_byte()?;
                    self.scan_base85_string().map(Some)
                }
                _ => self.scan_hex_string().map(Some),
            },
            b'>' => match self.next_byte()? {
                Some(b'>') => Ok(Some(Object::Operator(Name::new(">>")))),
                _ => Err(syntax_error("unexpected '>'")),
            },
            b'/' => {
                let name = self.scan_regular_run(None)?;
                Ok(Some(Object::Name(Name::new(
                    String::from_utf8_lossy(&name).as_ref(),
                ))))
            }
            b'[' | b']' | b'{' | b'}' => {
                let s = (first as char).to_string();
                Ok(Some(Object::Operator(Name::new(s))))
            }
            b')' => Err(syntax_error("unbalanced ')'")),
            _ => {
                let word = self.scan_regular_run(Some(first))?;
                classify_word(&word).map(Some)
            }
        }
    }

    /// Collect a maximal run of regular characters, optionally seeded with
    /// an already-consumed first byte. The delimiting byte is not consumed.
    fn scan_regular_run(&mut self, first: Option<u8>) -> ScanResult<Vec<u8>> {
        let mut run = Vec::new();
        if let Some(b) = first {
            run.push(b);
        }
        while let Some(b) = self.peek_byte()? {
            if is_regular(b) {
                self.next_byte()?;
                run.push(b);
            } else {
                break;
            }
        }
        Ok(run)
    }

    /// Scan a parenthesized string; the opening `(` is already consumed.
    fn scan_literal_string(&mut self) -> ScanResult<Object> {
        let mut out = Vec::new();
        let mut depth = 1usize;
        loop {
            let b = self
                .next_byte()?
                .ok_or_else(|| syntax_error("unterminated string"))?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Object::String(PsString::new(out)));
                    }
                    out.push(b);
                }
                b'\\' => {
                    let esc = self
                        .next_byte()?
                        .ok_or_else(|| syntax_error("unterminated escape in string"))?;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'(' | b')' | b'\\' => out.push(esc),
                        b'\r' => {
                            // Line continuation: swallow an optional LF too.
                            if self.peek_byte()? == Some(b'\n') {
                                self.next_byte()?;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek_byte()? {
                                    Some(d @ b'0'..=b'7') => {
                                        self.next_byte()?;
                                        value = value * 8 + (d - b'0') as u32;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'\r' => {
                    // Bare CR, LF and CRLF all become a single newline.
                    if self.peek_byte()? == Some(b'\n') {
                        self.next_byte()?;
                    }
                    out.push(b'\n');
                }
                _ => out.push(b),
            }
        }
    }

    /// Scan a hex string; the opening `<` is already consumed.
    fn scan_hex_string(&mut self) -> ScanResult<Object> {
        let mut out = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            let b = self
                .next_byte()?
                .ok_or_else(|| syntax_error("unterminated hex string"))?;
            match b {
                b'>' => {
                    if let Some(hi) = pending {
                        out.push(hi << 4);
                    }
                    return Ok(Object::String(PsString::new(out)));
                }
                b if is_whitespace(b) => {}
                b if b.is_ascii_hexdigit() => {
                    let v = hex_value(b);
                    match pending.take() {
                        Some(hi) => out.push((hi << 4) | v),
                        None => pending = Some(v),
                    }
                }
                b => {
                    return Err(syntax_error(format!(
                        "invalid character {:#04x} in hex string",
                        b
                    )))
                }
            }
        }
    }

    /// Scan a base-85 string; the opening `<~` is already consumed.
    fn scan_base85_string(&mut self) -> ScanResult<Object> {
        let mut out = Vec::new();
        let mut group = [0u8; 5];
        let mut count = 0usize;
        loop {
            let b = self
                .next_byte()?
                .ok_or_else(|| syntax_error("unterminated base-85 string"))?;
            match b {
                b'~' => {
                    match self.next_byte()? {
                        Some(b'>') => {}
                        _ => return Err(syntax_error("expected '>' after '~' in base-85 string")),
                    }
                    match count {
                        0 => {}
                        1 => return Err(syntax_error("truncated base-85 group")),
                        n => {
                            // Pad with 'u' and keep the first n-1 output bytes.
                            for slot in group.iter_mut().take(5).skip(n) {
                                *slot = 84;
                            }
                            let word = decode_base85_group(&group)?;
                            out.extend_from_slice(&word.to_be_bytes()[..n - 1]);
                        }
                    }
                    return Ok(Object::String(PsString::new(out)));
                }
                b'z' if count == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
                b'z' => return Err(syntax_error("'z' inside base-85 group")),
                b'!'..=b'u' => {
                    group[count] = b - b'!';
                    count += 1;
                    if count == 5 {
                        let word = decode_base85_group(&group)?;
                        out.extend_from_slice(&word.to_be_bytes());
                        count = 0;
                    }
                }
                b if is_whitespace(b) => {}
                b => {
                    return Err(syntax_error(format!(
                        "invalid character {:#04x} in base-85 string",
                        b
                    )))
                }
            }
        }
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

fn decode_base85_group(digits: &[u8; 5]) -> ScanResult<u32> {
    let mut acc: u64 = 0;
    for &d in digits {
        acc = acc * 85 + d as u64;
    }
    if acc > u32::MAX as u64 {
        return Err(syntax_error("base-85 group out of range"));
    }
    Ok(acc as u32)
}

/// Classify a run of regular characters as a number or an executable name.
fn classify_word(word: &[u8]) -> ScanResult<Object> {
    let text = String::from_utf8_lossy(word).into_owned();

    if let Ok(i) = text.parse::<i64>() {
        return Ok(Object::Integer(i));
    }

    let numeric_shape = text
        .bytes()
        .next()
        .map(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
        .unwrap_or(false);
    if numeric_shape {
        if let Ok(r) = text.parse::<f64>() {
            if !r.is_finite() {
                return Err(PostScriptError::new(
                    ErrorKind::LimitCheck,
                    format!("number too large: {}", text),
                ));
            }
            return Ok(Object::Real(r));
        }
    }

    if let Some((base, digits)) = text.split_once('#') {
        if let Ok(base) = base.parse::<u32>() {
            if (2..=36).contains(&base)
                && !digits.is_empty()
                && digits.bytes().all(|b| (b as char).is_digit(base))
            {
                return match i64::from_str_radix(digits, base) {
                    Ok(v) => Ok(Object::Integer(v)),
                    Err(_) => Err(PostScriptError::new(
                        ErrorKind::LimitCheck,
                        format!("radix number too large: {}", text),
                    )),
                };
            }
        }
    }

    Ok(Object::Operator(Name::new(text)))
}
