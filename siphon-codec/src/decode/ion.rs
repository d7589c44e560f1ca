//! Streaming reader for the self-describing interchange text notation
//!
//! Values are pulled lazily from the underlying byte source; nothing beyond
//! the value currently being parsed is held in memory. Every malformed or
//! unsupported construct fails with a decode error carrying the byte offset
//! where parsing stopped.

use std::io::{BufReader, ErrorKind, Read};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use smallvec::SmallVec;

use siphon_format::{Decimal, Limits, Result, SiphonError, Timestamp, Value};

/// Bytes that may terminate a numeric token.
const NUMBER_TERMINATORS: &[u8] = b",]})[{(\"'/";

/// Byte scanner with single-byte lookahead and offset tracking.
struct Scanner<R: Read> {
    reader: BufReader<R>,
    peeked: Option<u8>,
    offset: u64,
}

impl<R: Read> Scanner<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            peeked: None,
            offset: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut byte = [0u8; 1];
            loop {
                match self.reader.read(&mut byte) {
                    Ok(0) => return Ok(None),
                    Ok(_) => {
                        self.peeked = Some(byte[0]);
                        break;
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(self.peeked)
    }

    fn next(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.peeked = None;
            self.offset += 1;
        }
        Ok(byte)
    }

    /// Offset of the next unconsumed byte.
    fn offset(&self) -> u64 {
        self.offset
    }
}

/// Lazy record reader for the interchange text notation
pub struct IonReader<R: Read> {
    scanner: Scanner<R>,
    limits: Limits,
    finished: bool,
}

impl<R: Read> IonReader<R> {
    /// Create a reader over a byte source.
    pub fn new(reader: R, limits: Limits) -> Self {
        Self {
            scanner: Scanner::new(reader),
            limits,
            finished: false,
        }
    }

    /// Pull the next top-level value, or `None` at end of input.
    fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            self.skip_trivia()?;
            if self.scanner.peek()?.is_none() {
                return Ok(None);
            }
            let value = self.parse_value(0)?;
            // A version marker at top level is framing, not data.
            if matches!(&value, Value::String(s) if s == "$ion_1_0") {
                continue;
            }
            return Ok(Some(value));
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value> {
        if depth > self.limits.max_depth {
            return Err(SiphonError::decode(
                self.scanner.offset(),
                "maximum nesting depth exceeded",
            ));
        }
        let mut annotations: SmallVec<[String; 2]> = SmallVec::new();
        loop {
            self.skip_trivia()?;
            let offset = self.scanner.offset();
            let Some(byte) = self.scanner.peek()? else {
                return Err(SiphonError::decode(
                    offset,
                    "unexpected end of input, expected a value",
                ));
            };
            let value = match byte {
                b'[' => self.parse_list(depth + 1)?,
                b'(' => {
                    return Err(SiphonError::decode(offset, "S-expressions are not supported"));
                }
                b'{' => self.parse_struct_or_lob(depth + 1)?,
                b'"' => {
                    let text = self.parse_string()?;
                    Value::String(text)
                }
                b'\'' => {
                    let symbol = self.parse_quoted_symbol()?;
                    if self.consume_annotation_marker()? {
                        self.push_annotation(&mut annotations, symbol, offset)?;
                        continue;
                    }
                    Value::String(symbol)
                }
                b'+' | b'-' | b'0'..=b'9' => self.parse_number()?,
                b if is_identifier_start(b) => {
                    let symbol = self.lex_identifier()?;
                    if self.consume_annotation_marker()? {
                        self.push_annotation(&mut annotations, symbol, offset)?;
                        continue;
                    }
                    self.keyword_or_symbol(symbol, offset)?
                }
                other => {
                    return Err(SiphonError::decode(
                        offset,
                        format!("unexpected character '{}'", other as char),
                    ));
                }
            };
            return Ok(Value::annotated(annotations.into_vec(), value));
        }
    }

    fn push_annotation(
        &mut self,
        annotations: &mut SmallVec<[String; 2]>,
        symbol: String,
        offset: u64,
    ) -> Result<()> {
        if annotations.len() >= self.limits.max_annotations_per_value {
            return Err(SiphonError::decode(
                offset,
                "too many annotations on one value",
            ));
        }
        annotations.push(symbol);
        Ok(())
    }

    /// Consume a `::` annotation marker if present.
    ///
    /// A single `:` in value position is always malformed.
    fn consume_annotation_marker(&mut self) -> Result<bool> {
        self.skip_trivia()?;
        if self.scanner.peek()? != Some(b':') {
            return Ok(false);
        }
        self.scanner.next()?;
        if self.scanner.peek()? != Some(b':') {
            return Err(SiphonError::decode(
                self.scanner.offset(),
                "single ':' after symbol, expected '::'",
            ));
        }
        self.scanner.next()?;
        Ok(true)
    }

    fn keyword_or_symbol(&mut self, symbol: String, offset: u64) -> Result<Value> {
        match symbol.as_str() {
            "null" => {
                // Typed nulls (`null.int`) all collapse to the plain null.
                if self.scanner.peek()? == Some(b'.') {
                    self.scanner.next()?;
                    let type_name = self.lex_identifier()?;
                    const NULL_TYPES: &[&str] = &[
                        "null", "bool", "int", "float", "decimal", "timestamp", "string",
                        "symbol", "blob", "clob", "list", "sexp", "struct",
                    ];
                    if !NULL_TYPES.contains(&type_name.as_str()) {
                        return Err(SiphonError::decode(
                            offset,
                            format!("unknown typed null 'null.{type_name}'"),
                        ));
                    }
                }
                Ok(Value::Null)
            }
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nan" => Ok(Value::Float(f64::NAN)),
            _ => Ok(Value::String(symbol)),
        }
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value> {
        self.scanner.next()?; // consume '['
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.scanner.peek()? {
                Some(b']') => {
                    self.scanner.next()?;
                    return Ok(Value::List(items));
                }
                Some(_) => {}
                None => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unexpected end of input in list",
                    ));
                }
            }
            items.push(self.parse_value(depth)?);
            self.skip_trivia()?;
            match self.scanner.peek()? {
                Some(b',') => {
                    self.scanner.next()?;
                }
                Some(b']') => {}
                Some(other) => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        format!("expected ',' or ']' in list, found '{}'", other as char),
                    ));
                }
                None => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unexpected end of input in list",
                    ));
                }
            }
        }
    }

    fn parse_struct_or_lob(&mut self, depth: usize) -> Result<Value> {
        self.scanner.next()?; // consume '{'
        if self.scanner.peek()? == Some(b'{') {
            self.scanner.next()?;
            return self.parse_lob();
        }
        let mut fields: Vec<(String, Value)> = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.scanner.peek()? {
                Some(b'}') => {
                    self.scanner.next()?;
                    return Ok(Value::Struct(fields));
                }
                Some(_) => {}
                None => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unexpected end of input in struct",
                    ));
                }
            }
            let name_offset = self.scanner.offset();
            let name = self.parse_field_name()?;
            if fields.iter().any(|(existing, _)| existing == &name) {
                return Err(SiphonError::decode(
                    name_offset,
                    format!("duplicate field name '{name}' in struct"),
                ));
            }
            if fields.len() >= self.limits.max_struct_fields {
                return Err(SiphonError::decode(name_offset, "too many fields in struct"));
            }
            self.skip_trivia()?;
            if self.scanner.next()? != Some(b':') {
                return Err(SiphonError::decode(
                    self.scanner.offset(),
                    format!("expected ':' after field name '{name}'"),
                ));
            }
            let value = self.parse_value(depth)?;
            fields.push((name, value));
            self.skip_trivia()?;
            match self.scanner.peek()? {
                Some(b',') => {
                    self.scanner.next()?;
                }
                Some(b'}') => {}
                Some(other) => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        format!("expected ',' or '}}' in struct, found '{}'", other as char),
                    ));
                }
                None => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unexpected end of input in struct",
                    ));
                }
            }
        }
    }

    fn parse_field_name(&mut self) -> Result<String> {
        let offset = self.scanner.offset();
        match self.scanner.peek()? {
            Some(b'"') => self.parse_string(),
            Some(b'\'') => self.parse_quoted_symbol(),
            Some(b) if is_identifier_start(b) => self.lex_identifier(),
            Some(other) => Err(SiphonError::decode(
                offset,
                format!("expected a field name, found '{}'", other as char),
            )),
            None => Err(SiphonError::decode(
                offset,
                "unexpected end of input, expected a field name",
            )),
        }
    }

    /// Parse a blob (`{{ base64 }}`) or clob (`{{ "text" }}`) payload.
    ///
    /// Both leading braces are already consumed.
    fn parse_lob(&mut self) -> Result<Value> {
        self.skip_whitespace()?;
        let offset = self.scanner.offset();
        if self.scanner.peek()? == Some(b'"') {
            // Clob: the text's raw bytes, no annotation of encoding
            let text = self.parse_string()?;
            self.skip_whitespace()?;
            self.expect_lob_close()?;
            return Ok(Value::Blob(text.into_bytes()));
        }
        let mut payload = String::new();
        loop {
            match self.scanner.peek()? {
                Some(b'}') => break,
                Some(b) if b.is_ascii_whitespace() => {
                    self.scanner.next()?;
                }
                Some(b)
                    if b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=' =>
                {
                    self.scanner.next()?;
                    payload.push(b as char);
                    if payload.len() > self.limits.max_blob_len {
                        return Err(SiphonError::decode(offset, "blob payload too large"));
                    }
                }
                Some(other) => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        format!("invalid base64 character '{}' in blob", other as char),
                    ));
                }
                None => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unexpected end of input in blob",
                    ));
                }
            }
        }
        self.expect_lob_close()?;
        let bytes = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| SiphonError::decode(offset, format!("invalid base64 in blob: {e}")))?;
        if bytes.len() > self.limits.max_blob_len {
            return Err(SiphonError::decode(offset, "blob payload too large"));
        }
        Ok(Value::Blob(bytes))
    }

    fn expect_lob_close(&mut self) -> Result<()> {
        for _ in 0..2 {
            if self.scanner.next()? != Some(b'}') {
                return Err(SiphonError::decode(
                    self.scanner.offset(),
                    "expected '}}' to close blob",
                ));
            }
        }
        Ok(())
    }

    fn parse_string(&mut self) -> Result<String> {
        let start = self.scanner.offset();
        self.scanner.next()?; // consume '"'
        let mut out = String::new();
        loop {
            let Some(byte) = self.scanner.next()? else {
                return Err(SiphonError::decode(start, "unterminated string"));
            };
            match byte {
                b'"' => return Ok(out),
                b'\\' => {
                    if let Some(ch) = self.parse_escape()? {
                        out.push(ch);
                    }
                }
                b if b < 0x20 => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unescaped control character in string",
                    ));
                }
                b => self.push_utf8_byte(&mut out, b)?,
            }
            if out.len() > self.limits.max_string_len {
                return Err(SiphonError::decode(start, "string value too large"));
            }
        }
    }

    fn parse_quoted_symbol(&mut self) -> Result<String> {
        let start = self.scanner.offset();
        self.scanner.next()?; // consume '\''
        if self.scanner.peek()? == Some(b'\'') {
            self.scanner.next()?;
            if self.scanner.peek()? == Some(b'\'') {
                return Err(SiphonError::decode(
                    start,
                    "long (triple-quoted) string literals are not supported",
                ));
            }
            // `''` is the empty symbol
            return Ok(String::new());
        }
        let mut out = String::new();
        loop {
            let Some(byte) = self.scanner.next()? else {
                return Err(SiphonError::decode(start, "unterminated quoted symbol"));
            };
            match byte {
                b'\'' => return Ok(out),
                b'\\' => {
                    if let Some(ch) = self.parse_escape()? {
                        out.push(ch);
                    }
                }
                b if b < 0x20 => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        "unescaped control character in quoted symbol",
                    ));
                }
                b => self.push_utf8_byte(&mut out, b)?,
            }
            if out.len() > self.limits.max_string_len {
                return Err(SiphonError::decode(start, "symbol too large"));
            }
        }
    }

    /// Append one raw byte of (possibly multi-byte) UTF-8 text.
    ///
    /// Continuation bytes are gathered until the sequence is complete.
    fn push_utf8_byte(&mut self, out: &mut String, first: u8) -> Result<()> {
        if first.is_ascii() {
            out.push(first as char);
            return Ok(());
        }
        let extra = match first {
            0xC0..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF7 => 3,
            _ => {
                return Err(SiphonError::decode(
                    self.scanner.offset(),
                    "invalid UTF-8 byte in text",
                ));
            }
        };
        let mut bytes = vec![first];
        for _ in 0..extra {
            let Some(byte) = self.scanner.next()? else {
                return Err(SiphonError::decode(
                    self.scanner.offset(),
                    "truncated UTF-8 sequence",
                ));
            };
            bytes.push(byte);
        }
        let text = std::str::from_utf8(&bytes).map_err(|_| {
            SiphonError::decode(self.scanner.offset(), "invalid UTF-8 sequence in text")
        })?;
        out.push_str(text);
        Ok(())
    }

    /// Parse one escape sequence; `None` means a line continuation.
    fn parse_escape(&mut self) -> Result<Option<char>> {
        let offset = self.scanner.offset();
        let Some(byte) = self.scanner.next()? else {
            return Err(SiphonError::decode(offset, "unterminated escape sequence"));
        };
        let ch = match byte {
            b'0' => '\0',
            b'a' => '\x07',
            b'b' => '\x08',
            b't' => '\t',
            b'n' => '\n',
            b'f' => '\x0C',
            b'r' => '\r',
            b'v' => '\x0B',
            b'"' => '"',
            b'\'' => '\'',
            b'?' => '?',
            b'\\' => '\\',
            b'/' => '/',
            b'\n' => return Ok(None),
            b'\r' => {
                if self.scanner.peek()? == Some(b'\n') {
                    self.scanner.next()?;
                }
                return Ok(None);
            }
            b'x' => {
                let code = self.read_hex_digits(2)?;
                char::from_u32(code).ok_or_else(|| {
                    SiphonError::decode(offset, "invalid \\x escape code point")
                })?
            }
            b'u' => return Ok(Some(self.parse_unicode_escape(offset)?)),
            b'U' => {
                let code = self.read_hex_digits(8)?;
                char::from_u32(code).ok_or_else(|| {
                    SiphonError::decode(offset, "invalid \\U escape code point")
                })?
            }
            other => {
                return Err(SiphonError::decode(
                    offset,
                    format!("unknown escape '\\{}'", other as char),
                ));
            }
        };
        Ok(Some(ch))
    }

    /// Parse a `\uXXXX` code unit, pairing surrogates when required.
    fn parse_unicode_escape(&mut self, offset: u64) -> Result<char> {
        let unit = self.read_hex_digits(4)?;
        match unit {
            0xD800..=0xDBFF => {
                // High surrogate: a `\u` low surrogate must follow
                if self.scanner.next()? != Some(b'\\') || self.scanner.next()? != Some(b'u') {
                    return Err(SiphonError::decode(
                        offset,
                        "high surrogate not followed by low surrogate escape",
                    ));
                }
                let low = self.read_hex_digits(4)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(SiphonError::decode(offset, "invalid low surrogate"));
                }
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code)
                    .ok_or_else(|| SiphonError::decode(offset, "invalid surrogate pair"))
            }
            0xDC00..=0xDFFF => Err(SiphonError::decode(offset, "unpaired low surrogate")),
            code => char::from_u32(code)
                .ok_or_else(|| SiphonError::decode(offset, "invalid \\u escape code point")),
        }
    }

    fn read_hex_digits(&mut self, count: usize) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let offset = self.scanner.offset();
            let Some(byte) = self.scanner.next()? else {
                return Err(SiphonError::decode(offset, "truncated hex escape"));
            };
            let digit = (byte as char)
                .to_digit(16)
                .ok_or_else(|| SiphonError::decode(offset, "invalid hex digit in escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Lex a numeric-looking token and classify it as an int, float,
    /// decimal, or timestamp.
    fn parse_number(&mut self) -> Result<Value> {
        let start = self.scanner.offset();

        // `+` only introduces positive infinity
        if self.scanner.peek()? == Some(b'+') {
            self.scanner.next()?;
            return self.expect_inf(start).map(|_| Value::Float(f64::INFINITY));
        }

        let mut token = String::new();
        if self.scanner.peek()? == Some(b'-') {
            self.scanner.next()?;
            if self.scanner.peek()? == Some(b'i') {
                return self.expect_inf(start).map(|_| Value::Float(f64::NEG_INFINITY));
            }
            token.push('-');
        }

        loop {
            match self.scanner.peek()? {
                Some(b)
                    if b.is_ascii_alphanumeric()
                        || matches!(b, b'_' | b'.' | b'+' | b'-' | b':') =>
                {
                    self.scanner.next()?;
                    token.push(b as char);
                }
                Some(b) if b.is_ascii_whitespace() || NUMBER_TERMINATORS.contains(&b) => break,
                None => break,
                Some(other) => {
                    return Err(SiphonError::decode(
                        self.scanner.offset(),
                        format!("unexpected character '{}' in number", other as char),
                    ));
                }
            }
        }

        classify_number(&token).map_err(|e| e.at_offset(start))
    }

    fn expect_inf(&mut self, start: u64) -> Result<()> {
        for expected in [b'i', b'n', b'f'] {
            if self.scanner.next()? != Some(expected) {
                return Err(SiphonError::decode(start, "invalid numeric literal"));
            }
        }
        Ok(())
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.scanner.peek()? {
                Some(b) if b.is_ascii_whitespace() => {
                    self.scanner.next()?;
                }
                Some(b'/') => {
                    let offset = self.scanner.offset();
                    self.scanner.next()?;
                    match self.scanner.next()? {
                        Some(b'/') => {
                            while let Some(byte) = self.scanner.next()? {
                                if byte == b'\n' {
                                    break;
                                }
                            }
                        }
                        Some(b'*') => self.skip_block_comment(offset)?,
                        _ => {
                            return Err(SiphonError::decode(offset, "unexpected '/'"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self, start: u64) -> Result<()> {
        let mut prev = 0u8;
        loop {
            let Some(byte) = self.scanner.next()? else {
                return Err(SiphonError::decode(start, "unterminated block comment"));
            };
            if prev == b'*' && byte == b'/' {
                return Ok(());
            }
            prev = byte;
        }
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.scanner.peek()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.scanner.next()?;
        }
        Ok(())
    }

    fn lex_identifier(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(b) = self.scanner.peek()? {
            if is_identifier_part(b) {
                self.scanner.next()?;
                out.push(b as char);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(SiphonError::decode(
                self.scanner.offset(),
                "expected an identifier",
            ));
        }
        Ok(out)
    }
}

impl<R: Read> Iterator for IonReader<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_identifier_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Classify a lexed numeric token and parse it.
fn classify_number(token: &str) -> Result<Value> {
    let body = token.strip_prefix('-').unwrap_or(token);
    if body.is_empty() {
        return Err(SiphonError::decode(0, "invalid numeric literal"));
    }

    // Radix-prefixed integers
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return parse_radix_int(token.starts_with('-'), hex, 16);
    }
    if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        return parse_radix_int(token.starts_with('-'), bin, 2);
    }

    // Timestamps: `2007T`, `2007-02-23`, `2007-02-23T12:14:33.079-08:00`
    let looks_like_timestamp = !token.starts_with('-')
        && (body.contains('T')
            || (body.len() >= 10
                && body.as_bytes().get(4) == Some(&b'-')
                && body.as_bytes()[..4].iter().all(u8::is_ascii_digit)));
    if looks_like_timestamp {
        return Timestamp::from_text(token).map(Value::Timestamp);
    }

    if token.contains(['e', 'E']) {
        let cleaned = clean_digit_separators(token)?;
        let parsed: f64 = cleaned
            .parse()
            .map_err(|_| SiphonError::decode(0, format!("invalid float literal '{token}'")))?;
        return Ok(Value::Float(parsed));
    }

    if token.contains(['.', 'd', 'D']) {
        let cleaned = clean_digit_separators(token)?;
        return Decimal::from_text(&cleaned).map(Value::Decimal);
    }

    let cleaned = clean_digit_separators(token)?;
    let digits = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(SiphonError::decode(
            0,
            format!("integer literal '{token}' has a leading zero"),
        ));
    }
    cleaned
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| SiphonError::decode(0, format!("integer literal '{token}' out of range")))
}

fn parse_radix_int(negative: bool, digits: &str, radix: u32) -> Result<Value> {
    let cleaned = clean_digit_separators(digits)?;
    let magnitude = i64::from_str_radix(&cleaned, radix)
        .map_err(|_| SiphonError::decode(0, format!("invalid base-{radix} integer literal")))?;
    Ok(Value::Int(if negative { -magnitude } else { magnitude }))
}

/// Strip `_` digit separators, requiring them to sit between digits.
fn clean_digit_separators(token: &str) -> Result<String> {
    if !token.contains('_') {
        return Ok(token.to_string());
    }
    let bytes = token.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let prev_ok = i > 0 && bytes[i - 1].is_ascii_alphanumeric();
            let next_ok = i + 1 < bytes.len() && bytes[i + 1].is_ascii_alphanumeric();
            if !prev_ok || !next_ok {
                return Err(SiphonError::decode(
                    0,
                    format!("misplaced digit separator in '{token}'"),
                ));
            }
        }
    }
    Ok(token.replace('_', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_all(input: &str) -> Result<Vec<Value>> {
        IonReader::new(input.as_bytes(), Limits::default()).collect()
    }

    fn read_one(input: &str) -> Value {
        let mut values = read_all(input).unwrap();
        assert_eq!(values.len(), 1, "expected one value in {input:?}");
        values.pop().unwrap()
    }

    #[test]
    fn test_scalars() {
        let cases = vec![
            ("null", Value::Null),
            ("null.int", Value::Null),
            ("null.struct", Value::Null),
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("0", Value::Int(0)),
            ("42", Value::Int(42)),
            ("-17", Value::Int(-17)),
            ("1_000_000", Value::Int(1_000_000)),
            ("0x1F", Value::Int(31)),
            ("-0x10", Value::Int(-16)),
            ("0b101", Value::Int(5)),
            ("1e0", Value::Float(1.0)),
            ("-2.5e3", Value::Float(-2500.0)),
            ("+inf", Value::Float(f64::INFINITY)),
            ("-inf", Value::Float(f64::NEG_INFINITY)),
            ("\"hello\"", Value::String("hello".into())),
            ("bare_symbol", Value::String("bare_symbol".into())),
            ("'quoted symbol'", Value::String("quoted symbol".into())),
        ];
        for (input, expected) in cases {
            assert_eq!(read_one(input), expected, "decoding {input}");
        }
    }

    #[test]
    fn test_nan_decodes_to_float() {
        match read_one("nan") {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_decimals() {
        let cases = vec![
            ("1.5", "1.5"),
            ("-0.5", "-0.5"),
            ("1d3", "1000"),
            ("1.5d-2", "0.015"),
            ("123.", "123"),
        ];
        for (input, rendered) in cases {
            match read_one(input) {
                Value::Decimal(d) => assert_eq!(d.to_json_string(), rendered, "decoding {input}"),
                other => panic!("expected decimal for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_timestamps() {
        let cases = vec![
            "2007T",
            "2007-02-23",
            "2007-02-23T12:14:33.079-08:00",
        ];
        for input in cases {
            match read_one(input) {
                Value::Timestamp(ts) => assert_eq!(ts.to_text(), input),
                other => panic!("expected timestamp for {input}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_string_escapes() {
        let cases = vec![
            (r#""a\nb""#, "a\nb"),
            (r#""tab\there""#, "tab\there"),
            (r#""quote\"inside""#, "quote\"inside"),
            (r#""back\\slash""#, "back\\slash"),
            (r#""é""#, "é"),
            (r#""\x41""#, "A"),
            (r#""\U0001F600""#, "😀"),
            (r#""😀""#, "😀"),
            ("\"split\\\nline\"", "splitline"),
        ];
        for (input, expected) in cases {
            assert_eq!(read_one(input), Value::String(expected.into()), "decoding {input}");
        }
    }

    #[test]
    fn test_blob_decodes_payload() {
        let value = read_one("{{ TGlzdGU= }}");
        assert_eq!(value, Value::Blob(b"Liste".to_vec()));
    }

    #[test]
    fn test_clob_keeps_raw_bytes() {
        let value = read_one(r#"{{ "raw text" }}"#);
        assert_eq!(value, Value::Blob(b"raw text".to_vec()));
    }

    #[test]
    fn test_annotations_preserved_in_order() {
        let value = read_one("base64::\"TGlzdGU=\"");
        assert_eq!(
            value,
            Value::Annotated {
                annotations: vec!["base64".into()],
                value: Box::new(Value::String("TGlzdGU=".into())),
            }
        );

        let value = read_one("a::b::42");
        assert_eq!(
            value,
            Value::Annotated {
                annotations: vec!["a".into(), "b".into()],
                value: Box::new(Value::Int(42)),
            }
        );
    }

    #[test]
    fn test_quoted_annotation() {
        let value = read_one("'my ann'::1");
        assert_eq!(
            value,
            Value::Annotated {
                annotations: vec!["my ann".into()],
                value: Box::new(Value::Int(1)),
            }
        );
    }

    #[test]
    fn test_containers() {
        let value = read_one("[1, two, [3.0e0]]");
        assert_eq!(
            value,
            Value::List(vec![
                Value::Int(1),
                Value::String("two".into()),
                Value::List(vec![Value::Float(3.0)]),
            ])
        );

        let value = read_one("{a: 1, \"b\": two, 'c d': {}}");
        assert_eq!(
            value,
            Value::Struct(vec![
                ("a".into(), Value::Int(1)),
                ("b".into(), Value::String("two".into())),
                ("c d".into(), Value::Struct(vec![])),
            ])
        );
    }

    #[test]
    fn test_trailing_commas_allowed() {
        assert_eq!(
            read_one("[1, 2,]"),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            read_one("{a: 1,}"),
            Value::Struct(vec![("a".into(), Value::Int(1))])
        );
    }

    #[test]
    fn test_field_order_preserved() {
        let value = read_one("{dn: \"x\", attributes: {}}");
        match value {
            Value::Struct(fields) => {
                let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["dn", "attributes"]);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_top_level_records() {
        let values = read_all("{a: 1}\n{a: 2}\n{a: 3}").unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_version_marker_skipped() {
        let values = read_all("$ion_1_0\n{a: 1}").unwrap();
        assert_eq!(values, vec![Value::Struct(vec![("a".into(), Value::Int(1))])]);
    }

    #[test]
    fn test_comments_skipped() {
        let values = read_all("// leading comment\n{a: /* inline */ 1}").unwrap();
        assert_eq!(values, vec![Value::Struct(vec![("a".into(), Value::Int(1))])]);
    }

    #[test]
    fn test_empty_input_is_empty_stream() {
        assert_eq!(read_all("").unwrap(), vec![]);
        assert_eq!(read_all("  \n\t ").unwrap(), vec![]);
        assert_eq!(read_all("// only a comment\n").unwrap(), vec![]);
    }

    #[test]
    fn test_malformed_input_errors_with_offset() {
        let cases = vec![
            "{a: 1",          // unterminated struct
            "[1, 2",          // unterminated list
            "\"abc",          // unterminated string
            "{a: }",          // missing value
            "{a 1}",          // missing ':'
            "{a: 1, a: 2}",   // duplicate field
            "(1 2)",          // sexp unsupported
            "007",            // leading zero
            "1.2.3",          // double fraction
            "{{ @@ }}",       // invalid base64 character
            "{{ TGlzdGU }}",  // broken base64 padding
            "x:1",            // single colon
            "99999999999999999999", // out of i64 range
            "'''long'''",     // long string unsupported
        ];
        for input in cases {
            let result = read_all(input);
            match result {
                Err(SiphonError::Decode { .. }) => {}
                other => panic!("expected decode error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_error_is_not_silently_skipped() {
        let mut reader = IonReader::new("{a: 1} {b: } {c: 3}".as_bytes(), Limits::default());
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        // Stream is fused after the first failure
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_depth_limit_enforced() {
        let mut limits = Limits::default();
        limits.max_depth = 4;
        let deep = "[[[[[[1]]]]]]";
        let result: Result<Vec<Value>> =
            IonReader::new(deep.as_bytes(), limits).collect();
        assert!(matches!(result, Err(SiphonError::Decode { .. })));
    }

    #[test]
    fn test_annotation_limit_enforced() {
        let mut limits = Limits::default();
        limits.max_annotations_per_value = 2;
        let result: Result<Vec<Value>> =
            IonReader::new("a::b::c::1".as_bytes(), limits).collect();
        assert!(matches!(result, Err(SiphonError::Decode { .. })));
    }

    #[test]
    fn test_original_fixture_shape() {
        let input = r#"{dn:"cn=tony@orga.com,ou=diffusion_list,dc=orga,dc=com",attributes:{description:["Some description 2",base64::"TGlzdGU=","Melusine lover as well"],someOtherAttribute:["perhaps 2","perhapsAgain 2"]}}"#;
        let value = read_one(input);
        let description = value
            .get("attributes")
            .and_then(|a| a.get("description"))
            .expect("description list");
        match description {
            Value::List(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(
                    items[1],
                    Value::Annotated {
                        annotations: vec!["base64".into()],
                        value: Box::new(Value::String("TGlzdGU=".into())),
                    }
                );
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_int_roundtrip(value in any::<i64>()) {
            let text = value.to_string();
            prop_assert_eq!(read_one(&text), Value::Int(value));
        }

        #[test]
        fn prop_string_roundtrip(text in "[a-zA-Z0-9 .,!?-]{0,64}") {
            let doc = format!("\"{text}\"");
            prop_assert_eq!(read_one(&doc), Value::String(text));
        }

        #[test]
        fn prop_truncation_never_panics(cut in 1usize..80) {
            let doc = r#"{dn:"someone",attributes:{tags:[one,base64::"TGlzdGU="],n:1.5}}"#;
            let cut = cut.min(doc.len() - 1);
            // Truncated docs must either fail cleanly or decode a prefix
            let _ = read_all(&doc[..cut]);
        }
    }
}
