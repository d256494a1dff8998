/*
 * scanner.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pontile, a cellular IoT sensor gateway.
 *
 * Pontile is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Token scanner: tokenizes one complete shadow payload into a flat array of
//! byte-range tokens with parent links, under a hard token-count ceiling.
//! No object model is built and no string is unescaped; every token is a pair
//! of offsets into the caller-owned buffer, valid only while that buffer is.

use bytes::BytesMut;
use log::debug;

use crate::config::TOKEN_CEILING;
use crate::json::error::JsonError;

/// Sentinel end offset for a container token whose close has not been seen yet.
const OPEN_END: usize = usize::MAX;

/// Leading bytes of the shadow `metadata` member, comma included.
const METADATA_MARKER: &[u8] = b",\"metadata\":";

/// Kind of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Object,
    Array,
    String,
    Primitive,
}

/// One token: a tagged byte range into the source buffer.
///
/// `start..end` is the token's span. String spans exclude the surrounding
/// quotes; container spans include their braces/brackets, so slicing an
/// object token reproduces the exact source fragment. `parent` is the index
/// of the enclosing token (`None` for the root). `size` counts immediate
/// children: keys for objects, elements for arrays, one for a key that has
/// its value, zero otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub parent: Option<usize>,
    pub size: usize,
}

/// Tokens produced by one [`scan`] call, in document order. Index 0 is the
/// document root.
#[derive(Debug)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
}

impl TokenBuffer {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Usability predicate: the scan produced at least one token and the
    /// document root is an object. Top-level arrays and empty input are
    /// rejected; shadow documents are always objects.
    pub fn root_is_object(&self) -> bool {
        matches!(self.tokens.first(), Some(t) if t.kind == TokenKind::Object)
    }
}

/// Truncate the trailing `"metadata"` member of a shadow document in place.
///
/// Shadow get/accepted responses carry a large `metadata` object mirroring
/// every reported value with timestamps; it is never extracted from and
/// would not fit under the token ceiling. The cloud shadow schema emits it
/// as the last top-level key, so overwriting the preceding comma with a
/// closing brace and cutting the buffer there yields a smaller document
/// with the same extractable content. Mutates the caller's buffer.
pub fn truncate_metadata(payload: &mut BytesMut) {
    if let Some(i) = payload
        .windows(METADATA_MARKER.len())
        .position(|w| w == METADATA_MARKER)
    {
        payload[i] = b'}';
        payload.truncate(i + 1);
        debug!("truncated shadow metadata at byte {}", i);
    }
}

/// Tokenize `src`. Returns the token array, or `JsonError::TokenOverflow`
/// when the document needs more than [`TOKEN_CEILING`] tokens. Scanning
/// stops at a NUL byte, so buffers carrying a C-style terminator are fine.
pub fn scan(src: &[u8]) -> Result<TokenBuffer, JsonError> {
    let mut tokens: Vec<Token> = Vec::with_capacity(TOKEN_CEILING);
    // Innermost token that new tokens attach to: the enclosing container,
    // or the key awaiting its value.
    let mut toksuper: Option<usize> = None;
    let mut pos = 0;

    while pos < src.len() {
        match src[pos] {
            b'\0' => break,
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'{' | b'[' => {
                let kind = if src[pos] == b'{' {
                    TokenKind::Object
                } else {
                    TokenKind::Array
                };
                let idx = push_token(&mut tokens, kind, pos, OPEN_END, toksuper)?;
                if let Some(p) = toksuper {
                    tokens[p].size += 1;
                }
                toksuper = Some(idx);
                pos += 1;
            }
            b'}' | b']' => {
                let kind = if src[pos] == b'}' {
                    TokenKind::Object
                } else {
                    TokenKind::Array
                };
                toksuper = close_container(&mut tokens, toksuper, kind, pos)?;
                pos += 1;
            }
            b'"' => {
                let content_end = scan_string(src, pos)?;
                push_token(&mut tokens, TokenKind::String, pos + 1, content_end, toksuper)?;
                if let Some(p) = toksuper {
                    tokens[p].size += 1;
                }
                pos = content_end + 1;
            }
            b':' => {
                if tokens.is_empty() {
                    return Err(JsonError::new("unexpected ':'"));
                }
                // The preceding string is the key; its value attaches to it.
                toksuper = Some(tokens.len() - 1);
                pos += 1;
            }
            b',' => {
                if let Some(s) = toksuper {
                    if tokens[s].kind != TokenKind::Object && tokens[s].kind != TokenKind::Array {
                        toksuper = tokens[s].parent;
                    }
                }
                pos += 1;
            }
            b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => {
                let end = scan_primitive(src, pos);
                push_token(&mut tokens, TokenKind::Primitive, pos, end, toksuper)?;
                if let Some(p) = toksuper {
                    tokens[p].size += 1;
                }
                pos = end;
            }
            b => return Err(JsonError::new(format!("unexpected character: {}", b as char))),
        }
    }

    if tokens.iter().any(|t| t.end == OPEN_END) {
        return Err(JsonError::new("unclosed structure"));
    }
    Ok(TokenBuffer { tokens })
}

fn push_token(
    tokens: &mut Vec<Token>,
    kind: TokenKind,
    start: usize,
    end: usize,
    parent: Option<usize>,
) -> Result<usize, JsonError> {
    if tokens.len() >= TOKEN_CEILING {
        return Err(JsonError::TokenOverflow);
    }
    tokens.push(Token {
        kind,
        start,
        end,
        parent,
        size: 0,
    });
    Ok(tokens.len() - 1)
}

/// Close the innermost open container, walking parent links upward from
/// `toksuper`. Returns the new attach point (the closed token's parent).
fn close_container(
    tokens: &mut [Token],
    toksuper: Option<usize>,
    kind: TokenKind,
    pos: usize,
) -> Result<Option<usize>, JsonError> {
    let mut i = match toksuper {
        Some(i) => i,
        None => return Err(JsonError::new("unmatched closing bracket")),
    };
    loop {
        if tokens[i].end == OPEN_END {
            if tokens[i].kind != kind {
                return Err(JsonError::new("mismatched closing bracket"));
            }
            tokens[i].end = pos + 1;
            return Ok(tokens[i].parent);
        }
        match tokens[i].parent {
            Some(p) => i = p,
            None => return Err(JsonError::new("unmatched closing bracket")),
        }
    }
}

/// Find the closing quote of the string opening at `start`. Escape sequences
/// are skipped over, never decoded; the span is carried through verbatim.
fn scan_string(src: &[u8], start: usize) -> Result<usize, JsonError> {
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'"' => return Ok(i),
            b'\\' => {
                i += 1;
                if i >= src.len() {
                    return Err(JsonError::new("unterminated escape in string"));
                }
                if src[i] == b'u' {
                    if i + 4 >= src.len() {
                        return Err(JsonError::new("incomplete \\u escape"));
                    }
                    i += 4;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    Err(JsonError::new("unclosed string"))
}

/// End offset (exclusive) of the primitive starting at `start`.
fn scan_primitive(src: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}' | b':' | b'\0' => break,
            _ => i += 1,
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(buf: &TokenBuffer) -> Vec<TokenKind> {
        buf.tokens().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_object_layout() {
        let src = br#"{"a":1}"#;
        let buf = scan(src).unwrap();
        assert!(buf.root_is_object());
        assert_eq!(
            kinds(&buf),
            vec![TokenKind::Object, TokenKind::String, TokenKind::Primitive]
        );
        // Root holds one key; the key holds its value.
        assert_eq!(buf.tokens()[0].size, 1);
        assert_eq!(buf.tokens()[1].size, 1);
        assert_eq!(buf.tokens()[1].parent, Some(0));
        assert_eq!(buf.tokens()[2].parent, Some(1));
    }

    #[test]
    fn string_span_excludes_quotes() {
        let src = br#"{"name":"value"}"#;
        let buf = scan(src).unwrap();
        let key = &buf.tokens()[1];
        let value = &buf.tokens()[2];
        assert_eq!(&src[key.start..key.end], b"name");
        assert_eq!(&src[value.start..value.end], b"value");
        assert_eq!(value.size, 0);
    }

    #[test]
    fn object_span_includes_braces() {
        let src = br#"{"state":{"led":1},"configVersion":7}"#;
        let buf = scan(src).unwrap();
        let state = &buf.tokens()[2];
        assert_eq!(state.kind, TokenKind::Object);
        assert_eq!(&src[state.start..state.end], br#"{"led":1}"#);
    }

    #[test]
    fn array_elements_link_to_array() {
        let src = br#"{"sensors":[["AABBCCDDEEFF",466280,true]]}"#;
        let buf = scan(src).unwrap();
        let toks = buf.tokens();
        // 0 root, 1 "sensors", 2 outer array, 3 inner array, 4 addr, 5 epoch, 6 bool
        assert_eq!(toks[2].kind, TokenKind::Array);
        assert_eq!(toks[2].size, 1);
        assert_eq!(toks[3].kind, TokenKind::Array);
        assert_eq!(toks[3].size, 3);
        assert_eq!(toks[3].parent, Some(2));
        assert_eq!(toks[4].kind, TokenKind::String);
        assert_eq!(toks[4].size, 0);
        assert_eq!(toks[4].parent, Some(3));
        assert_eq!(toks[6].kind, TokenKind::Primitive);
        assert_eq!(&src[toks[6].start..toks[6].end], b"true");
    }

    #[test]
    fn sibling_keys_share_parent() {
        let src = br#"{"a":1,"b":{"c":2}}"#;
        let buf = scan(src).unwrap();
        let toks = buf.tokens();
        assert_eq!(toks[1].parent, Some(0)); // "a"
        assert_eq!(toks[3].parent, Some(0)); // "b"
        assert_eq!(toks[5].parent, Some(4)); // "c" under the nested object
        assert_eq!(toks[0].size, 2);
    }

    #[test]
    fn root_array_is_not_usable() {
        let buf = scan(b"[1,2]").unwrap();
        assert!(!buf.root_is_object());
    }

    #[test]
    fn empty_input_is_not_usable() {
        let buf = scan(b"").unwrap();
        assert!(buf.is_empty());
        assert!(!buf.root_is_object());
    }

    #[test]
    fn scan_stops_at_nul() {
        let src = b"{\"a\":1}\0garbage";
        let buf = scan(src).unwrap();
        assert_eq!(buf.len(), 3);
        assert!(buf.root_is_object());
    }

    #[test]
    fn token_overflow_reported() {
        let mut doc = String::from("[");
        for i in 0..TOKEN_CEILING {
            if i > 0 {
                doc.push(',');
            }
            doc.push('1');
        }
        doc.push(']');
        match scan(doc.as_bytes()) {
            Err(JsonError::TokenOverflow) => {}
            other => panic!("expected overflow, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn unclosed_document_is_an_error() {
        assert!(scan(br#"{"a":1"#).is_err());
        assert!(scan(br#"{"a":"x"#).is_err());
    }

    #[test]
    fn truncate_metadata_strips_suffix() {
        let mut payload = BytesMut::from(
            &br#"{"state":{"reported":{"led":1}},"metadata":{"reported":{"led":{"timestamp":1}}}}"#
                [..],
        );
        truncate_metadata(&mut payload);
        assert_eq!(&payload[..], br#"{"state":{"reported":{"led":1}}}"#);
        let buf = scan(&payload).unwrap();
        assert!(buf.root_is_object());
    }

    #[test]
    fn truncate_metadata_without_marker_is_noop() {
        let mut payload = BytesMut::from(&br#"{"state":{"led":1}}"#[..]);
        truncate_metadata(&mut payload);
        assert_eq!(&payload[..], br#"{"state":{"led":1}}"#);
    }
}
