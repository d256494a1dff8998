/*
 * extract.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pontile.
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

//! Typed readers over single tokens. The numeric conversions are total:
//! a garbled shadow field reads as 0, never as an error, because a partial
//! or malformed cloud document must not take the gateway down.

use crate::json::scanner::Token;

/// Longest numeric token considered for conversion; u32 never needs more.
const MAX_CONVERSION_LEN: usize = 10;

/// Zero-copy view of the token's span. Invalid UTF-8 reads as empty.
/// The caller must copy before the source buffer is reused.
pub fn token_str<'a>(src: &'a [u8], tok: &Token) -> &'a str {
    let span = src.get(tok.start..tok.end).unwrap_or(b"");
    std::str::from_utf8(span).unwrap_or("")
}

/// Base-10 conversion of the token's span. 0 on malformed or oversized input.
pub fn decimal_u32(src: &[u8], tok: &Token) -> u32 {
    convert(src, tok, 10)
}

/// Base-16 conversion of the token's span. 0 on malformed or oversized input.
pub fn hex_u32(src: &[u8], tok: &Token) -> u32 {
    convert(src, tok, 16)
}

fn convert(src: &[u8], tok: &Token, radix: u32) -> u32 {
    let span = src.get(tok.start..tok.end).unwrap_or(b"");
    if span.len() > MAX_CONVERSION_LEN {
        return 0;
    }
    match std::str::from_utf8(span) {
        Ok(s) => u32::from_str_radix(s, radix).unwrap_or(0),
        Err(_) => 0,
    }
}

/// Read a primitive token as a boolean. The JSON grammar only produces
/// numbers, `true`, `false`, and `null` as primitives, so the first byte
/// being `t` identifies `true`.
pub fn primitive_bool(src: &[u8], tok: &Token) -> bool {
    src.get(tok.start) == Some(&b't')
}
