/*
 * path.rs
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

//! Path-scoped lookups over a token array: find a `"name": <value>` pair,
//! optionally anchored to a parent token, descending one document level per
//! step. Cursors are plain values threaded through each call, so probing
//! several sibling keys under one anchor is just reusing the same cursor.
//! Each step is a linear scan; the token ceiling bounds the cost.

use log::debug;

use crate::json::scanner::{TokenBuffer, TokenKind};

/// Parent requirement for a key match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Any parent is acceptable.
    Any,
    /// The key must be a direct member of this token.
    Under(usize),
}

/// Position of a path walk: the next token index to examine and the anchor
/// the next key must hang under.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub pos: usize,
    pub anchor: Anchor,
}

impl Cursor {
    /// Start of a walk from the document root. Token 0 is the root object
    /// itself, so scanning starts at 1.
    pub fn root() -> Self {
        Cursor {
            pos: 1,
            anchor: Anchor::Any,
        }
    }
}

/// Successful lookup: the value token's index and the cursor for descending
/// into it.
#[derive(Debug, Clone, Copy)]
pub struct Found {
    pub value: usize,
    pub cursor: Cursor,
}

/// One step of a path plan: member name and the expected value kind.
#[derive(Debug, Clone, Copy)]
pub struct PathStep<'a> {
    pub name: &'a str,
    pub kind: TokenKind,
}

impl<'a> PathStep<'a> {
    pub fn new(name: &'a str, kind: TokenKind) -> Self {
        PathStep { name, kind }
    }
}

/// Find the first `"name": <value>` pair at or after the cursor whose value
/// has the expected kind and whose key satisfies the cursor's anchor.
/// The returned cursor points past the value and anchors on it, ready for a
/// nested lookup.
pub fn find(
    buf: &TokenBuffer,
    src: &[u8],
    cursor: Cursor,
    name: &str,
    kind: TokenKind,
) -> Option<Found> {
    let toks = buf.tokens();
    let mut i = cursor.pos;
    while i + 1 < toks.len() {
        let key = &toks[i];
        let value = &toks[i + 1];
        let anchored = match cursor.anchor {
            Anchor::Any => true,
            Anchor::Under(p) => key.parent == Some(p),
        };
        if key.kind == TokenKind::String
            && src.get(key.start..key.end) == Some(name.as_bytes())
            && value.kind == kind
            && anchored
        {
            debug!("found '{}' at token {} (parent {:?})", name, i, key.parent);
            return Some(Found {
                value: i + 1,
                cursor: Cursor {
                    pos: i + 2,
                    anchor: Anchor::Under(i + 1),
                },
            });
        }
        i += 1;
    }
    None
}

/// [`find`] without consuming the caller's cursor: the cursor is `Copy`, so
/// several optional sibling keys can be probed against the same anchor.
/// Returns only the value token index.
pub fn probe(
    buf: &TokenBuffer,
    src: &[u8],
    cursor: Cursor,
    name: &str,
    kind: TokenKind,
) -> Option<usize> {
    find(buf, src, cursor, name, kind).map(|f| f.value)
}

/// Execute an ordered path plan from the document root, descending one level
/// per step. Returns the last step's match, or `None` at the first step that
/// fails.
pub fn walk(buf: &TokenBuffer, src: &[u8], steps: &[PathStep<'_>]) -> Option<Found> {
    let mut cursor = Cursor::root();
    let mut last = None;
    for step in steps {
        let found = find(buf, src, cursor, step.name, step.kind)?;
        cursor = found.cursor;
        last = Some(found);
    }
    last
}
