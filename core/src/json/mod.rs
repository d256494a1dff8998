/*
 * mod.rs
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

//! Schema-aware JSON extraction without an object model: a fixed-ceiling
//! token scanner, path-scoped lookups, and typed single-token readers.

mod error;
mod extract;
mod path;
mod scanner;

pub use error::JsonError;
pub use extract::{decimal_u32, hex_u32, primitive_bool, token_str};
pub use path::{find, probe, walk, Anchor, Cursor, Found, PathStep};
pub use scanner::{scan, truncate_metadata, Token, TokenBuffer, TokenKind};
