/*
 * error.rs
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

//! JSON tokenizer errors.

use std::fmt;

/// Error during tokenization of a shadow payload.
#[derive(Debug)]
pub enum JsonError {
    /// The document needs more tokens than the fixed ceiling allows.
    /// The payload is unusable; nothing was extracted from it.
    TokenOverflow,
    /// Structural problem in the document.
    Message(String),
}

impl JsonError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonError::TokenOverflow => write!(f, "token ceiling exceeded"),
            JsonError::Message(m) => write!(f, "{}", m),
        }
    }
}

impl std::error::Error for JsonError {}
