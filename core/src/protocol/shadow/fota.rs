/*
 * fota.rs
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

//! Firmware-update metadata extraction. FOTA fields are a sparse patch:
//! every field is independently optional, and each one found is pushed
//! straight into the externally-owned registry — there is no aggregate
//! result. An absent field leaves the stored value untouched.

use crate::json::{decimal_u32, probe, token_str, walk, PathStep, TokenKind};
use crate::protocol::shadow::decoder::ShadowDocument;

/// Firmware image class a FOTA field applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FotaImage {
    /// Application image.
    App,
    /// Cellular modem image.
    Modem,
}

impl FotaImage {
    /// Member name of this image class in the shadow document.
    pub fn key(self) -> &'static str {
        match self {
            FotaImage::App => "app",
            FotaImage::Modem => "modem",
        }
    }
}

/// Externally-owned FOTA configuration state. Setters must be idempotent;
/// the same value may be patched repeatedly as shadows are redelivered.
pub trait FotaRegistry: Send + Sync {
    fn set_desired_version(&self, image: FotaImage, version: &str);
    fn set_desired_filename(&self, image: FotaImage, filename: &str);
    fn set_switchover(&self, image: FotaImage, value: u32);
    fn set_start(&self, image: FotaImage, value: u32);
    fn set_error_count(&self, image: FotaImage, value: u32);
    /// Host the firmware bridge serves images from (document-wide).
    fn set_host(&self, host: &str);
    /// Transfer block size (document-wide).
    fn set_block_size(&self, value: u32);
}

impl ShadowDocument<'_> {
    /// Patch one image class from `state[.reported].<class>`, probing each
    /// of the five optional members against the same anchor.
    pub fn decode_fota(&self, image: FotaImage, registry: &dyn FotaRegistry) {
        let mut steps = self.state_steps();
        steps.push(PathStep::new(image.key(), TokenKind::Object));
        let found = match walk(self.buf, self.src, &steps) {
            Some(f) => f,
            None => return,
        };
        let anchor = found.cursor;
        let toks = self.buf.tokens();
        if let Some(v) = probe(self.buf, self.src, anchor, "desired", TokenKind::String) {
            registry.set_desired_version(image, token_str(self.src, &toks[v]));
        }
        if let Some(v) = probe(
            self.buf,
            self.src,
            anchor,
            "desiredFilename",
            TokenKind::String,
        ) {
            registry.set_desired_filename(image, token_str(self.src, &toks[v]));
        }
        if let Some(v) = probe(
            self.buf,
            self.src,
            anchor,
            "switchover",
            TokenKind::Primitive,
        ) {
            registry.set_switchover(image, decimal_u32(self.src, &toks[v]));
        }
        if let Some(v) = probe(self.buf, self.src, anchor, "start", TokenKind::Primitive) {
            registry.set_start(image, decimal_u32(self.src, &toks[v]));
        }
        if let Some(v) = probe(
            self.buf,
            self.src,
            anchor,
            "errorCount",
            TokenKind::Primitive,
        ) {
            registry.set_error_count(image, decimal_u32(self.src, &toks[v]));
        }
    }

    /// Patch the document-wide firmware bridge host from
    /// `state[.reported].fwBridge`.
    pub fn decode_fota_host(&self, registry: &dyn FotaRegistry) {
        let found = match walk(self.buf, self.src, &self.state_steps()) {
            Some(f) => f,
            None => return,
        };
        if let Some(v) = probe(
            self.buf,
            self.src,
            found.cursor,
            "fwBridge",
            TokenKind::String,
        ) {
            registry.set_host(token_str(self.src, &self.buf.tokens()[v]));
        }
    }

    /// Patch the document-wide transfer block size from
    /// `state[.reported].blockSize`.
    pub fn decode_fota_block_size(&self, registry: &dyn FotaRegistry) {
        let found = match walk(self.buf, self.src, &self.state_steps()) {
            Some(f) => f,
            None => return,
        };
        if let Some(v) = probe(
            self.buf,
            self.src,
            found.cursor,
            "blockSize",
            TokenKind::Primitive,
        ) {
            registry.set_block_size(decimal_u32(self.src, &self.buf.tokens()[v]));
        }
    }
}
