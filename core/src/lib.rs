/*
 * lib.rs
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

//! Pontile core: keeps a cellular IoT gateway synchronized with its cloud
//! device shadow. A fixed-ceiling token scanner extracts the known schema
//! paths from shadow documents (sensor whitelist, config deltas, event-log
//! replay, FOTA metadata), and a subscription state machine drives which
//! shadow topics the gateway holds under intermittent connectivity.

pub mod config;
pub mod json;
pub mod protocol;
