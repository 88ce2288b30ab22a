// Copyright (C) Parity Technologies (UK) Ltd.
// This file is part of Cumulus.
// SPDX-License-Identifier: GPL-3.0-or-later WITH Classpath-exception-2.0

// Cumulus is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Cumulus is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Cumulus. If not, see <https://www.gnu.org/licenses/>.

//! Terminal front-end showing the latest block number of a parachain.
//!
//! The parachain is followed through an embedded light client anchored to its relay chain. The
//! crate is split along the life of the page:
//! - [`chain_provider`] connects the light client once and shares the outcome;
//! - [`display`] watches the block number and renders it;
//! - [`app`] lays out the page and drives both on a single cooperative loop.

#![warn(missing_docs)]

pub mod app;
pub mod chain_provider;
pub mod cli;
pub mod display;
pub mod logger;

#[cfg(test)]
mod mock;
