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

//! Chain specifications handed to the light client.

use serde::Deserialize;
use std::{
	fs,
	path::{Path, PathBuf},
};

/// Errors raised while loading a chain specification.
#[derive(thiserror::Error, Debug)]
pub enum ChainSpecError {
	/// The chain specification file could not be read.
	#[error("Unable to read chain spec `{}`: {source}", .path.display())]
	Io {
		/// Path of the chain specification.
		path: PathBuf,
		/// Underlying I/O error.
		source: std::io::Error,
	},
	/// The chain specification is not valid JSON, or misses required fields.
	#[error("Invalid chain spec: {0}")]
	Json(#[from] serde_json::Error),
}

/// The fields of a chain specification the front-end cares about.
///
/// Parachain specifications put their extensions at the top level, and both the snake case and
/// the camel case spelling are found in the wild.
#[derive(Deserialize)]
struct Fields {
	name: String,
	id: String,
	#[serde(default, alias = "relayChain", alias = "RelayChain")]
	relay_chain: Option<String>,
	#[serde(default, alias = "paraId", alias = "ParaId")]
	para_id: Option<u32>,
}

/// A chain specification, kept verbatim for the light client.
#[derive(Debug, Clone)]
pub struct ChainSpec {
	name: String,
	id: String,
	relay_chain: Option<String>,
	para_id: Option<u32>,
	json: String,
}

impl ChainSpec {
	/// Parse a chain specification from its JSON representation.
	pub fn from_json(json: impl Into<String>) -> Result<Self, ChainSpecError> {
		let json = json.into();
		let Fields { name, id, relay_chain, para_id } = serde_json::from_str(&json)?;

		Ok(ChainSpec { name, id, relay_chain, para_id, json })
	}

	/// Load a chain specification from a file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ChainSpecError> {
		let path = path.as_ref();
		let json = fs::read_to_string(path)
			.map_err(|source| ChainSpecError::Io { path: path.to_path_buf(), source })?;

		Self::from_json(json)
	}

	/// Human readable name of the chain.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Identifier of the chain.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Identifier of the relay chain this chain is anchored to, if it is a parachain.
	pub fn relay_chain(&self) -> Option<&str> {
		self.relay_chain.as_deref()
	}

	/// Parachain id, if it is a parachain.
	pub fn para_id(&self) -> Option<u32> {
		self.para_id
	}

	/// The verbatim JSON of the specification.
	pub fn as_json(&self) -> &str {
		&self.json
	}
}
