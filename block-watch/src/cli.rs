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

//! Command line interface.

use crate::app::{AppConfig, DEFAULT_TITLE};
use block_watch_interface::{BlockTag, ChainSpec, ChainSpecError};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Show the latest block number of a parachain, followed through an embedded light client.
#[derive(Debug, Parser)]
#[clap(author, about, version)]
pub struct Cli {
	/// Path to the relay chain specification.
	#[clap(long, value_name = "PATH")]
	pub relay_chain_spec: PathBuf,

	/// Path to the specification of the parachain to watch.
	///
	/// The parachain must be anchored to the relay chain given by `--relay-chain-spec`.
	#[clap(long, value_name = "PATH")]
	pub parachain_spec: PathBuf,

	/// Finality of the watched block number.
	#[clap(long, value_enum, default_value_t = Finality::Best)]
	pub finality: Finality,

	/// Title shown at the top of the page.
	#[clap(long, default_value = DEFAULT_TITLE)]
	pub title: String,

	/// Sets a custom logging filter (syntax: `<target>=<level>`).
	///
	/// Log levels (least to most verbose) are `error`, `warn`, `info`, `debug`, and `trace`.
	#[clap(short = 'l', long, value_name = "LOG_PATTERN", num_args = 1..)]
	pub log: Vec<String>,
}

/// Finality of the watched block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Finality {
	/// Latest block, prior to finality.
	Best,
	/// Latest finalized block.
	Finalized,
}

impl From<Finality> for BlockTag {
	fn from(finality: Finality) -> Self {
		match finality {
			Finality::Best => BlockTag::Best,
			Finality::Finalized => BlockTag::Finalized,
		}
	}
}

impl Cli {
	/// Load the chain specifications and build the application configuration.
	pub fn app_config(&self) -> Result<AppConfig, ChainSpecError> {
		Ok(AppConfig {
			relay_chain_spec: ChainSpec::from_file(&self.relay_chain_spec)?,
			parachain_spec: ChainSpec::from_file(&self.parachain_spec)?,
			tag: self.finality.into(),
			title: self.title.clone(),
		})
	}
}
