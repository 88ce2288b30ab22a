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

//! Common interface between the block watch front-end and the light client backing it.
//!
//! The front-end never talks to a light client implementation directly. It goes through
//! [`LightClientProvider`] to start a worker, through [`LightClientWorker`] to attach the relay
//! chain and the parachain anchored to it, and finally through [`ChainApi`] to watch the block
//! number of the parachain.

#![warn(missing_docs)]

mod chain_spec;
mod subscription;

pub use chain_spec::{ChainSpec, ChainSpecError};
pub use subscription::Subscription;

use async_trait::async_trait;
use std::fmt;

/// Block number as reported by the watched chain.
pub type BlockNumber = u64;

/// Finality tag of a watched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
	/// The most recent block known to the light client, prior to finality.
	#[default]
	Best,
	/// The most recent finalized block.
	Finalized,
}

impl fmt::Display for BlockTag {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			BlockTag::Best => write!(f, "best"),
			BlockTag::Finalized => write!(f, "finalized"),
		}
	}
}

/// Errors raised while bringing up the light client connection.
#[derive(thiserror::Error, Debug)]
pub enum LightClientError {
	/// A chain could not be added to the light client.
	#[error("Unable to add chain `{chain}`: {reason}")]
	AddChain {
		/// Name of the chain, as found in its specification.
		chain: String,
		/// Reason reported by the light client.
		reason: String,
	},
	/// A parachain referenced a relay chain the light client does not know about.
	#[error("Relay chain `{0}` is not known to the light client")]
	UnknownRelayChain(String),
	/// The chain API client could not be built on top of the light client.
	#[error("Unable to create the chain API client: {0}")]
	Client(String),
	/// Opaque failure reported by the backend.
	#[error("{0}")]
	Backend(String),
}

/// Result type used by the light client traits.
pub type LightClientResult<T> = Result<T, LightClientError>;

/// Errors raised while establishing or receiving from a value subscription.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
	/// The subscription could not be established.
	#[error("Failed to watch block number: {0}")]
	Subscribe(String),
	/// The subscription produced an error after it was established.
	#[error("{0}")]
	Stream(String),
	/// The subscription ended while values were still expected.
	#[error("Block number subscription ended")]
	Closed,
}

/// Entry point of a light client backend.
#[async_trait]
pub trait LightClientProvider: Send + Sync {
	/// Worker type started by this provider.
	type Worker: LightClientWorker;

	/// Start the background light client worker.
	async fn start_worker(&self) -> LightClientResult<Self::Worker>;
}

/// A running light client worker to which chains can be attached.
#[async_trait]
pub trait LightClientWorker: Send {
	/// Handle to a chain attached to the worker.
	type Chain: Send + Sync;
	/// API client produced for an attached chain.
	type Api: ChainApi;

	/// Attach a chain described by `spec`.
	///
	/// An empty `potential_relay_chains` attaches a relay chain. Otherwise the chain is a
	/// parachain anchored to one of the given relay chains.
	async fn add_chain(
		&mut self,
		spec: &ChainSpec,
		potential_relay_chains: &[&Self::Chain],
	) -> LightClientResult<Self::Chain>;

	/// Build a typed API client bound to `chain`.
	///
	/// The worker is handed over to the API client, which keeps the light client alive for as
	/// long as it exists.
	async fn create_api(self, chain: Self::Chain) -> LightClientResult<Self::Api>
	where
		Self: Sized;
}

/// Typed API client of a chain.
pub trait ChainApi: Send + Sync + 'static {
	/// Watch the block number of the chain at the given finality.
	///
	/// Every item of the returned subscription is the latest value. Failures to establish the
	/// subscription may be reported either here or as the first item of the stream.
	fn watch_block_number(
		&self,
		tag: BlockTag,
	) -> Result<Subscription<BlockNumber>, SubscriptionError>;
}
