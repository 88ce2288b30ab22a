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

//! Embedded light client backend.
//!
//! Chains are attached to a [smoldot](https://crates.io/crates/smoldot-light) instance driven by
//! `subxt`. Adding the relay chain starts the instance, parachains are then added on top of it.
//! The API client built for a chain owns the instance, so the light client keeps syncing for
//! as long as the API client is alive.

use async_trait::async_trait;
use block_watch_interface::{
	BlockNumber, BlockTag, ChainApi, ChainSpec, LightClientError, LightClientProvider,
	LightClientResult, LightClientWorker, Subscription, SubscriptionError,
};
use futures::{stream, Stream, StreamExt, TryStreamExt};
use std::{fmt, future::Future};
use subxt::{
	blocks::Block,
	lightclient::{LightClient, LightClientRpc},
	OnlineClient, PolkadotConfig,
};

const LOG_TARGET: &str = "light-client";

/// Provider starting an embedded smoldot light client.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmoldotProvider;

#[async_trait]
impl LightClientProvider for SmoldotProvider {
	type Worker = SmoldotWorker;

	async fn start_worker(&self) -> LightClientResult<SmoldotWorker> {
		tracing::debug!(target: LOG_TARGET, "Starting embedded light client worker");
		Ok(SmoldotWorker::default())
	}
}

/// The relay chain a worker has been started with.
struct RelayChain {
	id: String,
	client: LightClient,
	rpc: LightClientRpc,
}

/// Light client worker. Holds the smoldot instance once a relay chain has been added.
#[derive(Default)]
pub struct SmoldotWorker {
	relay_chain: Option<RelayChain>,
}

enum ChainKind {
	Relay,
	Parachain(LightClientRpc),
}

/// Handle to a chain attached to a [`SmoldotWorker`].
pub struct SmoldotChain {
	id: String,
	kind: ChainKind,
}

/// How a chain gets attached to a worker.
#[derive(Debug)]
enum Attachment<R> {
	/// Start the light client with the chain as its relay chain.
	Relay,
	/// Add the chain on top of the running relay chain.
	Parachain(R),
}

/// Decide how the chain described by `spec` is attached, given the relay chain already running,
/// if any.
fn attachment<R>(
	running: Option<(&str, R)>,
	spec: &ChainSpec,
	potential_relay_chains: &[&SmoldotChain],
) -> LightClientResult<Attachment<R>> {
	match running {
		None if potential_relay_chains.is_empty() => Ok(Attachment::Relay),
		Some((id, _)) if potential_relay_chains.is_empty() => Err(LightClientError::AddChain {
			chain: spec.name().to_string(),
			reason: format!("relay chain `{id}` is already running"),
		}),
		Some((id, relay)) if potential_relay_chains.iter().any(|chain| chain.id == id) =>
			Ok(Attachment::Parachain(relay)),
		_ => {
			let requested = potential_relay_chains
				.iter()
				.map(|chain| chain.id.as_str())
				.collect::<Vec<_>>()
				.join(", ");
			Err(LightClientError::UnknownRelayChain(requested))
		},
	}
}

#[async_trait]
impl LightClientWorker for SmoldotWorker {
	type Chain = SmoldotChain;
	type Api = SmoldotApi;

	async fn add_chain(
		&mut self,
		spec: &ChainSpec,
		potential_relay_chains: &[&SmoldotChain],
	) -> LightClientResult<SmoldotChain> {
		let add_chain_error = |reason: String| LightClientError::AddChain {
			chain: spec.name().to_string(),
			reason,
		};

		let running = self.relay_chain.as_ref().map(|relay| (relay.id.as_str(), relay));
		match attachment(running, spec, potential_relay_chains)? {
			Attachment::Relay => {
				let (client, rpc) = LightClient::relay_chain(spec.as_json())
					.map_err(|err| add_chain_error(err.to_string()))?;
				tracing::debug!(target: LOG_TARGET, chain = %spec.id(), "Relay chain added");

				self.relay_chain = Some(RelayChain { id: spec.id().to_string(), client, rpc });
				Ok(SmoldotChain { id: spec.id().to_string(), kind: ChainKind::Relay })
			},
			Attachment::Parachain(relay) => {
				let rpc = relay
					.client
					.parachain(spec.as_json())
					.map_err(|err| add_chain_error(err.to_string()))?;
				tracing::debug!(
					target: LOG_TARGET,
					chain = %spec.id(),
					relay_chain = %relay.id,
					"Parachain added",
				);

				Ok(SmoldotChain { id: spec.id().to_string(), kind: ChainKind::Parachain(rpc) })
			},
		}
	}

	async fn create_api(self, chain: SmoldotChain) -> LightClientResult<SmoldotApi> {
		let SmoldotWorker { relay_chain } = self;

		let rpc = match chain.kind {
			ChainKind::Parachain(rpc) => rpc,
			ChainKind::Relay => relay_chain
				.as_ref()
				.filter(|relay| relay.id == chain.id)
				.map(|relay| relay.rpc.clone())
				.ok_or_else(|| LightClientError::UnknownRelayChain(chain.id.clone()))?,
		};

		let api = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc)
			.await
			.map_err(|err| LightClientError::Client(err.to_string()))?;
		tracing::debug!(target: LOG_TARGET, chain = %chain.id, "Chain API client ready");

		Ok(SmoldotApi { api, _relay_chain: relay_chain })
	}
}

/// Chain API client served by the embedded light client.
pub struct SmoldotApi {
	api: OnlineClient<PolkadotConfig>,
	_relay_chain: Option<RelayChain>,
}

impl ChainApi for SmoldotApi {
	fn watch_block_number(
		&self,
		tag: BlockTag,
	) -> Result<Subscription<BlockNumber>, SubscriptionError> {
		let api = self.api.clone();
		let blocks = async move {
			match tag {
				BlockTag::Best => api.blocks().subscribe_best().await,
				BlockTag::Finalized => api.blocks().subscribe_finalized().await,
			}
		};

		// The header number is the `System::Number` value of the block.
		Ok(block_numbers(
			tag,
			blocks,
			|block: &Block<PolkadotConfig, OnlineClient<PolkadotConfig>>| {
				BlockNumber::from(block.number())
			},
		))
	}
}

/// Map a block subscription to the numbers of its blocks.
///
/// `subscribe` is only awaited once the returned subscription is first polled.
fn block_numbers<F, S, B, E, N>(
	tag: BlockTag,
	subscribe: F,
	number: N,
) -> Subscription<BlockNumber>
where
	F: Future<Output = Result<S, E>> + Send + 'static,
	S: Stream<Item = Result<B, E>> + Send + 'static,
	B: Send + 'static,
	E: fmt::Display + Send + 'static,
	N: Fn(&B) -> BlockNumber + Send + 'static,
{
	let numbers = async move {
		let blocks = subscribe.await.map_err(|err| {
			tracing::debug!(target: LOG_TARGET, %tag, error = %err, "Failed to subscribe to blocks");
			SubscriptionError::Subscribe(err.to_string())
		})?;

		Ok::<_, SubscriptionError>(blocks.map(move |block| {
			block
				.map(|block| number(&block))
				.map_err(|err| SubscriptionError::Stream(err.to_string()))
		}))
	};

	Subscription::new(stream::once(numbers).try_flatten()).with_cancel_hook(move || {
		tracing::debug!(target: LOG_TARGET, %tag, "Block number subscription cancelled");
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use futures::{executor::block_on, future};

	fn relay_chain_spec() -> ChainSpec {
		ChainSpec::from_json(r#"{"name": "Paseo Testnet", "id": "paseo"}"#).unwrap()
	}

	fn parachain_spec() -> ChainSpec {
		ChainSpec::from_json(
			r#"{"name": "Paseo Asset Hub", "id": "asset-hub-paseo", "relay_chain": "paseo"}"#,
		)
		.unwrap()
	}

	fn foreign_relay_chain() -> SmoldotChain {
		SmoldotChain { id: "paseo".into(), kind: ChainKind::Relay }
	}

	fn number(block: &u32) -> BlockNumber {
		BlockNumber::from(*block)
	}

	#[test]
	fn first_chain_starts_the_relay_chain() {
		assert_matches!(attachment::<()>(None, &relay_chain_spec(), &[]), Ok(Attachment::Relay));
	}

	#[test]
	fn second_relay_chain_is_rejected() {
		let result = attachment(Some(("paseo", ())), &relay_chain_spec(), &[]);

		assert_matches!(
			result,
			Err(LightClientError::AddChain { chain, reason })
				if chain == "Paseo Testnet" && reason == "relay chain `paseo` is already running"
		);
	}

	#[test]
	fn parachain_attaches_to_the_running_relay_chain() {
		let relay_chain = foreign_relay_chain();

		assert_matches!(
			attachment(Some(("paseo", ())), &parachain_spec(), &[&relay_chain]),
			Ok(Attachment::Parachain(()))
		);
		assert_matches!(
			attachment(Some(("westend2", ())), &parachain_spec(), &[&relay_chain]),
			Err(LightClientError::UnknownRelayChain(id)) if id == "paseo"
		);
	}

	#[test]
	fn parachain_needs_a_running_relay_chain() {
		let mut worker = block_on(SmoldotProvider.start_worker()).unwrap();
		let relay_chain = foreign_relay_chain();

		let result = block_on(worker.add_chain(&parachain_spec(), &[&relay_chain]));

		assert_matches!(result.err(), Some(LightClientError::UnknownRelayChain(id)) if id == "paseo");
	}

	#[test]
	fn relay_chain_api_needs_a_running_relay_chain() {
		let worker = block_on(SmoldotProvider.start_worker()).unwrap();

		let result = block_on(worker.create_api(foreign_relay_chain()));

		assert_matches!(result.err(), Some(LightClientError::UnknownRelayChain(id)) if id == "paseo");
	}

	#[test]
	fn blocks_map_to_their_numbers() {
		let blocks = stream::iter(vec![Ok(7u32), Err("connection reset".to_string()), Ok(9)]);
		let subscription = block_numbers(BlockTag::Best, future::ready(Ok(blocks)), number);

		assert_eq!(
			block_on(subscription.collect::<Vec<_>>()),
			vec![Ok(7), Err(SubscriptionError::Stream("connection reset".into())), Ok(9)]
		);
	}

	#[test]
	fn failed_subscribe_is_reported_on_the_stream() {
		let subscribe =
			future::ready(Err::<stream::Empty<Result<u32, String>>, _>("no metadata".to_string()));
		let subscription = block_numbers(BlockTag::Finalized, subscribe, number);

		assert_eq!(
			block_on(subscription.collect::<Vec<_>>()),
			vec![Err(SubscriptionError::Subscribe("no metadata".into()))]
		);
	}
}
