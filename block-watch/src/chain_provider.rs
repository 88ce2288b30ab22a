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

//! Light client connection bootstrap and the context sharing its outcome.
//!
//! [`ChainProvider`] owns the connection state and runs the bootstrap exactly once. Everything
//! that needs the chain API gets a [`ChainContext`] handed to it explicitly and reads the state
//! through [`ChainContext::use_api`].

use block_watch_interface::{
	ChainApi, ChainSpec, LightClientError, LightClientProvider, LightClientResult,
	LightClientWorker,
};
use std::{fmt, sync::Arc};
use tokio::sync::watch;

const LOG_TARGET: &str = "block-watch::chain-provider";

/// The chain API type produced by a light client provider.
pub type ApiOf<P> = <<P as LightClientProvider>::Worker as LightClientWorker>::Api;

/// State of the light client connection, as seen by the rest of the front-end.
pub struct ConnectionState<A> {
	/// The chain API client, once connected.
	pub api: Option<Arc<A>>,
	/// Whether the connection is still being set up.
	pub is_loading: bool,
	/// Human readable reason of a failed connection.
	pub error: Option<String>,
}

impl<A> ConnectionState<A> {
	/// The state before the bootstrap has finished.
	pub fn loading() -> Self {
		ConnectionState { api: None, is_loading: true, error: None }
	}

	/// The state after a successful bootstrap.
	pub fn connected(api: Arc<A>) -> Self {
		ConnectionState { api: Some(api), is_loading: false, error: None }
	}

	/// The state after a failed bootstrap.
	pub fn failed(reason: impl fmt::Display) -> Self {
		ConnectionState {
			api: None,
			is_loading: false,
			error: Some(format!("Failed to connect to the chain: {reason}")),
		}
	}
}

impl<A> Clone for ConnectionState<A> {
	fn clone(&self) -> Self {
		ConnectionState {
			api: self.api.clone(),
			is_loading: self.is_loading,
			error: self.error.clone(),
		}
	}
}

impl<A> fmt::Debug for ConnectionState<A> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("ConnectionState")
			.field("api", &self.api.is_some())
			.field("is_loading", &self.is_loading)
			.field("error", &self.error)
			.finish()
	}
}

/// Misuse of the chain context.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
	/// The context outlived the provider it was obtained from.
	#[error("The chain context must be used within a ChainProvider")]
	ProviderMissing,
}

/// Start a light client worker, attach the relay chain and the parachain anchored to it, and
/// build the API client of the parachain.
pub async fn connect<P: LightClientProvider>(
	provider: &P,
	relay_chain_spec: &ChainSpec,
	parachain_spec: &ChainSpec,
) -> LightClientResult<ApiOf<P>> {
	tracing::info!(target: LOG_TARGET, "Initializing light client worker and API connection...");

	let mut worker = provider.start_worker().await?;

	if let Some(relay_chain) = parachain_spec.relay_chain() {
		if relay_chain != relay_chain_spec.id() {
			tracing::debug!(
				target: LOG_TARGET,
				parachain = %parachain_spec.id(),
				expected = %relay_chain,
				provided = %relay_chain_spec.id(),
				"Parachain is anchored to another relay chain",
			);
			return Err(LightClientError::UnknownRelayChain(relay_chain.to_string()))
		}
	}

	let relay_chain = worker.add_chain(relay_chain_spec, &[]).await?;
	tracing::info!(
		target: LOG_TARGET,
		chain = %relay_chain_spec.name(),
		"Connected to the relay chain",
	);

	let parachain = worker.add_chain(parachain_spec, &[&relay_chain]).await?;
	tracing::info!(
		target: LOG_TARGET,
		chain = %parachain_spec.name(),
		para_id = ?parachain_spec.para_id(),
		"Connected to the parachain",
	);

	let api = worker.create_api(parachain).await?;
	tracing::info!(target: LOG_TARGET, "API instance created");

	Ok(api)
}

/// Owner of the connection state.
pub struct ChainProvider<A> {
	state: watch::Sender<ConnectionState<A>>,
	initialized: bool,
}

impl<A: ChainApi> ChainProvider<A> {
	/// Create a provider in the loading state.
	pub fn new() -> Self {
		let (state, _) = watch::channel(ConnectionState::loading());
		ChainProvider { state, initialized: false }
	}

	/// Hand out a context reading this provider's state.
	pub fn context(&self) -> ChainContext<A> {
		ChainContext { state: self.state.subscribe() }
	}

	/// Current connection state.
	pub fn state(&self) -> ConnectionState<A> {
		self.state.borrow().clone()
	}

	/// Connect to the chains and publish the outcome.
	///
	/// Only the first call does anything. Failures are published, not retried.
	pub async fn initialize<P>(
		&mut self,
		provider: &P,
		relay_chain_spec: &ChainSpec,
		parachain_spec: &ChainSpec,
	) where
		P: LightClientProvider,
		P::Worker: LightClientWorker<Api = A>,
	{
		if self.initialized {
			tracing::warn!(target: LOG_TARGET, "Chain connection is already initialized");
			return
		}
		self.initialized = true;

		let state = match connect(provider, relay_chain_spec, parachain_spec).await {
			Ok(api) => ConnectionState::connected(Arc::new(api)),
			Err(err) => {
				tracing::error!(target: LOG_TARGET, error = %err, "Error initializing the API");
				ConnectionState::failed(err)
			},
		};
		tracing::info!(target: LOG_TARGET, "API initialization complete");

		self.state.send_replace(state);
	}
}

impl<A: ChainApi> Default for ChainProvider<A> {
	fn default() -> Self {
		Self::new()
	}
}

/// Read access to the connection state of a [`ChainProvider`].
pub struct ChainContext<A> {
	state: watch::Receiver<ConnectionState<A>>,
}

impl<A> ChainContext<A> {
	/// Current connection state.
	///
	/// Fails if the provider is gone.
	pub fn use_api(&mut self) -> Result<ConnectionState<A>, ContextError> {
		self.state.has_changed().map_err(|_| ContextError::ProviderMissing)?;
		Ok(self.state.borrow_and_update().clone())
	}

	/// Wait until the provider publishes a new state.
	pub async fn changed(&mut self) -> Result<(), ContextError> {
		self.state.changed().await.map_err(|_| ContextError::ProviderMissing)
	}
}

impl<A> Clone for ChainContext<A> {
	fn clone(&self) -> Self {
		ChainContext { state: self.state.clone() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::{parachain_spec, relay_chain_spec, MockApi, MockProvider, Step};
	use assert_matches::assert_matches;
	use rstest::rstest;

	#[tokio::test]
	async fn successful_bootstrap_publishes_api() {
		let provider = MockProvider::default();
		let mut chain_provider = ChainProvider::<MockApi>::new();
		let mut context = chain_provider.context();

		let state = context.use_api().unwrap();
		assert!(state.is_loading);
		assert!(state.api.is_none());
		assert!(state.error.is_none());

		chain_provider.initialize(&provider, &relay_chain_spec(), &parachain_spec()).await;

		let state = context.use_api().unwrap();
		assert!(state.api.is_some());
		assert!(!state.is_loading);
		assert_eq!(state.error, None);
		assert_eq!(
			provider.calls(),
			vec![
				"start_worker".to_string(),
				"add_chain paseo []".to_string(),
				"add_chain asset-hub-paseo [paseo]".to_string(),
				"create_api asset-hub-paseo".to_string(),
			]
		);
	}

	#[rstest]
	#[case::start_worker(Step::StartWorker)]
	#[case::add_relay_chain(Step::AddRelayChain)]
	#[case::add_parachain(Step::AddParachain)]
	#[case::create_api(Step::CreateApi)]
	#[tokio::test]
	async fn failed_bootstrap_publishes_error(#[case] step: Step) {
		let provider = MockProvider::failing_at(step, "network unreachable");
		let mut chain_provider = ChainProvider::<MockApi>::new();

		chain_provider.initialize(&provider, &relay_chain_spec(), &parachain_spec()).await;

		let state = chain_provider.state();
		assert!(state.api.is_none());
		assert!(!state.is_loading);
		assert_eq!(
			state.error.as_deref(),
			Some("Failed to connect to the chain: network unreachable")
		);
	}

	#[tokio::test]
	async fn bootstrap_runs_once() {
		let provider = MockProvider::default();
		let mut chain_provider = ChainProvider::<MockApi>::new();

		chain_provider.initialize(&provider, &relay_chain_spec(), &parachain_spec()).await;
		chain_provider.initialize(&provider, &relay_chain_spec(), &parachain_spec()).await;

		assert_eq!(provider.calls().iter().filter(|call| *call == "start_worker").count(), 1);
	}

	#[tokio::test]
	async fn rejects_parachain_of_another_relay_chain() {
		let provider = MockProvider::default();
		let other_relay = ChainSpec::from_json(r#"{"name": "Westend", "id": "westend2"}"#).unwrap();

		let result = connect(&provider, &other_relay, &parachain_spec()).await;

		assert_matches!(result.err(), Some(LightClientError::UnknownRelayChain(id)) if id == "paseo");
		assert_eq!(provider.calls(), vec!["start_worker".to_string()]);
	}

	#[tokio::test]
	async fn context_notices_publication() {
		let provider = MockProvider::default();
		let mut chain_provider = ChainProvider::<MockApi>::new();
		let mut context = chain_provider.context();
		context.use_api().unwrap();

		chain_provider.initialize(&provider, &relay_chain_spec(), &parachain_spec()).await;

		context.changed().await.unwrap();
		assert!(context.use_api().unwrap().api.is_some());
	}

	#[test]
	fn context_without_provider_fails() {
		let chain_provider = ChainProvider::<MockApi>::new();
		let mut context = chain_provider.context();
		drop(chain_provider);

		assert_matches!(context.use_api(), Err(ContextError::ProviderMissing));
	}
}
