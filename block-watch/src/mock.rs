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

//! Light client doubles used by the unit tests.

use async_trait::async_trait;
use block_watch_interface::{
	BlockNumber, BlockTag, ChainApi, ChainSpec, LightClientError, LightClientProvider,
	LightClientResult, LightClientWorker, Subscription, SubscriptionError,
};
use futures::channel::mpsc;
use parking_lot::Mutex;
use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

type Emission = Result<BlockNumber, SubscriptionError>;

pub fn relay_chain_spec() -> ChainSpec {
	ChainSpec::from_json(r#"{"name": "Paseo Testnet", "id": "paseo"}"#)
		.expect("static chain spec is valid")
}

pub fn parachain_spec() -> ChainSpec {
	ChainSpec::from_json(
		r#"{"name": "Paseo Asset Hub", "id": "asset-hub-paseo", "relay_chain": "paseo", "para_id": 1000}"#,
	)
	.expect("static chain spec is valid")
}

/// Bootstrap step a [`MockProvider`] can be told to fail at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	StartWorker,
	AddRelayChain,
	AddParachain,
	CreateApi,
}

#[derive(Clone, Default)]
pub struct MockProvider {
	api: MockApi,
	failure: Option<(Step, String)>,
	calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
	pub fn with_api(api: MockApi) -> Self {
		MockProvider { api, ..Default::default() }
	}

	pub fn failing_at(step: Step, reason: &str) -> Self {
		MockProvider { failure: Some((step, reason.to_string())), ..Default::default() }
	}

	/// Calls received by the provider and its worker, in order.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	fn record(&self, step: Step, call: String) -> LightClientResult<()> {
		self.calls.lock().push(call);
		match &self.failure {
			Some((failing, reason)) if *failing == step =>
				Err(LightClientError::Backend(reason.clone())),
			_ => Ok(()),
		}
	}
}

#[async_trait]
impl LightClientProvider for MockProvider {
	type Worker = MockWorker;

	async fn start_worker(&self) -> LightClientResult<MockWorker> {
		self.record(Step::StartWorker, "start_worker".to_string())?;
		Ok(MockWorker { provider: self.clone() })
	}
}

pub struct MockWorker {
	provider: MockProvider,
}

pub struct MockChain {
	id: String,
}

#[async_trait]
impl LightClientWorker for MockWorker {
	type Chain = MockChain;
	type Api = MockApi;

	async fn add_chain(
		&mut self,
		spec: &ChainSpec,
		potential_relay_chains: &[&MockChain],
	) -> LightClientResult<MockChain> {
		let parents =
			potential_relay_chains.iter().map(|chain| chain.id.as_str()).collect::<Vec<_>>();
		let step =
			if potential_relay_chains.is_empty() { Step::AddRelayChain } else { Step::AddParachain };

		self.provider
			.record(step, format!("add_chain {} [{}]", spec.id(), parents.join(", ")))?;
		Ok(MockChain { id: spec.id().to_string() })
	}

	async fn create_api(self, chain: MockChain) -> LightClientResult<MockApi> {
		self.provider.record(Step::CreateApi, format!("create_api {}", chain.id))?;
		Ok(self.provider.api.clone())
	}
}

#[derive(Default)]
struct Inner {
	senders: Mutex<Vec<mpsc::UnboundedSender<Emission>>>,
	subscribe_error: Option<SubscriptionError>,
	watched_tags: Mutex<Vec<BlockTag>>,
	cancellations: AtomicUsize,
}

/// Chain API whose block numbers are pushed by the test.
#[derive(Clone, Default)]
pub struct MockApi {
	inner: Arc<Inner>,
}

impl MockApi {
	pub fn failing_subscribe(error: SubscriptionError) -> Self {
		MockApi { inner: Arc::new(Inner { subscribe_error: Some(error), ..Default::default() }) }
	}

	/// Push `item` to every live subscription. Returns the number of subscriptions reached.
	pub fn push(&self, item: Emission) -> usize {
		let mut senders = self.inner.senders.lock();
		senders.retain(|sender| !sender.is_closed());
		senders.iter().filter(|sender| sender.unbounded_send(item.clone()).is_ok()).count()
	}

	pub fn emit(&self, number: BlockNumber) -> usize {
		self.push(Ok(number))
	}

	/// End every live subscription.
	pub fn close(&self) {
		self.inner.senders.lock().clear();
	}

	pub fn subscribe_calls(&self) -> usize {
		self.inner.watched_tags.lock().len()
	}

	pub fn watched_tags(&self) -> Vec<BlockTag> {
		self.inner.watched_tags.lock().clone()
	}

	pub fn cancellations(&self) -> usize {
		self.inner.cancellations.load(Ordering::SeqCst)
	}
}

impl ChainApi for MockApi {
	fn watch_block_number(
		&self,
		tag: BlockTag,
	) -> Result<Subscription<BlockNumber>, SubscriptionError> {
		self.inner.watched_tags.lock().push(tag);
		if let Some(error) = &self.inner.subscribe_error {
			return Err(error.clone())
		}

		let (tx, rx) = mpsc::unbounded();
		self.inner.senders.lock().push(tx);

		let inner = self.inner.clone();
		Ok(Subscription::new(rx).with_cancel_hook(move || {
			inner.cancellations.fetch_add(1, Ordering::SeqCst);
		}))
	}
}
