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

//! Display of the latest block number.
//!
//! The display reads the connection state from a [`ChainContext`]. Once the chain API is
//! available, it watches the block number and keeps the last value it received. Every change of
//! the connection state re-runs the subscription effect: the current subscription, if any, is
//! cancelled before a new one is created.

use crate::chain_provider::{ChainContext, ContextError};
use block_watch_interface::{BlockNumber, BlockTag, ChainApi, Subscription, SubscriptionError};
use futures::StreamExt;
use std::fmt;

const LOG_TARGET: &str = "block-watch::display";

/// State machine of the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
	/// Waiting for the connection or for the first value.
	Loading,
	/// Showing the latest value.
	Showing(String),
	/// The connection or the subscription failed. Terminal.
	Error(String),
	/// The display has been unmounted. Terminal.
	Unsubscribed,
}

impl fmt::Display for DisplayState {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			DisplayState::Loading => write!(f, "⏳ Loading block number..."),
			DisplayState::Showing(value) => write!(f, "Latest Block Number: {value}"),
			DisplayState::Error(message) => write!(f, "⚠️ {message}"),
			DisplayState::Unsubscribed => Ok(()),
		}
	}
}

/// Flat view of the display state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockNumberState {
	/// Latest block number received.
	pub value: Option<String>,
	/// Whether no value has been received yet.
	pub is_loading: bool,
	/// Connection or subscription failure.
	pub error: Option<String>,
}

impl From<&DisplayState> for BlockNumberState {
	fn from(state: &DisplayState) -> Self {
		match state {
			DisplayState::Loading => BlockNumberState { is_loading: true, ..Default::default() },
			DisplayState::Showing(value) =>
				BlockNumberState { value: Some(value.clone()), ..Default::default() },
			DisplayState::Error(message) =>
				BlockNumberState { error: Some(message.clone()), ..Default::default() },
			DisplayState::Unsubscribed => BlockNumberState::default(),
		}
	}
}

enum Input {
	Context(Result<(), ContextError>),
	Value(Option<Result<BlockNumber, SubscriptionError>>),
}

/// Watches the block number of the chain exposed by a [`ChainContext`].
pub struct BlockNumberDisplay<A> {
	context: ChainContext<A>,
	tag: BlockTag,
	state: DisplayState,
	subscription: Option<Subscription<BlockNumber>>,
	revision: u64,
}

impl<A: ChainApi> BlockNumberDisplay<A> {
	/// Mount the display and run the subscription effect for the current connection state.
	pub fn mount(context: ChainContext<A>, tag: BlockTag) -> Result<Self, ContextError> {
		let mut display = BlockNumberDisplay {
			context,
			tag,
			state: DisplayState::Loading,
			subscription: None,
			revision: 0,
		};
		display.refresh()?;

		Ok(display)
	}

	/// Current state.
	pub fn state(&self) -> &DisplayState {
		&self.state
	}

	/// Current state, flattened.
	pub fn block_number_state(&self) -> BlockNumberState {
		(&self.state).into()
	}

	/// Number of state transitions since the display was mounted.
	///
	/// A display whose revision did not move needs no redraw.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Whether a subscription is currently active.
	pub fn is_subscribed(&self) -> bool {
		self.subscription.is_some()
	}

	/// Text of the display region.
	pub fn render(&self) -> String {
		self.state.to_string()
	}

	/// Wait for the next connection change or subscription item, and apply it.
	///
	/// Cancel safe. Returns `Ok(false)` once the display is unmounted.
	pub async fn step(&mut self) -> Result<bool, ContextError> {
		if self.state == DisplayState::Unsubscribed {
			return Ok(false)
		}

		let input = match self.subscription.as_mut() {
			Some(subscription) => tokio::select! {
				changed = self.context.changed() => Input::Context(changed),
				item = subscription.next() => Input::Value(item),
			},
			None => Input::Context(self.context.changed().await),
		};

		match input {
			Input::Context(changed) => {
				changed?;
				self.refresh()?;
			},
			Input::Value(item) => self.on_value(item),
		}

		Ok(true)
	}

	/// Cancel the subscription and stop reacting to anything.
	pub fn unmount(&mut self) {
		if self.cancel_subscription() {
			tracing::debug!(target: LOG_TARGET, "Unsubscribed from block number updates");
		}
		self.set_state(DisplayState::Unsubscribed);
	}

	fn refresh(&mut self) -> Result<(), ContextError> {
		self.cancel_subscription();

		if matches!(self.state, DisplayState::Error(_) | DisplayState::Unsubscribed) {
			return Ok(())
		}

		let connection = self.context.use_api()?;
		if let Some(error) = connection.error {
			self.set_state(DisplayState::Error(error));
			return Ok(())
		}

		let Some(api) = connection.api.filter(|_| !connection.is_loading) else { return Ok(()) };

		match api.watch_block_number(self.tag) {
			Ok(subscription) => {
				tracing::debug!(target: LOG_TARGET, tag = %self.tag, "Watching block number");
				self.subscription = Some(subscription);
			},
			Err(err) => {
				tracing::warn!(target: LOG_TARGET, error = %err, "Unable to watch block number");
				self.set_state(DisplayState::Error(err.to_string()));
			},
		}

		Ok(())
	}

	fn on_value(&mut self, item: Option<Result<BlockNumber, SubscriptionError>>) {
		if matches!(self.state, DisplayState::Error(_) | DisplayState::Unsubscribed) {
			return
		}

		match item {
			Some(Ok(number)) => {
				tracing::trace!(target: LOG_TARGET, number, "New block number");
				self.set_state(DisplayState::Showing(number.to_string()));
			},
			Some(Err(err)) => {
				tracing::warn!(target: LOG_TARGET, error = %err, "Block number subscription failed");
				self.cancel_subscription();
				self.set_state(DisplayState::Error(err.to_string()));
			},
			None => {
				tracing::warn!(target: LOG_TARGET, "Block number subscription ended");
				self.cancel_subscription();
				self.set_state(DisplayState::Error(SubscriptionError::Closed.to_string()));
			},
		}
	}

	fn cancel_subscription(&mut self) -> bool {
		match self.subscription.take() {
			Some(mut subscription) => subscription.cancel(),
			None => false,
		}
	}

	fn set_state(&mut self, state: DisplayState) {
		if self.state != state {
			self.state = state;
			self.revision += 1;
		}
	}
}
