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

//! Cancellable value subscriptions.

use crate::SubscriptionError;
use futures::{stream::BoxStream, Stream, StreamExt};
use std::{
	fmt,
	pin::Pin,
	task::{Context, Poll},
};

type CancelHook = Box<dyn FnOnce() + Send>;

/// A stream of values with an explicit [`cancel`](Subscription::cancel) contract.
///
/// Cancelling drops the underlying stream and then runs the cancel hook, if any. Both happen
/// at most once, whether cancellation comes from an explicit call or from dropping the
/// subscription. A cancelled subscription yields no further items.
pub struct Subscription<T> {
	inner: Option<BoxStream<'static, Result<T, SubscriptionError>>>,
	on_cancel: Option<CancelHook>,
}

impl<T> Subscription<T> {
	/// Wrap `stream` into a subscription.
	pub fn new<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<T, SubscriptionError>> + Send + 'static,
	{
		Subscription { inner: Some(stream.boxed()), on_cancel: None }
	}

	/// Run `hook` once the subscription is cancelled.
	pub fn with_cancel_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
		self.on_cancel = Some(Box::new(hook));
		self
	}

	/// Cancel the subscription.
	///
	/// Returns `true` if this call performed the cancellation, `false` if it was already done.
	pub fn cancel(&mut self) -> bool {
		let Some(stream) = self.inner.take() else { return false };
		drop(stream);

		if let Some(hook) = self.on_cancel.take() {
			hook();
		}

		true
	}

	/// Returns `true` once the subscription has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.inner.is_none()
	}
}

impl<T> Stream for Subscription<T> {
	type Item = Result<T, SubscriptionError>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		match self.get_mut().inner.as_mut() {
			Some(stream) => stream.poll_next_unpin(cx),
			None => Poll::Ready(None),
		}
	}
}

impl<T> Drop for Subscription<T> {
	fn drop(&mut self) {
		self.cancel();
	}
}

impl<T> fmt::Debug for Subscription<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Subscription").field("cancelled", &self.is_cancelled()).finish()
	}
}
