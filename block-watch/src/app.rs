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

//! The page and the loop driving it.
//!
//! Everything runs cooperatively on the calling task: the one-shot connection bootstrap, the
//! display and the shutdown signal are polled by the same `select!`. The light client does its
//! own work in the background.

use crate::{
	chain_provider::{ApiOf, ChainProvider, ContextError},
	display::BlockNumberDisplay,
};
use block_watch_interface::{BlockTag, ChainSpec, LightClientProvider};
use std::{
	future::Future,
	io::{self, Write},
};

const LOG_TARGET: &str = "block-watch";

/// Title shown when none is configured.
pub const DEFAULT_TITLE: &str = "DEMO PAPI DAPP";

const FOOTER: &str = "© 2024 papi template";

/// Errors ending the application.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The page could not be written.
	#[error("Unable to draw the page: {0}")]
	Io(#[from] io::Error),
	/// The chain context was misused.
	#[error(transparent)]
	Context(#[from] ContextError),
}

/// What the application connects to and how it presents it.
#[derive(Debug, Clone)]
pub struct AppConfig {
	/// Specification of the relay chain.
	pub relay_chain_spec: ChainSpec,
	/// Specification of the watched parachain.
	pub parachain_spec: ChainSpec,
	/// Finality of the watched block number.
	pub tag: BlockTag,
	/// Page title.
	pub title: String,
}

/// Output of the page. Redraws the display region only when its text changes.
pub struct Surface<W> {
	out: W,
	last_frame: Option<String>,
}

impl<W: Write> Surface<W> {
	/// Draw on `out`.
	pub fn new(out: W) -> Self {
		Surface { out, last_frame: None }
	}

	/// Draw the page header.
	pub fn header(&mut self, title: &str) -> io::Result<()> {
		writeln!(self.out, "{title}")?;
		writeln!(self.out, "{}", "=".repeat(title.chars().count()))?;
		self.out.flush()
	}

	/// Draw `frame` unless it is what was drawn last. Returns whether anything was drawn.
	pub fn draw(&mut self, frame: &str) -> io::Result<bool> {
		if self.last_frame.as_deref() == Some(frame) {
			return Ok(false)
		}

		if !frame.is_empty() {
			writeln!(self.out, "{frame}")?;
			self.out.flush()?;
		}
		self.last_frame = Some(frame.to_string());

		Ok(true)
	}

	/// Draw the page footer.
	pub fn footer(&mut self) -> io::Result<()> {
		writeln!(self.out)?;
		writeln!(self.out, "{FOOTER}")?;
		self.out.flush()
	}

	/// Give back the underlying output.
	pub fn into_inner(self) -> W {
		self.out
	}
}

/// Run the application until `shutdown` resolves.
///
/// Returns the output once the display has been unmounted and the footer drawn.
pub async fn run<P, W, S>(provider: P, config: AppConfig, out: W, shutdown: S) -> Result<W, Error>
where
	P: LightClientProvider,
	W: Write,
	S: Future<Output = ()>,
{
	let AppConfig { relay_chain_spec, parachain_spec, tag, title } = config;
	tracing::info!(
		target: LOG_TARGET,
		parachain = %parachain_spec.name(),
		relay_chain = %relay_chain_spec.name(),
		%tag,
		"Watching block number",
	);

	let mut surface = Surface::new(out);
	surface.header(&title)?;

	let mut chain_provider = ChainProvider::<ApiOf<P>>::new();
	let mut display = BlockNumberDisplay::mount(chain_provider.context(), tag)?;
	surface.draw(&display.render())?;
	let mut drawn_revision = display.revision();

	let bootstrap = chain_provider.initialize(&provider, &relay_chain_spec, &parachain_spec);
	tokio::pin!(bootstrap);
	tokio::pin!(shutdown);
	let mut bootstrapped = false;

	loop {
		tokio::select! {
			_ = &mut bootstrap, if !bootstrapped => bootstrapped = true,
			stepped = display.step() => {
				if !stepped? {
					break
				}
				if display.revision() != drawn_revision {
					drawn_revision = display.revision();
					surface.draw(&display.render())?;
				}
			},
			_ = &mut shutdown => {
				tracing::info!(target: LOG_TARGET, "Shutting down");
				break
			},
		}
	}

	display.unmount();
	surface.footer()?;

	Ok(surface.into_inner())
}
