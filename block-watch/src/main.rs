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

//! Block watch binary.

use block_watch::{app, cli::Cli, logger};
use block_watch_light_client::SmoldotProvider;
use clap::Parser;

const LOG_TARGET: &str = "block-watch";

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logger::init_logger(&cli.log)?;

	let config = cli.app_config()?;

	let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
	runtime.block_on(async {
		let shutdown = async {
			if let Err(err) = tokio::signal::ctrl_c().await {
				tracing::error!(target: LOG_TARGET, error = %err, "Unable to listen for Ctrl-C");
			}
		};

		app::run(SmoldotProvider, config, std::io::stdout(), shutdown).await
	})?;

	Ok(())
}
