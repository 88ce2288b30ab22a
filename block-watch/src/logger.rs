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

//! Logger initialization.

use tracing_subscriber::EnvFilter;

/// Directives applied before `RUST_LOG` and the command line ones.
const DEFAULT_DIRECTIVES: &str = "warn,block-watch=info";

/// Build the filter directives. Later directives take precedence over earlier ones.
fn filter_directives(env: Option<&str>, directives: &[String]) -> String {
	let mut filter = DEFAULT_DIRECTIVES.to_string();
	for directive in env.into_iter().chain(directives.iter().map(String::as_str)) {
		let directive = directive.trim();
		if !directive.is_empty() {
			filter.push(',');
			filter.push_str(directive);
		}
	}

	filter
}

/// Initialize the global logger. Logs go to stderr, the page goes to stdout.
pub fn init_logger(directives: &[String]) -> anyhow::Result<()> {
	let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
	let env_filter = EnvFilter::try_new(filter_directives(env.as_deref(), directives))?;

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| anyhow::anyhow!("Unable to initialize the logger: {err}"))
}
