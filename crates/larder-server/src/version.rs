// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn format_version_info() -> String {
	format!("larder-server {VERSION}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_line_names_binary() {
		let info = format_version_info();
		assert!(info.starts_with("larder-server "));
		assert!(info.ends_with(VERSION));
	}
}
