// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

/// Configuration of a registered Lua function.
#[derive(Debug, Clone)]
pub struct LuaConfig {
	/// SQL name of the function. Also used in error messages.
	///
	/// Default: `lua`
	pub function_name: String,

	/// Register with `SQLITE_DETERMINISTIC`, allowing SQLite to factor
	/// out repeated calls. Only safe when snippets are pure.
	///
	/// Default: false
	pub deterministic: bool,

	/// Register with `SQLITE_DIRECTONLY`, so the function cannot be used
	/// from triggers, views or schema expressions.
	///
	/// Default: false
	pub direct_only: bool,

	/// Return Lua integers as SQL INTEGER instead of REAL.
	///
	/// Default: false
	pub preserve_integers: bool,
}

impl Default for LuaConfig {
	fn default() -> Self {
		Self {
			function_name: "lua".to_string(),
			deterministic: false,
			direct_only: false,
			preserve_integers: false,
		}
	}
}

impl LuaConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn function_name(mut self, name: impl Into<String>) -> Self {
		self.function_name = name.into();
		self
	}

	pub fn deterministic(mut self, deterministic: bool) -> Self {
		self.deterministic = deterministic;
		self
	}

	pub fn direct_only(mut self, direct_only: bool) -> Self {
		self.direct_only = direct_only;
		self
	}

	pub fn preserve_integers(mut self, preserve: bool) -> Self {
		self.preserve_integers = preserve;
		self
	}
}
