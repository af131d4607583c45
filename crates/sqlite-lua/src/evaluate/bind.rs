// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mlua::{Lua, Value};

/// Global the trailing arguments are published under.
pub const ARGS_GLOBAL: &str = "arg";

/// Replaces the global `arg` with a fresh 1-indexed table of `values`.
///
/// The values are cloned into the table, the caller keeps them to pass as
/// positional arguments.
pub(crate) fn bind(lua: &Lua, values: &[Value]) -> mlua::Result<()> {
	let args = lua.create_table_with_capacity(values.len(), 0)?;
	for (index, value) in values.iter().enumerate() {
		args.raw_set(index + 1, value.clone())?;
	}
	lua.globals().set(ARGS_GLOBAL, args)
}
