// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mlua::{Lua, Value};
use rusqlite::types::ValueRef;

/// Converts SQL argument values into Lua values, preserving order.
///
/// TEXT and BLOB both become Lua strings built from the exact byte slice, so
/// embedded NUL bytes survive.
pub(crate) fn import(lua: &Lua, values: &[ValueRef<'_>]) -> mlua::Result<Vec<Value>> {
	values.iter().map(|value| import_value(lua, *value)).collect()
}

fn import_value(lua: &Lua, value: ValueRef<'_>) -> mlua::Result<Value> {
	Ok(match value {
		ValueRef::Null => Value::Nil,
		ValueRef::Integer(value) => Value::Integer(value),
		ValueRef::Real(value) => Value::Number(value),
		ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Value::String(lua.create_string(bytes)?),
	})
}
