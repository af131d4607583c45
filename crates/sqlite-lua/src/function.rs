// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{Mutex, PoisonError};

use rusqlite::{
	Connection,
	functions::{Context, FunctionFlags},
	types::{Value, ValueRef},
};
use tracing::{debug, instrument};

use crate::{config::LuaConfig, error::Result, evaluate::Evaluator};

/// Registers the Lua function on `conn` with unbounded arity.
///
/// The function owns a fresh [`Evaluator`]. SQLite drops it, closing the Lua
/// state, when the function is replaced, unregistered or the connection is
/// closed.
#[instrument(name = "lua::register", level = "info", skip(conn, config), fields(function = %config.function_name))]
pub fn register(conn: &Connection, config: LuaConfig) -> Result<()> {
	let name = config.function_name.clone();
	let flags = function_flags(&config);
	let evaluator = Mutex::new(Evaluator::new(config));

	conn.create_scalar_function(name.as_str(), -1, flags, move |ctx| invoke(&evaluator, ctx))?;
	Ok(())
}

/// Removes a function registered with [`register`], releasing its Lua state.
#[instrument(name = "lua::unregister", level = "info", skip(conn))]
pub fn unregister(conn: &Connection, name: &str) -> Result<()> {
	conn.remove_function(name, -1)?;
	Ok(())
}

fn function_flags(config: &LuaConfig) -> FunctionFlags {
	let mut flags = FunctionFlags::SQLITE_UTF8;
	if config.deterministic {
		flags |= FunctionFlags::SQLITE_DETERMINISTIC;
	}
	if config.direct_only {
		flags |= FunctionFlags::SQLITE_DIRECTONLY;
	}
	flags
}

fn invoke(evaluator: &Mutex<Evaluator>, ctx: &Context<'_>) -> rusqlite::Result<Value> {
	let args: Vec<ValueRef<'_>> = (0..ctx.len()).map(|idx| ctx.get_raw(idx)).collect();

	// A panic inside a previous call leaves the Lua state usable.
	let mut evaluator = evaluator.lock().unwrap_or_else(PoisonError::into_inner);

	evaluator.call(&args).map_err(|err| {
		debug!(function = %evaluator.config().function_name, stage = %err.stage(), error = %err, "lua call failed");
		rusqlite::Error::UserFunctionError(Box::new(err))
	})
}
