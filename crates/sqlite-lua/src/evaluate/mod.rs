// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Evaluation of Lua snippets against SQL arguments.
//!
//! A call moves through `Idle → Compiling → Binding → Executing → Exporting`
//! and back to `Idle`. Any stage after `Idle` may fail, and the failure ends
//! the call without resetting the interpreter.

mod bind;
mod export;
mod import;
mod load;

use std::{borrow::Cow, fmt};

pub use bind::ARGS_GLOBAL;
pub use export::{Number, ScriptValue};
use mlua::{Lua, LuaOptions, MultiValue, StdLib, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use tracing::{info, instrument};

use crate::{config::LuaConfig, error::EvaluateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Idle,
	Compiling,
	Binding,
	Executing,
	Exporting,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Stage::Idle => f.write_str("idle"),
			Stage::Compiling => f.write_str("compiling"),
			Stage::Binding => f.write_str("binding"),
			Stage::Executing => f.write_str("executing"),
			Stage::Exporting => f.write_str("exporting"),
		}
	}
}

/// Owns one Lua state and evaluates snippets in it.
///
/// The state lives as long as the evaluator. Globals a snippet defines stay
/// visible to later snippets; only `arg` is replaced on every call.
pub struct Evaluator {
	lua: Lua,
	config: LuaConfig,
}

impl Evaluator {
	/// Creates a Lua state with every standard library loaded, `debug`
	/// included.
	#[instrument(name = "lua::evaluator::new", level = "debug", skip(config), fields(function = %config.function_name))]
	pub fn new(config: LuaConfig) -> Self {
		// SAFETY: the `debug` library is the only reason this is unsafe. Snippets
		// are trusted SQL input and run unrestricted.
		let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL, LuaOptions::new()) };

		Self {
			lua,
			config,
		}
	}

	pub fn config(&self) -> &LuaConfig {
		&self.config
	}

	/// Evaluates a full SQL argument list: the snippet followed by its
	/// arguments.
	///
	/// A NULL snippet evaluates to NULL without touching the interpreter.
	/// Numeric snippets are read as their text rendering.
	pub fn call(&mut self, args: &[ValueRef<'_>]) -> std::result::Result<SqlValue, EvaluateError> {
		let Some((snippet, args)) = args.split_first() else {
			return Err(EvaluateError::MissingArgument {
				function: self.config.function_name.clone(),
			});
		};

		let snippet: Cow<'_, [u8]> = match snippet {
			ValueRef::Null => return Ok(SqlValue::Null),
			ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Cow::Borrowed(*bytes),
			ValueRef::Integer(value) => Cow::Owned(value.to_string().into_bytes()),
			ValueRef::Real(value) => Cow::Owned(format!("{value:?}").into_bytes()),
		};

		self.evaluate(&snippet, args)
	}

	#[instrument(name = "lua::evaluate", level = "trace", skip_all, fields(snippet_len = snippet.len(), args = args.len()))]
	pub fn evaluate(
		&mut self,
		snippet: &[u8],
		args: &[ValueRef<'_>],
	) -> std::result::Result<SqlValue, EvaluateError> {
		let unit = load::load(&self.lua, snippet)?;

		let values = import::import(&self.lua, args).map_err(|err| EvaluateError::runtime(Stage::Binding, err))?;
		bind::bind(&self.lua, &values).map_err(|err| EvaluateError::runtime(Stage::Binding, err))?;

		let result = unit
			.call::<Value>(values.into_iter().collect::<MultiValue>())
			.map_err(|err| EvaluateError::runtime(Stage::Executing, err))?;

		ScriptValue::from(result).into_sql(&self.config.function_name, self.config.preserve_integers)
	}
}

impl Drop for Evaluator {
	fn drop(&mut self) {
		info!(function = %self.config.function_name, "releasing lua interpreter");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn evaluator() -> Evaluator {
		Evaluator::new(LuaConfig::default())
	}

	fn eval(evaluator: &mut Evaluator, snippet: &str, args: &[ValueRef<'_>]) -> std::result::Result<SqlValue, EvaluateError> {
		evaluator.evaluate(snippet.as_bytes(), args)
	}

	#[test]
	fn test_expression() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "1+2", &[]).unwrap(), SqlValue::Real(3.0));
		assert_eq!(eval(&mut evaluator, "'a'..'b'", &[]).unwrap(), SqlValue::Text("ab".to_string()));
	}

	#[test]
	fn test_statement_fallback() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "local x = 10 return x", &[]).unwrap(), SqlValue::Real(10.0));
	}

	#[test]
	fn test_statement_without_return_is_null() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "local x = 10", &[]).unwrap(), SqlValue::Null);
	}

	#[test]
	fn test_args_table() {
		let mut evaluator = evaluator();
		let result = eval(&mut evaluator, "arg[1] + arg[2]", &[ValueRef::Integer(2), ValueRef::Integer(3)]);
		assert_eq!(result.unwrap(), SqlValue::Real(5.0));
		assert_eq!(eval(&mut evaluator, "arg[1]", &[]).unwrap(), SqlValue::Null);
	}

	#[test]
	fn test_positional_args() {
		let mut evaluator = evaluator();
		let result = eval(&mut evaluator, "select('#', ...)", &[ValueRef::Null, ValueRef::Integer(1)]);
		assert_eq!(result.unwrap(), SqlValue::Real(2.0));

		let result = eval(&mut evaluator, "local a, b = ... return a .. b", &[ValueRef::Text(b"x"), ValueRef::Text(b"y")]);
		assert_eq!(result.unwrap(), SqlValue::Text("xy".to_string()));
	}

	#[test]
	fn test_args_replaced_each_call() {
		let mut evaluator = evaluator();
		eval(&mut evaluator, "arg[1]", &[ValueRef::Integer(1), ValueRef::Integer(2)]).unwrap();
		assert_eq!(eval(&mut evaluator, "#arg", &[]).unwrap(), SqlValue::Real(0.0));
	}

	#[test]
	fn test_globals_persist() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "counter = 41", &[]).unwrap(), SqlValue::Null);
		assert_eq!(eval(&mut evaluator, "counter + 1", &[]).unwrap(), SqlValue::Real(42.0));
	}

	#[test]
	fn test_first_result_only() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "1, 2", &[]).unwrap(), SqlValue::Real(1.0));
		assert_eq!(eval(&mut evaluator, "return 'a', 'b'", &[]).unwrap(), SqlValue::Text("a".to_string()));
	}

	#[test]
	fn test_boolean_result() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "1 < 2", &[]).unwrap(), SqlValue::Integer(1));
		assert_eq!(eval(&mut evaluator, "1 > 2", &[]).unwrap(), SqlValue::Integer(0));
	}

	#[test]
	fn test_binary_round_trip() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "arg[1]", &[ValueRef::Text(b"\0x")]).unwrap(), SqlValue::Text("\0x".to_string()));
		assert_eq!(eval(&mut evaluator, "arg[1]", &[ValueRef::Blob(&[0xff, 0x00])]).unwrap(), SqlValue::Blob(vec![0xff, 0x00]));
	}

	#[test]
	fn test_preserve_integers() {
		let mut evaluator = Evaluator::new(LuaConfig::new().preserve_integers(true));
		assert_eq!(eval(&mut evaluator, "1+2", &[]).unwrap(), SqlValue::Integer(3));
		assert_eq!(eval(&mut evaluator, "arg[1]", &[ValueRef::Integer(i64::MIN)]).unwrap(), SqlValue::Integer(i64::MIN));
		assert_eq!(eval(&mut evaluator, "3 / 2", &[]).unwrap(), SqlValue::Real(1.5));
	}

	#[test]
	fn test_unconvertible_result() {
		let mut evaluator = evaluator();
		let err = eval(&mut evaluator, "return {}", &[]).unwrap_err();
		assert_eq!(err.to_string(), "Invalid return type from lua(): table");
		assert_eq!(err.stage(), Stage::Exporting);
	}

	#[test]
	fn test_compile_error_does_not_corrupt() {
		let mut evaluator = evaluator();
		let err = eval(&mut evaluator, "this is not valid syntax at all (", &[]).unwrap_err();
		assert!(matches!(err, EvaluateError::Compile { .. }));
		assert!(err.to_string().contains("syntax error"), "{err}");

		assert_eq!(eval(&mut evaluator, "1+1", &[]).unwrap(), SqlValue::Real(2.0));
	}

	#[test]
	fn test_runtime_error() {
		let mut evaluator = evaluator();
		let err = eval(&mut evaluator, "error('boom')", &[]).unwrap_err();
		assert_eq!(err.stage(), Stage::Executing);
		assert!(err.to_string().ends_with("boom"), "{err}");
		assert!(!err.to_string().contains("stack traceback"), "{err}");

		assert_eq!(eval(&mut evaluator, "2", &[]).unwrap(), SqlValue::Real(2.0));
	}

	#[test]
	fn test_call_without_arguments() {
		let mut evaluator = evaluator();
		let err = evaluator.call(&[]).unwrap_err();
		assert_eq!(err.to_string(), "No argument passed to lua()");
		assert_eq!(err.stage(), Stage::Idle);
	}

	#[test]
	fn test_call_splits_snippet_and_args() {
		let mut evaluator = evaluator();
		let result = evaluator.call(&[ValueRef::Text(b"arg[1] * 2"), ValueRef::Real(1.25)]);
		assert_eq!(result.unwrap(), SqlValue::Real(2.5));
	}

	#[test]
	fn test_call_null_snippet() {
		let mut evaluator = evaluator();
		assert_eq!(evaluator.call(&[ValueRef::Null, ValueRef::Integer(1)]).unwrap(), SqlValue::Null);
	}

	#[test]
	fn test_call_numeric_snippet() {
		let mut evaluator = evaluator();
		assert_eq!(evaluator.call(&[ValueRef::Integer(7)]).unwrap(), SqlValue::Real(7.0));
		assert_eq!(evaluator.call(&[ValueRef::Real(2.5)]).unwrap(), SqlValue::Real(2.5));
	}

	#[test]
	fn test_error_names_configured_function() {
		let mut evaluator = Evaluator::new(LuaConfig::new().function_name("eval"));
		assert_eq!(evaluator.config().function_name, "eval");
		assert_eq!(evaluator.call(&[]).unwrap_err().to_string(), "No argument passed to eval()");
		assert_eq!(
			evaluator.call(&[ValueRef::Text(b"print")]).unwrap_err().to_string(),
			"Invalid return type from eval(): function"
		);
	}

	#[test]
	fn test_debug_library_loaded() {
		let mut evaluator = evaluator();
		assert_eq!(eval(&mut evaluator, "type(debug.traceback)", &[]).unwrap(), SqlValue::Text("function".to_string()));
		assert_eq!(eval(&mut evaluator, "type(debug.getinfo)", &[]).unwrap(), SqlValue::Text("function".to_string()));
	}

	#[test]
	fn test_config() {
		let evaluator = Evaluator::new(LuaConfig::new().preserve_integers(true).deterministic(true));
		assert!(evaluator.config().preserve_integers);
		assert!(evaluator.config().deterministic);
		assert_eq!(evaluator.config().function_name, "lua");
	}

	#[test]
	fn test_stage_display() {
		assert_eq!(Stage::Compiling.to_string(), "compiling");
		assert_eq!(Stage::Exporting.to_string(), "exporting");
	}
}
