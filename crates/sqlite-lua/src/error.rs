// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use thiserror::Error;

use crate::evaluate::Stage;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while registering or removing a Lua function.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Sqlite(#[from] rusqlite::Error),
}

/// Errors of a single `lua()` call.
///
/// The display text is exactly what SQLite reports for the failing call.
/// None of these leave the interpreter unusable.
#[derive(Debug, Clone, Error)]
pub enum EvaluateError {
	#[error("No argument passed to {function}()")]
	MissingArgument {
		function: String,
	},

	/// Both compile attempts failed, or the expression form failed for a
	/// reason other than syntax. Carries the compiler diagnostic verbatim.
	#[error("{message}")]
	Compile {
		message: String,
	},

	#[error("{message}")]
	Runtime {
		stage: Stage,
		message: String,
	},

	#[error("Invalid return type from {function}(): {type_name}")]
	UnconvertibleResult {
		function: String,
		type_name: &'static str,
	},
}

impl EvaluateError {
	/// The stage the evaluation was in when it failed.
	pub fn stage(&self) -> Stage {
		match self {
			EvaluateError::MissingArgument {
				..
			} => Stage::Idle,
			EvaluateError::Compile {
				..
			} => Stage::Compiling,
			EvaluateError::Runtime {
				stage,
				..
			} => *stage,
			EvaluateError::UnconvertibleResult {
				..
			} => Stage::Exporting,
		}
	}

	pub(crate) fn runtime(stage: Stage, err: mlua::Error) -> Self {
		EvaluateError::Runtime {
			stage,
			message: error_message(err),
		}
	}
}

/// Extracts the interpreter's own message, without the `runtime error:`
/// prefix or the traceback the bindings append.
pub(crate) fn error_message(err: mlua::Error) -> String {
	match err {
		mlua::Error::SyntaxError {
			message,
			..
		} => message,
		mlua::Error::RuntimeError(message) => strip_traceback(message),
		mlua::Error::CallbackError {
			cause,
			..
		} => error_message((*cause).clone()),
		other => strip_traceback(other.to_string()),
	}
}

fn strip_traceback(message: String) -> String {
	match message.find("\nstack traceback:") {
		Some(pos) => message[..pos].to_string(),
		None => message,
	}
}
