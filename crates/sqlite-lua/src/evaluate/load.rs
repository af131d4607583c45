// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mlua::{ChunkMode, Function, Lua};
use tracing::debug;

use crate::error::{EvaluateError, error_message};

const EXPRESSION_PREFIX: &[u8] = b"return ";

/// Compiles a snippet into an executable unit.
pub(crate) fn load(lua: &Lua, snippet: &[u8]) -> Result<Function, EvaluateError> {
	load_with(snippet, |source| compile(lua, source))
}

/// Two-stage compilation: the snippet is tried as an expression, prefixed with
/// `return `, and only a syntax error on that form lets the raw snippet be
/// compiled as a statement block. Any other failure is final.
pub(crate) fn load_with<T, F>(snippet: &[u8], mut compile: F) -> Result<T, EvaluateError>
where
	F: FnMut(&[u8]) -> mlua::Result<T>,
{
	let mut expression = Vec::with_capacity(EXPRESSION_PREFIX.len() + snippet.len());
	expression.extend_from_slice(EXPRESSION_PREFIX);
	expression.extend_from_slice(snippet);

	match compile(&expression) {
		Ok(unit) => Ok(unit),
		Err(mlua::Error::SyntaxError {
			..
		}) => {
			debug!("snippet is not an expression, compiling as statement block");
			compile(snippet).map_err(|err| EvaluateError::Compile {
				message: error_message(err),
			})
		}
		Err(err) => Err(EvaluateError::Compile {
			message: error_message(err),
		}),
	}
}

fn compile(lua: &Lua, source: &[u8]) -> mlua::Result<Function> {
	lua.load(source).set_name(chunk_name(source)).set_mode(ChunkMode::Text).into_function()
}

/// The chunk is named after its own source text, so diagnostics read
/// `[string "return 1 +"]:1: ...`. The name ends at the first NUL byte.
fn chunk_name(source: &[u8]) -> String {
	let end = source.iter().position(|&b| b == 0).unwrap_or(source.len());
	String::from_utf8_lossy(&source[..end]).into_owned()
}
