// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mlua::Value;
use rusqlite::types::Value as SqlValue;

use crate::error::EvaluateError;

#[derive(Debug, Clone, PartialEq)]
pub enum Number {
	Integer(i64),
	Float(f64),
}

/// A Lua result, classified into the kinds SQLite can represent.
///
/// Every other kind ends up as `Unsupported`, carrying the Lua type name.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
	Bytes(Vec<u8>),
	Number(Number),
	Boolean(bool),
	Nil,
	Unsupported(&'static str),
}

impl From<Value> for ScriptValue {
	fn from(value: Value) -> Self {
		match value {
			Value::String(s) => ScriptValue::Bytes(s.as_bytes().to_vec()),
			Value::Integer(i) => ScriptValue::Number(Number::Integer(i)),
			Value::Number(n) => ScriptValue::Number(Number::Float(n)),
			Value::Boolean(b) => ScriptValue::Boolean(b),
			Value::Nil => ScriptValue::Nil,
			Value::Table(_) => ScriptValue::Unsupported("table"),
			Value::Function(_) => ScriptValue::Unsupported("function"),
			Value::Thread(_) => ScriptValue::Unsupported("thread"),
			Value::UserData(_) | Value::LightUserData(_) => ScriptValue::Unsupported("userdata"),
			other => ScriptValue::Unsupported(other.type_name()),
		}
	}
}

impl ScriptValue {
	/// Converts into the SQL result of `function`.
	///
	/// Strings become TEXT when they are valid UTF-8 and BLOB otherwise.
	/// Numbers become REAL, unless `preserve_integers` keeps Lua integers as
	/// INTEGER. Booleans become 1 or 0.
	pub fn into_sql(self, function: &str, preserve_integers: bool) -> Result<SqlValue, EvaluateError> {
		Ok(match self {
			ScriptValue::Bytes(bytes) => match String::from_utf8(bytes) {
				Ok(text) => SqlValue::Text(text),
				Err(err) => SqlValue::Blob(err.into_bytes()),
			},
			ScriptValue::Number(Number::Integer(i)) if preserve_integers => SqlValue::Integer(i),
			ScriptValue::Number(Number::Integer(i)) => SqlValue::Real(i as f64),
			ScriptValue::Number(Number::Float(f)) => SqlValue::Real(f),
			ScriptValue::Boolean(b) => SqlValue::Integer(b as i64),
			ScriptValue::Nil => SqlValue::Null,
			ScriptValue::Unsupported(type_name) => {
				return Err(EvaluateError::UnconvertibleResult {
					function: function.to_string(),
					type_name,
				});
			}
		})
	}
}
