// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Lua scalar function for SQLite.
//!
//! Registers `lua(snippet, ...)` on a [`rusqlite::Connection`]. The snippet is
//! compiled as an expression first and as a statement block when the
//! expression form does not parse. Trailing SQL arguments are passed to the
//! snippet both as `...` and as the global table `arg`:
//!
//! ```ignore
//! use reifydb_sqlite_lua::{LuaConfig, register};
//!
//! let conn = rusqlite::Connection::open_in_memory()?;
//! register(&conn, LuaConfig::default())?;
//!
//! let sum: f64 = conn.query_row("SELECT lua('arg[1] + arg[2]', 2, 3)", [], |row| row.get(0))?;
//! assert_eq!(sum, 5.0);
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod function;

pub use config::LuaConfig;
pub use error::{Error, EvaluateError, Result};
pub use evaluate::{Evaluator, Number, ScriptValue, Stage};
pub use function::{register, unregister};
