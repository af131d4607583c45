// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{self, Write as _},
	io::{self, Read, Write},
	path::PathBuf,
	process::ExitCode,
};

use clap::Parser;
use reifydb_sqlite_lua::{LuaConfig, register};
use rusqlite::{Batch, Connection, fallible_iterator::FallibleIterator, types::ValueRef};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Runs SQL against SQLite with a Lua scalar function registered
#[derive(Parser, Debug)]
#[command(name = "reifydb-lua-shell")]
#[command(about = "Evaluate Lua snippets inside SQL", long_about = None)]
struct Args {
	/// Database file, in-memory when omitted
	#[arg(long, short)]
	database: Option<PathBuf>,

	/// Name the function is registered under
	#[arg(long, default_value = "lua")]
	function_name: String,

	/// Register the function as deterministic
	#[arg(long)]
	deterministic: bool,

	/// Only allow the function in top-level SQL
	#[arg(long)]
	direct_only: bool,

	/// Return Lua integers as INTEGER instead of REAL
	#[arg(long)]
	preserve_integers: bool,

	/// Log filter, overrides RUST_LOG
	#[arg(long)]
	log: Option<String>,

	/// SQL to run (if not provided, reads from stdin)
	sql: Vec<String>,
}

impl Args {
	fn config(&self) -> LuaConfig {
		LuaConfig::new()
			.function_name(self.function_name.as_str())
			.deterministic(self.deterministic)
			.direct_only(self.direct_only)
			.preserve_integers(self.preserve_integers)
	}
}

#[derive(Debug, Error)]
enum ShellError {
	#[error(transparent)]
	Lua(#[from] reifydb_sqlite_lua::Error),

	#[error(transparent)]
	Sqlite(#[from] rusqlite::Error),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Format(#[from] fmt::Error),

	#[error("invalid log filter: {0}")]
	LogFilter(String),
}

fn init_logging(directive: Option<&str>) -> Result<(), ShellError> {
	let filter = match directive {
		Some(directive) => EnvFilter::try_new(directive).map_err(|err| ShellError::LogFilter(err.to_string()))?,
		None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
	};

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
	Ok(())
}

fn open(database: Option<&PathBuf>) -> Result<Connection, ShellError> {
	let conn = match database {
		Some(path) => Connection::open(path)?,
		None => Connection::open_in_memory()?,
	};
	Ok(conn)
}

/// Runs every statement in `sql`, writing result rows to `out`.
fn execute<W: Write>(conn: &Connection, sql: &str, out: &mut W) -> Result<(), ShellError> {
	let mut batch = Batch::new(conn, sql);
	while let Some(mut stmt) = batch.next()? {
		debug!(sql = %stmt.expanded_sql().unwrap_or_default(), "executing statement");
		let columns = stmt.column_count();
		let mut rows = stmt.query([])?;
		while let Some(row) = rows.next()? {
			let mut line = String::new();
			for idx in 0..columns {
				if idx > 0 {
					line.push('|');
				}
				render(&mut line, row.get_ref(idx)?)?;
			}
			writeln!(out, "{line}")?;
		}
	}
	Ok(())
}

fn render<W: fmt::Write>(out: &mut W, value: ValueRef<'_>) -> fmt::Result {
	match value {
		ValueRef::Null => Ok(()),
		ValueRef::Integer(i) => write!(out, "{i}"),
		ValueRef::Real(f) => write!(out, "{f:?}"),
		ValueRef::Text(bytes) => out.write_str(&String::from_utf8_lossy(bytes)),
		ValueRef::Blob(bytes) => {
			out.write_str("x'")?;
			for byte in bytes {
				write!(out, "{byte:02x}")?;
			}
			out.write_char('\'')
		}
	}
}

fn run(args: Args) -> Result<(), ShellError> {
	init_logging(args.log.as_deref())?;

	let conn = open(args.database.as_ref())?;
	register(&conn, args.config())?;
	info!(function = %args.function_name, "shell ready");

	let stdout = io::stdout();
	let mut out = stdout.lock();

	if args.sql.is_empty() {
		let mut sql = String::new();
		io::stdin().read_to_string(&mut sql)?;
		execute(&conn, &sql, &mut out)?;
	} else {
		for sql in &args.sql {
			execute(&conn, sql, &mut out)?;
		}
	}

	out.flush()?;
	Ok(())
}

fn main() -> ExitCode {
	match run(Args::parse()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {err}");
			ExitCode::FAILURE
		}
	}
}
