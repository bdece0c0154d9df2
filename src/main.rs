//! sqlb - SQLite through the run-time bridge
//!
//! Command line front end for inspecting the loaded library and running SQL.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlite_bridge::config::BridgeConfig;
use sqlite_bridge::sqlite::{Bridge, DbHandle, Sqlite3Api, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlb")]
#[command(version)]
#[command(about = "Call into libsqlite3 without linking it", long_about = None)]
struct Cli {
    /// Shared object to open (overrides the config file)
    #[arg(long, global = true)]
    library: Option<String>,

    /// Config file (default: search for sqlite-bridge.toml upwards)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information of the loaded library
    Info,

    /// List the bound exports with their signatures
    Symbols,

    /// Run SQL statements against a database
    Exec {
        /// Database file, or :memory:
        database: String,

        /// SQL text; several statements may be separated by ';'
        #[arg(required = true)]
        sql: Vec<String>,

        /// Positional parameter value (repeatable)
        #[arg(short, long = "param", value_name = "VALUE")]
        params: Vec<String>,

        /// Print column names before the first row
        #[arg(long)]
        header: bool,

        /// Report last insert rowid and change count per statement
        #[arg(long)]
        stats: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Symbols => cmd_symbols(),
        Commands::Info => {
            let config = load_config(cli.config.as_ref(), cli.library)?;
            cmd_info(init_bridge(&config)?)
        }
        Commands::Exec {
            database,
            sql,
            params,
            header,
            stats,
        } => {
            let config = load_config(cli.config.as_ref(), cli.library)?;
            let bridge = init_bridge(&config)?;
            cmd_exec(bridge, &config, &database, &sql.join(" "), &params, header, stats)
        }
    }
}

fn init_bridge(config: &BridgeConfig) -> Result<&'static Bridge> {
    let bridge = Bridge::init(config);
    if let Some(err) = bridge.init_error() {
        bail!("Failed to bind {}: {}", config.library.name, err);
    }
    Ok(bridge)
}

fn load_config(path: Option<&PathBuf>, library: Option<String>) -> Result<BridgeConfig> {
    let mut config = match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BridgeConfig::discover(),
    };
    if let Some(library) = library {
        config.library.name = library;
    }
    Ok(config)
}

fn cmd_symbols() -> Result<()> {
    for descriptor in Sqlite3Api::descriptors() {
        println!("{}", descriptor);
    }
    Ok(())
}

fn cmd_info(bridge: &Bridge) -> Result<()> {
    println!("library:        {}", bridge.library_name().unwrap_or("?"));
    println!("version:        {}", bridge.libversion()?);
    println!("version number: {}", bridge.libversion_number()?);
    println!("source id:      {}", bridge.sourceid()?);
    println!("threadsafe:     {}", bridge.threadsafe()?);
    Ok(())
}

fn cmd_exec(
    bridge: &Bridge,
    config: &BridgeConfig,
    database: &str,
    sql: &str,
    params: &[String],
    header: bool,
    stats: bool,
) -> Result<()> {
    let (db, code) = bridge.open_v2(database, config.connection.open_flags(), None)?;
    if !code.is_ok() {
        let message = bridge.errmsg(db)?;
        bridge.close_v2(db)?;
        bail!("Failed to open {}: {} ({})", database, message, code);
    }

    if let Some(ms) = config.connection.busy_timeout_ms {
        bridge.busy_timeout(db, ms)?;
    }

    let result = run_statements(bridge, db, sql, params, header, stats);
    bridge.close_v2(db)?;
    result
}

fn run_statements(
    bridge: &Bridge,
    db: DbHandle,
    sql: &str,
    params: &[String],
    header: bool,
    stats: bool,
) -> Result<()> {
    let values: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
    let mut remaining = sql.to_string();
    let mut next_param = 0;

    loop {
        let prepared = bridge.prepare_v2(db, &remaining)?;
        if !prepared.code.is_ok() {
            bail!("{} ({})", bridge.errmsg(db)?, prepared.code);
        }
        // Whitespace or comments only
        if prepared.stmt.is_null() {
            break;
        }
        let stmt = prepared.stmt;

        let count = bridge.bind_parameter_count(stmt)?;
        for ordinal in 1..=count {
            let value = values.get(next_param).unwrap_or(&Value::Null);
            next_param += 1;
            let code = bridge.bind_value(stmt, ordinal, value)?;
            if !code.is_ok() {
                bridge.finalize(stmt)?;
                bail!("Failed to bind parameter {}: {}", ordinal, bridge.errstr(code)?);
            }
        }

        let columns = bridge.column_count(stmt)?;
        if header && columns > 0 {
            let names = (0..columns)
                .map(|i| -> Result<String> { Ok(bridge.column_name(stmt, i)?.unwrap_or_default()) })
                .collect::<Result<Vec<_>>>()?;
            println!("{}", names.join("\t"));
        }

        let outcome = loop {
            let outcome = bridge.step(stmt)?;
            if !outcome.code.is_row() {
                break outcome;
            }
            let row = (0..columns)
                .map(|i| -> Result<String> { Ok(bridge.column_value(stmt, i)?.to_string()) })
                .collect::<Result<Vec<_>>>()?;
            println!("{}", row.join("\t"));
        };

        if !outcome.code.is_done() {
            let message = bridge.errmsg(db)?;
            bridge.finalize(stmt)?;
            bail!("{} ({})", message, outcome.code);
        }
        if stats {
            println!(
                "last_insert_rowid={} changes={}",
                outcome.last_insert_rowid, outcome.changes
            );
        }

        bridge.finalize(stmt)?;
        remaining = prepared.tail;
        if remaining.trim().is_empty() {
            break;
        }
    }
    Ok(())
}

/// Integer, then finite float, then NULL; anything else binds as text.
fn parse_param(raw: &str) -> Value {
    if let Ok(v) = raw.parse::<i64>() {
        return Value::Integer(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => return Value::Real(v),
        _ => {}
    }
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else {
        Value::Text(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("42"), Value::Integer(42));
        assert_eq!(parse_param("-1.5"), Value::Real(-1.5));
        assert_eq!(parse_param("NULL"), Value::Null);
        assert_eq!(parse_param("seven"), Value::Text("seven".to_string()));
    }

    #[test]
    fn test_non_finite_params_stay_text() {
        for raw in ["inf", "-inf", "infinity", "NaN", "nan"] {
            assert_eq!(parse_param(raw), Value::Text(raw.to_string()));
        }
    }
}
