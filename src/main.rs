use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sql_curry::config::host_identity;
use sql_curry::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Scalar,
    NonQuery,
    Rows,
    Row,
    Dataset,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one command against a configured target")]
struct Args {
    /// Registry name of the target (logs, jics, powerfaids, irb, irb_dev, forms)
    #[arg(long)]
    target: String,
    #[arg(long, value_enum, default_value = "rows")]
    mode: Mode,
    /// Treat the command text as a stored procedure name
    #[arg(long)]
    procedure: bool,
    /// Parameter as `name=value`; repeat in bind order
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
    /// Host name used to pick the bootstrap database (defaults to this machine)
    #[arg(long)]
    host: Option<String>,
    #[arg(long, value_enum, default_value = "mssql")]
    bootstrap_type: DatabaseType,
    #[arg(long, value_enum, default_value = "mssql")]
    target_type: DatabaseType,
    /// Command text or procedure name
    sql: String,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn param_value(raw: &str) -> RowValues {
    if raw.eq_ignore_ascii_case("null") {
        RowValues::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        RowValues::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        RowValues::Float(f)
    } else {
        RowValues::Text(raw.to_string())
    }
}

fn execute(args: &Args) -> Result<Option<String>, SqlCurryError> {
    let host = args.host.clone().unwrap_or_else(host_identity);
    let bootstrap = BootstrapConnections::from_env();
    let store = ConfigStore::bootstrap(Target::new(
        "bootstrap",
        Some(bootstrap.resolve(&host).to_string()),
        args.bootstrap_type,
    ));
    let registry = TargetRegistry::load(&store, args.target_type)?;
    let target = registry.get(&args.target).ok_or_else(|| {
        SqlCurryError::ConfigError(format!("unknown target `{}`", args.target))
    })?;

    let kind = if args.procedure {
        CommandKind::StoredProcedure
    } else {
        CommandKind::Text
    };
    let builder = args
        .params
        .iter()
        .fold(target.command_of_kind(args.sql.as_str(), kind), |b, (name, raw)| {
            b.param(name.as_str(), param_value(raw))
        });

    Ok(match args.mode {
        Mode::Scalar => optional_to_json(builder.scalar()?.as_ref()),
        Mode::NonQuery => to_json(&builder.non_query()?),
        Mode::Rows => optional_to_json(builder.rows()?.as_ref()),
        Mode::Row => optional_to_json(builder.row()?.as_ref()),
        Mode::Dataset => to_json(&builder.dataset()?),
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match execute(&args) {
        Ok(json) => {
            println!("{}", json.unwrap_or_else(|| "null".to_string()));
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}
