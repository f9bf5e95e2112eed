//! Boolean circuit tools.
//!
//! Provides the `boolcirc` binary:
//! - `analyze` prints the per-level cell report for a gate-level netlist.
//! - `dot` prints the cell dependency graph in Graphviz format.
//! - `run` evaluates a netlist or IR function on plaintext arguments.
//!
//! Exit codes: 0 = success, 1 = usage or parse error, 2 = evaluation
//! error, 3 = I/O error.

mod analyze;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boolcirc_core::{CellLibrary, Module};
use boolcirc_exec::{
    decode_le_bits, encode_le_bits, CircuitRunner, EngineConfig, EngineError, RunArgs, Schedule,
};

/// Boolean circuit analysis and execution tools.
#[derive(Parser)]
#[command(name = "boolcirc", about = "Boolean circuit analysis and execution tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the level report for a netlist.
    Analyze {
        /// Structural Verilog netlist.
        #[arg(short, long)]
        netlist: PathBuf,

        /// Liberty cell library (default: built-in gate set).
        #[arg(short = 'l', long)]
        cell_library: Option<PathBuf>,

        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the cell dependency graph as Graphviz DOT.
    Dot {
        /// Structural Verilog netlist.
        #[arg(short, long)]
        netlist: PathBuf,

        /// Liberty cell library (default: built-in gate set).
        #[arg(short = 'l', long)]
        cell_library: Option<PathBuf>,
    },

    /// Evaluate a circuit on plaintext arguments.
    Run {
        /// Structural Verilog netlist.
        #[arg(long, conflicts_with = "ir", required_unless_present = "ir")]
        netlist: Option<PathBuf>,

        /// JSON dataflow IR function.
        #[arg(long)]
        ir: Option<PathBuf>,

        /// Liberty cell library for --netlist (default: built-in gate set).
        #[arg(short = 'l', long)]
        cell_library: Option<PathBuf>,

        /// Function metadata JSON.
        #[arg(short, long)]
        metadata: PathBuf,

        /// Argument as NAME=VALUE; VALUE is decimal or 0x-prefixed hex.
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Worker threads (default: BOOLCIRC_WORKERS or twice the core count).
        #[arg(short, long)]
        workers: Option<usize>,

        /// Scheduling strategy: dataflow or levelled.
        #[arg(short, long)]
        schedule: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Analyze {
            netlist,
            cell_library,
            output,
        } => run_analyze(&netlist, cell_library.as_deref(), output.as_deref()),
        Commands::Dot {
            netlist,
            cell_library,
        } => run_dot(&netlist, cell_library.as_deref()),
        Commands::Run {
            netlist,
            ir,
            cell_library,
            metadata,
            args,
            workers,
            schedule,
        } => run_run(
            netlist.as_deref(),
            ir.as_deref(),
            cell_library.as_deref(),
            &metadata,
            &args,
            workers,
            schedule.as_deref(),
        ),
    };
    process::exit(exit_code);
}

/// Reads a file, reporting failures as exit code 3.
fn read(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })
}

/// Loads the cell library and parses the netlist, returning exit codes
/// on failure.
fn load_netlist(
    netlist: &Path,
    cell_library: Option<&Path>,
) -> Result<(Module, CellLibrary, String), i32> {
    let (library, label) = match cell_library {
        Some(path) => {
            let text = read(path)?;
            let library = CellLibrary::parse(&text).map_err(|e| {
                eprintln!("Error: invalid cell library '{}': {}", path.display(), e);
                1
            })?;
            (library, path.display().to_string())
        }
        None => (CellLibrary::builtin(), "<builtin>".to_string()),
    };
    let text = read(netlist)?;
    let module = Module::parse(&text).map_err(|e| {
        eprintln!("Error: invalid netlist '{}': {}", netlist.display(), e);
        1
    })?;
    Ok((module, library, label))
}

/// Execute the analyze subcommand.
fn run_analyze(netlist: &Path, cell_library: Option<&Path>, output: Option<&Path>) -> i32 {
    let (module, library, label) = match load_netlist(netlist, cell_library) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let report =
        match analyze::level_report(&module, &library, &label, &netlist.display().to_string()) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
    match output {
        Some(path) => match fs::write(path, report) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", path.display(), e);
                3
            }
        },
        None => {
            print!("{}", report);
            0
        }
    }
}

/// Execute the dot subcommand.
fn run_dot(netlist: &Path, cell_library: Option<&Path>) -> i32 {
    let (module, library, _) = match load_netlist(netlist, cell_library) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    match analyze::dot(&module, &library) {
        Ok(dot) => {
            println!("{}", dot);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Execute the run subcommand.
fn run_run(
    netlist: Option<&Path>,
    ir: Option<&Path>,
    cell_library: Option<&Path>,
    metadata: &Path,
    raw_args: &[String],
    workers: Option<usize>,
    schedule: Option<&str>,
) -> i32 {
    let metadata_json = match read(metadata) {
        Ok(text) => text,
        Err(code) => return code,
    };
    let built = match (netlist, ir) {
        (Some(netlist), _) => {
            let liberty = match cell_library.map(read).transpose() {
                Ok(text) => text,
                Err(code) => return code,
            };
            let text = match read(netlist) {
                Ok(text) => text,
                Err(code) => return code,
            };
            CircuitRunner::from_netlist(liberty.as_deref(), &text, &metadata_json)
        }
        (None, Some(ir)) => {
            let text = match read(ir) {
                Ok(text) => text,
                Err(code) => return code,
            };
            CircuitRunner::from_ir(&text, &metadata_json)
        }
        (None, None) => {
            eprintln!("Error: one of --netlist or --ir is required");
            return 1;
        }
    };
    let runner = match built {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Error: failed to build circuit: {}", e);
            return 1;
        }
    };

    let mut config = runner.engine().config().clone();
    if let Some(workers) = workers {
        config = EngineConfig::with_workers(workers).schedule(config.strategy);
    }
    if let Some(name) = schedule {
        match name.parse::<Schedule>() {
            Ok(strategy) => config = config.schedule(strategy),
            Err(msg) => {
                eprintln!("Error: {}", msg);
                return 1;
            }
        }
    }
    let runner = runner.with_config(config);

    let values = match parse_args(raw_args) {
        Ok(values) => values,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 1;
        }
    };

    let mut inputs: Vec<(String, Vec<bool>)> = Vec::new();
    let mut in_out: Vec<(String, Vec<bool>)> = Vec::new();
    for param in &runner.metadata().params {
        let Some(value) = values.iter().find(|(n, _)| *n == param.name).map(|(_, v)| *v) else {
            eprintln!("Error: missing argument '{}'", param.name);
            return 1;
        };
        let bits = encode_le_bits(value, param.width);
        if param.is_in_out() {
            in_out.push((param.name.clone(), bits));
        } else {
            inputs.push((param.name.clone(), bits));
        }
    }
    if let Some((name, _)) = values
        .iter()
        .find(|(n, _)| runner.metadata().param(n).is_err())
    {
        eprintln!("Error: '{}' is not a parameter of {}", name, runner.metadata().name);
        return 1;
    }

    let mut result = vec![false; runner.metadata().return_width];
    let mut args = RunArgs::new();
    for (name, bits) in &inputs {
        args = args.input(name, bits);
    }
    for (name, bits) in in_out.iter_mut() {
        args = args.in_out(name, bits);
    }

    let stats = match runner.run_plaintext(&mut result, args) {
        Ok(stats) => stats,
        Err(e @ EngineError::MissingArgument { .. }) => {
            eprintln!("Error: {}", e);
            return 1;
        }
        Err(e) => {
            eprintln!("Evaluation error: {}", e);
            return 2;
        }
    };

    let updated: serde_json::Map<String, serde_json::Value> = in_out
        .iter()
        .map(|(name, bits)| (name.clone(), decode_le_bits(bits).into()))
        .collect();
    let output = serde_json::json!({
        "result": if result.is_empty() { None } else { Some(decode_le_bits(&result)) },
        "in_out": updated,
        "stats": stats,
    });
    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
    0
}

/// Parses `NAME=VALUE` pairs.
fn parse_args(raw: &[String]) -> Result<Vec<(String, u64)>, String> {
    raw.iter()
        .map(|arg| {
            let (name, value) = arg
                .split_once('=')
                .ok_or_else(|| format!("invalid argument '{}', expected NAME=VALUE", arg))?;
            let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => value.parse::<u64>(),
            };
            parsed
                .map(|v| (name.to_string(), v))
                .map_err(|_| format!("invalid value '{}' for argument '{}'", value, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_arguments() {
        let raw = vec!["a=97".to_string(), "key=0x0f".to_string()];
        assert_eq!(
            parse_args(&raw).unwrap(),
            vec![("a".to_string(), 97), ("key".to_string(), 15)]
        );
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse_args(&["a".to_string()]).is_err());
        assert!(parse_args(&["a=0xzz".to_string()]).is_err());
    }
}
