//! # Startup helpers
//!
//! Command line parsing, configuration loading and the JSON-lines input format
//! used by the binary.

use std::env;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::Value;

use crate::config::{self, FleetConfig};
use crate::directive::Directive;

/// What the command line asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// JSON file with fleet settings, from `config::<path>`
    pub config_path: Option<String>,
}

/// Reads the process arguments. Print toggles take effect immediately.
///
/// ## Arguments
/// - `print_table::true/false`, `print_err::..`, `print_warn::..`, `print_ok::..`,
///   `print_info::..`, `print_else::..`
/// - `debug`: only error messages are printed
/// - `config::<path>`: load fleet settings from a JSON file
/// - `help`: list the arguments and exit
pub fn parse_args() -> CliArgs {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a.eq_ignore_ascii_case("help")) {
        println!("Available arguments:");
        println!("  print_table::true/false");
        println!("  print_err::true/false");
        println!("  print_warn::true/false");
        println!("  print_ok::true/false");
        println!("  print_info::true/false");
        println!("  print_else::true/false");
        println!("  debug (only error messages)");
        println!("  config::<path> (JSON file with fleet settings)");
        std::process::exit(0);
    }
    parse_from(&args)
}

/// [`parse_args`] over an explicit argument list.
pub fn parse_from(args: &[String]) -> CliArgs {
    let mut cli = CliArgs::default();
    for arg in args {
        if let Some((key, value)) = arg.split_once("::") {
            let is_true = value.eq_ignore_ascii_case("true");
            match key.to_lowercase().as_str() {
                "print_table" => config::set_print(&config::PRINT_TABLE_ON, is_true),
                "print_err" => config::set_print(&config::PRINT_ERR_ON, is_true),
                "print_warn" => config::set_print(&config::PRINT_WARN_ON, is_true),
                "print_ok" => config::set_print(&config::PRINT_OK_ON, is_true),
                "print_info" => config::set_print(&config::PRINT_INFO_ON, is_true),
                "print_else" => config::set_print(&config::PRINT_ELSE_ON, is_true),
                "config" => cli.config_path = Some(value.to_string()),
                _ => {}
            }
        } else if arg.eq_ignore_ascii_case("debug") {
            // Debug modus: kun error-meldingar
            for toggle in [
                &config::PRINT_TABLE_ON,
                &config::PRINT_WARN_ON,
                &config::PRINT_OK_ON,
                &config::PRINT_INFO_ON,
                &config::PRINT_ELSE_ON,
            ] {
                config::set_print(toggle, false);
            }
        }
    }
    cli
}

/// Loads and validates the fleet configuration. Without a path the defaults are used.
pub fn load_config(path: Option<&str>) -> anyhow::Result<FleetConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
            serde_json::from_str::<FleetConfig>(&text).with_context(|| format!("parsing config file {}", path))?
        }
        None => FleetConfig::default(),
    };
    config.validate().context("invalid fleet configuration")?;
    Ok(config)
}

/// One line of input: a directive and the offset from start at which to submit it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDirective {
    /// Offset from program start, if any
    pub at: Option<Duration>,
    #[allow(missing_docs)]
    pub directive: Directive,
}

/// Parses one JSON-lines input record, e.g.
/// `{"at": 1.5, "kind": "pickup", "id": 3, "priority": 10, "from": "B1", "to": "F4"}`.
pub fn parse_record(line: &str) -> anyhow::Result<ScheduledDirective> {
    let value: Value = serde_json::from_str(line).context("input line is not JSON")?;
    let at = match value.get("at") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let Some(secs) = raw.as_f64().filter(|s| s.is_finite() && *s >= 0.0) else {
                bail!("'at' must be a non-negative number of seconds, got {}", raw);
            };
            Some(Duration::from_secs_f64(secs))
        }
    };
    let directive = serde_json::from_value(value).context("input line is not a directive")?;
    Ok(ScheduledDirective { at, directive })
}
