//! fwlens - firewall rule anomaly analyzer
//!
//! Command-line front end over the `fwlens` library: ingest a rule listing,
//! run the pairwise anomaly analysis or a packet simulation, and print or
//! export the results.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a rule table and print the anomaly report
//! fwlens analyze rules.csv
//!
//! # Same, as JSON for tooling
//! fwlens analyze rules.csv --json
//!
//! # Analyze an iptables-save excerpt
//! fwlens analyze rules.v4 --format iptables
//!
//! # Trace one packet through the ordered list
//! fwlens simulate rules.csv --packet tcp,140.192.37.20,4000,161.120.33.41,80
//!
//! # Normalize any supported input back to the canonical CSV table
//! fwlens export rules.v4 --format iptables -o rules.csv
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use fwlens::core::classify::analyze;
use fwlens::core::rule::{Packet, Rule};
use fwlens::core::simulate::first_match;
use fwlens::{ingest, report};

#[derive(Parser)]
#[command(name = "fwlens")]
#[command(about = "Firewall rule anomaly analyzer and packet simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a rule listing for pairwise anomalies
    Analyze {
        /// Path to the rule listing
        file: PathBuf,
        /// Input format (table or iptables)
        #[arg(short, long, default_value = "table")]
        format: String,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Trace one packet through the ordered rule list (first match wins)
    Simulate {
        /// Path to the rule listing
        file: PathBuf,
        /// Packet as protocol,src,s_port,dst,d_port (ports may be ANY)
        #[arg(short, long)]
        packet: String,
        /// Input format (table or iptables)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
    /// Normalize a rule listing to the canonical CSV table
    Export {
        /// Path to the rule listing
        file: PathBuf,
        /// Input format (table or iptables)
        #[arg(short, long, default_value = "table")]
        format: String,
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match handle_cli(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn handle_cli(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Analyze { file, format, json } => {
            let rules = load_rules(&file, &format)?;
            let index = analyze(&rules);
            if json {
                println!("{}", report::render_json(&rules, &index)?);
            } else {
                print!("{}", report::render_report(&rules, &index));
            }
        }
        Commands::Simulate {
            file,
            packet,
            format,
        } => {
            let rules = load_rules(&file, &format)?;
            let packet = Packet::parse(&packet)?;
            let outcome = first_match(&packet, &rules);
            print!("{}", report::render_simulation(&packet, outcome.as_ref()));
        }
        Commands::Export {
            file,
            format,
            output,
        } => {
            let rules = load_rules(&file, &format)?;
            let csv = report::rules_to_csv(&rules);
            match output {
                Some(path) => std::fs::write(path, csv)?,
                None => print!("{csv}"),
            }
        }
    }
    Ok(())
}

fn load_rules(file: &Path, format: &str) -> Result<Vec<Rule>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let rules = match format {
        "table" => ingest::parse_rule_table(&text)?,
        "iptables" => ingest::parse_iptables_save(&text)?,
        _ => return Err("Invalid format. Use 'table' or 'iptables'.".into()),
    };
    Ok(rules)
}
