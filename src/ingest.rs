//! Rule ingestion and normalization
//!
//! Turns textual rule listings into validated, position-ordered [`Rule`]
//! sequences for the core. Two dialects are supported:
//!
//! - **Rule tables**: one rule per line with the six comma-separated fields
//!   `protocol,src,s_port,dst,d_port,action`. Port sets are grouped with
//!   braces (`{HTTP,HTTPS}`), so the commas inside them do not split
//!   fields. Blank lines and `#` comments are skipped, as is an optional
//!   leading header row.
//! - **iptables-save excerpts**: `-A <chain>` lines with the common match
//!   flags (`-p`, `-s`, `-d`, `--sport`, `--dport`) and a `-j` target.
//!   `DROP` and `REJECT` both normalize to `deny`. Table markers
//!   (`*filter`), chain declarations (`:INPUT ...`) and `COMMIT` are
//!   skipped.
//!
//! Positions are assigned in file order starting at 0. All field validation
//! happens in [`Rule::from_record`]; this module only slices text into
//! records and reports line-level structure problems.

use crate::core::error::{Error, Result};
use crate::core::rule::{RawRecord, Rule};
use tracing::debug;

/// The canonical header row of a rule table, recognized and skipped.
const TABLE_HEADER: &str = "protocol,src,s_port,dst,d_port,action";

/// Parses a rule-table text into validated rules in file order.
///
/// # Errors
///
/// Returns [`Error::Parse`] for a line with the wrong field count and
/// [`Error::Validation`] for a field rejected by rule construction.
///
/// # Examples
///
/// ```
/// use fwlens::ingest::parse_rule_table;
///
/// let rules = parse_rule_table(
///     "# corporate edge ruleset\n\
///      tcp,140.192.37.0/24,ANY,0.0.0.0/0,{HTTP,HTTPS},accept\n\
///      ip,0.0.0.0/0,ANY,0.0.0.0/0,ANY,deny\n",
/// )
/// .unwrap();
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules[1].position, 1);
/// ```
pub fn parse_rule_table(text: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for (line_number, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if rules.is_empty() && is_header_row(line) {
            continue;
        }

        let fields = split_record_line(line, line_number + 1)?;
        let record = RawRecord {
            protocol: fields[0].clone(),
            src: fields[1].clone(),
            s_port: fields[2].clone(),
            dst: fields[3].clone(),
            d_port: fields[4].clone(),
            action: fields[5].clone(),
        };

        let position = rules.len();
        rules.push(Rule::from_record(position, &record)?);
    }

    debug!(count = rules.len(), "parsed rule table");
    Ok(rules)
}

fn is_header_row(line: &str) -> bool {
    line.to_ascii_lowercase().replace(' ', "") == TABLE_HEADER
}

/// Splits one record line into exactly six fields, treating commas inside
/// `{...}` groups as part of the field.
fn split_record_line(line: &str, line_number: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut depth = 0u32;

    for c in line.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    if fields.len() != 6 {
        return Err(Error::Parse {
            line: line_number,
            message: format!("expected 6 fields, found {}", fields.len()),
        });
    }
    Ok(fields)
}

/// Parses an iptables-save style listing into validated rules in file order.
///
/// # Errors
///
/// Returns [`Error::Parse`] for an unsupported flag, a flag missing its
/// argument, or a rule line without a `-j` target, and [`Error::Validation`]
/// for field values rejected by rule construction.
pub fn parse_iptables_save(text: &str) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for (line_number, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        let line_number = line_number + 1;
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with('*')
            || line.starts_with(':')
            || line == "COMMIT"
        {
            continue;
        }

        let record = parse_iptables_rule_line(line, line_number)?;
        let position = rules.len();
        rules.push(Rule::from_record(position, &record)?);
    }

    debug!(count = rules.len(), "parsed iptables listing");
    Ok(rules)
}

fn parse_iptables_rule_line(line: &str, line_number: usize) -> Result<RawRecord> {
    let parse_err = |message: String| Error::Parse {
        line: line_number,
        message,
    };

    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("-A") => {}
        other => {
            return Err(parse_err(format!(
                "expected '-A <chain>', found '{}'",
                other.unwrap_or("")
            )));
        }
    }
    // Chain name carries no field information for the analysis
    tokens
        .next()
        .ok_or_else(|| parse_err("missing chain name after -A".into()))?;

    let mut protocol = "ip".to_string();
    let mut src = "0.0.0.0/0".to_string();
    let mut dst = "0.0.0.0/0".to_string();
    let mut s_port = "ANY".to_string();
    let mut d_port = "ANY".to_string();
    let mut action: Option<String> = None;

    while let Some(flag) = tokens.next() {
        let mut arg = |name: &str| {
            tokens
                .next()
                .map(str::to_string)
                .ok_or_else(|| parse_err(format!("flag {name} is missing its argument")))
        };

        match flag {
            "-p" | "--protocol" => {
                let value = arg(flag)?;
                protocol = if value.eq_ignore_ascii_case("all") {
                    "ip".to_string()
                } else {
                    value
                };
            }
            "-s" | "--source" => src = arg(flag)?,
            "-d" | "--destination" => dst = arg(flag)?,
            "--sport" | "--source-port" => s_port = braced_if_list(&arg(flag)?),
            "--dport" | "--destination-port" => d_port = braced_if_list(&arg(flag)?),
            "-j" | "--jump" => {
                let target = arg(flag)?;
                action = Some(match target.to_ascii_uppercase().as_str() {
                    "ACCEPT" => "accept".to_string(),
                    // Both filtering verbs collapse to deny in the two-valued model
                    "DROP" | "REJECT" => "deny".to_string(),
                    other => {
                        return Err(parse_err(format!("unsupported jump target '{other}'")));
                    }
                });
            }
            other => {
                return Err(parse_err(format!("unsupported flag '{other}'")));
            }
        }
    }

    let action = action.ok_or_else(|| parse_err("rule has no -j target".into()))?;

    Ok(RawRecord {
        protocol,
        src,
        s_port,
        dst,
        d_port,
        action,
    })
}

/// iptables multiport lists (`80,443`) become braced port sets.
fn braced_if_list(value: &str) -> String {
    if value.contains(',') {
        format!("{{{value}}}")
    } else {
        value.to_string()
    }
}
