//! Firewall rule and packet data structures
//!
//! This module defines the core value types the analyzer operates on:
//!
//! - [`Rule`] - an immutable filtering rule with the six semantic fields
//!   (protocol, src, `s_port`, dst, `d_port`, action) plus a stable [`Uuid`]
//!   identity and its list position
//! - [`Packet`] - a single-valued instantiation of the same fields, used for
//!   first-match simulation
//! - [`RawRecord`] - the six textual fields as handed over by the ingestion
//!   layer, before validation
//!
//! # Construction
//!
//! [`Rule::from_record`] is the only path from text to a `Rule`. Every field
//! is parsed into a closed typed form exactly once; a malformed CIDR, unknown
//! protocol token, unknown port alias, or unrecognized action is rejected
//! with a validation error naming the rule position and the offending field.
//! The classifier and matcher assume all rules passed validation.
//!
//! # Ordering and identity
//!
//! A rule's `position` is its index in the ordered list and doubles as its
//! matching priority (lower = evaluated first). Identity is the separate
//! stable `id`: reordering a list reassigns positions but keeps ids, so
//! consumers can track rules across analysis runs.

use crate::core::error::{Error, Field, Result};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Network protocol selector for a rule.
///
/// `Ip` is the wildcard: it matches every protocol and covers every other
/// selector. `Copy` trait allows efficient passing by value for this small enum.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Protocol {
    /// Wildcard: matches all protocols
    #[strum(serialize = "ip")]
    Ip,
    /// Transmission Control Protocol
    #[strum(serialize = "tcp")]
    Tcp,
    /// User Datagram Protocol
    #[strum(serialize = "udp")]
    Udp,
    /// Internet Control Message Protocol
    #[strum(serialize = "icmp")]
    Icmp,
}

impl Protocol {
    /// Returns the lowercase protocol token as a static string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Ip => "ip",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
        }
    }
}

/// Rule action (accept or deny)
///
/// Controls what happens to a packet matched by the rule.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Action {
    /// Accept the packet (allow it through)
    #[default]
    #[strum(serialize = "accept")]
    Accept,
    /// Deny the packet
    #[strum(serialize = "deny")]
    Deny,
}

impl Action {
    /// Returns the lowercase action token as a static string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Deny => "deny",
        }
    }
}

/// Named service alias resolvable to a well-known port number.
///
/// The table is fixed; an alias outside it is a validation error, not a
/// lookup against `/etc/services`.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ServicePort {
    #[strum(serialize = "FTP")]
    Ftp,
    #[strum(serialize = "SSH")]
    Ssh,
    #[strum(serialize = "TELNET")]
    Telnet,
    #[strum(serialize = "SMTP")]
    Smtp,
    #[strum(serialize = "DNS")]
    Dns,
    #[strum(serialize = "HTTP")]
    Http,
    #[strum(serialize = "POP3")]
    Pop3,
    #[strum(serialize = "IMAP")]
    Imap,
    #[strum(serialize = "HTTPS")]
    Https,
    #[strum(serialize = "RDP")]
    Rdp,
}

impl ServicePort {
    /// Returns the well-known port number for this service.
    ///
    /// # Examples
    ///
    /// ```
    /// use fwlens::core::rule::ServicePort;
    ///
    /// assert_eq!(ServicePort::Http.number(), 80);
    /// assert_eq!(ServicePort::Https.number(), 443);
    /// assert_eq!(ServicePort::Dns.number(), 53);
    /// ```
    pub const fn number(self) -> u16 {
        match self {
            ServicePort::Ftp => 21,
            ServicePort::Ssh => 22,
            ServicePort::Telnet => 23,
            ServicePort::Smtp => 25,
            ServicePort::Dns => 53,
            ServicePort::Http => 80,
            ServicePort::Pop3 => 110,
            ServicePort::Imap => 143,
            ServicePort::Https => 443,
            ServicePort::Rdp => 3389,
        }
    }
}

/// One element of a port set: either a literal number or a service alias.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PortAtom {
    Number(u16),
    Service(ServicePort),
}

impl PortAtom {
    /// Resolves the atom to its numeric port.
    pub const fn resolve(self) -> u16 {
        match self {
            PortAtom::Number(n) => n,
            PortAtom::Service(s) => s.number(),
        }
    }
}

impl fmt::Display for PortAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortAtom::Number(n) => write!(f, "{n}"),
            PortAtom::Service(s) => write!(f, "{s}"),
        }
    }
}

/// Port specification for one side of a rule.
///
/// Constructed exactly once at ingestion and never re-parsed during
/// classification. `Any` matches all ports; the other variants resolve
/// through the fixed service table to a finite numeric set.
///
/// # Examples
///
/// ```
/// use fwlens::core::rule::{PortAtom, PortSpec, ServicePort};
///
/// let any = PortSpec::Any;
/// assert!(any.numbers().is_none());
///
/// let web = PortSpec::Set(vec![
///     PortAtom::Service(ServicePort::Http),
///     PortAtom::Service(ServicePort::Https),
/// ]);
/// let resolved = web.numbers().unwrap();
/// assert!(resolved.contains(&80));
/// assert!(resolved.contains(&443));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PortSpec {
    /// Matches every port
    Any,
    /// A single numeric port
    One(u16),
    /// A single named service alias
    Service(ServicePort),
    /// A set of numbers and/or aliases
    Set(Vec<PortAtom>),
}

impl PortSpec {
    /// Resolves the specification to its numeric port set.
    ///
    /// Returns `None` for `Any` (the unbounded set).
    pub fn numbers(&self) -> Option<BTreeSet<u16>> {
        match self {
            PortSpec::Any => None,
            PortSpec::One(n) => Some(BTreeSet::from([*n])),
            PortSpec::Service(s) => Some(BTreeSet::from([s.number()])),
            PortSpec::Set(atoms) => Some(atoms.iter().map(|a| a.resolve()).collect()),
        }
    }

    /// Returns `true` if a concrete port satisfies this specification.
    pub fn admits(&self, port: u16) -> bool {
        match self {
            PortSpec::Any => true,
            PortSpec::One(n) => *n == port,
            PortSpec::Service(s) => s.number() == port,
            PortSpec::Set(atoms) => atoms.iter().any(|a| a.resolve() == port),
        }
    }

    /// Parses a textual port specification for the given rule position/field.
    ///
    /// Accepted forms: `ANY`, a number, a service alias, or a braced
    /// comma-separated set such as `{HTTP,HTTPS}` or `{80,8080}`.
    pub fn parse(text: &str, position: usize, field: Field) -> Result<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("any") || text == "*" {
            return Ok(PortSpec::Any);
        }

        if let Some(inner) = text.strip_prefix('{') {
            let Some(inner) = inner.strip_suffix('}') else {
                return Err(Error::validation(
                    position,
                    field,
                    format!("unclosed port set '{text}'"),
                ));
            };
            let mut atoms = Vec::new();
            for part in inner.split(',') {
                atoms.push(parse_port_atom(part, position, field)?);
            }
            if atoms.is_empty() {
                return Err(Error::validation(position, field, "empty port set"));
            }
            return Ok(PortSpec::Set(atoms));
        }

        match parse_port_atom(text, position, field)? {
            PortAtom::Number(n) => Ok(PortSpec::One(n)),
            PortAtom::Service(s) => Ok(PortSpec::Service(s)),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpec::Any => write!(f, "ANY"),
            PortSpec::One(n) => write!(f, "{n}"),
            PortSpec::Service(s) => write!(f, "{s}"),
            PortSpec::Set(atoms) => {
                write!(f, "{{")?;
                for (i, atom) in atoms.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{atom}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn parse_port_atom(text: &str, position: usize, field: Field) -> Result<PortAtom> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::validation(position, field, "empty port entry"));
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        let number: u16 = text.parse().map_err(|_| {
            Error::validation(
                position,
                field,
                format!("port '{text}' out of range (1-65535)"),
            )
        })?;
        if number == 0 {
            return Err(Error::validation(
                position,
                field,
                "port must be between 1 and 65535",
            ));
        }
        return Ok(PortAtom::Number(number));
    }

    text.parse::<ServicePort>()
        .map(PortAtom::Service)
        .map_err(|_| {
            Error::validation(
                position,
                field,
                format!("unknown service alias '{text}'"),
            )
        })
}

/// The six textual fields of one rule record, as supplied by the ingestion
/// layer before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub protocol: String,
    pub src: String,
    pub s_port: String,
    pub dst: String,
    pub d_port: String,
    pub action: String,
}

/// A single firewall filtering rule.
///
/// A rule denotes the set of packets satisfying every field simultaneously
/// (conjunction). Values are immutable once constructed; re-analysis after
/// any edit builds fresh rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    /// Stable identity, preserved across reorders
    pub id: Uuid,
    /// Index in the ordered list; doubles as matching priority
    pub position: usize,
    pub protocol: Protocol,
    /// Source network block; a single host is a /32 (or /128) block
    pub src: IpNetwork,
    pub s_port: PortSpec,
    /// Destination network block
    pub dst: IpNetwork,
    pub d_port: PortSpec,
    pub action: Action,
}

impl Rule {
    /// Creates a rule from already-typed fields, assigning a fresh id.
    pub fn new(
        position: usize,
        protocol: Protocol,
        src: IpNetwork,
        s_port: PortSpec,
        dst: IpNetwork,
        d_port: PortSpec,
        action: Action,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            protocol,
            src,
            s_port,
            dst,
            d_port,
            action,
        }
    }

    /// Validates a raw record and constructs the rule at the given position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the position and field for a
    /// malformed CIDR, unknown protocol token, unknown port alias, malformed
    /// port number or set, or unrecognized action.
    ///
    /// # Examples
    ///
    /// ```
    /// use fwlens::core::rule::{Action, Protocol, RawRecord, Rule};
    ///
    /// let record = RawRecord {
    ///     protocol: "tcp".into(),
    ///     src: "140.192.37.20".into(),
    ///     s_port: "ANY".into(),
    ///     dst: "0.0.0.0/0".into(),
    ///     d_port: "HTTP".into(),
    ///     action: "deny".into(),
    /// };
    /// let rule = Rule::from_record(0, &record).unwrap();
    /// assert_eq!(rule.protocol, Protocol::Tcp);
    /// assert_eq!(rule.action, Action::Deny);
    /// assert_eq!(rule.src.prefix(), 32); // single host normalized to /32
    /// ```
    pub fn from_record(position: usize, record: &RawRecord) -> Result<Self> {
        let protocol = record.protocol.trim().parse::<Protocol>().map_err(|_| {
            Error::validation(
                position,
                Field::Protocol,
                format!("unknown protocol '{}'", record.protocol.trim()),
            )
        })?;

        let src = parse_network(&record.src, position, Field::Src)?;
        let dst = parse_network(&record.dst, position, Field::Dst)?;
        let s_port = PortSpec::parse(&record.s_port, position, Field::SPort)?;
        let d_port = PortSpec::parse(&record.d_port, position, Field::DPort)?;

        let action = record.action.trim().parse::<Action>().map_err(|_| {
            Error::validation(
                position,
                Field::Action,
                format!("unrecognized action '{}'", record.action.trim()),
            )
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            position,
            protocol,
            src,
            s_port,
            dst,
            d_port,
            action,
        })
    }

    /// Returns the rule's six fields as a textual record (id and position
    /// are derived bookkeeping, not part of the record).
    pub fn to_record(&self) -> RawRecord {
        RawRecord {
            protocol: self.protocol.to_string(),
            src: self.src.to_string(),
            s_port: self.s_port.to_string(),
            dst: self.dst.to_string(),
            d_port: self.d_port.to_string(),
            action: self.action.to_string(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.protocol, self.src, self.s_port, self.dst, self.d_port, self.action
        )
    }
}

fn parse_network(text: &str, position: usize, field: Field) -> Result<IpNetwork> {
    text.trim().parse::<IpNetwork>().map_err(|e| {
        Error::validation(
            position,
            field,
            format!("malformed CIDR '{}': {e}", text.trim()),
        )
    })
}

/// A single concrete packet, used for first-match simulation.
///
/// Ports are `None` for protocols that carry none (e.g. ICMP); an
/// unspecified port satisfies only a rule's `ANY` specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Packet {
    pub protocol: Protocol,
    pub src: IpAddr,
    pub s_port: Option<u16>,
    pub dst: IpAddr,
    pub d_port: Option<u16>,
}

impl Packet {
    /// Parses a packet from its 5-field textual form:
    /// `protocol,src_ip,s_port,dst_ip,d_port` with `ANY` for an unspecified
    /// port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Packet`] for a malformed field or field count.
    pub fn parse(text: &str) -> Result<Self> {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(Error::Packet(format!(
                "expected 5 fields (protocol,src,s_port,dst,d_port), found {}",
                fields.len()
            )));
        }

        let protocol = fields[0]
            .parse::<Protocol>()
            .map_err(|_| Error::Packet(format!("unknown protocol '{}'", fields[0])))?;
        let src = fields[1]
            .parse::<IpAddr>()
            .map_err(|e| Error::Packet(format!("bad source address '{}': {e}", fields[1])))?;
        let s_port = parse_packet_port(fields[2])?;
        let dst = fields[3]
            .parse::<IpAddr>()
            .map_err(|e| Error::Packet(format!("bad destination address '{}': {e}", fields[3])))?;
        let d_port = parse_packet_port(fields[4])?;

        Ok(Self {
            protocol,
            src,
            s_port,
            dst,
            d_port,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_port = |p: Option<u16>| p.map_or_else(|| "ANY".to_string(), |n| n.to_string());
        write!(
            f,
            "{},{},{},{},{}",
            self.protocol,
            self.src,
            fmt_port(self.s_port),
            self.dst,
            fmt_port(self.d_port)
        )
    }
}

fn parse_packet_port(text: &str) -> Result<Option<u16>> {
    if text.eq_ignore_ascii_case("any") || text == "*" {
        return Ok(None);
    }
    let port: u16 = text
        .parse()
        .map_err(|_| Error::Packet(format!("bad port '{text}'")))?;
    if port == 0 {
        return Err(Error::Packet("port must be between 1 and 65535".into()));
    }
    Ok(Some(port))
}
