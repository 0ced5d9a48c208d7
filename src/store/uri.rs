//! Connection string parsing
//!
//! Accepted forms:
//! - `mongodb://[user:pass@]host[:port][,host...]/database[?options]`
//! - `mongodb+srv://[user:pass@]host/database[?options]`
//! - `memory://[name]`
//!
//! The MongoDB forms must name a database; the daily collections live in it.

use std::fmt;
use std::str::FromStr;

use crate::errors::{QueryError, QueryResult};

const MEMORY_DATABASE: &str = "memory";

/// Connection scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Mongodb,
    MongodbSrv,
    Memory,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Mongodb => "mongodb",
            Scheme::MongodbSrv => "mongodb+srv",
            Scheme::Memory => "memory",
        }
    }
}

/// A parsed connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    scheme: Scheme,
    hosts: Vec<String>,
    database: String,
    credentials: bool,
    raw: String,
}

impl ConnectionString {
    /// Parses a connection string.
    ///
    /// # Errors
    ///
    /// `DAILY_CONFIGURATION` for an unknown scheme, missing host or
    /// missing database.
    pub fn parse(uri: &str) -> QueryResult<Self> {
        let uri = uri.trim();
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| QueryError::configuration(format!("Malformed connection string '{}'", uri)))?;

        let scheme = match scheme {
            "mongodb" => Scheme::Mongodb,
            "mongodb+srv" => Scheme::MongodbSrv,
            "memory" => Scheme::Memory,
            other => {
                return Err(QueryError::configuration(format!(
                    "Unsupported connection scheme '{}'",
                    other
                )))
            }
        };

        let rest = rest.split('?').next().unwrap_or_default();

        if scheme == Scheme::Memory {
            let name = rest.trim_matches('/');
            return Ok(Self {
                scheme,
                hosts: Vec::new(),
                database: if name.is_empty() { MEMORY_DATABASE } else { name }.to_string(),
                credentials: false,
                raw: uri.to_string(),
            });
        }

        let (authority, database) = rest.split_once('/').unwrap_or((rest, ""));
        let (credentials, hosts) = match authority.rsplit_once('@') {
            Some((_, hosts)) => (true, hosts),
            None => (false, authority),
        };

        let hosts: Vec<String> = hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect();
        if hosts.is_empty() {
            return Err(QueryError::configuration(format!(
                "Connection string '{}' names no host",
                redact(uri)
            )));
        }
        if scheme == Scheme::MongodbSrv && hosts.len() > 1 {
            return Err(QueryError::configuration(
                "mongodb+srv connection strings take exactly one host",
            ));
        }

        let database = database.trim_matches('/');
        if database.is_empty() {
            return Err(QueryError::configuration(format!(
                "Connection string '{}' names no database",
                redact(uri)
            )));
        }

        Ok(Self {
            scheme,
            hosts,
            database: database.to_string(),
            credentials,
            raw: uri.to_string(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the string as given, credentials included
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the string with credentials masked, safe for logs
    pub fn redacted(&self) -> String {
        if self.credentials {
            redact(&self.raw)
        } else {
            self.raw.clone()
        }
    }
}

fn redact(uri: &str) -> String {
    match (uri.split_once("://"), uri.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{}://***{}", scheme, &uri[at..]),
        _ => uri.to_string(),
    }
}

impl FromStr for ConnectionString {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}
