//! Connection URL module
//!
//! Builds the `mongodb://host:port/database` URL the adapter connects with,
//! and parses existing MongoDB URLs back into an [`AdapterConfig`].

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::engine::config::{AdapterConfig, AuthConfig};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const SCHEME: &str = "mongodb";

/// Characters left unescaped in userinfo components.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub code: ParseErrorCode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorCode {
    InvalidUrl,
    UnsupportedScheme,
    MissingHost,
    InvalidUtf8,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(code: ParseErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result type for URL parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

// =============================================================================
// Building
// =============================================================================

/// Host from options, or `localhost` when absent or empty
pub fn get_host(host: Option<&str>) -> &str {
    host.filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST)
}

/// Port from options, or `27017` when absent or zero
pub fn get_port(port: Option<u16>) -> u16 {
    port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT)
}

/// `user[:password]` when credentials are configured
pub fn get_auth(auth: Option<&AuthConfig>) -> Option<String> {
    let auth = auth?;
    let password = auth
        .password
        .as_ref()
        .map(|p| p.expose().as_str())
        .filter(|p| !p.is_empty());

    Some(match password {
        Some(password) => format!("{}:{}", auth.user, password),
        None => auth.user.clone(),
    })
}

/// Base connection URL, `mongodb://<host>:<port>`.
///
/// Credentials are never part of this URL; see [`build_database_url`].
pub fn build_connection_url(config: &AdapterConfig) -> String {
    format!(
        "{}://{}:{}",
        SCHEME,
        format_host(get_host(config.host.as_deref())),
        get_port(config.port)
    )
}

/// Full URL the adapter connects with: base URL, database path and options.
///
/// When `embed_credentials` is set, the `auth` section is percent-encoded
/// into the authority. Otherwise the credentials are left out, and a warning
/// is logged if some were configured.
pub fn build_database_url(config: &AdapterConfig, database: &str) -> String {
    let host = format_host(get_host(config.host.as_deref()));
    let port = get_port(config.port);

    let credentials = match (config.embed_credentials, config.auth.as_ref()) {
        (true, Some(auth)) => encode_credentials(auth),
        (false, Some(_)) => {
            tracing::warn!("Credentials are configured but not embedded in the connection URL");
            String::new()
        }
        _ => String::new(),
    };

    let mut url = format!(
        "{}://{}{}:{}/{}",
        SCHEME,
        credentials,
        host,
        port,
        utf8_percent_encode(database, USERINFO)
    );

    let query = encode_options(&config.options);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    url
}

fn encode_credentials(auth: &AuthConfig) -> String {
    let user = utf8_percent_encode(&auth.user, USERINFO).to_string();
    match auth
        .password
        .as_ref()
        .map(|p| p.expose().as_str())
        .filter(|p| !p.is_empty())
    {
        Some(password) => format!("{}:{}@", user, utf8_percent_encode(password, USERINFO)),
        None => format!("{}@", user),
    }
}

fn encode_options(options: &BTreeMap<String, String>) -> String {
    options
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, USERINFO),
                utf8_percent_encode(value, USERINFO)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// IPv6 literals need brackets inside an authority
fn format_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a `mongodb://` URL into adapter configuration
pub fn parse_connection_url(url_str: &str) -> ParseResult<AdapterConfig> {
    let url = Url::parse(url_str).map_err(|e| {
        ParseError::new(ParseErrorCode::InvalidUrl, format!("Invalid URL: {}", e))
    })?;

    if !url.scheme().eq_ignore_ascii_case(SCHEME) {
        return Err(ParseError::new(
            ParseErrorCode::UnsupportedScheme,
            format!(
                "Unsupported URL scheme '{}'. Supported schemes: mongodb",
                url.scheme()
            ),
        ));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .ok_or_else(|| {
            ParseError::new(ParseErrorCode::MissingHost, "MongoDB URL must specify a host")
        })?;

    let auth = if url.username().is_empty() {
        None
    } else {
        let user = percent_decode(url.username()).map_err(|_| {
            ParseError::new(ParseErrorCode::InvalidUtf8, "Invalid username encoding")
        })?;
        let password = url
            .password()
            .map(percent_decode)
            .transpose()
            .map_err(|_| {
                ParseError::new(ParseErrorCode::InvalidUtf8, "Invalid password encoding")
            })?;
        Some(AuthConfig::new(user, password))
    };

    let database = url
        .path()
        .strip_prefix('/')
        .filter(|db| !db.is_empty())
        .map(|db| {
            percent_decode(db).map_err(|_| {
                ParseError::new(ParseErrorCode::InvalidUtf8, "Invalid database name encoding")
            })
        })
        .transpose()?;

    let options = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    Ok(AdapterConfig {
        host: Some(host),
        port: Some(url.port().unwrap_or(DEFAULT_PORT)),
        embed_credentials: auth.is_some(),
        auth,
        database,
        options,
    })
}

/// URL percent-decode a string
fn percent_decode(s: &str) -> Result<String, std::str::Utf8Error> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
}
