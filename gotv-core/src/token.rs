//! Parses `s<steam-id>t<unix-seconds>` tokens for administrative tooling.
//!
//! The engine itself never parses tokens; it treats them as opaque primary
//! keys. This is exposed only for the admin `/admin/tokens/:token/parse` route.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^s([0-9]{17,})t([0-9]{10,})$").unwrap());

/// A token's two components: the Steam ID and the broadcast's Unix-second
/// signup timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken {
    pub steam_id: String,
    pub timestamp: i64,
}

/// Splits a token of the form `s845489096165654t8799308478907` into its
/// Steam ID and timestamp. Returns `InvalidToken` if the token doesn't match
/// `^s[0-9]{17,}t[0-9]{10,}$`.
pub fn parse_token(token: &str) -> Result<ParsedToken, EngineError> {
    let captures = TOKEN_RE
        .captures(token)
        .ok_or_else(|| EngineError::InvalidToken(token.to_string()))?;
    let steam_id = captures[1].to_string();
    let timestamp = captures[2]
        .parse::<i64>()
        .map_err(|_| EngineError::InvalidToken(token.to_string()))?;
    Ok(ParsedToken {
        steam_id,
        timestamp,
    })
}
