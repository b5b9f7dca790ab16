//! Validation utilities and regex patterns

use regex::Regex;
use std::sync::LazyLock;
use validator::ValidationError;

/// Regex pattern for validating hex color codes (e.g., #FFFFFF, #FF0000)
pub static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid hex color regex pattern")
});

/// Driver-style DSN: `user:pass@tcp(host:port)/db?params`
pub static TCP_DSN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<user>[^:@/]*)(?::(?P<pass>.*))?@tcp\((?P<host>[^:()]+)(?::(?P<port>\d+))?\)/(?P<db>[^?]*)(?:\?.*)?$",
    )
    .expect("Invalid DSN regex pattern")
});

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Validate a log filter: a bare level or comma separated `target=level` directives
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = !level.trim().is_empty()
        && level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or_default().trim();
            LEVELS.contains(&level.to_ascii_lowercase().as_str())
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Validate the export field separator
pub fn validate_delimiter(delimiter: &str) -> Result<(), ValidationError> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && !matches!(c, ',' | '"' | '\r' | '\n') => Ok(()),
        (Some(_), None) => Err(ValidationError::new("reserved_delimiter")),
        _ => Err(ValidationError::new("delimiter_not_single_char")),
    }
}

/// Validate a database DSN in URL or driver form
pub fn validate_database_url(dsn: &str) -> Result<(), ValidationError> {
    if dsn.trim().is_empty() {
        return Err(ValidationError::new("empty_database_url"));
    }
    if TCP_DSN_REGEX.is_match(dsn) {
        return Ok(());
    }
    match url::Url::parse(dsn) {
        Ok(url) if url.scheme() == "mysql" => Ok(()),
        Ok(_) => Err(ValidationError::new("unsupported_database_scheme")),
        Err(_) => Err(ValidationError::new("invalid_database_url")),
    }
}

/// Validate every palette entry as a hex color
pub fn validate_palette(palette: &[String]) -> Result<(), ValidationError> {
    if palette.is_empty() {
        return Err(ValidationError::new("empty_palette"));
    }
    if palette.iter().all(|color| HEX_COLOR_REGEX.is_match(color)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_palette_color"))
    }
}
