use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub words_path: Option<PathBuf>,
    pub token_secret: Option<String>,
    pub token_max_age: Duration,
    pub max_auto_reply: Duration,
    pub max_page_limit: i64,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("POSTBOARD_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let database_url = read_optional_string("POSTBOARD_DATABASE_URL");
        let db_max_connections = read_number("POSTBOARD_DB_MAX_CONNECTIONS", 5)?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "POSTBOARD_DB_MAX_CONNECTIONS",
                db_max_connections.to_string(),
            ));
        }
        let words_path = read_optional_string("POSTBOARD_WORDS_PATH").map(PathBuf::from);
        let token_secret = read_optional_string("POSTBOARD_TOKEN_SECRET");
        let token_max_age_secs = read_number("POSTBOARD_TOKEN_MAX_AGE_SECS", 7 * 24 * 60 * 60)?;
        let max_auto_reply_secs = read_number("POSTBOARD_MAX_AUTO_REPLY_SECS", 300)?;
        let max_page_limit = read_number("POSTBOARD_MAX_PAGE_LIMIT", 100)?;
        if max_page_limit <= 0 {
            return Err(ConfigError::InvalidValue(
                "POSTBOARD_MAX_PAGE_LIMIT",
                max_page_limit.to_string(),
            ));
        }
        let cors_allow_origins = parse_list(&read_string(
            "POSTBOARD_CORS_ALLOW_ORIGINS",
            "http://localhost:3000",
        ));

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            words_path,
            token_secret,
            token_max_age: Duration::from_secs(token_max_age_secs),
            max_auto_reply: Duration::from_secs(max_auto_reply_secs),
            max_page_limit,
            cors_allow_origins,
        })
    }
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in contents.lines().filter_map(parse_env_line) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match read_optional_string(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, raw)),
        None => Ok(default),
    }
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `KEY=value` lines; `#` comments, an `export ` prefix and matching quotes
/// are accepted. Double quotes understand `\n`, `\t`, `\"` and `\\`.
fn parse_env_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = if let Some(inner) = quoted(value, '"') {
        unescape(inner)
    } else if let Some(inner) = quoted(value, '\'') {
        inner.to_string()
    } else {
        value.to_string()
    };
    Some((key.to_string(), value))
}

fn quoted(value: &str, quote: char) -> Option<&str> {
    value.strip_prefix(quote)?.strip_suffix(quote)
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some(escaped @ ('"' | '\\')) => output.push(escaped),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::{parse_env_line, parse_list};

    #[test]
    fn env_lines_parse() {
        let cases = [
            ("POSTBOARD_HTTP_ADDR=0.0.0.0:80", "0.0.0.0:80"),
            ("export POSTBOARD_TOKEN_SECRET=s3cret", "s3cret"),
            ("POSTBOARD_WORDS_PATH = 'words list.json'", "words list.json"),
            (r#"POSTBOARD_TOKEN_SECRET="a\tb\"c\"""#, "a\tb\"c\""),
        ];
        for (line, expected) in cases {
            let (_, value) = parse_env_line(line).unwrap();
            assert_eq!(value, expected, "{line}");
        }
    }

    #[test]
    fn env_comments_and_blanks_are_skipped() {
        assert!(parse_env_line("# POSTBOARD_HTTP_ADDR=x").is_none());
        assert!(parse_env_line("   ").is_none());
        assert!(parse_env_line("=value").is_none());
        assert!(parse_env_line("no separator").is_none());
    }

    #[test]
    fn parse_list_trims_and_drops_empty() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }
}
