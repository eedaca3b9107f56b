//! qsub command-line tokenizer.
//!
//! qsub options are single-dash words (`-N`, `-hold_jid`, `-tc`), so they
//! cannot be described to clap directly. The registry already knows every
//! option and how many values it takes, so parsing is driven from there.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

use super::options::{OptionValue, ParsedArgs, ValueKind};
use super::registry::{self, OptionSpec};

/// `[[CC]YY]MMDDhhmm[.SS]`
static DATETIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{8}|\d{10}|\d{12})(?:\.(\d{2}))?$").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unknown qsub option \"{0}\"")]
    UnknownOption(String),

    #[error("qsub option \"{0}\" requires a value")]
    MissingValue(String),

    #[error("Invalid value \"{value}\" for qsub option \"{option}\": {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },
}

/// Parses qsub arguments into [`ParsedArgs`].
pub struct QsubParser {
    today: NaiveDate,
}

impl Default for QsubParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QsubParser {
    pub fn new() -> Self {
        Self::with_today(Local::now().date_naive())
    }

    /// Uses `today` to complete dates that omit the year.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn parse<I, S>(&self, tokens: I) -> Result<ParsedArgs, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = tokens.into_iter().map(Into::<String>::into);
        let mut parsed = ParsedArgs::new();

        while let Some(token) = tokens.next() {
            if !is_option(&token) {
                parsed.command.push(token);
                parsed.command.extend(tokens.by_ref());
                break;
            }

            let spec = registry::lookup(&token[1..])
                .ok_or_else(|| ParseError::UnknownOption(token.clone()))?;
            self.parse_value(spec, &token, &mut tokens, &mut parsed)?;
        }

        log::debug!("Parsed qsub command: {:?}", parsed.command);
        Ok(parsed)
    }

    fn parse_value(
        &self,
        spec: &'static OptionSpec,
        token: &str,
        tokens: &mut impl Iterator<Item = String>,
        parsed: &mut ParsedArgs,
    ) -> Result<(), ParseError> {
        match spec.kind {
            ValueKind::Flag => parsed.set(spec.name, OptionValue::Flag(true)),
            ValueKind::YesNo => {
                let value = next_value(tokens, token)?;
                parsed.set(spec.name, OptionValue::Flag(parse_yes_no(token, &value)?));
            }
            ValueKind::Scalar => {
                let value = next_value(tokens, token)?;
                parsed.set(spec.name, OptionValue::Scalar(value));
            }
            ValueKind::List => {
                let value = next_value(tokens, token)?;
                parsed.append(spec.name, split_list(&value));
            }
            ValueKind::Values(count) => {
                let values = (0..count)
                    .map(|_| next_value(tokens, token))
                    .collect::<Result<Vec<_>, _>>()?;
                parsed.set(spec.name, OptionValue::List(values));
            }
            ValueKind::DateTime => {
                let value = next_value(tokens, token)?;
                let datetime = self.parse_datetime(token, &value)?;
                parsed.set(spec.name, OptionValue::DateTime(datetime));
            }
        }
        Ok(())
    }

    /// Parses `[[CC]YY]MMDDhhmm[.SS]`. Two-digit years follow the POSIX
    /// `touch` convention: 69-99 are 19xx, 00-68 are 20xx.
    pub fn parse_datetime(&self, option: &str, value: &str) -> Result<NaiveDateTime, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let captures = DATETIME_PATTERN
            .captures(value)
            .ok_or_else(|| invalid("expected [[CC]YY]MMDDhhmm[.SS]"))?;

        let digits = &captures[1];
        let field = |index: usize| -> u32 {
            digits[index..index + 2]
                .parse()
                .expect("pattern only matches digits")
        };

        let (year, rest) = match digits.len() {
            12 => ((field(0) * 100 + field(2)) as i32, 4),
            10 => {
                let year = field(0) as i32;
                (if year >= 69 { 1900 + year } else { 2000 + year }, 2)
            }
            _ => (self.today.year(), 0),
        };
        let seconds = match captures.get(2) {
            Some(seconds) => seconds.as_str().parse().expect("pattern only matches digits"),
            None => 0,
        };

        NaiveDate::from_ymd_opt(year, field(rest), field(rest + 2))
            .and_then(|date| date.and_hms_opt(field(rest + 4), field(rest + 6), seconds))
            .ok_or_else(|| invalid("no such date or time"))
    }
}

fn is_option(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn next_value(
    tokens: &mut impl Iterator<Item = String>,
    option: &str,
) -> Result<String, ParseError> {
    tokens
        .next()
        .ok_or_else(|| ParseError::MissingValue(option.to_string()))
}

fn parse_yes_no(option: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => Err(ParseError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            reason: "expected y[es] or n[o]".to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
