//! Parsed qsub option values.
//!
//! `ParsedArgs` is the structured form of a qsub command line. Every option
//! the parser accepted is stored under its registry name; options that were
//! not given are simply absent, which keeps "not set" distinguishable from
//! an explicit `n` or an empty list.

use std::collections::HashMap;

use chrono::NaiveDateTime;

/// How many tokens an option consumes and how they are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Presence flag, no value (e.g. `-cwd`).
    Flag,
    /// `y[es]` or `n[o]` (e.g. `-j y`).
    YesNo,
    /// Single value; the last occurrence wins.
    Scalar,
    /// Comma-separated values; repeated occurrences append.
    List,
    /// A fixed number of positional values (e.g. `-pe smp 4`).
    Values(usize),
    /// `[[CC]YY]MMDDhhmm[.SS]`
    DateTime,
}

/// Value of a single parsed option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag(bool),
    Scalar(String),
    List(Vec<String>),
    DateTime(NaiveDateTime),
}

/// A fully parsed qsub invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: HashMap<&'static str, OptionValue>,

    /// The job command and its arguments, verbatim.
    pub command: Vec<String>,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: &'static str, value: OptionValue) {
        self.values.insert(name, value);
    }

    pub fn unset(&mut self, name: &str) -> Option<OptionValue> {
        self.values.remove(name)
    }

    /// Appends list items, creating the list on first use.
    pub fn append(&mut self, name: &'static str, items: Vec<String>) {
        match self.values.get_mut(name) {
            Some(OptionValue::List(existing)) => existing.extend(items),
            _ => {
                self.values.insert(name, OptionValue::List(items));
            }
        }
    }

    /// Returns the boolean value of a flag option, `None` when absent.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(OptionValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    /// True only when the flag is present and set.
    pub fn is_set(&self, name: &str) -> bool {
        self.flag(name) == Some(true)
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::Scalar(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name) {
            Some(OptionValue::List(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Names of every option that was given.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}
