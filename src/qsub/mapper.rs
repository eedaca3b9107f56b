//! Command mapper: turns parsed qsub options into an sbatch argument list.
//!
//! Translation runs as a fixed pipeline over a single [`Mapping`]
//! accumulator:
//!
//! 1. [`normalize`] resolves option interactions on a copy of the input
//!    (`-j y` drops `-e`, `-wd` drops `-cwd`).
//! 2. Generic dispatch applies each registry rule in registry order.
//!    Deferred rules emit nothing here.
//! 3. Post-pass steps, in order: dependencies, default output paths, array
//!    spec, environment export. Each only appends flags that no generic
//!    rule emits.
//! 4. The job command is appended last, since sbatch stops parsing options
//!    at the first non-option token.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::options::ParsedArgs;
use super::registry::{self, REGISTRY};

/// Fatal translation failures. No sbatch command is run after one of these.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("\"{0}\" option is not supported by slurm")]
    NotSupported(&'static str),

    #[error(
        "Currently, only job ID is supported for job dependency specification (got \"{0}\")"
    )]
    NonNumericDependency(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Target option \"{0}\" would be emitted more than once")]
    DuplicateFlag(&'static str),

    #[error("No translation rule is registered for \"-{0}\"")]
    Unregistered(String),

    #[error("Unexpected value for \"-{0}\"")]
    UnexpectedValue(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal message produced during translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Ordered sbatch arguments. Each target flag may appear at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    args: Vec<String>,
    flags: HashSet<&'static str>,
}

impl TargetArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a flag that takes no value.
    pub fn push_flag(&mut self, flag: &'static str) -> Result<(), MapperError> {
        self.claim(flag)?;
        self.args.push(flag.to_string());
        Ok(())
    }

    /// Appends `flag value`.
    pub fn push_option(
        &mut self,
        flag: &'static str,
        value: impl Into<String>,
    ) -> Result<(), MapperError> {
        self.claim(flag)?;
        self.args.push(flag.to_string());
        self.args.push(value.into());
        Ok(())
    }

    /// Appends the job command verbatim.
    pub fn push_command(&mut self, command: &[String]) {
        self.args.extend(command.iter().cloned());
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<String> {
        self.args
    }

    fn claim(&mut self, flag: &'static str) -> Result<(), MapperError> {
        if self.flags.insert(flag) {
            Ok(())
        } else {
            Err(MapperError::DuplicateFlag(flag))
        }
    }
}

/// Slurm mail event keywords, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailEventSet {
    events: Vec<&'static str>,
}

impl MailEventSet {
    pub fn insert(&mut self, event: &'static str) -> bool {
        if self.events.contains(&event) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn extend(&mut self, events: &[&'static str]) {
        for event in events {
            self.insert(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.events.join(separator)
    }
}

/// Mutable state shared by every rule during one translation.
#[derive(Debug)]
pub struct Mapping {
    pub target: TargetArgs,
    pub diagnostics: Vec<Diagnostic>,
    working_dir: PathBuf,
    array: bool,
}

impl Mapping {
    fn new(working_dir: &Path, array: bool) -> Self {
        Self {
            target: TargetArgs::new(),
            diagnostics: Vec::new(),
            working_dir: working_dir.to_path_buf(),
            array,
        }
    }

    /// Directory relative paths are resolved against.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Default sbatch file name for a stream (`o` or `e`).
    pub fn default_filename(&self, stream: &str) -> String {
        let mut filename = format!("%x.{}%j", stream);
        if self.array {
            filename.push_str(".%a");
        }
        filename
    }

    pub fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn error(&mut self, message: String) {
        log::error!("{}", message);
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }
}

/// Result of a successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// sbatch arguments, without the binary name.
    pub args: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Translation {
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.messages(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages(Severity::Error)
    }

    fn messages(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.severity == severity)
            .map(|diagnostic| diagnostic.message.as_str())
    }
}

/// Resolves cross-option interactions, returning a corrected copy.
pub fn normalize(args: &ParsedArgs) -> ParsedArgs {
    let mut normalized = args.clone();

    // sbatch merges stderr into --output when --error is absent.
    if normalized.is_set("j") && normalized.unset("e").is_some() {
        log::debug!("-j y given, ignoring -e");
    }

    if normalized.contains("wd") && normalized.unset("cwd").is_some() {
        log::debug!("-wd given, ignoring -cwd");
    }

    normalized
}

/// Translates qsub options into sbatch arguments.
pub struct CommandMapper {
    working_dir: PathBuf,
}

impl CommandMapper {
    /// Creates a mapper resolving relative paths and `-cwd` against
    /// `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn translate(&self, args: &ParsedArgs) -> Result<Translation, MapperError> {
        let args = normalize(args);
        let mut mapping = Mapping::new(&self.working_dir, args.contains("t"));

        Self::dispatch(&args, &mut mapping)?;

        Self::map_dependency(&args, &mut mapping)?;
        Self::prepare_output_path(&args, &mut mapping)?;
        Self::map_array(&args, &mut mapping)?;
        Self::map_environment(&args, &mut mapping)?;

        mapping.target.push_command(&args.command);

        Ok(Translation {
            args: mapping.target.into_vec(),
            diagnostics: mapping.diagnostics,
        })
    }

    /// Applies each present option's rule in registry order. Deferred rules
    /// emit nothing here.
    fn dispatch(args: &ParsedArgs, mapping: &mut Mapping) -> Result<(), MapperError> {
        if let Some(name) = args.names().find(|name| registry::lookup(name).is_none()) {
            return Err(MapperError::Unregistered(name.to_string()));
        }

        for spec in REGISTRY {
            if let Some(value) = args.get(spec.name) {
                spec.rule.apply(mapping, spec.name, value)?;
            }
        }

        Ok(())
    }

    /// `-hold_jid` and `-hold_jid_ad` become one `--dependency` argument.
    fn map_dependency(args: &ParsedArgs, mapping: &mut Mapping) -> Result<(), MapperError> {
        let plain = Self::dependency_ids(args, "hold_jid", mapping)?;
        let corresponding = Self::dependency_ids(args, "hold_jid_ad", mapping)?;

        let mut dependencies = Vec::new();
        if !plain.is_empty() {
            dependencies.push(format!("afterok:{}", plain.join(":")));
        }
        if !corresponding.is_empty() {
            dependencies.push(format!("aftercorr:{}", corresponding.join(":")));
        }

        if dependencies.is_empty() {
            return Ok(());
        }
        mapping
            .target
            .push_option("--dependency", dependencies.join(","))
    }

    fn dependency_ids<'a>(
        args: &'a ParsedArgs,
        option: &str,
        mapping: &mut Mapping,
    ) -> Result<Vec<&'a str>, MapperError> {
        let ids = args.list(option).unwrap_or_default();

        // TODO: look up job names with squeue so -hold_jid can name jobs.
        if let Some(name) = ids.iter().find(|id| !is_job_id(id)) {
            mapping.error(format!(
                "Currently, only job ID is supported for job dependency specification (\"-{}\" got \"{}\").",
                option, name
            ));
            return Err(MapperError::NonNumericDependency(name.clone()));
        }

        Ok(ids.iter().map(String::as_str).collect())
    }

    /// Fills in `--output` / `--error` with the qsub-style default names.
    fn prepare_output_path(args: &ParsedArgs, mapping: &mut Mapping) -> Result<(), MapperError> {
        if !has_path(args, "o") {
            let filename = mapping.default_filename("o");
            mapping.target.push_option("--output", filename)?;
        }

        if !args.is_set("j") && !has_path(args, "e") {
            let filename = mapping.default_filename("e");
            mapping.target.push_option("--error", filename)?;
        }

        Ok(())
    }

    /// `-t 1-10 -tc 5` becomes `--array 1-10%5`.
    fn map_array(args: &ParsedArgs, mapping: &mut Mapping) -> Result<(), MapperError> {
        let Some(range) = args.scalar("t") else {
            return Ok(());
        };

        let mut array = range.to_string();
        if let Some(limit) = args.scalar("tc").filter(|limit| !limit.is_empty()) {
            array.push('%');
            array.push_str(limit);
        }

        log::debug!("Array specification: {}", array);
        mapping.target.push_option("--array", array)
    }

    fn map_environment(args: &ParsedArgs, mapping: &mut Mapping) -> Result<(), MapperError> {
        let mut export = Vec::new();
        if args.is_set("V") {
            export.push("ALL".to_string());
        }
        if let Some(variables) = args.list("v") {
            export.extend(variables.iter().cloned());
        }
        if export.is_empty() {
            export.push("NONE".to_string());
        }

        mapping.target.push_option("--export", export.join(","))
    }
}

/// An empty path list (`-o ""`) does not count as an explicit path.
fn has_path(args: &ParsedArgs, option: &str) -> bool {
    args.list(option).is_some_and(|paths| !paths.is_empty())
}

fn is_job_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit())
}
