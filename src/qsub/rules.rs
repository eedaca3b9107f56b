//! Custom translation rules for options whose mapping is more than a rename.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use super::mapper::{MailEventSet, MapperError, Mapping};
use super::options::OptionValue;
use super::registry::PathRole;

/// qsub `-m` codes and the slurm mail events they enable. `n` is handled
/// separately since it disables mail rather than adding an event.
const MAIL_EVENTS: &[(char, &[&str])] = &[
    ('b', &["BEGIN"]),
    ('e', &["END"]),
    ('a', &["FAIL", "REQUEUE"]),
];

/// UGE pseudo environment variables and their sbatch filename patterns.
const PATH_PLACEHOLDERS: &[(&str, &str)] = &[
    ("$USER", "%u"),
    ("$JOB_ID", "%j"),
    ("$JOB_NAME", "%x"),
    ("$HOSTNAME", "%N"),
    ("$TASK_ID", "%a"),
];

const ISO_8601: &str = "%Y-%m-%dT%H:%M:%S";

fn expect_list<'v>(
    option: &'static str,
    value: &'v OptionValue,
) -> Result<&'v [String], MapperError> {
    match value {
        OptionValue::List(values) => Ok(values),
        _ => Err(MapperError::UnexpectedValue(option)),
    }
}

fn expect_datetime(
    option: &'static str,
    value: &OptionValue,
) -> Result<NaiveDateTime, MapperError> {
    match value {
        OptionValue::DateTime(datetime) => Ok(*datetime),
        _ => Err(MapperError::UnexpectedValue(option)),
    }
}

fn expect_flag(option: &'static str, value: &OptionValue) -> Result<bool, MapperError> {
    match value {
        OptionValue::Flag(flag) => Ok(*flag),
        _ => Err(MapperError::UnexpectedValue(option)),
    }
}

/// `-a` becomes `--begin`.
pub fn begin_time(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let datetime = expect_datetime(option, value)?;
    mapping
        .target
        .push_option("--begin", datetime.format(ISO_8601).to_string())
}

/// `-dl` becomes `--deadline`.
pub fn deadline(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let datetime = expect_datetime(option, value)?;
    mapping
        .target
        .push_option("--deadline", datetime.format(ISO_8601).to_string())
}

pub fn requeue(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    if expect_flag(option, value)? {
        mapping.target.push_flag("--requeue")
    } else {
        mapping.target.push_flag("--no-requeue")
    }
}

pub fn current_dir(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    if !expect_flag(option, value)? {
        return Ok(());
    }
    let working_dir = mapping.working_dir().to_string_lossy().into_owned();
    mapping.target.push_option("--chdir", working_dir)
}

pub fn binary(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    if expect_flag(option, value)? {
        mapping.warn(format!(
            "\"-{} y\" is not translated; the command is submitted as a batch script.",
            option
        ));
    }
    Ok(())
}

/// `-m` trigger codes become one `--mail-type` list.
pub fn mail_type(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let codes = expect_list(option, value)?;

    let mut events = MailEventSet::default();
    for code in codes.iter().flat_map(|codes| codes.chars()) {
        if code == 'n' {
            continue;
        }
        match MAIL_EVENTS.iter().find(|(known, _)| *known == code) {
            Some((_, keywords)) => events.extend(keywords),
            None => mapping.warn(format!(
                "Unknown mail type \"{}\" for \"-{}\" was ignored.",
                code, option
            )),
        }
    }

    if events.is_empty() {
        return Ok(());
    }
    mapping.target.push_option("--mail-type", events.join(","))
}

pub fn mail_user(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let users = expect_list(option, value)?;
    let Some(user) = users.first() else {
        return Ok(());
    };

    if users.len() > 1 {
        mapping.warn(format!(
            "setting multiple users for \"-{}\" option is not supported. use first one: {}",
            option, user
        ));
    }
    mapping.target.push_option("--mail-user", user)
}

/// `-q queue@host` becomes `--nodelist host`. Slurm has no hostgroups, so
/// `queue@@group` and bare queue names are dropped.
pub fn queue(
    mapping: &mut Mapping,
    option: &'static str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let queues = expect_list(option, value)?;

    let mut hosts = Vec::new();
    for queue in queues {
        match queue.split_once('@') {
            Some((_, host)) if !host.is_empty() && !host.starts_with('@') => hosts.push(host),
            _ => mapping.error(format!(
                "Queue specification at \"-{}\" option requires host name: {}",
                option, queue
            )),
        }
    }

    if hosts.is_empty() {
        return Ok(());
    }
    mapping.target.push_option("--nodelist", hosts.join(","))
}

/// Rewrites `-i`, `-o` and `-e` paths.
pub fn map_path(
    mapping: &mut Mapping,
    option: &'static str,
    target_flag: &'static str,
    role: PathRole,
    stream: &str,
    value: &OptionValue,
) -> Result<(), MapperError> {
    let paths = expect_list(option, value)?;
    let Some(first) = paths.first() else {
        mapping.warn(format!("empty path for \"-{}\" option was ignored.", option));
        return Ok(());
    };

    if paths.len() > 1 {
        mapping.warn(format!(
            "setting multiple paths for \"-{}\" option is not supported. use first one: {} (ignored: {})",
            option,
            first,
            paths[1..].join(", ")
        ));
    }

    let path = strip_host(mapping, option, first);
    let path = match role {
        PathRole::Input => path,
        PathRole::Output => resolve_output_path(mapping, option, stream, path)?,
    };

    mapping.target.push_option(target_flag, path)
}

/// Drops the `host:` qualifier from a `[[host]:]path` value.
fn strip_host(mapping: &mut Mapping, option: &str, path: &str) -> String {
    if path.starts_with(':') {
        return path.trim_start_matches(':').to_string();
    }

    match path.split_once(':') {
        Some((_, path)) => {
            mapping.warn(format!(
                "\"hostname\" specification in \"-{}\" option is not supported.",
                option
            ));
            path.to_string()
        }
        None => path.to_string(),
    }
}

fn resolve_output_path(
    mapping: &mut Mapping,
    option: &str,
    stream: &str,
    path: String,
) -> Result<String, MapperError> {
    let on_disk = mapping.working_dir().join(&path);

    if on_disk.is_dir() {
        return Ok(join(&path, &mapping.default_filename(stream)));
    }

    if on_disk.is_file() {
        mapping.warn(format!(
            "output file specified by \"-{}\" will be overwritten.",
            option
        ));
        return Ok(path);
    }

    let (dirname, filename) = split_path(&path);
    if !dirname.is_empty() {
        let on_disk = mapping.working_dir().join(dirname);
        if !on_disk.exists() {
            log::debug!("Creating output directory {:?}", on_disk);
            fs::create_dir_all(&on_disk).map_err(|source| MapperError::CreateDirectory {
                path: on_disk.clone(),
                source,
            })?;
        }
    }

    // A trailing slash names a directory that did not exist yet.
    if filename.is_empty() {
        return Ok(join(dirname, &mapping.default_filename(stream)));
    }

    Ok(join(dirname, &rewrite_placeholders(filename)))
}

/// Converts UGE path variables to sbatch filename patterns, escaping any
/// literal `%` first.
pub fn rewrite_placeholders(filename: &str) -> String {
    let mut filename = filename.replace('%', "%%");
    for (variable, pattern) in PATH_PLACEHOLDERS {
        filename = filename.replace(variable, pattern);
    }
    filename
}

/// Splits after the last `/`. The directory keeps its trailing separators
/// as written.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(index) => path.split_at(index + 1),
        None => ("", path),
    }
}

fn join(dirname: &str, filename: &str) -> String {
    if dirname.is_empty() {
        filename.to_string()
    } else if dirname.ends_with('/') {
        format!("{}{}", dirname, filename)
    } else {
        Path::new(dirname).join(filename).to_string_lossy().into_owned()
    }
}
