//! Option registry: one translation rule per qsub option.
//!
//! The table below is the single source of truth for every option the qsub
//! parser accepts. Its order is the order in which the mapper dispatches
//! options, so related target flags stay grouped on the sbatch command line.

use self::PathRole::{Input, Output};
use self::PostPassStep::{Array, Dependencies, Environment, OutputPaths};
use super::mapper::{MapperError, Mapping};
use super::options::ValueKind::{DateTime, Flag, List, Scalar, Values, YesNo};
use super::options::{OptionValue, ValueKind};
use super::rules;

/// Signature of a custom per-option rule. Receives the option name
/// (without the leading dash) and its parsed value.
pub type CustomRule = fn(&mut Mapping, &'static str, &OptionValue) -> Result<(), MapperError>;

/// Whether a path option names something read by the job or written by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Input,
    Output,
}

/// Mapper steps that own options excluded from generic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostPassStep {
    Dependencies,
    OutputPaths,
    Array,
    Environment,
}

/// How a single qsub option is translated.
#[derive(Debug, Clone, Copy)]
pub enum TranslationRule {
    /// Copy the value after `target_flag`.
    Rename(&'static str),
    /// Emit `target_flag` alone when the option is set.
    ConditionalFlag(&'static str),
    /// Rewrite a `[[host]:]path` list into a single sbatch path.
    PathRewrite {
        target_flag: &'static str,
        role: PathRole,
        stream: &'static str,
    },
    /// Known gap: warn and emit nothing.
    NotImplemented(&'static str),
    /// No sbatch equivalent: fatal.
    NotSupported(&'static str),
    Custom(CustomRule),
    /// Translated only by the named mapper step.
    Deferred(PostPassStep),
}

pub const fn bind_to(target_flag: &'static str) -> TranslationRule {
    TranslationRule::Rename(target_flag)
}

pub const fn bind_if_true(target_flag: &'static str) -> TranslationRule {
    TranslationRule::ConditionalFlag(target_flag)
}

pub const fn not_implemented(source_flag: &'static str) -> TranslationRule {
    TranslationRule::NotImplemented(source_flag)
}

pub const fn not_supported(source_flag: &'static str) -> TranslationRule {
    TranslationRule::NotSupported(source_flag)
}

const fn map_path(
    target_flag: &'static str,
    role: PathRole,
    stream: &'static str,
) -> TranslationRule {
    TranslationRule::PathRewrite {
        target_flag,
        role,
        stream,
    }
}

const fn deferred(step: PostPassStep) -> TranslationRule {
    TranslationRule::Deferred(step)
}

const fn custom(rule: CustomRule) -> TranslationRule {
    TranslationRule::Custom(rule)
}

impl TranslationRule {
    /// Applies the rule to one present option value.
    pub fn apply(
        &self,
        mapping: &mut Mapping,
        option: &'static str,
        value: &OptionValue,
    ) -> Result<(), MapperError> {
        match *self {
            TranslationRule::Rename(target_flag) => match value {
                OptionValue::Scalar(value) => mapping.target.push_option(target_flag, value),
                OptionValue::List(values) => {
                    mapping.target.push_option(target_flag, values.join(","))
                }
                _ => Err(MapperError::UnexpectedValue(option)),
            },
            TranslationRule::ConditionalFlag(target_flag) => match value {
                OptionValue::Flag(true) => mapping.target.push_flag(target_flag),
                OptionValue::Flag(false) => Ok(()),
                _ => Err(MapperError::UnexpectedValue(option)),
            },
            TranslationRule::PathRewrite {
                target_flag,
                role,
                stream,
            } => rules::map_path(mapping, option, target_flag, role, stream, value),
            TranslationRule::NotImplemented(source_flag) => {
                mapping.warn(format!(
                    "\"{}\" option is not implemented yet and was ignored.",
                    source_flag
                ));
                Ok(())
            }
            TranslationRule::NotSupported(source_flag) => {
                mapping.error(format!(
                    "\"{}\" option is not supported by slurm.",
                    source_flag
                ));
                Err(MapperError::NotSupported(source_flag))
            }
            TranslationRule::Custom(rule) => rule(mapping, option, value),
            TranslationRule::Deferred(step) => {
                log::debug!("-{} is translated by the {:?} step", option, step);
                Ok(())
            }
        }
    }
}

/// A registered qsub option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Option name without the leading dash (e.g. `hold_jid`).
    pub name: &'static str,
    pub kind: ValueKind,
    pub rule: TranslationRule,
}

impl OptionSpec {
    const fn new(name: &'static str, kind: ValueKind, rule: TranslationRule) -> Self {
        Self { name, kind, rule }
    }
}

/// Every qsub option, in dispatch order.
pub static REGISTRY: &[OptionSpec] = &[
    // Job identity
    OptionSpec::new("N", Scalar, bind_to("--job-name")),
    OptionSpec::new("A", Scalar, bind_to("--account")),
    OptionSpec::new("P", Scalar, bind_to("--wckey")),
    OptionSpec::new("p", Scalar, bind_to("--nice")),
    OptionSpec::new("ar", Scalar, bind_to("--reservation")),
    // Scheduling
    OptionSpec::new("a", DateTime, custom(rules::begin_time)),
    OptionSpec::new("dl", DateTime, custom(rules::deadline)),
    OptionSpec::new("h", Flag, bind_if_true("--hold")),
    OptionSpec::new("r", YesNo, custom(rules::requeue)),
    OptionSpec::new("terse", Flag, bind_if_true("--parsable")),
    // Working directory and streams
    OptionSpec::new("cwd", Flag, custom(rules::current_dir)),
    OptionSpec::new("wd", Scalar, bind_to("--chdir")),
    OptionSpec::new("i", List, map_path("--input", Input, "i")),
    OptionSpec::new("e", List, map_path("--error", Output, "e")),
    OptionSpec::new("o", List, map_path("--output", Output, "o")),
    // Notification
    OptionSpec::new("m", List, custom(rules::mail_type)),
    OptionSpec::new("M", List, custom(rules::mail_user)),
    // Placement
    OptionSpec::new("q", List, custom(rules::queue)),
    OptionSpec::new("b", YesNo, custom(rules::binary)),
    // Handled by the post-pass
    OptionSpec::new("j", YesNo, deferred(OutputPaths)),
    OptionSpec::new("hold_jid", List, deferred(Dependencies)),
    OptionSpec::new("hold_jid_ad", List, deferred(Dependencies)),
    OptionSpec::new("t", Scalar, deferred(Array)),
    OptionSpec::new("tc", Scalar, deferred(Array)),
    OptionSpec::new("V", Flag, deferred(Environment)),
    OptionSpec::new("v", List, deferred(Environment)),
    // Known gaps
    OptionSpec::new("@", Scalar, not_implemented("-@")),
    OptionSpec::new("ac", List, not_implemented("-ac")),
    OptionSpec::new("adds", Values(3), not_implemented("-adds")),
    OptionSpec::new("binding", Scalar, not_implemented("-binding")),
    OptionSpec::new("c", Scalar, not_implemented("-c")),
    OptionSpec::new("ckpt", Scalar, not_implemented("-ckpt")),
    OptionSpec::new("clear", Flag, not_implemented("-clear")),
    OptionSpec::new("clearp", Scalar, not_implemented("-clearp")),
    OptionSpec::new("clears", Scalar, not_implemented("-clears")),
    OptionSpec::new("C", Scalar, not_implemented("-C")),
    OptionSpec::new("dc", List, not_implemented("-dc")),
    OptionSpec::new("hard", Flag, not_implemented("-hard")),
    OptionSpec::new("jc", Scalar, not_implemented("-jc")),
    OptionSpec::new("js", Scalar, not_implemented("-js")),
    OptionSpec::new("jsv", List, not_implemented("-jsv")),
    OptionSpec::new("l", List, not_implemented("-l")),
    OptionSpec::new("masterl", List, not_implemented("-masterl")),
    OptionSpec::new("masterq", List, not_implemented("-masterq")),
    OptionSpec::new("mbind", Scalar, not_implemented("-mbind")),
    OptionSpec::new("mods", Values(3), not_implemented("-mods")),
    OptionSpec::new("notify", Flag, not_implemented("-notify")),
    OptionSpec::new("now", YesNo, not_implemented("-now")),
    OptionSpec::new("ot", Scalar, not_implemented("-ot")),
    OptionSpec::new("par", Scalar, not_implemented("-par")),
    OptionSpec::new("pe", Values(2), not_implemented("-pe")),
    OptionSpec::new("pty", YesNo, not_implemented("-pty")),
    OptionSpec::new("R", YesNo, not_implemented("-R")),
    OptionSpec::new("rdi", YesNo, not_implemented("-rdi")),
    OptionSpec::new("rou", List, not_implemented("-rou")),
    OptionSpec::new("S", List, not_implemented("-S")),
    OptionSpec::new("sc", Scalar, not_implemented("-sc")),
    OptionSpec::new("shell", YesNo, not_implemented("-shell")),
    OptionSpec::new("si", Scalar, not_implemented("-si")),
    OptionSpec::new("soft", Flag, not_implemented("-soft")),
    OptionSpec::new("sync", Scalar, not_implemented("-sync")),
    OptionSpec::new("umask", Scalar, not_implemented("-umask")),
    OptionSpec::new("w", Scalar, not_implemented("-w")),
    // No slurm equivalent
    OptionSpec::new("tcon", YesNo, not_supported("-tcon")),
    OptionSpec::new("verify", Flag, not_supported("-verify")),
    OptionSpec::new("xd", List, not_supported("-xd")),
    OptionSpec::new("xdv", List, not_supported("-xdv")),
    OptionSpec::new("xd_run_as_image_user", YesNo, not_supported("-xd_run_as_image_user")),
];

/// Looks up an option by its exact name (without the leading dash).
pub fn lookup(name: &str) -> Option<&'static OptionSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn option_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in REGISTRY {
            assert!(seen.insert(spec.name), "duplicate option: -{}", spec.name);
        }
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(lookup("N").map(|spec| spec.name), Some("N"));
        assert_eq!(lookup("v").map(|spec| spec.name), Some("v"));
        assert_eq!(lookup("V").map(|spec| spec.name), Some("V"));
        assert!(lookup("hold").is_none());
        assert!(lookup("-N").is_none());
    }

    #[test]
    fn markers_name_their_own_option() {
        for spec in REGISTRY {
            match spec.rule {
                TranslationRule::NotImplemented(flag) | TranslationRule::NotSupported(flag) => {
                    assert_eq!(flag, format!("-{}", spec.name));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn conditional_flags_are_presence_flags() {
        for spec in REGISTRY {
            if let TranslationRule::ConditionalFlag(_) = spec.rule {
                assert!(matches!(spec.kind, ValueKind::Flag | ValueKind::YesNo));
            }
        }
    }

    #[test]
    fn post_pass_options_are_deferred() {
        for name in ["j", "t", "tc", "hold_jid", "hold_jid_ad", "V", "v"] {
            let spec = lookup(name).expect("registered");
            assert!(
                matches!(spec.rule, TranslationRule::Deferred(_)),
                "-{} should be deferred",
                name
            );
        }
    }

    #[test]
    fn job_name_precedes_stream_paths() {
        let position = |name: &str| REGISTRY.iter().position(|spec| spec.name == name);
        assert!(position("N") < position("e"));
        assert!(position("e") < position("o"));
    }
}
