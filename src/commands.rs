//! Known UGE and slurm commands and where they resolve on `PATH`.

use std::path::PathBuf;

use colored::Colorize;

pub const UGE_COMMAND_NAMES: &[&str] = &[
    "qacct",
    "qalter",
    "qconf",
    "qdel",
    "qhold",
    "qhost",
    "qlogin",
    "qmake",
    "qmod",
    "qmon",
    "qping",
    "qquota",
    "qralter",
    "qrdel",
    "qresub",
    "qrls",
    "qrsh",
    "qrstat",
    "qrsub",
    "qselect",
    "qsh",
    "qstat",
    "qsub",
    "sge_container_init",
    "sge_container_shepherd",
    "sge_coshepherd",
    "sge_execd",
    "sge_qmaster",
    "sge_shadowd",
    "sge_shepherd",
    "sgepasswd",
];

pub const SLURM_COMMAND_NAMES: &[&str] = &[
    "sacct", "sacctmgr", "salloc", "sattach", "sbatch", "sbcast", "scancel", "scontrol", "sdiag",
    "sgather", "sinfo", "sprio", "squeue", "sreport", "srun", "sshare", "sstat", "strigger",
    "sview",
];

/// Resolution of a single command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    NotFound,
    Found(PathBuf),
    Duplicated(Vec<PathBuf>),
}

impl CommandStatus {
    pub fn from_candidates(mut candidates: Vec<PathBuf>) -> Self {
        match candidates.len() {
            0 => CommandStatus::NotFound,
            1 => CommandStatus::Found(candidates.remove(0)),
            _ => CommandStatus::Duplicated(candidates),
        }
    }

    pub fn resolve(command: &str) -> Self {
        let candidates: Vec<PathBuf> = which::which_all(command)
            .map(|paths| paths.collect())
            .unwrap_or_default();
        Self::from_candidates(candidates)
    }

    /// One colored status line, indented with a tab.
    pub fn describe(&self, command: &str) -> String {
        match self {
            CommandStatus::NotFound => format!("\t{}: command not found.", command)
                .yellow()
                .to_string(),
            CommandStatus::Found(path) => format!("\t{} -> {}", command, path.display())
                .cyan()
                .to_string(),
            CommandStatus::Duplicated(paths) => {
                let paths: Vec<_> = paths.iter().map(|path| path.display().to_string()).collect();
                format!("\t{} -> [{}] (duplicated!)", command, paths.join(", "))
                    .red()
                    .to_string()
            }
        }
    }
}

/// Prints where every known UGE and slurm command resolves.
pub fn print_status() {
    println!("\nUGE Commands:");
    for command in UGE_COMMAND_NAMES {
        println!("{}", CommandStatus::resolve(command).describe(command));
    }

    println!("\nslurm Commands:");
    for command in SLURM_COMMAND_NAMES {
        println!("{}", CommandStatus::resolve(command).describe(command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_candidates() {
        assert_eq!(CommandStatus::from_candidates(vec![]), CommandStatus::NotFound);
        assert_eq!(
            CommandStatus::from_candidates(vec![PathBuf::from("/usr/bin/sbatch")]),
            CommandStatus::Found(PathBuf::from("/usr/bin/sbatch"))
        );
        assert!(matches!(
            CommandStatus::from_candidates(vec![
                PathBuf::from("/usr/bin/sbatch"),
                PathBuf::from("/opt/slurm/bin/sbatch"),
            ]),
            CommandStatus::Duplicated(ref paths) if paths.len() == 2
        ));
    }

    #[test]
    fn describe_lines() {
        colored::control::set_override(false);

        assert_eq!(
            CommandStatus::NotFound.describe("qsub"),
            "\tqsub: command not found."
        );
        assert_eq!(
            CommandStatus::Found(PathBuf::from("/usr/bin/sbatch")).describe("sbatch"),
            "\tsbatch -> /usr/bin/sbatch"
        );
        assert_eq!(
            CommandStatus::Duplicated(vec![PathBuf::from("/a/srun"), PathBuf::from("/b/srun")])
                .describe("srun"),
            "\tsrun -> [/a/srun, /b/srun] (duplicated!)"
        );
    }

    #[test]
    fn unknown_command_is_not_found() {
        assert_eq!(
            CommandStatus::resolve("uge2slurm-no-such-command"),
            CommandStatus::NotFound
        );
    }

    #[test]
    fn tables_contain_submission_commands() {
        assert!(UGE_COMMAND_NAMES.contains(&"qsub"));
        assert!(SLURM_COMMAND_NAMES.contains(&"sbatch"));
    }
}
