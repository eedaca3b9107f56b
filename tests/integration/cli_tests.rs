//! Integration tests for the uge2slurm CLI.
//!
//! Translation tests use `qsub --dry-run` so they don't need slurm. Tests
//! that actually submit point `--sbatch` at a shell script standing in for
//! sbatch.

#![allow(deprecated)] // cargo_bin is deprecated but works fine for standard builds

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn uge2slurm() -> Command {
    let mut command = Command::cargo_bin("uge2slurm").unwrap();
    command.arg("--no-color").env_remove("UGE2SLURM_SBATCH");
    command
}

fn dry_run(args: &[&str]) -> Command {
    let mut command = uge2slurm();
    command.args(["qsub", "--dry-run"]).args(args);
    command
}

// ============================================================================
// Help and Version tests
// ============================================================================

#[test]
fn test_help_describes_tool() {
    Command::cargo_bin("uge2slurm")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("slurm"))
        .stdout(predicate::str::contains("qsub"));
}

#[test]
fn test_version() {
    Command::cargo_bin("uge2slurm")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_qsub_help_shows_wrapper_options() {
    uge2slurm()
        .args(["qsub", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--sbatch"))
        .stdout(predicate::str::contains("--timeout"));
}

#[test]
fn test_no_subcommand_prints_command_status() {
    uge2slurm()
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("UGE Commands:"))
        .stdout(predicate::str::contains("slurm Commands:"))
        .stdout(predicate::str::contains("qsub"))
        .stdout(predicate::str::contains("sbatch"));
}

// ============================================================================
// Translation (dry run)
// ============================================================================

#[test]
fn test_default_translation() {
    dry_run(&["job.sh"])
        .assert()
        .success()
        .stdout("sbatch --output %x.o%j --error %x.e%j --export NONE job.sh\n");
}

#[test]
fn test_empty_output_path_uses_default() {
    dry_run(&["-o", "", "job.sh"])
        .assert()
        .success()
        .stdout("sbatch --output %x.o%j --error %x.e%j --export NONE job.sh\n")
        .stderr(predicate::str::contains("empty path for \"-o\" option was ignored."));
}

#[test]
fn test_job_name_and_explicit_streams() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let out = out.to_str().unwrap();

    dry_run(&["-o", out, "-e", out, "-N", "myjob", "job.sh"])
        .assert()
        .success()
        .stdout(format!(
            "sbatch --job-name myjob --error {out} --output {out} --export NONE job.sh\n"
        ))
        .stderr(predicate::str::contains("warning").not());
}

#[test]
fn test_existing_output_file_warns() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    std::fs::write(&out, "").unwrap();

    dry_run(&["-o", out.to_str().unwrap(), "job.sh"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: "))
        .stderr(predicate::str::contains("will be overwritten"));
}

#[test]
fn test_mail_types() {
    dry_run(&["-m", "be", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" --mail-type BEGIN,END "));
}

#[test]
fn test_array_with_throttle() {
    dry_run(&["-t", "1-10", "-tc", "5", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" --array 1-10%5 "))
        .stdout(predicate::str::contains("--output %x.o%j.%a"));
}

#[test]
fn test_hostgroup_queue_is_dropped() {
    dry_run(&["-q", "main@@hostgroup1", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--nodelist").not())
        .stderr(predicate::str::contains("error: "))
        .stderr(predicate::str::contains("main@@hostgroup1"));
}

#[test]
fn test_queue_host_becomes_nodelist() {
    dry_run(&["-q", "all.q@node01,all.q@node02", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" --nodelist node01,node02 "));
}

#[test]
fn test_environment_export() {
    dry_run(&["-V", "-v", "FOO=1,BAR", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" --export ALL,FOO=1,BAR job.sh"));
}

#[test]
fn test_dependencies() {
    dry_run(&["-hold_jid", "100,101", "-hold_jid_ad", "102", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            " --dependency afterok:100:101,aftercorr:102 ",
        ));
}

#[test]
fn test_merge_streams_drops_error_path() {
    dry_run(&["-j", "y", "-e", "/ignored/err", "job.sh"])
        .assert()
        .success()
        .stdout("sbatch --output %x.o%j --export NONE job.sh\n");
}

#[test]
fn test_command_arguments_are_kept_verbatim() {
    dry_run(&["-N", "job", "job.sh", "-N", "not an option"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with(
            "--export NONE job.sh -N 'not an option'\n",
        ));
}

#[test]
fn test_hold_and_priority() {
    dry_run(&["-h", "-p", "-100", "job.sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" --nice -100 --hold "));
}

#[test]
fn test_cwd_uses_current_directory() {
    let temp_dir = TempDir::new().unwrap();
    let expected = temp_dir.path().canonicalize().unwrap();

    dry_run(&["-cwd", "job.sh"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "sbatch --chdir {} ",
            expected.display()
        )));
}

#[test]
fn test_not_implemented_option_warns() {
    dry_run(&["-l", "h_vmem=4G", "job.sh"])
        .assert()
        .success()
        .stdout("sbatch --output %x.o%j --error %x.e%j --export NONE job.sh\n")
        .stderr(predicate::str::contains("warning: \"-l\" option is not implemented"));
}

// ============================================================================
// Fatal translation errors
// ============================================================================

#[test]
fn test_job_name_dependency_fails() {
    dry_run(&["-hold_jid", "prepare", "job.sh"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("only job ID is supported"));
}

#[test]
fn test_not_supported_option_fails() {
    dry_run(&["-verify", "job.sh"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"-verify\" option is not supported"));
}

#[test]
fn test_unknown_option_fails() {
    dry_run(&["-bogus", "job.sh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown qsub option \"-bogus\""));
}

#[test]
fn test_missing_value_fails() {
    dry_run(&["-N"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a value"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    uge2slurm()
        .args(["qsub", "--timeout", "0", "job.sh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timeout"));
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_missing_sbatch_binary_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("sbatch");

    uge2slurm()
        .args(["qsub", "--sbatch", missing.to_str().unwrap(), "job.sh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command `sbatch` not found."));
}

#[cfg(unix)]
mod submission {
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use super::*;

    fn fake_sbatch(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("sbatch");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_submit_passes_translated_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let sbatch = fake_sbatch(&temp_dir, "echo \"Submitted batch job 42: $*\"");

        uge2slurm()
            .args(["qsub", "--sbatch", sbatch.to_str().unwrap()])
            .args(["-N", "myjob", "-m", "a", "job.sh", "input.dat"])
            .assert()
            .success()
            .stdout(
                "Submitted batch job 42: --job-name myjob --mail-type FAIL,REQUEUE \
                 --output %x.o%j --error %x.e%j --export NONE job.sh input.dat\n",
            );
    }

    #[test]
    fn test_submit_uses_environment_override() {
        let temp_dir = TempDir::new().unwrap();
        let sbatch = fake_sbatch(&temp_dir, "echo \"Submitted batch job 7\"");

        uge2slurm()
            .env("UGE2SLURM_SBATCH", &sbatch)
            .args(["qsub", "job.sh"])
            .assert()
            .success()
            .stdout("Submitted batch job 7\n");
    }

    #[test]
    fn test_submit_failure_reports_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let sbatch = fake_sbatch(&temp_dir, "echo 'invalid account' >&2; exit 1");

        uge2slurm()
            .args(["qsub", "--sbatch", sbatch.to_str().unwrap(), "job.sh"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("sbatch: invalid account"))
            .stderr(predicate::str::contains("Failed to execute `sbatch` command."));
    }

    #[test]
    fn test_fatal_translation_never_runs_sbatch() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("ran");
        let sbatch = fake_sbatch(&temp_dir, &format!("touch {}", marker.display()));

        uge2slurm()
            .args(["qsub", "--sbatch", sbatch.to_str().unwrap()])
            .args(["-xd", "--cpus=2", "job.sh"])
            .assert()
            .failure();

        assert!(!marker.exists());
    }
}
