//! End-to-end checks for the `jobgen` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const CONFIG: &str = r#"
scheduler:
  directives:
    - shell: /bin/bash
      job_name: model
      walltime: "01:00:00"
  extraInfo:
    - exec: model.x
      redirect_stdout: out_%Y%m%d.log
machine:
  XC50:
    max_cores_per_node: 64
    modules: [craype-haswell]
"#;

fn write_config(dir: &Path) -> String {
    let p = dir.join("config.yml");
    fs::write(&p, CONFIG).unwrap();
    p.to_string_lossy().into_owned()
}

fn jobgen() -> Command {
    Command::cargo_bin("jobgen").unwrap()
}

#[test]
fn generate_writes_default_file() {
    let dir = TempDir::new().unwrap();
    let cfg = write_config(dir.path());

    jobgen()
        .current_dir(dir.path())
        .args(["generate", "--machine", "XC50", "--scheduler", "SLURM"])
        .args(["--mpi-tasks", "128", "--threads-per-mpi-task", "2"])
        .args(["--config", &cfg, "--now", "2024-03-05"])
        .assert()
        .success();

    let script = fs::read_to_string(dir.path().join("SLURM_submission_script.sh")).unwrap();
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("#SBATCH --job-name model\n"));
    assert!(script.contains("module load craype-haswell\n"));
    assert!(script.ends_with("srun -n 64 -N 32 -c 2 ./model.x > out_20240305.log\n"));
}

#[test]
fn generate_stdout_with_override() {
    let dir = TempDir::new().unwrap();
    let cfg = write_config(dir.path());

    let out = jobgen()
        .args(["generate", "--machine", "XC50", "--scheduler", "PBS"])
        .args(["--mpi-tasks", "64", "--config", &cfg, "--stdout"])
        .args(["--set", "job_name=override", "--now", "2024-03-05T10:00:00"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("#PBS -N override\n"));
    assert!(text.contains("cd $PBS_O_WORKDIR\n"));
    assert!(text.contains("aprun -n 64 -N 64 -d 1 ./model.x > out_20240305.log"));
}

#[test]
fn generate_json_summary() {
    let dir = TempDir::new().unwrap();
    let cfg = write_config(dir.path());
    let target = dir.path().join("job.sh");

    let out = jobgen()
        .args(["--json", "generate", "--machine", "XC50", "--scheduler", "SLURM"])
        .args(["--mpi-tasks", "128", "--threads-per-mpi-task", "2", "--config", &cfg])
        .args(["--out", &target.to_string_lossy(), "--now", "2024-03-05"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["scheduler"], "SLURM");
    assert_eq!(v["plan"]["nodes"], 4);
    assert_eq!(v["sha256"].as_str().unwrap().len(), 64);
    assert!(target.exists());
}

#[test]
fn unsupported_scheduler_fails() {
    let dir = TempDir::new().unwrap();
    let cfg = write_config(dir.path());

    let out = jobgen()
        .current_dir(dir.path())
        .args(["generate", "--machine", "XC50", "--scheduler", "LSF"])
        .args(["--mpi-tasks", "8", "--config", &cfg])
        .output()
        .unwrap();

    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("unsupported scheduler: LSF"));
    assert!(!dir.path().join("LSF_submission_script.sh").exists());
}

#[test]
fn missing_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let out = jobgen()
        .current_dir(dir.path())
        .args(["generate", "--machine", "XC50", "--scheduler", "SLURM", "--mpi-tasks", "8"])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("config.yml' was not found"));
}

#[test]
fn plan_command_json() {
    let out = jobgen()
        .args(["--json", "plan", "--max-cores-per-node", "64", "--mpi-tasks", "128"])
        .args(["--threads-per-mpi-task", "2"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["tasks_per_node"], 32);
    assert_eq!(v["pes"], 64);
    assert_eq!(v["nodes"], 4);
}

#[test]
fn directives_filtered_by_scheduler() {
    let out = jobgen()
        .args(["--json", "directives", "--scheduler", "SLURM"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["prefixes"]["SLURM"], "#SBATCH");
    let names: Vec<&str> = v["directives"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"constraint"));
    assert!(!names.contains(&"join_output"));
    assert!(!names.contains(&"shell"));
}
