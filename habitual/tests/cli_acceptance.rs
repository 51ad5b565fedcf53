use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    /// Default transcript root under the isolated HOME.
    fn transcripts(&self) -> PathBuf {
        self.home.join(".claude/projects")
    }

    /// Default output directory under the isolated XDG data home.
    fn analysis_dir(&self) -> PathBuf {
        self.xdg_data.join("habitual/analysis")
    }
}

/// Three recent sessions that each run Read → Edit → Bash after a build request.
fn seed_transcripts(root: &Path) {
    let project = root.join("-Users-me-work-app");
    fs::create_dir_all(&project).expect("failed to create project dir");

    let now = chrono::Utc::now();
    for (i, id) in ["s1", "s2", "s3"].iter().enumerate() {
        let at = (now - chrono::Duration::hours(i as i64 + 1)).to_rfc3339();
        let records: [Value; 2] = [
            json!({
                "type": "user",
                "timestamp": at,
                "message": { "role": "user", "content": "빌드 확인해줘" }
            }),
            json!({
                "type": "assistant",
                "timestamp": at,
                "message": { "role": "assistant", "content": [
                    { "type": "tool_use", "name": "Read", "input": { "file_path": "src/main.rs" } },
                    { "type": "tool_use", "name": "Edit", "input": { "file_path": "src/main.rs" } },
                    { "type": "tool_use", "name": "Bash", "input": { "command": "cargo build" } }
                ]}
            }),
        ];
        let body = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(project.join(format!("{id}.jsonl")), body).expect("failed to write transcript");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("habitual"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute habitual: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "habitual {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn run_writes_every_artifact() {
    let env = CliTestEnv::new();
    seed_transcripts(&env.transcripts());

    let output = run_bin(&env, &["run"]);
    assert_success(&["run"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Collected 3 sessions"),
        "expected collection summary, got:\n{stdout}"
    );
    assert!(stdout.contains("Patterns: 1 tool sequences"));
    assert!(stdout.contains("read-edit-bash.md"));

    let analysis = env.analysis_dir();
    assert!(analysis.join("sessions/s1.txt").exists());
    assert!(analysis.join("patterns/tool_sequences.json").exists());
    assert!(analysis.join("classified/classified_patterns.json").exists());
    assert!(analysis.join("proposals/proposals.json").exists());

    let log_dir = env.xdg_state.join("habitual");
    assert!(log_dir.exists(), "log directory should be created");
}

#[test]
fn run_json_reports_summary() {
    let env = CliTestEnv::new();
    let source = env.home.join("transcripts");
    seed_transcripts(&source);
    let output_dir = env.home.join("out");

    let args = [
        "run",
        "--source",
        source.to_str().unwrap(),
        "--output",
        output_dir.to_str().unwrap(),
        "--dry-run",
        "--format",
        "json",
    ];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let summary: Value =
        serde_json::from_slice(&output.stdout).expect("run --format json should print JSON");
    assert_eq!(summary["sessions_collected"], 3);
    assert_eq!(summary["patterns"]["tool_sequences"], 1);
    assert!(summary["proposals"].is_null());
    assert!(summary["by_priority"]["P1"].is_number());

    assert!(output_dir.join("classified/classified_patterns.json").exists());
    assert!(!output_dir.join("proposals").exists());
}

#[test]
fn run_without_transcripts_prints_hint() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["run"]);
    assert_success(&["run"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No sessions collected"));
    assert!(!env.analysis_dir().join("patterns").exists());
}

#[test]
fn collect_prints_analysis_input() {
    let env = CliTestEnv::new();
    seed_transcripts(&env.transcripts());

    let output = run_bin(&env, &["collect"]);
    assert_success(&["collect"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("# Session Analysis Data"));
    assert!(stdout.contains("Sessions: 3"));
    assert!(stdout.contains("C: Read: src/main.rs | Edit: src/main.rs | Bash: cargo build"));
}

#[test]
fn classify_and_propose_rerun_stages() {
    let env = CliTestEnv::new();
    seed_transcripts(&env.transcripts());

    let output = run_bin(&env, &["run", "--dry-run"]);
    assert_success(&["run", "--dry-run"], &output);

    let output = run_bin(&env, &["classify"]);
    assert_success(&["classify"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Classified"));

    let output = run_bin(&env, &["propose"]);
    assert_success(&["propose"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Generated"));
    assert!(env.analysis_dir().join("proposals/proposals.json").exists());
}

#[test]
fn classify_and_propose_without_inputs_succeed() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["classify"]);
    assert_success(&["classify"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No patterns found"));

    let output = run_bin(&env, &["propose"]);
    assert_success(&["propose"], &output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No classified suggestions"));
}

#[test]
fn rejects_zero_budget() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["run", "--limit-kb", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("limit_kb"), "unexpected stderr:\n{stderr}");
}
