use serial_test::serial;
use std::process::Command;

const BENCHES: &str = r#"
[[resource]]
name = "AdjustBench"
kind = "bench"

[[resource]]
name = "DemoBench"
kind = "bench"
[resource.keys]
DemoMode = "1"

[[resource]]
name = "Dmm"
kind = "device"
"#;

fn tsadj(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tsadj"))
        .args(args)
        .output()
        .expect("run tsadj")
}

#[test]
#[serial]
fn format_prints_value() {
    let output = tsadj(&["format", "%.3f", "-2.5"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "-2.500");
}

#[test]
#[serial]
fn format_rejects_unsupported_type() {
    let output = tsadj(&["format", "%s", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[TSADJ][ERROR]"));
    assert!(stderr.contains("-1004003"));
}

#[test]
#[serial]
fn run_reports_value_status() {
    let output = tsadj(&[
        "run", "--unit", "V", "--lower", "1", "--upper", "5", "--values", "3,7", "--commit",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("3 -> InRange"));
    assert!(stdout.contains("7 -> OutOfRange"));
    assert!(stdout.contains("LL: 1.00 V"));
    assert!(stdout.contains("Locals.AdjustmentPanelButtonHit = true"));
}

#[test]
#[serial]
fn run_uses_bench_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("benches.toml");
    std::fs::write(&path, BENCHES).expect("write benches");
    let config = path.to_string_lossy().to_string();

    let panel = dir.path().join("panel.toml");
    std::fs::write(&panel, "demo_delay_ms = 10\n").expect("write panel config");
    let panel = panel.to_string_lossy().to_string();

    let output = tsadj(&[
        "run",
        "--config",
        &config,
        "--panel-config",
        &panel,
        "--bench",
        "DemoBench",
        "--values",
        "4",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("4 -> Demo"));
    assert!(stdout.contains("Adjustment panel in demo mode"));

    let output = tsadj(&["run", "--config", &config, "--bench", "Dmm"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Setup failed with code -1004001"));
    assert!(stderr.contains("Error: The given resource is not a bench"));
}
