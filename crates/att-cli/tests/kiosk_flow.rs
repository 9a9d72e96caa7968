//! End-to-end tests driving the `att` binary against a temporary database.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const SCHEDULE: &str = r#"
completion_mode = "DAILY_SEPARATE"

[[days]]
date = "2025-05-10"

[[days.zones]]
id = "hall-a"
name = "Hall A"
start = "09:00"
end = "18:00"
goal_minutes = 240
breaks = [{ start = "12:00", end = "13:00" }]

[[days.zones]]
id = "hall-b"
name = "Hall B"
start = "09:00"
end = "18:00"
goal_minutes = 60
"#;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(schedule: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("att.db");
        let schedule_path = dir.path().join("schedule.toml");
        fs::write(&schedule_path, schedule).unwrap();

        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "database_path = \"{}\"\nschedule_path = \"{}\"\nutc_offset = \"+09:00\"\n",
                db_path.display(),
                schedule_path.display()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_att"));
        cmd.arg("--config")
            .arg(&self.config)
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("failed to run att")
    }

    fn run_with_stdin(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn att");
        child
            .stdin
            .as_mut()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().expect("failed to wait for att")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "att failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn kiosk_scans_accumulate_and_meet_daily_goal() {
    let ws = Workspace::new(SCHEDULE);
    stdout(&ws.run(&["register", "--badge", "QR-1", "--name", "Kim"]));

    let entry = stdout(&ws.run(&[
        "scan",
        "--badge",
        "QR-1",
        "--zone",
        "hall-a",
        "--action",
        "entry",
        "--at",
        "2025-05-10T09:00:00+09:00",
    ]));
    assert_eq!(entry, "QR-1 checked in to hall-a at 09:00\n");

    let exit = stdout(&ws.run(&[
        "scan",
        "--badge",
        "QR-1",
        "--zone",
        "hall-a",
        "--action",
        "exit",
        "--at",
        "2025-05-10T14:30:00+09:00",
    ]));
    assert_eq!(
        exit,
        "QR-1 checked out of hall-a at 14:30: +4h 30m\n\
         Today: 4h 30m / 5h 0m\n\
         Overall: 4h 30m\n\
         Goal (DAILY_SEPARATE): not met\n"
    );

    for (action, at) in [
        ("entry", "2025-05-10T15:00:00+09:00"),
        ("exit", "2025-05-10T16:00:00+09:00"),
    ] {
        stdout(&ws.run(&[
            "scan", "--badge", "QR-1", "--zone", "hall-b", "--action", action, "--at", at,
        ]));
    }

    let report = stdout(&ws.run(&["report", "--json"]));
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    let kim = &json["registrants"][0];
    assert_eq!(kim["badge"], "QR-1");
    assert_eq!(kim["total_minutes"], 330);
    assert_eq!(kim["days"][0]["goal_minutes"], 300);
    assert_eq!(kim["days"][0]["goal_met"], true);
    assert_eq!(kim["completed"], true);
    assert_eq!(json["summary"]["completed"], 1);
}

#[test]
fn overnight_session_counts_checkout_after_midnight() {
    let schedule = r#"
[[days]]
date = "2025-05-10"

[[days.zones]]
id = "night"
name = "Night Market"
start = "20:00"
end = "02:00"
goal_minutes = 240
"#;
    let ws = Workspace::new(schedule);
    stdout(&ws.run(&["register", "--badge", "QR-1", "--name", "Kim"]));

    for (action, at) in [
        ("entry", "2025-05-10T21:00:00+09:00"),
        ("exit", "2025-05-11T01:00:00+09:00"),
    ] {
        stdout(&ws.run(&[
            "scan", "--badge", "QR-1", "--zone", "night", "--action", action, "--at", at,
        ]));
    }

    let report = stdout(&ws.run(&["report", "--json"]));
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    let kim = &json["registrants"][0];
    assert_eq!(kim["days"][0]["zones"][0]["minutes"], 240);
    assert_eq!(kim["completed"], true);
}

#[test]
fn import_then_export_csv() {
    let ws = Workspace::new(SCHEDULE);
    stdout(&ws.run(&["register", "--badge", "QR-2", "--name", "Lee"]));

    let logs = r#"{"id":"l1","timestamp":"2025-05-10T09:30:00+09:00","action":"ENTRY","locationId":"hall-b","scannedQr":"QR-2"}
{"id":"l2","timestamp":"2025-05-10T09:31:00+09:00","action":"ENTRY","locationId":"hall-b","scannedQr":"QR-2"}
{"id":"l3","timestamp":"2025-05-10T10:15:00+09:00","action":"EXIT","locationId":"hall-b","scannedQr":"QR-2"}
"#;
    let output = ws.run_with_stdin(&["import"], logs);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Imported 3 new scans"));

    let again = ws.run_with_stdin(&["import"], logs);
    assert!(String::from_utf8_lossy(&again.stderr).contains("Imported 0 new scans"));

    let csv = stdout(&ws.run(&["export"]));
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("badge,name,date,zone"));
    assert_eq!(
        lines[2],
        "QR-2,Lee,2025-05-10,hall-b,Hall B,45,60,false,45,300,false,false"
    );
}

#[test]
fn scan_at_unscheduled_zone_fails() {
    let ws = Workspace::new(SCHEDULE);
    let output = ws.run(&[
        "scan",
        "--badge",
        "QR-1",
        "--zone",
        "hall-z",
        "--action",
        "entry",
        "--at",
        "2025-05-10T09:00:00+09:00",
    ]);
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("zone hall-z is not scheduled on 2025-05-10")
    );
}

#[test]
fn zones_check_flags_overlapping_breaks() {
    let schedule = SCHEDULE.replace(
        r#"breaks = [{ start = "12:00", end = "13:00" }]"#,
        r#"breaks = [{ start = "12:00", end = "13:00" }, { start = "12:30", end = "13:30" }]"#,
    );
    let ws = Workspace::new(&schedule);

    let output = ws.run(&["zones", "check"]);
    assert!(!output.status.success());
    let printed = String::from_utf8_lossy(&output.stdout);
    assert!(printed.contains("breaks 12:00-13:00 and 12:30-13:30 overlap"));

    let clean = Workspace::new(SCHEDULE);
    assert_eq!(
        stdout(&clean.run(&["zones", "check"])),
        "Schedule OK: 1 days, 2 zone sessions\n"
    );
    assert!(clean.path().join("schedule.toml").exists());
}
