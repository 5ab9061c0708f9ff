use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let dump_path = dir.join("ntds.txt");
    let cracked_path = dir.join("cracked.txt");
    {
        let mut f = fs::File::create(&dump_path).unwrap();
        writeln!(f, "# secretsdump output").unwrap();
        writeln!(
            f,
            "DOMAIN\\alice:1001:aad3b435b51404eeaad3b435b51404ee:583548022f3eba94bf17d727a575a4a3:::"
        )
        .unwrap();
        writeln!(
            f,
            "DOMAIN\\bob:1002:aad3b435b51404eeaad3b435b51404ee:583548022f3eba94bf17d727a575a4a3:::"
        )
        .unwrap();
        writeln!(
            f,
            "DOMAIN\\carol:1003:aad3b435b51404eeaad3b435b51404ee:8846f7eaee8fb117ad06bdd830b7586c:::"
        )
        .unwrap();
        writeln!(
            f,
            "DOMAIN\\Guest:501:aad3b435b51404eeaad3b435b51404ee:31d6cfe0d16ae931b73c59d7e0c089c0:::"
        )
        .unwrap();
    }
    {
        let mut f = fs::File::create(&cracked_path).unwrap();
        writeln!(f, "583548022F3EBA94BF17D727A575A4A3:Acme2024").unwrap();
    }
    (dump_path, cracked_path)
}

#[test]
fn e2e_runs_and_writes_report() {
    let tmp = tempdir().unwrap();
    let (dump, cracked) = write_inputs(tmp.path());
    let report = tmp.path().join("report.xlsx");

    let mut cmd = Command::cargo_bin("crackstats").unwrap();
    cmd.arg(&dump)
        .arg(&cracked)
        .arg(&report)
        .arg("Acme")
        .arg("--color")
        .arg("never");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Total Users: 3"))
        .stdout(predicate::str::contains("Users with Cracked Passwords: 2"))
        .stdout(predicate::str::contains("Success Rate: 66.7%"))
        .stdout(predicate::str::contains("'Acme2024': 2 users (100.0%)"));

    let summary = fs::read_to_string(tmp.path().join("report_summary.csv")).unwrap();
    assert!(summary.contains("Unique Hashes,2"));
    let words = fs::read_to_string(tmp.path().join("report_words.csv")).unwrap();
    assert!(words.contains("acme,2,100.0%"));
}

#[test]
fn parallel_and_mmap_paths_produce_same_summary() {
    let tmp = tempdir().unwrap();
    let (dump, cracked) = write_inputs(tmp.path());

    let run = |extra: &[&str], report: &str| {
        let mut cmd = Command::cargo_bin("crackstats").unwrap();
        cmd.arg(&dump)
            .arg(&cracked)
            .arg(tmp.path().join(report))
            .arg("acme")
            .args(["--color", "never"])
            .args(extra);
        let out = cmd.output().unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };
    let plain = run(&[], "a.csv");
    let parallel = run(&["--parallel", "--mmap-threshold", "32"], "b.csv");
    assert_eq!(
        plain.replace("a_", "x_"),
        parallel.replace("b_", "x_")
    );
}

#[test]
fn wrong_argument_count_fails() {
    let tmp = tempdir().unwrap();
    let (dump, cracked) = write_inputs(tmp.path());
    let mut cmd = Command::cargo_bin("crackstats").unwrap();
    cmd.arg(&dump).arg(&cracked).arg(tmp.path().join("report.xlsx"));
    cmd.assert().failure();
}

#[test]
fn missing_dump_causes_non_zero_exit() {
    let tmp = tempdir().unwrap();
    let (_, cracked) = write_inputs(tmp.path());
    let mut cmd = Command::cargo_bin("crackstats").unwrap();
    cmd.arg(tmp.path().join("missing-ntds.txt"))
        .arg(&cracked)
        .arg(tmp.path().join("report.xlsx"))
        .arg("acme");
    cmd.assert().failure().code(2);
}

#[test]
fn empty_cracked_file_reports_no_results() {
    let tmp = tempdir().unwrap();
    let (dump, _) = write_inputs(tmp.path());
    let empty = tmp.path().join("empty.txt");
    fs::write(&empty, "").unwrap();
    let mut cmd = Command::cargo_bin("crackstats").unwrap();
    cmd.arg(&dump)
        .arg(&empty)
        .arg(tmp.path().join("report.xlsx"))
        .arg("acme")
        .args(["--color", "never"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No passwords were successfully matched!"))
        .stdout(predicate::str::contains("Total users: 3"));
    assert!(!tmp.path().join("report_summary.csv").exists());
}

#[test]
fn report_write_failure_causes_non_zero_exit() {
    let tmp = tempdir().unwrap();
    let (dump, cracked) = write_inputs(tmp.path());
    let mut cmd = Command::cargo_bin("crackstats").unwrap();
    cmd.arg(&dump)
        .arg(&cracked)
        .arg(tmp.path().join("no-such-dir").join("report.xlsx"))
        .arg("acme")
        .arg("-q");
    cmd.assert().failure().code(5);
}
