//! Drives the `boolcirc` binary end to end.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const INC3: &str = r#"
module inc3(a, out);
  input [2:0] a;
  output [2:0] out;
  wire c2;
  inv g0 ( .A(a[0]), .Y(out[0]) );
  xor2 x1 ( .A(a[1]), .B(a[0]), .Y(out[1]) );
  and2 n1 ( .A(a[1]), .B(a[0]), .Y(c2) );
  xor2 x2 ( .A(a[2]), .B(c2), .Y(out[2]) );
endmodule
"#;

const INC3_META: &str = r#"{
  "name": "inc3",
  "params": [{"name": "a", "width": 3, "is_const": true}],
  "return_width": 3
}"#;

fn boolcirc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boolcirc"))
        .args(args)
        .output()
        .expect("failed to launch boolcirc")
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn analyze_prints_level_report() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "inc3.v", INC3);

    let out = boolcirc(&["analyze", "--netlist", netlist.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("Cell Library: <builtin>\n"));
    assert!(stdout.contains("Level 0(1): and2:1\n"));
    assert!(stdout.contains("Level 1(3): inv:1, xor2:2\n"));
    assert!(stdout.contains("Total number of gates: 4\n"));
    assert!(stdout.contains("Widest level(width): 3\n"));
}

#[test]
fn analyze_writes_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "inc3.v", INC3);
    let report = dir.path().join("report.txt");

    let out = boolcirc(&[
        "analyze",
        "--netlist",
        netlist.to_str().unwrap(),
        "--output",
        report.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    assert!(fs::read_to_string(report)
        .unwrap()
        .contains("Number of levels(height): 2"));
}

#[test]
fn run_increments_argument() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "inc3.v", INC3);
    let metadata = write(dir.path(), "inc3.json", INC3_META);

    for schedule in ["dataflow", "levelled"] {
        let out = boolcirc(&[
            "run",
            "--netlist",
            netlist.to_str().unwrap(),
            "--metadata",
            metadata.to_str().unwrap(),
            "--arg",
            "a=5",
            "--workers",
            "2",
            "--schedule",
            schedule,
        ]);
        assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
        let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
        assert_eq!(json["result"], 6);
        assert_eq!(json["stats"]["gates_evaluated"], 4);
    }
}

#[test]
fn dot_emits_graphviz() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "inc3.v", INC3);

    let out = boolcirc(&["dot", "--netlist", netlist.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8(out.stdout).unwrap().starts_with("digraph {"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.v");
    let out = boolcirc(&["analyze", "--netlist", missing.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn malformed_netlist_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "bad.v", "module broken(a;\n");
    let out = boolcirc(&["analyze", "--netlist", netlist.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_run_argument_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let netlist = write(dir.path(), "inc3.v", INC3);
    let metadata = write(dir.path(), "inc3.json", INC3_META);
    let out = boolcirc(&[
        "run",
        "--netlist",
        netlist.to_str().unwrap(),
        "--metadata",
        metadata.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
}
