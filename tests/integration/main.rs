//! Integration tests for graphfmt
//!
//! These drive the built binary end to end against real files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graph>
    <node id="1"><cost>1.5</cost></node>
    <node id="2"><cost>0.2</cost></node>
    <node id="3"><cost>4</cost></node>
    <edge><source>1</source><target>2</target><cost>0.3</cost></edge>
    <edge><source>1</source><target>3</target><cost>0.1</cost></edge>
    <edge><source>2</source><target>3</target><cost>1.4</cost></edge>
</graph>
"#;

const REPORT_FORMAT: &str = "Nodes: %n\n%N\n\nEdges: %m\n%2RM\n\nCosts: %w\n\nAdjacency matrix:\n%a\n";

const REPORT: &str = "\
Nodes: 3
1
2
3

Edges: 3
1 2 1
1 3 0
2 3 3

Costs: 1.5 0.2 4

Adjacency matrix:
0 1 1
1 0 1
1 1 0
";

/// Run the binary inside `dir` so no stray config file is picked up.
fn graphfmt(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_graphfmt"))
        .args(args)
        .current_dir(dir)
        .env_remove("GRAPHFMT_LOG")
        .output()
        .expect("Failed to execute graphfmt")
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sample.xml"), SAMPLE).unwrap();
    dir
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_convert_with_default_format() {
    let dir = workspace();
    let output = graphfmt(dir.path(), &["convert", "sample.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = fs::read_to_string(dir.path().join("sample.in")).unwrap();
    assert_eq!(text, "3 3\n1 2\n1 3\n2 3\n");
}

#[test]
fn test_convert_full_report() {
    let dir = workspace();
    for decoder in ["token", "streaming"] {
        let out_dir = format!("out-{decoder}");
        let output = graphfmt(
            dir.path(),
            &["convert", "sample.xml", "--format", REPORT_FORMAT, "--output-dir", &out_dir, "--decoder", decoder],
        );
        assert!(output.status.success(), "{decoder}: {}", stderr(&output));

        let text = fs::read_to_string(dir.path().join(&out_dir).join("sample.in")).unwrap();
        assert_eq!(text, REPORT, "{decoder}");
    }
}

#[test]
fn test_glob_into_nested_output_dir() {
    let dir = workspace();
    fs::create_dir_all(dir.path().join("graphs/skip")).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(format!("graphs/{name}.xml")), SAMPLE).unwrap();
    }
    fs::write(dir.path().join("graphs/skip/d.xml"), SAMPLE).unwrap();
    fs::write(dir.path().join("graphs/readme.txt"), "not a graph").unwrap();

    let output = graphfmt(
        dir.path(),
        &["convert", "--glob", "graphs/*.xml", "-o", "out/deep", "-e", "txt", "--format", "%n", "-j", "2"],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let mut produced: Vec<String> = fs::read_dir(dir.path().join("out/deep"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    produced.sort();
    assert_eq!(produced, vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(fs::read_to_string(dir.path().join("out/deep/a.txt")).unwrap(), "3");
}

#[test]
fn test_config_file_in_working_directory() {
    let dir = workspace();
    fs::write(
        dir.path().join("graphfmt.toml"),
        "format = \"%m edges\"\nextension = \"edges\"\ndecoder = \"token\"\n",
    )
    .unwrap();

    let output = graphfmt(dir.path(), &["convert", "sample.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("sample.edges")).unwrap(), "3 edges");

    let output = graphfmt(dir.path(), &["convert", "sample.xml", "--format", "%n nodes"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(fs::read_to_string(dir.path().join("sample.edges")).unwrap(), "3 nodes");
}

#[test]
fn test_invalid_config_rejected() {
    let dir = workspace();
    fs::write(dir.path().join("custom.toml"), "colour = \"blue\"\n").unwrap();

    let output = graphfmt(dir.path(), &["--config", "custom.toml", "convert", "sample.xml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("custom.toml"), "{}", stderr(&output));
    assert!(!dir.path().join("sample.in").exists());
}

#[test]
fn test_invalid_format_shows_help() {
    let dir = workspace();
    let output = graphfmt(dir.path(), &["convert", "sample.xml", "--format", "%5z"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("invalid verb \"z\" (in \"%5z\")"), "{err}");
    assert!(err.contains("Format directives"), "{err}");
    assert!(!dir.path().join("sample.in").exists());
}

#[test]
fn test_decode_failure_names_file() {
    let dir = workspace();
    fs::write(dir.path().join("broken.xml"), "<graph><edge><source>1</source></edge></graph>").unwrap();

    let output = graphfmt(dir.path(), &["convert", "broken.xml"]);
    assert!(!output.status.success());

    let err = stderr(&output);
    assert!(err.contains("broken.xml"), "{err}");
    assert!(err.contains("missing required <target>"), "{err}");
}

#[test]
fn test_no_inputs_is_not_an_error() {
    let dir = workspace();
    let output = graphfmt(dir.path(), &["convert"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = graphfmt(dir.path(), &["convert", "--glob", "nothing/*.xml"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_check_lists_directives() {
    let dir = TempDir::new().unwrap();
    let output = graphfmt(dir.path(), &["check", "%n %.5RM"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "node count\ntext \" \"\nedge list (ratio 0.5, rounding R)\n"
    );

    let output = graphfmt(dir.path(), &["check", "%"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing verb"), "{}", stderr(&output));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = graphfmt(dir.path(), &["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("graphfmt v{}", env!("CARGO_PKG_VERSION")));
}
