use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Binary pointed at a default config file, so the host's config never leaks in
fn command(dir: &TempDir) -> Command {
    let config = dir.path().join("config.yaml");
    if !config.exists() {
        std::fs::write(&config, "app:\n  default_output_format: text\n").unwrap();
    }

    let mut cmd = Command::cargo_bin("youtube-transcript-mcp").unwrap();
    cmd.arg("--config").arg(config).env("RUST_LOG", "off");
    cmd
}

fn serve(input: &str) -> Vec<Value> {
    let dir = TempDir::new().unwrap();
    let output = command(&dir).write_stdin(input).output().unwrap();
    assert!(output.status.success(), "server exited with {:?}", output.status);

    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_serve_session() {
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"extract_video_id","arguments":{"url_or_id":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"}}}"#,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"get_video_transcript","arguments":{"languages":["en"]}}}"#,
    ]
    .join("\n");

    let responses = serve(&input);
    assert_eq!(responses.len(), 4, "the notification must not be answered");

    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");

    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 2);

    assert_eq!(
        responses[2]["result"],
        json!({"content": [{"type": "text", "text": "Video ID: dQw4w9WgXcQ"}], "isError": false})
    );

    assert_eq!(responses[3]["result"]["isError"], true);
    assert_eq!(
        responses[3]["result"]["content"][0]["text"],
        "Error: video_id is required"
    );
}

#[test]
fn test_serve_protocol_errors_keep_the_loop_alive() {
    let input = "{\"jsonrpc\":\"2.0\",\"id\":\"x\",\"method\":\"foo/bar\"}\n\
                 {broken\n\
                 {\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"tools/list\"}\n\
                 {\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"foo/bar\"}\n";

    let responses = serve(input);
    assert_eq!(responses.len(), 4);

    assert_eq!(
        responses[0],
        json!({"jsonrpc": "2.0", "id": "x", "error": {"code": -32601, "message": "Method not found"}})
    );
    assert_eq!(responses[1]["error"]["code"], -32603);
    assert!(responses[1]["id"].is_null());
    assert_eq!(responses[2]["id"], 5);

    // a null id is still a request, not a notification
    assert!(responses[3]["id"].is_null());
    assert_eq!(responses[3]["error"]["code"], -32601);
}

#[test]
fn test_serve_exits_cleanly_on_empty_input() {
    let dir = TempDir::new().unwrap();
    command(&dir)
        .arg("serve")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_video_id_command() {
    let dir = TempDir::new().unwrap();
    command(&dir)
        .args(["video-id", "https://youtu.be/dQw4w9WgXcQ"])
        .assert()
        .success()
        .stdout(predicate::str::diff("dQw4w9WgXcQ\n"));

    command(&dir)
        .args(["video-id", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not extract valid video ID"));
}

#[test]
fn test_config_show_and_init() {
    let dir = TempDir::new().unwrap();
    command(&dir)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default Format: text"));

    let fresh = dir.path().join("fresh").join("config.yaml");
    let init = || {
        let mut cmd = Command::cargo_bin("youtube-transcript-mcp").unwrap();
        cmd.env("RUST_LOG", "off")
            .arg("--config")
            .arg(&fresh)
            .args(["config", "--init"]);
        cmd
    };

    init()
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written to"));
    let written = std::fs::read_to_string(&fresh).unwrap();
    assert!(written.contains("default_output_format: text"));

    init()
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
