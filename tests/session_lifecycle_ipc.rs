use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_clasfyd");
    let mut child = Command::new(exe)
        .args(args)
        .env_remove("CLASFYD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn clasfyd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn select_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &Path,
) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    )
}

#[test]
fn demo_login_survives_restart_until_logout() {
    let workspace = temp_dir("clasfyd-session");

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);
    let opened = select_workspace(&mut stdin, &mut reader, &workspace);
    assert_eq!(opened["profile"], serde_json::Value::Null);

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "guru@sekolah.sch.id", "password": "rahasia", "role": "teacher" }),
    );
    assert!(login["sessionId"].as_str().is_some());
    assert!(login["signedInAt"].as_str().is_some());
    let profile = &login["profile"];
    assert_eq!(profile["role"], "teacher");
    assert_eq!(profile["name"], "Bu Sarah Wijaya");
    assert_eq!(profile["email"], "guru@sekolah.sch.id");
    assert_eq!(profile["nip"], "196512345678901234");

    let current = request_ok(&mut stdin, &mut reader, "2", "session.current", json!({}));
    assert_eq!(&current["profile"], profile);

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health["signedIn"], true);

    drop(stdin);
    let _ = child.wait();

    // A fresh process opening the same workspace picks the profile back up.
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);
    let reopened = select_workspace(&mut stdin, &mut reader, &workspace);
    assert_eq!(&reopened["profile"], profile);

    let out = request_ok(&mut stdin, &mut reader, "4", "session.logout", json!({}));
    assert_eq!(out["signedOut"], true);

    let current = request_ok(&mut stdin, &mut reader, "5", "session.current", json!({}));
    assert_eq!(current["profile"], serde_json::Value::Null);

    let again = request(&mut stdin, &mut reader, "6", "session.logout", json!({}));
    assert_eq!(again["ok"], false);
    assert_eq!(again["error"]["code"], "not_signed_in");

    drop(stdin);
    let _ = child.wait();

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);
    let reopened = select_workspace(&mut stdin, &mut reader, &workspace);
    assert_eq!(reopened["profile"], serde_json::Value::Null);
    drop(stdin);
    let _ = child.wait();

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn student_login_carries_class_and_nisn() {
    let workspace = temp_dir("clasfyd-student");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);
    select_workspace(&mut stdin, &mut reader, &workspace);

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "ahmad@sekolah.sch.id", "password": "x", "role": "siswa" }),
    );
    let profile = &login["profile"];
    assert_eq!(profile["role"], "student");
    assert_eq!(profile["nisn"], "0012345678");
    assert_eq!(profile["className"], "XII IPA 1");
    assert!(profile.get("nip").is_none());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn remote_mode_reports_auth_unavailable() {
    let workspace = temp_dir("clasfyd-remote");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "remote"]);

    let health = request_ok(&mut stdin, &mut reader, "0", "health", json!({}));
    assert_eq!(health["authMode"], "remote");

    select_workspace(&mut stdin, &mut reader, &workspace);
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "guru@sekolah.sch.id", "password": "rahasia", "role": "teacher" }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "auth_unavailable");

    let current = request_ok(&mut stdin, &mut reader, "2", "session.current", json!({}));
    assert_eq!(current["profile"], serde_json::Value::Null);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn login_validation_errors() {
    let workspace = temp_dir("clasfyd-login-errors");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "a@b.c", "password": "x", "role": "teacher" }),
    );
    assert_eq!(resp["error"]["code"], "no_workspace");

    select_workspace(&mut stdin, &mut reader, &workspace);

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "session.login",
        json!({ "email": "a@b.c", "password": "x" }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "session.login",
        json!({ "email": "a@b.c", "password": "x", "role": "admin" }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "session.login",
        json!({ "email": "   ", "password": "x", "role": "teacher" }),
    );
    assert_eq!(resp["error"]["code"], "auth_failed");

    let resp = request(&mut stdin, &mut reader, "5", "workspace.select", json!({}));
    assert_eq!(resp["error"]["code"], "bad_params");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn startup_workspace_flag_restores_session() {
    let workspace = temp_dir("clasfyd-startup");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--auth-mode", "demo"]);
    select_workspace(&mut stdin, &mut reader, &workspace);
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.login",
        json!({ "email": "guru@sekolah.sch.id", "password": "rahasia", "role": "guru" }),
    );
    drop(stdin);
    let _ = child.wait();

    let ws = workspace.to_string_lossy().to_string();
    let (mut child, mut stdin, mut reader) =
        spawn_sidecar(&["--auth-mode", "demo", "--workspace", &ws]);
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["signedIn"], true);
    assert_eq!(health["workspacePath"], ws);
    let current = request_ok(&mut stdin, &mut reader, "3", "session.current", json!({}));
    assert_eq!(current["profile"]["role"], "teacher");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
