use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .env_remove("ROLLBOOK_WORKSPACE")
        .env_remove("ROLLBOOK_USER")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
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
    assert!(!line.trim().is_empty(), "empty response for {}", method);
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
    value.get("result").cloned().unwrap_or(json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn shutdown(mut child: Child, stdin: ChildStdin) {
    drop(stdin);
    let _ = child.wait();
}

fn student_stats(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    course_id: &str,
    name: &str,
) -> serde_json::Value {
    let listed = request_ok(stdin, reader, id, "students.list", json!({ "courseId": course_id }));
    listed["students"]
        .as_array()
        .expect("students array")
        .iter()
        .find(|s| s["name"] == name)
        .unwrap_or_else(|| panic!("student {}", name))["stats"]
        .clone()
}

#[test]
fn roll_call_marks_undo_and_persists_across_restart() {
    let workspace = temp_dir("rollbook-rollcall");
    let (child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let course_id = request_ok(&mut stdin, &mut reader, "2", "courses.create", json!({ "name": "3C" }))
        ["courseId"]
        .as_str()
        .expect("courseId")
        .to_string();
    for (i, name) in ["beto", "Ana", "carla"].iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("s{}", i),
            "students.create",
            json!({ "courseId": course_id, "name": name, "condition": "cursa" }),
        );
    }
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "state.setDate",
        json!({ "date": "2024-03-04" }),
    );

    let opened = request_ok(&mut stdin, &mut reader, "4", "rollcall.open", json!({ "courseId": course_id }));
    assert_eq!(opened["session"]["state"], "active");
    assert_eq!(opened["session"]["current"]["name"], "Ana");
    assert_eq!(opened["session"]["total"], 3);

    // Ana present, beto later (goes to the back), carla absent.
    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "present" }),
    );
    assert_eq!(marked["applied"], true);
    assert_eq!(marked["session"]["current"]["name"], "beto");

    let marked = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "later" }),
    );
    assert_eq!(marked["session"]["cursor"], 1);
    assert_eq!(marked["session"]["current"]["name"], "carla");

    let absent = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "absent" }),
    );
    let carla_absence = absent["eventId"].as_str().expect("eventId").to_string();
    let carla_id = absent["studentId"].as_str().expect("studentId").to_string();
    assert_eq!(absent["session"]["current"]["name"], "beto");

    let undone = request_ok(&mut stdin, &mut reader, "8", "rollcall.undo", json!({ "courseId": course_id }));
    assert_eq!(undone["applied"], true);
    assert_eq!(undone["undone"]["eventId"], carla_absence.as_str());
    assert_eq!(undone["session"]["current"]["name"], "carla");
    let carla = student_stats(&mut stdin, &mut reader, "9", &course_id, "carla");
    assert_eq!(carla, json!({ "present": 0, "absent": 0, "later": 0 }));

    let absent = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "absent" }),
    );
    let carla_absence = absent["eventId"].as_str().expect("eventId").to_string();
    request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "present" }),
    );
    let done = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "present" }),
    );
    assert_eq!(done["applied"], false);
    assert_eq!(done["session"]["state"], "completed");

    let justified = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "ledger.reclassify",
        json!({
            "courseId": course_id,
            "studentId": carla_id,
            "eventId": carla_absence,
            "reason": "justificada",
        }),
    );
    assert_eq!(justified["applied"], true);
    assert_eq!(justified["stats"]["absent"], 1);
    assert_eq!(justified["event"]["reason"], "justified");

    let verify = request_ok(&mut stdin, &mut reader, "14", "ledger.verify", json!({ "courseId": course_id }));
    assert_eq!(verify["consistent"], true);

    shutdown(child, stdin);

    let (child, mut stdin, mut reader) = spawn_sidecar();
    let reopened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(reopened["courseCount"], 1);

    let state = request_ok(&mut stdin, &mut reader, "2", "state.get", json!({}));
    let today = chrono::Local::now().date_naive().to_string();
    assert_eq!(state["selectedDate"], today.as_str());
    assert_eq!(state["selectedCourseId"], course_id.as_str());

    let beto = student_stats(&mut stdin, &mut reader, "3", &course_id, "beto");
    assert_eq!(beto, json!({ "present": 1, "absent": 0, "later": 1 }));
    let carla = student_stats(&mut stdin, &mut reader, "4", &course_id, "carla");
    assert_eq!(carla, json!({ "present": 0, "absent": 1, "later": 0 }));

    let absences = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.absences",
        json!({ "courseId": course_id, "studentId": carla_id }),
    );
    assert_eq!(
        absences["absences"],
        json!([{ "date": "2024-03-04", "justified": true }])
    );

    let last = request_ok(
        &mut stdin,
        &mut reader,
        "5b",
        "ledger.findLast",
        json!({ "courseId": course_id, "studentId": carla_id, "status": "absent", "date": "2024-03-04" }),
    );
    assert_eq!(last["event"]["id"], carla_absence.as_str());
    let none = request_ok(
        &mut stdin,
        &mut reader,
        "5c",
        "ledger.findLast",
        json!({ "courseId": course_id, "studentId": carla_id, "status": "later" }),
    );
    assert_eq!(none["event"], serde_json::Value::Null);

    // Sessions are not persisted: a fresh one starts at the top.
    let opened = request_ok(&mut stdin, &mut reader, "6", "rollcall.open", json!({ "courseId": course_id }));
    assert_eq!(opened["session"]["cursor"], 0);
    assert_eq!(opened["session"]["canUndo"], false);

    shutdown(child, stdin);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn roster_change_restarts_session_and_bad_input_is_rejected() {
    let workspace = temp_dir("rollbook-rollcall-roster");
    let (child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let course_id = request_ok(&mut stdin, &mut reader, "2", "courses.create", json!({ "name": "1A" }))
        ["courseId"]
        .as_str()
        .expect("courseId")
        .to_string();
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "courseId": course_id, "name": "Ana" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "present" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "courseId": course_id, "name": "Bruno" }),
    );

    let opened = request_ok(&mut stdin, &mut reader, "6", "rollcall.open", json!({ "courseId": course_id }));
    assert_eq!(opened["session"]["cursor"], 0);
    assert_eq!(opened["session"]["total"], 2);
    assert_eq!(opened["session"]["canUndo"], false);

    let nothing = request_ok(&mut stdin, &mut reader, "7", "rollcall.undo", json!({ "courseId": course_id }));
    assert_eq!(nothing["applied"], false);

    let bad_action = request(
        &mut stdin,
        &mut reader,
        "8",
        "rollcall.mark",
        json!({ "courseId": course_id, "action": "sleeping" }),
    );
    assert_eq!(error_code(&bad_action), Some("bad_params"));

    let missing = request(
        &mut stdin,
        &mut reader,
        "9",
        "rollcall.open",
        json!({ "courseId": "nope" }),
    );
    assert_eq!(error_code(&missing), Some("not_found"));

    let blank = request(&mut stdin, &mut reader, "10", "courses.create", json!({ "name": "   " }));
    assert_eq!(error_code(&blank), Some("bad_params"));

    let unknown = request(&mut stdin, &mut reader, "11", "courses.explode", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    shutdown(child, stdin);
    let _ = std::fs::remove_dir_all(workspace);
}
