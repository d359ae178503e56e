//! Integration tests for the export watcher.

use onclass_analyzer::analyzer::AnalysisEngine;
use onclass_analyzer::watcher::ExportWatcher;
use onclass_analyzer::{Intent, Session};
use std::fs;
use std::time::Duration;

#[test]
fn watch_nonexistent_parent_fails() {
    let result = ExportWatcher::watch(std::path::Path::new("/definitely/not/here/feedbacks.json"));
    assert!(result.is_err());
}

#[test]
fn write_to_export_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("feedbacks.json");
    fs::write(&file, r#"{"feedbacks": []}"#).unwrap();
    let watcher = ExportWatcher::watch(&file).unwrap();
    assert_eq!(watcher.path(), file.as_path());

    let target = file.clone();
    let writer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        fs::write(&target, r#"{"feedbacks": [{"content": "ありがとう"}]}"#).unwrap();
    });

    assert!(watcher.next_change(Duration::from_secs(10)), "change not seen");
    writer.join().unwrap();
}

#[test]
fn reload_after_change_keeps_previous_data_on_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("feedbacks.json");
    fs::write(&file, r#"{"feedbacks": [{"content": "ありがとう"}]}"#).unwrap();

    let mut session = Session::new(AnalysisEngine::new());
    session.load_path(&file).unwrap();
    let before = session.report().unwrap();

    fs::write(&file, "{ half written").unwrap();
    assert!(session.load_path(&file).is_err());
    assert_eq!(session.report().unwrap(), before);

    fs::write(&file, r#"{"feedbacks": [{"content": "難しい"}, {"content": "普通"}]}"#).unwrap();
    session.load_path(&file).unwrap();
    assert_eq!(session.report().unwrap().filtered_records, 2);
}

fn export_with_teachers(n: usize) -> String {
    let records: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"content": "x", "block": "講師{}先生の回"}}"#, i))
        .collect();
    format!(r#"{{"feedbacks": [{}]}}"#, records.join(","))
}

#[test]
fn reload_keeps_teacher_page() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("feedbacks.json");
    fs::write(&file, export_with_teachers(7)).unwrap();

    let mut session = Session::new(AnalysisEngine::new());
    session.load_path(&file).unwrap();
    session.dispatch(Intent::SetTeacherPage(1));
    assert_eq!(session.state().teacher_page, 1);

    fs::write(&file, export_with_teachers(12)).unwrap();
    session.reload_path(&file).unwrap();
    assert_eq!(session.state().teacher_page, 1);
    assert_eq!(session.report().unwrap().teachers.entries[0].rank, 6);

    fs::write(&file, "{ half written").unwrap();
    assert!(session.reload_path(&file).is_err());
    assert_eq!(session.state().teacher_page, 1);

    // fewer teachers: clamp to the last page
    fs::write(&file, export_with_teachers(3)).unwrap();
    session.reload_path(&file).unwrap();
    assert_eq!(session.state().teacher_page, 0);
}
