mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir, write_file};

#[test]
fn counter_tracks_union_and_intersection_across_batches() {
    let dir = temp_dir("marksheetd-counter");
    let a = write_file(&dir, "a.csv", "ROLL,Student Name\n1,Asha\n2,Ravi\n3,  asha \n");
    let b = write_file(&dir, "b.csv", "ROLL,Candidate Name\n1,RAVI\n2,Mina\n");
    let marks = write_file(&dir, "marks.csv", "ROLL,FNAME,MARKS\n1,Kumar,90\n");
    let bogus = dir.join("missing.xlsx");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "counter.process",
        json!({ "files": [a.to_string_lossy()], "includeNames": true }),
    );
    assert_eq!(first["report"]["union"], json!(2));
    assert_eq!(first["report"]["intersection"], json!(2));
    assert_eq!(first["names"]["union"], first["names"]["intersection"]);

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "counter.process",
        json!({
            "files": [a.to_string_lossy(), b.to_string_lossy(), marks.to_string_lossy(), bogus.to_string_lossy()],
            "includeNames": true
        }),
    );
    assert_eq!(second["report"]["union"], json!(3));
    assert_eq!(second["report"]["intersection"], json!(1));
    assert_eq!(second["report"]["processedFiles"], json!(3));
    assert_eq!(second["report"]["skipped"], json!(["marks.csv", "missing.xlsx"]));
    assert_eq!(second["names"]["intersection"], json!(["ravi"]));
    assert_eq!(second["names"]["union"], json!(["asha", "mina", "ravi"]));
    let files = second["report"]["files"].as_array().expect("files");
    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["name"], json!("b.csv"));
    assert_eq!(files[1]["uniqueNames"], json!(2));

    let status = request_ok(&mut stdin, &mut reader, "3", "counter.status", json!({}));
    assert_eq!(status["report"]["union"], json!(3));
    assert!(status["names"].is_null());

    let reset = request_ok(&mut stdin, &mut reader, "4", "counter.reset", json!({}));
    assert_eq!(reset["report"]["union"], json!(0));
    assert_eq!(reset["report"]["processedFiles"], json!(0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}
