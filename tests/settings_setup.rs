mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn setup_sections_round_trip_through_ipc() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let initial = request_ok(&mut stdin, &mut reader, "1", "setup.get", json!({}));
    assert_eq!(initial["limits"]["maxUploadBytes"], json!(10 * 1024 * 1024));
    assert_eq!(initial["nad"]["defaultTermType"], json!("ANNUAL"));
    assert_eq!(initial["nad"]["subjectSlots"], json!(20));
    assert_eq!(initial["cgpa"]["decimals"], json!(2));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "setup.update",
        json!({ "section": "cgpa", "patch": { "decimals": 3 } }),
    );
    let after = request_ok(&mut stdin, &mut reader, "3", "setup.get", json!({}));
    assert_eq!(after["cgpa"]["decimals"], json!(3));

    let bad = [
        json!({ "section": "printer", "patch": {} }),
        json!({ "section": "cgpa" }),
        json!({ "section": "cgpa", "patch": { "decimals": "two" } }),
        json!({ "section": "nad", "patch": { "subjectSlots": 10, "colour": "red" } }),
    ];
    for (i, params) in bad.into_iter().enumerate() {
        let code = request_err(&mut stdin, &mut reader, &format!("b{}", i), "setup.update", params);
        assert_eq!(code, "bad_params");
    }
    let unchanged = request_ok(&mut stdin, &mut reader, "4", "setup.get", json!({}));
    assert_eq!(unchanged["nad"]["subjectSlots"], json!(20));

    // Decimals apply to SGPA/CGPA text in the final export.
    let _ = request_ok(&mut stdin, &mut reader, "5", "cgpa.selectCourse", json!({ "course": "One Sem", "totalSems": 1 }));
    let up = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "cgpa.upload",
        json!({
            "semester": 1,
            "rows": [{ "REGN_NO": "A1", "TOTAL_CREDIT": 3, "TOTAL_CREDIT_POINT": 20 }],
            "outDir": std::env::temp_dir().to_string_lossy()
        }),
    );
    assert_eq!(up["final"]["preview"][0]["CGPA"], json!("6.667"));
    assert_eq!(up["final"]["preview"][0]["SGPA_SEM_1"], json!("6.667"));

    drop(stdin);
    let _ = child.wait();
}
