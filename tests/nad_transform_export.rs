mod test_support;

use serde_json::json;
use test_support::{cell, read_csv_file, request_err, request_ok, spawn_sidecar, temp_dir, write_file};

#[test]
fn transform_writes_op_csv_with_dense_subject_slots() {
    let dir = temp_dir("marksheetd-nad-transform");
    let input = write_file(
        &dir,
        "Result 2024.csv",
        concat!(
            "ENO,NAME,DOB_DD,DOB_MM,DOB_YYYY,GTOT,COD1,SUB1,EA1,T1_MAX,COD3,SUB3,T3,CODP2,SUBP2,P2,P2_MAX\n",
            "e1,Asha,5,2,2003,450,ENG101,English,45,50,,,,PHY-P,Physics Lab,40,50\n",
            "e2,Ravi,,,,,ENG101,English,38,50,HIN102,Hindi,61,,,,\n",
        ),
    );
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let code = request_err(&mut stdin, &mut reader, "1", "nad.transform", json!({ "path": input.to_string_lossy() }));
    assert_eq!(code, "missing_course_selection");

    let sel = request_ok(&mut stdin, &mut reader, "2", "nad.selectCourse", json!({ "course": "M.A. EDUCATION" }));
    assert_eq!(sel["nonCbcs"], json!(true));

    let res = request_ok(&mut stdin, &mut reader, "3", "nad.transform", json!({ "path": input.to_string_lossy() }));
    let out_path = dir.join("Result 2024_op.csv");
    assert_eq!(res["export"]["path"], json!(out_path.to_string_lossy()));
    assert_eq!(res["export"]["rows"], json!(2));

    let (bom, headers, rows) = read_csv_file(&out_path);
    assert!(!bom);
    assert!(headers.contains(&"SUB2_TOT".to_string()));

    let asha = &rows[0];
    assert_eq!(cell(&headers, asha, "COURSE_NAME"), "M.A. EDUCATION");
    assert_eq!(cell(&headers, asha, "REGN_NO"), "e1");
    assert_eq!(cell(&headers, asha, "CNAME"), "Asha");
    assert_eq!(cell(&headers, asha, "DOB"), "05-02-2003");
    assert_eq!(cell(&headers, asha, "TOT_MRKS_WRDS"), "FOUR HUNDRED FIFTY");
    assert_eq!(cell(&headers, asha, "TERM_TYPE"), "ANNUAL");
    assert_eq!(cell(&headers, asha, "SUB1"), "ENG101");
    assert_eq!(cell(&headers, asha, "SUB1NM"), "English");
    assert_eq!(cell(&headers, asha, "SUB1MAX"), "50");
    assert_eq!(cell(&headers, asha, "SUB1_TH_MRKS"), "45");
    assert!(!headers.contains(&"SUB1_CE_MRKS".to_string()));
    // Practical subject follows the theory subjects without a gap.
    assert_eq!(cell(&headers, asha, "SUB2"), "PHY-P");
    assert_eq!(cell(&headers, asha, "SUB2_TOT"), "40");

    let ravi = &rows[1];
    assert_eq!(cell(&headers, ravi, "SUB2"), "HIN102");
    assert_eq!(cell(&headers, ravi, "SUB2_TOT"), "61");
    assert_eq!(cell(&headers, ravi, "DOB"), "");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn settings_feed_the_transformer() {
    let dir = temp_dir("marksheetd-nad-settings");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "setup.update",
        json!({ "section": "nad", "patch": { "defaultTermType": "semester", "subjectSlots": 1 } }),
    );
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "nad.transform",
        json!({
            "course": "B.A.",
            "name": "inline.xlsx",
            "outDir": dir.to_string_lossy(),
            "rows": [{ "NAME": "Asha", "COD1": "A", "T1": 40, "COD2": "B", "T2": 50 }]
        }),
    );
    let preview = res["preview"].as_array().expect("preview");
    assert_eq!(preview[0]["TERM_TYPE"], json!("SEMESTER"));
    assert_eq!(preview[0]["SUB1_TOT"], json!("40"));
    assert!(preview[0].get("SUB2").is_none());
    assert!(dir.join("inline_op.csv").exists());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn abc_ids_report_rows_by_sheet_position() {
    let dir = temp_dir("marksheetd-abc");
    let input = write_file(
        &dir,
        "abc.csv",
        "NAME,ABC Account ID\nAsha,123456789012\nRavi,\nMina,12345\nKai,1.23456789012E+11\n",
    );
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(&mut stdin, &mut reader, "1", "nad.validateAbcIds", json!({ "path": input.to_string_lossy() }));
    assert_eq!(res["valid"], json!(false));
    assert_eq!(res["report"]["columnIndex"], json!(1));
    assert_eq!(res["report"]["checked"], json!(4));
    assert_eq!(
        res["report"]["errors"],
        json!([
            "Row 3: ABCID is missing.",
            "Row 4: ABCID must be exactly 12 digits. Found \"12345\"."
        ])
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(dir);
}
