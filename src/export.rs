use crate::degree::{DegreeExport, DEGREE_COLUMNS};
use crate::sheet::OutRow;
use anyhow::Context;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub entries: Vec<String>,
}

/// Column order for a batch of rows: first-seen key order across all rows.
pub fn union_columns(rows: &[OutRow]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                out.push(key.clone());
            }
        }
    }
    out
}

pub fn csv_bytes<S: AsRef<str>>(headers: &[S], rows: &[OutRow], bom: bool) -> anyhow::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    if bom {
        buf.extend_from_slice(UTF8_BOM);
    }
    let names: Vec<&str> = headers.iter().map(|h| h.as_ref()).collect();
    {
        let mut w = csv::Writer::from_writer(&mut buf);
        w.write_record(&names).context("failed to write csv header")?;
        for row in rows {
            w.write_record(
                names
                    .iter()
                    .map(|h| row.get(h).map(String::as_str).unwrap_or("")),
            )
            .context("failed to write csv row")?;
        }
        w.flush().context("failed to flush csv")?;
    }
    Ok(buf)
}

fn create_output(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    File::create(path)
        .with_context(|| format!("failed to create output file {}", path.to_string_lossy()))
}

pub fn write_csv<S: AsRef<str>>(
    path: &Path,
    headers: &[S],
    rows: &[OutRow],
    bom: bool,
) -> anyhow::Result<ExportSummary> {
    let bytes = csv_bytes(headers, rows, bom)?;
    let mut file = create_output(path)?;
    file.write_all(&bytes)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    log::info!("wrote {} rows to {}", rows.len(), path.to_string_lossy());
    Ok(ExportSummary {
        path: path.to_path_buf(),
        rows: rows.len(),
        entries: Vec::new(),
    })
}

/// `{base}_trimmed.zip` holding `{base}_digilocker.csv` and `{base}_excel_safe.csv`.
pub fn write_degree_zip(out_dir: &Path, base: &str, export: &DegreeExport) -> anyhow::Result<ExportSummary> {
    let path = out_dir.join(format!("{}_trimmed.zip", base));
    let entries = vec![
        (format!("{}_digilocker.csv", base), export.rows.clone()),
        (format!("{}_excel_safe.csv", base), export.excel_safe_rows()),
    ];

    let mut zip = ZipWriter::new(create_output(&path)?);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, rows) in &entries {
        let bytes = csv_bytes(&DEGREE_COLUMNS, rows, true)?;
        zip.start_file(name.as_str(), opts)
            .with_context(|| format!("failed to start zip entry {}", name))?;
        zip.write_all(&bytes)
            .with_context(|| format!("failed to write zip entry {}", name))?;
    }
    zip.finish().context("failed to finalize zip archive")?;

    log::info!("wrote {} degree rows to {}", export.rows.len(), path.to_string_lossy());
    Ok(ExportSummary {
        path,
        rows: export.rows.len(),
        entries: entries.into_iter().map(|(name, _)| name).collect(),
    })
}

/// File name without a `.csv`/`.xls`/`.xlsx` extension.
pub fn file_stem(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if ["csv", "xls", "xlsx"].contains(&ext.to_ascii_lowercase().as_str()) =>
        {
            stem.to_string()
        }
        _ => base.to_string(),
    }
}

/// Replaces characters that cannot appear in a file name.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn row(pairs: &[(&str, &str)]) -> OutRow {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{}-{}-{}", prefix, std::process::id(), nanos));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn union_keeps_first_seen_order() {
        let rows = vec![
            row(&[("A", "1"), ("SUB1", "x")]),
            row(&[("A", "2"), ("SUB1", "y"), ("SUB2", "z")]),
        ];
        assert_eq!(union_columns(&rows), vec!["A", "SUB1", "SUB2"]);
    }

    #[test]
    fn csv_has_optional_bom_and_blank_fill() {
        let rows = vec![row(&[("A", "1")]), row(&[("B", "x,y")])];
        let headers = union_columns(&rows);
        let plain = csv_bytes(&headers, &rows, false).expect("csv");
        assert_eq!(String::from_utf8(plain).unwrap(), "A,B\n1,\n,\"x,y\"\n");
        let bom = csv_bytes(&headers, &rows, true).expect("csv");
        assert!(bom.starts_with(UTF8_BOM));
    }

    #[test]
    fn names() {
        assert_eq!(file_stem("/tmp/Results Sem 6.XLSX"), "Results Sem 6");
        assert_eq!(file_stem("notes.txt"), "notes.txt");
        assert_eq!(safe_file_name("B.Ed./M.Ed.: final"), "B.Ed._M.Ed._ final");
    }

    #[test]
    fn degree_zip_has_both_variants() {
        let dir = temp_dir("marksheetd-degree-zip");
        let export = DegreeExport {
            rows: vec![DEGREE_COLUMNS
                .iter()
                .map(|c| (*c, if *c == "DOB" { "01/02/2003".to_string() } else { String::new() }))
                .collect()],
        };
        let summary = write_degree_zip(&dir, "batch", &export).expect("zip");
        assert_eq!(summary.path, dir.join("batch_trimmed.zip"));

        let file = File::open(&summary.path).expect("open zip");
        let mut zip = zip::ZipArchive::new(file).expect("read zip");
        assert_eq!(zip.len(), 2);
        let mut safe = String::new();
        zip.by_name("batch_excel_safe.csv")
            .expect("entry")
            .read_to_string(&mut safe)
            .expect("read entry");
        assert!(safe.contains("\"=\"\"01/02/2003\"\"\""));
        let mut plain = String::new();
        zip.by_name("batch_digilocker.csv")
            .expect("entry")
            .read_to_string(&mut plain)
            .expect("read entry");
        assert!(plain.contains(",01/02/2003,"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
