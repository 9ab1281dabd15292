//! Attendance report rendering.
//!
//! The engine hands a rendered table off as a document attachment; the
//! [`ReportRenderer`] trait is the seam a PDF backend can plug into. The
//! built-in [`TextTableRenderer`] produces a fixed-width plain-text table.

use presensi_core::PresensiResult;

/// One report row: a student and one cell per lesson hour.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub name: String,
    /// Status per hour, index 0 = hour 1. Blank when unmarked.
    pub hour_cells: Vec<String>,
}

/// Renders tabular attendance data into document bytes.
pub trait ReportRenderer: Send + Sync {
    fn render(
        &self,
        title: &str,
        date_label: &str,
        hour_count: usize,
        rows: &[ReportRow],
    ) -> PresensiResult<Vec<u8>>;

    /// File extension of the produced document (without dot).
    fn file_extension(&self) -> &'static str;
}

/// Plain-text table renderer.
pub struct TextTableRenderer;

impl ReportRenderer for TextTableRenderer {
    fn render(
        &self,
        title: &str,
        date_label: &str,
        hour_count: usize,
        rows: &[ReportRow],
    ) -> PresensiResult<Vec<u8>> {
        let name_width = rows
            .iter()
            .map(|r| r.name.chars().count())
            .chain(std::iter::once("Nama Siswa".len()))
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&format!("Tanggal: {date_label}\n\n"));

        out.push_str(&format!("{:<4} {:<name_width$}", "No.", "Nama Siswa"));
        for hour in 1..=hour_count {
            out.push_str(&format!(" {hour:>3}"));
        }
        out.push('\n');

        for (i, row) in rows.iter().enumerate() {
            out.push_str(&format!("{:<4} {:<name_width$}", i + 1, row.name));
            for cell_index in 0..hour_count {
                let cell = row
                    .hour_cells
                    .get(cell_index)
                    .map(String::as_str)
                    .unwrap_or("");
                out.push_str(&format!(" {cell:>3}"));
            }
            out.push('\n');
        }

        Ok(out.into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn row(name: &str, cells: &[&str]) -> ReportRow {
        ReportRow {
            name: name.to_string(),
            hour_cells: cells.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    #[test]
    fn test_renders_title_and_rows() {
        let rows = vec![row("Andi", &["h", "h", "s"]), row("Citra", &["h"])];
        let bytes = TextTableRenderer
            .render("Absensi Kelas 7A", "2026-08-17", 3, &rows)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("Absensi Kelas 7A\n"));
        assert!(text.contains("Tanggal: 2026-08-17"));
        assert!(text.contains("Andi"));
        assert!(text.contains("Citra"));
    }

    #[test]
    fn test_missing_cells_default_to_blank() {
        let rows = vec![row("Andi", &["h"])];
        let bytes = TextTableRenderer
            .render("Absensi", "2026-08-17", 4, &rows)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let data_line = text.lines().last().unwrap();
        // One marked hour, three blank ones; the line still spans 4 cells.
        assert_eq!(data_line.trim_end().split_whitespace().count(), 3);
    }

    #[test]
    fn test_empty_report() {
        let bytes = TextTableRenderer.render("Absensi", "hari ini", 9, &[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Nama Siswa"));
    }
}
