//! Main-menu text and shared reply fragments.

pub(crate) const MAIN_MENU: &str = "📢 Sistem Informasi Guru.\n\n\
📚 *Menu Utama* 📚\n\n\
1️⃣ *#1. Jadwal Pelajaran*\n\
2️⃣ *#2. Absensi Kehadiran/Pulang*\n\
3️⃣ *#3. Absensi Siswa*\n\
4️⃣ *#4. Rekap Absensi*\n\
5️⃣ *#5. Absensi Kelas*\n\n\
Silahkan ketik angka dengan tanda pagar (#) yang sesuai:\n\
Contoh: *'#1' untuk Jadwal Pelajaran*";

pub(crate) const MSG_UNKNOWN_COMMAND: &str =
    "Perintah tidak dikenal. Ketik #home untuk kembali ke menu utama.";

pub(crate) const MSG_TEACHER_NOT_FOUND: &str = "Guru dengan nomor HP tersebut tidak ditemukan.";

pub(crate) const MSG_CONFIG_NOT_FOUND: &str = "Pengaturan jadwal tidak ditemukan.";

pub(crate) const MSG_INVALID_CHOICE: &str = "Pilihan tidak valid. Silakan coba lagi.";

/// Resolves a 1-based menu selection against `len` options.
pub(crate) fn parse_index(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    if n >= 1 && n <= len {
        Some(n - 1)
    } else {
        None
    }
}

/// Renders hour numbers as a comma list, e.g. `3,4,5`.
pub(crate) fn join_hours(hours: &[u8]) -> String {
    hours
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_accepts_one_based_range() {
        assert_eq!(parse_index("1", 3), Some(0));
        assert_eq!(parse_index(" 3 ", 3), Some(2));
    }

    #[test]
    fn test_parse_index_rejects_out_of_range() {
        assert_eq!(parse_index("0", 3), None);
        assert_eq!(parse_index("4", 3), None);
        assert_eq!(parse_index("abc", 3), None);
        assert_eq!(parse_index("1", 0), None);
    }

    #[test]
    fn test_join_hours() {
        assert_eq!(join_hours(&[3, 4, 5]), "3,4,5");
        assert_eq!(join_hours(&[7]), "7");
    }
}
