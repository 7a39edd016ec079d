//! Security Module
//!
//! XLSXコンテナ（ZIPアーカイブ）読み込み時の制限を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃、過大な入力への対策を提供します。

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::XlsxMarkError;

/// アーカイブ読み込みの制限
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveLimits {
    /// 展開後の合計最大サイズ（バイト）
    /// デフォルト: 1GB
    pub max_decompressed_size: u64,
    /// アーカイブ内の最大エントリ数
    /// デフォルト: 10000
    pub max_entry_count: usize,
    /// 単一エントリの展開後最大サイズ（バイト）
    /// デフォルト: 100MB
    pub max_entry_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB
    pub max_input_size: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_entry_count: 10_000,
            max_entry_size: 104_857_600,   // 100MB
            max_input_size: 2_147_483_648, // 2GB
        }
    }
}

impl ArchiveLimits {
    /// 入力サイズを検証
    pub fn check_input_size(&self, len: u64) -> Result<(), XlsxMarkError> {
        if len > self.max_input_size {
            return Err(XlsxMarkError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                len, self.max_input_size
            )));
        }
        Ok(())
    }

    /// アーカイブ全体を検証
    ///
    /// エントリ数、各エントリのパスと展開後サイズ、展開後サイズの合計を検査します。
    /// 宣言サイズによる検査のため、実際の展開は行いません。
    pub fn check_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(), XlsxMarkError> {
        if archive.len() > self.max_entry_count {
            return Err(XlsxMarkError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                self.max_entry_count
            )));
        }

        let mut total: u64 = 0;
        for i in 0..archive.len() {
            let entry = archive
                .by_index_raw(i)
                .map_err(|e| XlsxMarkError::Zip(e.to_string()))?;

            validate_entry_path(entry.name()).map_err(|e| {
                XlsxMarkError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            let size = entry.size();
            if size > self.max_entry_size {
                return Err(XlsxMarkError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    entry.name(),
                    size,
                    self.max_entry_size
                )));
            }

            total = total.checked_add(size).ok_or_else(|| {
                XlsxMarkError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;
            if total > self.max_decompressed_size {
                return Err(XlsxMarkError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total, self.max_decompressed_size
                )));
            }
        }

        Ok(())
    }

    /// エントリを読み込む
    ///
    /// 宣言サイズを偽装したエントリに備え、`max_entry_size`を超えて読み込まない。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(Vec<u8>))` - エントリの内容
    /// * `Ok(None)` - エントリが存在しない場合
    pub fn read_entry<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        name: &str,
    ) -> Result<Option<Vec<u8>>, XlsxMarkError> {
        let entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(XlsxMarkError::Zip(e.to_string())),
        };

        let mut content = Vec::new();
        entry
            .take(self.max_entry_size.saturating_add(1))
            .read_to_end(&mut content)?;
        if content.len() as u64 > self.max_entry_size {
            return Err(XlsxMarkError::SecurityViolation(format!(
                "File '{}' exceeds maximum size when decompressed (max: {} bytes)",
                name, self.max_entry_size
            )));
        }
        Ok(Some(content))
    }
}

/// アーカイブ内のエントリパスを検証
///
/// パストラバーサル攻撃を防ぐため、`..`、絶対パス、バックスラッシュを含むパスを拒否します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合
pub(crate) fn validate_entry_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn archive_with(entries: &[(&str, &[u8])]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn test_validate_entry_path_valid() {
        assert!(validate_entry_path("xl/workbook.xml").is_ok());
        assert!(validate_entry_path("xl/worksheets/sheet1.xml").is_ok());
        assert!(validate_entry_path("xl/worksheets/_rels/sheet1.xml.rels").is_ok());
        // ".."を含むが親ディレクトリ参照ではない
        assert!(validate_entry_path("xl/media/image..png").is_ok());
    }

    #[test]
    fn test_validate_entry_path_rejects_hostile_paths() {
        assert!(validate_entry_path("").is_err());
        assert!(validate_entry_path("/etc/passwd").is_err());
        assert!(validate_entry_path("C:\\Windows\\system32").is_err());
        assert!(validate_entry_path("d:/xl/workbook.xml").is_err());
        assert!(validate_entry_path("../etc/passwd").is_err());
        assert!(validate_entry_path("xl/../../etc/passwd").is_err());
        assert!(validate_entry_path("xl\\workbook.xml").is_err());
    }

    #[test]
    fn test_check_input_size() {
        let limits = ArchiveLimits {
            max_input_size: 10,
            ..Default::default()
        };
        assert!(limits.check_input_size(10).is_ok());
        assert!(matches!(
            limits.check_input_size(11),
            Err(XlsxMarkError::SecurityViolation(_))
        ));
    }

    #[test]
    fn test_check_archive_entry_count() {
        let mut archive = archive_with(&[("a.xml", b"a"), ("b.xml", b"b"), ("c.xml", b"c")]);
        let limits = ArchiveLimits {
            max_entry_count: 2,
            ..Default::default()
        };
        let err = limits.check_archive(&mut archive).unwrap_err();
        assert!(err.to_string().contains("too many files"));

        assert!(ArchiveLimits::default().check_archive(&mut archive).is_ok());
    }

    #[test]
    fn test_check_archive_total_size() {
        let mut archive = archive_with(&[("a.xml", &[b'x'; 64]), ("b.xml", &[b'y'; 64])]);
        let limits = ArchiveLimits {
            max_decompressed_size: 100,
            ..Default::default()
        };
        let err = limits.check_archive(&mut archive).unwrap_err();
        assert!(err.to_string().contains("Total decompressed size"));
    }

    #[test]
    fn test_read_entry() {
        let mut archive = archive_with(&[("xl/workbook.xml", b"<workbook/>")]);
        let limits = ArchiveLimits::default();

        let content = limits.read_entry(&mut archive, "xl/workbook.xml").unwrap();
        assert_eq!(content.as_deref(), Some(&b"<workbook/>"[..]));
        assert!(limits.read_entry(&mut archive, "missing.xml").unwrap().is_none());

        let tight = ArchiveLimits {
            max_entry_size: 4,
            ..Default::default()
        };
        assert!(tight.read_entry(&mut archive, "xl/workbook.xml").is_err());
    }
}
