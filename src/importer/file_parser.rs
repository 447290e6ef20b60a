// ==========================================
// MBA 院校数据后台 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls)
// 约束: 第一行为表头；行号为原始文件行号（表头为第 1 行）
//       全空行跳过但占用行号；单元格 TRIM
// ==========================================

use crate::domain::entity::RawRow;
use crate::importer::error::{ImportError, ImportOpResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Reader, Sheets};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// 按表头组装一行；超出表头宽度的非空值记入 overflow
fn build_row(row_number: usize, headers: &[String], cells: impl Iterator<Item = String>) -> RawRow {
    let mut row = RawRow::new(row_number);
    for (col_idx, value) in cells.enumerate() {
        match headers.get(col_idx) {
            Some(header) => row.push(header, &value),
            None => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    row.overflow.push(trimmed.to_string());
                }
            }
        }
    }
    row
}

fn check_headers(headers: &[String]) -> ImportOpResult<()> {
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeader);
    }
    Ok(())
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    fn read<R: Read>(&self, source: R) -> ImportOpResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        check_headers(&headers)?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // 行号取记录在文件中的起始行：csv 会吞掉空行，带引号的单元格可跨行
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            let row = build_row(row_number, &headers, record.iter().map(|s| s.to_string()));

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        debug!(rows = rows.len(), columns = headers.len(), "CSV 解析完成");
        Ok(rows)
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportOpResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let ext = extension_of(&file_path.to_string_lossy());
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.read(file)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportOpResult<Vec<RawRow>> {
        self.read(bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 读取第一个工作表
    fn read<RS: Read + Seek>(&self, workbook: &mut Sheets<RS>) -> ImportOpResult<Vec<RawRow>> {
        let sheet_names = workbook.sheet_names().to_vec();
        let sheet_name = sheet_names
            .first()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(sheet_name)?;
        // Range 从第一个非空单元格开始，需加上起始行偏移
        let base_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let mut sheet_rows = range.rows();
        let header_row = sheet_rows.next().ok_or(ImportError::MissingHeader)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        check_headers(&headers)?;

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let row_number = base_row + idx + 2;
            let row = build_row(row_number, &headers, data_row.iter().map(|c| c.to_string()));
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportOpResult<Vec<RawRow>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let ext = extension_of(&file_path.to_string_lossy());
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        self.read(&mut workbook)
    }

    fn parse_bytes(&self, bytes: &[u8]) -> ImportOpResult<Vec<RawRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        self.read(&mut workbook)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    fn parser_for(ext: &str) -> ImportOpResult<Box<dyn FileParser>> {
        match ext {
            "csv" => Ok(Box::new(CsvParser)),
            "xlsx" | "xls" => Ok(Box::new(ExcelParser)),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportOpResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        let ext = extension_of(&path.to_string_lossy());
        Self::parser_for(&ext)?.parse_to_raw_rows(path)
    }

    /// 解析上传内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（仅用于判断格式）
    /// - bytes: 文件内容
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportOpResult<Vec<RawRow>> {
        let ext = extension_of(file_name);
        Self::parser_for(&ext)?.parse_bytes(bytes)
    }
}
