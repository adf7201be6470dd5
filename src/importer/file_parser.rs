// ==========================================
// 销售导入门户 - 文件解析器实现
// ==========================================
// 职责: 上传文件 → RawTable（首行为表头，单元格已 trim）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::domain::upload::RawTable;
use crate::importer::date_parser::format_date;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::ingest_trait::FileParser;
use calamine::{open_workbook_auto, Data, DataType, ExcelDateTime, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|v| v.is_empty())
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头作为第一行保留
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            if rows.is_empty() {
                // 去掉 Excel 导出的 UTF-8 BOM
                if let Some(first) = row.first_mut() {
                    *first = first.trim_start_matches('\u{feff}').to_string();
                }
            } else if is_blank(&row) {
                // 跳过完全空白的数据行
                continue;
            }

            rows.push(row);
        }

        Ok(RawTable::new(rows))
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        format_date(dt.date())
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Excel 序列日期 → 文本；小于 1 的序列值只有时间部分
fn excel_datetime_text(dt: &ExcelDateTime) -> Option<String> {
    if !dt.is_datetime() {
        return None;
    }
    let value = dt.as_datetime()?;
    if dt.as_f64() < 1.0 {
        return Some(value.format("%H:%M:%S").to_string());
    }
    Some(format_datetime(value))
}

/// 单元格 → 文本（日期单元格输出 YYYY-MM-DD，避免落成序列号）
fn cell_text(cell: &Data) -> String {
    let formatted = match cell {
        Data::DateTime(dt) => excel_datetime_text(dt),
        Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(format_datetime)
            .or_else(|| cell.as_date().map(format_date)),
        _ => None,
    };
    formatted
        .unwrap_or_else(|| cell.to_string())
        .trim()
        .to_string()
}

// ==========================================
// Excel Parser 实现（读取第一个工作表）
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first().cloned() else {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for data_row in range.rows() {
            let row: Vec<String> = data_row.iter().map(cell_text).collect();

            if !rows.is_empty() && is_blank(&row) {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无数据行".to_string()));
        }

        Ok(RawTable::new(rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        match extension(file_path).as_str() {
            "csv" => CsvParser.parse_table(file_path),
            "xlsx" | "xls" => ExcelParser.parse_table(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
