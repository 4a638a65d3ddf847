//! 表格单元格值及其类型转换

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// 从表格中读出的原始单元格
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Excel 日期时间拆分：纯时间单元格的日期部分落在 1900 年之前
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        if dt.date().year() < 1900 {
            CellValue::Time(dt.time())
        } else if dt.time() == NaiveTime::MIN {
            CellValue::Date(dt.date())
        } else {
            CellValue::DateTime(dt)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 转为文本，空单元格为空串
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.format("%d/%m/%Y").to_string(),
            CellValue::Time(t) => t.format("%H:%M").to_string(),
            CellValue::DateTime(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        }
    }

    /// 解析日期
    ///
    /// 支持原生日期、`DD/MM/YYYY`、`YYYY-MM-DD`、`DD-MM-YYYY`
    /// 以及数字形式的 `DDMMYYYY`（如 19012026）
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Number(n) => parse_compact_date(&format!("{}", n.trunc() as i64)),
            CellValue::Text(s) => {
                let s = s.trim();
                ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"]
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                    .or_else(|| parse_compact_date(s))
            }
            _ => None,
        }
    }

    /// 解析时间，支持原生时间、`HH:MM`、`HH:MM:SS`
    pub fn to_time(&self) -> Option<NaiveTime> {
        match self {
            CellValue::Time(t) => Some(*t),
            CellValue::DateTime(dt) => Some(dt.time()),
            CellValue::Text(s) => {
                let s = s.trim();
                ["%H:%M", "%H:%M:%S"]
                    .iter()
                    .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
            }
            _ => None,
        }
    }

    /// 转为布尔值（用于“Check Mão de Obra”列）
    pub fn to_bool(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0,
            CellValue::Text(s) => !matches!(
                s.trim().to_uppercase().as_str(),
                "" | "0" | "N" | "NAO" | "NÃO" | "NO" | "FALSE" | "FALSO"
            ),
            _ => true,
        }
    }
}

fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let day = s[..2].parse().ok()?;
    let month = s[2..4].parse().ok()?;
    let year = s[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
