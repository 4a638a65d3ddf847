//! 工单（Ordem de Serviço）数据模型

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::models::cell::CellValue;

/// “立即关闭”哨兵值
pub const CLOSE_NOW_SENTINEL: &str = "NOW";

/// 判定“停用”类工单的关键字（英文与葡语界面）
pub const DEACTIVATION_KEYWORDS: [&str; 2] = ["DEACTIV", "DESATIV"];

/// 文本是否包含停用关键字（忽略大小写）
pub fn mentions_deactivation(text: &str) -> bool {
    let upper = text.to_uppercase();
    DEACTIVATION_KEYWORDS.iter().any(|k| upper.contains(k))
}

/// 日期：结构化日期或原样字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DateValue {
    Date(NaiveDate),
    Raw(String),
}

impl DateValue {
    fn from_cell(cell: &CellValue) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        Some(match cell.to_date() {
            Some(d) => DateValue::Date(d),
            None => DateValue::Raw(cell.as_text().trim().to_string()),
        })
    }

    /// 表单格式 `DD/MM/YYYY`
    pub fn to_form_value(&self) -> String {
        match self {
            DateValue::Date(d) => d.format("%d/%m/%Y").to_string(),
            DateValue::Raw(s) => s.clone(),
        }
    }
}

/// 时间：结构化时间或原样字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TimeValue {
    Time(NaiveTime),
    Raw(String),
}

impl TimeValue {
    fn from_cell(cell: &CellValue) -> Option<Self> {
        if cell.is_empty() {
            return None;
        }
        Some(match cell.to_time() {
            Some(t) => TimeValue::Time(t),
            None => TimeValue::Raw(cell.as_text().trim().to_string()),
        })
    }

    /// 表单格式 `HH:MM`
    pub fn to_form_value(&self) -> String {
        match self {
            TimeValue::Time(t) => t.format("%H:%M").to_string(),
            TimeValue::Raw(s) => s.clone(),
        }
    }
}

/// 关闭日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CloseDate {
    /// 指定日期
    On(DateValue),
    /// 点击“立即关闭”按钮，由系统填入当前时间
    Now,
}

/// 校验失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),
    #[error("必填字段为空: {0}")]
    EmptyField(&'static str),
}

/// 已校验的工单
///
/// 文本类字段均已去除首尾空白并转为大写；备注只去空白。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkOrder {
    pub tag: String,
    pub standard: String,
    pub start_date: DateValue,
    pub start_time: TimeValue,
    pub close_date: CloseDate,
    pub close_time: Option<TimeValue>,
    pub shop_type: String,
    pub order_type: String,
    pub complexity: String,
    pub reported_by: String,
    pub occurrence_type: String,
    pub occurrence_cause: String,
    pub notes: String,
    pub labor_completed: bool,
    pub technician: String,
    pub service_description: String,
}

impl WorkOrder {
    /// 关闭日期是否为 “NOW”
    pub fn is_closing_now(&self) -> bool {
        matches!(self.close_date, CloseDate::Now)
    }

    /// 是否为停用类工单（需要做重复检查）
    pub fn is_deactivation(&self) -> bool {
        mentions_deactivation(&self.order_type) || mentions_deactivation(&self.shop_type)
    }
}

/// 未校验的工单草稿，字段缺失为 `None`
#[derive(Debug, Clone, Default)]
pub struct WorkOrderDraft {
    pub tag: Option<String>,
    pub standard: Option<String>,
    pub start_date: Option<CellValue>,
    pub start_time: Option<CellValue>,
    pub close_date: Option<CellValue>,
    pub close_time: Option<CellValue>,
    pub shop_type: Option<String>,
    pub order_type: Option<String>,
    pub complexity: Option<String>,
    pub reported_by: Option<String>,
    pub occurrence_type: Option<String>,
    pub occurrence_cause: Option<String>,
    pub notes: Option<String>,
    pub labor_completed: Option<bool>,
    pub technician: Option<String>,
    pub service_description: Option<String>,
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| normalize(&v))
        .ok_or(ValidationError::MissingField(field))
}

impl WorkOrderDraft {
    /// 校验并规范化
    pub fn validate(self) -> Result<WorkOrder, ValidationError> {
        let tag = required_text(self.tag, "tag")?;
        if tag.is_empty() {
            return Err(ValidationError::EmptyField("tag"));
        }

        let start_date = self
            .start_date
            .as_ref()
            .ok_or(ValidationError::MissingField("start_date"))
            .and_then(|c| DateValue::from_cell(c).ok_or(ValidationError::EmptyField("start_date")))?;
        let start_time = self
            .start_time
            .as_ref()
            .ok_or(ValidationError::MissingField("start_time"))
            .and_then(|c| TimeValue::from_cell(c).ok_or(ValidationError::EmptyField("start_time")))?;

        let close_cell = self
            .close_date
            .ok_or(ValidationError::MissingField("close_date"))?;
        let close_date = match &close_cell {
            CellValue::Text(s) if normalize(s) == CLOSE_NOW_SENTINEL => CloseDate::Now,
            other => CloseDate::On(
                DateValue::from_cell(other).ok_or(ValidationError::EmptyField("close_date"))?,
            ),
        };
        let close_time = self.close_time.as_ref().and_then(TimeValue::from_cell);

        Ok(WorkOrder {
            tag,
            standard: required_text(self.standard, "standard")?,
            start_date,
            start_time,
            close_date,
            close_time,
            shop_type: required_text(self.shop_type, "shop_type")?,
            order_type: required_text(self.order_type, "order_type")?,
            complexity: required_text(self.complexity, "complexity")?,
            reported_by: required_text(self.reported_by, "reported_by")?,
            occurrence_type: required_text(self.occurrence_type, "occurrence_type")?,
            occurrence_cause: required_text(self.occurrence_cause, "occurrence_cause")?,
            notes: self.notes.map(|n| n.trim().to_string()).unwrap_or_default(),
            labor_completed: self
                .labor_completed
                .ok_or(ValidationError::MissingField("labor_completed"))?,
            technician: required_text(self.technician, "technician")?,
            service_description: required_text(self.service_description, "service_description")?,
        })
    }
}
