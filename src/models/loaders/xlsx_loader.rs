use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::models::cell::CellValue;
use crate::models::work_order::{WorkOrder, WorkOrderDraft, CLOSE_NOW_SENTINEL};

/// 表头对应的列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Tag,
    Standard,
    StartDate,
    StartTime,
    EndTime,
    ShopType,
    OrderType,
    Complexity,
    ReportedBy,
    OccurrenceType,
    OccurrenceCause,
    Notes,
    LaborCompleted,
    Technician,
    ServiceDescription,
}

/// 表头 → 列（精确匹配）
static COLUMNS: phf::Map<&'static str, Column> = phf::phf_map! {
    "Tag" => Column::Tag,
    "Padrão" => Column::Standard,
    "Data Início" => Column::StartDate,
    "Hora Início" => Column::StartTime,
    "Hora Fim" => Column::EndTime,
    "Tipo de Oficina" => Column::ShopType,
    "Tipo de Ordem" => Column::OrderType,
    "Complexidade" => Column::Complexity,
    "Reclamante" => Column::ReportedBy,
    "Tipo de Ocorrência" => Column::OccurrenceType,
    "Causa da ocorrência" => Column::OccurrenceCause,
    "Observações" => Column::Notes,
    "Check Mão de Obra" => Column::LaborCompleted,
    "Técnico Responsável" => Column::Technician,
    "Serviço Realizado" => Column::ServiceDescription,
};

/// 一行数据：列 → 单元格
type Row = HashMap<Column, CellValue>;

/// 读取工作簿第一个工作表并转换为工单列表
///
/// 校验失败的行会被丢弃并记录警告
pub fn load_work_orders(path: &Path) -> Result<Vec<WorkOrder>> {
    tracing::info!("📖 正在读取文件: {}", path.display());

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("无法打开工作簿: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("工作簿中没有工作表: {}", path.display()))?
        .with_context(|| format!("无法读取第一个工作表: {}", path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let records: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    let orders = work_orders_from_rows(&headers, records);
    tracing::info!("✓ {} 个工单待处理", orders.len());
    Ok(orders)
}

/// 按表头把原始行映射为工单
pub fn work_orders_from_rows(headers: &[String], records: Vec<Vec<CellValue>>) -> Vec<WorkOrder> {
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| COLUMNS.get(h.as_str()).copied())
        .collect();

    let mut orders = Vec::new();
    for (line, record) in records.into_iter().enumerate() {
        let row: Row = columns
            .iter()
            .zip(record)
            .filter_map(|(col, cell)| col.map(|c| (c, cell)))
            .collect();

        if row.values().all(CellValue::is_empty) {
            continue;
        }

        let tag_hint = row
            .get(&Column::Tag)
            .map(CellValue::as_text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "行无 TAG".to_string());

        match draft_from_row(row).validate() {
            Ok(order) => orders.push(order),
            Err(e) => {
                tracing::warn!("⚠️ 忽略第 {} 行工单 '{}': {}", line + 2, tag_hint, e);
            }
        }
    }
    orders
}

fn draft_from_row(mut row: Row) -> WorkOrderDraft {
    let text = |col: Column| row.get(&col).map(CellValue::as_text);

    let tag = text(Column::Tag);
    let standard = text(Column::Standard);
    let shop_type = text(Column::ShopType);
    let order_type = text(Column::OrderType);
    let complexity = text(Column::Complexity);
    let reported_by = text(Column::ReportedBy);
    let occurrence_type = text(Column::OccurrenceType);
    let occurrence_cause = text(Column::OccurrenceCause);
    let notes = text(Column::Notes);
    let technician = text(Column::Technician);
    let service_description = text(Column::ServiceDescription);

    let labor_completed = row.get(&Column::LaborCompleted).map(CellValue::to_bool);
    let start_date = row.remove(&Column::StartDate);
    let start_time = row.remove(&Column::StartTime);
    let end_time = row.remove(&Column::EndTime);

    // “Hora Fim” 为 NOW 时关闭日期也是 NOW；否则默认与开始日期同一天
    let closing_now = matches!(
        &end_time,
        Some(CellValue::Text(s)) if s.trim().to_uppercase() == CLOSE_NOW_SENTINEL
    );
    let (close_date, close_time) = if closing_now {
        (Some(CellValue::Text(CLOSE_NOW_SENTINEL.to_string())), None)
    } else {
        (start_date.clone(), end_time)
    };

    WorkOrderDraft {
        tag,
        standard,
        start_date,
        start_time,
        close_date,
        close_time,
        shop_type,
        order_type,
        complexity,
        reported_by,
        occurrence_type,
        occurrence_cause,
        notes,
        labor_completed,
        technician,
        service_description,
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::from_datetime)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) => chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(CellValue::from_datetime)
            .unwrap_or_else(|_| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
