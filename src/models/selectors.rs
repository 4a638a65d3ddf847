//! Neovero 页面选择器映射
//!
//! 目标系统没有稳定的 DOM 契约，所有选择器集中在这里，
//! 可以通过 TOML 文件按字段覆盖。

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 逻辑选择器
///
/// TOML 写法：`save_button = { kind = "css", value = "#btnsalvar" }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Selector {
    /// CSS 选择器
    Css(String),
    /// XPath 表达式
    XPath(String),
    /// 按可见文本匹配（包含关系，忽略首尾空白）
    Text(String),
}

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        Selector::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Selector::XPath(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Selector::Text(value.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(v) => write!(f, "css={}", v),
            Selector::XPath(v) => write!(f, "xpath={}", v),
            Selector::Text(v) => write!(f, "text={}", v),
        }
    }
}

/// 全部页面选择器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    // --- 登录页 ---
    pub login_user: Selector,
    pub login_password: Selector,
    pub login_submit: Selector,

    // --- 侧边菜单 ---
    pub asset_search_input: Selector,

    // --- 设备窗口 ---
    pub open_order_button: Selector,
    /// 按钮 id 失效时按文本兜底
    pub open_order_text: Selector,
    /// 历史工单表格中的行
    pub history_rows: Vec<Selector>,

    // --- 窗口 ---
    /// 浮动窗口容器，第 0 个是常驻的主菜单窗口
    pub window_container: Selector,
    /// 关闭/取消控件，按优先级排列（具体 id 在前，通用文本在后）
    pub close_controls: Vec<Selector>,

    // --- 工单表单 ---
    /// 表单的标志字段（开单日期），出现即表示表单已打开
    pub form_marker: Selector,
    pub start_date_input: Selector,
    pub start_time_input: Selector,
    pub close_date_input: Selector,
    pub close_time_input: Selector,
    pub close_now_button: Selector,
    pub save_buttons: Vec<Selector>,
    pub order_close_controls: Vec<Selector>,

    pub shop_select: Selector,
    pub order_type_select: Selector,
    pub complexity_select: Selector,
    pub reported_by_select: Selector,
    pub occurrence_type_select: Selector,
    pub occurrence_cause_select: Selector,
    pub technician_select: Selector,
    pub service_select: Selector,
    pub labor_checkbox: Selector,
    pub notes_input: Selector,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            login_user: Selector::xpath(r#"//*[@id="login"]"#),
            login_password: Selector::xpath(r#"//*[@id="senha"]"#),
            login_submit: Selector::xpath(r#"//*[@id="formusuario"]/div[3]"#),

            asset_search_input: Selector::xpath(
                r#"//*[@id="side-menu"]/div[2]/nv-atalhos/div/div[2]/form/input"#,
            ),

            open_order_button: Selector::xpath(r#"//*[@id="btnAbrirOS_text"]"#),
            open_order_text: Selector::text("Abrir OS"),
            history_rows: vec![
                Selector::css("tr"),
                Selector::css("[role='row']"),
                Selector::css(".row"),
            ],

            window_container: Selector::css("nv-window"),
            close_controls: vec![
                Selector::xpath(r#"//*[@id="btnFechar_text"]"#),
                Selector::xpath(r#"//*[@id="btnCancelar_text"]"#),
                Selector::css("nv-window a[title='Fechar']"),
                Selector::css(".nv-window-close"),
                Selector::text("Fechar"),
            ],

            form_marker: Selector::xpath(r#"//*[@id="txtdataabertura"]"#),
            start_date_input: Selector::xpath(r#"//*[@id="txtdataabertura"]"#),
            start_time_input: Selector::xpath(r#"//*[@id="txthoraabertura"]"#),
            close_date_input: Selector::xpath(r#"//*[@id="txtdatafechamento"]"#),
            close_time_input: Selector::xpath(r#"//*[@id="txthorafechamento"]"#),
            close_now_button: Selector::xpath(r#"//*[@id="btnDataFechamentoHoje"]"#),
            save_buttons: vec![
                Selector::xpath(r#"//*[@id="btnsalvar"]"#),
                Selector::xpath(r#"//*[@id="btnsalvar_container"]"#),
            ],
            order_close_controls: vec![
                Selector::xpath(
                    "/html/body/nv-root/nv-desktop/div/div[2]/nv-window[2]/div/div[1]/div[1]/div[3]/a[4]",
                ),
                Selector::xpath(r#"//*[@id="btnFechar_text"]"#),
                Selector::css("nv-window a[title='Fechar']"),
                Selector::text("Fechar"),
            ],

            shop_select: Selector::xpath(r#"//*[@id="cboOficina"]"#),
            order_type_select: Selector::xpath(r#"//*[@id="cbotipomanutencao"]"#),
            complexity_select: Selector::xpath(r#"//*[@id="cbocomplexidadeos"]"#),
            reported_by_select: Selector::xpath(r#"//*[@id="cboUsuario"]"#),
            occurrence_type_select: Selector::xpath(r#"//*[@id="cboOcorrencia"]"#),
            occurrence_cause_select: Selector::xpath(r#"//*[@id="cboCausa"]"#),
            technician_select: Selector::xpath(r#"//*[@id="cbofuncionario"]"#),
            service_select: Selector::xpath(r#"//*[@id="ddlservico"]"#),
            labor_checkbox: Selector::xpath(r#"//*[@id="chkOcorrenciaResolvidaMaoDeObra"]"#),
            notes_input: Selector::xpath(r#"//*[@id="txtObservacaoOcorrencia"]"#),
        }
    }
}

impl Selectors {
    /// 从 TOML 文件加载选择器，未出现的字段保持默认值
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取选择器文件: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("无法解析选择器文件: {}", path.display()))
    }

    /// 从 TOML 文本解析
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
