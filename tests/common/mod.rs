//! 内存中的假页面，模拟 Neovero 的窗口与 frame 状态
//!
//! - 主文档：搜索框、登录控件、窗口容器、表单窗口标题栏的关闭按钮
//! - frame[0]：设备窗口（打开按钮、关闭按钮、历史表格）
//! - frame[1]：工单表单（所有字段、保存按钮）
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value as JsonValue;

use neovero_os_automation::models::{CloseDate, DateValue, TimeValue};
use neovero_os_automation::{
    AppError, AppResult, Config, ElementRef, FrameRef, Key, PageDriver, Selector, Selectors,
    Timings, WorkOrder,
};

pub fn equipment_frame() -> FrameRef {
    FrameRef::child(vec![0])
}

pub fn form_frame() -> FrameRef {
    FrameRef::child(vec![1])
}

/// 测试用配置：所有停顿为零，截图写到临时目录
pub fn test_config(name: &str) -> Config {
    Config {
        data_dir: std::env::temp_dir().join(format!("neovero-test-{}-{}", name, std::process::id())),
        timings: Timings::immediate(),
        ..Config::default()
    }
}

pub fn order(tag: &str, order_type: &str) -> WorkOrder {
    WorkOrder {
        tag: tag.to_string(),
        standard: "PREVENTIVA".to_string(),
        start_date: DateValue::Date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
        start_time: TimeValue::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()),
        close_date: CloseDate::On(DateValue::Date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())),
        close_time: Some(TimeValue::Raw("10:15".to_string())),
        shop_type: "CLÍNICA".to_string(),
        order_type: order_type.to_string(),
        complexity: "BAIXA".to_string(),
        reported_by: "JOAO SILVA".to_string(),
        occurrence_type: "FALHA".to_string(),
        occurrence_cause: "DESGASTE".to_string(),
        notes: "Troca preventiva".to_string(),
        labor_completed: true,
        technician: "MARIA SOUZA".to_string(),
        service_description: "TROCA DE PEÇA".to_string(),
    }
}

#[derive(Debug)]
pub struct FakeState {
    pub windows: usize,
    pub equipment_open: bool,
    pub form_open: bool,
    pub history: Vec<String>,
    pub options: Vec<String>,
    pub labor_checked: bool,

    // 故障注入
    /// 第 N 次打开的表单中填写失败（从 1 开始）
    pub fail_fill_on_form: Option<usize>,
    /// 第 N 次搜索时浏览器会话丢失（从 1 开始）
    pub lose_session_on_search: Option<usize>,
    pub open_button_disabled: bool,
    /// 第 N 次点击打开按钮后表单没有出现
    pub form_fails_to_open_on: Option<usize>,
    /// 第 N 个表单的保存按钮被禁用
    pub save_disabled_on_form: Option<usize>,
    /// 第 N 个表单既不响应关闭按钮，也删不掉
    pub stuck_form_on: Option<usize>,
    pub form_closes_on_save: bool,
    pub removal_blocked: bool,

    // 记录
    pub pending_search: String,
    pub current_tag: Option<String>,
    pub searches: usize,
    pub windows_at_search: Vec<usize>,
    pub open_clicks: usize,
    pub forms_opened: usize,
    pub saved_tags: Vec<String>,
    pub fills: Vec<(Selector, String)>,
    pub selected: Vec<(Selector, String)>,
    pub close_now_clicks: usize,
    pub labor_clicks: usize,
    pub close_clicks: usize,
    pub forced_removals: usize,
    pub reloads: usize,
    pub neutral_clicks: usize,
    pub screenshots: Vec<PathBuf>,
    pub init_scripts: Vec<String>,
    pub visited: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            windows: 1,
            equipment_open: false,
            form_open: false,
            history: Vec::new(),
            options: [
                "SELECIONE",
                "CLÍNICA GERAL",
                "CORRETIVA - URGENTE",
                "CORRETIVA",
                "BAIXA",
                "JOAO SILVA",
                "FALHA ELÉTRICA",
                "DESGASTE NATURAL",
                "MARIA SOUZA",
                "TROCA DE PEÇA",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            labor_checked: false,
            fail_fill_on_form: None,
            lose_session_on_search: None,
            open_button_disabled: false,
            form_fails_to_open_on: None,
            save_disabled_on_form: None,
            stuck_form_on: None,
            form_closes_on_save: false,
            removal_blocked: false,
            pending_search: String::new(),
            current_tag: None,
            searches: 0,
            windows_at_search: Vec::new(),
            open_clicks: 0,
            forms_opened: 0,
            saved_tags: Vec::new(),
            fills: Vec::new(),
            selected: Vec::new(),
            close_now_clicks: 0,
            labor_clicks: 0,
            close_clicks: 0,
            forced_removals: 0,
            reloads: 0,
            neutral_clicks: 0,
            screenshots: Vec::new(),
            init_scripts: Vec::new(),
            visited: Vec::new(),
        }
    }
}

impl FakeState {
    fn form_stuck(&self) -> bool {
        self.form_open && self.stuck_form_on == Some(self.forms_opened)
    }

    fn close_form(&mut self) {
        if self.form_open {
            self.form_open = false;
            self.windows -= 1;
        }
    }

    fn close_equipment(&mut self) {
        if self.equipment_open {
            self.equipment_open = false;
            self.windows -= 1;
        }
    }

    fn reset_windows(&mut self) {
        self.windows = 1;
        self.equipment_open = false;
        self.form_open = false;
    }
}

pub struct FakePage {
    selectors: Selectors,
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::with_state(FakeState::default())
    }

    pub fn with_state(state: FakeState) -> Self {
        Self {
            selectors: Selectors::default(),
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// 模拟"已搜索设备"：设备窗口打开
    pub fn open_equipment(&self) {
        let mut state = self.state();
        if !state.equipment_open {
            state.equipment_open = true;
            state.windows += 1;
        }
    }

    /// 模拟"已打开工单表单"
    pub fn open_form(&self) {
        let mut state = self.state();
        if !state.form_open {
            state.form_open = true;
            state.windows += 1;
            state.forms_opened += 1;
        }
    }

    fn is_form_field(&self, selector: &Selector) -> bool {
        let s = &self.selectors;
        [
            &s.form_marker,
            &s.start_date_input,
            &s.start_time_input,
            &s.close_date_input,
            &s.close_time_input,
            &s.close_now_button,
            &s.shop_select,
            &s.order_type_select,
            &s.complexity_select,
            &s.reported_by_select,
            &s.occurrence_type_select,
            &s.occurrence_cause_select,
            &s.technician_select,
            &s.service_select,
            &s.labor_checkbox,
            &s.notes_input,
        ]
        .contains(&selector)
            || s.save_buttons.first() == Some(selector)
    }

    /// 表单窗口标题栏的关闭按钮（位于主文档）
    fn is_form_title_close(&self, selector: &Selector) -> bool {
        self.selectors.order_close_controls.first() == Some(selector)
    }

    /// 设备窗口内的关闭按钮
    fn is_equipment_close(&self, selector: &Selector) -> bool {
        self.selectors.close_controls.first() == Some(selector)
    }

    fn count_in(&self, state: &FakeState, frame: &FrameRef, selector: &Selector) -> usize {
        let s = &self.selectors;
        if frame.is_main() {
            if selector == &s.window_container {
                return state.windows;
            }
            if [&s.asset_search_input, &s.login_user, &s.login_password, &s.login_submit]
                .contains(&selector)
            {
                return 1;
            }
            if self.is_form_title_close(selector) && state.form_open {
                return 1;
            }
            return 0;
        }

        if *frame == equipment_frame() && state.equipment_open {
            if selector == &s.open_order_button || self.is_equipment_close(selector) {
                return 1;
            }
            if s.history_rows.first() == Some(selector) {
                return state.history.len();
            }
            return 0;
        }

        if *frame == form_frame() && state.form_open && self.is_form_field(selector) {
            return 1;
        }
        0
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> AppResult<()> {
        let mut state = self.state();
        state.visited.push(url.to_string());
        state.reset_windows();
        Ok(())
    }

    async fn reload(&self) -> AppResult<()> {
        let mut state = self.state();
        state.reloads += 1;
        state.reset_windows();
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> AppResult<()> {
        self.state().init_scripts.push(script.to_string());
        Ok(())
    }

    async fn frames(&self) -> AppResult<Vec<FrameRef>> {
        let state = self.state();
        let mut frames = vec![FrameRef::main()];
        if state.equipment_open {
            frames.push(equipment_frame());
        }
        if state.form_open {
            frames.push(form_frame());
        }
        Ok(frames)
    }

    async fn count(&self, frame: &FrameRef, selector: &Selector) -> AppResult<usize> {
        let state = self.state();
        Ok(self.count_in(&state, frame, selector))
    }

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool> {
        let state = self.state();
        Ok(self.count_in(&state, &element.frame, &element.selector) > element.index)
    }

    async fn is_enabled(&self, element: &ElementRef) -> AppResult<bool> {
        let state = self.state();
        let s = &self.selectors;
        if element.selector == s.open_order_button {
            return Ok(!state.open_button_disabled);
        }
        if s.save_buttons.first() == Some(&element.selector) {
            return Ok(state.save_disabled_on_form != Some(state.forms_opened));
        }
        Ok(true)
    }

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool> {
        let state = self.state();
        Ok(element.selector == self.selectors.labor_checkbox && state.labor_checked)
    }

    async fn click(&self, element: &ElementRef, _force: bool) -> AppResult<()> {
        let mut state = self.state();
        if self.count_in(&state, &element.frame, &element.selector) <= element.index {
            return Err(AppError::not_found(&element.selector, "fake click"));
        }

        let s = &self.selectors;
        let selector = &element.selector;
        if selector == &s.open_order_button {
            state.open_clicks += 1;
            if state.form_fails_to_open_on != Some(state.open_clicks) {
                state.form_open = true;
                state.windows += 1;
                state.forms_opened += 1;
            }
        } else if selector == &s.close_now_button {
            state.close_now_clicks += 1;
        } else if selector == &s.labor_checkbox {
            state.labor_clicks += 1;
            state.labor_checked = !state.labor_checked;
        } else if s.save_buttons.first() == Some(selector) {
            let tag = state.current_tag.clone().unwrap_or_default();
            state.saved_tags.push(tag);
            if state.form_closes_on_save {
                state.close_form();
            }
        } else if self.is_form_title_close(selector) {
            state.close_clicks += 1;
            if !state.form_stuck() {
                state.close_form();
            }
        } else if self.is_equipment_close(selector) {
            state.close_clicks += 1;
            state.close_equipment();
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()> {
        let mut state = self.state();
        if element.frame == form_frame() && state.fail_fill_on_form == Some(state.forms_opened) {
            return Err(AppError::Driver("campo bloqueado".into()));
        }
        if element.selector == self.selectors.asset_search_input {
            state.pending_search = value.to_string();
        }
        state.fills.push((element.selector.clone(), value.to_string()));
        Ok(())
    }

    async fn press(&self, element: &ElementRef, key: Key) -> AppResult<()> {
        let mut state = self.state();
        if element.selector == self.selectors.asset_search_input && key == Key::Enter {
            state.searches += 1;
            if state.lose_session_on_search == Some(state.searches) {
                return Err(AppError::Session("websocket closed".into()));
            }
            let windows = state.windows;
            state.windows_at_search.push(windows);
            state.current_tag = Some(state.pending_search.clone());
            if !state.equipment_open {
                state.equipment_open = true;
                state.windows += 1;
            }
        }
        Ok(())
    }

    async fn visible_texts(&self, frame: &FrameRef, selector: &Selector) -> AppResult<Vec<String>> {
        let state = self.state();
        if *frame == equipment_frame()
            && state.equipment_open
            && self.selectors.history_rows.first() == Some(selector)
        {
            return Ok(state.history.clone());
        }
        Ok(Vec::new())
    }

    async fn option_labels(&self, _element: &ElementRef) -> AppResult<Vec<String>> {
        Ok(self.state().options.clone())
    }

    async fn select_option(&self, element: &ElementRef, label: &str) -> AppResult<bool> {
        let mut state = self.state();
        if state.options.iter().any(|o| o == label) {
            state.selected.push((element.selector.clone(), label.to_string()));
            return Ok(true);
        }
        Ok(false)
    }

    async fn remove_all_but_first(&self, selector: &Selector) -> AppResult<usize> {
        let mut state = self.state();
        if *selector != self.selectors.window_container || state.removal_blocked || state.form_stuck() {
            return Ok(0);
        }
        let removed = state.windows.saturating_sub(1);
        state.forced_removals += 1;
        state.reset_windows();
        Ok(removed)
    }

    async fn click_at(&self, _x: f64, _y: f64) -> AppResult<()> {
        self.state().neutral_clicks += 1;
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> bool {
        true
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> bool {
        true
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        self.state().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> AppResult<JsonValue> {
        Ok(JsonValue::Null)
    }
}
