//! chromiumoxide 页面驱动
//!
//! 跨 frame 的 DOM 操作全部通过页面脚本完成：从顶层 `window` 按下标路径
//! 逐级进入 `frames[i]`，再在该文档中解析选择器。按键和坐标点击走 CDP 输入事件。

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::ScreenshotParams;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::page_driver::{ElementRef, FrameRef, Key, PageDriver};
use crate::models::selectors::Selector;

/// 所有脚本共用的 DOM 辅助函数
const PRELUDE: &str = r#"
const __nv = {
  doc(path) {
    let w = window;
    for (const i of path) {
      if (!w.frames || i >= w.frames.length) return null;
      w = w.frames[i];
    }
    try { return w.document; } catch (e) { return null; }
  },
  all(doc, sel) {
    if (!doc) return [];
    if (sel.kind === 'css') return Array.from(doc.querySelectorAll(sel.value));
    if (sel.kind === 'xpath') {
      const r = doc.evaluate(sel.value, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
      const out = [];
      for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i));
      return out;
    }
    const needle = sel.value.trim();
    return Array.from(doc.querySelectorAll('body *')).filter(el =>
      Array.from(el.childNodes).some(n => n.nodeType === 3 && n.textContent.trim().includes(needle)));
  },
  pick(path, sel, idx) {
    return __nv.all(__nv.doc(path), sel)[idx] || null;
  },
  visible(el) {
    if (!el || !el.isConnected) return false;
    const style = el.ownerDocument.defaultView.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  },
  enabled(el) {
    return !el.disabled
      && el.getAttribute('aria-disabled') !== 'true'
      && !el.classList.contains('disabled');
  },
  setValue(el, value) {
    const desc = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
    if (desc && desc.set) desc.set.call(el, value); else el.value = value;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
  },
};
"#;

const FRAMES_JS: &str = r#"
const out = [[]];
const walk = (w, path) => {
  let n = 0;
  try { n = w.frames.length; } catch (e) { return; }
  for (let i = 0; i < n; i++) {
    const child = w.frames[i];
    const p = path.concat([i]);
    try { void child.document.readyState; } catch (e) { continue; }
    out.push(p);
    walk(child, p);
  }
};
walk(window, []);
return out;
"#;

const COUNT_JS: &str = "return __nv.all(__nv.doc(__frame), __sel).length;";

const VISIBLE_JS: &str = "return __nv.visible(__nv.pick(__frame, __sel, __idx));";

const ENABLED_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
return !!el && __nv.enabled(el);
"#;

const CHECKED_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
return !!el && !!el.checked;
"#;

const CLICK_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
if (!el) return 'missing';
if (!__arg && !__nv.visible(el)) return 'hidden';
if (el.scrollIntoView) el.scrollIntoView({ block: 'center' });
el.click();
return 'ok';
"#;

const FILL_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
if (!el) return 'missing';
el.focus();
__nv.setValue(el, '');
__nv.setValue(el, __arg);
return 'ok';
"#;

const FOCUS_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
if (!el) return 'missing';
el.focus();
return 'ok';
"#;

const VISIBLE_TEXTS_JS: &str = r#"
return __nv.all(__nv.doc(__frame), __sel)
  .filter(el => __nv.visible(el))
  .map(el => el.innerText || el.textContent || '');
"#;

const OPTION_LABELS_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
if (!el) return null;
return Array.from(el.options || []).map(o => o.text);
"#;

const SELECT_OPTION_JS: &str = r#"
const el = __nv.pick(__frame, __sel, __idx);
if (!el) return 'missing';
const opt = Array.from(el.options || []).find(o => o.text.trim() === String(__arg).trim());
if (!opt) return 'nomatch';
el.value = opt.value;
opt.selected = true;
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return 'ok';
"#;

const REMOVE_ALL_BUT_FIRST_JS: &str = r#"
const els = __nv.all(document, __sel);
els.forEach((el, i) => { if (i > 0) el.remove(); });
return Math.max(els.length - 1, 0);
"#;

// 资源计时缓冲区默认只有 250 条，每次读取后清空，只统计两次轮询之间的新请求
const LOAD_STATE_JS: &str = r#"
const fresh = performance.getEntriesByType('resource').length;
performance.clearResourceTimings();
return {
  ready: document.readyState,
  fresh,
};
"#;

/// 网络空闲判定：资源条目数在该时长内保持不变
const NETWORK_QUIET: Duration = Duration::from_millis(500);
const NETWORK_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct LoadState {
    ready: String,
    /// 上次读取以来新增的资源请求数
    fresh: usize,
}

/// 网络空闲判定：文档加载完成，且连续 `NETWORK_QUIET` 没有新的资源请求
#[derive(Debug)]
struct IdleTracker {
    quiet_since: Instant,
}

impl IdleTracker {
    fn new(now: Instant) -> Self {
        Self { quiet_since: now }
    }

    fn observe(&mut self, state: &LoadState, now: Instant) -> bool {
        if state.ready != "complete" || state.fresh > 0 {
            self.quiet_since = now;
            return false;
        }
        now.duration_since(self.quiet_since) >= NETWORK_QUIET
    }
}

/// 基于 chromiumoxide 的页面驱动
#[derive(Clone)]
pub struct ChromiumDriver {
    executor: JsExecutor,
}

impl ChromiumDriver {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 组装脚本：公共辅助函数 + 参数 + 主体
    fn script(frame: &FrameRef, selector: &Selector, index: usize, arg: JsonValue, body: &str) -> String {
        format!(
            "(() => {{\n{}\nconst __frame = {};\nconst __sel = {};\nconst __idx = {};\nconst __arg = {};\n{}\n}})()",
            PRELUDE,
            json!(frame.path()),
            json!(selector),
            index,
            arg,
            body
        )
    }

    async fn run<T: DeserializeOwned>(
        &self,
        frame: &FrameRef,
        selector: &Selector,
        index: usize,
        arg: JsonValue,
        body: &str,
    ) -> AppResult<T> {
        self.executor
            .eval_as(Self::script(frame, selector, index, arg, body))
            .await
    }

    async fn run_on(&self, element: &ElementRef, arg: JsonValue, body: &str) -> AppResult<()> {
        let status: String = self
            .run(&element.frame, &element.selector, element.index, arg, body)
            .await?;
        match status.as_str() {
            "ok" => Ok(()),
            "hidden" => Err(AppError::NotInteractable {
                selector: element.selector.clone(),
            }),
            _ => Err(AppError::not_found(&element.selector, "页面驱动")),
        }
    }

    async fn load_state(&self) -> AppResult<LoadState> {
        self.executor
            .eval_as(format!("(() => {{\n{}\n}})()", LOAD_STATE_JS))
            .await
    }

    async fn dispatch_key(&self, key: Key) -> AppResult<()> {
        let (name, code, vk, text) = match key {
            Key::Tab => ("Tab", "Tab", 9, None),
            Key::Enter => ("Enter", "Enter", 13, Some("\r")),
        };

        let mut key_down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(name)
            .code(code)
            .windows_virtual_key_code(vk);
        if let Some(text) = text {
            key_down = key_down.text(text);
        }
        let key_down = key_down.build().map_err(AppError::Driver)?;
        self.executor.page().execute(key_down).await?;

        let key_up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(name)
            .code(code)
            .windows_virtual_key_code(vk)
            .build()
            .map_err(AppError::Driver)?;
        self.executor.page().execute(key_up).await?;

        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> AppResult<()> {
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn reload(&self) -> AppResult<()> {
        self.executor.page().reload().await?;
        Ok(())
    }

    async fn add_init_script(&self, script: &str) -> AppResult<()> {
        self.executor
            .page()
            .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await?;
        Ok(())
    }

    async fn frames(&self) -> AppResult<Vec<FrameRef>> {
        let paths: Vec<Vec<usize>> = self
            .executor
            .eval_as(format!("(() => {{\n{}\n}})()", FRAMES_JS))
            .await?;
        Ok(paths.into_iter().map(FrameRef::child).collect())
    }

    async fn count(&self, frame: &FrameRef, selector: &Selector) -> AppResult<usize> {
        self.run(frame, selector, 0, JsonValue::Null, COUNT_JS).await
    }

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool> {
        self.run(&element.frame, &element.selector, element.index, JsonValue::Null, VISIBLE_JS)
            .await
    }

    async fn is_enabled(&self, element: &ElementRef) -> AppResult<bool> {
        self.run(&element.frame, &element.selector, element.index, JsonValue::Null, ENABLED_JS)
            .await
    }

    async fn is_checked(&self, element: &ElementRef) -> AppResult<bool> {
        self.run(&element.frame, &element.selector, element.index, JsonValue::Null, CHECKED_JS)
            .await
    }

    async fn click(&self, element: &ElementRef, force: bool) -> AppResult<()> {
        debug!("点击 {} (force: {})", element, force);
        self.run_on(element, json!(force), CLICK_JS).await
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> AppResult<()> {
        debug!("填写 {} = {:?}", element, value);
        self.run_on(element, json!(value), FILL_JS).await
    }

    async fn press(&self, element: &ElementRef, key: Key) -> AppResult<()> {
        self.run_on(element, JsonValue::Null, FOCUS_JS).await?;
        self.dispatch_key(key).await
    }

    async fn visible_texts(&self, frame: &FrameRef, selector: &Selector) -> AppResult<Vec<String>> {
        self.run(frame, selector, 0, JsonValue::Null, VISIBLE_TEXTS_JS).await
    }

    async fn option_labels(&self, element: &ElementRef) -> AppResult<Vec<String>> {
        let labels: Option<Vec<String>> = self
            .run(&element.frame, &element.selector, element.index, JsonValue::Null, OPTION_LABELS_JS)
            .await?;
        labels.ok_or_else(|| AppError::not_found(&element.selector, "下拉框"))
    }

    async fn select_option(&self, element: &ElementRef, label: &str) -> AppResult<bool> {
        let status: String = self
            .run(&element.frame, &element.selector, element.index, json!(label), SELECT_OPTION_JS)
            .await?;
        match status.as_str() {
            "ok" => Ok(true),
            "nomatch" => Ok(false),
            _ => Err(AppError::not_found(&element.selector, "下拉框")),
        }
    }

    async fn remove_all_but_first(&self, selector: &Selector) -> AppResult<usize> {
        self.run(&FrameRef::main(), selector, 0, JsonValue::Null, REMOVE_ALL_BUT_FIRST_JS)
            .await
    }

    async fn click_at(&self, x: f64, y: f64) -> AppResult<()> {
        self.executor.page().click(Point::new(x, y)).await?;
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut tracker = IdleTracker::new(Instant::now());

        while Instant::now() < deadline {
            match self.load_state().await {
                Ok(state) => {
                    if tracker.observe(&state, Instant::now()) {
                        return true;
                    }
                }
                // 导航过程中执行上下文会被销毁，稍后重试
                Err(e) => debug!("读取页面加载状态失败: {}", e),
            }
            sleep(NETWORK_POLL).await;
        }
        false
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.executor.page().wait_for_navigation()).await,
            Ok(Ok(_))
        )
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.executor.page().save_screenshot(params, path).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> AppResult<JsonValue> {
        self.executor.eval(script).await
    }
}
