pub mod chromium_driver;
pub mod js_executor;
pub mod page_driver;

pub use chromium_driver::ChromiumDriver;
pub use js_executor::JsExecutor;
pub use page_driver::{ElementRef, FrameRef, Key, PageDriver};
