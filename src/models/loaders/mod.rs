pub mod xlsx_loader;

pub use xlsx_loader::{load_work_orders, work_orders_from_rows};
