pub mod cell;
pub mod loaders;
pub mod selectors;
pub mod work_order;

pub use cell::CellValue;
pub use loaders::{load_work_orders, work_orders_from_rows};
pub use selectors::{Selector, Selectors};
pub use work_order::{
    mentions_deactivation, CloseDate, DateValue, TimeValue, ValidationError, WorkOrder,
    WorkOrderDraft,
};
