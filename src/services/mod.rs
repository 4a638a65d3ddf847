pub mod asset_search;
pub mod diagnostics;
pub mod dropdown;
pub mod duplicate_detector;
pub mod frame_locator;
pub mod login;
pub mod window_reconciler;

pub use asset_search::AssetSearch;
pub use diagnostics::{Diagnostics, FailureStage};
pub use dropdown::{resolve_label, DropdownFiller};
pub use duplicate_detector::{row_indicates_deactivation, DuplicateDetector, DuplicatePolicy};
pub use frame_locator::FrameLocator;
pub use login::{Credentials, LoginService};
pub use window_reconciler::{ReconcileOutcome, WindowReconciler};
