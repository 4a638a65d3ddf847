mod common;

use std::time::Duration;

use common::FakePage;
use neovero_os_automation::services::FrameLocator;
use neovero_os_automation::{ReconcileOutcome, Selectors, WindowReconciler};
use tokio_test::assert_ok;

fn reconciler() -> WindowReconciler {
    let poll = Duration::from_millis(2);
    WindowReconciler::new(
        &Selectors::default(),
        FrameLocator::new(poll),
        Duration::from_millis(20),
        poll,
    )
}

#[tokio::test]
async fn only_primary_window_is_a_no_op() {
    let page = FakePage::new();

    let outcome = assert_ok!(reconciler().close_all_secondary_windows(&page).await);

    assert_eq!(outcome, ReconcileOutcome::AlreadyClean);
    let state = page.state();
    assert_eq!(state.close_clicks, 0);
    assert_eq!(state.forced_removals, 0);
    assert_eq!(state.windows, 1);
}

#[tokio::test]
async fn repeated_calls_stay_clean() {
    let page = FakePage::new();
    page.open_equipment();
    let reconciler = reconciler();

    let first = assert_ok!(reconciler.close_all_secondary_windows(&page).await);
    let second = assert_ok!(reconciler.close_all_secondary_windows(&page).await);

    assert_eq!(first, ReconcileOutcome::ClosedNatively);
    assert_eq!(second, ReconcileOutcome::AlreadyClean);
    assert_eq!(page.state().close_clicks, 1);
}

#[tokio::test]
async fn equipment_window_closes_through_its_own_button() {
    let page = FakePage::new();
    page.open_equipment();

    let outcome = assert_ok!(reconciler().close_all_secondary_windows(&page).await);

    assert_eq!(outcome, ReconcileOutcome::ClosedNatively);
    let state = page.state();
    assert_eq!(state.windows, 1);
    assert_eq!(state.forced_removals, 0);
}

#[tokio::test]
async fn open_form_falls_through_to_forced_removal() {
    let page = FakePage::new();
    page.open_equipment();
    page.open_form();

    let outcome = assert_ok!(reconciler().close_all_secondary_windows(&page).await);

    // 设备窗口原生关闭后表单仍在，只能强制删除
    assert_eq!(outcome, ReconcileOutcome::ForcedRemoval { removed: 1 });
    let state = page.state();
    assert_eq!(state.windows, 1);
    assert!(!state.form_open);
    assert_eq!(state.forced_removals, 1);
}

#[tokio::test]
async fn residue_after_every_tier_is_reported_not_raised() {
    let page = FakePage::new();
    page.open_equipment();
    page.open_form();
    page.state().removal_blocked = true;

    let outcome = assert_ok!(reconciler().close_all_secondary_windows(&page).await);

    assert_eq!(outcome, ReconcileOutcome::Dirty { remaining: 2 });
    assert!(!outcome.is_clean());
}
