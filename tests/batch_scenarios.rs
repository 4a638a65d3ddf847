mod common;

use common::{order, test_config, FakePage, FakeState};
use neovero_os_automation::models::CloseDate;
use neovero_os_automation::{BatchOutcome, BatchRunner, CleanupStrategy, Selectors};

fn runner(name: &str) -> BatchRunner {
    BatchRunner::new(&test_config(name), &Selectors::default())
}

#[tokio::test]
async fn two_regular_orders_are_both_submitted() {
    let page = FakePage::new();
    let orders = vec![order("EQ-001", "CORRETIVA"), order("EQ-002", "PREVENTIVA")];

    let outcome = runner("scenario-a").run(&page, &orders).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome {
            succeeded: 2,
            skipped: 0,
            failed: 0
        }
    );
    let state = page.state();
    assert_eq!(state.saved_tags, vec!["EQ-001", "EQ-002"]);
    assert_eq!(state.windows_at_search, vec![1, 1]);
    assert_eq!(state.neutral_clicks, 2);
    assert!(state.screenshots.is_empty());
}

#[tokio::test]
async fn existing_deactivation_skips_without_opening_the_form() {
    let page = FakePage::with_state(FakeState {
        history: vec!["OS 88 | DESATIVAÇÃO-INTERNA | CANCELADA".to_string()],
        ..FakeState::default()
    });
    let orders = vec![order("EQ-010", "DESATIVAÇÃO-INTERNA")];

    let outcome = runner("scenario-b").run(&page, &orders).await.unwrap();

    assert_eq!(
        outcome,
        BatchOutcome {
            succeeded: 0,
            skipped: 1,
            failed: 0
        }
    );
    let state = page.state();
    assert_eq!(state.forms_opened, 0);
    assert!(state.saved_tags.is_empty());
    // 跳过后也要清理设备窗口
    assert_eq!(state.windows, 1);
}

#[tokio::test]
async fn fill_failure_is_contained_to_its_order() {
    let page = FakePage::with_state(FakeState {
        fail_fill_on_form: Some(2),
        ..FakeState::default()
    });
    let orders = vec![
        order("EQ-001", "CORRETIVA"),
        order("EQ-002", "CORRETIVA"),
        order("EQ-003", "CORRETIVA"),
    ];
    let config = test_config("scenario-c");

    let outcome = BatchRunner::new(&config, &Selectors::default())
        .run(&page, &orders)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        BatchOutcome {
            succeeded: 2,
            skipped: 0,
            failed: 1
        }
    );
    let state = page.state();
    assert_eq!(state.saved_tags, vec!["EQ-001", "EQ-003"]);
    // 每张工单开始搜索时都只有主窗口
    assert_eq!(state.windows_at_search, vec![1, 1, 1]);
    assert_eq!(state.forced_removals, 1);
    assert_eq!(
        state.screenshots,
        vec![
            config.logs_dir().join("erro_preenchimento_EQ-002.png"),
            config.logs_dir().join("erro_EQ-002.png"),
        ]
    );
}

#[tokio::test]
async fn reload_strategy_recovers_with_a_page_reload() {
    let page = FakePage::with_state(FakeState {
        fail_fill_on_form: Some(1),
        ..FakeState::default()
    });
    let orders = vec![order("EQ-001", "CORRETIVA"), order("EQ-002", "CORRETIVA")];
    let mut config = test_config("reload");
    config.cleanup_strategy = CleanupStrategy::Reload;

    let outcome = BatchRunner::new(&config, &Selectors::default())
        .run(&page, &orders)
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 1);
    let state = page.state();
    assert_eq!(state.reloads, 1);
    assert_eq!(state.forced_removals, 0);
    assert_eq!(state.windows_at_search, vec![1, 1]);
}

#[tokio::test]
async fn close_now_clicks_the_button_instead_of_filling_the_date() {
    let page = FakePage::new();
    let mut now_order = order("EQ-020", "CORRETIVA");
    now_order.close_date = CloseDate::Now;
    now_order.close_time = None;

    let outcome = runner("close-now").run(&page, &[now_order]).await.unwrap();

    assert_eq!(outcome.succeeded, 1);
    let selectors = Selectors::default();
    let state = page.state();
    assert_eq!(state.close_now_clicks, 1);
    assert!(state
        .fills
        .iter()
        .all(|(selector, _)| *selector != selectors.close_date_input));
}

#[tokio::test]
async fn form_values_use_form_formats_and_fuzzy_labels() {
    let page = FakePage::new();

    runner("form-values")
        .run(&page, &[order("EQ-030", "CORRETIVA")])
        .await
        .unwrap();

    let selectors = Selectors::default();
    let state = page.state();
    assert!(state
        .fills
        .contains(&(selectors.start_date_input.clone(), "02/03/2026".to_string())));
    assert!(state
        .fills
        .contains(&(selectors.start_time_input.clone(), "08:30".to_string())));
    assert!(state
        .fills
        .contains(&(selectors.close_time_input.clone(), "10:15".to_string())));
    assert!(state
        .selected
        .contains(&(selectors.order_type_select.clone(), "CORRETIVA - URGENTE".to_string())));
    assert!(state
        .selected
        .contains(&(selectors.occurrence_cause_select.clone(), "DESGASTE NATURAL".to_string())));
    assert_eq!(state.labor_clicks, 1);
}

#[tokio::test]
async fn disabled_open_button_fails_the_order() {
    let page = FakePage::with_state(FakeState {
        open_button_disabled: true,
        ..FakeState::default()
    });
    let config = test_config("disabled");

    let outcome = BatchRunner::new(&config, &Selectors::default())
        .run(&page, &[order("EQ-040", "CORRETIVA")])
        .await
        .unwrap();

    assert_eq!(outcome.failed, 1);
    let state = page.state();
    assert_eq!(state.forms_opened, 0);
    assert_eq!(state.windows, 1);
    assert_eq!(state.screenshots, vec![config.logs_dir().join("erro_EQ-040.png")]);
}

#[tokio::test]
async fn lost_session_aborts_the_batch() {
    let page = FakePage::with_state(FakeState {
        lose_session_on_search: Some(2),
        ..FakeState::default()
    });
    let orders = vec![
        order("EQ-001", "CORRETIVA"),
        order("EQ-002", "CORRETIVA"),
        order("EQ-003", "CORRETIVA"),
    ];

    let err = runner("session").run(&page, &orders).await.unwrap_err();

    assert!(err.is_session_fatal());
    let state = page.state();
    assert_eq!(state.saved_tags, vec!["EQ-001"]);
    assert_eq!(state.searches, 2);
}

#[tokio::test]
async fn disabled_save_button_fails_the_order() {
    let page = FakePage::with_state(FakeState {
        save_disabled_on_form: Some(1),
        ..FakeState::default()
    });
    let orders = vec![order("EQ-050", "CORRETIVA"), order("EQ-051", "CORRETIVA")];
    let config = test_config("save-disabled");

    let outcome = BatchRunner::new(&config, &Selectors::default())
        .run(&page, &orders)
        .await
        .unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 1);
    let state = page.state();
    assert_eq!(state.saved_tags, vec!["EQ-051"]);
    assert_eq!(state.windows_at_search, vec![1, 1]);
    // 表单不会响应设备窗口的关闭按钮，只能强制删除
    assert_eq!(state.forced_removals, 1);
    assert_eq!(state.screenshots, vec![config.logs_dir().join("erro_EQ-050.png")]);
}

#[tokio::test]
async fn form_that_never_appears_fails_the_order() {
    let page = FakePage::with_state(FakeState {
        form_fails_to_open_on: Some(1),
        ..FakeState::default()
    });
    let orders = vec![order("EQ-060", "CORRETIVA"), order("EQ-061", "CORRETIVA")];

    let outcome = runner("form-timeout").run(&page, &orders).await.unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 1);
    let state = page.state();
    assert_eq!(state.open_clicks, 2);
    assert_eq!(state.forms_opened, 1);
    assert_eq!(state.saved_tags, vec!["EQ-061"]);
    assert_eq!(state.windows_at_search, vec![1, 1]);
    // 只剩设备窗口，原生关闭即可
    assert_eq!(state.forced_removals, 0);
}

#[tokio::test]
async fn form_closing_itself_after_save_needs_no_close_click() {
    let page = FakePage::with_state(FakeState {
        form_closes_on_save: true,
        ..FakeState::default()
    });
    let orders = vec![order("EQ-070", "CORRETIVA"), order("EQ-071", "CORRETIVA")];

    let outcome = runner("self-close").run(&page, &orders).await.unwrap();

    assert_eq!(outcome.succeeded, 2);
    let state = page.state();
    assert_eq!(state.saved_tags, vec!["EQ-070", "EQ-071"]);
    assert_eq!(state.windows_at_search, vec![1, 1]);
    // 唯一的关闭点击来自第二张工单的前置清理（设备窗口）
    assert_eq!(state.close_clicks, 1);
    assert_eq!(state.forced_removals, 0);
}

#[tokio::test]
async fn form_surviving_forced_removal_fails_the_order() {
    let page = FakePage::with_state(FakeState {
        stuck_form_on: Some(1),
        ..FakeState::default()
    });
    let orders = vec![order("EQ-080", "CORRETIVA"), order("EQ-081", "CORRETIVA")];
    let mut config = test_config("stuck-form");
    config.cleanup_strategy = CleanupStrategy::Reload;

    let outcome = BatchRunner::new(&config, &Selectors::default())
        .run(&page, &orders)
        .await
        .unwrap();

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 1);
    let state = page.state();
    // 保存已点击，但窗口无法关闭
    assert_eq!(state.saved_tags, vec!["EQ-080", "EQ-081"]);
    assert_eq!(state.forced_removals, 0);
    assert_eq!(state.reloads, 1);
    assert_eq!(state.windows_at_search, vec![1, 1]);
    assert_eq!(state.screenshots, vec![config.logs_dir().join("erro_EQ-080.png")]);
}
