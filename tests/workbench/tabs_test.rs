//! Cyclic tab navigation anchored on the visit history.

use pretty_assertions::assert_eq;

use sqldeck::events::WorkbenchEvent;
use sqldeck::tabs::Direction;

use super::common::{drain, harness};

#[tokio::test]
async fn next_wraps_around_from_the_last_tab() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let b = h.workbench.add_new_query_editor().await;
    drain(&mut h.events);

    // B is the most recently visited tab, at the end of the order
    assert_eq!(h.workbench.store().active_editor(), Some(&b));
    h.workbench.switch_tab(Direction::Next);

    assert_eq!(h.workbench.store().active_editor(), Some(&a));
    let events = drain(&mut h.events);
    assert!(matches!(
        events.as_slice(),
        [WorkbenchEvent::ActiveEditorChanged { editor }] if editor.id == a
    ));
}

#[tokio::test]
async fn previous_steps_back_with_wraparound() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let b = h.workbench.add_new_query_editor().await;
    let c = h.workbench.add_new_query_editor().await;

    h.workbench.set_active_editor(&a);
    h.workbench.switch_tab(Direction::Previous);

    assert_eq!(h.workbench.store().active_editor(), Some(&c));
    let _ = b;
}

#[tokio::test]
async fn single_tab_cycles_onto_itself() {
    let mut h = harness(false);
    let only = h.workbench.add_new_query_editor().await;

    h.workbench.switch_tab(Direction::Next);
    assert_eq!(h.workbench.store().active_editor(), Some(&only));

    h.workbench.switch_tab(Direction::Previous);
    assert_eq!(h.workbench.store().active_editor(), Some(&only));
}

#[tokio::test]
async fn history_follows_visits_not_creation_order() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let b = h.workbench.add_new_query_editor().await;
    let c = h.workbench.add_new_query_editor().await;

    // Revisit A; the anchor for the next cycle is now A, not C
    h.workbench.set_active_editor(&a);
    h.workbench.switch_tab(Direction::Next);

    assert_eq!(h.workbench.store().active_editor(), Some(&b));
    let _ = c;
}

#[tokio::test]
async fn switching_away_commits_the_overlay() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let _b = h.workbench.add_new_query_editor().await;

    h.workbench.set_active_editor(&a);
    h.workbench.set_sql(&a, "SELECT now()").await;
    h.workbench.switch_tab(Direction::Next);

    // The overlay was folded into the committed editor on switch-away
    let committed = h.workbench.store().editor(&a).unwrap();
    assert_eq!(committed.sql, "SELECT now()");
}

#[tokio::test]
async fn removing_the_active_tab_activates_its_successor() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let b = h.workbench.add_new_query_editor().await;
    let c = h.workbench.add_new_query_editor().await;
    h.workbench.set_active_editor(&b);

    h.workbench.remove_query_editor(&b).await;

    // Cycle order after B was C; B itself is gone from order and history
    assert_eq!(h.workbench.store().active_editor(), Some(&c));
    assert!(h.workbench.store().editor(&b).is_none());
    assert!(!h.workbench.store().tab_history().contains(&b));
    let _ = a;
}

#[tokio::test]
async fn removing_an_inactive_tab_keeps_the_active_one() {
    let mut h = harness(false);
    let a = h.workbench.add_new_query_editor().await;
    let b = h.workbench.add_new_query_editor().await;

    h.workbench.remove_query_editor(&a).await;

    assert_eq!(h.workbench.store().active_editor(), Some(&b));
}
