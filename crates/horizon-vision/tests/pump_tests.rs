//! Integration tests for the end-of-cycle update pump.

mod common;

use common::Fixture;
use horizon_vision::{CaretFlush, Context, Role, RoleSet};
use horizon_vision_core::{AccessibleId, CaretGeometry, Rect, ReviewPosition};

/// Navigator object at (20,20)-(30,30), review text at (40,40)-(60,50).
fn position_review(fx: &Fixture) -> AccessibleId {
    fx.objects.with_write(|store| {
        let doc = store.insert("document", Some(Rect::new(20, 20, 30, 30)));
        store.set_navigator(Some(doc)).unwrap();
        store
            .set_review_position(Some(ReviewPosition {
                object: doc,
                bounding_rect: Some(Rect::new(40, 40, 60, 50)),
                start: None,
            }))
            .unwrap();
        doc
    })
}

fn insert_caret(fx: &Fixture) -> AccessibleId {
    fx.objects.with_write(|store| {
        let edit = store.insert("edit", Some(Rect::new(0, 0, 200, 30)));
        store
            .set_caret_geometry(
                edit,
                Some(CaretGeometry {
                    text_rect: Some(Rect::new(5, 5, 6, 20)),
                    ..Default::default()
                }),
            )
            .unwrap();
        edit
    })
}

#[test]
fn test_review_moves_coalesce() {
    let fx = Fixture::new();
    position_review(&fx);
    let mut handler = fx.handler();
    handler.set_provider("combo", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_review_move(Context::Review);
    handler.handle_review_move(Context::Navigator);
    let report = handler.pump_cycle();

    assert_eq!(report.review, Some(Context::Navigator));
    assert_eq!(
        fx.journal.take(),
        vec![
            "combo: track navigator 20,20,30,30",
            "combo: updated navigator",
            "combo: updated review",
            "combo: refresh",
        ]
    );
    assert_eq!(
        handler.context_rect(Context::Review),
        Some(Rect::new(40, 40, 60, 50))
    );

    let idle = handler.pump_cycle();
    assert_eq!(idle.review, None);
    assert_eq!(fx.journal.take(), vec!["combo: refresh"]);
}

#[test]
fn test_caret_flush_updates_once() {
    let fx = Fixture::new();
    let edit = insert_caret(&fx);
    let mut handler = fx.handler();
    handler.set_provider("combo", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_caret_move(edit);
    handler.handle_caret_move(edit);
    assert_eq!(handler.pending_updates().pending_caret(), Some(edit));
    let report = handler.pump_cycle();

    assert_eq!(report.caret, CaretFlush::Flushed);
    assert_eq!(
        fx.journal.take(),
        vec![
            "combo: track caret 5,5,6,20",
            "combo: updated caret",
            "combo: refresh",
        ]
    );
    assert_eq!(handler.context_rect(Context::Caret), Some(Rect::new(5, 5, 6, 20)));
    assert!(!handler.pending_updates().has_pending());
}

#[test]
fn test_dead_caret_object_is_dropped() {
    let fx = Fixture::new();
    let edit = insert_caret(&fx);
    let mut handler = fx.handler();
    handler.set_provider("combo", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_caret_move(edit);
    fx.objects.with_write(|store| store.destroy(edit)).unwrap();
    let report = handler.pump_cycle();

    assert_eq!(report.caret, CaretFlush::Dropped);
    assert_eq!(fx.journal.take(), vec!["combo: refresh"]);
    assert_eq!(handler.context_rect(Context::Caret), None);
    assert!(!handler.pending_updates().has_pending());
}

#[test]
fn test_flush_order() {
    let fx = Fixture::new();
    position_review(&fx);
    let edit = insert_caret(&fx);
    let mut handler = fx.handler();
    handler.set_provider("highlighter", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_caret_move(edit);
    handler.handle_review_move(Context::Review);
    handler.pump_cycle();

    assert_eq!(
        fx.journal.take(),
        vec![
            "highlighter: updated navigator",
            "highlighter: updated review",
            "highlighter: updated caret",
            "highlighter: refresh",
        ]
    );
}

#[test]
fn test_no_highlighter_no_refresh() {
    let fx = Fixture::new();
    position_review(&fx);
    let mut handler = fx.handler();
    handler.set_provider("magnifier", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_review_move(Context::Review);
    let report = handler.pump_cycle();

    assert!(!report.refreshed);
    assert_eq!(report.review, Some(Context::Review));
    assert_eq!(fx.journal.take(), vec!["magnifier: track review 40,40,60,50"]);
}

#[test]
fn test_non_review_context_skips_magnifier() {
    let fx = Fixture::new();
    position_review(&fx);
    let mut handler = fx.handler();
    handler.set_provider("combo", RoleSet::EMPTY).unwrap();
    fx.journal.take();

    handler.handle_review_move(Context::Focus);
    handler.pump_cycle();

    assert_eq!(fx.journal.count("combo: track"), 0);
    assert_eq!(fx.journal.count("combo: updated"), 2);
}

#[test]
fn test_deferred_activation_refreshes_same_cycle() {
    let fx = Fixture::new();
    let mut handler = fx.handler();
    handler.call_after(|handler| {
        handler.set_provider("highlighter", Role::Highlighter).unwrap();
    });

    let report = handler.pump_cycle();

    assert_eq!(report.deferred_calls, 1);
    assert!(report.refreshed);
    assert_eq!(
        fx.journal.take(),
        vec!["highlighter: init highlighter", "highlighter: refresh"]
    );
}

#[test]
fn test_refresh_failure_is_logged() {
    let fx = Fixture::new();
    let mut handler = fx.handler();
    handler.set_provider("highlighter", RoleSet::EMPTY).unwrap();
    fx.journal.fail_on("highlighter: refresh");

    let report = handler.pump_cycle();

    assert!(report.refreshed);
    assert_eq!(handler.provider_for(Role::Highlighter), Some("highlighter"));
}
