//! End-to-end flows: engine events drive the toolbar, button clicks insert embeds.

use inline_toolbar_core::{
    Activation, ChangeSource, Cmd, DocumentEngine, EmbeddableLine, EmbedBinder, EmbedType,
    InsertOutcome, LineContent, MemoryDocument, RowLayout, Selection, ToolbarController,
    ToolbarPolicy, ToolbarState, TriggerCallback, empty_data,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const LINE_HEIGHT: f32 = 18.0;

type Controller = ToolbarController<MemoryDocument, RowLayout>;

fn setup(text: &str) -> (Controller, EmbedBinder) {
    let doc = MemoryDocument::from_text(text)
        .with_embed_type(EmbedType::with_trigger("image", |done: TriggerCallback| {
            done.resolve(Some(json!({"url": "x"})))
        }))
        .with_embed_type(EmbedType::new("divider"));
    let mut controller = ToolbarController::new(doc, RowLayout::new(LINE_HEIGHT));
    refresh_layout(&mut controller);
    let binder = EmbedBinder::for_controller(&controller);
    (controller, binder)
}

fn refresh_layout(controller: &mut Controller) {
    let ids: Vec<_> = controller.engine().line_ids().collect();
    controller.layout_mut().refresh(ids);
}

/// What a host event loop does after every input
fn dispatch(controller: &mut Controller) -> ToolbarState {
    refresh_layout(controller);
    while let Some(event) = controller.engine_mut().take_event() {
        controller.handle_event(&event);
    }
    controller.state()
}

#[test]
fn image_into_first_of_two_empty_lines() {
    let (mut controller, binder) = setup("\n");

    controller
        .engine_mut()
        .set_selection(Some(Selection::caret(0)));
    assert_eq!(
        dispatch(&mut controller),
        ToolbarState::PositionedInline { top: 0.0 }
    );
    assert_eq!(controller.last_index(), Some(0));

    assert!(controller.expand());
    assert_eq!(
        dispatch(&mut controller),
        ToolbarState::ExpandedPicker { top: 0.0 }
    );

    assert_eq!(
        binder.activate("image", &mut controller).unwrap(),
        Activation::Pending
    );
    assert_eq!(
        binder.pump(&mut controller),
        vec![Ok(InsertOutcome::Inserted {
            index: 0,
            appended_line: false
        })]
    );
    assert_eq!(dispatch(&mut controller), ToolbarState::Hidden);

    insta::assert_snapshot!(controller.engine().to_string(), @r#"
    [image {"url":"x"}]
    ""
    "#);
}

#[test]
fn divider_at_tail_of_single_empty_line() {
    let (mut controller, binder) = setup("");
    assert_eq!(controller.engine().len(), 1);

    controller
        .engine_mut()
        .set_selection(Some(Selection::caret(0)));
    dispatch(&mut controller);
    assert_eq!(controller.last_index(), Some(0));
    controller.expand();
    dispatch(&mut controller);

    let activation = binder.activate("divider", &mut controller).unwrap();
    assert_eq!(
        activation,
        Activation::Inserted(InsertOutcome::Inserted {
            index: 0,
            appended_line: true
        })
    );
    assert_eq!(dispatch(&mut controller), ToolbarState::Hidden);

    assert_eq!(controller.engine().len(), 3);
    let lines = controller.engine().lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0].content,
        LineContent::Embed {
            kind: "divider".to_string(),
            data: json!({})
        }
    );
    assert_eq!(lines[1].as_text(), Some(""));
}

#[test]
fn tail_insertion_grows_document() {
    let (mut controller, binder) = setup("title\n");
    let len_before = controller.engine().len();

    controller
        .engine_mut()
        .set_selection(Some(Selection::caret(len_before - 1)));
    dispatch(&mut controller);
    controller.expand();
    dispatch(&mut controller);
    binder.activate("divider", &mut controller).unwrap();
    dispatch(&mut controller);

    assert!(controller.engine().len() >= len_before + 2);
    assert_eq!(controller.engine().lines().len(), 3);
    assert_eq!(controller.engine().lines()[2].as_text(), Some(""));
    assert_eq!(controller.state(), ToolbarState::Hidden);
}

#[test]
fn typing_on_positioned_line_hides_toolbar() {
    let (mut controller, _binder) = setup("intro\n");

    controller
        .engine_mut()
        .set_selection(Some(Selection::caret(6)));
    assert_eq!(
        dispatch(&mut controller),
        ToolbarState::PositionedInline {
            top: LINE_HEIGHT
        }
    );

    controller
        .engine_mut()
        .apply(Cmd::InsertText {
            at: 6,
            text: "h".to_string(),
        })
        .unwrap();
    assert_eq!(dispatch(&mut controller), ToolbarState::Hidden);

    controller
        .engine_mut()
        .apply(Cmd::DeleteBackward { at: 7 })
        .unwrap();
    assert_eq!(
        dispatch(&mut controller),
        ToolbarState::PositionedInline {
            top: LINE_HEIGHT
        }
    );
}

#[test]
fn anchor_follows_line_pushed_down_by_edit() {
    let (mut controller, _binder) = setup("a\n");

    controller
        .engine_mut()
        .set_selection(Some(Selection::caret(2)));
    assert_eq!(dispatch(&mut controller).top(), Some(LINE_HEIGHT));

    controller
        .engine_mut()
        .apply_with_source(
            Cmd::SplitLine { at: 0 },
            ChangeSource::Api,
        )
        .unwrap();

    assert_eq!(controller.engine().selection(), Some(Selection::caret(3)));
    assert_eq!(dispatch(&mut controller).top(), Some(LINE_HEIGHT * 2.0));
    assert_eq!(controller.last_index(), Some(3));
}

#[test]
fn insertion_without_positioning_leaves_document_unchanged() {
    let (mut controller, binder) = setup("abc");
    let before = controller.engine().to_string();

    let activation = binder.activate("divider", &mut controller).unwrap();

    assert!(matches!(
        activation,
        Activation::Inserted(InsertOutcome::Skipped(_))
    ));
    assert_eq!(controller.engine().to_string(), before);
    assert_eq!(controller.engine().version(), 0);
}

#[test]
fn caret_left_on_embed_keeps_toolbar_hidden_under_either_policy() {
    for embeddable_line in [EmbeddableLine::SingleUnit, EmbeddableLine::EmptyTextOnly] {
        let (controller, _binder) = setup("\n");
        let mut controller = controller.with_policy(ToolbarPolicy {
            embeddable_line,
            ..ToolbarPolicy::default()
        });

        controller
            .engine_mut()
            .set_selection(Some(Selection::caret(0)));
        dispatch(&mut controller);
        controller.insert_embed("divider", empty_data()).unwrap();
        assert_eq!(controller.state(), ToolbarState::Hidden);

        // The caret shifts onto the embed's terminator
        assert_eq!(controller.engine().selection(), Some(Selection::caret(1)));
        assert!(!dispatch(&mut controller).is_visible());

        controller
            .engine_mut()
            .set_selection(Some(Selection::caret(2)));
        assert_eq!(
            dispatch(&mut controller),
            ToolbarState::PositionedInline {
                top: LINE_HEIGHT
            }
        );
    }
}
