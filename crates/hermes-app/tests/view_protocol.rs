// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use hermes_app::{
    ApplicationState, ApplicationView, ApplicationsPresenter, EditMode, EditorAction, EditorMode,
    Location, PageRequest, ViewConfig, ViewError, ViewEvent, ViewEffect, fetch_page,
};
use hermes_testkit::{FakeRepository, sample_application, sample_id};

fn presenter(records: usize) -> ApplicationsPresenter<FakeRepository> {
    ApplicationsPresenter::new(FakeRepository::seeded(11, records))
}

fn open(
    view: &mut ApplicationView,
    presenter: &mut ApplicationsPresenter<FakeRepository>,
    serial: u32,
) -> Result<Vec<ViewEffect>, ViewError> {
    view.handle(
        presenter,
        ViewEvent::LocationChanged(Location::Application(sample_id(serial))),
    )
}

#[test]
fn page_size_never_exceeds_limit_and_matches_remaining_rows() {
    let mut presenter = presenter(23);
    for limit in [1, 5, 10, 23, 40] {
        for offset in [0, 3, 20, 22, 23, 30] {
            let page = PageRequest::new(offset, limit).expect("page");
            let grid = fetch_page(&mut presenter, page).expect("fetch");
            assert!(grid.rows.len() <= limit);
            assert_eq!(grid.rows.len(), page.expected_len(23), "{offset}/{limit}");
            assert_eq!(grid.total, 23);
        }
    }
}

#[test]
fn every_fetch_asks_for_count_and_slice_again() {
    let mut presenter = presenter(8);
    let page = PageRequest::new(0, 4).expect("page");
    fetch_page(&mut presenter, page).expect("first fetch");
    fetch_page(&mut presenter, page).expect("second fetch");
    let calls = presenter.repository().calls;
    assert_eq!(calls.count, 2);
    assert_eq!(calls.find_all, 2);
}

#[test]
fn oversized_repository_pages_are_truncated() {
    let mut repository = FakeRepository::seeded(5, 12);
    repository.oversized_pages = true;
    let mut presenter = ApplicationsPresenter::new(repository);
    let rows = presenter
        .find_all(PageRequest::new(2, 3).expect("page"))
        .expect("rows");
    assert_eq!(rows.len(), 3);
}

#[test]
fn navigating_to_existing_id_binds_that_record_once() {
    let mut presenter = presenter(6);
    let mut view = ApplicationView::default();

    let effects = open(&mut view, &mut presenter, 4).expect("open");
    assert_eq!(
        effects,
        vec![ViewEffect::EditorOpened {
            id: sample_id(4),
            mode: EditMode::ExistingItem,
        }]
    );
    let editor = view.editor().expect("editor open");
    assert_eq!(
        Some(editor.original()),
        presenter.repository().record(&sample_id(4))
    );
    assert_eq!(view.location(), &Location::Application(sample_id(4)));

    let again = open(&mut view, &mut presenter, 4).expect("re-enter");
    assert!(again.is_empty());
    assert_eq!(presenter.repository().calls.find_by_id, 1);
    assert_eq!(view.editor_title().as_deref(), Some("Edit Application"));
}

#[test]
fn navigating_to_another_id_rebinds_the_editor() {
    let mut presenter = presenter(6);
    let mut view = ApplicationView::default();
    open(&mut view, &mut presenter, 1).expect("first");
    open(&mut view, &mut presenter, 2).expect("second");
    assert_eq!(view.editor().map(|editor| editor.id()), Some(&sample_id(2)));
    assert_eq!(presenter.repository().calls.find_by_id, 2);
}

#[test]
fn unknown_id_is_not_found_and_leaves_view_browsing() {
    let mut presenter = presenter(3);
    let mut view = ApplicationView::default();
    let error = open(&mut view, &mut presenter, 99).expect_err("missing record");
    assert!(matches!(error, ViewError::NotFound(ref id) if id == &sample_id(99)));
    assert!(error.to_string().contains("not found"));
    assert_eq!(view.mode(), &EditorMode::Browsing);
    assert_eq!(view.location(), &Location::List);
}

#[test]
fn denied_lookup_looks_like_not_found() {
    let mut repository = FakeRepository::seeded(2, 3);
    repository.denied.insert(sample_id(2));
    let mut presenter = ApplicationsPresenter::new(repository);
    let mut view = ApplicationView::default();

    let error = open(&mut view, &mut presenter, 2).expect_err("denied");
    assert!(matches!(error, ViewError::NotFound(_)));
    let failure = presenter.take_last_failure().expect("failure recorded");
    assert!(failure.contains("access denied"), "{failure}");
    assert!(presenter.take_last_failure().is_none());
}

#[test]
fn unavailable_store_reads_as_empty_grid() {
    let mut repository = FakeRepository::seeded(2, 3);
    repository.unavailable = true;
    let mut presenter = ApplicationsPresenter::new(repository);
    let grid = fetch_page(&mut presenter, PageRequest::new(0, 10).expect("page")).expect("fetch");
    assert_eq!(grid.total, 0);
    assert!(grid.rows.is_empty());
    assert!(presenter.take_last_failure().is_some());
}

#[test]
fn corrupt_record_is_fatal() {
    let mut repository = FakeRepository::seeded(2, 3);
    repository.corrupt = Some("illegal application state \"archived\"".to_owned());
    let mut presenter = ApplicationsPresenter::new(repository);
    let mut view = ApplicationView::default();

    let error = open(&mut view, &mut presenter, 1).expect_err("corrupt");
    assert!(matches!(error, ViewError::Internal(_)));
    assert!(error.to_string().contains("archived"));

    let grid = fetch_page(&mut presenter, PageRequest::new(0, 10).expect("page"));
    assert!(grid.is_err());
}

#[test]
fn row_selection_updates_location_before_binding() {
    let mut presenter = presenter(4);
    let mut view = ApplicationView::default();
    let row = presenter.repository().records()[2].clone();
    let id = row.id.clone();

    let effects = view
        .handle(&mut presenter, ViewEvent::RowSelected(row))
        .expect("select");
    assert_eq!(
        effects,
        vec![
            ViewEffect::Navigated(Location::Application(id.clone())),
            ViewEffect::EditorOpened {
                id: id.clone(),
                mode: EditMode::ExistingItem,
            },
        ]
    );

    // The routing layer echoes the location back; the editor is already bound.
    let echoed = view
        .handle(
            &mut presenter,
            ViewEvent::LocationChanged(Location::Application(id)),
        )
        .expect("echo");
    assert!(echoed.is_empty());
    assert_eq!(presenter.repository().calls.find_by_id, 0);
}

#[test]
fn rejected_save_keeps_editor_and_draft() {
    let mut repository = FakeRepository::new(vec![sample_application(
        "APP-0001",
        ApplicationState::Submitted,
    )]);
    repository.reject_updates = true;
    let mut presenter = ApplicationsPresenter::new(repository);
    let mut view = ApplicationView::default();
    open(&mut view, &mut presenter, 1).expect("open");

    let changed = view
        .handle(
            &mut presenter,
            ViewEvent::StateChosen(ApplicationState::Approved),
        )
        .expect("choose");
    assert_eq!(changed, vec![ViewEffect::FieldChanged(ApplicationState::Approved)]);

    let effects = view
        .handle(&mut presenter, ViewEvent::SaveRequested)
        .expect("save");
    assert_eq!(effects, vec![ViewEffect::SaveCancelled(sample_id(1))]);

    let editor = view.editor().expect("still editing");
    assert_eq!(editor.draft().state, ApplicationState::Approved);
    assert!(editor.is_dirty());
    assert!(matches!(view.mode(), EditorMode::EditingExisting(_)));
    assert_eq!(
        presenter
            .repository()
            .record(&sample_id(1))
            .map(|item| item.state),
        Some(ApplicationState::Submitted)
    );
}

#[test]
fn accepted_save_persists_and_returns_to_browsing() {
    let mut presenter = ApplicationsPresenter::new(FakeRepository::new(vec![sample_application(
        "APP-0001",
        ApplicationState::Submitted,
    )]));
    let mut view = ApplicationView::default();
    open(&mut view, &mut presenter, 1).expect("open");
    view.handle(
        &mut presenter,
        ViewEvent::StateChosen(ApplicationState::Completed),
    )
    .expect("choose");

    let effects = view
        .handle(&mut presenter, ViewEvent::SaveRequested)
        .expect("save");
    assert_eq!(
        effects,
        vec![
            ViewEffect::Saved(sample_id(1)),
            ViewEffect::EditorClosed,
            ViewEffect::Navigated(Location::List),
            ViewEffect::RefreshGrid,
        ]
    );
    assert_eq!(view.mode(), &EditorMode::Browsing);
    assert_eq!(view.location(), &Location::List);
    assert_eq!(
        presenter
            .repository()
            .record(&sample_id(1))
            .map(|item| item.state),
        Some(ApplicationState::Completed)
    );
}

#[test]
fn cancel_always_returns_to_list_root() {
    let mut presenter = presenter(3);
    let mut view = ApplicationView::default();

    let idle = view
        .handle(&mut presenter, ViewEvent::CancelRequested)
        .expect("cancel while browsing");
    assert_eq!(idle, vec![ViewEffect::Navigated(Location::List)]);

    open(&mut view, &mut presenter, 3).expect("open");
    view.handle(
        &mut presenter,
        ViewEvent::StateChosen(ApplicationState::Rejected),
    )
    .expect("choose");
    let effects = view
        .handle(&mut presenter, ViewEvent::CancelRequested)
        .expect("cancel");
    assert_eq!(
        effects,
        vec![
            ViewEffect::EditorClosed,
            ViewEffect::Navigated(Location::List)
        ]
    );
    assert_eq!(view.mode(), &EditorMode::Browsing);
    assert!(view.location().application_id().is_none());
    assert_eq!(presenter.repository().calls.update, 0);
}

#[test]
fn navigating_to_list_closes_editor() {
    let mut presenter = presenter(3);
    let mut view = ApplicationView::default();
    open(&mut view, &mut presenter, 1).expect("open");
    let effects = view
        .handle(&mut presenter, ViewEvent::LocationChanged(Location::List))
        .expect("list");
    assert_eq!(effects, vec![ViewEffect::EditorClosed]);
    assert!(!view.mode().is_open());
}

#[test]
fn delete_is_rejected_in_every_mode() {
    let mut presenter = presenter(2);
    let mut view = ApplicationView::default();
    for _ in 0..2 {
        let effects = view
            .handle(&mut presenter, ViewEvent::DeleteRequested)
            .expect("delete");
        assert_eq!(
            effects,
            vec![ViewEffect::ActionRejected(EditorAction::Delete)]
        );
        assert!(!view.available_actions().contains(&EditorAction::Delete));
        open(&mut view, &mut presenter, 1).expect("open");
    }
    assert_eq!(presenter.repository().records().len(), 2);
}

#[test]
fn new_items_are_disabled_by_default() {
    let mut presenter = presenter(1);
    let mut view = ApplicationView::default();
    let effects = view
        .handle(&mut presenter, ViewEvent::NewRequested)
        .expect("new");
    assert_eq!(effects, vec![ViewEffect::ActionRejected(EditorAction::New)]);
    assert!(!view.mode().is_open());
}

#[test]
fn new_item_flow_saves_through_repository_when_enabled() {
    let mut presenter = presenter(1);
    let mut view = ApplicationView::new(ViewConfig {
        allow_new: true,
        actor: "clerk".to_owned(),
    });

    let effects = view
        .handle(&mut presenter, ViewEvent::NewRequested)
        .expect("new");
    let Some(ViewEffect::EditorOpened { id, mode }) = effects.first().cloned() else {
        panic!("expected editor to open, got {effects:?}");
    };
    assert_eq!(mode, EditMode::NewItem);
    assert_eq!(view.editor_title().as_deref(), Some("New Application"));
    assert_eq!(
        view.editor().map(|editor| editor.draft().created_by.as_str()),
        Some("clerk")
    );

    let saved = view
        .handle(&mut presenter, ViewEvent::SaveRequested)
        .expect("save");
    assert_eq!(saved.first(), Some(&ViewEffect::Saved(id.clone())));
    assert!(saved.contains(&ViewEffect::RefreshGrid));
    assert!(presenter.repository().record(&id).is_some());
    assert_eq!(presenter.repository().calls.save, 1);
}

#[test]
fn rejected_new_item_keeps_draft_open() {
    let mut presenter = presenter(1);
    presenter.repository_mut().reject_saves = true;
    let mut view = ApplicationView::new(ViewConfig {
        allow_new: true,
        actor: "intake".to_owned(),
    });

    view.handle(&mut presenter, ViewEvent::NewRequested)
        .expect("new");
    let id = view.editor().map(|editor| editor.id().clone()).expect("draft");
    presenter.repository_mut().reset_calls();

    let effects = view
        .handle(&mut presenter, ViewEvent::SaveRequested)
        .expect("save");
    assert_eq!(effects, vec![ViewEffect::SaveCancelled(id.clone())]);
    assert!(matches!(view.mode(), EditorMode::EditingNew(_)));
    assert!(presenter.repository().record(&id).is_none());
    assert_eq!(presenter.repository().calls.save, 1);
    assert_eq!(presenter.repository().calls.update, 0);
}

#[test]
fn new_request_while_editing_keeps_the_open_draft() {
    let mut presenter = presenter(3);
    let mut view = ApplicationView::new(ViewConfig {
        allow_new: true,
        actor: "intake".to_owned(),
    });
    open(&mut view, &mut presenter, 2).expect("open");
    view.handle(
        &mut presenter,
        ViewEvent::StateChosen(ApplicationState::Rejected),
    )
    .expect("choose");

    assert!(!view.is_enabled(EditorAction::New));
    let effects = view
        .handle(&mut presenter, ViewEvent::NewRequested)
        .expect("new");
    assert_eq!(effects, vec![ViewEffect::ActionRejected(EditorAction::New)]);
    let editor = view.editor().expect("editor still open");
    assert_eq!(editor.id(), &sample_id(2));
    assert_eq!(editor.draft().state, ApplicationState::Rejected);
    assert!(matches!(view.mode(), EditorMode::EditingExisting(_)));
}
