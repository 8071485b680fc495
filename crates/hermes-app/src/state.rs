// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::{debug, info};
use std::fmt;
use time::OffsetDateTime;

use crate::{
    Application, ApplicationId, ApplicationRepository, ApplicationState, ApplicationsPresenter,
    ENTITY_NAME, Location, state_field,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    ExistingItem,
    NewItem,
}

/// The record under edit: the copy fetched from the store and the draft the
/// form writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    original: Application,
    draft: Application,
}

impl Editor {
    pub fn new(item: Application) -> Self {
        Self {
            original: item.clone(),
            draft: item,
        }
    }

    pub fn id(&self) -> &ApplicationId {
        &self.original.id
    }

    pub fn original(&self) -> &Application {
        &self.original
    }

    pub fn draft(&self) -> &Application {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.draft
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Browsing,
    EditingExisting(Editor),
    EditingNew(Editor),
}

impl EditorMode {
    pub fn editor(&self) -> Option<&Editor> {
        match self {
            Self::Browsing => None,
            Self::EditingExisting(editor) | Self::EditingNew(editor) => Some(editor),
        }
    }

    fn editor_mut(&mut self) -> Option<&mut Editor> {
        match self {
            Self::Browsing => None,
            Self::EditingExisting(editor) | Self::EditingNew(editor) => Some(editor),
        }
    }

    pub fn edit_mode(&self) -> Option<EditMode> {
        match self {
            Self::Browsing => None,
            Self::EditingExisting(_) => Some(EditMode::ExistingItem),
            Self::EditingNew(_) => Some(EditMode::NewItem),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Browsing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    New,
    Save,
    Cancel,
    Delete,
}

impl EditorAction {
    pub const ALL: [Self; 4] = [Self::New, Self::Save, Self::Cancel, Self::Delete];

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Save => "save",
            Self::Cancel => "cancel",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub allow_new: bool,
    /// User stamped as creator of new drafts.
    pub actor: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            allow_new: false,
            actor: "citizen".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    LocationChanged(Location),
    RowSelected(Application),
    StateChosen(ApplicationState),
    SaveRequested,
    CancelRequested,
    NewRequested,
    DeleteRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    /// The routing layer must show this location.
    Navigated(Location),
    EditorOpened { id: ApplicationId, mode: EditMode },
    EditorClosed,
    FieldChanged(ApplicationState),
    Saved(ApplicationId),
    /// The store rejected the write; the editor keeps the draft.
    SaveCancelled(ApplicationId),
    RefreshGrid,
    ActionRejected(EditorAction),
}

#[derive(Debug)]
pub enum ViewError {
    NotFound(ApplicationId),
    Internal(anyhow::Error),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "application {id} not found"),
            Self::Internal(error) => write!(f, "{error:#}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Internal(error) => Some(error.as_ref()),
        }
    }
}

impl From<anyhow::Error> for ViewError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

/// List/detail view over application records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationView {
    mode: EditorMode,
    location: Location,
    config: ViewConfig,
}

impl ApplicationView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            mode: EditorMode::Browsing,
            location: Location::List,
            config,
        }
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.mode.editor()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn editor_title(&self) -> Option<String> {
        match self.mode.edit_mode()? {
            EditMode::ExistingItem => Some(format!("Edit {ENTITY_NAME}")),
            EditMode::NewItem => Some(format!("New {ENTITY_NAME}")),
        }
    }

    pub fn is_enabled(&self, action: EditorAction) -> bool {
        match action {
            EditorAction::New => self.config.allow_new && !self.mode.is_open(),
            EditorAction::Save | EditorAction::Cancel => self.mode.is_open(),
            EditorAction::Delete => false,
        }
    }

    pub fn available_actions(&self) -> Vec<EditorAction> {
        EditorAction::ALL
            .into_iter()
            .filter(|action| self.is_enabled(*action))
            .collect()
    }

    pub fn handle<R: ApplicationRepository>(
        &mut self,
        presenter: &mut ApplicationsPresenter<R>,
        event: ViewEvent,
    ) -> Result<Vec<ViewEffect>, ViewError> {
        match event {
            ViewEvent::LocationChanged(location) => self.change_location(presenter, location),
            ViewEvent::RowSelected(item) => Ok(self.select_row(item)),
            ViewEvent::StateChosen(state) => Ok(self.choose_state(state)),
            ViewEvent::SaveRequested => self.save(presenter),
            ViewEvent::CancelRequested => Ok(self.cancel()),
            ViewEvent::NewRequested => Ok(self.open_new()),
            ViewEvent::DeleteRequested => Ok(self.reject(EditorAction::Delete)),
        }
    }

    fn change_location<R: ApplicationRepository>(
        &mut self,
        presenter: &mut ApplicationsPresenter<R>,
        location: Location,
    ) -> Result<Vec<ViewEffect>, ViewError> {
        let id = match location {
            Location::List => {
                self.location = Location::List;
                return Ok(self.close_editor());
            }
            Location::Application(id) => id,
        };

        if self.mode.editor().is_some_and(|editor| editor.id() == &id) {
            debug!("editor already bound to {id}; skipping fetch");
            self.location = Location::Application(id);
            return Ok(Vec::new());
        }

        let Some(item) = presenter.find_by_id(&id)? else {
            debug!("location names unknown application {id}");
            return Err(ViewError::NotFound(id));
        };

        debug!("editor bound to {id} from location");
        self.location = Location::Application(id.clone());
        self.mode = EditorMode::EditingExisting(Editor::new(item));
        Ok(vec![ViewEffect::EditorOpened {
            id,
            mode: EditMode::ExistingItem,
        }])
    }

    fn select_row(&mut self, item: Application) -> Vec<ViewEffect> {
        let id = item.id.clone();
        let location = Location::Application(id.clone());
        self.location = location.clone();
        self.mode = EditorMode::EditingExisting(Editor::new(item));
        debug!("row {id} selected");
        vec![
            ViewEffect::Navigated(location),
            ViewEffect::EditorOpened {
                id,
                mode: EditMode::ExistingItem,
            },
        ]
    }

    fn choose_state(&mut self, state: ApplicationState) -> Vec<ViewEffect> {
        let Some(editor) = self.mode.editor_mut() else {
            return Vec::new();
        };
        (state_field().write)(&mut editor.draft, state);
        vec![ViewEffect::FieldChanged(state)]
    }

    fn save<R: ApplicationRepository>(
        &mut self,
        presenter: &mut ApplicationsPresenter<R>,
    ) -> Result<Vec<ViewEffect>, ViewError> {
        let (id, accepted) = match &self.mode {
            EditorMode::Browsing => return Ok(Vec::new()),
            EditorMode::EditingExisting(editor) => {
                (editor.id().clone(), presenter.update(editor.draft())?)
            }
            EditorMode::EditingNew(editor) => {
                (editor.id().clone(), presenter.save(editor.draft())?)
            }
        };

        if !accepted {
            debug!("store rejected application {id}; keeping editor open");
            return Ok(vec![ViewEffect::SaveCancelled(id)]);
        }

        info!("saved application {id}");
        self.mode = EditorMode::Browsing;
        let mut effects = vec![ViewEffect::Saved(id), ViewEffect::EditorClosed];
        if self.location != Location::List {
            self.location = Location::List;
            effects.push(ViewEffect::Navigated(Location::List));
        }
        effects.push(ViewEffect::RefreshGrid);
        Ok(effects)
    }

    fn cancel(&mut self) -> Vec<ViewEffect> {
        let mut effects = self.close_editor();
        self.location = Location::List;
        effects.push(ViewEffect::Navigated(Location::List));
        effects
    }

    fn open_new(&mut self) -> Vec<ViewEffect> {
        if !self.is_enabled(EditorAction::New) {
            return self.reject(EditorAction::New);
        }
        let draft = Application::draft(&self.config.actor, OffsetDateTime::now_utc());
        let id = draft.id.clone();
        self.location = Location::List;
        self.mode = EditorMode::EditingNew(Editor::new(draft));
        debug!("new application draft {id}");
        vec![ViewEffect::EditorOpened {
            id,
            mode: EditMode::NewItem,
        }]
    }

    fn close_editor(&mut self) -> Vec<ViewEffect> {
        if !self.mode.is_open() {
            return Vec::new();
        }
        self.mode = EditorMode::Browsing;
        vec![ViewEffect::EditorClosed]
    }

    fn reject(&self, action: EditorAction) -> Vec<ViewEffect> {
        debug!("{} is disabled in this view", action.label());
        vec![ViewEffect::ActionRejected(action)]
    }
}
