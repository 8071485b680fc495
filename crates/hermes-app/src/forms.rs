// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Application, ApplicationState};

pub const STATE_LABEL: &str = "State";

/// One editor field: a closed-set selector bound to an attribute of the
/// record under edit.
#[derive(Debug)]
pub struct EditorFieldSpec {
    pub label: &'static str,
    pub choices: &'static [ApplicationState],
    pub read: fn(&Application) -> ApplicationState,
    pub write: fn(&mut Application, ApplicationState),
}

fn read_state(application: &Application) -> ApplicationState {
    application.state
}

fn write_state(application: &mut Application, state: ApplicationState) {
    application.state = state;
}

pub const EDITOR_FIELDS: &[EditorFieldSpec] = &[EditorFieldSpec {
    label: STATE_LABEL,
    choices: &ApplicationState::ALL,
    read: read_state,
    write: write_state,
}];

pub fn state_field() -> &'static EditorFieldSpec {
    &EDITOR_FIELDS[0]
}

pub fn field_by_label(label: &str) -> Option<&'static EditorFieldSpec> {
    EDITOR_FIELDS.iter().find(|field| field.label == label)
}

/// Selector position for one bound field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    field: &'static EditorFieldSpec,
    cursor: usize,
}

impl FieldSelector {
    pub fn bind(field: &'static EditorFieldSpec, item: &Application) -> Self {
        let current = (field.read)(item);
        let cursor = field
            .choices
            .iter()
            .position(|choice| *choice == current)
            .unwrap_or(0);
        Self { field, cursor }
    }

    pub fn label(&self) -> &'static str {
        self.field.label
    }

    pub fn selected(&self) -> ApplicationState {
        self.field.choices[self.cursor]
    }

    pub fn cycle(&mut self, delta: isize) -> ApplicationState {
        let len = self.field.choices.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
        self.selected()
    }

    pub fn write_to(&self, item: &mut Application) {
        (self.field.write)(item, self.selected());
    }

    pub fn choice_labels(&self) -> Vec<&'static str> {
        self.field
            .choices
            .iter()
            .map(|choice| choice.display_name())
            .collect()
    }
}
