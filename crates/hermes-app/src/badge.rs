// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::ApplicationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeCategory {
    Success,
    Error,
    Neutral,
}

impl BadgeCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Neutral => "neutral",
        }
    }
}

pub const STANDARD_BADGES: [(ApplicationState, BadgeCategory); ApplicationState::COUNT] = [
    (ApplicationState::Submitted, BadgeCategory::Success),
    (ApplicationState::Approved, BadgeCategory::Success),
    (ApplicationState::Completed, BadgeCategory::Success),
    (ApplicationState::Canceled, BadgeCategory::Error),
    (ApplicationState::Rejected, BadgeCategory::Error),
    (ApplicationState::ResubmissionRequired, BadgeCategory::Neutral),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    /// Accessible title shown alongside the colored badge.
    pub title: &'static str,
    pub category: BadgeCategory,
}

/// State to badge mapping, checked for completeness when built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeTable {
    categories: [BadgeCategory; ApplicationState::COUNT],
}

impl BadgeTable {
    pub fn from_entries(entries: &[(ApplicationState, BadgeCategory)]) -> Result<Self> {
        let mut slots: [Option<BadgeCategory>; ApplicationState::COUNT] =
            [None; ApplicationState::COUNT];

        for (state, category) in entries {
            let slot = &mut slots[state.index()];
            if let Some(existing) = *slot {
                bail!(
                    "badge table maps state {:?} twice ({} and {}); keep exactly one entry per state",
                    state.display_name(),
                    existing.as_str(),
                    category.as_str()
                );
            }
            *slot = Some(*category);
        }

        let missing = ApplicationState::ALL
            .iter()
            .filter(|state| slots[state.index()].is_none())
            .map(|state| state.display_name())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!(
                "badge table has no category for: {}; every application state needs exactly one badge",
                missing.join(", ")
            );
        }

        Ok(Self {
            categories: slots.map(|slot| slot.unwrap_or(BadgeCategory::Neutral)),
        })
    }

    pub fn standard() -> Result<Self> {
        Self::from_entries(&STANDARD_BADGES)
    }

    pub fn category(&self, state: ApplicationState) -> BadgeCategory {
        self.categories[state.index()]
    }

    pub fn badge(&self, state: ApplicationState) -> Badge {
        Badge {
            label: state.display_name(),
            title: state.display_name(),
            category: self.category(state),
        }
    }
}
