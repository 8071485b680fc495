// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::ApplicationId;

pub const APPLICATIONS_ROUTE: &str = "/applications";

/// Where the user is. The location is the source of truth for which record
/// the editor shows, so reloading a location reproduces the same editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    List,
    Application(ApplicationId),
}

impl Location {
    pub fn parse(path: &str) -> Result<Self, UnknownRoute> {
        let trimmed = path.trim();
        let unknown = || UnknownRoute(trimmed.to_owned());

        let rest = trimmed
            .strip_prefix(APPLICATIONS_ROUTE)
            .ok_or_else(unknown)?;
        if rest.is_empty() || rest == "/" {
            return Ok(Self::List);
        }

        let raw_id = rest.strip_prefix('/').ok_or_else(unknown)?;
        let raw_id = raw_id.strip_suffix('/').unwrap_or(raw_id);
        ApplicationId::parse(raw_id)
            .map(Self::Application)
            .ok_or_else(unknown)
    }

    pub fn application_id(&self) -> Option<&ApplicationId> {
        match self {
            Self::List => None,
            Self::Application(id) => Some(id),
        }
    }

    pub fn path(&self) -> String {
        generate_location(APPLICATIONS_ROUTE, self.application_id())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn generate_location(base: &str, id: Option<&ApplicationId>) -> String {
    let base = base.trim_end_matches('/');
    match id {
        Some(id) => format!("{base}/{id}"),
        None => base.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoute(pub String);

impl fmt::Display for UnknownRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no route for {:?}; use {APPLICATIONS_ROUTE} or {APPLICATIONS_ROUTE}/<id>",
            self.0
        )
    }
}

impl std::error::Error for UnknownRoute {}
