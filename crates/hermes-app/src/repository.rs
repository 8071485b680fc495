// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::{Application, ApplicationId, CorruptRecord, PageRequest};

/// CRUD surface of the backend entity store.
///
/// Writes report rejection with `Ok(false)`: the backend left its state
/// unchanged and the caller must undo any optimistic local state.
pub trait ApplicationRepository {
    /// Ordered slice of at most `page.limit()` records. The order is stable
    /// for a stable data set.
    fn find_all(&mut self, page: PageRequest) -> Result<Vec<Application>, RepositoryError>;
    fn find_by_id(&mut self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn count(&mut self) -> Result<usize, RepositoryError>;
    fn save(&mut self, application: &Application) -> Result<bool, RepositoryError>;
    fn update(&mut self, application: &Application) -> Result<bool, RepositoryError>;
}

impl<R: ApplicationRepository + ?Sized> ApplicationRepository for &mut R {
    fn find_all(&mut self, page: PageRequest) -> Result<Vec<Application>, RepositoryError> {
        (**self).find_all(page)
    }

    fn find_by_id(&mut self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        (**self).find_by_id(id)
    }

    fn count(&mut self) -> Result<usize, RepositoryError> {
        (**self).count()
    }

    fn save(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        (**self).save(application)
    }

    fn update(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        (**self).update(application)
    }
}

#[derive(Debug)]
pub enum RepositoryError {
    /// The backend refused the request, for example for lack of permission.
    Denied(String),
    Unavailable(anyhow::Error),
    /// The backend returned data outside the closed schema.
    Corrupt(String),
}

impl RepositoryError {
    /// Sorts a store failure: anything carrying a [`CorruptRecord`] in its
    /// chain is a data inconsistency, everything else is an outage.
    pub fn classify(error: anyhow::Error) -> Self {
        let corrupt = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<CorruptRecord>())
            .map(|record| record.0.clone());
        match corrupt {
            Some(reason) => Self::Corrupt(reason),
            None => Self::Unavailable(error),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(reason) => write!(f, "access denied: {reason}"),
            Self::Unavailable(error) => write!(f, "store unavailable: {error:#}"),
            Self::Corrupt(reason) => write!(f, "corrupt record: {reason}"),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(error) => Some(error.as_ref()),
            Self::Denied(_) | Self::Corrupt(_) => None,
        }
    }
}
