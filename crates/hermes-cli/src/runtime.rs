// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use hermes_app::{Application, ApplicationId, ApplicationRepository, PageRequest, RepositoryError};
use hermes_db::Store;
use log::debug;

/// Repository backed by the SQLite store. Writes are stamped with the
/// session user.
pub struct DbRepository<'a> {
    store: &'a Store,
    actor: String,
}

impl<'a> DbRepository<'a> {
    pub fn new(store: &'a Store, actor: impl Into<String>) -> Self {
        Self {
            store,
            actor: actor.into(),
        }
    }
}

impl ApplicationRepository for DbRepository<'_> {
    fn find_all(&mut self, page: PageRequest) -> Result<Vec<Application>, RepositoryError> {
        self.store
            .list_applications(page)
            .map_err(RepositoryError::classify)
    }

    fn find_by_id(&mut self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.store
            .get_application(id)
            .map_err(RepositoryError::classify)
    }

    fn count(&mut self) -> Result<usize, RepositoryError> {
        self.store
            .count_applications()
            .map_err(RepositoryError::classify)
    }

    fn save(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        let mut record = application.clone();
        record.last_modified_by = self.actor.clone();
        let inserted = self
            .store
            .insert_application(&record)
            .map_err(RepositoryError::classify)?;
        if !inserted {
            debug!("application {} already exists; insert ignored", record.id);
        }
        Ok(inserted)
    }

    fn update(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        self.store
            .update_application(application, &self.actor)
            .map_err(RepositoryError::classify)
    }
}
