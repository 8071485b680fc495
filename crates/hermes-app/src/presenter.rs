// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use log::warn;

use crate::{Application, ApplicationId, ApplicationRepository, PageRequest, RepositoryError};

/// Forwards view requests to the repository.
///
/// Denials and outages never reach the view: they are logged, remembered as
/// the last failure and replaced by an empty result. Only corrupt data comes
/// back as an error, because nothing the view does can recover from it.
#[derive(Debug)]
pub struct ApplicationsPresenter<R> {
    repository: R,
    last_failure: Option<String>,
}

impl<R: ApplicationRepository> ApplicationsPresenter<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            last_failure: None,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn take_last_failure(&mut self) -> Option<String> {
        self.last_failure.take()
    }

    pub fn find_all(&mut self, page: PageRequest) -> Result<Vec<Application>> {
        match self.repository.find_all(page) {
            Ok(mut rows) => {
                if rows.len() > page.limit() {
                    warn!(
                        "repository returned {} rows for a page of {}; truncating",
                        rows.len(),
                        page.limit()
                    );
                    rows.truncate(page.limit());
                }
                Ok(rows)
            }
            Err(error) => self.recover("list applications", error, Vec::new()),
        }
    }

    pub fn find_by_id(&mut self, id: &ApplicationId) -> Result<Option<Application>> {
        match self.repository.find_by_id(id) {
            Ok(found) => Ok(found),
            Err(error) => self.recover(&format!("load application {id}"), error, None),
        }
    }

    pub fn count(&mut self) -> Result<usize> {
        match self.repository.count() {
            Ok(total) => Ok(total),
            Err(error) => self.recover("count applications", error, 0),
        }
    }

    pub fn update(&mut self, application: &Application) -> Result<bool> {
        match self.repository.update(application) {
            Ok(accepted) => Ok(accepted),
            Err(error) => {
                self.recover(&format!("update application {}", application.id), error, false)
            }
        }
    }

    pub fn save(&mut self, application: &Application) -> Result<bool> {
        match self.repository.save(application) {
            Ok(accepted) => Ok(accepted),
            Err(error) => {
                self.recover(&format!("save application {}", application.id), error, false)
            }
        }
    }

    fn recover<T>(&mut self, operation: &str, error: RepositoryError, fallback: T) -> Result<T> {
        if let RepositoryError::Corrupt(reason) = &error {
            return Err(anyhow!(
                "{operation}: {reason} -- the application store holds data this client cannot display"
            ));
        }
        warn!("{operation} failed: {error}");
        self.last_failure = Some(format!("{operation} failed: {error}"));
        Ok(fallback)
    }
}
