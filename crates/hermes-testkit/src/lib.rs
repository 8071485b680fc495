// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use hermes_app::{
    Application, ApplicationId, ApplicationRepository, ApplicationState, PageRequest,
    RepositoryError,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const REFERENCE_YEAR: i32 = 2026;

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const CLERKS: [&str; 4] = ["registry-desk", "front-office", "records", "intake"];

const DOCUMENT_KINDS: [&str; 8] = [
    "Passport",
    "Identity card",
    "Residence permit",
    "Birth certificate",
    "Driving licence",
    "Marriage certificate",
    "Business license",
    "Parking permit",
];
const REQUEST_KINDS: [&str; 5] = ["renewal", "first issue", "replacement", "amendment", "copy"];

struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible application records.
pub struct ApplicationFaker {
    rng: DeterministicRng,
    next_serial: u32,
}

impl ApplicationFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_serial: 1,
        }
    }

    /// Next record; identifiers run `APP-0001`, `APP-0002`, ...
    pub fn application(&mut self) -> Application {
        let id = sample_id(self.next_serial);
        self.next_serial += 1;

        let created_date = self.datetime_in_reference_year();
        let last_modified_date =
            created_date + Duration::minutes(self.rng.int_n(60 * 24 * 30) as i64);
        let state = ApplicationState::ALL[self.rng.int_n(ApplicationState::COUNT)];
        let appointment_date = self
            .rng
            .bool()
            .then(|| last_modified_date + Duration::days(1 + self.rng.int_n(45) as i64));

        Application {
            id,
            created_by: self.citizen_name(),
            created_date,
            last_modified_by: self.pick(&CLERKS).to_owned(),
            last_modified_date,
            details: format!(
                "{} {}",
                self.pick(&DOCUMENT_KINDS),
                self.pick(&REQUEST_KINDS)
            ),
            appointment_date,
            state,
        }
    }

    pub fn applications(&mut self, count: usize) -> Vec<Application> {
        (0..count).map(|_| self.application()).collect()
    }

    pub fn citizen_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn datetime_in_reference_year(&mut self) -> OffsetDateTime {
        let start = midnight_utc(REFERENCE_YEAR, Month::January, 1);
        let seconds = self.rng.int_n(365 * 24 * 60 * 60) as i64;
        start + Duration::seconds(seconds)
    }
}

pub fn sample_id(serial: u32) -> ApplicationId {
    ApplicationId::parse(&format!("APP-{serial:04}")).expect("sample ids are valid")
}

/// Fixed record for tests that care about one state only.
pub fn sample_application(id: &str, state: ApplicationState) -> Application {
    let created = midnight_utc(REFERENCE_YEAR, Month::February, 19) + Duration::hours(12);
    Application {
        id: ApplicationId::parse(id).expect("valid sample id"),
        created_by: "Avery Walker".to_owned(),
        created_date: created,
        last_modified_by: "registry-desk".to_owned(),
        last_modified_date: created + Duration::hours(2),
        details: "Passport renewal".to_owned(),
        appointment_date: Some(created + Duration::days(7)),
        state,
    }
}

/// How many times each repository operation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find_all: usize,
    pub find_by_id: usize,
    pub count: usize,
    pub save: usize,
    pub update: usize,
}

/// In-memory repository with switchable failure modes.
#[derive(Debug, Default)]
pub struct FakeRepository {
    records: Vec<Application>,
    pub calls: CallCounts,
    pub reject_updates: bool,
    pub reject_saves: bool,
    /// Lookups of these ids answer with a denial.
    pub denied: BTreeSet<ApplicationId>,
    /// Every call fails as if the store were unreachable.
    pub unavailable: bool,
    /// Every read reports this corrupt record.
    pub corrupt: Option<String>,
    /// `find_all` ignores the page limit and returns everything from the offset.
    pub oversized_pages: bool,
}

impl FakeRepository {
    pub fn new(records: Vec<Application>) -> Self {
        let mut repository = Self {
            records,
            ..Self::default()
        };
        repository.sort();
        repository
    }

    pub fn seeded(seed: u64, count: usize) -> Self {
        Self::new(ApplicationFaker::new(seed).applications(count))
    }

    pub fn records(&self) -> &[Application] {
        &self.records
    }

    pub fn record(&self, id: &ApplicationId) -> Option<&Application> {
        self.records.iter().find(|item| &item.id == id)
    }

    pub fn reset_calls(&mut self) {
        self.calls = CallCounts::default();
    }

    fn sort(&mut self) {
        self.records.sort_by(|left, right| {
            left.created_date
                .cmp(&right.created_date)
                .then_with(|| left.id.cmp(&right.id))
        });
    }

    fn check_reads(&self) -> Result<(), RepositoryError> {
        self.check_available()?;
        match &self.corrupt {
            Some(reason) => Err(RepositoryError::Corrupt(reason.clone())),
            None => Ok(()),
        }
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Unavailable(anyhow::anyhow!(
                "connection refused"
            )));
        }
        Ok(())
    }
}

impl ApplicationRepository for FakeRepository {
    fn find_all(&mut self, page: PageRequest) -> Result<Vec<Application>, RepositoryError> {
        self.calls.find_all += 1;
        self.check_reads()?;
        let take = if self.oversized_pages {
            usize::MAX
        } else {
            page.limit()
        };
        Ok(self
            .records
            .iter()
            .skip(page.offset())
            .take(take)
            .cloned()
            .collect())
    }

    fn find_by_id(&mut self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.calls.find_by_id += 1;
        self.check_reads()?;
        if self.denied.contains(id) {
            return Err(RepositoryError::Denied(format!("application {id}")));
        }
        Ok(self.record(id).cloned())
    }

    fn count(&mut self) -> Result<usize, RepositoryError> {
        self.calls.count += 1;
        self.check_reads()?;
        Ok(self.records.len())
    }

    fn save(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        self.calls.save += 1;
        self.check_available()?;
        if self.reject_saves || self.record(&application.id).is_some() {
            return Ok(false);
        }
        self.records.push(application.clone());
        self.sort();
        Ok(true)
    }

    fn update(&mut self, application: &Application) -> Result<bool, RepositoryError> {
        self.calls.update += 1;
        self.check_available()?;
        if self.reject_updates {
            return Ok(false);
        }
        match self
            .records
            .iter_mut()
            .find(|item| item.id == application.id)
        {
            Some(slot) => {
                *slot = application.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("hermes.db");
    Ok((dir, db_path))
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).expect("valid calendar date");
    date.with_time(Time::MIDNIGHT).assume_utc()
}
