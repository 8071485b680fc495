// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use log::debug;

use crate::{
    Application, ApplicationRepository, ApplicationsPresenter, Badge, BadgeTable, EDITOR_FIELDS,
    EditorFieldSpec, PageRequest, field_by_label, format_datetime, format_optional_datetime,
};

pub const ID_LABEL: &str = "Id";
pub const CREATED_BY_LABEL: &str = "Created by";
pub const CREATED_DATE_LABEL: &str = "Created on";
pub const LAST_MODIFIED_BY_LABEL: &str = "Last modified by";
pub const LAST_MODIFIED_ON_LABEL: &str = "Last modified on";
pub const STATE_COLUMN_LABEL: &str = "State";
pub const APPOINTMENT_DATE_LABEL: &str = "Appointment date";
pub const DETAILS_LABEL: &str = "Details:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    Text(String),
    Badge(Badge),
}

impl GridCell {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(value) => value,
            Self::Badge(badge) => badge.label,
        }
    }
}

/// Grid column: header, accessor and formatter in one entry.
#[derive(Debug)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub render: fn(&Application, &BadgeTable) -> GridCell,
}

pub const APPLICATION_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        header: ID_LABEL,
        render: |item, _| GridCell::Text(item.id.to_string()),
    },
    ColumnSpec {
        header: CREATED_BY_LABEL,
        render: |item, _| GridCell::Text(item.created_by.clone()),
    },
    ColumnSpec {
        header: CREATED_DATE_LABEL,
        render: |item, _| GridCell::Text(format_datetime(item.created_date)),
    },
    ColumnSpec {
        header: LAST_MODIFIED_BY_LABEL,
        render: |item, _| GridCell::Text(item.last_modified_by.clone()),
    },
    ColumnSpec {
        header: LAST_MODIFIED_ON_LABEL,
        render: |item, _| GridCell::Text(format_datetime(item.last_modified_date)),
    },
    ColumnSpec {
        header: STATE_COLUMN_LABEL,
        render: |item, badges| GridCell::Badge(badges.badge(item.state)),
    },
    ColumnSpec {
        header: APPOINTMENT_DATE_LABEL,
        render: |item, _| GridCell::Text(format_optional_datetime(item.appointment_date)),
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsPanel {
    pub label: &'static str,
    pub text: String,
}

/// Column set and editor field set the front end renders.
#[derive(Debug, Clone)]
pub struct GridSchema {
    columns: Vec<&'static ColumnSpec>,
    fields: Vec<&'static EditorFieldSpec>,
    badges: BadgeTable,
}

impl GridSchema {
    pub fn builder(badges: BadgeTable) -> GridSchemaBuilder {
        GridSchemaBuilder {
            columns: Vec::new(),
            fields: Vec::new(),
            badges,
        }
    }

    /// Every column and every editor field, in table order.
    pub fn standard(badges: BadgeTable) -> Result<Self> {
        let mut builder = Self::builder(badges);
        for column in APPLICATION_COLUMNS {
            builder = builder.column(column.header);
        }
        for field in EDITOR_FIELDS {
            builder = builder.field(field.label);
        }
        builder.build()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.header).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, item: &Application) -> Vec<GridCell> {
        self.columns
            .iter()
            .map(|column| (column.render)(item, &self.badges))
            .collect()
    }

    pub fn details(&self, item: &Application) -> DetailsPanel {
        DetailsPanel {
            label: DETAILS_LABEL,
            text: item.details.clone(),
        }
    }

    pub fn fields(&self) -> &[&'static EditorFieldSpec] {
        &self.fields
    }

    pub fn badges(&self) -> &BadgeTable {
        &self.badges
    }
}

#[derive(Debug, Clone)]
pub struct GridSchemaBuilder {
    columns: Vec<&'static str>,
    fields: Vec<&'static str>,
    badges: BadgeTable,
}

impl GridSchemaBuilder {
    pub fn column(mut self, header: &'static str) -> Self {
        self.columns.push(header);
        self
    }

    pub fn field(mut self, label: &'static str) -> Self {
        self.fields.push(label);
        self
    }

    pub fn build(self) -> Result<GridSchema> {
        if self.columns.is_empty() {
            bail!("grid schema needs at least one column");
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for header in self.columns {
            if columns
                .iter()
                .any(|column: &&ColumnSpec| column.header == header)
            {
                bail!("grid column {header:?} listed twice");
            }
            let Some(spec) = APPLICATION_COLUMNS
                .iter()
                .find(|column| column.header == header)
            else {
                bail!("unknown grid column {header:?}");
            };
            columns.push(spec);
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for label in self.fields {
            let Some(spec) = field_by_label(label) else {
                bail!("unknown editor field {label:?}");
            };
            fields.push(spec);
        }

        Ok(GridSchema {
            columns,
            fields,
            badges: self.badges,
        })
    }
}

/// One pull from the grid's data source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridPage {
    pub offset: usize,
    pub rows: Vec<Application>,
    pub total: usize,
}

impl GridPage {
    pub fn row(&self, index: usize) -> Option<&Application> {
        index
            .checked_sub(self.offset)
            .and_then(|local| self.rows.get(local))
    }
}

/// Asks for the total and for the visible slice, separately and uncached.
pub fn fetch_page<R: ApplicationRepository>(
    presenter: &mut ApplicationsPresenter<R>,
    page: PageRequest,
) -> Result<GridPage> {
    let total = presenter.count()?;
    let rows = presenter.find_all(page)?;
    debug!(
        "fetched {} of {total} applications at offset {}",
        rows.len(),
        page.offset()
    );
    Ok(GridPage {
        offset: page.offset(),
        rows,
        total,
    })
}
