// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

/// Bounded slice of the ordered record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: usize,
    limit: usize,
}

impl PageRequest {
    pub fn new(offset: usize, limit: usize) -> Result<Self> {
        if limit == 0 {
            bail!("page limit must be positive, got 0");
        }
        Ok(Self { offset, limit })
    }

    /// Page of `limit` rows aligned so that it contains `row`.
    pub fn containing(row: usize, limit: usize) -> Result<Self> {
        if limit == 0 {
            bail!("page limit must be positive, got 0");
        }
        Ok(Self {
            offset: row - row % limit,
            limit,
        })
    }

    pub const fn offset(self) -> usize {
        self.offset
    }

    pub const fn limit(self) -> usize {
        self.limit
    }

    pub const fn end(self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    pub fn contains(self, row: usize) -> bool {
        row >= self.offset && row < self.end()
    }

    /// Number of rows a well-behaved repository returns for this page.
    pub fn expected_len(self, total: usize) -> usize {
        if self.offset >= total {
            return 0;
        }
        (total - self.offset).min(self.limit)
    }
}
