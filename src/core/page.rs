use super::{DataStoreError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    pub fn first(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    pub fn next(&self) -> Self {
        Self::new(self.page_number.saturating_add(1), self.page_size)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DataStoreError::InvalidPageRequest(
                "page size must be at least 1".to_string(),
            ));
        }
        if self.page_number.checked_mul(self.page_size).is_none() {
            return Err(DataStoreError::InvalidPageRequest(format!(
                "page {} of size {} is out of range",
                self.page_number, self.page_size
            )));
        }
        Ok(())
    }

    /// Index of the first item of this page. Only meaningful after `validate`.
    pub fn offset(&self) -> usize {
        self.page_number.saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One slice of a listing. `total_count` is the unsliced count at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: usize) -> Self {
        Self {
            items,
            page_number: request.page_number,
            page_size: request.page_size,
            total_count,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page_number.saturating_add(1) < self.total_pages()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}
