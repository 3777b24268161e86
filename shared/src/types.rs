//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build coordinates from a pair of nullable columns.
    /// Both halves must be present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self::new(latitude, longitude)),
            _ => None,
        }
    }
}

/// Pagination parameters, 1-indexed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Index of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.per_page as usize)
    }

    /// Number of pages needed to hold `total` items
    pub fn total_pages(&self, total: usize) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        total.div_ceil(self.per_page as usize) as u32
    }
}

/// One page of results with its position in the full listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
    pub current_page: u32,
}

/// A sorted listing, either complete or cut into a page.
///
/// The variant is chosen by whether the caller asked for a page at all,
/// never by the page values themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Presented<T> {
    All(Vec<T>),
    Paged(PageOf<T>),
}

impl<T> Presented<T> {
    /// Items contained in this listing
    pub fn items(&self) -> &[T] {
        match self {
            Presented::All(items) => items,
            Presented::Paged(page) => &page.items,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Presented::Paged(_))
    }

    /// Convert the items while keeping the page envelope
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Presented<U> {
        match self {
            Presented::All(items) => Presented::All(items.into_iter().map(f).collect()),
            Presented::Paged(page) => Presented::Paged(PageOf {
                items: page.items.into_iter().map(f).collect(),
                total_pages: page.total_pages,
                current_page: page.current_page,
            }),
        }
    }
}
