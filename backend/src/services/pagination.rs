//! Sorting and paging of result listings

use crate::error::{AppError, AppResult};
use crate::models::{PageOf, Pagination, Presented};

/// Raw `page` / `per_page` query values as the caller sent them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageRequest {
    /// Checked pagination, or `None` when no page was asked for.
    ///
    /// Only the presence of `page` decides this; `per_page` alone does not
    /// turn paging on.
    pub fn resolve(&self, default_per_page: u32) -> AppResult<Option<Pagination>> {
        let Some(page) = self.page else {
            return Ok(None);
        };

        if page < 1 {
            return Err(AppError::InvalidInput("page must be at least 1".to_string()));
        }
        let per_page = self.per_page.unwrap_or(i64::from(default_per_page));
        if per_page <= 0 {
            return Err(AppError::InvalidInput(
                "per_page must be greater than 0".to_string(),
            ));
        }

        Ok(Some(Pagination {
            page: u32::try_from(page)
                .map_err(|_| AppError::InvalidInput("page is too large".to_string()))?,
            per_page: u32::try_from(per_page)
                .map_err(|_| AppError::InvalidInput("per_page is too large".to_string()))?,
        }))
    }
}

/// Sort `items` by `name` ascending (byte order, case-sensitive) and cut
/// the requested page, if any.
pub fn present<T, F>(
    mut items: Vec<T>,
    name: F,
    request: PageRequest,
    default_per_page: u32,
) -> AppResult<Presented<T>>
where
    F: Fn(&T) -> &str,
{
    let pagination = request.resolve(default_per_page)?;

    items.sort_by(|a, b| name(a).cmp(name(b)));

    let Some(pagination) = pagination else {
        return Ok(Presented::All(items));
    };

    let total_pages = pagination.total_pages(items.len());
    let page_items = items
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.per_page as usize)
        .collect();

    Ok(Presented::Paged(PageOf {
        items: page_items,
        total_pages,
        current_page: pagination.page,
    }))
}
