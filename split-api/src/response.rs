//! Response envelopes and pagination types.

use crate::{ApiError, Result};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A decoded result together with the transport metadata it arrived with.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Decoded body.
    pub data: T,
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl<T> ApiResponse<T> {
    /// Transform the body, keeping the metadata.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            status: self.status,
            headers: self.headers,
        }
    }

    /// Discard the metadata.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Scan a listing for the first matching item.
    ///
    /// The metadata of the listing call is kept on the found item.
    pub(crate) fn find_by<F>(
        self,
        kind: &'static str,
        key: &str,
        mut predicate: F,
    ) -> Result<ApiResponse<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let ApiResponse {
            data,
            status,
            headers,
        } = self;

        match data.into_iter().find(|item| predicate(item)) {
            Some(data) => Ok(ApiResponse {
                data,
                status,
                headers,
            }),
            None => Err(ApiError::not_found(kind, key)),
        }
    }
}

/// Offset pagination parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Number of items to skip.
    pub offset: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl ListParams {
    /// Start at `offset` with pages of `limit`.
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }

    pub(crate) fn to_query(self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// A page of an offset-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub objects: Vec<T>,
    /// Offset of the first item.
    #[serde(default)]
    pub offset: Option<u32>,
    /// Requested page size.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total_count: Option<u32>,
}

/// Default page size used when walking every page of a listing.
pub(crate) const PAGE_SIZE: u32 = 50;

/// Whether offset pagination should stop after this page.
pub(crate) fn is_last_page<T>(page: &ListResult<T>, fetched: usize, limit: u32) -> bool {
    if page.objects.is_empty() || page.objects.len() < limit as usize {
        return true;
    }
    matches!(page.total_count, Some(total) if fetched >= total as usize)
}

/// A page of a marker-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPage<T> {
    /// Items on this page.
    #[serde(default = "Vec::new", alias = "data")]
    pub objects: Vec<T>,
    /// Marker of the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
    /// Marker of the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_marker: Option<String>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Number of items on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl<T> MarkerPage<T> {
    /// The marker to continue from, ignoring empty markers.
    pub fn next(&self) -> Option<&str> {
        self.next_marker.as_deref().filter(|m| !m.is_empty())
    }
}

/// Walk an offset-paginated listing from the start, collecting every item.
///
/// The metadata of the last page fetched is returned with the items.
pub(crate) async fn collect_offset_pages<T, F, Fut>(fetch_page: F) -> Result<ApiResponse<Vec<T>>>
where
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = Result<ApiResponse<ListResult<T>>>>,
{
    collect_offset_pages_sized(PAGE_SIZE, fetch_page).await
}

/// Like [`collect_offset_pages`], requesting pages of `page_size`.
pub(crate) async fn collect_offset_pages_sized<T, F, Fut>(
    page_size: u32,
    mut fetch_page: F,
) -> Result<ApiResponse<Vec<T>>>
where
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = Result<ApiResponse<ListResult<T>>>>,
{
    let mut items = Vec::new();
    let mut offset = 0u32;

    loop {
        let ApiResponse {
            data: page,
            status,
            headers,
        } = fetch_page(ListParams::new(offset, page_size)).await?;

        let last = is_last_page(&page, items.len() + page.objects.len(), page_size);
        offset += page.objects.len() as u32;
        items.extend(page.objects);

        if last {
            return Ok(ApiResponse {
                data: items,
                status,
                headers,
            });
        }
    }
}

/// Walk a marker-paginated listing until no next marker is returned.
pub(crate) async fn collect_marker_pages<T, F, Fut>(
    mut fetch_page: F,
) -> Result<ApiResponse<Vec<T>>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ApiResponse<MarkerPage<T>>>>,
{
    let mut items = Vec::new();
    let mut marker = None;

    loop {
        let ApiResponse {
            data: page,
            status,
            headers,
        } = fetch_page(marker.take()).await?;

        let next = page.next().map(str::to_string);
        items.extend(page.objects);

        match next {
            Some(next) => marker = Some(next),
            None => {
                return Ok(ApiResponse {
                    data: items,
                    status,
                    headers,
                });
            }
        }
    }
}
