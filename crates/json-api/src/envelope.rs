//! Response envelope pieces shared by every module.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopsync::query::{PageInfo, Pagination};

/// Page metadata of page-based lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginationResponse {
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub prev: u64,
    pub next: u64,
    pub total_page: u64,
}

impl From<Pagination> for PaginationResponse {
    fn from(pagination: Pagination) -> Self {
        Self {
            total: pagination.total,
            page: pagination.page,
            per_page: pagination.per_page,
            prev: pagination.prev,
            next: pagination.next,
            total_page: pagination.total_page,
        }
    }
}

impl From<PageInfo> for PaginationResponse {
    fn from(info: PageInfo) -> Self {
        match info {
            PageInfo::Page(pagination) => pagination.into(),
            PageInfo::Step { total } => Self {
                total,
                page: 1,
                per_page: total,
                prev: 0,
                next: 0,
                total_page: 1,
            },
        }
    }
}

/// `pagination` for page requests, `total` for step requests.
pub(crate) fn paging_fields(info: PageInfo) -> (Option<PaginationResponse>, Option<u64>) {
    match info {
        PageInfo::Page(pagination) => (Some(pagination.into()), None),
        PageInfo::Step { total } => (None, Some(total)),
    }
}

/// Acknowledgement carrying the affected record id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct IdResponse {
    pub success: bool,
    pub id: Uuid,
}

impl IdResponse {
    pub(crate) fn new(id: Uuid) -> Self {
        Self { success: true, id }
    }
}
