//! Sale Channel Handlers

pub(crate) mod bulk;
pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod delete_many;
pub(crate) mod fetch_update;
pub(crate) mod fetch_update_list;
pub(crate) mod get;
pub(crate) mod get_by_code;
pub(crate) mod index;
pub(crate) mod list;
pub(crate) mod update;
