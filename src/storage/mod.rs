pub mod bplus_tree;
pub mod catalog;
pub mod header;
pub mod page_file;
pub mod row_store;
pub mod schema;
pub mod storage_manager;
