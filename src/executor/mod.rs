pub mod create_table;
pub mod delete;
pub mod insert;
pub mod predicate;
pub mod scan;
pub mod sequential_scan;
pub mod update;
