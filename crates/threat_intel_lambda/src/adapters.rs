pub mod feed;
pub mod invoke;
pub mod ioc_store;
