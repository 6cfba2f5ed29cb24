pub mod date;
pub mod pagination;
pub mod response;
