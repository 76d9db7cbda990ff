pub mod api_key;
pub mod catalog;
pub mod history;
pub mod page;
pub mod request;
pub mod response;
pub mod review;
pub mod user;
