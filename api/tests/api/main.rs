mod api;
mod catalog;
mod reviews;
