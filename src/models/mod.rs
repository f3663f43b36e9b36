pub mod gallery;
pub mod post;
pub mod potential;
pub mod setting;
pub mod structure;
pub mod user;
