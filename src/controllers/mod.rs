pub mod auth_controller;
pub mod gallery_controller;
pub mod home_controller;
pub mod post_controller;
pub mod potential_controller;
pub mod setting_controller;
pub mod structure_controller;
pub mod upload_controller;
pub mod user_controller;
