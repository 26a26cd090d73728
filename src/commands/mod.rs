pub mod install;
pub mod platform;
