pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;
#[cfg(test)]
mod testing;

pub use app::run;
