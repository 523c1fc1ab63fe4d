pub mod actions;
mod app;
pub mod dispatch;
pub mod events;
mod inbox;
pub mod messages;
mod tasks;

pub use app::App;
