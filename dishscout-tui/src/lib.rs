mod feeders;
mod form;
mod keymap;
pub mod markdown;
mod styles;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use form::Form;
pub use tui::{SearchBackend, TuiActor, TuiMsg};
