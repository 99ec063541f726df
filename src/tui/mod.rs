pub mod events;
pub mod run;
pub mod state;
pub mod views;

pub use run::run;
pub use state::{App, Screen};
