pub mod expand;
pub mod resolve;
pub mod settings;

pub use expand::expand_command;
pub use resolve::resolve_command;
pub use settings::settings_command;
