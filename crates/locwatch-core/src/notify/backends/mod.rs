mod desktop;
mod log;
mod stdout;

pub use desktop::DesktopNotifier;
pub use log::LogNotifier;
pub use stdout::StdoutNotifier;
