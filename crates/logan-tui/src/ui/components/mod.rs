mod filter_panel;
mod help_overlay;
mod status_bar;

pub use filter_panel::{FilterPanel, is_checked};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, connection_label};
