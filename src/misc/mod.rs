use std::fmt;

use color_eyre::owo_colors::OwoColorize;

use crate::plc::DeviceState;

/// Green or red marker for terminal output. The alternate form (`{:#}`)
/// appends an on/off label for terminals without colour.
#[derive(Copy, Clone, Debug)]
pub struct StatusDot(pub bool);

impl<T> From<&Option<T>> for StatusDot {
    fn from(option: &Option<T>) -> Self {
        StatusDot(option.is_some())
    }
}

impl From<DeviceState> for StatusDot {
    fn from(state: DeviceState) -> Self {
        StatusDot(state.power)
    }
}

impl fmt::Display for StatusDot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const DOT: char = '●';

        match (self.0, f.alternate()) {
            (true, false) => write!(f, "{}", DOT.bright_green()),
            (false, false) => write!(f, "{}", DOT.bright_red()),
            (true, true) => write!(f, "{} on", DOT.bright_green()),
            (false, true) => write!(f, "{} off", DOT.bright_red()),
        }
    }
}
