use std::fmt::{Display, Formatter};

use misc::derive_more::{From, Into};
use misc::slog_value_display;

/// A simulation tick
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into)]
pub struct Tick(pub u64);

impl Tick {
    pub const fn value(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for Tick {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

slog_value_display!(Tick);
