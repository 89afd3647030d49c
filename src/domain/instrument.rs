//! Instruments and screening matches.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    pub code: String,
    pub name: String,
}

impl Instrument {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// An instrument whose full condition chain held on its most recent bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub instrument: Instrument,
    pub close: f64,
}
