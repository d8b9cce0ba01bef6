//! Active-region identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SharpError;

/// HMI Active Region Patch (HARP) number.
///
/// Identifies a tracked region of the solar magnetic field in the SHARP
/// data series. The archive places no uniqueness or range constraints on
/// it beyond being a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarpId(pub u32);

impl HarpId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for HarpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HarpId {
    type Err = SharpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(HarpId)
            .map_err(|_| SharpError::InvalidQuery(format!("invalid HARP number: '{}'", s)))
    }
}

impl From<u32> for HarpId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
