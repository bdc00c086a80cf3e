/*
 *  level.rs
 *
 *  NoiseMon - keep it down
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::fmt;

pub const QUIET_BELOW_DB: f64 = 40.0;
pub const MODERATE_BELOW_DB: f64 = 60.0;

/// Coarse banding of a dB level for the metrics line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseLevel {
    Quiet,
    Moderate,
    Loud,
}

impl NoiseLevel {
    pub fn classify(db: f64) -> Self {
        if db < QUIET_BELOW_DB {
            NoiseLevel::Quiet
        } else if db < MODERATE_BELOW_DB {
            NoiseLevel::Moderate
        } else {
            NoiseLevel::Loud
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoiseLevel::Quiet => "quiet",
            NoiseLevel::Moderate => "moderate",
            NoiseLevel::Loud => "loud",
        }
    }
}

impl fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(NoiseLevel::classify(0.0), NoiseLevel::Quiet);
        assert_eq!(NoiseLevel::classify(39.99), NoiseLevel::Quiet);
        assert_eq!(NoiseLevel::classify(40.0), NoiseLevel::Moderate);
        assert_eq!(NoiseLevel::classify(59.9), NoiseLevel::Moderate);
        assert_eq!(NoiseLevel::classify(60.0), NoiseLevel::Loud);
        assert_eq!(NoiseLevel::Loud.to_string(), "loud");
    }
}
