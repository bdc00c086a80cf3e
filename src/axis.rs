/*
 *  axis.rs
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

/// Fraction of the value span added above and below.
pub const AXIS_PADDING_RATIO: f64 = 0.2;
/// Padding used when every value is the same (or there are none).
pub const AXIS_MIN_PADDING: f64 = 10.0;

/// Y-axis domain for the history chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub lower: f64,
    pub upper: f64,
}

impl AxisBounds {
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Position of `value` inside the bounds, clamped to 0.0..=1.0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.lower) / span).clamp(0.0, 1.0)
    }
}

/// Bounds hug the data with 20% padding, floored at zero dB.
/// An empty series is treated as a flat line at zero.
pub fn y_axis_bounds(values: &[f64]) -> AxisBounds {
    let (min, max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 0.0));

    let mut padding = (max - min) * AXIS_PADDING_RATIO;
    if padding == 0.0 {
        padding = AXIS_MIN_PADDING;
    }

    AxisBounds {
        lower: (min - padding).floor().max(0.0),
        upper: (max + padding).ceil(),
    }
}
