//! Color and bar encoding of ranks.
//!
//! Rank 1 is the best rank. The scale of every function is the number of
//! regions of the live dataset, never a fixed constant.

use std::fmt::Display;

use crate::config::Polarity;

/// The intensity given to the worst rank.
pub const MIN_INTENSITY: u8 = 50;
/// The intensity given to the best rank (and to a lone region).
pub const MAX_INTENSITY: u8 = 255;

/// Linear color intensity of a rank, in `[MIN_INTENSITY, MAX_INTENSITY]`.
///
/// `50 + floor(205 * (max_rank - rank) / (max_rank - 1))`. With a single
/// region (or none) there is nothing to compare against and the maximum
/// intensity is returned. Ranks outside `[1, max_rank]` are clamped.
pub fn color_intensity(rank: u32, max_rank: u32) -> u8 {
    if max_rank <= 1 {
        return MAX_INTENSITY;
    }
    let rank = rank.clamp(1, max_rank) as u64;
    let max_rank = max_rank as u64;
    let span = (MAX_INTENSITY - MIN_INTENSITY) as u64;
    let step = span * (max_rank - rank) / (max_rank - 1);
    MIN_INTENSITY + step as u8
}

/// Number of filled segments of a bar of `total_units` segments.
///
/// `total_units - rank + 1`, clamped to `[0, total_units]`: rank 1 fills the
/// whole bar, the last rank fills one segment.
pub fn bar_filled_count(rank: u32, total_units: u32) -> u32 {
    let filled = total_units as i64 - rank as i64 + 1;
    filled.clamp(0, total_units as i64) as u32
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Channel {
    Red,
    Green,
}

/// Higher-is-better fields are green, lower-is-better fields are red.
pub fn color_channel(polarity: Polarity) -> Channel {
    match polarity {
        Polarity::Positive => Channel::Green,
        Polarity::Negative => Channel::Red,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// A color with `intensity` in the given channel and 0 elsewhere.
    pub fn in_channel(channel: Channel, intensity: u8) -> Rgb {
        match channel {
            Channel::Red => Rgb {
                r: intensity,
                g: 0,
                b: 0,
            },
            Channel::Green => Rgb {
                r: 0,
                g: intensity,
                b: 0,
            },
        }
    }
}

/// CSS notation, as used for the `fill` style of a map region.
impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// The fill of a region for a field.
pub fn fill_color(rank: u32, max_rank: u32, polarity: Polarity) -> Rgb {
    Rgb::in_channel(color_channel(polarity), color_intensity(rank, max_rank))
}

/// A segmented bar, as shown in the details of a region.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Bar {
    pub filled: u32,
    pub total: u32,
    pub channel: Channel,
}

impl Bar {
    pub fn new(rank: u32, total_units: u32, polarity: Polarity) -> Bar {
        Bar {
            filled: bar_filled_count(rank, total_units),
            total: total_units,
            channel: color_channel(polarity),
        }
    }

    /// `true` for a filled segment, from left to right.
    pub fn segments(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.total).map(move |i| i < self.filled)
    }
}
