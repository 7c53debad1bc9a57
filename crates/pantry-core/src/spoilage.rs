//! Visual spoilage bands
//!
//! Per-pixel color classification and the mapping from a spoiled-pixel
//! percentage to a [`SpoilageLevel`] and shelf-life reduction. The
//! thresholds are empirical and kept as overridable values.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoilageLevel {
    Fresh,
    SlightlySpoiled,
    StartingToSpoil,
    Spoiled,
}

impl fmt::Display for SpoilageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpoilageLevel::Fresh => "Fresh",
            SpoilageLevel::SlightlySpoiled => "Slightly Spoiled",
            SpoilageLevel::StartingToSpoil => "Starting to Spoil",
            SpoilageLevel::Spoiled => "Spoiled",
        };
        f.write_str(label)
    }
}

/// Color class of a single pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Brown,
    Dark,
    Other,
}

/// RGB cut-offs for brown and dark pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelThresholds {
    /// Brown: red strictly above this
    pub brown_min_red: u8,
    /// Brown: green strictly below this
    pub brown_max_green: u8,
    /// Brown: blue strictly below this
    pub brown_max_blue: u8,
    /// Dark: every channel strictly below this
    pub dark_max: u8,
}

impl Default for PixelThresholds {
    fn default() -> Self {
        Self {
            brown_min_red: 100,
            brown_max_green: 100,
            brown_max_blue: 100,
            dark_max: 50,
        }
    }
}

impl PixelThresholds {
    /// Brown is checked first; a pixel lands in at most one class.
    pub fn classify(&self, r: u8, g: u8, b: u8) -> PixelClass {
        if r > self.brown_min_red && g < self.brown_max_green && b < self.brown_max_blue {
            PixelClass::Brown
        } else if r < self.dark_max && g < self.dark_max && b < self.dark_max {
            PixelClass::Dark
        } else {
            PixelClass::Other
        }
    }
}

/// Percentage bands, most severe first. A band applies when the spoilage
/// percentage is strictly above its lower bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoilageBands {
    pub spoiled_above: f64,
    pub starting_above: f64,
    pub slight_above: f64,
    pub spoiled_reduction: f64,
    pub starting_reduction: f64,
    pub slight_reduction: f64,
}

impl Default for SpoilageBands {
    fn default() -> Self {
        Self {
            spoiled_above: 30.0,
            starting_above: 15.0,
            slight_above: 5.0,
            spoiled_reduction: 0.8,
            starting_reduction: 0.5,
            slight_reduction: 0.2,
        }
    }
}

impl SpoilageBands {
    pub fn classify(&self, spoilage_percentage: f64) -> (SpoilageLevel, f64) {
        if spoilage_percentage > self.spoiled_above {
            (SpoilageLevel::Spoiled, self.spoiled_reduction)
        } else if spoilage_percentage > self.starting_above {
            (SpoilageLevel::StartingToSpoil, self.starting_reduction)
        } else if spoilage_percentage > self.slight_above {
            (SpoilageLevel::SlightlySpoiled, self.slight_reduction)
        } else {
            (SpoilageLevel::Fresh, 0.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoilageAssessment {
    pub level: SpoilageLevel,
    pub spoilage_percentage: f64,
    pub brown_percentage: f64,
    pub dark_percentage: f64,
    pub shelf_life_reduction_factor: f64,
}

impl SpoilageAssessment {
    /// Build an assessment from pixel counts. An empty region reads as 0%.
    pub fn from_counts(brown: u64, dark: u64, total: u64, bands: &SpoilageBands) -> Self {
        let percent = |count: u64| {
            if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            }
        };

        let brown_percentage = percent(brown);
        let dark_percentage = percent(dark);
        let spoilage_percentage = (brown_percentage + dark_percentage) / 2.0;
        let (level, reduction) = bands.classify(spoilage_percentage);

        Self {
            level,
            spoilage_percentage,
            brown_percentage,
            dark_percentage,
            shelf_life_reduction_factor: reduction.clamp(0.0, 1.0),
        }
    }

    pub fn fresh() -> Self {
        Self::from_counts(0, 0, 0, &SpoilageBands::default())
    }
}
