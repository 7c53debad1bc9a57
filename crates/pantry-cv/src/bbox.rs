//! Detector outputs as labelled bounding boxes
//!
//! Core abstraction for representing and filtering detection results.

use serde::{Deserialize, Serialize};

/// A single detector output: class label, confidence and a box in pixel
/// coordinates of the source image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
    #[serde(alias = "class", alias = "class_id")]
    pub label: String,
}

/// Pixel rectangle clipped to an image, `(x, y, width, height)`
pub type PixelRect = (u32, u32, u32, u32);

impl BBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
            label: String::new(),
        }
    }

    /// Set class label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Clip to an image of the given size. `None` when nothing of the box
    /// lies inside the image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.width as i64).min(image_width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(image_height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }

    /// Case-insensitive class check
    pub fn has_label(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label.trim())
    }
}

/// Collection of bounding boxes with batch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BBoxCollection {
    boxes: Vec<BBox>,
}

impl BBoxCollection {
    /// Create new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from vector of boxes
    pub fn from_vec(boxes: Vec<BBox>) -> Self {
        Self { boxes }
    }

    /// Get boxes as slice
    pub fn as_slice(&self) -> &[BBox] {
        &self.boxes
    }

    /// Get number of boxes
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Sort by confidence (descending)
    pub fn sort_by_confidence(&mut self) {
        self.boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    }

    /// Keep only boxes whose label is on the allow-list
    pub fn retain_labels<S: AsRef<str>>(mut self, allowed: &[S]) -> Self {
        self.boxes
            .retain(|bbox| allowed.iter().any(|label| bbox.has_label(label.as_ref())));
        self
    }

    /// Highest-confidence box; the first one wins ties
    pub fn best(&self) -> Option<&BBox> {
        self.boxes.iter().fold(None, |best: Option<&BBox>, bbox| match best {
            Some(current) if current.confidence >= bbox.confidence => Some(current),
            _ => Some(bbox),
        })
    }

    /// Label/confidence pairs, for catalog matching
    pub fn candidates(&self) -> impl Iterator<Item = (&str, f64)> {
        self.boxes.iter().map(|bbox| (bbox.label.as_str(), bbox.confidence))
    }

    /// Convert to iterator
    pub fn iter(&self) -> std::slice::Iter<'_, BBox> {
        self.boxes.iter()
    }
}

impl IntoIterator for BBoxCollection {
    type Item = BBox;
    type IntoIter = std::vec::IntoIter<BBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.into_iter()
    }
}

impl FromIterator<BBox> for BBoxCollection {
    fn from_iter<T: IntoIterator<Item = BBox>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BBoxCollection {
        BBoxCollection::from_vec(vec![
            BBox::new(0, 0, 10, 10, 0.4).with_label("banana"),
            BBox::new(5, 5, 10, 10, 0.9).with_label("person"),
            BBox::new(20, 20, 10, 10, 0.7).with_label("Apple"),
        ])
    }

    #[test]
    fn test_retain_labels() {
        let food = sample().retain_labels(&["banana", "apple"]);
        assert_eq!(food.len(), 2);
        assert_eq!(food.best().map(|b| b.label.as_str()), Some("Apple"));
    }

    #[test]
    fn test_best_prefers_first_on_tie() {
        let boxes = BBoxCollection::from_vec(vec![
            BBox::new(0, 0, 1, 1, 0.5).with_label("first"),
            BBox::new(0, 0, 1, 1, 0.5).with_label("second"),
        ]);
        assert_eq!(boxes.best().map(|b| b.label.as_str()), Some("first"));
        assert!(BBoxCollection::new().best().is_none());
    }

    #[test]
    fn test_clamp_to_image() {
        let bbox = BBox::new(-5, 10, 20, 100, 0.9);
        assert_eq!(bbox.clamp_to(50, 50), Some((0, 10, 15, 40)));

        assert_eq!(BBox::new(60, 0, 10, 10, 0.9).clamp_to(50, 50), None);
        assert_eq!(BBox::new(0, 0, 0, 10, 0.9).clamp_to(50, 50), None);
    }

    #[test]
    fn test_deserialize_detector_output() -> serde_json::Result<()> {
        let boxes: BBoxCollection = serde_json::from_str(
            r#"[{"x": 1, "y": 2, "width": 3, "height": 4, "confidence": 0.8, "class": "pizza"}]"#,
        )?;
        assert_eq!(boxes.as_slice()[0].label, "pizza");
        Ok(())
    }
}
