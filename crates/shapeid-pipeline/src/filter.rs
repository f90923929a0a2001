//! Minimum-area contour filter.
//!
//! Threshold images of real frames are full of tiny specks from sensor
//! and compression noise. Anything enclosing [`ClassifierConfig::min_area`]
//! square pixels or less never reaches the classifier.

use crate::types::{ClassifierConfig, Contour};

/// Rejects contours that enclose too little area to be a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourFilter {
    min_area: f64,
}

impl ContourFilter {
    /// Create a filter with an explicit area threshold in squared pixels.
    #[must_use]
    pub const fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    /// Create a filter from the classifier policy.
    #[must_use]
    pub const fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.min_area)
    }

    /// The area threshold. Contours at or below it are rejected.
    #[must_use]
    pub const fn min_area(&self) -> f64 {
        self.min_area
    }

    /// Returns `true` if the contour encloses strictly more than the
    /// minimum area.
    ///
    /// Contours with fewer than 3 points enclose no area and are always
    /// rejected.
    #[must_use]
    pub fn accepts(&self, contour: &Contour) -> bool {
        contour.area() > self.min_area
    }
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn rect(w: f64, h: f64) -> Contour {
        Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ])
    }

    #[test]
    fn default_threshold_is_300() {
        assert!((ContourFilter::default().min_area() - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn area_250_is_rejected() {
        assert!(!ContourFilter::default().accepts(&rect(25.0, 10.0)));
    }

    #[test]
    fn area_exactly_at_threshold_is_rejected() {
        assert!(!ContourFilter::default().accepts(&rect(30.0, 10.0)));
    }

    #[test]
    fn area_above_threshold_is_accepted() {
        assert!(ContourFilter::default().accepts(&rect(31.0, 10.0)));
    }

    #[test]
    fn degenerate_contours_are_rejected() {
        let filter = ContourFilter::new(0.0);
        assert!(!filter.accepts(&Contour::new(vec![])));
        assert!(!filter.accepts(&Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(500.0, 500.0),
        ])));
    }

    #[test]
    fn threshold_follows_config() {
        let config = ClassifierConfig {
            min_area: 1000.0,
            ..ClassifierConfig::default()
        };
        let filter = ContourFilter::from_config(&config);
        assert!(!filter.accepts(&rect(30.0, 30.0)));
        assert!(filter.accepts(&rect(40.0, 30.0)));
    }
}
