//! Shared types for the shapeid frame pipeline.

use std::fmt;

use geo::{Area, BoundingRect};
use serde::{Deserialize, Serialize};

use crate::resize::ResizeFilter;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// resized frame without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// A closed polygonal boundary.
///
/// The edge from the last point back to the first is implicit; the
/// first point is never repeated at the end. Both traced contours and
/// their polygon approximations use this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from its boundary points.
    ///
    /// A trailing point equal to the first one is dropped so the ring
    /// is stored without an explicit closing vertex.
    #[must_use]
    pub fn new(mut points: Vec<Point>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points (vertices) in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Absolute enclosed area in squared pixels.
    ///
    /// Contours with fewer than 3 points enclose nothing and report 0.
    #[must_use]
    pub fn area(&self) -> f64 {
        if self.0.len() < 3 {
            return 0.0;
        }
        geo::Polygon::new(self.to_line_string(), vec![]).unsigned_area()
    }

    /// Length of the closed boundary, including the closing edge.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        match self.0.as_slice() {
            [] | [_] => 0.0,
            [first, .., last] => {
                let open: f64 = self.0.windows(2).map(|w| w[0].distance(w[1])).sum();
                open + last.distance(*first)
            }
        }
    }

    /// Smallest whole-pixel rectangle covering every point.
    ///
    /// Traced points are pixel positions, so a contour around a block
    /// `w` pixels wide has its points `w - 1` apart and a box `w` wide.
    /// Returns `None` for an empty contour.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let rect = self.to_line_string().bounding_rect()?;
        Some(BoundingBox::covering_pixels(rect.min(), rect.max()))
    }

    fn to_line_string(&self) -> geo::LineString<f64> {
        self.0.iter().copied().collect()
    }
}

/// Axis-aligned bounding box in image coordinates.
///
/// `width` and `height` count pixels: a box whose left and right
/// columns are the same pixel is 1 wide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl BoundingBox {
    /// The box covering every pixel from the one containing `min` to
    /// the one containing `max`, inclusive.
    fn covering_pixels(min: geo::Coord<f64>, max: geo::Coord<f64>) -> Self {
        let (x, y) = (min.x.floor(), min.y.floor());
        Self {
            x,
            y,
            width: max.x.floor() - x + 1.0,
            height: max.y.floor() - y + 1.0,
        }
    }

    /// The top-left corner, used as the label anchor.
    #[must_use]
    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// `width / height`, or `None` when the box has no height.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0.0).then(|| self.width / self.height)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The fixed shape taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShapeLabel {
    /// Three vertices.
    Triangle,
    /// Four vertices with a near-unit aspect ratio.
    Square,
    /// Four vertices outside the square aspect band.
    Rectangle,
    /// Five to seven vertices.
    Polygon,
    /// More than seven vertices.
    Circle,
}

impl ShapeLabel {
    /// All labels, in decision-table order.
    pub const ALL: [Self; 5] = [
        Self::Triangle,
        Self::Square,
        Self::Rectangle,
        Self::Polygon,
        Self::Circle,
    ];

    /// Human-readable name, as drawn next to a detection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triangle => "Triangle",
            Self::Square => "Square",
            Self::Rectangle => "Rectangle",
            Self::Polygon => "Polygon",
            Self::Circle => "Circle",
        }
    }
}

impl fmt::Display for ShapeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled shape found in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Shape label from the decision table.
    pub label: ShapeLabel,
    /// Polygon approximation of the contour, for outline drawing.
    pub outline: Contour,
    /// Top-left corner of the contour's bounding box, for label placement.
    pub anchor: Point,
    /// Bounding box of the original contour.
    pub bounding_box: BoundingBox,
}

/// Tunable classification policy.
///
/// Defaults reproduce the fixed policy: minimum area 300 px²,
/// tolerance 2% of the perimeter, square band `[0.95, 1.05]`, and
/// more than 7 vertices counting as a circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Contours enclosing this area or less (px²) are discarded as noise.
    pub min_area: f64,

    /// Approximation tolerance as a fraction of the contour perimeter.
    pub epsilon_factor: f64,

    /// Lowest width/height ratio (inclusive) at which a quadrilateral
    /// is a square.
    pub square_aspect_min: f64,

    /// Highest width/height ratio (inclusive) at which a quadrilateral
    /// is a square.
    pub square_aspect_max: f64,

    /// Largest vertex count still labelled a polygon. Anything above
    /// is a circle.
    pub polygon_max_vertices: usize,
}

impl ClassifierConfig {
    /// Default minimum enclosed area in squared pixels.
    pub const DEFAULT_MIN_AREA: f64 = 300.0;
    /// Default approximation tolerance factor.
    pub const DEFAULT_EPSILON_FACTOR: f64 = 0.02;
    /// Default lower bound of the square aspect band.
    pub const DEFAULT_SQUARE_ASPECT_MIN: f64 = 0.95;
    /// Default upper bound of the square aspect band.
    pub const DEFAULT_SQUARE_ASPECT_MAX: f64 = 1.05;
    /// Default largest polygon vertex count.
    pub const DEFAULT_POLYGON_MAX_VERTICES: usize = 7;

    /// Check the policy for values that would make classification
    /// meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        if !(self.epsilon_factor > 0.0 && self.epsilon_factor < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "epsilon_factor must be in (0, 1), got {}",
                self.epsilon_factor
            )));
        }
        if !self.square_aspect_min.is_finite()
            || !self.square_aspect_max.is_finite()
            || self.square_aspect_min <= 0.0
            || self.square_aspect_min > self.square_aspect_max
        {
            return Err(PipelineError::InvalidConfig(format!(
                "square aspect band [{}, {}] is empty or non-positive",
                self.square_aspect_min, self.square_aspect_max
            )));
        }
        if self.polygon_max_vertices < 4 {
            return Err(PipelineError::InvalidConfig(format!(
                "polygon_max_vertices must be at least 4, got {}",
                self.polygon_max_vertices
            )));
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_area: Self::DEFAULT_MIN_AREA,
            epsilon_factor: Self::DEFAULT_EPSILON_FACTOR,
            square_aspect_min: Self::DEFAULT_SQUARE_ASPECT_MIN,
            square_aspect_max: Self::DEFAULT_SQUARE_ASPECT_MAX,
            polygon_max_vertices: Self::DEFAULT_POLYGON_MAX_VERTICES,
        }
    }
}

/// Configuration for the frame processing pipeline.
///
/// Missing fields fall back to their defaults when deserialized, so a
/// JSON config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Size every frame is resized to before processing. `None` keeps
    /// the native resolution.
    pub frame_size: Option<Dimensions>,

    /// Resampling filter used for the resize step.
    pub resize_filter: ResizeFilter,

    /// Gaussian blur sigma applied to the grayscale frame.
    pub blur_sigma: f32,

    /// Inverse binary threshold. Pixels brighter than this become
    /// background; the rest become foreground.
    pub threshold: u8,

    /// Canny low threshold for the inspection edge map.
    pub canny_low: f32,

    /// Canny high threshold for the inspection edge map.
    pub canny_high: f32,

    /// Contour filter and classifier policy.
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Default frame size (640x480).
    pub const DEFAULT_FRAME_SIZE: Dimensions = Dimensions {
        width: 640,
        height: 480,
    };
    /// Default blur sigma: what a 5x5 Gaussian kernel with automatic
    /// sigma works out to.
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;
    /// Default resize filter (bilinear).
    pub const DEFAULT_RESIZE_FILTER: ResizeFilter = ResizeFilter::Triangle;
    /// Default inverse binary threshold.
    pub const DEFAULT_THRESHOLD: u8 = 100;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 50.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 150.0;

    /// Check every field, including the nested classifier policy.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if let Some(size) = self.frame_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "frame size must be non-zero, got {}x{}",
                size.width, size.height
            )));
        }
        if !self.blur_sigma.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "blur_sigma must be finite".to_string(),
            ));
        }
        if !self.canny_low.is_finite() || !self.canny_high.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "canny thresholds must be finite".to_string(),
            ));
        }
        if self.canny_low > self.canny_high {
            return Err(PipelineError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        self.classifier.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_size: Some(Self::DEFAULT_FRAME_SIZE),
            resize_filter: Self::DEFAULT_RESIZE_FILTER,
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            threshold: Self::DEFAULT_THRESHOLD,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Shapes found in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Accepted and classified contours, in trace order.
    pub detections: Vec<Detection>,

    /// Dimensions of the processed (resized) frame in pixels.
    pub dimensions: Dimensions,
}

/// Result of processing a frame with every intermediate preserved.
///
/// Used for inspection: the CLI renders the threshold and edge maps
/// next to the annotated frame.
#[derive(Debug, Clone)]
pub struct StagedFrame {
    /// Frame after resizing, in RGBA.
    pub frame: RgbaImage,
    /// Grayscale conversion of `frame`.
    pub grayscale: GrayImage,
    /// Gaussian-blurred grayscale.
    pub blurred: GrayImage,
    /// Inverse binary threshold of `blurred`; contours are traced here.
    pub threshold: GrayImage,
    /// Canny edge map of `blurred`.
    pub edges: GrayImage,
    /// Every external contour traced from `threshold`.
    pub contours: Vec<Contour>,
    /// Contours that passed the filter and received a label.
    pub detections: Vec<Detection>,
    /// Frame dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedFrame {
    /// Drop the rasters and keep only what a caller without a display
    /// needs.
    #[must_use]
    pub fn into_result(self) -> FrameResult {
        FrameResult {
            detections: self.detections,
            dimensions: self.dimensions,
        }
    }
}

/// Errors that can occur during frame processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input frame.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input frame bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
