//! Garden path geometry: the fixed polyline and cursors that travel along it.

use std::{str::FromStr, sync::Arc};

use garden_defence_core::Coordinate;
use thiserror::Error;

/// Minimum number of points a path must contain to form a segment.
const MIN_PATH_POINTS: usize = 2;

/// Errors raised while parsing a path definition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The definition did not start with a point count.
    #[error("path definition is empty; expected a point count")]
    MissingCount,
    /// A token could not be parsed as an integer.
    #[error("invalid integer `{token}` in path definition")]
    InvalidToken {
        /// Offending token.
        token: String,
    },
    /// The definition ended before every announced point was read.
    #[error("path definition ends before coordinate {index}")]
    MissingCoordinate {
        /// Zero-based index of the incomplete point.
        index: usize,
    },
    /// The path has fewer points than a single segment needs.
    #[error("path needs at least {MIN_PATH_POINTS} points, found {count}")]
    TooFewPoints {
        /// Number of points announced by the definition.
        count: usize,
    },
}

/// Ordered polyline enemies travel along.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPoints {
    points: Arc<[Coordinate]>,
}

impl PathPoints {
    /// Creates a path from the provided points.
    pub fn new(points: Vec<Coordinate>) -> Result<Self, PathError> {
        if points.len() < MIN_PATH_POINTS {
            return Err(PathError::TooFewPoints {
                count: points.len(),
            });
        }

        Ok(Self {
            points: points.into(),
        })
    }

    /// Parses a whitespace separated definition: a count `N` followed by `N`
    /// pairs of `x y` integers. Tokens after the last pair are ignored.
    pub fn parse(definition: &str) -> Result<Self, PathError> {
        let mut tokens = definition.split_whitespace();
        let count_token = tokens.next().ok_or(PathError::MissingCount)?;
        let count = parse_token::<usize>(count_token)?;
        if count < MIN_PATH_POINTS {
            return Err(PathError::TooFewPoints { count });
        }

        let mut points = Vec::new();
        for index in 0..count {
            let x = tokens
                .next()
                .ok_or(PathError::MissingCoordinate { index })?;
            let y = tokens
                .next()
                .ok_or(PathError::MissingCoordinate { index })?;
            points.push(Coordinate::new(parse_token(x)?, parse_token(y)?));
        }

        Self::new(points)
    }

    /// Points composing the path in travel order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Returns a cursor positioned at the first point of the path.
    #[must_use]
    pub fn start(&self) -> PathPosition {
        PathPosition {
            points: Arc::clone(&self.points),
            segment: 0,
            percentage: 0.0,
        }
    }

    /// Sum of all segment lengths.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| segment_length(pair[0], pair[1]))
            .sum()
    }

    /// Shortest distance from the point to any segment of the path.
    #[must_use]
    pub fn distance_to_path(&self, point: Coordinate) -> f64 {
        self.points
            .windows(2)
            .map(|pair| distance_to_segment(point, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min)
    }
}

impl FromStr for PathPoints {
    type Err = PathError;

    fn from_str(definition: &str) -> Result<Self, Self::Err> {
        Self::parse(definition)
    }
}

/// Cursor on a path, expressed as a segment index and progress along it.
#[derive(Clone, Debug, PartialEq)]
pub struct PathPosition {
    points: Arc<[Coordinate]>,
    segment: usize,
    percentage: f64,
}

impl PathPosition {
    /// Reports whether the cursor has reached the final point.
    #[must_use]
    pub fn is_at_the_end(&self) -> bool {
        self.segment + 1 >= self.points.len()
    }

    /// Index of the segment the cursor currently travels.
    #[must_use]
    pub fn segment(&self) -> usize {
        self.segment
    }

    /// Progress along the current segment in `[0, 1)`.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Pixel position of the cursor, truncated toward zero.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        if self.is_at_the_end() {
            return self.points[self.points.len() - 1];
        }

        let start = self.points[self.segment];
        let end = self.points[self.segment + 1];
        let dx = f64::from(end.x()) - f64::from(start.x());
        let dy = f64::from(end.y()) - f64::from(start.y());

        Coordinate::new(
            (f64::from(start.x()) + dx * self.percentage) as i32,
            (f64::from(start.y()) + dy * self.percentage) as i32,
        )
    }

    /// Moves the cursor forward by an arc-length distance in pixels.
    ///
    /// Remaining distance carries over segment boundaries. Zero-length
    /// segments are stepped over, and negative or NaN distances are treated
    /// as zero.
    pub fn advance(&mut self, distance: f64) {
        let mut remaining = distance.max(0.0);

        while !self.is_at_the_end() {
            let start = self.points[self.segment];
            let end = self.points[self.segment + 1];
            let length = segment_length(start, end);
            let left_on_segment = length * (1.0 - self.percentage);

            if left_on_segment <= remaining {
                remaining -= left_on_segment;
                self.segment += 1;
                self.percentage = 0.0;
                continue;
            }

            self.percentage += remaining / length;
            if self.percentage >= 1.0 {
                // Rounding landed on the segment end.
                self.segment += 1;
                self.percentage = 0.0;
            }
            return;
        }

        self.percentage = 0.0;
    }
}

fn parse_token<T: FromStr>(token: &str) -> Result<T, PathError> {
    token.parse().map_err(|_| PathError::InvalidToken {
        token: token.to_owned(),
    })
}

fn segment_length(start: Coordinate, end: Coordinate) -> f64 {
    let dx = f64::from(end.x()) - f64::from(start.x());
    let dy = f64::from(end.y()) - f64::from(start.y());
    dx.hypot(dy)
}

fn distance_to_segment(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    let px = f64::from(point.x());
    let py = f64::from(point.y());
    let sx = f64::from(start.x());
    let sy = f64::from(start.y());
    let vx = f64::from(end.x()) - sx;
    let vy = f64::from(end.y()) - sy;
    let length_sq = vx * vx + vy * vy;

    if length_sq <= f64::EPSILON {
        return (px - sx).hypot(py - sy);
    }

    let t = (((px - sx) * vx + (py - sy) * vy) / length_sq).clamp(0.0, 1.0);
    let nearest_x = sx + vx * t;
    let nearest_y = sy + vy * t;
    (px - nearest_x).hypot(py - nearest_y)
}
