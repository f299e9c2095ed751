//! Elliptical arcs to cubic beziers.
//!
//! Endpoint to center parameterization per
//! <https://www.w3.org/TR/SVG/implnote.html#ArcConversionEndpointToCenter>,
//! segmentation follows Blink's `SVGPathNormalizer::DecomposeArcToCubic`.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::{
    affine::Affine2D,
    geometry::{Point, Vector},
};

/// Some atan2 implementations are slightly imprecise, without the nudge we
/// sometimes emit one more segment than needed.
const SEGMENT_EPSILON: f64 = 0.001;

/// What an arc turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcSegment {
    /// The arc is a straight line to this point
    Line(Point),
    /// Two control points then the on-curve end point
    Cubic(Point, Point, Point),
}

impl ArcSegment {
    pub fn end(&self) -> Point {
        match self {
            ArcSegment::Line(end) | ArcSegment::Cubic(_, _, end) => *end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    pub start: Point,
    pub rx: f64,
    pub ry: f64,
    /// x-axis rotation, in degrees
    pub rotation: f64,
    pub large: bool,
    pub sweep: bool,
    pub end: Point,
}

#[derive(Debug, Clone, Copy)]
struct CenterParameterization {
    theta1: f64,
    theta_arc: f64,
    center: Point,
}

impl EllipticalArc {
    /// If rx = 0 or ry = 0 the arc is a straight line joining the endpoints.
    ///
    /// <http://www.w3.org/TR/SVG/implnote.html#ArcOutOfRangeParameters>
    pub fn is_straight_line(&self) -> bool {
        self.rx == 0.0 || self.ry == 0.0
    }

    pub fn is_zero_length(&self) -> bool {
        self.start == self.end
    }

    /// Scale radii up uniformly if they are too small to reach the end.
    ///
    /// <http://www.w3.org/TR/SVG/implnote.html#ArcCorrectionOutOfRangeRadii>
    fn correct_out_of_range_radii(self) -> EllipticalArc {
        if self.is_straight_line() || self.is_zero_length() {
            return self;
        }
        let mid_point_distance = (self.start - self.end) * 0.5;
        let point_transform = Affine2D::IDENTITY.rotate(-self.rotation.to_radians(), 0.0, 0.0);
        let mid = point_transform.map_vector(mid_point_distance);

        let radii_scale = mid.x * mid.x / (self.rx * self.rx) + mid.y * mid.y / (self.ry * self.ry);
        if radii_scale <= 1.0 {
            return self;
        }
        let scale = radii_scale.sqrt();
        EllipticalArc {
            rx: self.rx * scale,
            ry: self.ry * scale,
            ..self
        }
    }

    /// Only meaningful for arcs that are neither straight nor zero length.
    fn end_to_center_parameterization(&self) -> CenterParameterization {
        let point_transform = Affine2D::IDENTITY
            .scale(1.0 / self.rx, 1.0 / self.ry)
            .rotate(-self.rotation.to_radians(), 0.0, 0.0);

        let point1 = point_transform.map_point(self.start);
        let point2 = point_transform.map_point(self.end);
        let delta = point2 - point1;

        let d = delta.hypot2();
        let mut scale_factor = (1.0 / d - 0.25).max(0.0).sqrt();
        if self.sweep == self.large {
            scale_factor = -scale_factor;
        }
        let delta = delta * scale_factor;
        let center = point1 + (point2 - point1) * 0.5 + Vector::new(-delta.y, delta.x);
        let v1 = point1 - center;
        let v2 = point2 - center;

        let theta1 = v1.y.atan2(v1.x);
        let theta2 = v2.y.atan2(v2.x);
        let mut theta_arc = theta2 - theta1;
        if theta_arc < 0.0 && self.sweep {
            theta_arc += TAU;
        } else if theta_arc > 0.0 && !self.sweep {
            theta_arc -= TAU;
        }

        CenterParameterization {
            theta1,
            theta_arc,
            center: point_transform.inverse().map_point(center),
        }
    }

    fn cubics(&self) -> Vec<ArcSegment> {
        let arc = self.correct_out_of_range_radii();
        let params = arc.end_to_center_parameterization();
        let point_transform = Affine2D::IDENTITY
            .translate(params.center.x, params.center.y)
            .rotate(arc.rotation.to_radians(), 0.0, 0.0)
            .scale(arc.rx, arc.ry);

        let num_segments = (params.theta_arc / (FRAC_PI_2 + SEGMENT_EPSILON))
            .abs()
            .ceil() as usize;
        let mut segments = Vec::with_capacity(num_segments);
        for i in 0..num_segments {
            let start_theta = params.theta1 + i as f64 * params.theta_arc / num_segments as f64;
            let end_theta =
                params.theta1 + (i + 1) as f64 * params.theta_arc / num_segments as f64;

            let t = (4.0 / 3.0) * (0.25 * (end_theta - start_theta)).tan();
            if !t.is_finite() {
                break;
            }
            let (sin_start, cos_start) = start_theta.sin_cos();
            let (sin_end, cos_end) = end_theta.sin_cos();

            let point1 = Point::new(cos_start - t * sin_start, sin_start + t * cos_start);
            let end = Point::new(cos_end, sin_end);
            let point2 = end + Vector::new(t * sin_end, -t * cos_end);

            segments.push(ArcSegment::Cubic(
                point_transform.map_point(point1),
                point_transform.map_point(point2),
                point_transform.map_point(end),
            ));
        }
        segments
    }
}

/// Convert an arc, given in absolute coordinates, to cubics.
///
/// A straight-line arc yields a single [`ArcSegment::Line`], a zero length
/// arc yields nothing.
pub fn arc_to_cubic(arc: EllipticalArc) -> Vec<ArcSegment> {
    if arc.is_zero_length() {
        Vec::new()
    } else if arc.is_straight_line() {
        vec![ArcSegment::Line(arc.end)]
    } else {
        arc.cubics()
    }
}
