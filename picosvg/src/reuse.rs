//! Functions to help find opportunities to reuse shapes.
//!
//! A shape can be drawn as another shape plus a transform when one is an
//! affine image of the other. We assume the provided paths are valid, in
//! particular if they contain any commands they start with a move.

use std::ops::RangeInclusive;

use log::{trace, warn};

use crate::{
    affine::Affine2D,
    geometry::{almost_equal, AlmostEqual, Point, Vector, DEFAULT_ALMOST_EQUAL_TOLERANCE},
    path::{CommandKind, Path},
};

/// Must be at least N x tolerance to be significant
const SIGNIFICANCE_FACTOR: f64 = 5.0;
/// Digits to try when rounding an affine that works
const ROUND_RANGE: RangeInclusive<u32> = 3..=12;
const X_BASIS: Vector = Vector::new(1.0, 0.0);

/// Relative but for the initial move, with no H, V, S or T, so every command
/// moves in x and y.
fn affine_friendly(path: &Path) -> Path {
    path.expand_shorthand().relative().explicit_lines()
}

fn first_move(path: &Path) -> Option<Point> {
    let first = path.commands().first()?;
    (first.kind == CommandKind::MoveTo).then(|| Point::new(first.args()[0], first.args()[1]))
}

/// The end coordinates of each command; a close is (0, 0).
///
/// For a relative path that's the vector each command travels.
fn vectors(path: &Path) -> impl Iterator<Item = Vector> + '_ {
    path.iter().map(|cmd| {
        let (xs, ys) = cmd.kind.coord_indices();
        match (xs.last(), ys.last()) {
            (Some(x), Some(y)) => Vector::new(cmd.args()[*x], cmd.args()[*y]),
            _ => Vector::ZERO,
        }
    })
}

fn first_significant(
    path: &Path,
    value: impl Fn(Vector) -> f64,
    tolerance: f64,
) -> Option<(usize, Vector)> {
    let tolerance = SIGNIFICANCE_FACTOR * tolerance;
    vectors(path)
        .enumerate()
        .skip(1) // skip initial move
        .find(|(_, vec)| value(*vec).abs() > tolerance)
}

fn first_significant_for_both(
    s1: &Path,
    s2: &Path,
    value: impl Fn(Vector) -> f64,
    tolerance: f64,
) -> Option<(usize, Vector, Vector)> {
    let tolerance = SIGNIFICANCE_FACTOR * tolerance;
    vectors(s1)
        .zip(vectors(s2))
        .enumerate()
        .skip(1) // skip initial move
        .find(|(_, (vec1, vec2))| value(*vec1).abs() > tolerance && value(*vec2).abs() > tolerance)
        .map(|(idx, (vec1, vec2))| (idx, vec1, vec2))
}

/// The directional angle of `v`, unlike acos
fn angle(v: Vector) -> f64 {
    v.y.atan2(v.x)
}

/// Rotate and uniformly scale `from` onto `to`.
fn affine_vec_to_vec(from: Vector, to: Vector) -> Affine2D {
    let rotate = Affine2D::IDENTITY.rotate(angle(to) - angle(from), 0.0, 0.0);
    let vec = rotate.map_vector(from);
    let scale = if vec.hypot() != 0.0 {
        to.hypot() / vec.hypot()
    } else {
        0.0
    };
    Affine2D::compose_ltr(&[rotate, Affine2D::IDENTITY.scale(scale, scale)])
}

/// Map every coordinate of an affine friendly path.
///
/// Absolute coordinates are points, relative ones vectors that don't translate.
fn apply_affine(affine: &Affine2D, path: &Path) -> Path {
    let snap = |v: f64| {
        if almost_equal(v, 0.0, DEFAULT_ALMOST_EQUAL_TOLERANCE) {
            0.0
        } else {
            v
        }
    };
    path.rewrite(|_, mut cmd| {
        let (xs, ys) = cmd.kind.coord_indices();
        let relative = cmd.relative;
        let args = cmd.args_mut();
        for (x, y) in xs.iter().zip(ys) {
            let mapped = if relative {
                affine.map_vector((args[*x], args[*y])).to_point()
            } else {
                affine.map_point((args[*x], args[*y]))
            };
            args[*x] = snap(mapped.x);
            args[*y] = snap(mapped.y);
        }
        vec![cmd]
    })
}

/// A version of `path` that compares equal to other paths even if they are
/// offset, scaled, rotated, etc.
///
/// Intended use is to normalize multiple shapes to identify opportunity for
/// reuse. Best effort: equivalent shapes drawn with a different point order
/// or different commands do *not* normalize the same.
pub fn normalize(path: &Path, tolerance: f64) -> Path {
    let mut path = affine_friendly(path);

    // Always start at 0,0
    if let Some(start) = first_move(&path) {
        path = path.move_by(-start.x, -start.y);
    }

    // Normalize first activity to [1 0]; eliminates rotation and uniform scaling
    if let Some((_, vec_first)) = first_significant(&path, Vector::hypot, tolerance) {
        if !vec_first.almost_equals(&X_BASIS, DEFAULT_ALMOST_EQUAL_TOLERANCE) {
            path = apply_affine(&affine_vec_to_vec(vec_first, X_BASIS), &path);
        }
    }

    // Normalize first y activity to 1.0; eliminates mirroring and non-uniform scaling
    if let Some((_, vec_y)) = first_significant(&path, |v| v.y, tolerance) {
        if !almost_equal(vec_y.y, 1.0, DEFAULT_ALMOST_EQUAL_TOLERANCE) {
            path = apply_affine(&Affine2D::IDENTITY.scale(1.0, 1.0 / vec_y.y), &path);
        }
    }

    path.round_multiple(tolerance)
}

/// The affine that turns `s1` into `s2`, None if no solution was found.
///
/// Intended use is to call this only when the normalized versions of the
/// shapes are the same, in which case finding a solution is typical. The
/// affine is rounded to as few digits as still turn `s1` into `s2`.
pub fn affine_between(s1: &Path, s2: &Path, tolerance: f64) -> Option<Affine2D> {
    // Easy mode?
    if s1.almost_equals(s2, tolerance) {
        return Some(Affine2D::IDENTITY);
    }

    let s1 = affine_friendly(s1);
    let s2 = affine_friendly(s2);
    if s1.len() != s2.len() {
        return None;
    }

    let (Some(s1_move), Some(s2_move)) = (first_move(&s1), first_move(&s2)) else {
        warn!("At least one input does not start with a move");
        return None;
    };

    let works = |affine: &Affine2D| apply_affine(affine, &s1).almost_equals(&s2, tolerance);
    let rounded = |affine: Affine2D| {
        ROUND_RANGE
            .map(|ndigits| affine.round(ndigits))
            .find(|candidate| works(candidate))
            .unwrap_or(affine)
    };

    // Just move to the same start point?
    let affine = Affine2D::IDENTITY.translate(s2_move.x - s1_move.x, s2_move.y - s1_move.y);
    if works(&affine) {
        return Some(rounded(affine));
    }

    // Align the first edge with a significant x part.
    // Fixes rotation, x-scale, and uniform scaling.
    let Some((s2_vec1x_idx, s2_vec1x)) = first_significant(&s2, |v| v.x, tolerance) else {
        // https://github.com/googlefonts/picosvg/issues/246
        trace!("No edge with a significant x part");
        return None;
    };
    let s1_vec1 = vectors(&s1).nth(s2_vec1x_idx)?;

    let s1_to_origin = Affine2D::IDENTITY.translate(-s1_move.x, -s1_move.y);
    let s2_to_origin = Affine2D::IDENTITY.translate(-s2_move.x, -s2_move.y);
    let s1_vec1_to_s2_vec1x = affine_vec_to_vec(s1_vec1, s2_vec1x);
    let origin_to_s2 = Affine2D::IDENTITY.translate(s2_move.x, s2_move.y);

    let affine = Affine2D::compose_ltr(&[s1_to_origin, s1_vec1_to_s2_vec1x, origin_to_s2]);
    if works(&affine) {
        return Some(rounded(affine));
    }

    // Could be non-uniform scaling and/or mirroring.
    // Make the aligned edge the x axis then align the first edge with a significant y part.
    let s2_vec1_angle = angle(s2_vec1x);
    let rotate_s2vec1_onto_x = Affine2D::IDENTITY.rotate(-s2_vec1_angle, 0.0, 0.0);
    let rotate_s2vec1_off_x = Affine2D::IDENTITY.rotate(s2_vec1_angle, 0.0, 0.0);

    let s1_prime = apply_affine(
        &Affine2D::compose_ltr(&[s1_to_origin, s1_vec1_to_s2_vec1x, rotate_s2vec1_onto_x]),
        &s1,
    );
    let s2_prime = apply_affine(
        &Affine2D::compose_ltr(&[s2_to_origin, rotate_s2vec1_onto_x]),
        &s2,
    );

    // The first vector we aligned now lies on the x axis.
    // Find and align the first vector that heads off into y for both.
    let (_, s1_vecy, s2_vecy) =
        first_significant_for_both(&s1_prime, &s2_prime, |v| v.y, tolerance)?;
    let affine = Affine2D::compose_ltr(&[
        s1_to_origin,
        s1_vec1_to_s2_vec1x,
        // lie vec1 along x axis
        rotate_s2vec1_onto_x,
        // scale first y-vectors to match; x-parts should already match
        Affine2D::IDENTITY.scale(1.0, s2_vecy.y / s1_vecy.y),
        // restore the rotation we removed
        rotate_s2vec1_off_x,
        // drop into final position
        origin_to_s2,
    ]);
    if works(&affine) {
        return Some(rounded(affine));
    }

    // If we still aren't the same give up
    None
}
