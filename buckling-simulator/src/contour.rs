//! Marching-squares iso-lines for the contour view of the deflection field.

use ndarray::ArrayView2;

pub type Point = (f64, f64);
pub type Segment = (Point, Point);

/// `count` evenly spaced levels strictly between `min` and `max`.
/// A flat or non-finite range has no levels.
pub fn levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f64;
    (1..=count).map(|k| min + step * k as f64).collect()
}

/// Line segments where `values` crosses `level`, in the coordinates given by
/// `xs` (axis 0) and `ys` (axis 1).
pub fn iso_lines(values: &ArrayView2<f64>, xs: &[f64], ys: &[f64], level: f64) -> Vec<Segment> {
    let (nx, ny) = values.dim();
    debug_assert_eq!(xs.len(), nx);
    debug_assert_eq!(ys.len(), ny);

    let mut segments = Vec::new();
    if nx < 2 || ny < 2 {
        return segments;
    }

    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            // Corners counter-clockwise from (i, j)
            let corners = [
                ((xs[i], ys[j]), values[[i, j]]),
                ((xs[i + 1], ys[j]), values[[i + 1, j]]),
                ((xs[i + 1], ys[j + 1]), values[[i + 1, j + 1]]),
                ((xs[i], ys[j + 1]), values[[i, j + 1]]),
            ];
            cell_segments(&corners, level, &mut segments);
        }
    }
    segments
}

fn cell_segments(corners: &[(Point, f64); 4], level: f64, out: &mut Vec<Segment>) {
    let above = corners.map(|(_, v)| v > level);

    // Edge k joins corner k and corner k + 1.
    let mut crossing: [Option<Point>; 4] = [None; 4];
    for k in 0..4 {
        let (a, b) = (corners[k], corners[(k + 1) % 4]);
        if above[k] != above[(k + 1) % 4] {
            crossing[k] = Some(interpolate(a, b, level));
        }
    }

    match crossing {
        [None, None, None, None] => {}
        [Some(e0), Some(e1), Some(e2), Some(e3)] => {
            let centre = corners.iter().map(|(_, v)| v).sum::<f64>() / 4.0;
            if (centre > level) == above[0] {
                // Corners 0 and 2 connect through the centre.
                out.push((e0, e1));
                out.push((e2, e3));
            } else {
                out.push((e3, e0));
                out.push((e1, e2));
            }
        }
        _ => {
            let mut points = crossing.iter().flatten();
            if let (Some(&a), Some(&b)) = (points.next(), points.next()) {
                out.push((a, b));
            }
        }
    }
}

fn interpolate((pa, va): (Point, f64), (pb, vb): (Point, f64), level: f64) -> Point {
    let t = (level - va) / (vb - va);
    (pa.0 + t * (pb.0 - pa.0), pa.1 + t * (pb.1 - pa.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn levels_are_interior_and_even() {
        let l = levels(0.0, 1.0, 3);
        assert_eq!(l.len(), 3);
        assert_relative_eq!(l[0], 0.25);
        assert_relative_eq!(l[1], 0.5);
        assert_relative_eq!(l[2], 0.75);
        assert!(levels(2.0, 2.0, 5).is_empty());
        assert!(levels(0.0, f64::NAN, 5).is_empty());
    }

    #[test]
    fn ramp_crosses_at_the_interpolated_position() {
        let values = Array2::from_shape_fn((5, 4), |(i, _)| i as f64);
        let xs: Vec<f64> = (0..5).map(|i| i as f64 * 2.0).collect();
        let ys: Vec<f64> = (0..4).map(|j| j as f64).collect();
        let segments = iso_lines(&values.view(), &xs, &ys, 1.5);
        assert_eq!(segments.len(), 3);
        for (a, b) in segments {
            assert_relative_eq!(a.0, 3.0);
            assert_relative_eq!(b.0, 3.0);
            assert_relative_eq!((a.1 - b.1).abs(), 1.0);
        }
    }

    #[test]
    fn flat_field_has_no_lines() {
        let values = Array2::from_elem((4, 4), 0.3);
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert!(iso_lines(&values.view(), &axis, &axis, 0.3).is_empty());
    }

    #[test]
    fn saddle_produces_two_segments() {
        let values = array![[1.0, -1.0], [-1.0, 1.0]];
        let axis = [0.0, 1.0];
        let segments = iso_lines(&values.view(), &axis, &axis, 0.5);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn single_peak_is_enclosed() {
        let mut values = Array2::<f64>::zeros((3, 3));
        values[[1, 1]] = 1.0;
        let axis = [0.0, 1.0, 2.0];
        let segments = iso_lines(&values.view(), &axis, &axis, 0.5);
        // One segment in each of the four cells around the peak
        assert_eq!(segments.len(), 4);
        for (a, b) in segments {
            for p in [a, b] {
                let r = (p.0 - 1.0).abs() + (p.1 - 1.0).abs();
                assert_relative_eq!(r, 0.5, epsilon = 1e-12);
            }
        }
    }
}
