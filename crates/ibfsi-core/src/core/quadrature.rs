//! Gauss quadrature rules on the reference cells and on element faces.
//!
//! A rule is selected by the number of Gauss-Legendre points per direction,
//! `n ∈ 1..=4`. Quadrilaterals use the tensor product of the 1D rule; triangles
//! use a symmetric rule of matching polynomial degree (1, 3, 6 or 7 points).
//! Face rules map the 1D rule onto each straight edge.

use super::models::element::ElementKind;
use nalgebra::Point2;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureError {
    #[error("Gauss rules are available for 1 to 4 points per direction, got {0}")]
    UnsupportedOrder(usize),
}

/// A quadrature point in reference coordinates with its reference weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraturePoint {
    pub reference: Point2<f64>,
    pub weight: f64,
}

impl QuadraturePoint {
    fn new(xi: f64, eta: f64, weight: f64) -> Self {
        Self {
            reference: Point2::new(xi, eta),
            weight,
        }
    }
}

/// Gauss-Legendre points and weights on `[-1, 1]`.
pub fn gauss_legendre(n: usize) -> Result<Vec<(f64, f64)>, QuadratureError> {
    let rule = match n {
        1 => vec![(0.0, 2.0)],
        2 => {
            let p = 1.0 / 3.0_f64.sqrt();
            vec![(-p, 1.0), (p, 1.0)]
        }
        3 => {
            let p = (3.0 / 5.0_f64).sqrt();
            vec![(-p, 5.0 / 9.0), (0.0, 8.0 / 9.0), (p, 5.0 / 9.0)]
        }
        4 => {
            let sqrt_6_5 = (6.0 / 5.0_f64).sqrt();
            let inner = ((3.0 - 2.0 * sqrt_6_5) / 7.0).sqrt();
            let outer = ((3.0 + 2.0 * sqrt_6_5) / 7.0).sqrt();
            let sqrt_30 = 30.0_f64.sqrt();
            let w_inner = (18.0 + sqrt_30) / 36.0;
            let w_outer = (18.0 - sqrt_30) / 36.0;
            vec![
                (-outer, w_outer),
                (-inner, w_inner),
                (inner, w_inner),
                (outer, w_outer),
            ]
        }
        _ => return Err(QuadratureError::UnsupportedOrder(n)),
    };
    Ok(rule)
}

fn quadrilateral_rule(n: usize) -> Result<Vec<QuadraturePoint>, QuadratureError> {
    let line = gauss_legendre(n)?;
    Ok(line
        .iter()
        .flat_map(|&(eta, w_eta)| {
            line.iter()
                .map(move |&(xi, w_xi)| QuadraturePoint::new(xi, eta, w_xi * w_eta))
        })
        .collect())
}

/// Symmetric rules on the reference triangle; weights sum to its area, 1/2.
fn triangle_rule(n: usize) -> Result<Vec<QuadraturePoint>, QuadratureError> {
    let orbit = |a: f64, b: f64, w: f64| {
        [
            QuadraturePoint::new(a, b, w),
            QuadraturePoint::new(b, a, w),
            QuadraturePoint::new(b, b, w),
        ]
    };
    let rule = match n {
        1 => vec![QuadraturePoint::new(1.0 / 3.0, 1.0 / 3.0, 0.5)],
        2 => orbit(2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0).to_vec(),
        3 => {
            let mut points = orbit(
                0.108_103_018_168_070,
                0.445_948_490_915_965,
                0.223_381_589_678_011 / 2.0,
            )
            .to_vec();
            points.extend(orbit(
                0.816_847_572_980_459,
                0.091_576_213_509_771,
                0.109_951_743_655_322 / 2.0,
            ));
            points
        }
        4 => {
            let mut points = vec![QuadraturePoint::new(1.0 / 3.0, 1.0 / 3.0, 0.225 / 2.0)];
            points.extend(orbit(
                0.059_715_871_789_770,
                0.470_142_064_105_115,
                0.132_394_152_788_506 / 2.0,
            ));
            points.extend(orbit(
                0.797_426_985_353_087,
                0.101_286_507_323_456,
                0.125_939_180_544_827 / 2.0,
            ));
            points
        }
        _ => return Err(QuadratureError::UnsupportedOrder(n)),
    };
    Ok(rule)
}

/// Volume quadrature for every supported element kind at one order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureFormula {
    n_points_1d: usize,
    triangle: Vec<QuadraturePoint>,
    quadrilateral: Vec<QuadraturePoint>,
}

impl QuadratureFormula {
    pub fn gauss(n_points_1d: usize) -> Result<Self, QuadratureError> {
        Ok(Self {
            n_points_1d,
            triangle: triangle_rule(n_points_1d)?,
            quadrilateral: quadrilateral_rule(n_points_1d)?,
        })
    }

    pub fn n_points_1d(&self) -> usize {
        self.n_points_1d
    }

    pub fn points(&self, kind: ElementKind) -> &[QuadraturePoint] {
        match kind {
            ElementKind::Tri3 => &self.triangle,
            ElementKind::Quad4 => &self.quadrilateral,
        }
    }

    pub fn size(&self, kind: ElementKind) -> usize {
        self.points(kind).len()
    }
}

/// Gauss-Legendre rule for straight faces, parameterized by `s ∈ [-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceQuadrature {
    points: Vec<(f64, f64)>,
}

impl FaceQuadrature {
    pub fn gauss(n_points: usize) -> Result<Self, QuadratureError> {
        Ok(Self {
            points: gauss_legendre(n_points)?,
        })
    }

    /// `(s, weight)` pairs on `[-1, 1]`.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }
}
