//! Vector geometry for handedness, planarity and torsion tests.

use nalgebra::{Point3, Vector3};
use petgraph::graph::NodeIndex;

use crate::error::CipError;
use crate::mol::Mol;
use crate::traits::HasPosition3D;

pub type Point = Point3<f64>;

/// Coordinates of `atom`, which must be present and finite.
pub fn atom_point<A: HasPosition3D, B>(mol: &Mol<A, B>, atom: NodeIndex) -> Result<Point, CipError> {
    let [x, y, z] = mol
        .atom(atom)
        .position_3d()
        .ok_or(CipError::MissingCoordinates { atom: atom.index() })?;
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return Err(CipError::InvalidCoordinates { atom: atom.index() });
    }
    Ok(Point::new(x, y, z))
}

/// Unit normal of the plane through `a`, `b`, `c`, oriented as `ab × ac`.
pub fn normal_through_points(a: &Point, b: &Point, c: &Point) -> Vector3<f64> {
    let n = (b - a).cross(&(c - a));
    n.try_normalize(0.0).unwrap_or(n)
}

/// Signed distance of `p` from the plane through `a`, `b`, `c`.
pub fn distance_to_plane(a: &Point, b: &Point, c: &Point, p: &Point) -> f64 {
    let n = normal_through_points(a, b, c);
    n.dot(&(p - a))
}

/// Signed dihedral angle a-b-c-d in radians, positive when clockwise.
pub fn torsion(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    y.atan2(x)
}

/// `true` when `d` lies on the side of plane `a, b, c` its normal points to.
pub fn is_above_plane(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    normal_through_points(a, b, c).dot(&(d - a)) > 0.0
}

/// `true` when `a` and `d` lie on the same side of the `b`-`c` axis, judged
/// by the normals of planes `a, b, c` and `b, c, d`.
pub fn is_cis(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    normal_through_points(a, b, c).dot(&normal_through_points(b, c, d)) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::new(x, y, z)
    }

    #[test]
    fn normal_is_unit_and_right_handed() {
        let n = normal_through_points(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0));
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn plane_distance_signed() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert!((distance_to_plane(&a, &b, &c, &p(0.3, 0.3, 2.0)) - 2.0).abs() < 1e-12);
        assert!((distance_to_plane(&a, &b, &c, &p(5.0, 5.0, -0.5)) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn torsion_sign() {
        let a = p(1.0, 0.0, 0.0);
        let b = p(0.0, 0.0, 0.0);
        let c = p(0.0, 0.0, 1.0);
        // Looking down b->c, d rotated clockwise from a.
        let cw = torsion(&a, &b, &c, &p(0.0, 1.0, 1.0));
        let ccw = torsion(&a, &b, &c, &p(0.0, -1.0, 1.0));
        assert!((cw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((ccw + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn cis_and_trans() {
        let b = p(0.0, 0.0, 0.0);
        let c = p(1.3, 0.0, 0.0);
        let a = p(-0.6, 1.0, 0.0);
        assert!(is_cis(&a, &b, &c, &p(1.9, 1.0, 0.0)));
        assert!(!is_cis(&a, &b, &c, &p(1.9, -1.0, 0.0)));
    }

    #[test]
    fn atom_point_checks_coordinates() {
        use crate::{Atom, Bond, WithPosition3D};

        let mut mol = Mol::<WithPosition3D<Atom>, Bond>::new();
        let a = mol.add_atom(WithPosition3D::new(Atom::new(6), [1.0, 2.0, 3.0]));
        let b = mol.add_atom(WithPosition3D {
            inner: Atom::new(6),
            position_3d: None,
        });
        let c = mol.add_atom(WithPosition3D::new(Atom::new(6), [f64::NAN, 0.0, 0.0]));
        assert_eq!(atom_point(&mol, a), Ok(p(1.0, 2.0, 3.0)));
        assert_eq!(atom_point(&mol, b), Err(CipError::MissingCoordinates { atom: 1 }));
        assert_eq!(atom_point(&mol, c), Err(CipError::InvalidCoordinates { atom: 2 }));
    }

    #[test]
    fn above_plane() {
        let (a, b, c) = (p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert!(is_above_plane(&a, &b, &c, &p(0.0, 0.0, 1.0)));
        assert!(!is_above_plane(&a, &b, &c, &p(0.0, 0.0, -1.0)));
    }
}
