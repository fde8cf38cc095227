use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use crate::element::is_first_row;
use crate::error::CipError;
use crate::geometry::{atom_point, distance_to_plane};
use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D};

/// Out-of-plane distance (Å) below which a three-coordinate centre counts as
/// planar.
pub const PLANARITY_CUTOFF: f64 = 0.2;

/// Three-coordinate heavy main-group centres with a stable lone pair.
const PYRAMIDAL_HETEROATOMS: [u8; 8] = [15, 16, 33, 34, 51, 52, 83, 84];

/// What a double-bond end can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlkeneRole {
    NotCandidate,
    /// One end of a stereogenic double bond.
    End,
    /// Central atom of a cumulated chain.
    CumuleneCentre,
}

/// Signed distance of the fourth substituent (or of the centre itself when it
/// has three) from the plane through the first three substituents.
pub fn trigonality<A, B>(mol: &Mol<A, B>, atom: NodeIndex) -> Result<f64, CipError>
where
    A: HasPosition3D,
{
    let pts = mol
        .neighbors(atom)
        .take(4)
        .map(|nb| atom_point(mol, nb))
        .collect::<Result<Vec<_>, _>>()?;
    if pts.len() < 3 {
        return Ok(0.0);
    }
    let probe = match pts.get(3) {
        Some(p) => *p,
        None => atom_point(mol, atom)?,
    };
    Ok(distance_to_plane(&pts[0], &pts[1], &pts[2], &probe))
}

/// `true` when `atom` may be a stereogenic centre.
///
/// Four-coordinate atoms must be non-planar. Three-coordinate atoms qualify by
/// element: bridgehead (azacyclic) nitrogen, beryllium and the pyramidal
/// heavy heteroatoms must be non-planar; carbon must be planar or carry a
/// double bond, since it can only be an alkene end. Two-coordinate atoms
/// qualify only as imine nitrogen. Atoms carrying two protium substituents
/// never qualify.
pub fn could_be_chiral_atom<A, B>(
    mol: &Mol<A, B>,
    atom: NodeIndex,
    azacyclic: &FixedBitSet,
) -> Result<bool, CipError>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    let z = mol.atom(atom).atomic_num();
    let mut must_be_planar = false;
    match mol.degree(atom) {
        0 | 1 => return Ok(false),
        2 => return Ok(z == 7),
        3 => match z {
            7 if azacyclic.contains(atom.index()) => {}
            6 => must_be_planar = true,
            4 => {}
            z if PYRAMIDAL_HETEROATOMS.contains(&z) => {}
            _ => return Ok(false),
        },
        4 => {}
        _ => return Ok(false),
    }

    let mut n_h = 0;
    let mut have_double = false;
    for (_, other, order) in mol.bonded(atom) {
        if must_be_planar && order == 2 {
            have_double = true;
        }
        if is_protium(mol.atom(other)) {
            n_h += 1;
        }
    }
    if n_h >= 2 {
        return Ok(false);
    }
    if have_double {
        return Ok(true);
    }
    let planar = trigonality(mol, atom)?.abs() < PLANARITY_CUTOFF;
    Ok(must_be_planar == planar)
}

fn is_protium<A: HasAtomicNum + HasIsotope>(atom: &A) -> bool {
    atom.atomic_num() == 1 && matches!(atom.isotope(), 0 | 1)
}

/// Classifies `atom` as a possible double-bond end. With `partner`, the
/// double bond must go to that atom, which must not be terminal.
pub fn could_be_chiral_alkene<A, B>(mol: &Mol<A, B>, atom: NodeIndex, partner: Option<NodeIndex>) -> AlkeneRole
where
    A: HasAtomicNum,
    B: HasBondOrder,
{
    match mol.degree(atom) {
        2 if mol.atom(atom).atomic_num() == 7 => {}
        3 if is_first_row(mol.atom(atom).atomic_num()) => {}
        _ => return AlkeneRole::NotCandidate,
    }
    let mut n_double = 0;
    for (_, other, order) in mol.bonded(atom) {
        if order != 2 {
            continue;
        }
        n_double += 1;
        if n_double > 1 {
            return AlkeneRole::CumuleneCentre;
        }
        if !is_first_row(mol.atom(other).atomic_num()) {
            return AlkeneRole::NotCandidate;
        }
        if let Some(b) = partner {
            if other != b || mol.degree(b) == 1 {
                return AlkeneRole::NotCandidate;
            }
        }
    }
    AlkeneRole::End
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Bond, BondOrder, WithPosition3D};

    type Mol3 = Mol<WithPosition3D<Atom>, Bond>;

    fn at(mol: &mut Mol3, z: u8, pos: [f64; 3]) -> NodeIndex {
        mol.add_atom(WithPosition3D::new(Atom::new(z), pos))
    }

    fn tetrahedral(subs: [u8; 4]) -> (Mol3, NodeIndex) {
        let mut mol = Mol3::new();
        let c = at(&mut mol, 6, [0.0, 0.0, 0.0]);
        let dirs = [
            [1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
        ];
        for (z, d) in subs.into_iter().zip(dirs) {
            let s = at(&mut mol, z, d);
            mol.add_bond(c, s, Bond::default());
        }
        (mol, c)
    }

    fn none(mol: &Mol3) -> FixedBitSet {
        FixedBitSet::with_capacity(mol.atom_count())
    }

    #[test]
    fn tetrahedral_centre_qualifies() {
        let (mol, c) = tetrahedral([1, 9, 17, 35]);
        assert!(could_be_chiral_atom(&mol, c, &none(&mol)).unwrap());
    }

    #[test]
    fn methylene_rejected() {
        let (mol, c) = tetrahedral([1, 1, 17, 35]);
        assert!(!could_be_chiral_atom(&mol, c, &none(&mol)).unwrap());
    }

    #[test]
    fn deuterium_counts_as_distinct() {
        let (mut mol, c) = tetrahedral([1, 1, 17, 35]);
        mol.atom_mut(NodeIndex::new(1)).inner.isotope = 2;
        assert!(could_be_chiral_atom(&mol, c, &none(&mol)).unwrap());
    }

    #[test]
    fn flat_four_coordinate_rejected() {
        let mut mol = Mol3::new();
        let c = at(&mut mol, 6, [0.0, 0.0, 0.0]);
        for (z, p) in [(9, [1.0, 0.0, 0.0]), (17, [0.0, 1.0, 0.0]), (35, [-1.0, 0.0, 0.0]), (1, [0.0, -1.0, 0.0])] {
            let s = at(&mut mol, z, p);
            mol.add_bond(c, s, Bond::default());
        }
        assert!(!could_be_chiral_atom(&mol, c, &none(&mol)).unwrap());
    }

    #[test]
    fn amine_nitrogen_needs_azacyclic() {
        let mut mol = Mol3::new();
        let n = at(&mut mol, 7, [0.0, 0.0, 0.4]);
        for p in [[1.0, 0.0, 0.0], [-0.5, 0.87, 0.0], [-0.5, -0.87, 0.0]] {
            let s = at(&mut mol, 6, p);
            mol.add_bond(n, s, Bond::default());
        }
        assert!(!could_be_chiral_atom(&mol, n, &none(&mol)).unwrap());
        let mut aza = none(&mol);
        aza.insert(n.index());
        assert!(could_be_chiral_atom(&mol, n, &aza).unwrap());
    }

    #[test]
    fn sulfoxide_sulfur_pyramidal() {
        let mut mol = Mol3::new();
        let s = at(&mut mol, 16, [0.0, 0.0, 0.5]);
        for (z, p) in [(8, [1.0, 0.0, 0.0]), (6, [-0.5, 0.87, 0.0]), (6, [-0.5, -0.87, 0.0])] {
            let x = at(&mut mol, z, p);
            mol.add_bond(s, x, Bond::default());
        }
        assert!(could_be_chiral_atom(&mol, s, &none(&mol)).unwrap());
    }

    #[test]
    fn alkene_carbon_qualifies_by_double_bond() {
        let mut mol = Mol3::new();
        let c = at(&mut mol, 6, [0.0, 0.0, 0.0]);
        let c2 = at(&mut mol, 6, [1.3, 0.0, 0.0]);
        let h = at(&mut mol, 1, [-0.5, 0.9, 0.0]);
        let f = at(&mut mol, 9, [-0.5, -0.9, 0.0]);
        mol.add_bond(c, c2, Bond::new(BondOrder::Double));
        mol.add_bond(c, h, Bond::default());
        mol.add_bond(c, f, Bond::default());
        assert!(could_be_chiral_atom(&mol, c, &none(&mol)).unwrap());
        assert_eq!(could_be_chiral_alkene(&mol, c, None), AlkeneRole::End);
        // the partner is terminal
        assert_eq!(could_be_chiral_alkene(&mol, c, Some(c2)), AlkeneRole::NotCandidate);
    }

    #[test]
    fn missing_coordinates_propagate() {
        let mut mol = Mol3::new();
        let c = at(&mut mol, 6, [0.0, 0.0, 0.0]);
        for z in [1, 9, 17, 35] {
            let s = mol.add_atom(WithPosition3D {
                inner: Atom::new(z),
                position_3d: None,
            });
            mol.add_bond(c, s, Bond::default());
        }
        assert!(matches!(
            could_be_chiral_atom(&mol, c, &none(&mol)),
            Err(CipError::MissingCoordinates { .. })
        ));
    }

    fn ethene_like() -> (Mol<Atom, Bond>, NodeIndex, NodeIndex) {
        let mut mol = Mol::new();
        let a = mol.add_atom(Atom::new(6));
        let b = mol.add_atom(Atom::new(6));
        mol.add_bond(a, b, Bond::new(BondOrder::Double));
        for end in [a, b] {
            for z in [1, 9] {
                let s = mol.add_atom(Atom::new(z));
                mol.add_bond(end, s, Bond::default());
            }
        }
        (mol, a, b)
    }

    #[test]
    fn alkene_end_roles() {
        let (mol, a, b) = ethene_like();
        assert_eq!(could_be_chiral_alkene(&mol, a, None), AlkeneRole::End);
        assert_eq!(could_be_chiral_alkene(&mol, a, Some(b)), AlkeneRole::End);
        assert_eq!(could_be_chiral_alkene(&mol, a, Some(NodeIndex::new(2))), AlkeneRole::NotCandidate);
    }

    #[test]
    fn allene_centre() {
        let mut mol = Mol::<Atom, Bond>::new();
        let c = mol.add_atom(Atom::new(6));
        let l = mol.add_atom(Atom::new(6));
        let r = mol.add_atom(Atom::new(6));
        let h = mol.add_atom(Atom::new(1));
        mol.add_bond(c, l, Bond::new(BondOrder::Double));
        mol.add_bond(c, r, Bond::new(BondOrder::Double));
        // a third bond brings the centre into the three-coordinate branch
        mol.add_bond(c, h, Bond::default());
        assert_eq!(could_be_chiral_alkene(&mol, c, None), AlkeneRole::CumuleneCentre);
    }

    #[test]
    fn heavy_partner_rejected() {
        let mut mol = Mol::<Atom, Bond>::new();
        let c = mol.add_atom(Atom::new(6));
        let si = mol.add_atom(Atom::new(14));
        mol.add_bond(c, si, Bond::new(BondOrder::Double));
        for z in [1, 9] {
            let s = mol.add_atom(Atom::new(z));
            mol.add_bond(c, s, Bond::default());
        }
        assert_eq!(could_be_chiral_alkene(&mol, c, None), AlkeneRole::NotCandidate);
    }

    #[test]
    fn imine_nitrogen() {
        let mut mol = Mol::<Atom, Bond>::new();
        let n = mol.add_atom(Atom::new(7));
        let c = mol.add_atom(Atom::new(6));
        let o = mol.add_atom(Atom::new(8));
        mol.add_bond(n, c, Bond::new(BondOrder::Double));
        mol.add_bond(n, o, Bond::default());
        assert_eq!(could_be_chiral_alkene(&mol, n, None), AlkeneRole::End);
    }
}
