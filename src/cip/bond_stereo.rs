//! E/Z and M/P for double bonds, cumulenes and atropisomeric bonds.
//!
//! Each end of the bond is ranked on its own, as a root whose parent is the
//! atom on the other side, and the two top-ranked substituents are compared
//! geometrically.

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use super::node::Digraph;
use super::{CipOptions, Outcome, Perception};
use crate::candidates::{could_be_chiral_alkene, AlkeneRole};
use crate::descriptor::{CipRule, Stereo, StereoDescriptor};
use crate::error::CipError;
use crate::geometry::{atom_point, is_cis, torsion};
use crate::mol::Mol;
use crate::rings::SmallRings;
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D};

/// Stereo of the ene `end1 … end2` from its top substituents `top1` (on
/// `end1`) and `top2` (on `end2`): M/P by signed torsion when `axial`, else
/// Z/E by comparing the normals of the two half planes.
pub(crate) fn ene_stereo<A, B>(mol: &Mol<A, B>, atoms: [NodeIndex; 4], axial: bool) -> Result<Stereo, CipError>
where
    A: HasPosition3D,
{
    let [t1, e1, e2, t2] = atoms;
    let (a, b, c, d) = (
        atom_point(mol, t1)?,
        atom_point(mol, e1)?,
        atom_point(mol, e2)?,
        atom_point(mol, t2)?,
    );
    Ok(if axial {
        if torsion(&a, &b, &c, &d) > 0.0 {
            Stereo::P
        } else {
            Stereo::M
        }
    } else if is_cis(&a, &b, &c, &d) {
        Stereo::Z
    } else {
        Stereo::E
    })
}

/// End of a chain of cumulated double bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CumuleneEnd {
    pub far: NodeIndex,
    /// Number of sp and sp2 atoms in the chain, both ends included.
    pub n_sp2: usize,
    /// The chain atoms next to the start and next to the far end.
    pub parents: [NodeIndex; 2],
}

/// Follows double bonds from `start` through `next` across two-coordinate
/// atoms to the far end of the chain.
pub(crate) fn last_cumulene_atom<A, B>(mol: &Mol<A, B>, start: NodeIndex, next: NodeIndex) -> CumuleneEnd
where
    B: HasBondOrder,
{
    let mut end = CumuleneEnd {
        far: next,
        n_sp2: 2,
        parents: [next, start],
    };
    let mut prev = start;
    let mut first = true;
    for _ in 0..mol.atom_count() {
        if mol.degree(end.far) != 2 {
            return end;
        }
        let Some((_, onward, order)) = mol.bonded(end.far).into_iter().find(|&(_, o, _)| o != prev) else {
            return end;
        };
        if order != 2 {
            return end;
        }
        if first {
            end.parents[0] = end.far;
            first = false;
        }
        end.parents[1] = end.far;
        end.n_sp2 += 1;
        prev = end.far;
        end.far = onward;
    }
    end
}

pub(crate) struct BondEvaluator<'a, A, B> {
    pub mol: &'a Mol<A, B>,
    pub perception: &'a Perception,
    pub options: &'a CipOptions,
    pub atropisomeric: &'a FixedBitSet,
}

impl<'a, A, B> BondEvaluator<'a, A, B>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    /// Evaluates the bonds of every atom still in `todo`, writing both ends'
    /// descriptors. Decided bonds take their end atoms out of `todo`.
    /// Returns the atom pairs of the decided non-atropisomeric bonds.
    ///
    /// Atropisomeric atoms go first and their double bonds are never
    /// evaluated, so atom numbering does not decide which bond an axis end
    /// belongs to.
    pub fn evaluate(&self, todo: &mut FixedBitSet, labels: &mut [StereoDescriptor]) -> Vec<(usize, usize)> {
        let n = self.mol.atom_count();
        let axis_ends = self.atropisomeric.ones().filter(|&i| i < n);
        let others = (0..n).filter(|&i| !self.atropisomeric.contains(i));
        let mut pairs = Vec::new();
        for i in axis_ends.chain(others) {
            if todo.contains(i) {
                self.atom_bonds(NodeIndex::new(i), todo, labels, &mut pairs);
            }
        }
        pairs
    }

    fn atom_bonds(
        &self,
        atom: NodeIndex,
        todo: &mut FixedBitSet,
        labels: &mut [StereoDescriptor],
        pairs: &mut Vec<(usize, usize)>,
    ) {
        let i = atom.index();
        let atropic = self.atropisomeric.contains(i);
        for (_, other, order) in self.mol.bonded(atom) {
            let (result, far) = if atropic {
                if !self.atropisomeric.contains(other.index()) {
                    continue;
                }
                (self.set_bond_chirality(atom, other, atom, other, true, labels), other)
            } else if order == 2 {
                let far = last_cumulene_atom(self.mol, atom, other).far;
                let axis_end = self.atropisomeric.contains(other.index()) || self.atropisomeric.contains(far.index());
                if far.index() < i || axis_end {
                    continue;
                }
                (self.bond_chirality(atom, other, labels), far)
            } else {
                continue;
            };

            match result {
                Ok(Some(stereo)) => {
                    debug!("bond {}-{}: {}", i, far.index(), stereo);
                    if !atropic {
                        pairs.push((i, far.index()));
                    }
                    todo.set(i, false);
                    todo.set(far.index(), false);
                }
                Ok(None) => {}
                Err(e) => warn!("bond {}-{} left without descriptor: {}", i, far.index(), e),
            }
            if atropic {
                break;
            }
        }
    }

    fn bond_chirality(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        labels: &mut [StereoDescriptor],
    ) -> Result<Option<Stereo>, CipError> {
        if could_be_chiral_alkene(self.mol, a, Some(b)) == AlkeneRole::NotCandidate {
            return Ok(None);
        }
        let chain = last_cumulene_atom(self.mol, a, b);
        let axial = chain.n_sp2 % 2 == 1;
        self.set_bond_chirality(a, chain.parents[0], chain.parents[1], chain.far, axial, labels)
    }

    /// Ranks both ends and, when each has a top substituent, derives the
    /// bond's stereo. The descriptor is written to `a` and `b` unless the
    /// bond is planar with an atropisomeric end; it is returned either way.
    fn set_bond_chirality(
        &self,
        a: NodeIndex,
        pa: NodeIndex,
        pb: NodeIndex,
        b: NodeIndex,
        axial: bool,
        labels: &mut [StereoDescriptor],
    ) -> Result<Option<Stereo>, CipError> {
        let Some((top_a, rule_a)) = self.end_top(a, pa)? else {
            return Ok(None);
        };
        let Some((top_b, rule_b)) = self.end_top(b, pb)? else {
            return Ok(None);
        };
        let mut stereo = ene_stereo(self.mol, [top_b, b, a, top_a], axial)?;

        let atropic = self.atropisomeric.contains(a.index()) || self.atropisomeric.contains(b.index());
        if axial || !atropic {
            if axial && ((rule_a == CipRule::Rule5) != (rule_b == CipRule::Rule5)) {
                stereo = match stereo {
                    Stereo::M => Stereo::PseudoM,
                    Stereo::P => Stereo::PseudoP,
                    other => other,
                };
            }
            labels[a.index()] = StereoDescriptor::new(stereo, rule_a);
            labels[b.index()] = StereoDescriptor::new(stereo, rule_b);
        }
        Ok(Some(stereo))
    }

    /// The top substituent on bond end `end`, seen from `parent`, and the
    /// rule that settled it.
    fn end_top(&self, end: NodeIndex, parent: NodeIndex) -> Result<Option<(NodeIndex, CipRule)>, CipError> {
        let mut dg = Digraph::new(self.mol, self.perception, self.options);
        let root = dg.create(Some(end), None, true, false, false);
        dg.root = root;
        let artificial = dg.create(Some(parent), None, true, false, false);
        dg.nodes[root].parent = Some(artificial);
        dg.nodes[root].path_points = dg.nodes[artificial].path_points.clone();
        match dg.run_rules(root, true)? {
            Outcome::Top { index, rule } => Ok(dg.nodes[root]
                .atoms
                .get(index)
                .copied()
                .flatten()
                .and_then(|c| dg.nodes[c].atom)
                .map(|atom| (atom, rule))),
            _ => Ok(None),
        }
    }
}

/// Double bonds inside a small ring cannot be stereogenic: both ends of
/// such a bond are reset to undetermined. Atropisomeric atoms are taken out
/// of the rings first.
pub(crate) fn clear_small_ring_ez(
    rings: &mut SmallRings,
    atropisomeric: &FixedBitSet,
    pairs: &[(usize, usize)],
    labels: &mut [StereoDescriptor],
) {
    rings.remove_atoms(atropisomeric);
    for &(a, b) in pairs.iter().rev() {
        if rings.share_ring(NodeIndex::new(a), NodeIndex::new(b)) {
            debug!("bond {}-{} lies in a small ring", a, b);
            labels[a] = StereoDescriptor::bare(Stereo::BothRs);
            labels[b] = StereoDescriptor::bare(Stereo::BothRs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Bond, BondOrder, WithPosition3D};

    fn chain(orders: &[BondOrder]) -> Mol<WithPosition3D<Atom>, Bond> {
        let mut mol = Mol::new();
        let atoms: Vec<_> = (0..=orders.len())
            .map(|i| mol.add_atom(WithPosition3D::new(Atom::new(6), [i as f64 * 1.3, 0.0, 0.0])))
            .collect();
        for (i, &order) in orders.iter().enumerate() {
            mol.add_bond(atoms[i], atoms[i + 1], Bond::new(order));
        }
        mol
    }

    #[test]
    fn plain_double_bond_is_planar() {
        let mol = chain(&[BondOrder::Double]);
        let end = last_cumulene_atom(&mol, NodeIndex::new(0), NodeIndex::new(1));
        assert_eq!(end.far, NodeIndex::new(1));
        assert_eq!(end.n_sp2, 2);
        assert_eq!(end.parents, [NodeIndex::new(1), NodeIndex::new(0)]);
    }

    #[test]
    fn allene_is_axial() {
        // C0=C1=C2 with a substituent on C2 so that it stops the walk
        let mut mol = chain(&[BondOrder::Double, BondOrder::Double]);
        let x = mol.add_atom(WithPosition3D::new(Atom::new(1), [3.0, 1.0, 0.0]));
        let y = mol.add_atom(WithPosition3D::new(Atom::new(1), [3.0, -1.0, 0.0]));
        mol.add_bond(NodeIndex::new(2), x, Bond::default());
        mol.add_bond(NodeIndex::new(2), y, Bond::default());
        let end = last_cumulene_atom(&mol, NodeIndex::new(0), NodeIndex::new(1));
        assert_eq!(end.far, NodeIndex::new(2));
        assert_eq!(end.n_sp2, 3);
        assert_eq!(end.parents, [NodeIndex::new(1), NodeIndex::new(1)]);
    }

    #[test]
    fn cumulene_walk_stops_at_single_bond() {
        let mol = chain(&[BondOrder::Double, BondOrder::Single]);
        let end = last_cumulene_atom(&mol, NodeIndex::new(0), NodeIndex::new(1));
        assert_eq!(end.far, NodeIndex::new(1));
        assert_eq!(end.n_sp2, 2);
    }

    #[test]
    fn cumulene_ring_walk_terminates() {
        let mut mol = chain(&[BondOrder::Double, BondOrder::Double, BondOrder::Double]);
        mol.add_bond(NodeIndex::new(3), NodeIndex::new(0), Bond::new(BondOrder::Double));
        let end = last_cumulene_atom(&mol, NodeIndex::new(0), NodeIndex::new(1));
        assert!(end.n_sp2 <= 2 + mol.atom_count());
    }

    #[test]
    fn ene_stereo_cis_and_trans() {
        let mut mol = Mol::<WithPosition3D<Atom>, Bond>::new();
        let pts = [[-1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.3, 0.0, 0.0], [2.3, 1.0, 0.0], [2.3, -1.0, 0.0]];
        let ids: Vec<_> = pts
            .iter()
            .map(|&p| mol.add_atom(WithPosition3D::new(Atom::new(6), p)))
            .collect();
        let cis = ene_stereo(&mol, [ids[0], ids[1], ids[2], ids[3]], false).unwrap();
        let trans = ene_stereo(&mol, [ids[0], ids[1], ids[2], ids[4]], false).unwrap();
        assert_eq!(cis, Stereo::Z);
        assert_eq!(trans, Stereo::E);
    }

    #[test]
    fn ring_pairs_cleared() {
        let mut mol = Mol::<Atom, Bond>::new();
        let ids: Vec<_> = (0..8).map(|_| mol.add_atom(Atom::new(6))).collect();
        for i in 0..6 {
            mol.add_bond(ids[i], ids[(i + 1) % 6], Bond::default());
        }
        mol.add_bond(ids[5], ids[6], Bond::default());
        mol.add_bond(ids[6], ids[7], Bond::new(BondOrder::Double));
        let mut all = FixedBitSet::with_capacity(8);
        all.insert_range(..);
        let mut rings = SmallRings::find(&mol, &all);
        assert_eq!(rings.num_rings(), 1);
        let mut labels = vec![StereoDescriptor::new(Stereo::Z, CipRule::Rule1a); 8];
        clear_small_ring_ez(&mut rings, &FixedBitSet::with_capacity(8), &[(0, 1), (6, 7)], &mut labels);
        assert_eq!(labels[0], StereoDescriptor::bare(Stereo::BothRs));
        assert_eq!(labels[1], StereoDescriptor::bare(Stereo::BothRs));
        assert_eq!(labels[6].stereo, Stereo::Z);
    }
}
