use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use crate::mol::Mol;
use crate::rings::SmallRings;
use crate::traits::HasBondOrder;

/// Atoms of six-membered rings whose every member carries a double bond
/// inside the ring (or already belongs to such a ring). These atoms have two
/// equivalent Kekulé structures, so the position of a multiple bond duplicate
/// on them is averaged.
///
/// Rings are scanned from last to first; after each accepted ring the scan
/// restarts, since newly marked atoms can complete a fused neighbour.
pub fn find_kekule_ambiguous<A, B>(mol: &Mol<A, B>, rings: &SmallRings) -> FixedBitSet
where
    B: HasBondOrder,
{
    let n = mol.atom_count();
    let ring_list = rings.rings();
    let mut ambiguous = FixedBitSet::with_capacity(n);
    let mut done = FixedBitSet::with_capacity(ring_list.len());

    let mut i = ring_list.len();
    while i > 0 {
        i -= 1;
        if done.contains(i) {
            continue;
        }
        let ring = &ring_list[i];
        if ring.count_ones(..) != 6 {
            done.insert(i);
            continue;
        }
        let n_pi = ring
            .ones()
            .filter(|&a| ambiguous.contains(a) || has_ring_double_bond(mol, NodeIndex::new(a), ring))
            .count();
        if n_pi == 6 {
            ambiguous.union_with(ring);
            done.insert(i);
            i = ring_list.len();
        }
    }

    ambiguous
}

fn has_ring_double_bond<A, B: HasBondOrder>(mol: &Mol<A, B>, atom: NodeIndex, ring: &FixedBitSet) -> bool {
    let degree = mol.degree(atom);
    if degree != 2 && degree != 3 {
        return false;
    }
    mol.bonded(atom)
        .into_iter()
        .any(|(_, other, order)| order == 2 && ring.contains(other.index()))
}
