use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use crate::mol::Mol;
use crate::rings::SmallRings;
use crate::traits::HasAtomicNum;

/// Bridgehead nitrogens that cannot invert.
///
/// A three-coordinate, non-Kekulé-ambiguous nitrogen is azacyclic when two of
/// its small rings share more than two atoms and together contain all three of
/// its neighbours (as in quinuclidine or Tröger's base).
pub fn find_azacyclic<A, B>(
    mol: &Mol<A, B>,
    atoms: &FixedBitSet,
    rings: &SmallRings,
    kekule_ambiguous: &FixedBitSet,
) -> FixedBitSet
where
    A: HasAtomicNum,
{
    let n = mol.atom_count();
    let mut aza = FixedBitSet::with_capacity(n);

    for i in atoms.ones().filter(|&i| i < n) {
        let atom = NodeIndex::new(i);
        if mol.atom(atom).atomic_num() != 7 || mol.degree(atom) != 3 || kekule_ambiguous.contains(i) {
            continue;
        }
        let own: Vec<&FixedBitSet> = rings.atom_rings(atom).collect();
        if own.len() < 2 {
            continue;
        }

        let mut subs = FixedBitSet::with_capacity(n);
        for nb in mol.neighbors(atom) {
            subs.insert(nb.index());
        }

        'pairs: for (j, r1) in own.iter().enumerate() {
            for r2 in &own[j + 1..] {
                if r1.intersection(r2).count() <= 2 {
                    continue;
                }
                let mut union = (*r1).clone();
                union.union_with(r2);
                union.intersect_with(&subs);
                if union.count_ones(..) == 3 {
                    aza.insert(i);
                    break 'pairs;
                }
            }
        }
    }

    aza
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Bond};

    fn all(mol: &Mol<Atom, Bond>) -> FixedBitSet {
        let mut bs = FixedBitSet::with_capacity(mol.atom_count());
        bs.insert_range(..);
        bs
    }

    fn build(elements: &[u8], bonds: &[(usize, usize)]) -> Mol<Atom, Bond> {
        let mut mol = Mol::new();
        let idx: Vec<_> = elements.iter().map(|&z| mol.add_atom(Atom::new(z))).collect();
        for &(a, b) in bonds {
            mol.add_bond(idx[a], idx[b], Bond::default());
        }
        mol
    }

    fn detect(mol: &Mol<Atom, Bond>) -> FixedBitSet {
        let atoms = all(mol);
        let rings = SmallRings::find(mol, &atoms);
        let kekule = FixedBitSet::with_capacity(mol.atom_count());
        find_azacyclic(mol, &atoms, &rings, &kekule)
    }

    #[test]
    fn azabicycloheptane_bridgehead() {
        // 1-azabicyclo[2.2.1]heptane, bridgeheads N0 and C7, methyl C6 on C7
        let mol = build(
            &[7, 6, 6, 6, 6, 6, 6, 6],
            &[(0, 1), (1, 7), (0, 2), (2, 3), (3, 7), (0, 4), (4, 5), (5, 7), (7, 6)],
        );
        let aza = detect(&mol);
        assert!(aza.contains(0));
        assert_eq!(aza.count_ones(..), 1);
    }

    #[test]
    fn piperidine_nitrogen_is_not() {
        let mol = build(
            &[7, 6, 6, 6, 6, 6, 6],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6)],
        );
        assert_eq!(detect(&mol).count_ones(..), 0);
    }

    #[test]
    fn kekule_ambiguous_nitrogen_skipped() {
        let mol = build(
            &[7, 6, 6, 6, 6, 6, 6, 6],
            &[(0, 1), (1, 7), (0, 2), (2, 3), (3, 7), (0, 4), (4, 5), (5, 7), (7, 6)],
        );
        let atoms = all(&mol);
        let rings = SmallRings::find(&mol, &atoms);
        let mut kekule = FixedBitSet::with_capacity(mol.atom_count());
        kekule.insert(0);
        assert_eq!(find_azacyclic(&mol, &atoms, &rings, &kekule).count_ones(..), 0);
    }
}
