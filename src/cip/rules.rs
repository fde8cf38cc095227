//! Sequence-rule comparators and substituent ranking.
//!
//! Every comparator answers "does `x` outrank `y`": [`Ordering::Less`] means
//! `x` wins, [`Ordering::Greater`] means `y` wins. Rules 4b and 5 may also
//! decline to compare, which is reported as `None`.

use std::cmp::Ordering;
use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::trace;

use super::node::{duplicate_cmp, AuxLabel, Digraph, NodeId, Pass};
use super::Rule1bPolicy;
use crate::descriptor::CipRule;
use crate::error::CipError;
use crate::geometry::{atom_point, is_above_plane};
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D};

/// Sense of rotation of the three leading substituents seen with the
/// fourth pointing away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hand {
    R,
    S,
}

/// A decided tie-break and the sphere at which the difference was found.
/// Shallower differences take precedence.
type TieBreak = (Ordering, usize);

/// Position of an auxiliary label in the rule 4a or 4c preference scale.
/// A label wins when it sits at least two places above the other one.
fn aux_rank(rule: CipRule, aux: Option<AuxLabel>) -> i32 {
    match (rule, aux) {
        (CipRule::Rule4a, Some(AuxLabel::PseudoS)) => 1,
        (CipRule::Rule4a, Some(AuxLabel::PseudoR)) => 2,
        (CipRule::Rule4a, Some(AuxLabel::S)) => 4,
        (CipRule::Rule4a, Some(AuxLabel::R)) => 5,
        (CipRule::Rule4c, Some(AuxLabel::PseudoS)) => 1,
        (CipRule::Rule4c, Some(AuxLabel::PseudoR)) => 3,
        _ => -1,
    }
}

/// Which of two like/unlike sets dominates: the one holding the lowest bit
/// where they differ. `None` when the sets are equal.
pub(crate) fn compare_like_unlike(a: &FixedBitSet, b: &FixedBitSet) -> Option<Ordering> {
    let first = a.symmetric_difference(b).min()?;
    Some(if a.contains(first) {
        Ordering::Less
    } else {
        Ordering::Greater
    })
}

fn set_bit(bs: &mut FixedBitSet, bit: usize) {
    if bit >= bs.len() {
        bs.grow(bit + 1);
    }
    bs.insert(bit);
}

impl<'a, A, B> Digraph<'a, A, B>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    pub(crate) fn rule1a(&self, x: NodeId, y: NodeId) -> Ordering {
        let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
        if ny.is_phantom() {
            return Ordering::Less;
        }
        if nx.is_phantom() {
            return Ordering::Greater;
        }
        ny.elem_no.partial_cmp(&nx.elem_no).unwrap_or(Ordering::Equal)
    }

    pub(crate) fn rule1b(&self, x: NodeId, y: NodeId) -> Ordering {
        let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
        if nx.is_duplicate != ny.is_duplicate {
            return Ordering::Equal;
        }
        if self.options.rule1b == Rule1bPolicy::IgnoreAlkene
            && (self.parent_is_alkene(x) || self.parent_is_alkene(y))
        {
            return Ordering::Equal;
        }
        nx.root_distance.cmp(&ny.root_distance)
    }

    fn parent_is_alkene(&self, id: NodeId) -> bool {
        self.nodes[id].parent.is_some_and(|p| self.nodes[p].is_alkene)
    }

    pub(crate) fn rule2(&self, x: NodeId, y: NodeId) -> Ordering {
        let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
        if nx.mass == ny.mass {
            Ordering::Equal
        } else if (nx.reverse_rule2 || ny.reverse_rule2) == (ny.mass > nx.mass) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Z before E before undetermined, for substituents hanging off the far
    /// atoms of two different even-length enes.
    fn rule3(&self, x: NodeId, y: NodeId) -> Ordering {
        let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
        if nx.is_duplicate || ny.is_duplicate {
            return Ordering::Equal;
        }
        let (Some(px), Some(py)) = (nx.parent, ny.parent) else {
            return Ordering::Equal;
        };
        if px == py || !self.nodes[px].is_alkene_atom2 || !self.nodes[py].is_alkene_atom2 {
            return Ordering::Equal;
        }
        let even = |p: NodeId| {
            self.nodes[p]
                .alkene_parent
                .is_some_and(|ap| self.nodes[ap].is_even_ene)
        };
        if !even(px) || !even(py) {
            return Ordering::Equal;
        }
        self.nodes[px].aux_ez.cmp(&self.nodes[py].aux_ez)
    }

    fn rule4ac(&self, x: NodeId, y: NodeId) -> Ordering {
        let nx = &self.nodes[x];
        if nx.is_terminal || nx.is_duplicate {
            return Ordering::Equal;
        }
        let rx = aux_rank(self.rule, nx.aux);
        let ry = aux_rank(self.rule, self.nodes[y].aux);
        if rx > ry + 1 {
            Ordering::Less
        } else if ry > rx + 1 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn rule4b5(&mut self, x: NodeId, y: NodeId) -> Result<Option<Ordering>, CipError> {
        if self.nodes[x].is_terminal || self.nodes[y].is_terminal {
            return Ok(Some(Ordering::Equal));
        }
        let bx = self.like_unlike_set(x)?;
        let by = self.like_unlike_set(y)?;
        Ok(compare_like_unlike(&bx, &by))
    }

    fn rule6(&self, x: NodeId, y: NodeId) -> Ordering {
        let is_ref = |id: NodeId| {
            let atom = self.nodes[id].atom;
            atom.is_some() && atom == self.rule6_ref
        };
        match (is_ref(x), is_ref(y)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    /// Ranking used to order a subtree before reading off its like/unlike
    /// set: nodes of the reference type first.
    fn reference_cmp(&self, x: NodeId, y: NodeId) -> Ordering {
        let (tx, ty) = (self.nodes[x].rule4_type, self.nodes[y].rule4_type);
        if tx == ty {
            Ordering::Equal
        } else if tx == self.rule4_ref {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Compares two nodes by the current rule. `None` means the rule
    /// declines to compare them.
    pub(crate) fn check_current_rule(&mut self, x: NodeId, y: NodeId) -> Result<Option<Ordering>, CipError> {
        if self.reference_ranking {
            return Ok(Some(self.reference_cmp(x, y)));
        }
        let order = match self.rule {
            CipRule::Rule1a => self.rule1a(x, y),
            CipRule::Rule1b => self.rule1b(x, y),
            CipRule::Rule2 => self.rule2(x, y),
            CipRule::Rule3 => self.rule3(x, y),
            CipRule::Rule4a | CipRule::Rule4c => self.rule4ac(x, y),
            CipRule::Rule4b | CipRule::Rule5 => return self.rule4b5(x, y),
            CipRule::Rule6 => self.rule6(x, y),
        };
        Ok(Some(order))
    }

    fn check_priority(&mut self, x: NodeId, y: NodeId) -> Result<Ordering, CipError> {
        match (self.nodes[x].is_phantom(), self.nodes[y].is_phantom()) {
            (true, false) => return Ok(Ordering::Greater),
            (false, true) => return Ok(Ordering::Less),
            _ => {}
        }
        Ok(self.check_current_rule(x, y)?.unwrap_or(Ordering::Equal))
    }

    /// Ranks the four child slots of `id` under the current rule.
    ///
    /// Returns `true` once every real substituent has its own rank. In
    /// reference ranking only `new_atoms` is filled and `false` is returned.
    pub(crate) fn sort_substituents(&mut self, id: NodeId, pass: Pass) -> Result<bool, CipError> {
        let full = match pass {
            Pass::Prepare | Pass::Sphere(0) => 4,
            Pass::Sphere(_) => 3,
        };
        if !self.reference_ranking && self.nodes[id].n_priorities == full {
            return Ok(true);
        }
        let prepare = pass == Pass::Prepare;
        if prepare {
            if self.nodes[id].is_terminal {
                return Ok(false);
            }
            let children = self.nodes[id].atoms;
            match self.rule {
                CipRule::Rule6 => {
                    for child in children.into_iter().flatten() {
                        let c = &self.nodes[child];
                        if !c.is_duplicate && !c.is_phantom() && self.set_node(child) {
                            self.sort_substituents(child, Pass::Prepare)?;
                        }
                    }
                }
                CipRule::Rule4a | CipRule::Rule4c => {
                    for child in children.into_iter().flatten() {
                        if self.nodes[child].is_chiral_path {
                            self.sort_substituents(child, Pass::Prepare)?;
                        }
                    }
                    if !self.nodes[id].is_sp3 {
                        return Ok(false);
                    }
                }
                _ => {}
            }
        }
        let ignore_ties =
            prepare || (!self.reference_ranking && matches!(self.rule, CipRule::Rule4b | CipRule::Rule5));
        let sphere = match pass {
            Pass::Sphere(s) => s,
            Pass::Prepare => 0,
        };

        let atoms = self.nodes[id].atoms;
        let [Some(_), Some(_), Some(_), Some(_)] = atoms else {
            return Ok(false);
        };
        if self.reference_ranking {
            for child in atoms.into_iter().flatten() {
                if let Some(branch) = self.nodes[child].next_chiral_branch {
                    self.sort_substituents(branch, pass)?;
                }
            }
        }

        let priorities = self.nodes[id].priorities;
        let mut rank = [0u32; 4];
        let mut index = [0usize; 4];
        for h in 0..4 {
            for j in h + 1..4 {
                let (Some(x), Some(y)) = (atoms[h], atoms[j]) else {
                    continue;
                };
                let order = if self.nodes[x].is_phantom() {
                    Ordering::Greater
                } else if self.nodes[y].is_phantom() {
                    Ordering::Less
                } else if priorities[h] != priorities[j] {
                    priorities[h].cmp(&priorities[j])
                } else {
                    match self.check_priority(x, y)? {
                        Ordering::Equal if ignore_ties => Ordering::Equal,
                        Ordering::Equal => self
                            .break_tie(x, y, sphere + 1)?
                            .map_or(Ordering::Equal, |(o, _)| o),
                        decided => decided,
                    }
                };
                match order {
                    Ordering::Greater => {
                        rank[h] += 1;
                        index[h] += 1;
                    }
                    Ordering::Less => {
                        rank[j] += 1;
                        index[j] += 1;
                    }
                    Ordering::Equal => index[j] += 1,
                }
            }
        }

        let mut new_atoms = [None; 4];
        let mut new_priorities = [0u32; 4];
        let mut ranks_seen = 0u8;
        for i in 0..4 {
            let slot = index[i];
            if slot >= 4 || new_atoms[slot].is_some() {
                return Err(CipError::InconsistentRanking {
                    atom: self.nodes[id].atom.map_or(self.root_atom_index(), |a| a.index()),
                });
            }
            new_atoms[slot] = atoms[i];
            new_priorities[slot] = rank[i];
            if atoms[i].is_some_and(|c| !self.nodes[c].is_phantom()) {
                ranks_seen |= 1 << rank[i];
            }
        }
        self.nodes[id].new_atoms = Some(new_atoms);
        if self.reference_ranking {
            return Ok(false);
        }

        let node = &mut self.nodes[id];
        node.atoms = new_atoms;
        node.priorities = new_priorities;
        node.n_priorities = ranks_seen.count_ones() as usize;
        trace!(
            "{} ranked atom {:?} at sphere {}: {:?}",
            self.rule,
            node.atom.map(|a| a.index()),
            sphere,
            node.priorities
        );
        Ok(node.n_priorities == node.bond_count)
    }

    /// Explores the subtrees of two tied nodes breadth-wise until a
    /// difference appears. Returns the order and the sphere it was found at.
    fn break_tie(&mut self, x: NodeId, y: NodeId, sphere: usize) -> Result<Option<TieBreak>, CipError> {
        {
            let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
            if nx.is_duplicate && ny.is_duplicate && nx.atom == ny.atom && nx.root_distance == ny.root_distance {
                return Ok(None);
            }
            let dup = duplicate_cmp(nx, ny);
            if dup != Ordering::Equal {
                return Ok(Some((dup, sphere + 1)));
            }
        }
        if !self.set_node(x) || !self.set_node(y) {
            return Ok(None);
        }
        let (tx, ty) = (self.nodes[x].is_terminal, self.nodes[y].is_terminal);
        if (tx && ty) || (self.nodes[x].is_duplicate && self.nodes[y].is_duplicate) {
            return Ok(None);
        }
        if tx != ty {
            let order = if tx { Ordering::Greater } else { Ordering::Less };
            return Ok(Some((order, sphere + 1)));
        }
        if let Some(order) = self.compare_shallowly(x, y)? {
            return Ok(Some((order, sphere + 1)));
        }

        self.sort_substituents(x, Pass::Sphere(sphere))?;
        self.sort_substituents(y, Pass::Sphere(sphere))?;
        let n = self.nodes[x].n_atoms;
        if n == 0 {
            return Ok(Some((Ordering::Greater, 1)));
        }
        let (xs, ys) = (self.nodes[x].atoms, self.nodes[y].atoms);
        let mut best: Option<TieBreak> = None;
        for f in 0..n {
            let (Some(g), Some(h)) = (xs[f], ys[f]) else {
                continue;
            };
            if let Some((order, depth)) = self.break_tie(g, h, sphere + 1)? {
                if best.map_or(true, |(_, d)| depth < d) {
                    best = Some((order, depth));
                }
            }
        }
        Ok(best)
    }

    /// Compares the already-ordered children of `x` and `y` slot by slot.
    fn compare_shallowly(&mut self, x: NodeId, y: NodeId) -> Result<Option<Ordering>, CipError> {
        for c in 0..self.nodes[x].n_atoms {
            let (Some(d), Some(e)) = (self.nodes[x].atoms[c], self.nodes[y].atoms[c]) else {
                continue;
            };
            match self.check_current_rule(d, e)? {
                None | Some(Ordering::Equal) => continue,
                decided => return Ok(decided),
            }
        }
        Ok(None)
    }

    /// The like/unlike set compared by rules 4b and 5: the dominant one of
    /// the two reference sets, or the type-1 set under rule 5.
    fn like_unlike_set(&mut self, id: NodeId) -> Result<FixedBitSet, CipError> {
        if self.nodes[id].bs_rs.is_none() {
            let first = self.reference_set(id, 1)?;
            let second = self.reference_set(id, 2)?;
            self.nodes[id].bs_rs = Some(Box::new([first, second]));
        }
        let Some(sets) = self.nodes[id].bs_rs.as_deref() else {
            return Ok(FixedBitSet::new());
        };
        if self.rule == CipRule::Rule5 {
            return Ok(sets[0].clone());
        }
        Ok(match compare_like_unlike(&sets[0], &sets[1]) {
            Some(Ordering::Greater) => sets[1].clone(),
            _ => sets[0].clone(),
        })
    }

    /// Ranks the subtree of `id` against `reference` and records, breadth
    /// first, which stereogenic descendants share the reference type.
    fn reference_set(&mut self, id: NodeId, reference: usize) -> Result<FixedBitSet, CipError> {
        let previous = self.rule4_ref;
        self.rule4_ref = reference;
        self.reference_ranking = true;
        let ranked = self.sort_substituents(id, Pass::Sphere(0));
        self.reference_ranking = false;
        self.rule4_ref = previous;
        ranked?;

        let mut bs = FixedBitSet::new();
        let own = self.nodes[id].rule4_type;
        if own == reference {
            set_bit(&mut bs, 0);
        }
        let mut bit = usize::from(own != 0);
        let mut queue = VecDeque::from([id]);
        while let Some(n) = queue.pop_front() {
            let node = &self.nodes[n];
            let children = node.new_atoms.unwrap_or(node.atoms);
            for child in children.into_iter().flatten() {
                let c = &self.nodes[child];
                if c.is_phantom() || c.is_terminal || c.is_duplicate {
                    continue;
                }
                queue.push_back(child);
                if c.rule4_type == 0 {
                    continue;
                }
                if c.rule4_type == reference {
                    set_bit(&mut bs, bit);
                }
                bit += 1;
            }
        }
        Ok(bs)
    }

    /// Rule 6: promotes one duplicated atom and ranks again. Without a
    /// single reference that settles the centre, two references are tried
    /// and must agree.
    pub(crate) fn setup_rule6(&mut self, id: NodeId, is_auxiliary: bool) -> Result<Option<Hand>, CipError> {
        let node = &self.nodes[id];
        if node.n_priorities > 2 {
            return Ok(None);
        }
        let duplicates = if is_auxiliary {
            node.atom.map_or(0, |a| self.count_duplicates(id, a))
        } else {
            node.n_root_duplicates
        };
        if duplicates <= 2 {
            return Ok(None);
        }
        let two_pass = node.priorities[3] != 1 && !is_auxiliary;
        let reference_slot = node.priorities[2] as usize;
        self.rule6_ref = self.slot_atom(id, reference_slot);
        if two_pass {
            self.save_restore(id, false);
        }
        self.sort_substituents(id, Pass::Prepare)?;
        if !self.sort_substituents(id, Pass::Sphere(0))? {
            return Ok(None);
        }
        let Some(first) = self.handedness(id)? else {
            return Ok(None);
        };
        if !two_pass {
            return Ok(Some(first));
        }

        self.rule6_ref = self.slot_atom(id, 1);
        self.save_restore(id, true);
        self.sort_substituents(id, Pass::Prepare)?;
        self.sort_substituents(id, Pass::Sphere(0))?;
        let second = self.handedness(id)?;
        trace!("rule 6 passes: {:?} {:?}", first, second);
        Ok((second == Some(first)).then_some(first))
    }

    fn slot_atom(&self, id: NodeId, slot: usize) -> Option<NodeIndex> {
        self.nodes[id]
            .atoms
            .get(slot)
            .copied()
            .flatten()
            .and_then(|c| self.nodes[c].atom)
    }

    fn save_restore(&mut self, id: NodeId, restore: bool) {
        let node = &mut self.nodes[id];
        if restore {
            if let Some((priorities, n)) = node.saved_priorities {
                node.priorities = priorities;
                node.n_priorities = n;
            }
        } else {
            node.saved_priorities = Some((node.priorities, node.n_priorities));
        }
        let (atoms, n_atoms) = (node.atoms, node.n_atoms);
        for child in atoms[..n_atoms].iter().flatten() {
            self.save_restore(*child, restore);
        }
    }

    /// Duplicates of `atom` anywhere below `id`.
    fn count_duplicates(&self, id: NodeId, atom: NodeIndex) -> usize {
        self.nodes[id]
            .atoms
            .iter()
            .flatten()
            .map(|&c| {
                let child = &self.nodes[c];
                if child.is_phantom() {
                    0
                } else if child.is_duplicate {
                    usize::from(child.atom == Some(atom))
                } else {
                    self.count_duplicates(c, atom)
                }
            })
            .sum()
    }

    /// Ranks the children of `id` under `rule` alone, leaving the current
    /// rule state untouched.
    pub(crate) fn sort_by_rule(&mut self, id: NodeId, rule: CipRule) -> Result<bool, CipError> {
        let (previous_rule, previous_ref) = (self.rule, self.rule6_ref);
        self.rule = rule;
        let sorted = if rule == CipRule::Rule6 {
            self.setup_rule6(id, true).map(|h| h.is_some())
        } else {
            self.sort_substituents(id, Pass::Sphere(0))
        };
        self.rule6_ref = previous_ref;
        self.rule = previous_rule;
        sorted
    }

    /// Handedness of the ranked children of `id`: which side of the plane
    /// through the first three lies the fourth (or `id` itself when the
    /// fourth slot is empty). `None` when one of the first three is missing.
    pub(crate) fn handedness(&self, id: NodeId) -> Result<Option<Hand>, CipError> {
        let mut pts = Vec::with_capacity(3);
        for slot in 0..3 {
            let Some(atom) = self.slot_atom(id, slot) else {
                return Ok(None);
            };
            pts.push(atom_point(self.mol, atom)?);
        }
        let Some(probe) = self.slot_atom(id, 3).or(self.nodes[id].atom) else {
            return Ok(None);
        };
        let probe = atom_point(self.mol, probe)?;
        Ok(Some(if is_above_plane(&pts[0], &pts[1], &pts[2], &probe) {
            Hand::R
        } else {
            Hand::S
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cip::tests::{chfclbr, perceive};
    use crate::cip::CipOptions;
    use crate::{Atom, Bond, Mol, WithPosition3D};

    fn bits(ones: &[usize]) -> FixedBitSet {
        let mut bs = FixedBitSet::with_capacity(8);
        for &i in ones {
            bs.insert(i);
        }
        bs
    }

    #[test]
    fn like_unlike_lowest_difference_wins() {
        assert_eq!(compare_like_unlike(&bits(&[0, 2]), &bits(&[0, 3])), Some(Ordering::Less));
        assert_eq!(compare_like_unlike(&bits(&[1]), &bits(&[0, 1])), Some(Ordering::Greater));
        assert_eq!(compare_like_unlike(&bits(&[0, 1]), &bits(&[0, 1])), None);
    }

    #[test]
    fn like_unlike_tolerates_unequal_lengths() {
        let mut long = FixedBitSet::with_capacity(64);
        long.insert(40);
        assert_eq!(compare_like_unlike(&FixedBitSet::new(), &long), Some(Ordering::Greater));
    }

    #[test]
    fn aux_rank_scales() {
        assert!(aux_rank(CipRule::Rule4a, Some(AuxLabel::R)) > aux_rank(CipRule::Rule4a, Some(AuxLabel::PseudoR)) + 1);
        assert_eq!(aux_rank(CipRule::Rule4a, Some(AuxLabel::R)), aux_rank(CipRule::Rule4a, Some(AuxLabel::S)) + 1);
        assert_eq!(aux_rank(CipRule::Rule4c, Some(AuxLabel::R)), -1);
        assert_eq!(aux_rank(CipRule::Rule4c, Some(AuxLabel::PseudoR)), 3);
    }

    #[test]
    fn rule1a_ranks_root_of_chfclbr() {
        let mol = chfclbr(false);
        let options = CipOptions::default();
        let perception = perceive(&mol);
        let mut dg = Digraph::new(&mol, &perception, &options);
        let root = dg.create(Some(NodeIndex::new(0)), None, false, false, false);
        dg.root = root;
        assert!(dg.set_node(root));
        assert!(dg.sort_substituents(root, Pass::Sphere(0)).unwrap());
        assert_eq!(dg.nodes[root].priorities, [0, 1, 2, 3]);
        assert_eq!(dg.nodes[root].n_priorities, 4);
        assert!(dg.handedness(root).unwrap().is_some());
    }

    #[test]
    fn tie_broken_one_sphere_out() {
        // C0 with H, F, CH2-OH (C5) and CH2-CH3 (C8); the two carbons tie at
        // sphere 1 and split on O versus C.
        let mut mol = Mol::<WithPosition3D<Atom>, Bond>::new();
        let mut add = |z| mol.add_atom(WithPosition3D::new(Atom::new(z), [0.0; 3]));
        let ids: Vec<_> = [6, 1, 9, 6, 6, 8, 1, 1, 6, 1, 1, 1, 1, 1, 1]
            .into_iter()
            .map(&mut add)
            .collect();
        let bonds = [
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (3, 5),
            (3, 6),
            (3, 7),
            (4, 8),
            (4, 9),
            (4, 10),
            (8, 11),
            (8, 12),
            (8, 13),
            (5, 14),
        ];
        for (a, b) in bonds {
            mol.add_bond(ids[a], ids[b], Bond::default());
        }
        let options = CipOptions::default();
        let perception = perceive(&mol);
        let mut dg = Digraph::new(&mol, &perception, &options);
        let root = dg.create(Some(ids[0]), None, false, false, false);
        dg.root = root;
        dg.set_node(root);
        assert!(dg.sort_substituents(root, Pass::Sphere(0)).unwrap());
        let order: Vec<_> = dg.nodes[root]
            .atoms
            .iter()
            .map(|c| dg.nodes[c.unwrap()].atom.unwrap().index())
            .collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
    }

    #[test]
    fn sort_by_rule_restores_state() {
        let mol = chfclbr(false);
        let options = CipOptions::default();
        let perception = perceive(&mol);
        let mut dg = Digraph::new(&mol, &perception, &options);
        let root = dg.create(Some(NodeIndex::new(0)), None, false, false, false);
        dg.root = root;
        dg.set_node(root);
        dg.rule = CipRule::Rule3;
        dg.rule6_ref = Some(NodeIndex::new(2));
        assert!(dg.sort_by_rule(root, CipRule::Rule1a).unwrap());
        assert_eq!(dg.rule, CipRule::Rule3);
        assert_eq!(dg.rule6_ref, Some(NodeIndex::new(2)));
    }
}
