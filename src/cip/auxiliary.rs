//! Auxiliary descriptors for rules 3 to 5.
//!
//! Before rule 3 every stereogenic node below the root gets a provisional
//! label, computed by ranking a copy of the node as if it were a root: its
//! former parent chain is turned around into an ordinary substituent.

use petgraph::graph::NodeIndex;
use tracing::trace;

use super::bond_stereo::ene_stereo;
use super::node::{AuxEz, AuxLabel, Digraph, NodeId};
use super::rules::Hand;
use crate::descriptor::{CipRule, Stereo};
use crate::error::CipError;
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D};

impl<'a, A, B> Digraph<'a, A, B>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    /// Labels the subtree below `id` depth first.
    ///
    /// `branch_root` is the child of the evaluation root this subtree hangs
    /// from (`None` at the root itself). `want_branch` asks for the nearest
    /// node below which two chiral paths meet. Returns whether a chiral path
    /// runs through `id`, and that branch node if one was found.
    pub(crate) fn create_auxiliary(
        &mut self,
        id: NodeId,
        branch_root: Option<NodeId>,
        want_branch: bool,
    ) -> Result<(bool, Option<NodeId>), CipError> {
        let Some(atom) = self.nodes[id].atom else {
            return Ok((false, None));
        };
        self.set_node(id);

        let mut is_chiral = false;
        let mut branch = None;
        let mut n_chiral = 0;
        let mut previous_chiral = true;
        let allow_two_same = !self.nodes[id].is_alkene
            && self.nodes[id].n_priorities <= if branch_root.is_none() { 2 } else { 1 };

        let children = self.nodes[id].atoms;
        for (k, child) in children.into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if self.nodes[child].is_duplicate || self.nodes[child].is_terminal {
                continue;
            }
            let (child_chiral, child_branch) =
                self.create_auxiliary(child, Some(branch_root.unwrap_or(child)), true)?;
            if child_branch.is_some() && want_branch {
                let next = self.nodes[child].next_chiral_branch;
                self.nodes[id].next_chiral_branch = next;
                branch = next;
            }
            if self.nodes[child].next_chiral_branch.is_some() || child_chiral {
                n_chiral += 1;
                is_chiral = child_chiral;
                previous_chiral = true;
            } else {
                let priorities = self.nodes[id].priorities;
                if !allow_two_same && !previous_chiral && priorities[k] == priorities[k - 1] {
                    return Ok((false, branch));
                }
                previous_chiral = false;
            }
        }

        let is_branch = n_chiral >= 2;
        let mut skip_rules_4_and_5 = false;
        match n_chiral {
            0 => {
                is_chiral = false;
                skip_rules_4_and_5 = true;
            }
            1 => skip_rules_4_and_5 = true,
            _ => {
                is_chiral = false;
                if want_branch {
                    self.nodes[id].next_chiral_branch = Some(id);
                    branch = Some(id);
                }
            }
        }

        if self.nodes[id].is_alkene {
            if let Some(child) = self.nodes[id].alkene_child {
                let node = &self.nodes[id];
                let even = node.is_even_ene;
                if !even
                    || (matches!(node.aux_ez, AuxEz::Both | AuxEz::Unset)
                        && !node.is_kekule_ambiguous
                        && self.nodes[child].bond_count >= 2)
                {
                    let (ene, end_rule) = self.aux_ene_winner_chirality(id, child, !even)?;
                    match ene {
                        None => {
                            self.nodes[id].aux_ez = AuxEz::Both;
                            self.nodes[child].aux_ez = AuxEz::Both;
                        }
                        Some(stereo) if even && end_rule != Some(CipRule::Rule5) => {
                            let ez = if stereo == Stereo::Z { AuxEz::Z } else { AuxEz::E };
                            self.nodes[id].aux_ez = ez;
                            self.nodes[child].aux_ez = ez;
                            trace!("auxiliary {:?} for ene at atom {}", ez, atom.index());
                        }
                        Some(stereo) if !is_branch => {
                            let (label, rule4_type) = match stereo {
                                Stereo::M | Stereo::Z => (AuxLabel::R, 1),
                                _ => (AuxLabel::S, 2),
                            };
                            self.nodes[id].aux = Some(label);
                            self.nodes[id].rule4_type = rule4_type;
                            is_chiral = true;
                        }
                        Some(_) => {}
                    }
                }
            }
        } else if self.nodes[id].is_sp3 && want_branch {
            let label = self.auxiliary_centre(id, skip_rules_4_and_5)?;
            if let Some((label, hand)) = label {
                is_chiral |= hand.is_some();
                self.nodes[id].aux = label;
            } else {
                self.nodes[id].aux = None;
            }
        }

        if let Some(label) = self.nodes[id].aux {
            if self.set_auxiliary {
                self.aux_labels.push((atom, label.stereo()));
            }
            trace!("auxiliary {} for atom {}", label.stereo(), atom.index());
        }
        if branch_root.is_none() {
            self.nodes[id].rule4_type = n_chiral;
        }
        self.nodes[id].is_chiral_path = is_chiral;
        Ok((is_chiral, branch))
    }

    /// Ranks a copy of `id` with its parent chain turned into a substituent.
    /// Returns the label (if any) and the raw handedness once some rule
    /// separates the substituents.
    fn auxiliary_centre(
        &mut self,
        id: NodeId,
        skip_rules_4_and_5: bool,
    ) -> Result<Option<(Option<AuxLabel>, Option<Hand>)>, CipError> {
        let copy = self.clone_node(id);
        if !self.set_node(copy) {
            return Ok(None);
        }
        self.add_return_path(copy, None, id);

        let mut decided = None;
        for rule in CipRule::ALL {
            let in_rule_4_or_5 = matches!(
                rule,
                CipRule::Rule4a | CipRule::Rule4b | CipRule::Rule4c | CipRule::Rule5
            );
            if skip_rules_4_and_5 && in_rule_4_or_5 {
                continue;
            }
            if self.sort_by_rule(copy, rule)? {
                decided = Some(rule);
                break;
            }
        }
        let Some(rule) = decided else {
            return Ok(None);
        };

        let hand = self.handedness(copy)?;
        let label = match (hand, rule == CipRule::Rule5) {
            (Some(Hand::R), false) => Some(AuxLabel::R),
            (Some(Hand::S), false) => Some(AuxLabel::S),
            (Some(Hand::R), true) => Some(AuxLabel::PseudoR),
            (Some(Hand::S), true) => Some(AuxLabel::PseudoS),
            (None, _) => None,
        };
        if rule != CipRule::Rule5 {
            self.nodes[id].rule4_type = match hand {
                Some(Hand::R) => 1,
                Some(Hand::S) => 2,
                None => 0,
            };
        }
        Ok(Some((label, hand)))
    }

    /// Auxiliary stereo of the ene from `a` to `b`: the top substituent of
    /// each end, combined geometrically. Also returns the rule that decided
    /// the `b` end.
    fn aux_ene_winner_chirality(
        &mut self,
        a: NodeId,
        b: NodeId,
        axial: bool,
    ) -> Result<(Option<Stereo>, Option<CipRule>), CipError> {
        let (top_a, _) = self.aux_ene_end_winner(a, self.nodes[a].next_sp2)?;
        let Some(top_a) = top_a else {
            return Ok((None, None));
        };
        let (top_b, rule) = self.aux_ene_end_winner(b, self.nodes[b].next_sp2)?;
        let Some(top_b) = top_b else {
            return Ok((None, rule));
        };
        let atoms = [top_a, a, b, top_b].map(|n| self.nodes[n].atom);
        let [Some(t1), Some(e1), Some(e2), Some(t2)] = atoms else {
            return Ok((None, rule));
        };
        Ok((Some(ene_stereo(self.mol, [t1, e1, e2, t2], axial)?), rule))
    }

    /// The highest-ranked substituent on ene end `a`, looking away from
    /// `toward` (the neighbouring sp2 atom).
    fn aux_ene_end_winner(
        &mut self,
        a: NodeId,
        toward: Option<NodeId>,
    ) -> Result<(Option<NodeId>, Option<CipRule>), CipError> {
        let copy = self.clone_node(a);
        if self.nodes[copy].parent != toward {
            self.add_return_path(copy, toward, a);
        }
        for rule in CipRule::ALL {
            if !self.sort_by_rule(copy, rule)? {
                continue;
            }
            let node = &self.nodes[copy];
            for g in 0..4 {
                let Some(e) = node.atoms[g] else {
                    continue;
                };
                if self.nodes[e].multiple_bond_duplicate {
                    continue;
                }
                if g == 3 || node.priorities[g] != node.priorities[g + 1] {
                    let winner = (!self.nodes[e].is_phantom()).then_some(e);
                    return Ok((winner, Some(rule)));
                }
            }
        }
        Ok((None, None))
    }

    /// Re-roots the copy `copy` of `from`: its slot holding `new_parent` (or
    /// an empty slot when there is none) receives a copy of the original
    /// parent, whose own slot receives a copy of the grandparent, and so on
    /// up to the evaluation root.
    pub(crate) fn add_return_path(&mut self, copy: NodeId, new_parent: Option<NodeId>, from: NodeId) {
        let mut path: Vec<Option<NodeId>> = Vec::new();
        let mut f = from;
        while let Some(p) = self.nodes[f].parent {
            if self.nodes[p].atoms[0].is_none() {
                break;
            }
            path.push(Some(p));
            f = p;
        }
        path.push(None);

        let mut current = copy;
        let mut parent = new_parent;
        let mut replaced = new_parent;
        let mut previous = Some(from);
        for (h, original) in path.into_iter().enumerate() {
            let next = match original {
                Some(o) => self.clone_node(o),
                None => {
                    let is_alkene = self.nodes[copy].is_alkene;
                    self.create(None, Some(copy), is_alkene, true, false)
                }
            };
            self.nodes[next].sphere = self.nodes[current].sphere + 1;
            self.replace_parent_substituent(current, replaced, parent, next);
            if h > 0 && self.nodes[current].is_alkene && !self.nodes[current].is_alkene_atom2 {
                if let Some(p) = parent {
                    if self.nodes[p].is_alkene_atom2 {
                        self.nodes[p].is_alkene_atom2 = false;
                        self.nodes[current].alkene_parent = Some(p);
                    }
                }
                self.set_ene(current);
            }
            parent = Some(current);
            current = next;
            replaced = previous;
            previous = original;
        }
    }

    fn replace_parent_substituent(
        &mut self,
        id: NodeId,
        old: Option<NodeId>,
        new_parent: Option<NodeId>,
        substituent: NodeId,
    ) {
        for slot in 0..4 {
            let Some(child) = self.nodes[id].atoms[slot] else {
                continue;
            };
            let matches = Some(child) == old || (new_parent.is_none() && self.nodes[child].is_phantom());
            if matches {
                self.nodes[id].parent = new_parent;
                self.nodes[id].atoms[slot] = Some(substituent);
                self.sort_natural(id);
                return;
            }
        }
    }
}

/// Atoms labelled by the auxiliary pass, for callers that asked for them.
pub(crate) fn auxiliary_atoms(labels: &[(NodeIndex, Stereo)]) -> impl Iterator<Item = (usize, Stereo)> + '_ {
    labels.iter().map(|&(a, s)| (a.index(), s))
}
