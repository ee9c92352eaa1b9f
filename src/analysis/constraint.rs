// SPDX-License-Identifier: BSD-3-Clause
use std::fmt::Display;

use serde::Serialize;

use super::node::Node;

/// Subset constraints, where `pts(n)` is the points-to set of `n`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    /// `dst = &src`: `src ∈ pts(dst)`
    AddrOf,
    /// `dst = src`: `pts(src) ⊆ pts(dst)`
    Copy,
    /// `dst = *src`: `pts(o) ⊆ pts(dst)` for each `o ∈ pts(src)`
    Load,
    /// `*dst = src`: `pts(src) ⊆ pts(o)` for each `o ∈ pts(dst)`
    Store,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub dst: Node,
    pub src: Node,
}

impl Constraint {
    pub fn addr_of(dst: Node, src: Node) -> Self {
        Constraint {
            kind: ConstraintKind::AddrOf,
            dst,
            src,
        }
    }

    pub fn copy(dst: Node, src: Node) -> Self {
        Constraint {
            kind: ConstraintKind::Copy,
            dst,
            src,
        }
    }

    pub fn load(dst: Node, src: Node) -> Self {
        Constraint {
            kind: ConstraintKind::Load,
            dst,
            src,
        }
    }

    pub fn store(dst: Node, src: Node) -> Self {
        Constraint {
            kind: ConstraintKind::Store,
            dst,
            src,
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ConstraintKind::AddrOf => write!(f, "{} = &{}", self.dst, self.src),
            ConstraintKind::Copy => write!(f, "{} = {}", self.dst, self.src),
            ConstraintKind::Load => write!(f, "{} = *{}", self.dst, self.src),
            ConstraintKind::Store => write!(f, "*{} = {}", self.dst, self.src),
        }
    }
}

/// The ordered output of collection. Append-only: constraints are never
/// removed, reordered, or deduplicated here; that is the solver's business.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    pub fn push(&mut self, c: Constraint) {
        self.0.push(c);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Constraint> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Constraint] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Constraint> {
        self.0
    }
}

impl std::ops::Index<usize> for Constraints {
    type Output = Constraint;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.0[idx]
    }
}

impl<'a> IntoIterator for &'a Constraints {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
