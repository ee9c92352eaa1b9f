// SPDX-License-Identifier: BSD-3-Clause
//! Inclusion-based (Andersen-style) points-to constraints.

pub mod call;
pub mod collect;
pub mod constraint;
mod error;
pub mod node;

pub use call::{CallConstraints, CallSite, OpaqueCalls};
pub use collect::{collect, collect_constraints};
pub use constraint::{Constraint, ConstraintKind, Constraints};
pub use error::Error;
pub use node::{Entity, Node, NodeFactory, NodeKind};
