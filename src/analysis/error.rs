// SPDX-License-Identifier: BSD-3-Clause
/// Internal-consistency violations. Any of these means the collector's own
/// invariants (or the input's well-formedness) were broken, and the
/// constraint list built so far must not be used.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Failed to find value node for {0}")]
    MissingValueNode(String),
    #[error("Failed to find object node for {0}")]
    MissingObjectNode(String),
    #[error("Failed to find return node for {0}")]
    MissingReturnNode(String),
    #[error("Pointer-related instruction not handled: {0}")]
    UnhandledPointerInstruction(String),
    #[error("Ran out of node identities")]
    NodeLimit,
}
