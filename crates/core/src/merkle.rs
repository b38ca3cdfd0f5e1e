//! Merkle commitment engine.
//!
//! A binary hash tree over field-element leaves. Level 0 holds one leaf hash
//! per committed attribute, in commitment order; every level above pairs the
//! one below with the order-sensitive node hash until a single root remains.
//!
//! Odd-length levels are completed by a [`PairingPolicy`]. The default
//! [`DuplicateLast`] policy reproduces the legacy tree exactly: the last
//! element is paired with a copy of itself. Padding is never stored in the
//! tree; the policy is consulted both while building and while extracting
//! decommitment paths, so the two cannot drift apart.

use crate::config::MerkleConfig;
use crate::error::{CoreError, Result};
use crate::field::{AttributeValue, FieldElement, HashDomain};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Hex digits shown per element by the `Display` rendering.
pub const DEFAULT_RENDER_DIGITS: usize = 8;

/// Decides how an odd-length level is completed before pairing.
pub trait PairingPolicy: fmt::Debug + Send + Sync {
    /// Element appended to an odd-length level.
    fn padding(&self, level: &[FieldElement]) -> FieldElement;

    /// Right-hand partner of the even position `i`.
    fn right_partner(&self, level: &[FieldElement], i: usize) -> FieldElement {
        match level.get(i + 1) {
            Some(sibling) => *sibling,
            None => self.padding(level),
        }
    }
}

/// Legacy padding: pair the last element with itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateLast;

impl PairingPolicy for DuplicateLast {
    fn padding(&self, level: &[FieldElement]) -> FieldElement {
        level.last().copied().unwrap_or_default()
    }
}

/// Pads with a fixed constant that is not derived from any leaf.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPadding(pub FieldElement);

impl PairingPolicy for ConstantPadding {
    fn padding(&self, _level: &[FieldElement]) -> FieldElement {
        self.0
    }
}

/// Serializable selection of a [`PairingPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PaddingMode {
    #[default]
    DuplicateLast,
    Constant { value: FieldElement },
}

impl PaddingMode {
    pub fn policy(&self) -> Box<dyn PairingPolicy> {
        match self {
            PaddingMode::DuplicateLast => Box::new(DuplicateLast),
            PaddingMode::Constant { value } => Box::new(ConstantPadding(*value)),
        }
    }
}

/// Hashes adjacent pairs of `level` into the next level up.
///
/// This is the only place nodes are paired.
pub fn pair_level(
    level: &[FieldElement],
    domain: &HashDomain,
    policy: &dyn PairingPolicy,
) -> Result<Vec<FieldElement>> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for i in (0..level.len()).step_by(2) {
        let right = policy.right_partner(level, i);
        next.push(domain.hash_node(level[i], right)?);
    }
    Ok(next)
}

/// Self-contained membership proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: usize,
    pub leaf_hash: FieldElement,
    /// Sibling per level, leaf level first.
    pub siblings: Vec<FieldElement>,
    pub root: FieldElement,
}

impl InclusionProof {
    pub fn verify(&self, domain: &HashDomain) -> Result<bool> {
        MerkleTree::verify_proof(
            domain,
            self.leaf_hash,
            &self.siblings,
            self.root,
            self.leaf_index,
        )
    }
}

/// A finalized binary Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerkleTree {
    levels: Vec<Vec<FieldElement>>,
    hash_domain: HashDomain,
    padding: PaddingMode,
}

impl MerkleTree {
    /// Hashes every value into a leaf and builds the tree over them.
    pub fn construct(values: &[AttributeValue], config: &MerkleConfig) -> Result<Self> {
        if values.is_empty() {
            warn!("Rejected commitment over an empty attribute set");
            return Err(CoreError::EmptyInput);
        }

        let leaves = values
            .iter()
            .map(|value| config.hash_domain.hash_leaf(value))
            .collect::<Result<Vec<_>>>()?;

        Self::from_leaf_hashes(leaves, config)
    }

    /// Builds the tree over leaves that are already hashed.
    pub fn from_leaf_hashes(leaves: Vec<FieldElement>, config: &MerkleConfig) -> Result<Self> {
        if leaves.is_empty() {
            warn!("Rejected tree over zero leaves");
            return Err(CoreError::EmptyInput);
        }
        config.hash_domain.validate()?;

        let policy = config.padding.policy();
        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            if current.len() <= 1 {
                break;
            }
            let next = pair_level(current, &config.hash_domain, policy.as_ref())?;
            levels.push(next);
        }

        let tree = Self {
            levels,
            hash_domain: config.hash_domain,
            padding: config.padding,
        };
        debug!(
            leaf_count = tree.leaf_count(),
            depth = tree.depth(),
            root = %tree.root(),
            "Merkle tree constructed"
        );
        Ok(tree)
    }

    /// The sole element of the top level.
    pub fn root(&self) -> FieldElement {
        // Construction never produces an empty tree.
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels below the root, which is also the path length.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaves(&self) -> &[FieldElement] {
        &self.levels[0]
    }

    pub fn levels(&self) -> &[Vec<FieldElement>] {
        &self.levels
    }

    pub fn hash_domain(&self) -> &HashDomain {
        &self.hash_domain
    }

    pub fn padding(&self) -> &PaddingMode {
        &self.padding
    }

    /// Sibling hashes from the leaf at `index` up to, not including, the root.
    pub fn decommitment_path(&self, index: usize) -> Result<Vec<FieldElement>> {
        if index >= self.leaf_count() {
            return Err(CoreError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }

        let policy = self.padding.policy();
        let mut path = Vec::with_capacity(self.depth());
        let mut i = index;
        for level in &self.levels[..self.depth()] {
            let sibling = if i % 2 == 0 {
                policy.right_partner(level, i)
            } else {
                level[i - 1]
            };
            path.push(sibling);
            i /= 2;
        }
        Ok(path)
    }

    pub fn inclusion_proof(&self, index: usize) -> Result<InclusionProof> {
        let siblings = self.decommitment_path(index)?;
        Ok(InclusionProof {
            leaf_index: index,
            leaf_hash: self.levels[0][index],
            siblings,
            root: self.root(),
        })
    }

    /// Folds `path` from `leaf_hash` and compares the result with `root`.
    ///
    /// Even positions hash as `(current, sibling)`, odd ones as
    /// `(sibling, current)`, mirroring construction. A wrong proof yields
    /// `Ok(false)`; so does an index with bits above the path length.
    pub fn verify_proof(
        domain: &HashDomain,
        leaf_hash: FieldElement,
        path: &[FieldElement],
        root: FieldElement,
        index: usize,
    ) -> Result<bool> {
        if path.len() < usize::BITS as usize && (index >> path.len()) != 0 {
            debug!(index, depth = path.len(), "Proof index exceeds tree width");
            return Ok(false);
        }

        let mut current = leaf_hash;
        let mut i = index;
        for sibling in path {
            current = if i % 2 == 0 {
                domain.hash_node(current, *sibling)?
            } else {
                domain.hash_node(*sibling, current)?
            };
            i /= 2;
        }
        Ok(current == root)
    }

    /// One line per level, leaves first, each element as `0x` plus its
    /// leading `digits` hex digits.
    pub fn render(&self, digits: usize) -> String {
        let digits = digits.clamp(1, 64);
        let mut out = String::new();
        for level in &self.levels {
            let tokens: Vec<String> = level
                .iter()
                .map(|element| format!("0x{}", &element.to_hex()[..digits]))
                .collect();
            out.push_str(&tokens.join(" "));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_RENDER_DIGITS))
    }
}
