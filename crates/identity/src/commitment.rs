//! Commitment service: build, attest, prove and verify.
//!
//! An issuer builds a [`Commitment`] over an [`AttributeBundle`] and signs
//! its root with [`CommitmentService::attest`]. A holder later reveals one
//! attribute together with its [`InclusionProof`]; a verifier checks the
//! proof against the root and the signature against the issuer's public
//! key, using only public data.

use crate::attribute::{AttributeBundle, IdentityRecord};
use crate::error::{IdentityError, IdentityResult};
use credroot_core::{
    AttributeValue, CommitmentConfig, FieldElement, HashDomain, InclusionProof, MerkleTree,
    SignatureBackend,
};
use credroot_crypto::{
    AttestationSignature, AttestationSigner, AttestationVerifier, DomainParameters, PublicKey,
    RootSigner, RootVerifier,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A finalized tree over a bundle plus the attribute names by leaf index.
#[derive(Debug, Clone, Serialize)]
pub struct Commitment {
    pub root: FieldElement,
    pub tree: MerkleTree,
    pub names: Vec<String>,
}

impl Commitment {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// A signed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub root: FieldElement,
    pub signature: AttestationSignature,
    pub public_key: PublicKey,
    pub backend: SignatureBackend,
}

/// Everything an issuer hands back after committing to and signing a bundle.
#[derive(Debug, Clone, Serialize)]
pub struct CommitmentReceipt {
    pub summary: String,
    pub commitment: Commitment,
    pub attestation: Attestation,
    pub tree_rendering: String,
}

impl fmt::Display for CommitmentReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        writeln!(f, "Root Hash: {}", self.attestation.root)?;
        writeln!(f, "Signature: {}", self.attestation.signature.to_hex())?;
        writeln!(f, "Verifying Key: {}", self.attestation.public_key.to_hex())?;
        writeln!(f, "Backend: {}", self.attestation.backend)?;
        write!(f, "\nMerkle Tree Visualization:\n{}", self.tree_rendering)
    }
}

/// Checks that `leaf_value` sits at `index` under `root`, using the legacy
/// untagged hash domain.
pub fn verify_inclusion(
    leaf_value: &AttributeValue,
    path: &[FieldElement],
    root: FieldElement,
    index: usize,
) -> IdentityResult<bool> {
    verify_inclusion_in(&HashDomain::Untagged, leaf_value, path, root, index)
}

/// [`verify_inclusion`] under an explicit hash domain.
pub fn verify_inclusion_in(
    domain: &HashDomain,
    leaf_value: &AttributeValue,
    path: &[FieldElement],
    root: FieldElement,
    index: usize,
) -> IdentityResult<bool> {
    let leaf = domain.hash_leaf(leaf_value)?;
    Ok(MerkleTree::verify_proof(domain, leaf, path, root, index)?)
}

/// Checks an attestation signature over `root` with the verifier matching
/// the signature's backend.
pub fn verify_signature(
    root: &FieldElement,
    signature: &AttestationSignature,
    public_key: &PublicKey,
    domain: &Arc<DomainParameters>,
) -> IdentityResult<bool> {
    let verifier = AttestationVerifier::new(signature.backend, domain.clone());
    Ok(verifier.verify_root(root, signature, public_key)?)
}

/// Issuer and verifier operations under one configuration.
#[derive(Debug, Clone)]
pub struct CommitmentService {
    config: CommitmentConfig,
    domain: Arc<DomainParameters>,
}

impl CommitmentService {
    /// Validates the configuration and loads the curve parameters once.
    pub fn new(config: CommitmentConfig) -> IdentityResult<Self> {
        config.validate()?;
        let domain = Arc::new(DomainParameters::load(config.signing.domain.as_ref())?);
        info!(
            backend = %config.signing.backend,
            hash_domain = ?config.merkle.hash_domain,
            padding = ?config.merkle.padding,
            "STATUS: CommitmentService :: READY"
        );
        Ok(Self { config, domain })
    }

    pub fn with_defaults() -> IdentityResult<Self> {
        Self::new(CommitmentConfig::default())
    }

    pub fn config(&self) -> &CommitmentConfig {
        &self.config
    }

    pub fn domain(&self) -> &Arc<DomainParameters> {
        &self.domain
    }

    pub fn build_commitment(&self, bundle: &AttributeBundle) -> IdentityResult<Commitment> {
        let tree = MerkleTree::construct(&bundle.values(), &self.config.merkle)?;
        let root = tree.root();
        info!(
            attributes = bundle.len(),
            depth = tree.depth(),
            root = %root,
            "Commitment built"
        );
        Ok(Commitment {
            root,
            tree,
            names: bundle.names(),
        })
    }

    /// Signs `root` with the configured backend. The key is only held for
    /// the duration of the call.
    pub fn attest(&self, root: &FieldElement, private_key: &[u8]) -> IdentityResult<Attestation> {
        let signer = AttestationSigner::from_config(
            &self.config.signing,
            private_key,
            self.domain.clone(),
        )?;
        let signature = signer.sign_root(root)?;
        let public_key = signer.public_key();
        info!(
            root = %root,
            key_id = %public_key.key_id(),
            backend = %signer.backend(),
            "Root attested"
        );
        Ok(Attestation {
            root: *root,
            signature,
            public_key,
            backend: signer.backend(),
        })
    }

    pub fn prove_inclusion(
        &self,
        commitment: &Commitment,
        index: usize,
    ) -> IdentityResult<InclusionProof> {
        let proof = commitment.tree.inclusion_proof(index)?;
        debug!(index, siblings = proof.siblings.len(), "Inclusion proof extracted");
        Ok(proof)
    }

    /// Proof for the attribute called `name`.
    pub fn prove_attribute(
        &self,
        commitment: &Commitment,
        name: &str,
    ) -> IdentityResult<InclusionProof> {
        let index = commitment.index_of(name).ok_or_else(|| {
            warn!(name, "Proof requested for unknown attribute");
            IdentityError::UnknownAttribute {
                name: name.to_string(),
            }
        })?;
        self.prove_inclusion(commitment, index)
    }

    /// [`verify_inclusion`] under this service's hash domain.
    pub fn verify_inclusion(
        &self,
        leaf_value: &AttributeValue,
        path: &[FieldElement],
        root: FieldElement,
        index: usize,
    ) -> IdentityResult<bool> {
        let valid = verify_inclusion_in(
            &self.config.merkle.hash_domain,
            leaf_value,
            path,
            root,
            index,
        )?;
        if !valid {
            warn!(index, root = %root, "Inclusion proof rejected");
        }
        Ok(valid)
    }

    /// Checks a revealed value against a full proof record.
    pub fn verify_proof(
        &self,
        leaf_value: &AttributeValue,
        proof: &InclusionProof,
    ) -> IdentityResult<bool> {
        let leaf = self.config.merkle.hash_domain.hash_leaf(leaf_value)?;
        if leaf != proof.leaf_hash {
            warn!(index = proof.leaf_index, "Revealed value does not match proof leaf");
            return Ok(false);
        }
        self.verify_inclusion(leaf_value, &proof.siblings, proof.root, proof.leaf_index)
    }

    pub fn verify_signature(
        &self,
        root: &FieldElement,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> IdentityResult<bool> {
        let valid = verify_signature(root, signature, public_key, &self.domain)?;
        if !valid {
            warn!(root = %root, key_id = %public_key.key_id(), "Attestation signature rejected");
        }
        Ok(valid)
    }

    pub fn verify_attestation(&self, attestation: &Attestation) -> IdentityResult<bool> {
        if attestation.signature.backend != attestation.backend {
            warn!("Attestation backend does not match its signature");
            return Ok(false);
        }
        self.verify_signature(
            &attestation.root,
            &attestation.signature,
            &attestation.public_key,
        )
    }

    /// Builds and attests in one call.
    pub fn issue(
        &self,
        bundle: &AttributeBundle,
        private_key: &[u8],
    ) -> IdentityResult<CommitmentReceipt> {
        self.issue_with_summary(bundle, private_key, bundle.to_string())
    }

    /// [`issue`](Self::issue) for the identity form; the receipt summary
    /// echoes the form and the hashed ID.
    pub fn issue_identity(
        &self,
        record: &IdentityRecord,
        private_key: &[u8],
    ) -> IdentityResult<CommitmentReceipt> {
        let bundle = record.to_bundle()?;
        self.issue_with_summary(&bundle, private_key, record.summary()?)
    }

    fn issue_with_summary(
        &self,
        bundle: &AttributeBundle,
        private_key: &[u8],
        summary: String,
    ) -> IdentityResult<CommitmentReceipt> {
        let commitment = self.build_commitment(bundle)?;
        let attestation = self.attest(&commitment.root, private_key)?;
        let tree_rendering = commitment.tree.render(self.config.merkle.render_digits);
        Ok(CommitmentReceipt {
            summary,
            commitment,
            attestation,
            tree_rendering,
        })
    }
}
