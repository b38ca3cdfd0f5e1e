//! Merkle CLI Tool
//!
//! Command-line interface for committing to attribute bundles, generating
//! and verifying inclusion proofs, and signing and checking commitment roots
//! without running an issuer service.

use anyhow::{anyhow, bail, Context, Result};
use credroot_core::{
    logging, AttributeValue, CommitmentConfig, FieldElement, HashDomain, InclusionProof,
    MerkleConfig, MerkleTree, PaddingMode, SignatureBackend,
};
use credroot_crypto::{derive_public_key, generate_private_key, PublicKey};
use credroot_identity::{
    Attestation, Attribute, AttributeBundle, CommitmentService, IdentityRecord,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use zeroize::Zeroizing;

/// Serializable tree info for CLI
#[derive(Debug, Serialize, Deserialize)]
struct TreeFile {
    root: FieldElement,
    names: Vec<String>,
    leaves: Vec<FieldElement>,
    hash_domain: HashDomain,
    padding: PaddingMode,
}

/// Serializable proof for CLI
#[derive(Debug, Serialize, Deserialize)]
struct ProofFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
    hash_domain: HashDomain,
    #[serde(flatten)]
    proof: InclusionProof,
}

/// Key material as written by `keygen`.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    backend: SignatureBackend,
    private: String,
    public: String,
    key_id: String,
}

/// JSON output for build command
#[derive(Debug, Serialize)]
struct BuildOutput {
    root: String,
    leaf_count: usize,
    depth: usize,
    success: bool,
}

/// JSON output for prove command
#[derive(Debug, Serialize)]
struct ProveOutput {
    leaf_hash: String,
    leaf_index: usize,
    root: String,
    sibling_count: usize,
    success: bool,
}

/// JSON output for verify and verify-signature commands
#[derive(Debug, Serialize)]
struct VerifyOutput {
    valid: bool,
    root: String,
    message: String,
}

/// JSON output for keygen command
#[derive(Debug, Serialize)]
struct KeygenOutput {
    backend: SignatureBackend,
    public_key: String,
    key_id: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", what))?;
    fs::write(path, json_str).with_context(|| format!("Failed to write {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} file", what))
}

/// `0x`-prefixed values are field elements, everything else is text.
fn parse_value(raw: &str) -> Result<AttributeValue> {
    if raw.starts_with("0x") {
        let element = FieldElement::from_hex(raw).context("Invalid field element hex")?;
        Ok(AttributeValue::Field(element))
    } else {
        Ok(AttributeValue::Text(raw.to_string()))
    }
}

/// One attribute per line, `name=value` or a bare value.
fn read_bundle_from_file(path: &Path) -> Result<AttributeBundle> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut bundle = AttributeBundle::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, raw) = match line.split_once('=') {
            Some((name, raw)) => (name.trim().to_string(), raw.trim()),
            None => (format!("attr_{}", bundle.len()), line),
        };
        bundle.push(Attribute::new(name, parse_value(raw)?))?;
    }

    Ok(bundle)
}

fn load_config(path: Option<PathBuf>) -> Result<CommitmentConfig> {
    let config = CommitmentConfig::load_or_default(path).context("Failed to load config")?;
    logging::init_with(&config.logging);
    Ok(config)
}

struct LoadedKey {
    backend: SignatureBackend,
    private: Zeroizing<Vec<u8>>,
    public: PublicKey,
}

fn read_key_file(path: &Path) -> Result<LoadedKey> {
    let key_file: KeyFile = read_json(path, "key")?;
    let public =
        PublicKey::from_hex(key_file.backend, &key_file.public).context("Invalid public key hex")?;
    let private = Zeroizing::new(key_file.private);
    let bytes = hex::decode(private.trim_start_matches("0x")).context("Invalid private key hex")?;
    Ok(LoadedKey {
        backend: key_file.backend,
        private: Zeroizing::new(bytes),
        public,
    })
}

/// Fails if the key file's recorded public key is not the one its private
/// key signs under.
fn check_public_key(key: &LoadedKey, signed_with: &PublicKey) -> Result<()> {
    if &key.public != signed_with {
        bail!(
            "Key file public key {} does not match its private key ({})",
            key.public.key_id(),
            signed_with.key_id()
        );
    }
    Ok(())
}

fn tree_config(tree_file: &TreeFile) -> MerkleConfig {
    MerkleConfig {
        hash_domain: tree_file.hash_domain,
        padding: tree_file.padding,
        ..MerkleConfig::default()
    }
}

fn load_tree(path: &Path) -> Result<(TreeFile, MerkleTree)> {
    let tree_file: TreeFile = read_json(path, "tree")?;
    let tree = MerkleTree::from_leaf_hashes(tree_file.leaves.clone(), &tree_config(&tree_file))
        .context("Failed to rebuild tree")?;
    if tree.root() != tree_file.root {
        bail!(
            "Tree file root {} does not match rebuilt root {}",
            tree_file.root,
            tree.root()
        );
    }
    Ok((tree_file, tree))
}

fn cmd_build(
    input: PathBuf,
    record: bool,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let bundle = if record {
        let record: IdentityRecord = read_json(&input, "record")?;
        record.to_bundle()?
    } else {
        read_bundle_from_file(&input).context("Failed to read input")?
    };

    if bundle.is_empty() {
        bail!("No attributes found in input file");
    }

    let service = CommitmentService::new(config)?;
    let commitment = service.build_commitment(&bundle)?;
    let tree = &commitment.tree;

    if json {
        print_json(&BuildOutput {
            root: commitment.root.to_hex(),
            leaf_count: tree.leaf_count(),
            depth: tree.depth(),
            success: true,
        })?;
    } else {
        println!("Root: {}", commitment.root);
        println!("Leaf count: {}", tree.leaf_count());
        println!();
        print!("{}", tree.render(service.config().merkle.render_digits));
    }

    if let Some(output_path) = output {
        let tree_file = TreeFile {
            root: commitment.root,
            names: commitment.names.clone(),
            leaves: tree.leaves().to_vec(),
            hash_domain: *tree.hash_domain(),
            padding: *tree.padding(),
        };
        write_json(&output_path, &tree_file, "tree")?;

        if !json {
            println!("Tree saved to: {}", output_path.display());
        }
    }

    Ok(())
}

fn cmd_prove(
    tree_path: PathBuf,
    leaf_index: Option<usize>,
    attribute: Option<String>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let (tree_file, tree) = load_tree(&tree_path)?;

    let index = match (leaf_index, &attribute) {
        (Some(index), _) => index,
        (None, Some(name)) => tree_file
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| anyhow!("Attribute not found: {}", name))?,
        (None, None) => bail!("Missing --leaf-index or --attribute argument"),
    };

    let proof = tree
        .inclusion_proof(index)
        .context("Failed to generate proof")?;

    if json {
        print_json(&ProveOutput {
            leaf_hash: proof.leaf_hash.to_hex(),
            leaf_index: proof.leaf_index,
            root: proof.root.to_hex(),
            sibling_count: proof.siblings.len(),
            success: true,
        })?;
    } else {
        println!("Proof generated for leaf {}", index);
        println!("Leaf hash: {}", proof.leaf_hash);
        println!("Root: {}", proof.root);
        println!("Sibling count: {}", proof.siblings.len());
    }

    if let Some(output_path) = output {
        let proof_file = ProofFile {
            attribute: attribute.or_else(|| tree_file.names.get(index).cloned()),
            hash_domain: tree_file.hash_domain,
            proof,
        };
        write_json(&output_path, &proof_file, "proof")?;

        if !json {
            println!("Proof saved to: {}", output_path.display());
        }
    }

    Ok(())
}

fn cmd_verify(proof_path: PathBuf, value: Option<String>, json: bool) -> Result<()> {
    let proof_file: ProofFile = read_json(&proof_path, "proof")?;
    let proof = &proof_file.proof;

    let leaf_matches = match &value {
        Some(raw) => proof_file.hash_domain.hash_leaf(&parse_value(raw)?)? == proof.leaf_hash,
        None => true,
    };
    let (valid, message) = if !leaf_matches {
        (false, "Revealed value does not match the proof leaf".to_string())
    } else {
        match proof.verify(&proof_file.hash_domain) {
            Ok(true) => (true, "Proof is valid".to_string()),
            Ok(false) => (false, "Proof is invalid".to_string()),
            Err(e) => (false, format!("Verification error: {}", e)),
        }
    };

    if json {
        print_json(&VerifyOutput {
            valid,
            root: proof.root.to_hex(),
            message: message.clone(),
        })?;
    } else if valid {
        println!("✓ Proof is VALID");
        if let Some(name) = &proof_file.attribute {
            println!("  Attribute: {}", name);
        }
        println!("  Leaf: {}", proof.leaf_hash);
        println!("  Root: {}", proof.root);
    } else {
        println!("✗ {}", message);
    }

    if valid {
        Ok(())
    } else {
        Err(anyhow!("Proof verification failed"))
    }
}

fn cmd_keygen(backend: SignatureBackend, output: PathBuf, json: bool) -> Result<()> {
    let config = load_config(None)?;
    let service = CommitmentService::new(config)?;

    let private = generate_private_key(backend, &mut rand::thread_rng());
    let public = derive_public_key(backend, private.as_ref(), service.domain().clone())?;

    let key_file = KeyFile {
        backend,
        private: hex::encode(private.as_ref()),
        public: public.to_hex(),
        key_id: public.key_id(),
    };
    write_json(&output, &key_file, "key")?;
    drop(Zeroizing::new(key_file.private));

    if json {
        print_json(&KeygenOutput {
            backend,
            public_key: public.to_hex(),
            key_id: public.key_id(),
        })?;
    } else {
        println!("Backend: {}", backend);
        println!("Public key: {}", public.to_hex());
        println!("Key id: {}", public.key_id());
        println!("Key saved to: {}", output.display());
    }

    Ok(())
}

/// Loads the config, switching the backend to the one the key belongs to.
fn service_for_key(
    config: Option<PathBuf>,
    backend: SignatureBackend,
) -> Result<CommitmentService> {
    let mut config = load_config(config)?;
    if config.signing.backend != backend {
        config.signing.backend = backend;
        if backend == SignatureBackend::P256Ecdsa {
            config.signing.domain = None;
        }
    }
    Ok(CommitmentService::new(config)?)
}

fn cmd_attest(
    tree_path: PathBuf,
    key_path: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let key = read_key_file(&key_path)?;
    let service = service_for_key(config, key.backend)?;
    let (tree_file, _) = load_tree(&tree_path)?;

    let attestation = service.attest(&tree_file.root, &key.private)?;
    check_public_key(&key, &attestation.public_key)?;

    if json {
        print_json(&attestation)?;
    } else {
        println!("Root: {}", attestation.root);
        println!("Signature: {}", attestation.signature.to_hex());
        println!("Verifying Key: {}", attestation.public_key.to_hex());
        println!("Backend: {}", attestation.backend);
    }

    if let Some(output_path) = output {
        write_json(&output_path, &attestation, "attestation")?;
        if !json {
            println!("Attestation saved to: {}", output_path.display());
        }
    }

    Ok(())
}

fn cmd_verify_signature(
    attestation_path: PathBuf,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let attestation: Attestation = read_json(&attestation_path, "attestation")?;
    let service = service_for_key(config, attestation.backend)?;

    let (valid, message) = match service.verify_attestation(&attestation) {
        Ok(true) => (true, "Signature is valid".to_string()),
        Ok(false) => (false, "Signature is invalid".to_string()),
        Err(e) => (false, format!("Verification error: {}", e)),
    };

    if json {
        print_json(&VerifyOutput {
            valid,
            root: attestation.root.to_hex(),
            message: message.clone(),
        })?;
    } else if valid {
        println!("✓ Signature is VALID");
        println!("  Root: {}", attestation.root);
        println!("  Key id: {}", attestation.public_key.key_id());
    } else {
        println!("✗ {}", message);
    }

    if valid {
        Ok(())
    } else {
        Err(anyhow!("Signature verification failed"))
    }
}

fn cmd_issue(
    record_path: PathBuf,
    key_path: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let key = read_key_file(&key_path)?;
    let service = service_for_key(config, key.backend)?;
    let record: IdentityRecord = read_json(&record_path, "record")?;

    let receipt = service.issue_identity(&record, &key.private)?;
    check_public_key(&key, &receipt.attestation.public_key)?;

    if json {
        print_json(&receipt)?;
    } else {
        print!("{}", receipt);
    }

    if let Some(output_path) = output {
        write_json(&output_path, &receipt, "receipt")?;
        if !json {
            println!("Receipt saved to: {}", output_path.display());
        }
    }

    Ok(())
}

fn parse_args() -> Result<(String, Vec<String>)> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        bail!("Usage: merkle-cli <command> [options]");
    }

    Ok((args[1].clone(), args[2..].to_vec()))
}

fn parse_backend(raw: &str) -> Result<SignatureBackend> {
    match raw {
        "field_ecdsa" | "field" => Ok(SignatureBackend::FieldEcdsa),
        "p256_ecdsa" | "p256" => Ok(SignatureBackend::P256Ecdsa),
        other => bail!("Unknown backend: {}", other),
    }
}

fn print_usage() {
    println!("Merkle CLI - Commit to attributes, prove and attest");
    println!();
    println!("USAGE:");
    println!("    merkle-cli build --input <file> [--record] [--output <file>] [--config <file>] [--json]");
    println!("    merkle-cli prove --tree <file> (--leaf-index <n> | --attribute <name>) [--output <file>] [--json]");
    println!("    merkle-cli verify --proof <file> [--value <value>] [--json]");
    println!("    merkle-cli keygen --output <file> [--backend field_ecdsa|p256_ecdsa] [--json]");
    println!("    merkle-cli attest --tree <file> --key <file> [--config <file>] [--output <file>] [--json]");
    println!("    merkle-cli verify-signature --attestation <file> [--config <file>] [--json]");
    println!("    merkle-cli issue --input <file> --key <file> [--config <file>] [--output <file>] [--json]");
    println!();
    println!("COMMANDS:");
    println!("    build             Build a commitment from name=value lines or an identity record");
    println!("    prove             Generate an inclusion proof for one attribute");
    println!("    verify            Verify an inclusion proof, optionally against a revealed value");
    println!("    keygen            Generate a signing key");
    println!("    attest            Sign a commitment root");
    println!("    verify-signature  Verify a signed root");
    println!("    issue             Commit to and sign an identity record in one step");
    println!();
    println!("Values starting with 0x are field elements; anything else is text.");
    println!();
    println!("EXAMPLES:");
    println!("    merkle-cli build --input attributes.txt --output tree.json");
    println!("    merkle-cli prove --tree tree.json --attribute nationality --output proof.json");
    println!("    merkle-cli verify --proof proof.json --value Swiss");
}

/// Collects `--flag value` pairs and boolean switches.
struct Flags {
    values: Vec<(String, String)>,
    switches: Vec<String>,
}

impl Flags {
    fn parse(args: &[String], switches: &[&str]) -> Self {
        let mut values = Vec::new();
        let mut seen = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if switches.contains(&arg) {
                seen.push(arg.to_string());
            } else if arg.starts_with('-') && i + 1 < args.len() {
                i += 1;
                values.push((arg.to_string(), args[i].clone()));
            }
            i += 1;
        }

        Self {
            values,
            switches: seen,
        }
    }

    fn get(&self, names: &[&str]) -> Option<String> {
        self.values
            .iter()
            .find(|(flag, _)| names.contains(&flag.as_str()))
            .map(|(_, value)| value.clone())
    }

    fn path(&self, names: &[&str]) -> Option<PathBuf> {
        self.get(names).map(PathBuf::from)
    }

    fn has(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }
}

fn run(command: &str, args: &[String]) -> Result<()> {
    let flags = Flags::parse(args, &["--json", "--record"]);
    let json = flags.has("--json");
    let config = flags.path(&["--config", "-c"]);
    let output = flags.path(&["--output", "-o"]);

    match command {
        "build" => {
            let input = flags
                .path(&["--input", "-i"])
                .ok_or_else(|| anyhow!("Missing --input argument"))?;
            cmd_build(input, flags.has("--record"), output, config, json)
        }
        "prove" => {
            let tree = flags
                .path(&["--tree", "-t"])
                .ok_or_else(|| anyhow!("Missing --tree argument"))?;
            let leaf_index = flags
                .get(&["--leaf-index", "-l"])
                .map(|raw| raw.parse::<usize>())
                .transpose()
                .context("Invalid --leaf-index argument")?;
            let attribute = flags.get(&["--attribute", "-a"]);
            load_config(config)?;
            cmd_prove(tree, leaf_index, attribute, output, json)
        }
        "verify" => {
            let proof = flags
                .path(&["--proof", "-p"])
                .ok_or_else(|| anyhow!("Missing --proof argument"))?;
            load_config(config)?;
            cmd_verify(proof, flags.get(&["--value", "-v"]), json)
        }
        "keygen" => {
            let output = output.ok_or_else(|| anyhow!("Missing --output argument"))?;
            let backend = match flags.get(&["--backend", "-b"]) {
                Some(raw) => parse_backend(&raw)?,
                None => SignatureBackend::default(),
            };
            cmd_keygen(backend, output, json)
        }
        "attest" => {
            let tree = flags
                .path(&["--tree", "-t"])
                .ok_or_else(|| anyhow!("Missing --tree argument"))?;
            let key = flags
                .path(&["--key", "-k"])
                .ok_or_else(|| anyhow!("Missing --key argument"))?;
            cmd_attest(tree, key, config, output, json)
        }
        "verify-signature" => {
            let attestation = flags
                .path(&["--attestation", "-a"])
                .ok_or_else(|| anyhow!("Missing --attestation argument"))?;
            cmd_verify_signature(attestation, config, json)
        }
        "issue" => {
            let record = flags
                .path(&["--input", "-i"])
                .ok_or_else(|| anyhow!("Missing --input argument"))?;
            let key = flags
                .path(&["--key", "-k"])
                .ok_or_else(|| anyhow!("Missing --key argument"))?;
            cmd_issue(record, key, config, output, json)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            Err(anyhow!("Unknown command: {}", command))
        }
    }
}

fn main() {
    let (command, args) = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            println!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&command, &args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
