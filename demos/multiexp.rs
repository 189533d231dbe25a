use lazygroup::{
    ExponentiationAlgorithm, GroupError, LazyGroup, LazyGroupConfig, LazyGroupElement,
    SchnorrGroup, WorkerPool,
};
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::Zero;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, info};

/// A 127-bit safe prime and the order of its quadratic residues.
const P: &str = "170141183460469231731687303715884159587";
const Q: &str = "85070591730234615865843651857942079793";

/// Configuration for the batch verification run
#[derive(Debug, Serialize, Deserialize)]
struct DemoConfig {
    /// Number of signatures to create and verify
    n_signatures: usize,
    /// Window for ad-hoc exponentiations
    exponentiation_window_size: usize,
    /// Window for the generator's long-lived table
    precomputation_window_size: usize,
    /// Threads of the dedicated worker pool
    worker_threads: usize,
    /// "auto", "sliding-window" or "wnaf"
    algorithm: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            n_signatures: 64,
            exponentiation_window_size: 4,
            precomputation_window_size: 8,
            worker_threads: 4,
            algorithm: "auto".to_string(),
        }
    }
}

impl DemoConfig {
    fn lazy_config(&self) -> LazyGroupConfig {
        let algorithm = match self.algorithm.as_str() {
            "sliding-window" => Some(ExponentiationAlgorithm::SlidingWindow),
            "wnaf" => Some(ExponentiationAlgorithm::Wnaf),
            _ => None,
        };
        LazyGroupConfig {
            exponentiation_window_size: self.exponentiation_window_size,
            precomputation_window_size: self.precomputation_window_size,
            algorithm,
        }
    }
}

/// A Schnorr signature `(r, s)` with `g^s = r * y^e` and `e = H(r || m)`.
struct Signature {
    r: LazyGroupElement<SchnorrGroup>,
    s: BigUint,
}

struct Signer {
    secret_key: BigUint,
    public_key: LazyGroupElement<SchnorrGroup>,
}

fn challenge(
    group: &LazyGroup<SchnorrGroup>,
    r: &LazyGroupElement<SchnorrGroup>,
    msg: &[u8],
) -> Result<BigUint, GroupError> {
    let digest = Sha3_256::new()
        .chain_update(r.unique_bytes()?)
        .chain_update(msg)
        .finalize();
    Ok(BigUint::from_bytes_be(&digest) % group.primitive().order())
}

impl Signer {
    fn generate(group: &LazyGroup<SchnorrGroup>, g: &LazyGroupElement<SchnorrGroup>) -> Self {
        let secret_key = thread_rng().gen_biguint_below(group.primitive().order());
        let public_key = g.pow(BigInt::from(secret_key.clone()));
        // start computing now; verification only needs it later
        public_key.compute();
        Self {
            secret_key,
            public_key,
        }
    }

    fn sign(
        &self,
        group: &LazyGroup<SchnorrGroup>,
        g: &LazyGroupElement<SchnorrGroup>,
        msg: &[u8],
    ) -> Result<Signature, GroupError> {
        let q = group.primitive().order();
        let k = thread_rng().gen_biguint_below(q);
        let r = g.pow(BigInt::from(k.clone()));
        let e = challenge(group, &r, msg)?;
        let s = (k + e * &self.secret_key) % q;
        Ok(Signature { r, s })
    }
}

/// `prod(g^(s_i) * y_i^(-e_i) * r_i^(-1))`, which is neutral iff every signature is valid
/// (up to a negligible chance). The whole product is a single multi-exponentiation.
fn batch_verify(
    group: &LazyGroup<SchnorrGroup>,
    g: &LazyGroupElement<SchnorrGroup>,
    batch: &[(&Signer, Vec<u8>, Signature)],
) -> Result<bool, GroupError> {
    let mut s_total = BigUint::zero();
    let mut product = group.neutral_element();
    for (signer, msg, signature) in batch {
        let e = challenge(group, &signature.r, msg)?;
        s_total += &signature.s;
        product = product
            .op(&signer.public_key.pow(-BigInt::from(e)))?
            .op(&signature.r.inv())?;
    }
    let product = product.op(&g.pow(BigInt::from(s_total)))?;
    Ok(product == group.neutral_element())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();
    info!("Begin batch verification demo");

    let config_path = PathBuf::from("demos/multiexp.toml");
    let cfg: DemoConfig = confy::load_path(config_path)?;
    debug!("Loaded config: {:?}", cfg);

    let schnorr = SchnorrGroup::new(
        BigUint::from_str(P)?,
        BigUint::from_str(Q)?,
        BigUint::from(4u8),
    )?;
    let pool = WorkerPool::dedicated(cfg.worker_threads)?;
    let group = LazyGroup::with_config(schnorr, cfg.lazy_config(), pool);
    info!("Algorithm: {:?}", group.algorithm());

    let g = group.generator()?;
    g.precompute_pow()?;
    debug!("Generator table window: {}", g.precomputed_window_size()?);

    let signers: Vec<Signer> = (0..cfg.n_signatures)
        .map(|_| Signer::generate(&group, &g))
        .collect();
    let mut batch = Vec::with_capacity(signers.len());
    for (i, signer) in signers.iter().enumerate() {
        let msg = format!("message #{i}").into_bytes();
        let signature = signer.sign(&group, &g, &msg)?;
        batch.push((signer, msg, signature));
    }
    info!("Created {} signatures", batch.len());

    let start = Instant::now();
    let valid = batch_verify(&group, &g, &batch)?;
    info!("Batch verified in {:?}", start.elapsed());
    if valid {
        info!("All signatures verified successfully!");
    } else {
        error!("Batch verification failed");
    }

    debug!("Tampering with the first signature...");
    if let Some((_, _, signature)) = batch.first_mut() {
        signature.s += 1u8;
    }
    if batch_verify(&group, &g, &batch)? {
        error!("Tampered batch was accepted");
    } else {
        info!("Tampered batch rejected");
    }
    Ok(())
}
