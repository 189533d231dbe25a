pub(crate) mod additive;
pub(crate) mod group;
pub(crate) mod schnorr;
pub(crate) mod units;

/// Reference values for a 127-bit Schnorr group, checked against every exponentiation path
/// the crate has: the primitive itself, both windowed algorithms, their interleaved forms, and
/// the lazy engine under either algorithm.
///
/// Like the rest of the arithmetic, these run noticeably faster with `cargo test --release`.
#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;
    use num_bigint::{BigInt, BigUint};
    use serde::{Deserialize, Serialize};
    use std::str::FromStr;
    use std::{fs, path::Path};

    use crate::exp::algorithms::{
        interleaved_sliding_window_multiexp, interleaved_wnaf_multiexp, sliding_window_exp,
        square_and_multiply, wnaf_exp,
    };
    use crate::exp::multiexp::MultiexpTerm;
    use crate::exp::precomputation::SmallExponentPrecomputation;
    use crate::exp::ExponentiationAlgorithm;
    use crate::groups::group::GroupPrimitive;
    use crate::groups::schnorr::{SchnorrElement, SchnorrGroup};
    use crate::lazy::group::{LazyGroup, LazyGroupConfig};
    use crate::lazy::pool::WorkerPool;

    #[derive(Serialize, Deserialize)]
    struct _Pow {
        base: String,
        exponent: String,
        result: String,
    }
    #[derive(Serialize, Deserialize)]
    struct _Multiexp {
        bases: Vec<String>,
        exponents: Vec<String>,
        result: String,
    }
    #[derive(Serialize, Deserialize)]
    struct _Schnorr {
        p: String,
        q: String,
        g: String,
        pow: Vec<_Pow>,
        multiexp: Vec<_Multiexp>,
    }
    #[derive(Serialize, Deserialize)]
    struct ReferenceData {
        schnorr: _Schnorr,
    }

    struct PowCase {
        base: SchnorrElement,
        exponent: BigInt,
        result: SchnorrElement,
    }
    struct MultiexpCase {
        terms: Vec<(SchnorrElement, BigInt)>,
        result: SchnorrElement,
    }
    struct SchnorrReferenceData {
        group: SchnorrGroup,
        pow: Vec<PowCase>,
        multiexp: Vec<MultiexpCase>,
    }

    fn convert_to_biguint(s: &str) -> BigUint {
        BigUint::from_str(s).expect("failed to parse reference integer")
    }
    fn convert_to_bigint(s: &str) -> BigInt {
        BigInt::from_str(s).expect("failed to parse reference exponent")
    }
    fn convert_to_element(group: &SchnorrGroup, s: &str) -> SchnorrElement {
        group
            .element(convert_to_biguint(s))
            .expect("reference value is not in the group")
    }

    const FNAME: &str = "./src/reference.json";

    lazy_static! {
        static ref REFERENCE_DATA: ReferenceData = {
            let path = Path::new(FNAME);
            let file_content = fs::read_to_string(path).expect("Failed to read file");
            serde_json::from_str(&file_content).expect("Failed to parse JSON")
        };
        static ref SCHNORR_REFERENCE_DATA: SchnorrReferenceData = {
            let data = &REFERENCE_DATA.schnorr;
            let group = SchnorrGroup::new(
                convert_to_biguint(&data.p),
                convert_to_biguint(&data.q),
                convert_to_biguint(&data.g),
            )
            .expect("invalid reference group");
            let pow = data
                .pow
                .iter()
                .map(|case| PowCase {
                    base: convert_to_element(&group, &case.base),
                    exponent: convert_to_bigint(&case.exponent),
                    result: convert_to_element(&group, &case.result),
                })
                .collect();
            let multiexp = data
                .multiexp
                .iter()
                .map(|case| MultiexpCase {
                    terms: case
                        .bases
                        .iter()
                        .zip(&case.exponents)
                        .map(|(b, e)| (convert_to_element(&group, b), convert_to_bigint(e)))
                        .collect(),
                    result: convert_to_element(&group, &case.result),
                })
                .collect();
            SchnorrReferenceData {
                group,
                pow,
                multiexp,
            }
        };
    }

    fn lazy_group(algorithm: ExponentiationAlgorithm) -> LazyGroup<SchnorrGroup> {
        LazyGroup::with_config(
            SCHNORR_REFERENCE_DATA.group.clone(),
            LazyGroupConfig {
                algorithm: Some(algorithm),
                ..LazyGroupConfig::default()
            },
            WorkerPool::Inline,
        )
    }

    mod pow {
        use super::*;

        #[test]
        fn test_primitive_pow() {
            let group = &SCHNORR_REFERENCE_DATA.group;
            for case in &SCHNORR_REFERENCE_DATA.pow {
                assert_eq!(
                    group.pow(&case.base, &case.exponent),
                    Ok(case.result.clone()),
                    "primitive pow failed"
                );
                assert_eq!(
                    square_and_multiply(group, &case.base, &case.exponent),
                    Ok(case.result.clone()),
                    "square and multiply failed"
                );
            }
        }

        #[test]
        fn test_windowed_pow() {
            let group = &SCHNORR_REFERENCE_DATA.group;
            for case in &SCHNORR_REFERENCE_DATA.pow {
                for window in [1, 3, 5] {
                    let precomputation = SmallExponentPrecomputation::new(case.base.clone());
                    assert_eq!(
                        sliding_window_exp(group, &case.exponent, &precomputation, window),
                        Ok(case.result.clone()),
                        "sliding window pow failed for window {window}"
                    );
                    assert_eq!(
                        wnaf_exp(group, &case.exponent, &precomputation, window),
                        Ok(case.result.clone()),
                        "wNAF pow failed for window {window}"
                    );
                }
            }
        }

        #[test]
        fn test_lazy_pow() {
            for algorithm in [ExponentiationAlgorithm::SlidingWindow, ExponentiationAlgorithm::Wnaf] {
                let lazy = lazy_group(algorithm);
                for case in &SCHNORR_REFERENCE_DATA.pow {
                    let x = lazy.wrap(case.base.clone()).pow(case.exponent.clone());
                    assert_eq!(
                        x.concrete_value(),
                        Ok(case.result.clone()),
                        "lazy pow failed for {algorithm:?}"
                    );
                }
            }
        }
    }

    mod multiexp {
        use super::*;

        #[test]
        fn test_interleaved_multiexp() {
            let group = &SCHNORR_REFERENCE_DATA.group;
            for case in &SCHNORR_REFERENCE_DATA.multiexp {
                let terms: Vec<_> = case
                    .terms
                    .iter()
                    .map(|(base, exponent)| MultiexpTerm::fresh(base.clone(), exponent.clone()))
                    .collect();
                assert_eq!(
                    interleaved_sliding_window_multiexp(group, &terms, 4),
                    Ok(case.result.clone()),
                    "interleaved sliding window failed for {} terms",
                    terms.len()
                );
                assert_eq!(
                    interleaved_wnaf_multiexp(group, &terms, 4),
                    Ok(case.result.clone()),
                    "interleaved wNAF failed for {} terms",
                    terms.len()
                );
            }
        }

        #[test]
        fn test_lazy_multiexp() {
            for algorithm in [ExponentiationAlgorithm::SlidingWindow, ExponentiationAlgorithm::Wnaf] {
                let lazy = lazy_group(algorithm);
                for case in &SCHNORR_REFERENCE_DATA.multiexp {
                    let product = case.terms.iter().fold(lazy.neutral_element(), |acc, (b, e)| {
                        acc.op(&lazy.wrap(b.clone()).pow(e.clone()))
                            .expect("same group")
                    });
                    assert_eq!(
                        product.concrete_value(),
                        Ok(case.result.clone()),
                        "lazy multiexp failed for {algorithm:?}"
                    );
                }
            }
        }
    }
}
