#![no_main]
use libfuzzer_sys::fuzz_target;
use lazygroup::{
    interleaved_sliding_window_multiexp, interleaved_wnaf_multiexp, sliding_window_exp,
    square_and_multiply, wnaf_exp, GroupPrimitive, LazyGroup, MultiexpTerm, SchnorrGroup,
    SmallExponentPrecomputation, WorkerPool,
};
use num_bigint::{BigInt, BigUint, Sign};

fuzz_target!(|data: &[u8]| {
    if data.len() < 66 {
        return;
    }

    let group = SchnorrGroup::new(
        BigUint::from(2_147_483_783u64),
        BigUint::from(1_073_741_891u64),
        BigUint::from(4u8),
    )
    .expect("valid parameters");
    let g = group.generator().expect("generator");

    let sign = |b: u8| if b & 1 == 0 { Sign::Plus } else { Sign::Minus };
    let x = BigInt::from_bytes_be(sign(data[0]), &data[2..34]);
    let y = BigInt::from_bytes_be(sign(data[1]), &data[34..66]);
    let window = usize::from(data[0] >> 1) % 8 + 1;
    let h = group.pow(&g, &BigInt::from_bytes_be(Sign::Plus, &data[66..])).expect("pow");

    // Windowed methods agree with binary exponentiation
    let expected = square_and_multiply(&group, &g, &x).expect("pow");
    let precomputation = SmallExponentPrecomputation::new(g.clone());
    assert_eq!(
        sliding_window_exp(&group, &x, &precomputation, window),
        Ok(expected.clone()),
        "sliding window disagrees"
    );
    assert_eq!(
        wnaf_exp(&group, &x, &precomputation, window),
        Ok(expected.clone()),
        "wNAF disagrees"
    );

    // Interleaving agrees with separate exponentiations
    let product = group.op(
        &expected,
        &square_and_multiply(&group, &h, &y).expect("pow"),
    );
    let terms = vec![
        MultiexpTerm::fresh(g.clone(), x.clone()),
        MultiexpTerm::fresh(h.clone(), y.clone()),
    ];
    assert_eq!(
        interleaved_sliding_window_multiexp(&group, &terms, window),
        Ok(product.clone()),
        "interleaved sliding window disagrees"
    );
    assert_eq!(
        interleaved_wnaf_multiexp(&group, &terms, window),
        Ok(product.clone()),
        "interleaved wNAF disagrees"
    );

    // The lazy engine agrees on a flattened expression
    let lazy = LazyGroup::with_pool(group.clone(), WorkerPool::Inline);
    let lg = lazy.wrap(g);
    let lh = lazy.wrap(h);
    let z = lg
        .pow(x)
        .op(&lh.pow(y))
        .expect("same group")
        .op(&lg.inv())
        .expect("same group")
        .op(&lg)
        .expect("same group");
    assert_eq!(z.concrete_value(), Ok(product), "lazy evaluation disagrees");
});
