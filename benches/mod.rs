use criterion::{criterion_group, criterion_main};

use exp::multiexp::*;
use exp::pow::*;

use lazy::*;

criterion_group!(
    pow_benches,
    test_square_and_multiply,
    test_sliding_window_exp,
    test_wnaf_exp,
    test_precomputed_exp
);
criterion_group!(
    multiexp_benches,
    test_separate_exponentiations,
    test_interleaved_sliding_window_multiexp,
    test_interleaved_wnaf_multiexp
);
criterion_group!(
    lazy_benches,
    test_lazy_expression,
    test_lazy_multiexp,
    test_lazy_units_exp
);

criterion_main!(pow_benches, multiexp_benches, lazy_benches);
