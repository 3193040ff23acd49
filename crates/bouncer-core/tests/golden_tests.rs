//! Golden tests for the bounce calls
//!
//! Every case under `golden-corpus/` is replayed through the dispatcher and
//! compared with its stored snapshot. Run with `UPDATE_GOLDEN=1` to rewrite
//! snapshots after an intended behavior change.

use bouncer_golden::{GoldenConfig, GoldenTestRunner};

/// Run all golden tests in the corpus
#[test]
fn golden_test_suite() {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());

    match runner.run_batch("*") {
        Ok(summary) => println!("Golden corpus: {}", summary),
        Err(e) => panic!("Golden tests failed: {}", e),
    }
}

#[test]
fn golden_test_masked_fields() {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());

    runner
        .run_batch("masked-fields")
        .expect("Masked field golden tests failed");
}

/// Show corpus statistics
#[test]
#[ignore]
fn golden_corpus_stats() {
    let runner = GoldenTestRunner::new(GoldenConfig::from_env());

    let stats = runner
        .statistics()
        .expect("Failed to get corpus statistics");
    println!("{}", stats);
}

mod individual_tests {
    use bouncer_golden::{golden_test, golden_test_batch};

    golden_test!(test_hello_world, "scalars/hello-world");
    golden_test!(test_unregistered_any, "masked-fields/unregistered-any");
    golden_test!(test_echo_headers_without_metadata, "passthrough/echo-headers-without-metadata");

    golden_test_batch!("passthrough");
}
