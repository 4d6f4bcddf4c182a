//! Integration test: whole jobs against the single-field reference.

use heatsim_core::{ConfigError, Dims, Field};
use heatsim_engine::{run_job, run_rank, ErrorKind, Operation, SimConfig};
use heatsim_kernel::{ForcingPolicy, KernelChoice};
use heatsim_test_utils::{fixtures, on_each_rank, reference_run};
use proptest::prelude::*;

fn config(dims: Dims, iterations: u64) -> SimConfig {
    SimConfig {
        dims,
        iterations,
        ..SimConfig::default()
    }
}

fn reference(config: &SimConfig, input: &Field) -> Field {
    let kernel = config.kernel.build().unwrap();
    reference_run(input, &*kernel, config.forcing, config.iterations)
}

#[test]
fn zero_iterations_round_trip_the_input() {
    let input = fixtures::numbered(11, 7);
    let out = run_job(&config(Dims::new(3, 2), 0), input.clone(), 6).unwrap();
    assert_eq!(out, input);
}

#[test]
fn constant_field_on_four_workers_is_unchanged() {
    let input = fixtures::constant(8, 8, 250.0);
    let mut c = config(Dims::new(2, 2), 0);
    c.forcing = ForcingPolicy::None;
    assert_eq!(run_job(&c, input.clone(), 4).unwrap(), input);

    // With periodic boundaries a constant field is a fixed point.
    c.iterations = 10;
    assert_eq!(run_job(&c, input.clone(), 4).unwrap(), input);
}

#[test]
fn single_worker_matches_the_reference() {
    let input = fixtures::hot_spot(9, 6, 4, 2, 1000.0);
    for forcing in ForcingPolicy::ALL {
        let mut c = config(Dims::new(1, 1), 12);
        c.forcing = forcing;
        let out = run_job(&c, input.clone(), 1).unwrap();
        assert_eq!(out, reference(&c, &input), "forcing {forcing}");
    }
}

#[test]
fn distributed_grids_match_the_reference() {
    let input = fixtures::pattern(13, 10, 1000.0);
    for dims in [
        Dims::new(2, 2),
        Dims::new(3, 2),
        Dims::new(1, 4),
        Dims::new(4, 1),
        Dims::new(3, 3),
    ] {
        let mut c = config(dims, 8);
        c.forcing = ForcingPolicy::Max;
        let out = run_job(&c, input.clone(), dims.count()).unwrap();
        assert_eq!(out, reference(&c, &input), "dims {dims}");
    }
}

#[test]
fn explicit_diffusion_kernel_runs_distributed() {
    let input = fixtures::per_tile(12, 9, Dims::new(3, 3));
    let mut c = config(Dims::new(3, 3), 6);
    c.kernel = KernelChoice::ExplicitDiffusion { alpha: 0.2 };
    c.forcing = ForcingPolicy::None;
    let out = run_job(&c, input.clone(), 9).unwrap();
    assert_eq!(out, reference(&c, &input));
    assert!((out.interior_sum() - input.interior_sum()).abs() < 1e-6);
}

#[test]
fn worker_count_mismatch_is_fatal() {
    let err = run_job(&config(Dims::new(2, 3), 5), fixtures::numbered(8, 8), 4).unwrap_err();
    assert_eq!(err.operation, Operation::Validate);
    assert_eq!(
        err.kind,
        ErrorKind::Config(ConfigError::DecompositionMismatch {
            dims: Dims::new(2, 3),
            workers: 4
        })
    );
}

#[test]
fn grid_larger_than_field_is_fatal() {
    let err = run_job(&config(Dims::new(4, 1), 1), fixtures::numbered(3, 3), 4).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Config(ConfigError::FieldTooSmall { .. })
    ));
}

#[test]
fn chained_runs_equal_one_long_run() {
    let input = fixtures::hot_spot(10, 9, 4, 5, 1000.0);
    let mut c = config(Dims::new(2, 2), 3);
    c.forcing = ForcingPolicy::None;
    let first = run_job(&c, input.clone(), 4).unwrap();
    c.iterations = 4;
    let chained = run_job(&c, first, 4).unwrap();

    c.iterations = 7;
    let single = run_job(&c, input.clone(), 4).unwrap();
    assert_eq!(chained, single);
    assert_ne!(single, input);
}

#[test]
fn per_rank_entry_matches_the_in_process_job() {
    let input = fixtures::pattern(9, 7, 1000.0);
    let c = config(Dims::new(3, 2), 4);
    let results = on_each_rank(c.dims, |mut comm, topo| {
        let global = topo.rank().is_coordinator().then(|| input.clone());
        run_rank(&mut comm, &c, global).unwrap()
    });
    let mut results = results.into_iter();
    let gathered = results.next().flatten().unwrap();
    assert!(results.all(|r| r.is_none()));
    assert_eq!(gathered, run_job(&c, input, 6).unwrap());
}

#[test]
fn per_rank_mismatch_fails_everywhere_before_any_transfer() {
    let c = config(Dims::new(3, 1), 1);
    let errors = on_each_rank(Dims::new(2, 2), |mut comm, topo| {
        let global = topo.rank().is_coordinator().then(|| fixtures::constant(8, 8, 1.0));
        run_rank(&mut comm, &c, global).unwrap_err()
    });
    assert_eq!(errors.len(), 4);
    for err in errors {
        assert_eq!(err.operation, Operation::Validate);
        assert!(matches!(
            err.kind,
            ErrorKind::Config(ConfigError::DecompositionMismatch { workers: 4, .. })
        ));
    }
}

#[test]
fn per_rank_bad_field_aborts_the_other_ranks() {
    let c = config(Dims::new(2, 2), 1);
    let errors = on_each_rank(c.dims, |mut comm, topo| {
        let global = topo.rank().is_coordinator().then(|| fixtures::constant(1, 8, 1.0));
        run_rank(&mut comm, &c, global).unwrap_err()
    });
    assert!(matches!(
        errors[0].kind,
        ErrorKind::Config(ConfigError::FieldTooSmall { .. })
    ));
    assert!(errors[1..].iter().all(|e| e.is_abort()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_decomposition_matches_the_reference(
        width in 1usize..14,
        height in 1usize..14,
        dx in 1usize..4,
        dy in 1usize..4,
        iterations in 0u64..6,
    ) {
        prop_assume!(width >= dx && height >= dy);
        let input = fixtures::pattern(width, height, 1000.0);
        let c = config(Dims::new(dx, dy), iterations);
        let out = run_job(&c, input.clone(), dx * dy).unwrap();
        prop_assert_eq!(out, reference(&c, &input));
    }
}
