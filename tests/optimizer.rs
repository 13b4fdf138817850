use std::cell::Cell;
use std::ops::ControlFlow;

use smbo::prelude::*;

fn unit_interval() -> Domain {
    Domain::new(vec![Dimension::continuous("x", 0.0, 1.0)]).unwrap()
}

fn boosting_domain() -> Domain {
    Domain::new(vec![
        Dimension::continuous("learning_rate", 0.001, 0.3),
        Dimension::discrete("max_depth", 2, 10),
        Dimension::discrete("n_estimators", 50, 500),
        Dimension::discrete("min_samples_leaf", 1, 3),
        Dimension::continuous("max_features", 0.1, 1.0),
    ])
    .unwrap()
}

/// Smooth stand-in for a cross-validated score over `boosting_domain`.
fn boosting_score(p: &Point) -> Result<f64> {
    let lr = (p[0] - 0.08) / 0.3;
    let depth = (p[1] - 4.0) / 8.0;
    let trees = (p[2] - 300.0) / 450.0;
    Ok(0.9 - lr * lr - depth * depth - 0.5 * trees * trees - 0.01 * p[3] + 0.05 * p[4])
}

// =============================================================================
// Convergence
// =============================================================================

#[test]
fn test_converges_on_one_dimensional_quadratic() {
    let outcome = Optimizer::builder()
        .warmup_count(3)
        .max_iterations(10)
        .maximize()
        .seed(42)
        .build()
        .run(&unit_interval(), |p: &Point| Ok::<_, Error>(-(p[0] - 0.7).powi(2)))
        .expect("optimization should succeed");

    let best = outcome.best_point().expect("should have observations");
    assert!(
        (best[0] - 0.7).abs() < 0.05,
        "best x = {} should be within 0.05 of 0.7",
        best[0]
    );
}

#[test]
fn test_converges_on_one_dimensional_quadratic_across_seeds() {
    let optimizer = |seed| {
        Optimizer::builder()
            .warmup_count(3)
            .max_iterations(10)
            .seed(seed)
            .build()
    };
    let misses: Vec<(u64, f64)> = (0..100)
        .filter_map(|seed| {
            let outcome = optimizer(seed)
                .run(&unit_interval(), |p: &Point| Ok::<_, Error>(-(p[0] - 0.7).powi(2)))
                .unwrap();
            let x = outcome.best_point().unwrap()[0];
            ((x - 0.7).abs() >= 0.05).then_some((seed, x))
        })
        .collect();
    assert!(misses.is_empty(), "seeds that missed 0.7: {misses:?}");
}

#[test]
fn test_converges_when_minimizing() {
    let domain = Domain::new(vec![Dimension::continuous("x", -5.0, 5.0)]).unwrap();
    let outcome = Optimizer::builder()
        .minimize()
        .warmup_count(4)
        .max_iterations(15)
        .seed(7)
        .build()
        .run(&domain, |p: &Point| Ok::<_, Error>((p[0] - 1.5).powi(2) + 3.0))
        .unwrap();

    let best = outcome.best().unwrap();
    assert!(best.score < 3.1, "best score {} should approach 3.0", best.score);
    // Scores are stored as returned, not sign-flipped.
    assert!(outcome.history.iter().all(|o| o.score >= 3.0));
}

#[test]
fn test_beats_random_search_on_average() {
    let domain = boosting_domain();
    let budget = 30;
    let mut bo_total = 0.0;
    let mut rs_total = 0.0;

    for seed in 0..3 {
        let bo = Optimizer::builder()
            .warmup_count(5)
            .max_iterations(budget - 5)
            .seed(seed)
            .build()
            .run(&domain, boosting_score)
            .unwrap();
        let rs = RandomSearch::new(budget).seed(seed).run(&domain, boosting_score).unwrap();
        bo_total += bo.best_score().unwrap();
        rs_total += rs.best_score().unwrap();
    }

    assert!(
        bo_total > rs_total,
        "model-based total {bo_total} should beat random total {rs_total}"
    );
}

// =============================================================================
// History invariants
// =============================================================================

#[test]
fn test_history_length_matches_budget() {
    let outcome = Optimizer::builder()
        .warmup_count(4)
        .max_iterations(6)
        .seed(1)
        .build()
        .run(&unit_interval(), |p: &Point| Ok::<_, Error>(p[0]))
        .unwrap();
    assert_eq!(outcome.history.len(), 10);
    assert_eq!(outcome.termination, Termination::Completed);
}

#[test]
fn test_history_length_after_warmup_and_each_iteration() {
    let warmup = 5;
    let lengths = std::cell::RefCell::new(Vec::new());

    struct Recorder<'a> {
        lengths: &'a std::cell::RefCell<Vec<usize>>,
    }

    impl Objective for Recorder<'_> {
        type Error = Error;

        fn evaluate(&self, point: &Point) -> Result<f64> {
            Ok(point[0].sin())
        }

        fn before_evaluation(&self, history: &History) -> ControlFlow<()> {
            self.lengths.borrow_mut().push(history.len());
            ControlFlow::Continue(())
        }
    }

    let outcome = Optimizer::builder()
        .warmup_count(warmup)
        .max_iterations(4)
        .seed(2)
        .build()
        .run(&unit_interval(), Recorder { lengths: &lengths })
        .unwrap();

    // The hook sees the history before every evaluation: 0, 1, ..., 8.
    assert_eq!(*lengths.borrow(), (0..9).collect::<Vec<_>>());
    assert_eq!(outcome.history.len(), warmup + 4);
}

#[test]
fn test_every_point_respects_domain() {
    let domain = boosting_domain();
    let outcome = Optimizer::builder()
        .warmup_count(5)
        .max_iterations(10)
        .n_candidates(500)
        .seed(3)
        .build()
        .run(&domain, boosting_score)
        .unwrap();

    for obs in &outcome.history {
        assert!(domain.contains(&obs.point), "{:?} outside domain", obs.point);
        for (dim, &v) in domain.dimensions().iter().zip(&obs.point) {
            if dim.is_discrete() {
                assert_eq!(v.fract(), 0.0, "{} = {v} is not an integer", dim.name());
            }
        }
    }
}

#[test]
fn test_objective_only_sees_valid_points() {
    let domain = boosting_domain();
    Optimizer::builder()
        .warmup_count(3)
        .max_iterations(5)
        .n_candidates(200)
        .seed(8)
        .build()
        .run(&domain, |p: &Point| {
            assert!(domain.contains(p));
            boosting_score(p)
        })
        .unwrap();
}

#[test]
fn test_best_trajectory_is_monotone() {
    let outcome = Optimizer::builder()
        .warmup_count(3)
        .max_iterations(12)
        .seed(11)
        .build()
        .run(&unit_interval(), |p: &Point| {
            Ok::<_, Error>((6.0 * p[0]).sin() * p[0])
        })
        .unwrap();

    let trajectory = outcome.trajectory();
    assert_eq!(trajectory.len(), 15);
    for pair in trajectory.windows(2) {
        assert!(pair[1] >= pair[0], "trajectory decreased: {pair:?}");
    }
    assert_eq!(trajectory.last().copied(), outcome.best_score());
    // Re-querying does not change anything.
    assert_eq!(outcome.trajectory(), trajectory);
}

#[test]
fn test_same_seed_same_history() {
    let run = |seed| {
        Optimizer::builder()
            .warmup_count(3)
            .max_iterations(8)
            .seed(seed)
            .build()
            .run(&boosting_domain(), boosting_score)
            .unwrap()
            .history
    };
    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

#[test]
fn test_optimizer_is_reusable() {
    let optimizer = Optimizer::builder().warmup_count(2).max_iterations(3).seed(5).build();
    let a = optimizer.run(&unit_interval(), |p: &Point| Ok::<_, Error>(p[0])).unwrap();
    let b = optimizer.run(&unit_interval(), |p: &Point| Ok::<_, Error>(p[0])).unwrap();
    assert_eq!(a, b);
}

// =============================================================================
// Failures and interruption
// =============================================================================

#[test]
fn test_objective_failure_on_sixth_evaluation_keeps_five() {
    let calls = Cell::new(0);
    let err = Optimizer::builder()
        .warmup_count(3)
        .max_iterations(10)
        .seed(4)
        .build()
        .run(&unit_interval(), |p: &Point| {
            calls.set(calls.get() + 1);
            if calls.get() == 6 {
                Err("cross-validation crashed")
            } else {
                Ok(-(p[0] - 0.5).powi(2))
            }
        })
        .unwrap_err();

    assert_eq!(err.history.len(), 5);
    assert_eq!(
        err.error,
        Error::ObjectiveEvaluation {
            evaluation: 6,
            message: "cross-validation crashed".into(),
        }
    );
    assert_eq!(calls.get(), 6, "no retry after a failure");
    assert!(err.to_string().contains("after 5 evaluations"));
}

#[test]
fn test_failure_during_warmup_keeps_partial_history() {
    let calls = Cell::new(0);
    let err = Optimizer::builder()
        .warmup_count(5)
        .seed(4)
        .build()
        .run(&unit_interval(), |p: &Point| {
            calls.set(calls.get() + 1);
            if calls.get() > 2 { Err(Error::InvalidConfig("boom")) } else { Ok(p[0]) }
        })
        .unwrap_err();
    assert_eq!(err.into_history().len(), 2);
}

#[test]
fn test_non_finite_score_aborts() {
    let err = Optimizer::builder()
        .warmup_count(3)
        .seed(4)
        .build()
        .run(&unit_interval(), |_: &Point| Ok::<_, Error>(f64::INFINITY))
        .unwrap_err();
    assert!(matches!(err.error, Error::ObjectiveEvaluation { evaluation: 1, .. }));
    assert!(err.history.is_empty());
}

#[test]
fn test_interrupted_run_returns_history_so_far() {
    struct StopAfter(usize);

    impl Objective for StopAfter {
        type Error = Error;

        fn evaluate(&self, point: &Point) -> Result<f64> {
            Ok(point[0])
        }

        fn before_evaluation(&self, history: &History) -> ControlFlow<()> {
            if history.len() >= self.0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    let optimizer = Optimizer::builder().warmup_count(4).max_iterations(10).seed(6).build();

    let during_warmup = optimizer.run(&unit_interval(), StopAfter(2)).unwrap();
    assert_eq!(during_warmup.termination, Termination::Interrupted);
    assert_eq!(during_warmup.history.len(), 2);

    let during_iterate = optimizer.run(&unit_interval(), StopAfter(7)).unwrap();
    assert_eq!(during_iterate.termination, Termination::Interrupted);
    assert_eq!(during_iterate.history.len(), 7);
}

#[test]
fn test_empty_domain_is_rejected() {
    let domain = Domain::new(Vec::new()).unwrap();
    let err = Optimizer::new()
        .run(&domain, |_: &Point| Ok::<_, Error>(1.0))
        .unwrap_err();
    assert_eq!(err.error, Error::EmptyDomain);

    let err = RandomSearch::new(3)
        .run(&domain, |_: &Point| Ok::<_, Error>(1.0))
        .unwrap_err();
    assert_eq!(err.error, Error::EmptyDomain);
}

// =============================================================================
// Swappable components
// =============================================================================

#[test]
fn test_kernel_regression_surrogate() {
    let outcome = Optimizer::builder()
        .surrogate(KernelRegression::new())
        .warmup_count(5)
        .max_iterations(25)
        .seed(21)
        .build()
        .run(&unit_interval(), |p: &Point| Ok::<_, Error>(-(p[0] - 0.3).powi(2)))
        .unwrap();
    assert_eq!(outcome.history.len(), 30);
    let best = outcome.best_point().unwrap();
    assert!((best[0] - 0.3).abs() < 0.1, "best x = {}", best[0]);
}

#[test]
fn test_alternative_acquisitions() {
    for optimizer in [
        Optimizer::builder().acquisition(UpperConfidenceBound::default()),
        Optimizer::builder().acquisition(ProbabilityOfImprovement),
    ] {
        let outcome = optimizer
            .warmup_count(3)
            .max_iterations(5)
            .seed(13)
            .build()
            .run(&unit_interval(), |p: &Point| Ok::<_, Error>(-(p[0] - 0.5).abs()))
            .unwrap();
        assert_eq!(outcome.history.len(), 8);
    }
}

#[test]
fn test_from_config() {
    let config = RunConfig {
        warmup_count: 2,
        max_iterations: 3,
        maximize: false,
        random_seed: Some(17),
        ..RunConfig::default()
    };
    let outcome = Optimizer::from_config(config.clone())
        .run(&unit_interval(), |p: &Point| Ok::<_, Error>(p[0]))
        .unwrap();
    assert_eq!(outcome.history.len(), config.budget());
    assert_eq!(outcome.history.direction(), Direction::Minimize);
}

// =============================================================================
// Random search baseline
// =============================================================================

#[test]
fn test_random_search_is_deterministic_and_in_bounds() {
    let domain = boosting_domain();
    let a = RandomSearch::new(20).seed(3).run(&domain, boosting_score).unwrap();
    let b = RandomSearch::new(20).seed(3).run(&domain, boosting_score).unwrap();
    assert_eq!(a.history, b.history);
    assert!(a.history.iter().all(|o| domain.contains(&o.point)));
}

#[test]
fn test_random_search_abort_keeps_partial_history() {
    let calls = Cell::new(0);
    let err = RandomSearch::new(10)
        .seed(1)
        .run(&unit_interval(), |p: &Point| {
            calls.set(calls.get() + 1);
            if calls.get() == 4 { Err("oom") } else { Ok(p[0]) }
        })
        .unwrap_err();
    assert_eq!(err.history.len(), 3);
}

#[test]
fn test_huge_budget_cut_short_by_hook() {
    struct StopAfterFive;

    impl Objective for StopAfterFive {
        type Error = Error;

        fn evaluate(&self, point: &Point) -> Result<f64> {
            Ok(point[0])
        }

        fn before_evaluation(&self, history: &History) -> ControlFlow<()> {
            if history.len() >= 5 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        }
    }

    let outcome = Optimizer::builder()
        .warmup_count(3)
        .max_iterations(usize::MAX)
        .n_candidates(50)
        .seed(1)
        .build()
        .run(&unit_interval(), StopAfterFive)
        .unwrap();
    assert_eq!(outcome.termination, Termination::Interrupted);
    assert_eq!(outcome.history.len(), 5);

    let outcome = RandomSearch::new(usize::MAX)
        .seed(1)
        .run(&unit_interval(), StopAfterFive)
        .unwrap();
    assert_eq!(outcome.termination, Termination::Interrupted);
    assert_eq!(outcome.history.len(), 5);
}
