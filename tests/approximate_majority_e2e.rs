use crnsim::approximate_majority::build;
use crnsim::{
    seeded, ApproximateMajority, ApproximateMajorityConfig, EngineState, Populations,
    ReactionId, ScriptedSource, StepResult, WaitBounds,
};

const ITERATION_CAP: usize = 10_000;

fn reaction_index<S: crnsim::RandomSource>(am: &ApproximateMajority<S>, id: ReactionId) -> usize {
    am.engine()
        .network()
        .reactions()
        .iter()
        .position(|r| r.id() == id)
        .expect("reaction belongs to the network")
}

#[test]
fn mass_is_conserved_and_counts_stay_valid_every_step() {
    let mut am = build(10, 5, 0, 1.0, seeded(2024)).unwrap();
    assert_eq!(am.populations().total(), 15);

    for _ in 0..ITERATION_CAP {
        let result = am.step_exact().unwrap();
        assert_eq!(am.populations().total(), 15);
        assert_eq!(am.engine().network().total_population(), 15);
        if result.is_finished() {
            break;
        }
    }
    assert_eq!(am.engine().state(), EngineState::Terminal);
}

#[test]
fn seeded_runs_terminate_within_cap() {
    for seed in 0..100u64 {
        let mut am = build(10, 5, 0, 1.0, seeded(seed)).unwrap();
        let progress = am
            .run_until_finished(ITERATION_CAP as u64, WaitBounds::unbounded())
            .unwrap();
        assert!(progress.finished, "seed {seed} did not terminate");

        let p = am.populations();
        let survivors = [p.a, p.b, p.c].iter().filter(|&&n| n > 0).count();
        assert_eq!(survivors, 1, "seed {seed} ended in {p:?}");
    }
}

#[test]
fn terminal_state_is_idempotent() {
    let mut am = build(6, 4, 0, 1.0, seeded(17)).unwrap();
    while !am.step_exact().unwrap().is_finished() {}

    let before = am.populations();
    let steps = am.engine().steps();
    let elapsed = am.engine().elapsed();
    for _ in 0..10 {
        assert_eq!(am.step_exact().unwrap(), StepResult::Finished);
    }
    assert_eq!(am.populations(), before);
    assert_eq!(am.engine().steps(), steps);
    assert_eq!(am.engine().elapsed().to_bits(), elapsed.to_bits());
}

#[test]
fn zero_propensity_never_fires() {
    // A = 0 and C = 0: every reaction lacks a reactant.
    let source = ScriptedSource::new(vec![0.0, 0.5]).unwrap();
    let mut am = build(0, 5, 0, 1.0, source).unwrap();

    let result = am.step_exact().unwrap();
    assert_eq!(result, StepResult::Finished);
    assert_eq!(am.populations(), Populations { a: 0, b: 5, c: 0 });
    for reaction in am.engine().network().reactions() {
        assert_eq!(reaction.fired(), 0);
        assert!(reaction.last_event().is_none());
    }
}

#[test]
fn identical_seeds_replay_identically() {
    let config = ApproximateMajorityConfig {
        count_a: 30,
        count_b: 25,
        count_c: 5,
        rate_constant: 1e-3,
    };
    let mut first = ApproximateMajority::seeded(config, 77).unwrap();
    let mut second = ApproximateMajority::seeded(config, 77).unwrap();

    for _ in 0..500 {
        let r1 = first.step_exact().unwrap();
        let r2 = second.step_exact().unwrap();
        assert_eq!(r1.is_finished(), r2.is_finished());
        if let (Some(a), Some(b)) = (r1.reaction(), r2.reaction()) {
            assert_eq!(reaction_index(&first, a), reaction_index(&second, b));
        }
        assert_eq!(
            r1.wait_time().map(f64::to_bits),
            r2.wait_time().map(f64::to_bits)
        );
        assert_eq!(first.populations(), second.populations());
    }
}

#[test]
fn single_a_and_b_annihilate_into_c() {
    for seed in 0..20 {
        let mut am = build(1, 1, 0, 1.0, seeded(seed)).unwrap();
        let ab = am.reactions().ab_to_c;

        let result = am.step_exact().unwrap();
        assert_eq!(result.reaction(), Some(ab));
        assert_eq!(am.populations(), Populations { a: 0, b: 0, c: 2 });

        for _ in 0..5 {
            assert!(am.step_exact().unwrap().is_finished());
        }
    }
}

#[test]
fn degenerate_single_species_is_terminal_immediately() {
    let mut am = build(0, 5, 0, 1.0, seeded(3)).unwrap();
    assert_eq!(am.engine().total_propensity(), 0.0);
    assert!(am.step_exact().unwrap().is_finished());
    assert_eq!(am.populations(), Populations { a: 0, b: 5, c: 0 });
}

#[test]
fn last_event_reports_fire_deltas() {
    let mut am = build(1, 1, 0, 1.0, seeded(9)).unwrap();
    let species = am.species();
    let ab = am.reactions().ab_to_c;
    am.step_exact().unwrap();

    let event = am
        .engine()
        .network()
        .reaction(ab)
        .and_then(|r| r.last_event())
        .cloned()
        .unwrap();
    let net = event.net_changes();
    assert_eq!(net[&species.a], -1);
    assert_eq!(net[&species.b], -1);
    assert_eq!(net[&species.c], 2);
}

#[test]
fn bounded_steps_pace_within_bounds() {
    let bounds = WaitBounds::new(Some(0.05), Some(0.2)).unwrap();
    // The default rate (1e-5) mostly samples waits far above the upper bound.
    let mut am = ApproximateMajority::seeded(ApproximateMajorityConfig::default(), 5).unwrap();

    let mut fired = 0u32;
    while let StepResult::Fired { wait_time, .. } = am.step(bounds).unwrap() {
        assert!((0.05..=0.2).contains(&wait_time));
        fired += 1;
        assert!(fired < 10_000);
    }
    assert!(fired > 0);
}

#[test]
fn large_gap_usually_preserves_majority() {
    let mut a_wins = 0;
    for seed in 0..100 {
        let mut am = build(40, 10, 0, 1.0, seeded(seed)).unwrap();
        am.run_until_finished(100_000, WaitBounds::unbounded()).unwrap();
        if am.populations().a == 50 {
            a_wins += 1;
        }
    }
    assert!(a_wins >= 80, "A won only {a_wins} of 100 runs");
}
