//! End-to-end clustering scenarios over small synthetic frame sequences,
//! driven entirely through the public `frameclust` API.

use frameclust::config::MaxClustStrategy;
use frameclust::engine::StepOutcome;
use frameclust::frame::{Frame, FrameId, VecFrameSource};
use frameclust::{Assignment, ClusterId, ClusteringEngine, EngineConfig};

fn line(values: &[f64]) -> Vec<Frame> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Frame::vector(FrameId(i as u64), vec![v]))
        .collect()
}

fn cfg(rlim: f64) -> EngineConfig {
    let mut c = EngineConfig::default();
    c.rlim = Some(rlim);
    c
}

fn run_assignments(engine: &mut ClusteringEngine, frames: Vec<Frame>) -> Vec<usize> {
    let mut out = Vec::new();
    for frame in frames {
        match engine.process_frame(frame).unwrap() {
            StepOutcome::Assigned(id) => out.push(id.0),
            StepOutcome::Stopped => panic!("unexpected stop"),
        }
    }
    out
}

/// Five points on a line, R = 3: the first three frames collapse onto one
/// cluster, then each subsequent frame is too far from every live anchor
/// and starts its own.
#[test]
fn scenario_five_frame_line_collapses_into_three_clusters() {
    let mut engine = ClusteringEngine::new(cfg(3.0), 3.0).unwrap();
    let assignments = run_assignments(&mut engine, line(&[0.0, 1.0, 2.0, 4.0, 7.0]));
    assert_eq!(assignments, vec![0, 0, 0, 1, 2]);
    assert_eq!(engine.store().len(), 3);

    // The distance cache records exactly the anchor-to-anchor pairs
    // between the three clusters, matching what the creation order fills
    // in: (0,1)=4, (0,2)=7, (1,2)=3.
    let dcc = engine.distance_cache();
    assert_eq!(dcc.peek(ClusterId(0), ClusterId(1)), Some(4.0));
    assert_eq!(dcc.peek(ClusterId(0), ClusterId(2)), Some(7.0));
    assert_eq!(dcc.peek(ClusterId(1), ClusterId(2)), Some(3.0));
}

/// A hundred identical frames: one cluster absorbs all of them, and the
/// transition matrix accumulates a single self-loop count.
#[test]
fn scenario_identical_frames_form_a_single_self_looping_cluster() {
    let mut engine = ClusteringEngine::new(cfg(0.1), 0.1).unwrap();
    let frames: Vec<Frame> = (0..100u64)
        .map(|i| Frame::vector(FrameId(i), vec![0.0]))
        .collect();
    run_assignments(&mut engine, frames);
    assert_eq!(engine.store().len(), 1);
    assert_eq!(engine.transitions().get(ClusterId(0), ClusterId(0)), 99);
}

/// R = 0 can never be satisfied by a strictly-less-than attach check, so
/// every frame anchors its own cluster regardless of how close its
/// neighbors are.
#[test]
fn scenario_zero_radius_forces_one_cluster_per_frame() {
    let mut engine = ClusteringEngine::new(cfg(0.0), 0.0).unwrap();
    let assignments = run_assignments(&mut engine, line(&[0.0, 0.0, 0.0, 0.0]));
    assert_eq!(assignments, vec![0, 1, 2, 3]);
}

/// A simple geometric progression of frames, exercising the general
/// attach/prune/create invariants from first principles rather than a
/// hand-transcribed expected-assignment list (see the note in DESIGN.md
/// on why this scenario does not hardcode one).
#[test]
fn scenario_linear_sequence_respects_the_boundary_and_pruning_invariants() {
    let mut engine = ClusteringEngine::new(cfg(1.0), 1.0).unwrap();
    let frames = line(&(0..20).map(|k| k as f64 * 0.5).collect::<Vec<_>>());
    run_assignments(&mut engine, frames);

    for record in engine.records().iter() {
        if let Assignment::Cluster(id) = record.assignment {
            let d = record.probe_distance(id).expect("committed cluster has a probe");
            // A frame is only ever attached (as opposed to anchoring a
            // new cluster) when its measured distance is strictly under
            // the radius; a new cluster's own probe is always zero.
            assert!(d < 1.0 || d == 0.0, "distance {d} should be < R or the 0.0 self-probe");
        }
    }
    // Monotone non-decreasing cluster ids: a cluster is never created
    // "in the past" relative to an earlier one.
    let ids: Vec<usize> = engine
        .records()
        .iter()
        .filter_map(|r| match r.assignment {
            Assignment::Cluster(id) => Some(id.0),
            _ => None,
        })
        .collect();
    let max_seen = ids.iter().fold(0usize, |acc, &id| {
        assert!(id <= acc + 1, "cluster id {id} skips ahead of {acc}");
        acc.max(id)
    });
    assert!(max_seen > 0, "a 20-frame, widely spread sequence should need more than one cluster");
}

/// `te4`/`te5` pruning must never change which cluster a frame attaches
/// to; they only change how many of `framedist`'s calls are avoided along
/// the way, and `te5`'s wider reference triple can only prune at least as
/// much as `te4` for the same run.
#[test]
fn scenario_four_and_five_point_pruning_do_not_change_assignments() {
    let values: Vec<f64> = (0..30).map(|k| (k as f64 * 0.7).sin() * 5.0).collect();

    let mut baseline = ClusteringEngine::new(cfg(1.5), 1.5).unwrap();
    let baseline_assignments = run_assignments(&mut baseline, line(&values));

    let mut with_te4_cfg = cfg(1.5);
    with_te4_cfg.te4 = true;
    let mut with_te4 = ClusteringEngine::new(with_te4_cfg, 1.5).unwrap();
    let te4_assignments = run_assignments(&mut with_te4, line(&values));

    let mut with_te5_cfg = cfg(1.5);
    with_te5_cfg.te5 = true;
    let mut with_te5 = ClusteringEngine::new(with_te5_cfg, 1.5).unwrap();
    let te5_assignments = run_assignments(&mut with_te5, line(&values));

    assert_eq!(baseline_assignments, te4_assignments);
    assert_eq!(baseline_assignments, te5_assignments);

    // Monotonically non-increasing across the three runs.
    assert!(with_te4.stats().framedist_calls <= baseline.stats().framedist_calls);
    assert!(with_te5.stats().framedist_calls <= with_te4.stats().framedist_calls);
}

/// Filling `maxcl` then forcing an overflow under `merge`: no new cluster
/// is created, the closest live pair folds into one, and the forcing frame
/// is assigned directly to the survivor.
#[test]
fn scenario_overflow_merge_folds_the_closest_pair_and_keeps_capacity() {
    let mut config = cfg(1.0);
    config.maxcl = 3;
    config.maxcl_strategy = MaxClustStrategy::Merge;
    let mut engine = ClusteringEngine::new(config, 1.0).unwrap();

    // Three well-separated anchors fill capacity...
    run_assignments(&mut engine, line(&[0.0, 20.0, 40.0]));
    assert_eq!(engine.store().len(), 3);

    // ...then a fourth, far-away frame forces an overflow. `merge` never
    // grows the store past `maxcl`.
    let outcome = engine
        .process_frame(Frame::vector(FrameId(3), vec![1000.0]))
        .unwrap();
    assert_eq!(engine.store().len(), 3);
    match outcome {
        StepOutcome::Assigned(_) => {}
        StepOutcome::Stopped => panic!("merge should never stop the run"),
    }
    // Exactly one cluster among the original three is now retired.
    let retired_count = engine.store().iter().filter(|c| c.retired).count();
    assert_eq!(retired_count, 1);
}

/// `stop` leaves the forcing frame unassigned and ends the run, rather
/// than silently dropping or rerouting it.
#[test]
fn scenario_overflow_stop_halts_the_run_and_leaves_the_frame_unassigned() {
    let mut config = cfg(1.0);
    config.maxcl = 2;
    config.maxcl_strategy = MaxClustStrategy::Stop;
    let mut engine = ClusteringEngine::new(config, 1.0).unwrap();

    let mut source = VecFrameSource::new(line(&[0.0, 20.0, 40.0]));
    let summary = engine.run(&mut source).unwrap();

    assert!(summary.stopped_by_overflow);
    assert_eq!(engine.store().len(), 2);
    assert_eq!(summary.frames_processed, 2);
    let last = engine.records().last().unwrap();
    assert_eq!(last.assignment, Assignment::Unassigned);
}
