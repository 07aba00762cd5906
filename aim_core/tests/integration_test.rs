use aim_core::*;
use glam::Vec2;
use rand::Rng;

const FRAME: f32 = 1000.0 / 60.0;

// Mock renderer that records what it was shown
#[derive(Default)]
struct RecordingRenderer {
    frames: usize,
    shots: Vec<HitEvent>,
    max_active: usize,
    tiers: Vec<EffectTier>,
    max_concurrent: usize,
    violations: usize,
}

impl RecordingRenderer {
    fn with_limit(max_concurrent: usize) -> Self {
        Self {
            max_concurrent,
            ..Default::default()
        }
    }
}

impl Renderer for RecordingRenderer {
    fn frame_ready(&mut self, frame: &FrameView<'_>) {
        self.frames += 1;
        self.shots.extend(frame.events.shots.iter().copied());
        let active = frame.active_targets().count();
        self.max_active = self.max_active.max(active);
        if self.max_concurrent > 0 && active > self.max_concurrent {
            self.violations += 1;
        }
        self.tiers.push(frame.tier());
    }
}

fn scenario_policy() -> SpawnPolicy {
    SpawnPolicy {
        name: "Scenario".to_string(),
        max_concurrent: 1,
        radius: RangeF32::fixed(50.0),
        lifetime_ms: RangeF32::fixed(2000.0),
        spawn_interval_ms: 500.0,
        bonus_chance: 0.0,
        duration_ms: 30_000.0,
        ..GameMode::Classic.policy()
    }
}

fn scenario_session() -> SessionLoop {
    SessionLoop::new(
        scenario_policy(),
        SessionConfig::default(),
        12345,
        ModeRecord::default(),
    )
    .unwrap()
}

/// Tick at 60 Hz until the clock reaches `until`
fn run_until(
    session: &mut SessionLoop,
    until: f32,
    input: &mut InputQueue,
    renderer: &mut RecordingRenderer,
) {
    while session.now_ms() < until && session.phase() == SessionPhase::Playing {
        session.tick(FRAME, FRAME, input, renderer).unwrap();
    }
}

#[test]
fn test_click_inside_target_at_500ms_is_a_hit() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    session.start().unwrap();

    let target = *session.targets().targets().next().unwrap();
    assert_eq!(target.spawn_time, 0.0);

    let mut input = InputQueue::new();
    input.push_trigger(target.pos + Vec2::new(10.0, 0.0), 500.0);
    run_until(&mut session, 520.0, &mut input, &mut renderer);

    assert_eq!(renderer.shots.len(), 1);
    let shot = renderer.shots[0];
    match shot.kind {
        HitKind::Hit {
            target: id,
            reaction_ms,
            distance,
            radius,
            ..
        } => {
            assert_eq!(id, target.id);
            assert_eq!(reaction_ms, 500.0, "Reaction is timestamp minus spawn time");
            assert!((distance - 10.0).abs() < 1e-3);
            assert!(distance <= radius);
        }
        HitKind::Miss => panic!("Click inside the hit-circle should hit"),
    }
    assert_eq!(session.score().streak, 1);
    assert_eq!(
        session.targets().get(target.id).map(|t| t.state()),
        Some(TargetState::Hit),
        "Target lingers in Hit during the after-effect"
    );

    run_until(&mut session, 700.0, &mut input, &mut renderer);
    assert!(
        session.targets().get(target.id).is_none(),
        "Target back to Inactive once the after-effect is done"
    );
}

#[test]
fn test_no_input_target_expires_without_penalty() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();
    let target = *session.targets().targets().next().unwrap();

    run_until(&mut session, 1990.0, &mut input, &mut renderer);
    assert!(session.targets().get(target.id).unwrap().is_active());

    run_until(&mut session, 2020.0, &mut input, &mut renderer);
    assert_eq!(
        session.targets().get(target.id).map(|t| t.state()),
        Some(TargetState::Expired)
    );
    assert_eq!(session.score().streak, 0);
    assert_eq!(session.score().score, 0, "Expiry costs nothing");
    assert_eq!(session.score().misses, 0, "Expiry is not a miss");
    assert_eq!(session.analytics().expired, 1);
}

#[test]
fn test_expiry_leaves_streak_alone() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();

    let first = *session.targets().targets().next().unwrap();
    input.push_trigger(first.pos, 300.0);
    run_until(&mut session, 600.0, &mut input, &mut renderer);
    assert_eq!(session.score().streak, 1);

    // The follow-up target spawned at ~500 ms; let it run out
    run_until(&mut session, 2700.0, &mut input, &mut renderer);
    assert!(session.analytics().expired >= 1);
    assert_eq!(session.score().streak, 1, "Expiry is neutral for the streak");
}

#[test]
fn test_miss_resets_streak() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();

    let first = *session.targets().targets().next().unwrap();
    input.push_trigger(first.pos, 100.0);
    run_until(&mut session, 200.0, &mut input, &mut renderer);
    assert_eq!(session.score().streak, 1);

    // Opposite corner from an empty board
    let far = Vec2::new(1.0, 1.0);
    input.push_trigger(far, 250.0);
    run_until(&mut session, 300.0, &mut input, &mut renderer);
    assert_eq!(session.score().streak, 0);
    assert_eq!(session.score().best_streak, 1);
}

#[test]
fn test_smaller_overlapping_target_takes_the_hit() {
    let policy = SpawnPolicy {
        max_concurrent: 2,
        ..scenario_policy()
    };
    let mut machine = TargetStateMachine::new(policy, &SessionConfig::default()).unwrap();
    let mut events = TickEvents::new();

    let large = machine.spawn_at(Vec2::new(500.0, 300.0), 80.0, 0.0).unwrap();
    let small = machine.spawn_at(Vec2::new(530.0, 300.0), 40.0, 0.0).unwrap();
    let shot = machine.resolve_shot(Vec2::new(520.0, 300.0), 200.0, &mut events);

    assert!(matches!(shot.kind, HitKind::Hit { target, .. } if target == small));
    assert!(machine.get(large).unwrap().is_active(), "Large target untouched");
}

#[test]
fn test_out_of_order_input_is_resolved_by_timestamp() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();

    let target = *session.targets().targets().next().unwrap();
    // Whiff arrives first in the queue but happened later
    input.push_trigger(Vec2::new(1.0, 1.0), 90.0);
    input.push_trigger(target.pos, 80.0);
    run_until(&mut session, 100.0, &mut input, &mut renderer);

    assert_eq!(renderer.shots.len(), 2);
    assert!(renderer.shots[0].is_hit(), "Earlier timestamp resolves first");
    assert!(!renderer.shots[1].is_hit());
    assert_eq!(session.score().best_streak, 1);
}

/// Bot input for one tick: some aimed shots, some wild ones
fn scripted_input(session: &SessionLoop, rng: &mut GameRng, input: &mut InputQueue) {
    let now = session.now_ms();
    let aimed: Vec<Vec2> = session
        .frame_view()
        .active_targets()
        .map(|t| t.pos)
        .collect();

    if rng.chance(0.3) {
        let timestamp = now + rng.range(RangeF32::new(0.0, FRAME));
        let point = if !aimed.is_empty() && rng.chance(0.7) {
            aimed[rng.0.gen_range(0..aimed.len())] + rng.unit_direction() * 5.0
        } else {
            rng.point_in(&PlayArea::default().bounds())
        };
        input.push_trigger(point, timestamp);
    }
}

#[test]
fn test_every_mode_respects_limits_for_a_full_session() {
    for mode in GameMode::ALL {
        let policy = mode.policy();
        let mut session = SessionLoop::for_mode(mode, 12345).unwrap();
        let mut renderer = RecordingRenderer::with_limit(policy.max_concurrent);
        let mut input = InputQueue::new();
        let mut bot_rng = GameRng::new(777);
        session.start().unwrap();

        loop {
            scripted_input(&session, &mut bot_rng, &mut input);
            let status = session
                .tick(FRAME, FRAME, &mut input, &mut renderer)
                .unwrap_or_else(|err| panic!("{mode} failed mid-session: {err}"));
            if status == TickStatus::Finished {
                break;
            }
        }

        assert_eq!(renderer.violations, 0, "{mode} exceeded max concurrent targets");
        assert!(renderer.max_active >= 1, "{mode} never spawned");
        assert_eq!(renderer.frames as u64, session.tick_count());
        for shot in &renderer.shots {
            if let HitKind::Hit {
                reaction_ms,
                distance,
                radius,
                ..
            } = shot.kind
            {
                assert!(reaction_ms >= 0.0, "{mode}: negative reaction time");
                assert!(distance <= radius + 1e-3, "{mode}: hit outside target");
            }
        }

        let outcome = session.finalize().unwrap();
        let analytics = &outcome.analytics;
        assert_eq!(analytics.shots() as usize, renderer.shots.len());
        if analytics.shots() > 0 {
            assert_eq!(
                analytics.accuracy,
                analytics.hits as f32 / (analytics.hits + analytics.misses) as f32
            );
        }
        assert_eq!(outcome.elapsed_ms, policy.duration_ms);
        assert_eq!(outcome.analytics.mode_record.games_played, 1);
        assert!(outcome.score.grade.is_some());
    }
}

#[test]
fn test_same_seed_same_session() {
    let run = || {
        let mut session = SessionLoop::for_mode(GameMode::Chaos, 99).unwrap();
        let mut renderer = RecordingRenderer::default();
        let mut input = InputQueue::new();
        let mut bot_rng = GameRng::new(5);
        session.start().unwrap();
        while session.phase() == SessionPhase::Playing {
            scripted_input(&session, &mut bot_rng, &mut input);
            session.tick(FRAME, FRAME, &mut input, &mut renderer).unwrap();
        }
        session.finalize().unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.score, second.score, "Deterministic given a seed");
    assert_eq!(first.analytics.hit_grid, second.analytics.hit_grid);
}

#[test]
fn test_sustained_load_lowers_effect_tier() {
    let mut session = SessionLoop::for_mode(GameMode::SpeedBlitz, 12345).unwrap();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();

    // Frames take 30 ms of wall time while the game advances at 60 Hz
    for _ in 0..600 {
        session.tick(FRAME, 30.0, &mut input, &mut renderer).unwrap();
    }

    assert!(session.quality().tier < EffectTier::Ultra);
    let changes = renderer
        .tiers
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count();
    assert!(changes >= 1);
    assert!(
        renderer.tiers.windows(2).all(|pair| pair[1] <= pair[0]),
        "Load never promotes"
    );
}

#[test]
fn test_abort_then_restart_runs_a_clean_session() {
    let mut session = scenario_session();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();
    run_until(&mut session, 1000.0, &mut input, &mut renderer);

    session.abort().unwrap();
    assert_eq!(session.phase(), SessionPhase::Aborted);
    assert_eq!(session.targets().pool().in_use_count(), 0);

    let (analytics, score) = session.finalize().unwrap().into_parts();
    assert_eq!(analytics.shots(), 0);
    assert_eq!(score.grade, Some(Grade::F));

    session.restart().unwrap();
    session.start().unwrap();
    assert_eq!(session.now_ms(), 0.0);
    assert_eq!(session.active_count(), 1);
}

#[test]
fn test_finished_session_outcome() {
    let policy = SpawnPolicy {
        duration_ms: 2000.0,
        ..scenario_policy()
    };
    let mut session = SessionLoop::new(
        policy,
        SessionConfig::default(),
        12345,
        ModeRecord::default(),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::default();
    let mut input = InputQueue::new();
    session.start().unwrap();

    let target = *session.targets().targets().next().unwrap();
    input.push_trigger(target.pos, 150.0);
    run_until(&mut session, 5000.0, &mut input, &mut renderer);

    assert_eq!(session.phase(), SessionPhase::Finished);
    let outcome = session.finalize().unwrap();
    assert!(!outcome.aborted);
    assert_eq!(outcome.analytics.hits, 1);
    assert_eq!(outcome.score.score, 100, "Fast dead-center hit is full points");
    assert_eq!(outcome.score.grade, Some(Grade::SPlus));
    assert!((outcome.hits_per_second - 0.5).abs() < 1e-4);
}
