//! Simulation Tick
//!
//! One frame of the game, in a fixed order:
//!
//! 1. Pause edge, then the phase gate
//! 2. Player input, timers and physics
//! 3. Enemy AI and its side effects
//! 4. Projectiles, storms and particles
//! 5. Collision resolution
//! 6. World lifecycle (growth, biomes, guardians, hazards, cleanup)
//! 7. Camera
//! 8. Lifetime progress and achievement unlocks
//! 9. End-of-run checks

use crate::game::collision;
use crate::game::enemy::AiEffects;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::InputFrame;
use crate::game::physics::{self, Environment};
use crate::game::player::DamageSource;
use crate::game::progress::Metric;
use crate::game::state::{GamePhase, GameState};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// The player died this tick
    pub game_over: bool,
    /// The flower target was reached this tick
    pub level_complete: bool,
}

/// Run one simulation frame.
///
/// `input` is the polled key snapshot; press edges are derived from the
/// state's tracker. `dt_ms` is the frame delta, already clamped by the driver.
pub fn tick(state: &mut GameState, input: InputFrame, dt_ms: f32) -> TickResult {
    let mut result = TickResult::default();
    let pressed = state.input.press(input);

    if pressed.pause() {
        if let Some(paused) = state.toggle_pause() {
            state.push_event(GameEventData::PauseToggled { paused });
        }
    }

    if state.phase != GamePhase::Playing {
        result.events = state.take_events();
        return result;
    }

    // 0. Advance clocks
    state.frame += 1;
    state.elapsed_ms += dt_ms as f64;

    // 1. Player
    update_player(state, input, pressed, dt_ms);

    // 2. Enemies
    let strikes = update_enemies(state, dt_ms);

    // 3. Moving things
    update_projectiles(state, dt_ms);
    update_storms(state, dt_ms);
    for particle in state.world.particles.iter_mut() {
        particle.update(dt_ms);
    }

    // 4. Collisions
    collision::resolve(state, &strikes, dt_ms);

    // 5. World lifecycle
    let gained = update_world(state, dt_ms);

    // 6. Camera
    let target = state.player.center().x;
    state.camera.follow(target, state.config.viewport.width, state.world.width());

    // 7. Progress
    update_progress(state, gained);

    // 8. End of run
    check_end(state, &mut result);

    result.events = state.take_events();
    result
}

fn environment(state: &GameState) -> Environment {
    Environment {
        gravity: state.config.physics.gravity,
        ground_y: state.config.ground_y(),
        world_width: state.world.width(),
    }
}

fn update_player(state: &mut GameState, held: InputFrame, pressed: InputFrame, dt: f32) {
    let actions = state.player.apply_input(held, pressed, state.elapsed_ms);

    match actions.plant {
        Some(true) => {
            state.progress.increment(Metric::PlantsUsed, 1.0);
            state.push_event(GameEventData::PlantToggled { planted: true });
        }
        Some(false) => state.push_event(GameEventData::PlantToggled { planted: false }),
        None => {}
    }
    if actions.jumped {
        state.progress.increment(Metric::Jumps, 1.0);
        state.push_event(GameEventData::Jumped);
    }
    if !actions.thrown.is_empty() {
        let count = actions.thrown.len() as u8;
        state.world.thorns.extend(actions.thrown);
        state.push_event(GameEventData::ThornThrown {
            count,
            remaining: state.player.thorns(),
        });
    }

    let timers = state.player.advance_timers(dt);
    if timers.plant_released {
        state.push_event(GameEventData::PlantToggled { planted: false });
    }
    for kind in timers.expired {
        state.push_event(GameEventData::PowerUpExpired { kind });
    }

    let env = environment(state);
    physics::step(&mut state.player.body, &env);
    let boundary = state.world.forward_boundary(state.config.screen_width());
    state.player.clamp_forward(boundary);
}

/// Run every enemy's AI and apply what it asked for. Returns the direct
/// strikes for the collision pass.
fn update_enemies(state: &mut GameState, dt: f32) -> Vec<DamageSource> {
    let view = state.world_view();
    let mut fx = AiEffects::default();

    for enemy in state.world.enemies.iter_mut() {
        enemy.update(&view, dt, &mut state.rng, &mut fx);
    }

    state.world.enemy_projectiles.append(&mut fx.projectiles);
    if fx.player_push != 0.0 {
        state.player.push(fx.player_push);
    }
    for burst in &fx.bursts {
        state.world.spawn_burst(burst, &mut state.rng);
    }
    for data in fx.events.drain(..) {
        state.push_event(data);
    }
    fx.strikes
}

fn update_projectiles(state: &mut GameState, dt: f32) {
    let width = state.world.width();
    let ground = state.config.ground_y();
    for thorn in state.world.thorns.iter_mut() {
        thorn.update(dt, width, ground);
    }
    for shot in state.world.enemy_projectiles.iter_mut() {
        shot.update(dt, width, ground);
    }
}

fn update_storms(state: &mut GameState, dt: f32) {
    let player = state.player.aabb();
    let screen = state.config.screen_width();
    let mut weathered = 0;
    for storm in state.world.storms.iter_mut() {
        if storm.update(dt, &player, screen) {
            weathered += 1;
        }
    }
    for _ in 0..weathered {
        state.progress.increment(Metric::StormsWeathered, 1.0);
        state.push_event(GameEventData::StormWeathered);
    }
}

fn update_world(state: &mut GameState, dt: f32) -> f32 {
    let player_x = state.player.body.pos.x;
    let update = state.world.advance(player_x, dt, &state.config, &mut state.rng);

    if let Some((width, difficulty)) = update.extended {
        state.push_event(GameEventData::WorldExtended { width, difficulty });
    }
    if let Some(biome) = update.entered {
        state.progress.biome_entered(biome);
        state.push_event(GameEventData::BiomeEntered { biome });
    }
    if let Some(species) = update.boss_spawned {
        let biome = state.world.biome.current();
        state.push_event(GameEventData::BossAppeared { species, biome });
    }
    if update.storm_spawned {
        state.push_event(GameEventData::StormWarning);
    }
    update.progress_gained
}

fn update_progress(state: &mut GameState, gained: f32) {
    if gained > 0.0 {
        let gained = gained as f64;
        state.progress.increment(Metric::Distance, gained);
        state.progress.increment(Metric::NoDamageDistance, gained);
    }
    state.progress.set(Metric::Score, state.score as f64);
    state.progress.set(Metric::MaxSize, state.player.size() as f64);

    for achievement in state.progress.take_unlocked() {
        state.push_event(GameEventData::AchievementUnlocked {
            id: achievement.id.to_string(),
            name: achievement.name.to_string(),
        });
    }
}

fn check_end(state: &mut GameState, result: &mut TickResult) {
    if state.player.health() == 0 {
        state.phase = GamePhase::GameOver;
        result.game_over = true;
        state.push_event(GameEventData::GameOver {
            score: state.score,
            distance: state.world.max_progress_x(),
        });
    } else if state.flower_count >= state.config.goal.target_flowers {
        state.phase = GamePhase::LevelComplete;
        result.level_complete = true;
        state.push_event(GameEventData::LevelComplete {
            score: state.score,
            flower_count: state.flower_count,
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;
    use crate::game::enemy::{Behavior, Enemy, PatrolState, Species};
    use crate::game::entities::{Flower, FlowerKind};
    use crate::game::powerup::{self, PowerUpKind, SPEED_MULTIPLIER};

    const DT: f32 = 16.0;

    fn playing(config: GameConfig) -> GameState {
        let mut state = GameState::new(config);
        state.start();
        state.world.enemies.clear();
        state.world.flowers.clear();
        state.world.bricks.clear();
        state.world.shelters.clear();
        state.world.power_ups.clear();
        state
    }

    fn idle() -> InputFrame {
        InputFrame::new()
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEventData) -> bool) -> usize {
        events.iter().filter(|e| pred(&e.data)).count()
    }

    #[test]
    fn test_menu_does_not_simulate() {
        let mut state = GameState::new(GameConfig::default());
        let result = tick(&mut state, idle(), DT);
        assert!(result.events.is_empty());
        assert_eq!(state.frame, 0);
    }

    #[test]
    fn test_game_over_fires_exactly_once() {
        let mut config = GameConfig::default();
        config.player.start_x = 0.0;
        let mut state = playing(config);
        assert_eq!(state.player.health(), 3);
        assert_eq!(state.player.thorns(), 5);

        for _ in 0..3 {
            assert!(state.player.take_damage(DamageSource::Contact));
            state.player.advance_timers(2000.0);
        }
        assert_eq!(state.player.health(), 0);

        let first = tick(&mut state, idle(), DT);
        assert!(first.game_over);
        assert_eq!(count(&first.events, |d| matches!(d, GameEventData::GameOver { .. })), 1);
        assert_eq!(state.phase, GamePhase::GameOver);

        for _ in 0..5 {
            let later = tick(&mut state, idle(), DT);
            assert!(!later.game_over);
            assert_eq!(count(&later.events, |d| matches!(d, GameEventData::GameOver { .. })), 0);
        }
    }

    #[test]
    fn test_level_complete_at_flower_target() {
        let mut state = playing(GameConfig::default());
        for i in 0..99 {
            state.world.flowers.push(Flower::new(3000.0 + i as f32 * 30.0, 100.0, FlowerKind::Normal));
        }
        state.world.flowers.push(Flower::new(9000.0, 100.0, FlowerKind::Super));

        for i in 0..99 {
            assert!(collision::collect_flower(&mut state, i));
        }
        let result = tick(&mut state, idle(), DT);
        assert!(!result.level_complete);

        // Cleanup compacted the list; the super flower is the first one left
        let index = state
            .world
            .flowers
            .iter()
            .position(|f| f.kind == FlowerKind::Super && !f.collected)
            .expect("super flower");
        assert!(collision::collect_flower(&mut state, index));
        assert_eq!(state.flower_count, 100);
        let result = tick(&mut state, idle(), DT);
        assert!(result.level_complete);
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert_eq!(count(&result.events, |d| matches!(d, GameEventData::LevelComplete { .. })), 1);
    }

    #[test]
    fn test_patroller_chases_then_gives_up() {
        let mut state = playing(GameConfig::default());
        state.world.enemies.push(Enemy::spawn(Species::Camel, 500.0, 520.0, 1.0));

        let patrol_state = |state: &GameState| match &state.world.enemies[0].behavior {
            Behavior::Patroller(ai) => ai.state,
            other => panic!("unexpected behavior {:?}", other.label()),
        };

        tick(&mut state, idle(), DT);
        assert_eq!(patrol_state(&state), PatrolState::Patrol);

        state.player.body.pos.x = 400.0;
        tick(&mut state, idle(), DT);
        assert_eq!(patrol_state(&state), PatrolState::Chase);

        // Inside the hysteresis band the chase holds
        let camel_center = state.world.enemies[0].aabb().center().x;
        state.player.body.pos.x = camel_center - 20.0 - 250.0;
        tick(&mut state, idle(), DT);
        assert_eq!(patrol_state(&state), PatrolState::Chase);

        state.player.body.pos.x = 0.0;
        tick(&mut state, idle(), DT);
        assert_eq!(patrol_state(&state), PatrolState::Patrol);
    }

    #[test]
    fn test_speed_buff_never_compounds() {
        let mut state = playing(GameConfig::default());
        let base = state.player.speed();

        powerup::apply(&mut state.player, PowerUpKind::Speed);
        for _ in 0..10 {
            tick(&mut state, idle(), DT);
        }
        powerup::apply(&mut state.player, PowerUpKind::Speed);
        assert_eq!(state.player.speed(), base * SPEED_MULTIPLIER);
    }

    #[test]
    fn test_pause_freezes_and_resumes() {
        let mut state = playing(GameConfig::default());
        let pause = InputFrame::with_flags(InputFrame::FLAG_PAUSE);

        let result = tick(&mut state, pause, DT);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(count(&result.events, |d| matches!(d, GameEventData::PauseToggled { paused: true })), 1);
        let frame = state.frame;

        // Held key does not re-toggle
        tick(&mut state, pause, DT);
        tick(&mut state, idle(), DT);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.frame, frame);

        tick(&mut state, pause, DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.frame, frame + 1);
    }

    #[test]
    fn test_walking_right_extends_world_and_tracks_distance() {
        let mut state = playing(GameConfig::default());
        let right = InputFrame::with_flags(InputFrame::FLAG_RIGHT);

        for _ in 0..60 {
            tick(&mut state, right, DT);
        }
        assert!(state.player.body.pos.x > 350.0);
        assert!(state.world.width() >= 4000.0);
        assert!(state.progress.value(Metric::Distance) > 250.0);
        assert!(state.camera.x >= 0.0);
    }

    #[test]
    fn test_jump_counts_and_thorn_throw_spends_ammo() {
        let mut state = playing(GameConfig::default());
        let jump_and_throw = InputFrame::with_flags(InputFrame::FLAG_JUMP | InputFrame::FLAG_THORN);

        let result = tick(&mut state, jump_and_throw, DT);
        assert_eq!(count(&result.events, |d| matches!(d, GameEventData::Jumped)), 1);
        assert_eq!(count(&result.events, |d| matches!(d, GameEventData::ThornThrown { count: 1, remaining: 4 })), 1);
        assert_eq!(state.progress.value(Metric::Jumps), 1.0);
        assert_eq!(state.world.thorns.len(), 1);
    }

    #[test]
    fn test_player_cannot_backtrack_past_boundary() {
        let mut state = playing(GameConfig::default());
        state.world.track_progress(2000.0, &state.config);
        state.player.body.pos.x = 1000.0;

        tick(&mut state, InputFrame::with_flags(InputFrame::FLAG_LEFT), DT);
        assert!(state.player.body.pos.x >= 1200.0);
    }
}
