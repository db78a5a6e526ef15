//! Invariant checks for restored game states

use anyhow::{Result, ensure};

use crate::consts::ARENA_WIDTH;
use crate::sim::GameState;

/// Relative slack allowed between a moving ball's speed and its base speed
const SPEED_TOLERANCE: f32 = 0.01;

/// Reject states the simulation could not continue from
pub fn validate_state(state: &GameState) -> Result<()> {
    state.tuning.validate()?;

    let paddle = state.paddle();
    ensure!(
        paddle.width > 0.0 && paddle.width <= ARENA_WIDTH,
        "paddle width {} out of range",
        paddle.width
    );

    for (id, ball) in state.balls().iter() {
        ensure!(
            ball.pos.is_finite() && ball.vel.is_finite(),
            "ball {id:?} has a non-finite position or velocity"
        );
        ensure!(
            ball.base_speed > 0.0 && ball.radius > 0.0,
            "ball {id:?} has a non-positive speed or radius"
        );
        if !ball.stuck_to_paddle {
            let drift = (ball.speed() - ball.base_speed).abs() / ball.base_speed;
            ensure!(
                drift <= SPEED_TOLERANCE,
                "ball {id:?} speed {} does not match base speed {}",
                ball.speed(),
                ball.base_speed
            );
        }
    }

    let mut last_id = None;
    for brick in &state.bricks {
        ensure!(
            last_id.is_none_or(|last| brick.id > last),
            "brick ids are not unique and ascending at {}",
            brick.id
        );
        ensure!(brick.hits_remaining > 0, "brick {} has no hits left", brick.id);
        last_id = Some(brick.id);
    }

    let active = state.effects().active();
    for (i, effect) in active.iter().enumerate() {
        ensure!(
            effect.remaining_secs >= 0.0,
            "effect {:?} has negative time",
            effect.kind
        );
        ensure!(
            effect.kind.is_timed(),
            "instant power-up {:?} recorded as an effect",
            effect.kind
        );
        ensure!(
            active[i + 1..].iter().all(|other| other.kind != effect.kind),
            "effect {:?} recorded twice",
            effect.kind
        );
    }

    Ok(())
}
