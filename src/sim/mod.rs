//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only (particles use a hash spread, never the game RNG)
//! - Stable iteration order (bricks and power-ups sorted by entity ID)
//! - No rendering, audio or platform dependencies

pub mod boss;
pub mod collision;
pub mod effects;
pub mod events;
pub mod explosion;
pub mod geom;
pub mod level;
pub mod pool;
pub mod powerup;
pub mod state;
pub mod tick;
pub mod transition;
pub mod view;

pub use boss::Boss;
pub use collision::FrameOutcome;
pub use effects::{ActiveEffect, EffectLedger};
pub use events::{EventSink, GameEvent};
pub use explosion::{BlastShape, propagate};
pub use geom::Rect;
pub use level::{BrickDescriptor, CAMPAIGN_LEVELS, LevelLayout};
pub use pool::{BallId, BallPool};
pub use powerup::{PowerUp, PowerUpKind};
pub use state::{Ball, Brick, BrickKind, Bullet, GamePhase, GameState, Paddle};
pub use tick::{TickInput, tick};
pub use transition::{PortalTransition, Shockwave};
pub use view::FrameView;
