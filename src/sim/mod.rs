//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, threaded explicitly through generation
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; drawing is emitted as descriptors

pub mod border;
pub mod camera;
pub mod color;
pub mod draw;
pub mod entity;
pub mod game;
pub mod heightfield;
pub mod physics;
pub mod rng;
pub mod segment;
pub mod style;
pub mod time;
pub mod transition;

pub use border::{BorderChain, BorderRun, RunKind, Side};
pub use camera::{Background, Camera, CameraTarget};
pub use color::Palette;
pub use draw::{SpriteDesc, SpriteLayer, TileLayer, TileRect};
pub use entity::{Entity, GameObject, Registry, SpawnArgs, SpawnRequest};
pub use game::{Game, TickInput};
pub use heightfield::{HeightField, camera_path, dilate, erode};
pub use physics::{ArcadeWorld, Body, BodyDesc, BodyHandle, Contact, PhysicsWorld, Shape};
pub use rng::GenRng;
pub use segment::{Block, EmitStats, EmittedSegment, Segment, Transition, choose_transition};
pub use style::{LevelStyle, StylePicker, generate_segment};
pub use time::FrameClock;
