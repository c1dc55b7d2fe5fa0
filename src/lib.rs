//! Chroma FX - Lighting animation engine for RGB peripherals.
//!
//! This crate decodes the binary `.chroma` animation format, keeps a registry
//! of loaded animations and plays them on keyboards, mice, mousepads,
//! headsets, keypads and Chroma Link strips through a pluggable lighting
//! backend.
//!
//! # Architecture
//!
//! - `schema`: Devices, colors and engine configuration
//! - `animation`: Frames, the file codec, playback state and frame editing
//! - `backend`: The lighting backend capability and in-process backends
//! - `engine`: Registry, per-device play slots and the playback scheduler
//!
//! # Example
//!
//! ```rust,no_run
//! use chroma_fx::{
//!     backend::LogBackend,
//!     engine::{ChromaEngine, KeyCell},
//!     schema::EngineConfig,
//! };
//!
//! let engine = ChromaEngine::new(EngineConfig::default(), Box::new(LogBackend::new()))
//!     .expect("default config is valid");
//!
//! // Highlight WASD on the first frame, then loop it on the keyboard.
//! let path = "animations/idle_keyboard.chroma";
//! for key in [KeyCell::W, KeyCell::A, KeyCell::S, KeyCell::D] {
//!     engine.set_key_color_by_path(path, 0, key, 0x0000ff);
//! }
//! engine.play_by_path(path, true);
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! engine.shutdown();
//! ```

pub mod animation;
pub mod backend;
pub mod engine;
pub mod schema;

// Re-export commonly used types
pub use animation::{Animation, Animation1D, Animation2D, AnyAnimation};
pub use engine::{AnimationId, ChromaEngine, KeyCell};
pub use schema::{Color, Device, EngineConfig};
