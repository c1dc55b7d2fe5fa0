//! Chroma animations: frames, playback state and the binary file codec.
//!
//! # File Format
//!
//! Little-endian, fixed-width fields, no padding and no checksum:
//!
//! ```text
//! Header (10 bytes):
//!   Version: i32 (must be 1)
//!   Device type: u8 (1 = strip, 2 = grid)
//!   Device: u8 (namespace chosen by device type)
//!   Frame count: i32
//!
//! Frames (frame_count times):
//!   Duration: f32 seconds (read back as at least 0.1)
//!   Colors: i32 packed 0x00BBGGRR
//!     strip: max_leds values
//!     grid:  max_row * max_column values, row-major
//! ```

mod edit;
mod format;
mod frame;
mod model;

pub use edit::FrameEditor;
pub use format::{
    ANIMATION_VERSION, AnimationHeader, DecodeError, decode, decode_bytes, encode, encode_to_vec,
    read_animation, write_animation,
};
pub use frame::{ColorFrame, Frame1D, Frame2D, MIN_FRAME_DURATION, clamp_duration};
pub use model::{Animation, Animation1D, Animation2D, AnyAnimation};
