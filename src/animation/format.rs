//! Binary format definitions for Chroma animation files.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::frame::{Frame1D, Frame2D, clamp_duration};
use super::model::{Animation1D, Animation2D, AnyAnimation};
use crate::schema::{Color, Device, Device1D, Device2D, DeviceType};

/// Current format version.
pub const ANIMATION_VERSION: i32 = 1;

/// Upper bound on frames preallocated from an untrusted frame count.
const MAX_PREALLOCATED_FRAMES: usize = 1024;

/// Errors raised while decoding an animation.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unsupported animation version: {0}")]
    UnsupportedVersion(i32),
    #[error("Unknown device type: {0}")]
    UnknownDeviceType(u8),
    #[error("Animation data ends while reading {field}")]
    Truncated { field: &'static str },
    #[error("{0} bytes of trailing data after the last frame")]
    TrailingData(usize),
    #[error("I/O error while reading {field}: {source}")]
    Io {
        field: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Read exactly `N` bytes, mapping a short read to [`DecodeError::Truncated`].
fn read_bytes<R: Read, const N: usize>(
    r: &mut R,
    field: &'static str,
) -> Result<[u8; N], DecodeError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::Truncated { field },
        _ => DecodeError::Io { field, source: e },
    })?;
    Ok(buf)
}

fn read_i32<R: Read>(r: &mut R, field: &'static str) -> Result<i32, DecodeError> {
    read_bytes::<R, 4>(r, field).map(i32::from_le_bytes)
}

fn read_f32<R: Read>(r: &mut R, field: &'static str) -> Result<f32, DecodeError> {
    read_bytes::<R, 4>(r, field).map(f32::from_le_bytes)
}

fn read_u8<R: Read>(r: &mut R, field: &'static str) -> Result<u8, DecodeError> {
    read_bytes::<R, 1>(r, field).map(|b| b[0])
}

fn read_color<R: Read>(r: &mut R) -> Result<Color, DecodeError> {
    read_i32(r, "color").map(Color::from_packed)
}

/// File header: everything before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationHeader {
    pub device: Device,
    /// Number of frames that follow.
    pub frame_count: usize,
}

impl AnimationHeader {
    /// Size of header in bytes.
    /// Version(4) + DeviceType(1) + Device(1) + FrameCount(4) = 10
    pub const SIZE: usize = 10;

    /// Size of one encoded frame in bytes: duration plus one i32 per LED.
    pub fn frame_size(&self) -> usize {
        4 + self.device.led_count() * 4
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let frame_count = i32::try_from(self.frame_count).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Too many frames to encode: {}", self.frame_count),
            )
        })?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&[self.device.device_type().to_u8(), self.device.id()])?;
        w.write_all(&frame_count.to_le_bytes())?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
        let version = read_i32(r, "version")?;
        if version != ANIMATION_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let raw_type = read_u8(r, "device type")?;
        let device_type =
            DeviceType::from_u8(raw_type).ok_or(DecodeError::UnknownDeviceType(raw_type))?;

        let device = Device::from_raw(device_type, read_u8(r, "device")?);

        // A negative count reads as an empty animation.
        let frame_count = usize::try_from(read_i32(r, "frame count")?).unwrap_or(0);

        Ok(Self {
            device,
            frame_count,
        })
    }
}

fn read_frame_1d<R: Read>(r: &mut R, device: Device1D) -> Result<Frame1D, DecodeError> {
    let duration = clamp_duration(read_f32(r, "duration")?);
    let colors = (0..device.max_leds())
        .map(|_| read_color(r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Frame1D { duration, colors })
}

fn read_frame_2d<R: Read>(r: &mut R, device: Device2D) -> Result<Frame2D, DecodeError> {
    let duration = clamp_duration(read_f32(r, "duration")?);
    let (rows, columns) = device.size();
    let colors = (0..rows)
        .map(|_| {
            (0..columns)
                .map(|_| read_color(r))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Frame2D { duration, colors })
}

/// Decode an animation from a stream, stopping after the last frame.
///
/// Any partially decoded frames are dropped on error.
pub fn decode<R: Read>(r: &mut R) -> Result<AnyAnimation, DecodeError> {
    let header = AnimationHeader::read_from(r)?;
    let capacity = header.frame_count.min(MAX_PREALLOCATED_FRAMES);

    let animation = match header.device {
        Device::OneD(device) => {
            let mut frames = Vec::with_capacity(capacity);
            for _ in 0..header.frame_count {
                frames.push(read_frame_1d(r, device)?);
            }
            AnyAnimation::OneD(Animation1D::new(device, frames))
        }
        Device::TwoD(device) => {
            let mut frames = Vec::with_capacity(capacity);
            for _ in 0..header.frame_count {
                frames.push(read_frame_2d(r, device)?);
            }
            AnyAnimation::TwoD(Animation2D::new(device, frames))
        }
    };
    Ok(animation)
}

/// Decode a complete in-memory file. Bytes after the last frame are an error.
pub fn decode_bytes(bytes: &[u8]) -> Result<AnyAnimation, DecodeError> {
    let mut cursor = io::Cursor::new(bytes);
    let animation = decode(&mut cursor)?;
    let trailing = bytes.len() - cursor.position() as usize;
    if trailing > 0 {
        return Err(DecodeError::TrailingData(trailing));
    }
    Ok(animation)
}

/// Write `count` packed colors, padding with black or dropping extras so
/// the frame matches the device geometry.
fn write_colors<'a, W: Write>(
    w: &mut W,
    colors: impl Iterator<Item = &'a Color>,
    count: usize,
) -> io::Result<()> {
    let mut written = 0;
    for color in colors.take(count) {
        w.write_all(&color.to_packed().to_le_bytes())?;
        written += 1;
    }
    for _ in written..count {
        w.write_all(&0i32.to_le_bytes())?;
    }
    Ok(())
}

/// Encode an animation. Exact inverse of [`decode`].
pub fn encode<W: Write>(animation: &AnyAnimation, w: &mut W) -> io::Result<()> {
    let header = AnimationHeader {
        device: animation.as_dyn().device(),
        frame_count: animation.as_dyn().frame_count(),
    };
    header.write_to(w)?;

    match animation {
        AnyAnimation::OneD(anim) => {
            let leds = anim.device_1d().max_leds();
            for frame in anim.frames() {
                w.write_all(&clamp_duration(frame.duration).to_le_bytes())?;
                write_colors(w, frame.colors.iter(), leds)?;
            }
        }
        AnyAnimation::TwoD(anim) => {
            let (rows, columns) = anim.device_2d().size();
            let empty = Vec::new();
            for frame in anim.frames() {
                w.write_all(&clamp_duration(frame.duration).to_le_bytes())?;
                for row in 0..rows {
                    let cells = frame.colors.get(row).unwrap_or(&empty);
                    write_colors(w, cells.iter(), columns)?;
                }
            }
        }
    }
    Ok(())
}

/// Encode an animation into a new buffer.
pub fn encode_to_vec(animation: &AnyAnimation) -> Vec<u8> {
    let header_device = animation.as_dyn().device();
    let frames = animation.as_dyn().frame_count();
    let probe = AnimationHeader {
        device: header_device,
        frame_count: frames,
    };
    let mut bytes = Vec::with_capacity(AnimationHeader::SIZE + probe.frame_size() * frames);
    // Writing into a Vec only fails on a frame count above i32::MAX.
    if let Err(e) = encode(animation, &mut bytes) {
        log::error!("Failed to encode animation: {}", e);
        bytes.clear();
    }
    bytes
}

/// Read an animation file. The animation is named after `path`.
pub fn read_animation<P: AsRef<Path>>(path: P) -> Result<AnyAnimation, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DecodeError::Io {
        field: "file",
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    let mut animation = decode(&mut reader)?;

    let mut rest = [0u8; 1];
    let extra = reader.read(&mut rest).map_err(|e| DecodeError::Io {
        field: "end of file",
        source: e,
    })?;
    if extra > 0 {
        let remaining = reader.bytes().count();
        return Err(DecodeError::TrailingData(extra + remaining));
    }

    animation
        .as_dyn_mut()
        .set_name(path.to_string_lossy().into_owned());
    Ok(animation)
}

/// Write an animation file, replacing any existing file at `path`.
pub fn write_animation<P: AsRef<Path>>(path: P, animation: &AnyAnimation) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode(animation, &mut writer)?;
    writer.flush()
}
