//! Fixed byte layout of [`Settings`] as exchanged with the driver.
//!
//! The layout mirrors the driver's in-memory structure (little-endian, natural
//! alignment, zeroed padding). There is no header and no version tag: both sides
//! must agree on the layout out of band.
//!
//! ```text
//! offset  size  field
//!      0     8  rotation_degrees        f64
//!      8     1  apply_acceleration      u8 (0/1)
//!      9     1  combine_axes            u8 (0/1)
//!     10     2  padding
//!     12     4  modes.x                 u32
//!     16     4  modes.y                 u32
//!     20     4  padding
//!     24    32  accel_params.x          4 x f64
//!     56    32  accel_params.y          4 x f64
//!     88     8  sensitivity.x           f64
//!     96     8  sensitivity.y           f64
//!    104     8  min_time_ms             f64
//! ```

use super::{AccelArgs, GainMode, Settings, Vec2};
use thiserror::Error;

/// Size in bytes of one encoded record.
pub const RECORD_SIZE: usize = 112;

const ROTATION: usize = 0;
const APPLY_ACCEL: usize = 8;
const COMBINE_AXES: usize = 9;
const MODE_X: usize = 12;
const MODE_Y: usize = 16;
const ARGS_X: usize = 24;
const ARGS_Y: usize = 56;
const ARGS_SIZE: usize = 32;
const SENS_X: usize = 88;
const SENS_Y: usize = 96;
const TIME_MIN: usize = 104;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("settings block has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("unknown gain mode tag {0}")]
    UnknownGainMode(u32),
}

pub fn encode(settings: &Settings) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];

    put_f64(&mut buf, ROTATION, settings.rotation_degrees);
    buf[APPLY_ACCEL] = settings.apply_acceleration as u8;
    buf[COMBINE_AXES] = settings.combine_axes as u8;
    put_u32(&mut buf, MODE_X, settings.modes.x.into());
    put_u32(&mut buf, MODE_Y, settings.modes.y.into());
    put_args(&mut buf, ARGS_X, &settings.accel_params.x);
    put_args(&mut buf, ARGS_Y, &settings.accel_params.y);
    put_f64(&mut buf, SENS_X, settings.sensitivity.x);
    put_f64(&mut buf, SENS_Y, settings.sensitivity.y);
    put_f64(&mut buf, TIME_MIN, settings.min_time_ms);

    buf
}

pub fn decode(block: &[u8]) -> Result<Settings, WireError> {
    let buf: &[u8; RECORD_SIZE] = block.try_into().map_err(|_| WireError::Length {
        expected: RECORD_SIZE,
        actual: block.len(),
    })?;

    Ok(Settings {
        rotation_degrees: get_f64(buf, ROTATION),
        apply_acceleration: buf[APPLY_ACCEL] != 0,
        combine_axes: buf[COMBINE_AXES] != 0,
        modes: Vec2::new(get_mode(buf, MODE_X)?, get_mode(buf, MODE_Y)?),
        accel_params: Vec2::new(get_args(buf, ARGS_X), get_args(buf, ARGS_Y)),
        sensitivity: Vec2::new(get_f64(buf, SENS_X), get_f64(buf, SENS_Y)),
        min_time_ms: get_f64(buf, TIME_MIN),
    })
}

#[inline]
fn put_f64(buf: &mut [u8; RECORD_SIZE], offset: usize, value: f64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(buf: &mut [u8; RECORD_SIZE], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_args(buf: &mut [u8; RECORD_SIZE], offset: usize, args: &AccelArgs) {
    put_f64(buf, offset, args.motivity);
    put_f64(buf, offset + 8, args.synchronous_speed);
    put_f64(buf, offset + 16, args.gamma);
    put_f64(buf, offset + 24, args.hard_cap);
}

#[inline]
fn get_f64(buf: &[u8; RECORD_SIZE], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}

fn get_mode(buf: &[u8; RECORD_SIZE], offset: usize) -> Result<GainMode, WireError> {
    let tag = u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]);
    GainMode::from_u32(tag).ok_or(WireError::UnknownGainMode(tag))
}

fn get_args(buf: &[u8; RECORD_SIZE], offset: usize) -> AccelArgs {
    debug_assert!(offset + ARGS_SIZE <= RECORD_SIZE);
    AccelArgs {
        motivity: get_f64(buf, offset),
        synchronous_speed: get_f64(buf, offset + 8),
        gamma: get_f64(buf, offset + 16),
        hard_cap: get_f64(buf, offset + 24),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_settings() -> Settings {
        Settings {
            rotation_degrees: -12.5,
            apply_acceleration: true,
            combine_axes: false,
            modes: Vec2::new(GainMode::Gudermannian, GainMode::Softplus),
            accel_params: Vec2::new(
                AccelArgs {
                    motivity: 1.75,
                    synchronous_speed: 22.0,
                    gamma: 0.8,
                    hard_cap: 0.5,
                },
                AccelArgs {
                    motivity: 3.0,
                    synchronous_speed: -1.0,
                    gamma: 2.0,
                    hard_cap: 4.0,
                },
            ),
            sensitivity: Vec2::new(0.75, 2.25),
            min_time_ms: 0.9,
        }
    }

    #[test]
    fn record_survives_encoding_byte_for_byte() {
        let settings = sample_settings();
        let block = encode(&settings);
        let decoded = decode(&block).unwrap();

        assert_eq!(decoded, settings);
        assert_eq!(encode(&decoded), block);
    }

    #[test]
    fn fields_land_at_driver_offsets() {
        let block = encode(&sample_settings());

        assert_eq!(&block[0..8], &(-12.5f64).to_le_bytes());
        assert_eq!(block[8], 1);
        assert_eq!(block[9], 0);
        assert_eq!(&block[10..12], &[0, 0]);
        assert_eq!(&block[12..16], &1u32.to_le_bytes());
        assert_eq!(&block[16..20], &4u32.to_le_bytes());
        assert_eq!(&block[20..24], &[0, 0, 0, 0]);
        assert_eq!(&block[24..32], &1.75f64.to_le_bytes());
        assert_eq!(&block[80..88], &4.0f64.to_le_bytes());
        assert_eq!(&block[96..104], &2.25f64.to_le_bytes());
        assert_eq!(&block[104..112], &0.9f64.to_le_bytes());
    }

    #[test]
    fn short_block_is_rejected() {
        let block = encode(&Settings::default());
        assert_eq!(
            decode(&block[..RECORD_SIZE - 1]),
            Err(WireError::Length {
                expected: RECORD_SIZE,
                actual: RECORD_SIZE - 1
            })
        );
    }

    #[test]
    fn unknown_mode_tag_is_rejected() {
        let mut block = encode(&Settings::default());
        block[MODE_Y..MODE_Y + 4].copy_from_slice(&9u32.to_le_bytes());
        assert_eq!(decode(&block), Err(WireError::UnknownGainMode(9)));
    }
}
