//! # Maestro Command Encoder
//!
//! Encodes channel targets into Maestro compact-protocol commands.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;
use crate::error::{Result, RigError};

/// Encode a single-target command
///
/// # Arguments
///
/// * `channel` - Maestro channel number
/// * `target` - Pulse width in quarter-microseconds (clamped to 14 bits)
///
/// # Returns
///
/// * `Bytes` - 4-byte command: opcode + channel + low + high
///
/// # Examples
///
/// ```
/// use telepresence_rig::maestro::encoder::encode_set_target;
///
/// let command = encode_set_target(2, 6000);
/// assert_eq!(&command[..], &[0x84, 0x02, 0x70, 0x2E]);
/// ```
pub fn encode_set_target(channel: u8, target: u16) -> Bytes {
    let mut command = BytesMut::with_capacity(4);
    command.put_u8(MAESTRO_CMD_SET_TARGET);
    command.put_u8(channel);
    put_target(&mut command, target);
    command.freeze()
}

/// Encode a multi-target command addressing consecutive channels
///
/// # Arguments
///
/// * `first_channel` - Channel receiving `targets[0]`
/// * `targets` - Pulse widths for `first_channel..first_channel + targets.len()`
///
/// # Returns
///
/// * `Result<Bytes>` - Command bytes: opcode + count + first channel + (low, high) per target
///
/// # Errors
///
/// Returns `Protocol` error if `targets` is empty or the addressed channels
/// run past the last Maestro channel.
///
/// # Examples
///
/// ```
/// use telepresence_rig::maestro::encoder::encode_set_multiple_targets;
///
/// let command = encode_set_multiple_targets(0, &[100, 200, 300])?;
/// assert_eq!(&command[..], &[0x9F, 0x03, 0x00, 0x64, 0x00, 0x48, 0x01, 0x2C, 0x02]);
/// # Ok::<(), telepresence_rig::error::RigError>(())
/// ```
pub fn encode_set_multiple_targets(first_channel: u8, targets: &[u16]) -> Result<Bytes> {
    if targets.is_empty() {
        return Err(RigError::Protocol(
            "Set Multiple Targets needs at least one target".to_string(),
        ));
    }

    let last_channel = usize::from(first_channel) + targets.len();
    if last_channel > MAESTRO_MAX_CHANNELS {
        return Err(RigError::Protocol(format!(
            "Channels {}..{} exceed the {} available channels",
            first_channel, last_channel, MAESTRO_MAX_CHANNELS
        )));
    }

    let mut command = BytesMut::with_capacity(3 + targets.len() * 2);
    command.put_u8(MAESTRO_CMD_SET_MULTIPLE_TARGETS);
    command.put_u8(targets.len() as u8);
    command.put_u8(first_channel);
    for &target in targets {
        put_target(&mut command, target);
    }

    Ok(command.freeze())
}

/// Clamp a target to the 14 bits the protocol can carry
pub fn clamp_target(target: u16) -> u16 {
    target.min(MAESTRO_TARGET_MAX)
}

/// Split a target into its low and high 7-bit halves
#[inline]
fn put_target(command: &mut BytesMut, target: u16) {
    let target = clamp_target(target);
    command.put_u8((target & 0x7F) as u8);
    command.put_u8(((target >> 7) & 0x7F) as u8);
}
