//! Per-frame motion toward a destination.
//!
//! Velocities are chosen so a motion finishes in a whole number of frames
//! without overshooting. When a node moves along both axes, the axis that
//! would arrive first is slowed down so both axes arrive on the same frame.

use glam::Vec2;

/// Number of frames needed to cover `distance` at `units_per_frame`.
///
/// Always at least one: the quotient is truncated after adding one, so an
/// exact multiple still gets an extra frame of slack.
#[inline]
pub fn frames_to_arrive(distance: f32, units_per_frame: f32) -> u32 {
    ((distance / units_per_frame).abs() + 1.0) as u32
}

/// Per-frame delta that moves `location` onto `destination`.
///
/// ### Parameters
/// - `location` - Current coordinate on one axis.
/// - `destination` - Target coordinate on the same axis.
/// - `units_per_second` - Travel speed.
/// - `frames_per_second` - Simulation tick rate.
///
/// ### Returns
/// `distance / frames_to_arrive(distance, units_per_frame)`.
pub fn set_velocity(
    location: f32,
    destination: f32,
    units_per_second: f32,
    frames_per_second: f32,
) -> f32 {
    let distance = destination - location;
    let units_per_frame = units_per_second / frames_per_second;
    distance / frames_to_arrive(distance, units_per_frame) as f32
}

/// Two-axis velocity where both axes arrive on the same frame.
///
/// Frames are computed per axis and the larger count is applied to both.
///
/// ### Returns
/// The per-frame delta and the shared frame count.
pub fn synced_velocity(
    location: Vec2,
    destination: Vec2,
    units_per_second: f32,
    frames_per_second: f32,
) -> (Vec2, u32) {
    let distance = destination - location;
    let units_per_frame = units_per_second / frames_per_second;
    let frames = frames_to_arrive(distance.x, units_per_frame)
        .max(frames_to_arrive(distance.y, units_per_frame));
    (distance / frames as f32, frames)
}

/// `true` if `location` is within `threshold` of `destination`.
#[inline]
pub fn animation_finished(location: f32, destination: f32, threshold: f32) -> bool {
    (destination - location).abs() <= threshold
}

/// Rendered position of a node and the motion it is currently making.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    pub pos: Vec2,
    pub dest: Vec2,
    pub vel: Vec2,
    frames_left: u32,
}

impl Motion {
    /// A motion at rest at `pos`.
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            dest: pos,
            vel: Vec2::ZERO,
            frames_left: 0,
        }
    }

    /// Sends the node toward `dest` with a synchronized two-axis velocity.
    pub fn retarget(&mut self, dest: Vec2, units_per_second: f32, frames_per_second: f32) {
        self.dest = dest;
        let (vel, frames) = synced_velocity(self.pos, dest, units_per_second, frames_per_second);
        self.vel = vel;
        self.frames_left = frames;
    }

    /// Recomputes the velocity for a new speed, keeping the destination.
    ///
    /// Motions that are already at rest are left alone.
    pub fn rescale(&mut self, units_per_second: f32, frames_per_second: f32) {
        if self.is_moving() {
            self.retarget(self.dest, units_per_second, frames_per_second);
        }
    }

    /// Applies one frame of velocity.
    ///
    /// On the last scheduled frame the position snaps onto the destination,
    /// so accumulated float error can never keep a motion from finishing.
    pub fn advance(&mut self) {
        if self.frames_left == 0 {
            return;
        }
        self.pos += self.vel;
        self.frames_left -= 1;
        if self.frames_left == 0 {
            self.pos = self.dest;
        }
    }

    /// Zeroes each velocity component whose axis has arrived.
    ///
    /// ### Returns
    /// `true` once both axes are within `threshold` of the destination.
    pub fn settle(&mut self, threshold: f32) -> bool {
        let x_done = animation_finished(self.pos.x, self.dest.x, threshold);
        let y_done = animation_finished(self.pos.y, self.dest.y, threshold);
        if x_done {
            self.vel.x = 0.0;
        }
        if y_done {
            self.vel.y = 0.0;
        }
        if x_done && y_done {
            self.frames_left = 0;
        }
        x_done && y_done
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.vel != Vec2::ZERO
    }
}
