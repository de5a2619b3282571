use glam::{EulerRot, Quat, Vec3};
use std::marker::PhantomData;
use chrono::{DateTime, Local};

/// Wrap an angle in degrees into [-180, 180].
///
/// Callers must pass finite values.
pub fn normalize_angle(a: f32) -> f32 {
    let mut a = a % 360.0;
    if a > 180.0 {
        a -= 360.0;
    }
    if a < -180.0 {
        a += 360.0;
    }
    a
}

/// Shortest signed difference `b - a` in degrees.
pub fn delta_angle(a: f32, b: f32) -> f32 {
    let d = (b - a).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Lerp between two angles along the shortest arc.
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    a + delta_angle(a, b) * t.clamp(0.0, 1.0)
}

/// Framerate-independent approach factor `1 - exp(-rate * dt)`.
/// A non-positive rate snaps (factor 1).
pub fn exp_smoothing(rate: f32, dt: f32) -> f32 {
    if rate > 0.0 { 1.0 - (-rate * dt).exp() } else { 1.0 }
}

/// Build a rotation from euler degrees, applied yaw (Y), then pitch (X), then roll (Z).
pub fn from_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, yaw.to_radians(), pitch.to_radians(), roll.to_radians())
}

/// Decompose a rotation into normalized `(pitch, yaw, roll)` degrees.
pub fn euler_degrees(q: Quat) -> (f32, f32, f32) {
    let (yaw, pitch, roll) = q.normalize().to_euler(EulerRot::YXZ);
    (
        normalize_angle(pitch.to_degrees()),
        normalize_angle(yaw.to_degrees()),
        normalize_angle(roll.to_degrees()),
    )
}

/// `(yaw, pitch)` in degrees that aim +Z from `from` toward `to`.
/// `None` when the points coincide.
pub fn look_angles(from: Vec3, to: Vec3) -> Option<(f32, f32)> {
    let dir = to - from;
    if dir.length_squared() <= 1e-6 {
        return None;
    }
    let yaw = dir.x.atan2(dir.z).to_degrees();
    let flat = (dir.x * dir.x + dir.z * dir.z).sqrt();
    let pitch = (-dir.y).atan2(flat).to_degrees();
    Some((normalize_angle(yaw), normalize_angle(pitch)))
}

/// Local wall-clock stamp formatted as `yyyyMMdd_HHmmss`.
pub fn timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Non-owning, generation-checked reference into a [`Slots`] arena.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena. Removing a value invalidates every outstanding handle to it.
pub struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { slots: Vec::new(), free: Vec::new() }
    }
}

impl<T> Slots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle<T> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle { index, generation: slot.generation, _marker: PhantomData };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(value) });
        Handle { index, generation: 0, _marker: PhantomData }
    }

    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handles in slot order.
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.value.is_some())
            .map(|(i, s)| Handle { index: i as u32, generation: s.generation, _marker: PhantomData })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (Handle { index: i as u32, generation: s.generation, _marker: PhantomData }, v)
            })
        })
    }
}
