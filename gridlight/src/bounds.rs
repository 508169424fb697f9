use std::any::TypeId;
use std::ops::{Add, AddAssign};

use fxhash::FxHashMap;
use glam::Vec3;

use crate::gpu;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn extent(&self) -> Vec3 {
        self.max() - self.min()
    }

    /// Returns whether this box contains anything, i.e. whether it's not
    /// inverted.
    pub fn is_set(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(Vec3::MAX, Vec3::MIN)
    }
}

impl Add<Vec3> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Vec3) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Vec3> for BoundingBox {
    fn add_assign(&mut self, rhs: Vec3) {
        self.min = self.min.min(rhs);
        self.max = self.max.max(rhs);
    }
}

impl FromIterator<Vec3> for BoundingBox {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Vec3>,
    {
        let mut this = Self::default();

        for item in iter {
            this += item;
        }

        this
    }
}

impl Add<Self> for BoundingBox {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Self> for BoundingBox {
    fn add_assign(&mut self, rhs: Self) {
        self.min = self.min.min(rhs.min);
        self.max = self.max.max(rhs.max);
    }
}

impl FromIterator<Self> for BoundingBox {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Self>,
    {
        let mut this = Self::default();

        for item in iter {
            this += item;
        }

        this
    }
}

/// Identifies whoever reserves bounds entries or provides bounds, so that
/// repeated calls from the same caller replace each other instead of
/// accumulating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallerId(TypeId);

impl CallerId {
    pub fn of<T>() -> Self
    where
        T: 'static,
    {
        Self(TypeId::of::<T>())
    }
}

/// Bookkeeping for the bounds buffer: how many entries shaders are going to
/// append to it, plus the bounds provided directly by the host.
#[derive(Debug, Default)]
pub struct BoundsReservations {
    device: FxHashMap<CallerId, u32>,
    host: FxHashMap<CallerId, BoundingBox>,
}

impl BoundsReservations {
    /// Registers that given caller is going to call `request_location()` from
    /// `lanes` shader invocations per frame.
    pub fn reserve(&mut self, caller: CallerId, lanes: u32) {
        if lanes == 0 {
            self.device.remove(&caller);
        } else {
            self.device.insert(caller, lanes);
        }
    }

    /// Provides bounds from the host; an unset box withdraws the caller's
    /// bounds.
    pub fn set_bounds(&mut self, caller: CallerId, bounds: BoundingBox) {
        if bounds.is_set() {
            self.host.insert(caller, bounds);
        } else {
            self.host.remove(&caller);
        }
    }

    pub fn has_device_reservations(&self) -> bool {
        !self.device.is_empty()
    }

    /// Returns the number of entries shaders can append; each wave appends
    /// at most one.
    pub fn device_entries(&self) -> u32 {
        let entries: u64 = self
            .device
            .values()
            .map(|&lanes| (lanes as u64).div_ceil(gpu::WAVE_SIZE as u64))
            .sum();

        entries.min(u32::MAX as u64 - 1) as u32
    }

    /// Returns the number of entries the bounds buffer must hold.
    pub fn capacity(&self) -> u32 {
        self.device_entries() + 1
    }

    /// Returns the entry the merged host bounds are written into; it comes
    /// right after the entries reserved for shaders.
    pub fn host_slot(&self) -> u32 {
        self.device_entries()
    }

    pub fn host_bounds(&self) -> BoundingBox {
        self.host.values().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    struct CameraA;
    struct CameraB;

    #[test]
    fn bounding_box() {
        let bb: BoundingBox =
            [vec3(1.0, -2.0, 3.0), vec3(-1.0, 4.0, 0.0)].into_iter().collect();

        assert_eq!(vec3(-1.0, -2.0, 0.0), bb.min());
        assert_eq!(vec3(1.0, 4.0, 3.0), bb.max());
        assert_eq!(vec3(2.0, 6.0, 3.0), bb.extent());
        assert!(bb.is_set());
        assert!(!BoundingBox::default().is_set());

        let bb = bb + BoundingBox::new(Vec3::splat(5.0), Vec3::splat(6.0));

        assert_eq!(vec3(-1.0, -2.0, 0.0), bb.min());
        assert_eq!(vec3(6.0, 6.0, 6.0), bb.max());
    }

    #[test]
    fn reservations() {
        let mut target = BoundsReservations::default();

        assert_eq!(0, target.device_entries());
        assert_eq!(1, target.capacity());
        assert_eq!(0, target.host_slot());

        target.reserve(CallerId::of::<CameraA>(), 1920 * 1080);
        target.reserve(CallerId::of::<CameraB>(), 33);

        assert!(target.has_device_reservations());
        assert_eq!(64_800 + 2, target.device_entries());
        assert_eq!(64_803, target.capacity());
        assert_eq!(64_802, target.host_slot());

        // Reserving again replaces the previous reservation
        target.reserve(CallerId::of::<CameraB>(), 32);

        assert_eq!(64_801, target.device_entries());

        target.reserve(CallerId::of::<CameraA>(), 0);
        target.reserve(CallerId::of::<CameraB>(), 0);

        assert!(!target.has_device_reservations());
        assert_eq!(0, target.device_entries());
    }

    #[test]
    fn host_bounds() {
        let mut target = BoundsReservations::default();

        assert!(!target.host_bounds().is_set());

        target.set_bounds(
            CallerId::of::<CameraA>(),
            BoundingBox::new(Vec3::ZERO, Vec3::ONE),
        );

        target.set_bounds(
            CallerId::of::<CameraB>(),
            BoundingBox::new(Vec3::splat(-2.0), Vec3::splat(-1.0)),
        );

        assert!(target.host_bounds().is_set());
        assert_eq!(Vec3::splat(-2.0), target.host_bounds().min());
        assert_eq!(Vec3::ONE, target.host_bounds().max());

        target.set_bounds(CallerId::of::<CameraB>(), BoundingBox::default());

        assert_eq!(Vec3::ZERO, target.host_bounds().min());
    }
}
