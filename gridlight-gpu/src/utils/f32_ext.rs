#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub trait F32Ext
where
    Self: Sized,
{
    fn sqr(self) -> Self;
    fn saturate(self) -> Self;

    /// Like `acos()`, but clamps the input so that values slightly outside of
    /// `-1.0 ..= 1.0` (caused by rounding errors) don't yield NaNs.
    fn safe_acos(self) -> Self;

    /// See: [`Self::safe_acos()`].
    fn safe_asin(self) -> Self;
}

impl F32Ext for f32 {
    fn sqr(self) -> Self {
        self * self
    }

    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn safe_acos(self) -> Self {
        self.clamp(-1.0, 1.0).acos()
    }

    fn safe_asin(self) -> Self {
        self.clamp(-1.0, 1.0).asin()
    }
}
