//! Packed measurement specs
//!
//! A [`SizeSpec`] packs a mode and a pixel size into 32 bits:
//!
//! ```text
//!  31 30 29                                0
//! +-----+-----------------------------------+
//! |mode |              size                 |
//! +-----+-----------------------------------+
//! ```
//!
//! [`SizeConstraints`] packs two specs into 64 bits, width in the high word
//! and height in the low word. Both are plain `Copy` newtypes so they can be
//! compared and hashed as integers when used as cache keys.

use std::fmt;

const MODE_SHIFT: u32 = 30;
const MODE_MASK: u32 = 0x3 << MODE_SHIFT;
const SIZE_MASK: u32 = !MODE_MASK;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeSpecMode {
    /// No constraint from the parent.
    Unspecified,
    /// The child must be exactly this size.
    Exactly,
    /// The child can be as large as it wants up to this size.
    AtMost,
}

impl SizeSpecMode {
    #[inline]
    const fn bits(self) -> u32 {
        match self {
            SizeSpecMode::Unspecified => 0,
            SizeSpecMode::Exactly => 1 << MODE_SHIFT,
            SizeSpecMode::AtMost => 2 << MODE_SHIFT,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeSpec(u32);

impl SizeSpec {
    /// Largest size representable in the 30 bit payload.
    pub const MAX_SIZE: u32 = SIZE_MASK;

    pub const UNSPECIFIED: SizeSpec = SizeSpec(0);

    /// Packs `mode` and `size`. Sizes beyond [`Self::MAX_SIZE`] saturate.
    #[inline]
    pub const fn new(mode: SizeSpecMode, size: u32) -> Self {
        let size = if size > SIZE_MASK { SIZE_MASK } else { size };
        Self(mode.bits() | size)
    }

    #[inline]
    pub const fn exactly(size: u32) -> Self {
        Self::new(SizeSpecMode::Exactly, size)
    }

    #[inline]
    pub const fn at_most(size: u32) -> Self {
        Self::new(SizeSpecMode::AtMost, size)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decodes the mode bits. The reserved pattern `0b11` decodes as
    /// [`SizeSpecMode::Unspecified`].
    #[inline]
    pub fn mode(self) -> SizeSpecMode {
        match (self.0 & MODE_MASK) >> MODE_SHIFT {
            1 => SizeSpecMode::Exactly,
            2 => SizeSpecMode::AtMost,
            _ => SizeSpecMode::Unspecified,
        }
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.0 & SIZE_MASK
    }

    pub fn min(self) -> u32 {
        match self.mode() {
            SizeSpecMode::Exactly => self.size(),
            _ => 0,
        }
    }

    pub fn max(self) -> u32 {
        match self.mode() {
            SizeSpecMode::Unspecified => Self::MAX_SIZE,
            _ => self.size(),
        }
    }

    pub fn is_bounded(self) -> bool {
        self.mode() != SizeSpecMode::Unspecified
    }

    /// Resolves a desired size against this spec.
    pub fn resolve(self, desired: u32) -> u32 {
        match self.mode() {
            SizeSpecMode::Exactly => self.size(),
            SizeSpecMode::AtMost => desired.min(self.size()),
            SizeSpecMode::Unspecified => desired.min(Self::MAX_SIZE),
        }
    }
}

impl Default for SizeSpec {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl fmt::Debug for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode() {
            SizeSpecMode::Unspecified => write!(f, "UNSPECIFIED"),
            SizeSpecMode::Exactly => write!(f, "EXACTLY {}", self.size()),
            SizeSpecMode::AtMost => write!(f, "AT_MOST {}", self.size()),
        }
    }
}

/// Width and height specs packed into one 64 bit value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizeConstraints(u64);

impl SizeConstraints {
    pub const UNSPECIFIED: SizeConstraints = SizeConstraints(0);

    #[inline]
    pub const fn new(width: SizeSpec, height: SizeSpec) -> Self {
        Self(((width.raw() as u64) << 32) | height.raw() as u64)
    }

    /// Constraints that allow exactly one size.
    pub const fn exact(width: u32, height: u32) -> Self {
        Self::new(SizeSpec::exactly(width), SizeSpec::exactly(height))
    }

    pub const fn at_most(width: u32, height: u32) -> Self {
        Self::new(SizeSpec::at_most(width), SizeSpec::at_most(height))
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn width_spec(self) -> SizeSpec {
        SizeSpec::from_raw((self.0 >> 32) as u32)
    }

    #[inline]
    pub const fn height_spec(self) -> SizeSpec {
        SizeSpec::from_raw(self.0 as u32)
    }

    pub fn min_width(self) -> u32 {
        self.width_spec().min()
    }

    pub fn max_width(self) -> u32 {
        self.width_spec().max()
    }

    pub fn min_height(self) -> u32 {
        self.height_spec().min()
    }

    pub fn max_height(self) -> u32 {
        self.height_spec().max()
    }

    pub fn has_bounded_width(self) -> bool {
        self.width_spec().is_bounded()
    }

    pub fn has_bounded_height(self) -> bool {
        self.height_spec().is_bounded()
    }

    pub fn is_tight(self) -> bool {
        self.width_spec().mode() == SizeSpecMode::Exactly
            && self.height_spec().mode() == SizeSpecMode::Exactly
    }

    /// Clamps a desired size to these constraints.
    pub fn constrain(self, width: u32, height: u32) -> (u32, u32) {
        (
            self.width_spec().resolve(width),
            self.height_spec().resolve(height),
        )
    }

    pub fn with_width(self, width: SizeSpec) -> Self {
        Self::new(width, self.height_spec())
    }

    pub fn with_height(self, height: SizeSpec) -> Self {
        Self::new(self.width_spec(), height)
    }
}

impl fmt::Debug for SizeConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeConstraints")
            .field("width", &self.width_spec())
            .field("height", &self.height_spec())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/size_spec_tests.rs"]
mod tests;
