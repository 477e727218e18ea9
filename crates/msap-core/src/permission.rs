//! Permission gate.
//!
//! Deployments restrict which management operations a node accepts through
//! a per-feature lock bitmap. The bitmap is owned outside the engine; handlers
//! only ask whether a feature is currently permitted.

use serde::{Deserialize, Serialize};

/// A guarded management feature.
///
/// The discriminant is the bit position in [`LockBitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Start the stack.
    StackStart = 0,
    /// Stop the stack.
    StackStop = 1,
    /// Read attributes.
    AttributeRead = 2,
    /// Write attributes.
    AttributeWrite = 3,
    /// Read app config data.
    AppConfigRead = 4,
    /// Write app config data.
    AppConfigWrite = 5,
    /// Read the sink cost.
    SinkCostRead = 6,
    /// Write the sink cost.
    SinkCostWrite = 7,
    /// Query neighbors and route counts.
    GetNeighbors = 8,
    /// Start a neighbor scan.
    ScanNeighbors = 9,
    /// Clear, start and mark the scratchpad bootable.
    ScratchpadStart = 10,
    /// Read the scratchpad status.
    ScratchpadStatus = 11,
}

impl Feature {
    /// Every guarded feature.
    pub const ALL: [Feature; 12] = [
        Feature::StackStart,
        Feature::StackStop,
        Feature::AttributeRead,
        Feature::AttributeWrite,
        Feature::AppConfigRead,
        Feature::AppConfigWrite,
        Feature::SinkCostRead,
        Feature::SinkCostWrite,
        Feature::GetNeighbors,
        Feature::ScanNeighbors,
        Feature::ScratchpadStart,
        Feature::ScratchpadStatus,
    ];

    /// Bit mask of this feature in the lock bitmap.
    pub const fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// Answers whether a guarded feature is currently permitted.
pub trait LockBits {
    /// Whether `feature` is permitted.
    fn is_feature_permitted(&self, feature: Feature) -> bool;
}

/// A lock bitmap where a set bit permits the feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockBitmap(u32);

impl Default for LockBitmap {
    fn default() -> Self {
        LockBitmap::UNLOCKED
    }
}

impl LockBitmap {
    /// Every feature permitted.
    pub const UNLOCKED: LockBitmap = LockBitmap(u32::MAX);

    /// Build from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        LockBitmap(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Bitmap with the given features locked.
    pub fn locking(features: &[Feature]) -> Self {
        let mut bitmap = LockBitmap::UNLOCKED;
        for &feature in features {
            bitmap.lock(feature);
        }
        bitmap
    }

    /// Lock a feature.
    pub fn lock(&mut self, feature: Feature) {
        self.0 &= !feature.mask();
    }

    /// Unlock a feature.
    pub fn unlock(&mut self, feature: Feature) {
        self.0 |= feature.mask();
    }

    /// Whether `feature` is permitted.
    pub const fn permits(self, feature: Feature) -> bool {
        self.0 & feature.mask() != 0
    }
}

impl LockBits for LockBitmap {
    fn is_feature_permitted(&self, feature: Feature) -> bool {
        self.permits(feature)
    }
}
