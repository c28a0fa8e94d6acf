// SPDX-License-Identifier: CEPL-1.0
use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// A packed graphics API version word (`variant.major.minor.patch`).
///
/// Same bit layout the driver reports in device properties. Ordering goes
/// by `major.minor.patch`; the variant only breaks ties.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ApiVersion(u32);

pub const MAX_MAJOR: u32 = 0x7f;
pub const MAX_MINOR: u32 = 0x3ff;
pub const MAX_PATCH: u32 = 0xfff;

/// A `[major, minor, patch]` triple that does not fit the packed layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("version {major}.{minor}.{patch} out of range (max {MAX_MAJOR}.{MAX_MINOR}.{MAX_PATCH})")]
pub struct VersionOutOfRange {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ApiVersion {
    pub const V1_0: ApiVersion = ApiVersion::new(0, 1, 0, 0);
    pub const V1_1: ApiVersion = ApiVersion::new(0, 1, 1, 0);
    pub const V1_3: ApiVersion = ApiVersion::new(0, 1, 3, 0);

    pub const fn new(variant: u32, major: u32, minor: u32, patch: u32) -> Self {
        Self((variant << 29) | (major << 22) | (minor << 12) | patch)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    pub const fn variant(self) -> u32 {
        self.0 >> 29
    }

    pub const fn major(self) -> u32 {
        (self.0 >> 22) & MAX_MAJOR
    }

    pub const fn minor(self) -> u32 {
        (self.0 >> 12) & MAX_MINOR
    }

    pub const fn patch(self) -> u32 {
        self.0 & MAX_PATCH
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major(), self.minor(), self.patch(), self.variant()).cmp(&(
            other.major(),
            other.minor(),
            other.patch(),
            other.variant(),
        ))
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<[u32; 3]> for ApiVersion {
    type Error = VersionOutOfRange;

    fn try_from([major, minor, patch]: [u32; 3]) -> Result<Self, Self::Error> {
        if major > MAX_MAJOR || minor > MAX_MINOR || patch > MAX_PATCH {
            return Err(VersionOutOfRange {
                major,
                minor,
                patch,
            });
        }
        Ok(Self::new(0, major, minor, patch))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl fmt::Debug for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiVersion({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_components() {
        let v = ApiVersion::new(0, 1, 3, 275);
        assert_eq!((v.variant(), v.major(), v.minor(), v.patch()), (0, 1, 3, 275));
        assert_eq!(v.to_string(), "1.3.275");
    }

    #[test]
    fn orders_by_major_then_minor() {
        assert!(ApiVersion::V1_1 < ApiVersion::V1_3);
        assert!(ApiVersion::new(0, 1, 2, 999) < ApiVersion::V1_3);
        assert!(ApiVersion::new(0, 1, 3, 1) >= ApiVersion::V1_3);
    }

    #[test]
    fn variant_bits_do_not_lift_the_version() {
        let variant = ApiVersion::new(1, 1, 0, 0);
        assert!(variant < ApiVersion::V1_3);
        assert!(ApiVersion::new(7, 1, 2, 0) < ApiVersion::V1_3);
        assert!(ApiVersion::new(1, 1, 3, 0) > ApiVersion::V1_3);
    }

    #[test]
    fn triples_must_fit_the_packing() {
        assert_eq!(ApiVersion::try_from([1, 2, 3]), Ok(ApiVersion::new(0, 1, 2, 3)));
        assert_eq!(
            ApiVersion::try_from([127, 1023, 4095]),
            Ok(ApiVersion::new(0, 127, 1023, 4095))
        );
        let err = ApiVersion::try_from([1, 5000, 0]).unwrap_err();
        assert_eq!(
            err,
            VersionOutOfRange {
                major: 1,
                minor: 5000,
                patch: 0
            }
        );
        assert!(ApiVersion::try_from([128, 0, 0]).is_err());
        assert!(ApiVersion::try_from([1, 0, 4096]).is_err());
    }

    #[test]
    fn matches_the_vulkan_packing() {
        // VK_API_VERSION_1_3
        assert_eq!(ApiVersion::V1_3.to_raw(), 4_206_592);
    }
}
