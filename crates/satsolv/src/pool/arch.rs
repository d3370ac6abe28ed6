use indexmap::IndexMap;

use crate::error::{Result, SolvError};

/// Compatible architectures per target, best first.
const ARCH_POLICIES: &[(&str, &[&str])] = &[
    ("x86_64", &["x86_64", "i686", "i586", "i486", "i386"]),
    ("i686", &["i686", "i586", "i486", "i386"]),
    ("i586", &["i586", "i486", "i386"]),
    ("i486", &["i486", "i386"]),
    ("i386", &["i386"]),
    ("s390x", &["s390x", "s390"]),
    ("s390", &["s390"]),
    ("ia64", &["ia64", "i686", "i586", "i486", "i386"]),
    ("ppc64", &["ppc64", "ppc"]),
    ("ppc", &["ppc"]),
    ("armv6l", &["armv6l", "armv5tejl", "armv5tel", "armv5l", "armv4tl", "armv4l", "armv3l"]),
    ("armv5tejl", &["armv5tejl", "armv5tel", "armv5l", "armv4tl", "armv4l", "armv3l"]),
    ("armv5tel", &["armv5tel", "armv5l", "armv4tl", "armv4l", "armv3l"]),
    ("armv5l", &["armv5l", "armv4tl", "armv4l", "armv3l"]),
    ("armv4tl", &["armv4tl", "armv4l", "armv3l"]),
    ("armv4l", &["armv4l", "armv3l"]),
    ("armv3l", &["armv3l"]),
    ("sh3", &["sh3"]),
    ("sh4", &["sh4"]),
    ("sh4a", &["sh4a", "sh4"]),
];

pub const NOARCH: &str = "noarch";

const NOARCH_SCORE: u32 = 1;
const FIRST_SCORE: u32 = 0x10001;
const FAMILY_STEP: u32 = 0x10000;
const FAMILY_MASK: u32 = 0xffff_0000;

/// Architecture compatibility for a target architecture.
///
/// Lower scores are better. Architectures without a score are not installable.
#[derive(Debug, Clone, Default)]
pub struct ArchPolicy {
    target: Option<&'static str>,
    scores: IndexMap<&'static str, u32>,
}

impl ArchPolicy {
    /// A policy that accepts every binary architecture
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(arch: &str) -> Result<Self> {
        let (target, compatible) = ARCH_POLICIES
            .iter()
            .find(|(name, _)| *name == arch)
            .ok_or_else(|| SolvError::UnknownArchitecture(arch.to_string()))?;

        let mut scores = IndexMap::new();
        let mut score = FIRST_SCORE;
        for &compat in compatible.iter() {
            scores.entry(compat).or_insert(score);
            score += FAMILY_STEP;
        }

        Ok(Self {
            target: Some(*target),
            scores,
        })
    }

    pub fn target(&self) -> Option<&str> {
        self.target
    }

    /// Score of an architecture, `None` if it cannot be installed
    pub fn score(&self, arch: &str) -> Option<u32> {
        match arch {
            "src" | "nosrc" => None,
            NOARCH => Some(NOARCH_SCORE),
            _ if self.target.is_none() => Some(FIRST_SCORE),
            _ => self.scores.get(arch).copied(),
        }
    }

    pub fn is_installable(&self, arch: &str) -> bool {
        self.score(arch).is_some()
    }

    /// Check whether replacing a package of arch `from` with one of arch `to`
    /// switches the architecture family.
    pub fn is_illegal_change(&self, from: &str, to: &str) -> bool {
        if from == to || from == NOARCH || to == NOARCH || self.target.is_none() {
            return false;
        }
        let a = self.scores.get(from).copied().unwrap_or(0);
        let b = self.scores.get(to).copied().unwrap_or(0);
        (a ^ b) & FAMILY_MASK != 0
    }
}
