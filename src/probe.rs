//! The group-triangular probe sequence.
//!
//! Starting from a group derived from the high bits of the hash, successive
//! groups are visited with a triangular step (`+1`, `+2`, `+3`, …) modulo the
//! number of groups. Because the group count is always a power of two, this
//! sequence is a permutation of `0..groups`: every group is visited exactly
//! once before the sequence repeats.

/// Iterator over group indices for a probe starting at `hash`, within a table
/// of `groups` groups (`groups` must be a power of two).
#[derive(Debug, Clone)]
pub struct ProbeSeq {
    groups: usize,
    mask: usize,
    current: usize,
    step: usize,
}

impl ProbeSeq {
    #[inline]
    #[must_use]
    pub fn new(hash: u64, groups: usize) -> Self {
        debug_assert!(groups.is_power_of_two());
        let mask = groups - 1;
        let current = ((hash >> 7) as usize) & mask;
        Self {
            groups,
            mask,
            current,
            step: 0,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.step >= self.groups {
            return None;
        }
        let group = self.current;
        self.step += 1;
        self.current = (self.current + self.step) & self.mask;
        Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn visits_every_group_exactly_once() {
        for groups in [16_usize, 32, 64, 1024] {
            for hash in [0_u64, 1, 12345, u64::MAX] {
                let seen: HashSet<usize> = ProbeSeq::new(hash, groups).collect();
                assert_eq!(seen.len(), groups, "groups={groups} hash={hash}");
                assert_eq!(seen, (0..groups).collect());
            }
        }
    }

    #[test]
    fn starting_group_matches_spec_formula() {
        let hash = 0b1010_1010_1000_0000_u64;
        let groups = 16;
        let mut seq = ProbeSeq::new(hash, groups);
        assert_eq!(seq.next(), Some(((hash >> 7) as usize) & (groups - 1)));
    }
}
