//! Part planning: partitions an object into fixed-size byte ranges.

use serde::Serialize;

/// One contiguous byte-range slice of the source object.
///
/// Indices are 0-based for planning; [`Part::number`] gives the
/// 1-based part number used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Part {
    /// 0-based position in the plan.
    pub index: u64,
    /// Byte offset within the object.
    pub offset: u64,
    /// Length of this part in bytes.
    pub length: u64,
}

impl Part {
    /// 1-based part number used by destination backends.
    pub fn number(&self) -> u64 {
        self.index + 1
    }
}

/// Error returned for an invalid part-size ceiling.
#[derive(Debug, thiserror::Error)]
#[error("max part size must be greater than zero")]
pub struct PlanError;

/// Partitions `[0, size)` into ordered, disjoint parts of at most
/// `max_part_size` bytes each. The last part may be shorter. A
/// zero-length object yields an empty plan.
pub fn plan_parts(size: u64, max_part_size: u64) -> Result<Vec<Part>, PlanError> {
    if max_part_size == 0 {
        return Err(PlanError);
    }

    let mut parts = Vec::with_capacity(size.div_ceil(max_part_size) as usize);
    let mut offset = 0;
    let mut index = 0;
    while offset < size {
        let length = (size - offset).min(max_part_size);
        parts.push(Part {
            index,
            offset,
            length,
        });
        offset += length;
        index += 1;
    }
    Ok(parts)
}

/// Worker-pool size for a transfer: never more workers than parts,
/// never zero workers when at least one part exists.
pub fn effective_concurrency(requested: usize, num_parts: usize) -> usize {
    requested.max(1).min(num_parts.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn zero_size_yields_no_parts() {
        assert!(plan_parts(0, 64 * MIB).unwrap().is_empty());
    }

    #[test]
    fn zero_part_size_rejected() {
        assert!(plan_parts(100, 0).is_err());
    }

    #[test]
    fn single_part_when_smaller_than_ceiling() {
        let parts = plan_parts(1000, 64 * MIB).unwrap();
        assert_eq!(
            parts,
            vec![Part {
                index: 0,
                offset: 0,
                length: 1000
            }]
        );
        assert_eq!(parts[0].number(), 1);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let parts = plan_parts(30, 10).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.length == 10));
    }

    #[test]
    fn plan_150_mib_with_64_mib_ceiling() {
        let parts = plan_parts(150 * MIB, 64 * MIB).unwrap();
        let lengths: Vec<u64> = parts.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![64 * MIB, 64 * MIB, 22 * MIB]);
        let numbers: Vec<u64> = parts.iter().map(|p| p.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn parts_cover_range_without_gaps_or_overlaps() {
        for (size, max) in [(1u64, 1u64), (17, 4), (1000, 7), (4096, 4096), (4097, 4096)] {
            let parts = plan_parts(size, max).unwrap();
            let mut expected_offset = 0;
            for (i, part) in parts.iter().enumerate() {
                assert_eq!(part.index, i as u64);
                assert_eq!(part.offset, expected_offset);
                assert!(part.length > 0 && part.length <= max);
                expected_offset += part.length;
            }
            assert_eq!(expected_offset, size, "size={size} max={max}");
        }
    }

    #[test]
    fn concurrency_clamped_to_part_count() {
        assert_eq!(effective_concurrency(4, 3), 3);
        assert_eq!(effective_concurrency(10, 2), 2);
    }

    #[test]
    fn concurrency_never_exceeds_request() {
        assert_eq!(effective_concurrency(2, 100), 2);
    }

    #[test]
    fn concurrency_at_least_one() {
        assert_eq!(effective_concurrency(0, 5), 1);
        assert_eq!(effective_concurrency(4, 0), 1);
    }
}
