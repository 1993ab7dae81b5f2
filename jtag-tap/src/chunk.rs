/// One transport-sized segment of a longer data register scan.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    /// Offset of the first byte of this chunk in the caller's buffers
    pub byte_offset: usize,
    pub byte_count: usize,
    pub bits: usize,
    /// Only the last chunk leaves the shift state.
    pub last: bool,
}

/// Splits a scan of `total_bits` bits into chunks of at most `max_chunk_bytes` bytes.
///
/// Every chunk but the last carries a whole number of bytes, so the byte offsets of
/// consecutive chunks line up with the caller's LSB-first bit buffer.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    remaining_bits: usize,
    byte_offset: usize,
    max_chunk_bytes: usize,
}

impl ChunkPlan {
    /// # Panics
    ///
    /// Panics if `max_chunk_bytes` is zero.
    pub fn new(total_bits: usize, max_chunk_bytes: usize) -> ChunkPlan {
        assert!(max_chunk_bytes > 0, "chunks must hold at least one byte");
        ChunkPlan {
            remaining_bits: total_bits,
            byte_offset: 0,
            max_chunk_bytes,
        }
    }
}

impl Iterator for ChunkPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining_bits == 0 {
            return None;
        }
        let byte_count = self.remaining_bits.div_ceil(8).min(self.max_chunk_bytes);
        let bits = self.remaining_bits.min(8 * byte_count);
        let chunk = Chunk {
            byte_offset: self.byte_offset,
            byte_count,
            bits,
            last: bits == self.remaining_bits,
        };
        self.remaining_bits -= bits;
        self.byte_offset += byte_count;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining_bits.div_ceil(8 * self.max_chunk_bytes);
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlan {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_scan_is_single_chunk() {
        let chunks: Vec<_> = ChunkPlan::new(100, 32).collect();
        assert_eq!(
            chunks,
            vec![Chunk {
                byte_offset: 0,
                byte_count: 13,
                bits: 100,
                last: true
            }]
        );
    }

    #[test]
    fn long_scan_splits_on_capacity() {
        let chunks: Vec<_> = ChunkPlan::new(300, 32).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].bits, chunks[0].byte_count, chunks[0].last), (256, 32, false));
        assert_eq!((chunks[1].bits, chunks[1].byte_count, chunks[1].last), (44, 6, true));
        assert_eq!(chunks[1].byte_offset, 32);
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let chunks: Vec<_> = ChunkPlan::new(512, 32).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].last);
        assert_eq!(chunks[1].bits, 256);
    }

    #[test]
    fn remainder_just_above_capacity_does_not_overflow() {
        // 8 * 32 + 3 bits must not produce a 33 byte chunk
        let chunks: Vec<_> = ChunkPlan::new(259, 32).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].byte_count, 32);
        assert_eq!((chunks[1].bits, chunks[1].byte_count), (3, 1));
    }

    #[test]
    fn byte_counts_sum_to_total() {
        for max in [1, 2, 4, 8, 32, 64] {
            for bits in 1..600 {
                let plan = ChunkPlan::new(bits, max);
                assert_eq!(plan.len(), plan.clone().count());
                let chunks: Vec<_> = plan.collect();
                assert_eq!(chunks.iter().map(|c| c.byte_count).sum::<usize>(), bits.div_ceil(8));
                assert_eq!(chunks.iter().map(|c| c.bits).sum::<usize>(), bits);
                assert_eq!(chunks.iter().filter(|c| c.last).count(), 1);
                assert!(chunks.last().unwrap().last);
                assert!(chunks.iter().all(|c| c.byte_count <= max));
            }
        }
    }

    #[test]
    #[should_panic(expected = "at least one byte")]
    fn zero_capacity_panics() {
        let _ = ChunkPlan::new(8, 0);
    }

    #[test]
    fn empty_scan_has_no_chunks() {
        assert_eq!(ChunkPlan::new(0, 32).count(), 0);
    }
}
