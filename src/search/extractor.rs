/// Overlapping fixed-width windows over candidate material, one per offset.
///
/// Yields `(offset, &buffer[offset..offset + key_len])` for every offset up to
/// and including `buffer.len() - key_len`. Nothing is yielded when the buffer
/// is shorter than one key or `key_len` is zero.
#[derive(Debug, Clone)]
pub struct CandidateKeys<'a> {
    buffer: &'a [u8],
    key_len: usize,
    offset: usize,
}

pub fn extract(buffer: &[u8], key_len: usize) -> CandidateKeys<'_> {
    CandidateKeys {
        buffer,
        key_len,
        offset: 0,
    }
}

impl<'a> CandidateKeys<'a> {
    fn remaining(&self) -> usize {
        if self.key_len == 0 || self.buffer.len() < self.key_len {
            return 0;
        }
        (self.buffer.len() - self.key_len + 1).saturating_sub(self.offset)
    }
}

impl<'a> Iterator for CandidateKeys<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }

        let offset = self.offset;
        self.offset += 1;
        Some((offset, &self.buffer[offset..offset + self.key_len]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CandidateKeys<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_cover_every_offset() {
        let buffer: Vec<u8> = (0u8..32).collect();

        for key_len in [1, 8, 16, 24, 32] {
            let windows: Vec<_> = extract(&buffer, key_len).collect();
            assert_eq!(windows.len(), buffer.len() - key_len + 1);

            for (i, (offset, window)) in windows.iter().enumerate() {
                assert_eq!(*offset, i);
                assert_eq!(*window, &buffer[i..i + key_len]);
            }
        }
    }

    #[test]
    fn exact_fit_yields_one_window() {
        let buffer = [7u8; 16];
        let windows: Vec<_> = extract(&buffer, 16).collect();
        assert_eq!(windows, vec![(0, &buffer[..])]);
    }

    #[test]
    fn short_buffer_yields_nothing() {
        assert_eq!(extract(&[1, 2, 3], 8).count(), 0);
        assert_eq!(extract(&[], 8).count(), 0);
        assert_eq!(extract(&[1, 2, 3], 0).count(), 0);
    }

    #[test]
    fn sequence_is_restartable_and_sized() {
        let buffer: Vec<u8> = (0u8..20).collect();
        let mut keys = extract(&buffer, 8);
        assert_eq!(keys.len(), 13);

        let copy = keys.clone();
        keys.next();
        assert_eq!(keys.len(), 12);
        assert_eq!(copy.len(), 13);
        assert!(copy.eq(extract(&buffer, 8)));
    }
}
