use crate::compression::error::FormatError;

/// Undo the Burrows-Wheeler-Transform of one block, starting from the origin pointer (key).
pub fn bwt_decode(key: u32, bwt_in: &[u8]) -> Result<Vec<u8>, FormatError> {
    let end = bwt_in.len();
    if key as usize >= end {
        return Err(FormatError::InvalidOriginPointer {
            origin: key,
            len: end,
        });
    }

    // Count each byte value, then turn the counts into the start of each value's bucket
    let mut freq = [0_u32; 256];
    for &s in bwt_in {
        freq[s as usize] += 1;
    }
    let mut base = 0_u32;
    for f in freq.iter_mut() {
        let count = *f;
        *f = base;
        base += count;
    }

    // Build the transformation vector to find the next character in the original data.
    // (Stable counting sort: t_vec[bucket position] = position in the bwt data.)
    let mut t_vec = vec![0_u32; end];
    for (i, &s) in bwt_in.iter().enumerate() {
        t_vec[freq[s as usize] as usize] = i as u32;
        freq[s as usize] += 1;
    }

    // Walk the chain from the key, collecting the original data
    let mut orig = Vec::with_capacity(end);
    let mut pointer = key as usize;
    for _ in 0..end {
        pointer = t_vec[pointer] as usize;
        orig.push(bwt_in[pointer]);
    }
    Ok(orig)
}
