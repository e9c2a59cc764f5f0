/*
The first thing a BZIP2 compressor does is shorten runs: every run of 4 to 255 identical bytes is
written as the first four bytes followed by a count byte holding how many more copies followed.
Undoing it only needs a five byte lookahead. When we find four identical bytes with a byte after
them, that byte is the count; output 4 + count copies and jump past all five. Otherwise copy one
byte and move on.
*/
/// Undoes the RLE1 phase: expands runs of four identical bytes plus a count byte.
pub fn rle1_decode(v: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() + v.len() / 4);
    // Start of the stretch of plain bytes not yet copied out
    let mut start = 0;
    let mut i = 0;

    while i < v.len() {
        let byte = v[i];
        if i + 4 < v.len() && v[i + 1] == byte && v[i + 2] == byte && v[i + 3] == byte {
            // Copy out what we have passed, plus the four bytes of the run
            out.extend_from_slice(&v[start..i + 4]);
            // ...then the extra copies named by the count byte
            out.resize(out.len() + v[i + 4] as usize, byte);
            i += 5;
            start = i;
        } else {
            i += 1;
        }
    }
    // Don't forget anything after the last run
    out.extend_from_slice(&v[start..]);
    out
}
