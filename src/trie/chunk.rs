//! Contract code chunking: 31 code bytes per 32-byte chunk, prefixed by
//! how many of the chunk's leading bytes continue PUSH data begun in an
//! earlier chunk. The walker tracks PUSH opcodes so the offsets stay
//! correct across chunk boundaries.

use crate::types::B256;

/// Bytes of code per chunk; the 32nd byte is the offset prefix.
pub const CHUNK_BODY: usize = 31;

const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7f;

/// Split bytecode into `ceil(len / 31)` chunks of
/// `[leading_pushdata_offset ‖ code(31, zero-padded)]`.
pub fn chunkify_code(code: &[u8]) -> Vec<B256> {
    if code.is_empty() {
        return Vec::new();
    }

    let chunk_count = code.len().div_ceil(CHUNK_BODY);
    let mut offsets = vec![0u8; chunk_count];

    // Walk the opcodes; whenever PUSH data crosses a chunk boundary, the
    // following chunk starts inside that data.
    let mut pc = 0usize;
    while pc < code.len() {
        let op = code[pc];
        let push_len = if (PUSH1..=PUSH32).contains(&op) {
            (op - PUSH1 + 1) as usize
        } else {
            0
        };

        if push_len > 0 {
            let data_start = pc + 1;
            let data_end = data_start + push_len; // exclusive, may pass the end
            let mut boundary = data_start.div_ceil(CHUNK_BODY) * CHUNK_BODY;
            while boundary < data_end && boundary < code.len() {
                let chunk = boundary / CHUNK_BODY;
                // Continuation bytes present in this chunk, not counting
                // padding past the end of the code.
                offsets[chunk] = (data_end.min(code.len()) - boundary).min(CHUNK_BODY) as u8;
                boundary += CHUNK_BODY;
            }
        }

        pc += 1 + push_len;
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    for (i, body) in code.chunks(CHUNK_BODY).enumerate() {
        let mut chunk = [0u8; 32];
        chunk[0] = offsets[i];
        chunk[1..1 + body.len()].copy_from_slice(body);
        chunks.push(chunk);
    }
    chunks
}

/// Reassemble bytecode from its chunks. `code_len` trims the zero padding
/// of the final chunk.
pub fn merge_chunks(chunks: &[B256], code_len: usize) -> Vec<u8> {
    let mut code = Vec::with_capacity(chunks.len() * CHUNK_BODY);
    for chunk in chunks {
        code.extend_from_slice(&chunk[1..]);
    }
    code.truncate(code_len);
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code() {
        assert!(chunkify_code(&[]).is_empty());
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunkify_code(&[0u8; 31]).len(), 1);
        assert_eq!(chunkify_code(&[0u8; 32]).len(), 2);
        assert_eq!(chunkify_code(&[0u8; 62]).len(), 2);
        assert_eq!(chunkify_code(&[0u8; 63]).len(), 3);
    }

    #[test]
    fn test_no_push_offsets_zero() {
        // ADD/MUL/STOP only; nothing spans a boundary.
        let code = vec![0x01u8; 70];
        let chunks = chunkify_code(&code);
        assert!(chunks.iter().all(|c| c[0] == 0));
    }

    #[test]
    fn test_push_data_spanning_boundary() {
        // 29 STOPs, then PUSH4 at position 29: data occupies 30..34,
        // crossing the boundary at 31 with 3 bytes left over.
        let mut code = vec![0x00u8; 29];
        code.push(0x63); // PUSH4
        code.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);
        code.extend_from_slice(&[0x00; 10]);

        let chunks = chunkify_code(&code);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0][0], 0);
        assert_eq!(chunks[1][0], 3);
        // The continuation bytes sit at the start of chunk 1's body.
        assert_eq!(&chunks[1][1..4], &[0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn test_push32_spans_full_chunk() {
        // PUSH32 at position 30: one data byte in chunk 0, then 31 bytes
        // filling all of chunk 1.
        let mut code = vec![0x00u8; 30];
        code.push(0x7f); // PUSH32
        code.extend_from_slice(&[0x11; 32]);
        code.extend_from_slice(&[0x00; 5]);

        let chunks = chunkify_code(&code);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1][0], 31);
        assert_eq!(chunks[2][0], 1);
    }

    #[test]
    fn test_push_at_chunk_end_without_data_spill() {
        // PUSH1 with its data byte as the last byte of the chunk.
        let mut code = vec![0x00u8; 29];
        code.push(0x60); // PUSH1
        code.push(0xff); // data at position 30, inside chunk 0
        code.extend_from_slice(&[0x00; 5]);

        let chunks = chunkify_code(&code);
        assert_eq!(chunks[1][0], 0);
    }

    #[test]
    fn test_truncated_push_data_at_code_end() {
        // PUSH32 with only 2 data bytes before the code ends.
        let mut code = vec![0x00u8; 30];
        code.push(0x7f);
        code.extend_from_slice(&[0x01, 0x02]);

        let chunks = chunkify_code(&code);
        assert_eq!(chunks.len(), 2);
        // Both trailing bytes are pushdata continuation.
        assert_eq!(chunks[1][0], 2);
    }

    #[test]
    fn test_roundtrip() {
        let mut code = Vec::new();
        for i in 0..100u8 {
            if i % 7 == 0 {
                code.push(0x62); // PUSH3
                code.extend_from_slice(&[i, i, i]);
            } else {
                code.push(0x01);
            }
        }

        let chunks = chunkify_code(&code);
        assert_eq!(chunks.len(), code.len().div_ceil(CHUNK_BODY));
        assert_eq!(merge_chunks(&chunks, code.len()), code);
    }
}
