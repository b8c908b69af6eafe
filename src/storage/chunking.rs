use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Split `data` into consecutive slices of at most `size` bytes.
///
/// Empty input yields no chunks. `size` must be non-zero.
pub fn chunk_bytes(data: &[u8], size: usize) -> impl Iterator<Item = &[u8]> {
    data.chunks(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_chunk_bytes_boundaries() {
        let data = vec![7u8; 10];

        let chunks: Vec<_> = chunk_bytes(&data, 4).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 2);

        assert_eq!(chunk_bytes(&data, 5).count(), 2);
        assert_eq!(chunk_bytes(&data, 64).count(), 1);
        assert_eq!(chunk_bytes(&[], 4).count(), 0);
    }
}
