use sha2::{Digest, Sha256};

pub fn is_printable(byte: u8) -> bool {
    (b' '..=b'~').contains(&byte)
}

pub fn printable_or_dot(byte: u8) -> char {
    if is_printable(byte) { byte as char } else { '.' }
}

/// Lowercase hex pairs joined by `sep`.
pub fn hex_pairs(bytes: &[u8], sep: &str) -> String {
    let mut out = String::with_capacity(bytes.len() * (2 + sep.len()));
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
        out.push_str(sep);
    }
    out
}

/// The text a span decodes to when read as a NUL-terminated string of at most
/// `max` bytes.
pub fn c_text(bytes: &[u8], max: usize) -> &[u8] {
    let bytes = &bytes[..bytes.len().min(max)];
    match bytes.iter().position(|b| *b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect()
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

pub mod test {
    use rand::prelude::*;

    /// Short buffers over a tiny alphabet, so that random pairs share long
    /// equal runs as well as edits.
    pub fn create_test_bytes(seed: u64) -> impl Iterator<Item = Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed);

        std::iter::repeat_with(move || {
            let len = rng.random_range(0..40);
            let mut bytes = Vec::with_capacity(len);
            for _ in 0..len {
                bytes.push(rng.random_range(0..3) as u8);
            }
            bytes
        })
    }

    /// A random buffer and a mutated copy of it: substitutions, insertions and
    /// deletions at random places.
    pub fn create_test_pair(seed: u64, len: usize, edits: usize) -> (Vec<u8>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let old: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        let mut new = old.clone();
        for _ in 0..edits {
            let at = rng.random_range(0..=new.len());
            match rng.random_range(0..3) {
                0 if at < new.len() => new[at] = rng.random(),
                1 => {
                    let n = rng.random_range(1..8);
                    for _ in 0..n {
                        new.insert(at, rng.random());
                    }
                }
                _ => {
                    let end = (at + rng.random_range(1..8)).min(new.len());
                    new.drain(at..end);
                }
            }
        }
        (old, new)
    }
}
