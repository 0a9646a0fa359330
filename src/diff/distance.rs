use super::DiffOpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DistanceAlgorithm {
    /// Insertions and deletions only (Myers O(ND))
    Myers,
    /// Substitutions allowed (Levenshtein, O(N*M))
    Levenshtein,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub distance: u64,
    pub similarity: f64,
}

impl Distance {
    pub fn compute(old: &[u8], new: &[u8], algorithm: DistanceAlgorithm) -> Self {
        match algorithm {
            DistanceAlgorithm::Myers => {
                let stream = DiffOpStream::from_compare(old, new);
                let distance: u64 = stream
                    .iter()
                    .map(|op| op.source_len() + op.target_len())
                    .sum();
                // every byte of both buffers may be edited at most once
                Self::with_similarity(distance, (old.len() + new.len()) as u64)
            }
            DistanceAlgorithm::Levenshtein => {
                let distance = levenshtein(old, new);
                Self::with_similarity(distance, old.len().max(new.len()) as u64)
            }
        }
    }

    fn with_similarity(distance: u64, worst: u64) -> Self {
        let similarity = if worst == 0 {
            1.0
        } else {
            1.0 - distance as f64 / worst as f64
        };
        Self {
            distance,
            similarity,
        }
    }
}

fn levenshtein(old: &[u8], new: &[u8]) -> u64 {
    let mut prev: Vec<u64> = (0..=new.len() as u64).collect();
    let mut curr = vec![0u64; new.len() + 1];
    for (i, a) in old.iter().enumerate() {
        curr[0] = i as u64 + 1;
        for (j, b) in new.iter().enumerate() {
            let substitution = prev[j] + u64::from(a != b);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[new.len()]
}
