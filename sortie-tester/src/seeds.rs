use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};

const DEFAULT_SEED: u64 = 1943;
/// Upper bound on seeds a single range token may expand to.
const MAX_RANGE_SEEDS: u64 = 10_000;

/// Resolve CLI seed tokens into numeric seeds, in order and without repeats.
///
/// Accepts literal integers (negative values use their magnitude),
/// `a..b` and `a..=b` ranges, and free-text phrases, which are hashed so the
/// same phrase always names the same campaign.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    let mut push = |seed: u64| {
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    };

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            push(value);
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            for seed in parse_range(token, start, end)? {
                push(seed);
            }
            continue;
        }

        if token.chars().any(char::is_alphabetic) {
            push(phrase_seed(token));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_range(token: &str, start: &str, end: &str) -> Result<Vec<u64>> {
    let (end, inclusive) = end
        .strip_prefix('=')
        .map_or((end, false), |rest| (rest, true));
    let start: u64 = start
        .parse()
        .with_context(|| format!("bad range start in seed token {token}"))?;
    let end: u64 = end
        .parse()
        .with_context(|| format!("bad range end in seed token {token}"))?;
    let end = if inclusive { end.saturating_add(1) } else { end };
    if end <= start {
        bail!("empty seed range: {token}");
    }
    if end - start > MAX_RANGE_SEEDS {
        bail!("seed range {token} expands to more than {MAX_RANGE_SEEDS} seeds");
    }
    Ok((start..end).collect())
}

/// First eight bytes of the phrase's SHA-256, big-endian.
pub fn phrase_seed(phrase: &str) -> u64 {
    let digest = Sha256::digest(phrase.trim().to_lowercase().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numbers_ranges_and_phrases() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "3..5", "8..=9", "42"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 3, 4, 8, 9]);

        let phrase = resolve_seed_inputs(&tokens(&["Operation Bagration"])).unwrap();
        assert_eq!(phrase, vec![phrase_seed("operation bagration")]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["5..2"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0..100000"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["1.5"])).is_err());
    }
}
