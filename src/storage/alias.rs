//! Random alias generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Returns a random alias of `len` characters drawn from `[a-zA-Z0-9]`.
pub fn random_alias<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Number of distinct generated aliases of length `len`, `None` past `u64`.
pub fn alias_space(len: usize) -> Option<u64> {
    u32::try_from(len).ok().and_then(|len| 62u64.checked_pow(len))
}

/// Whether `alias` could have come out of [`random_alias`] with length `len`.
pub fn in_alias_space(alias: &str, len: usize) -> bool {
    alias.len() == len && alias.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Generates aliases until `taken` reports one as free.
///
/// Loops forever if every alias of length `len` is taken; callers check
/// [`alias_space`] first.
pub fn unique_alias<R, F>(rng: &mut R, len: usize, mut taken: F) -> String
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> bool,
{
    loop {
        let alias = random_alias(rng, len);
        if !taken(&alias) {
            return alias;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [1, 6, 32] {
            let alias = random_alias(&mut rng, len);
            assert_eq!(alias.len(), len);
            assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_unique_alias_retries_on_collision() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut attempts = 0;

        let alias = unique_alias(&mut rng, 6, |_| {
            attempts += 1;
            attempts < 4
        });

        assert_eq!(attempts, 4);
        assert_eq!(alias.len(), 6);
    }

    #[test]
    fn test_alias_space() {
        assert_eq!(alias_space(1), Some(62));
        assert_eq!(alias_space(2), Some(62 * 62));
        assert_eq!(alias_space(6), Some(56_800_235_584));
        assert_eq!(alias_space(11), None);

        assert!(in_alias_space("aZ9", 3));
        assert!(!in_alias_space("a-9", 3));
        assert!(!in_alias_space("abcd", 3));
    }
}
