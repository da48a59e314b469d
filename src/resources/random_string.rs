//! Random strings drawn from configurable character classes.

use crate::core::types::RandomStringArgs;
use rand::seq::SliceRandom;
use rand::Rng;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMERIC: &str = "0123456789";
/// Default special characters when no override is given.
pub const DEFAULT_SPECIAL: &str = "!@#$%&*()-_=+[]{}<>:?";

/// Upper bound on generated length.
pub const MAX_LENGTH: u32 = 4096;

/// One enabled character class with its minimum count.
struct Class {
    chars: Vec<char>,
    min: u32,
}

fn classes(args: &RandomStringArgs) -> Vec<Class> {
    let special = args.override_special.as_deref().unwrap_or(DEFAULT_SPECIAL);
    [
        (args.lower, LOWER, args.min_lower),
        (args.upper, UPPER, args.min_upper),
        (args.numeric, NUMERIC, args.min_numeric),
        (args.special, special, args.min_special),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| enabled.unwrap_or(true))
    .map(|(_, set, min)| Class {
        chars: set.chars().collect(),
        min: min.unwrap_or(0),
    })
    .filter(|c| !c.chars.is_empty())
    .collect()
}

/// Reject arguments the generator cannot honour.
pub fn check(args: &RandomStringArgs) -> Result<(), String> {
    if args.length == 0 {
        return Err("length must be at least 1".to_string());
    }
    if args.length > MAX_LENGTH {
        return Err(format!(
            "length must be at most {}, got {}",
            MAX_LENGTH, args.length
        ));
    }
    let enabled = classes(args);
    if enabled.is_empty() {
        return Err("at least one character class must be enabled".to_string());
    }
    let required: u64 = enabled.iter().map(|c| u64::from(c.min)).sum();
    if required > u64::from(args.length) {
        return Err(format!(
            "minimum character counts ({}) exceed length {}",
            required, args.length
        ));
    }
    Ok(())
}

/// Generate a string satisfying every class minimum; the rest is drawn from
/// the union of enabled classes, then the whole is shuffled.
pub fn generate<R: Rng + ?Sized>(args: &RandomStringArgs, rng: &mut R) -> String {
    let enabled = classes(args);
    let pool: Vec<char> = enabled.iter().flat_map(|c| c.chars.iter().copied()).collect();
    if pool.is_empty() {
        return String::new();
    }

    let length = args.length as usize;
    let mut out: Vec<char> = Vec::with_capacity(length);
    for class in &enabled {
        for _ in 0..class.min {
            if let Some(&c) = class.chars.choose(rng) {
                out.push(c);
            }
        }
    }
    while out.len() < length {
        if let Some(&c) = pool.choose(rng) {
            out.push(c);
        }
    }
    out.truncate(length);
    out.shuffle(rng);
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_length_sixty() {
        let s = generate(&RandomStringArgs::with_length(60), &mut rng());
        assert_eq!(s.chars().count(), 60);
    }

    #[test]
    fn test_only_numeric() {
        let args = RandomStringArgs {
            lower: Some(false),
            upper: Some(false),
            special: Some(false),
            ..RandomStringArgs::with_length(32)
        };
        let s = generate(&args, &mut rng());
        assert!(s.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_override_special() {
        let args = RandomStringArgs {
            lower: Some(false),
            upper: Some(false),
            numeric: Some(false),
            override_special: Some("~".to_string()),
            ..RandomStringArgs::with_length(8)
        };
        assert_eq!(generate(&args, &mut rng()), "~~~~~~~~");
    }

    #[test]
    fn test_check_rejects_bad_args() {
        assert!(check(&RandomStringArgs::with_length(0)).is_err());
        assert!(check(&RandomStringArgs::with_length(MAX_LENGTH + 1)).is_err());

        let none_enabled = RandomStringArgs {
            lower: Some(false),
            upper: Some(false),
            numeric: Some(false),
            special: Some(false),
            ..RandomStringArgs::with_length(8)
        };
        assert!(check(&none_enabled).unwrap_err().contains("character class"));

        let too_many = RandomStringArgs {
            min_upper: Some(5),
            min_numeric: Some(5),
            ..RandomStringArgs::with_length(8)
        };
        assert!(check(&too_many).unwrap_err().contains("exceed length"));
    }

    #[test]
    fn test_empty_override_special_disables_class() {
        let args = RandomStringArgs {
            lower: Some(false),
            upper: Some(false),
            numeric: Some(false),
            override_special: Some(String::new()),
            ..RandomStringArgs::with_length(8)
        };
        assert!(check(&args).is_err());
    }

    proptest! {
        #[test]
        fn prop_minimums_and_length_hold(
            length in 4u32..128,
            min_upper in 0u32..2,
            min_numeric in 0u32..2,
            seed in any::<u64>(),
        ) {
            let args = RandomStringArgs {
                min_upper: Some(min_upper),
                min_numeric: Some(min_numeric),
                special: Some(false),
                ..RandomStringArgs::with_length(length)
            };
            prop_assert!(check(&args).is_ok());
            let s = generate(&args, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(s.chars().count(), length as usize);
            let uppers = s.chars().filter(|c| c.is_ascii_uppercase()).count() as u32;
            let digits = s.chars().filter(|c| c.is_ascii_digit()).count() as u32;
            prop_assert!(uppers >= min_upper);
            prop_assert!(digits >= min_numeric);
            prop_assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
