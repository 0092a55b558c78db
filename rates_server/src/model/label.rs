//! Random human-readable connection labels.
//!
//! Labels make logs easier to follow than bare socket addresses. They carry no identity:
//! two clients may well end up with the same name.
use rand::Rng;
use rand::seq::IndexedRandom;

const GIVEN: &[&str] = &[
    "Ada", "Boris", "Clara", "Dmytro", "Elena", "Felix", "Greta", "Hugo", "Iryna", "Jonas",
    "Katya", "Leo", "Marta", "Nina", "Oleh", "Petra", "Quinn", "Roman", "Sofia", "Taras",
];

const FAMILY: &[&str] = &[
    "Andersen", "Bondar", "Castillo", "Dubois", "Eriksen", "Fischer", "Garcia", "Horvat",
    "Ivanenko", "Jensen", "Kovalenko", "Lindqvist", "Moreau", "Novak", "Olsen", "Petrenko",
    "Rossi", "Shevchenko", "Tkachenko", "Weber",
];

/// Draw a "Given Family" label from `rng`.
pub fn random_label<R: Rng + ?Sized>(rng: &mut R) -> String {
    let given = GIVEN.choose(rng).copied().unwrap_or("Anonymous");
    let family = FAMILY.choose(rng).copied().unwrap_or("Client");
    format!("{given} {family}")
}

/// Draw a label from the thread-local generator.
pub fn next_label() -> String {
    random_label(&mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn label_is_two_known_words() {
        let label = random_label(&mut StdRng::seed_from_u64(7));
        let (given, family) = label.split_once(' ').unwrap();
        assert!(GIVEN.contains(&given));
        assert!(FAMILY.contains(&family));
    }

    #[test]
    fn seeded_generators_repeat() {
        let a = random_label(&mut StdRng::seed_from_u64(42));
        let b = random_label(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
