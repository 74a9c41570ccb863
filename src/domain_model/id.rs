use nanoid::nanoid;

const ALPHABET: [char; 32] = [
    '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'q', 'w', 'e', 'r', 't', 'y', 'u', 'p', 'a',
    's', 'd', 'f', 'g', 'h', 'k', 'z', 'x', 'c', 'v', 'b', 'n', 'm',
];

const LONG_ID_LEN: usize = 24;

/// Random 24-character identifier used for token IDs and OAuth states.
pub fn random_long_id() -> String {
    nanoid!(LONG_ID_LEN, &ALPHABET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn long_ids_use_alphabet_and_length() {
        let id = random_long_id();
        assert_eq!(id.len(), LONG_ID_LEN);
        assert!(id.chars().all(|c| ALPHABET.contains(&c)));
    }

    #[test]
    fn long_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| random_long_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
