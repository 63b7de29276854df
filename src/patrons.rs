//! Patron identity capability. The tracker never stores patrons itself; it
//! only asks a registry whether an identifier is recognized.

use std::collections::HashSet;

use crate::config::PatronSettings;

pub trait PatronRegistry: Send + Sync {
    fn is_recognized(&self, patron_id: &str) -> bool;
}

/// Recognizes any library card number made of exactly `digits` ASCII digits.
#[derive(Debug, Clone)]
pub struct CardNumberRegistry {
    digits: usize,
}

impl CardNumberRegistry {
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }
}

impl Default for CardNumberRegistry {
    fn default() -> Self {
        Self::new(6)
    }
}

impl PatronRegistry for CardNumberRegistry {
    fn is_recognized(&self, patron_id: &str) -> bool {
        patron_id.len() == self.digits && patron_id.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Recognizes an explicit, closed set of identifiers.
#[derive(Debug, Clone, Default)]
pub struct AllowListRegistry {
    patrons: HashSet<String>,
}

impl AllowListRegistry {
    pub fn new<I, S>(patrons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patrons: patrons.into_iter().map(Into::into).collect(),
        }
    }
}

impl PatronRegistry for AllowListRegistry {
    fn is_recognized(&self, patron_id: &str) -> bool {
        self.patrons.contains(patron_id)
    }
}

/// Pick the registry described by the `[patrons]` config section.
pub fn registry_from_settings(settings: &PatronSettings) -> Box<dyn PatronRegistry> {
    if settings.allowed.is_empty() {
        Box::new(CardNumberRegistry::new(settings.card_digits))
    } else {
        Box::new(AllowListRegistry::new(settings.allowed.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_numbers_must_be_exact_length_digits() {
        let registry = CardNumberRegistry::default();
        assert!(registry.is_recognized("123456"));
        assert!(!registry.is_recognized("12345"));
        assert!(!registry.is_recognized("1234567"));
        assert!(!registry.is_recognized("12a456"));
        assert!(!registry.is_recognized(""));
    }

    #[test]
    fn allow_list_is_closed() {
        let registry = AllowListRegistry::new(["P1", "P2"]);
        assert!(registry.is_recognized("P1"));
        assert!(!registry.is_recognized("P3"));
    }

    #[test]
    fn settings_choose_the_registry() {
        let mut settings = PatronSettings::default();
        assert!(registry_from_settings(&settings).is_recognized("654321"));
        settings.allowed = vec!["ann".into()];
        let registry = registry_from_settings(&settings);
        assert!(registry.is_recognized("ann"));
        assert!(!registry.is_recognized("654321"));
    }
}
