//! Persona catalog
//!
//! Each persona is an instruction telling the model who to speak as. The
//! choice is driven by a generator seeded from the current UTC day, so a
//! given day and draw count always pick the same persona while different
//! days vary.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_PROMPTS: &[&str] = &[
    "Answer this message as a wise inquisitor from the Warhammer 40k universe, in no more than 50 words.",
    "Answer this as an ork from Warhammer 40k, in no more than 50 words.",
    "Answer this message as a Space Marine (Adeptus Astartes) from Warhammer 40k, in no more than 50 words.",
    "Answer as a clerk of the Imperial administration from Warhammer 40k, in no more than 50 words.",
    "Answer as a tech-priest of the Adeptus Mechanicus from Warhammer 40k, in no more than 50 words.",
    "Answer as an eldar from Warhammer 40k, in no more than 50 words.",
    "Answer as a Commissar of the Cadian Guard from Warhammer 40k, in no more than 50 words.",
    "Answer as a necron lord of immeasurable intellect from Warhammer 40k, in no more than 50 words.",
    "Answer as a tyranid driven by the Hive Mind from Warhammer 40k, in no more than 50 words.",
    "Answer as a Custodian Shield-Captain, defender of Terra, from Warhammer 40k, in no more than 50 words.",
    "Answer as a loyal servant of Magnus the Red of the Thousand Sons from Warhammer 40k, in no more than 50 words.",
    "Answer as a dead-tired and cynical Imperial Guardsman from the trenches of Vraks from Warhammer 40k, in no more than 50 words.",
    "Answer as a fanatical Sister Dialogus of the Order of Preachers from Warhammer 40k, in no more than 50 words.",
    "Answer as a cunning dark eldar archon from Commorragh from Warhammer 40k, in no more than 50 words.",
    "Answer as the legendary Jaghatai Khan, primarch of the White Scars, from Warhammer 40k, in no more than 50 words.",
    "Answer as a daemon-possessed servant of Chaos from Warhammer 40k, in no more than 50 words.",
    "Answer as a ritual servant of the Changer of Ways, Tzeentch, from Warhammer 40k, in no more than 50 words.",
    "Answer as a rough but direct Arbites enforcer from a hive world from Warhammer 40k, in no more than 50 words.",
    "Answer as a pampered and decadent commander of the T'au from Warhammer 40k, in no more than 50 words.",
    "Answer as the ancient and mighty Primarch Roboute Guilliman, Lord Commander of the Imperium, from Warhammer 40k, in no more than 50 words.",
    "Answer as a mad tech-heretic of the Dark Mechanicum from Warhammer 40k, in no more than 50 words.",
    "Answer this as a chaos cultist from Warhammer 40k, in no more than 50 words.",
];

/// The built-in persona list used when the config does not override it
pub fn default_prompts() -> Vec<String> {
    DEFAULT_PROMPTS.iter().map(|s| s.to_string()).collect()
}

/// Seed for a UTC day: the Unix timestamp of that day's midnight
pub fn day_seed(date: NaiveDate) -> u64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() as u64
}

/// Uniform index into a list of `len` items; `len` must be non-zero
pub fn pick_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    rng.gen_range(0..len)
}

/// Non-empty list of persona instructions
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    prompts: Vec<String>,
}

impl PersonaCatalog {
    pub fn new(prompts: Vec<String>) -> Result<Self> {
        if prompts.is_empty() {
            eyre::bail!("persona catalog can't be empty");
        }
        Ok(Self { prompts })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }
}

/// Source of the current UTC time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Picks personas from a catalog, reseeding whenever the UTC day changes
pub struct PersonaSelector<C: Clock = SystemClock> {
    catalog: PersonaCatalog,
    clock: C,
    seeded: Option<(NaiveDate, StdRng)>,
}

impl PersonaSelector<SystemClock> {
    pub fn new(catalog: PersonaCatalog) -> Self {
        Self::with_clock(catalog, SystemClock)
    }
}

impl<C: Clock> PersonaSelector<C> {
    pub fn with_clock(catalog: PersonaCatalog, clock: C) -> Self {
        Self {
            catalog,
            clock,
            seeded: None,
        }
    }

    /// Draw the next persona for today, returning its index and text
    pub fn select(&mut self) -> (usize, &str) {
        let today = self.clock.now().date_naive();

        if self.seeded.as_ref().is_some_and(|(day, _)| *day != today) {
            self.seeded = None;
        }
        let (_, rng) = self.seeded.get_or_insert_with(|| {
            log::debug!("Reseeding persona selection for {}", today);
            (today, StdRng::seed_from_u64(day_seed(today)))
        });

        let index = pick_index(rng, self.catalog.len());
        (index, &self.catalog.prompts[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedClock(Cell<DateTime<Utc>>);

    impl FixedClock {
        fn at(date: NaiveDate) -> Self {
            Self(Cell::new(date.and_hms_opt(12, 30, 0).unwrap().and_utc()))
        }

        fn set(&self, date: NaiveDate) {
            self.0.set(date.and_hms_opt(0, 0, 1).unwrap().and_utc());
        }
    }

    impl Clock for &FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> PersonaCatalog {
        PersonaCatalog::new(default_prompts()).unwrap()
    }

    fn draws(date: NaiveDate, count: usize) -> Vec<usize> {
        let clock = FixedClock::at(date);
        let mut selector = PersonaSelector::with_clock(catalog(), &clock);
        (0..count).map(|_| selector.select().0).collect()
    }

    #[test]
    fn test_day_seed_is_midnight_timestamp() {
        assert_eq!(day_seed(date(1970, 1, 1)), 0);
        assert_eq!(day_seed(date(1970, 1, 2)), 86_400);
        assert_eq!(day_seed(date(2024, 3, 15)), 1_710_460_800);
    }

    #[test]
    fn test_pick_index_is_deterministic_for_seed() {
        let mut a = StdRng::seed_from_u64(day_seed(date(2024, 3, 15)));
        let mut b = StdRng::seed_from_u64(day_seed(date(2024, 3, 15)));
        for _ in 0..10 {
            assert_eq!(pick_index(&mut a, 22), pick_index(&mut b, 22));
        }
    }

    #[test]
    fn test_pick_index_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for len in 1..30 {
            assert!(pick_index(&mut rng, len) < len);
        }
    }

    #[test]
    fn test_selection_reproducible_for_same_day() {
        assert_eq!(draws(date(2025, 6, 1), 8), draws(date(2025, 6, 1), 8));
    }

    #[test]
    fn test_selection_matches_pure_functions() {
        let day = date(2025, 6, 1);
        let mut rng = StdRng::seed_from_u64(day_seed(day));
        let expected: Vec<usize> = (0..5).map(|_| pick_index(&mut rng, DEFAULT_PROMPTS.len())).collect();
        assert_eq!(draws(day, 5), expected);
    }

    #[test]
    fn test_selection_varies_across_days() {
        let sequences: Vec<Vec<usize>> = (1..=10).map(|d| draws(date(2025, 6, d), 4)).collect();
        assert!(sequences.iter().any(|s| s != &sequences[0]));
    }

    #[test]
    fn test_reseeds_when_day_changes() {
        let clock = FixedClock::at(date(2025, 6, 1));
        let mut selector = PersonaSelector::with_clock(catalog(), &clock);
        selector.select();
        selector.select();

        clock.set(date(2025, 6, 2));
        let next_day: Vec<usize> = (0..3).map(|_| selector.select().0).collect();
        assert_eq!(next_day, draws(date(2025, 6, 2), 3));
    }

    #[test]
    fn test_selected_text_matches_index() {
        let clock = FixedClock::at(date(2025, 1, 1));
        let mut selector = PersonaSelector::with_clock(catalog(), &clock);
        let (index, text) = selector.select();
        assert_eq!(text, DEFAULT_PROMPTS[index]);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(PersonaCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_default_prompts_cap_length() {
        assert_eq!(default_prompts().len(), 22);
        assert!(default_prompts().iter().all(|p| p.contains("50 words")));
    }
}
