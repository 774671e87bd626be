use chrono::{NaiveDate, Utc};
use colored::*;
use eyre::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::PersonaAction;
use crate::config::Config;
use crate::relay::PersonaCatalog;
use crate::relay::persona::{day_seed, pick_index};

pub fn run(action: PersonaAction, config: &Config) -> Result<()> {
    let catalog = PersonaCatalog::new(config.prompts.clone())?;

    match action {
        PersonaAction::List => {
            for (i, prompt) in catalog.iter().enumerate() {
                println!("{:>3}  {}", i.to_string().cyan(), prompt);
            }
        }
        PersonaAction::Pick { date, draws } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            println!("{} {} (seed {})", "Personas for".bold(), date, day_seed(date));
            for (draw, index) in picks(&catalog, date, draws).into_iter().enumerate() {
                let prompt = catalog.get(index).unwrap_or_default();
                println!("{:>3}  [{}] {}", draw.to_string().dimmed(), index.to_string().cyan(), prompt);
            }
        }
    }

    Ok(())
}

/// Indices the relay would pick for the first `draws` replies of `date`
fn picks(catalog: &PersonaCatalog, date: NaiveDate, draws: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(day_seed(date));
    (0..draws).map(|_| pick_index(&mut rng, catalog.len())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_are_reproducible() {
        let catalog = PersonaCatalog::new(crate::relay::persona::default_prompts()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let first = picks(&catalog, date, 5);
        assert_eq!(first.len(), 5);
        assert_eq!(first, picks(&catalog, date, 5));
        assert!(first.iter().all(|&i| i < catalog.len()));
    }

    #[test]
    fn test_single_persona_always_zero() {
        let catalog = PersonaCatalog::new(vec!["only one".to_string()]).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(picks(&catalog, date, 3), vec![0, 0, 0]);
    }
}
