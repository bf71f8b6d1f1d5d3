use chrono::{DateTime, Utc};

use hrdesk_core::domain::holiday::{national_holiday_years, national_holidays, Holiday, SEED_AUTHOR};

use crate::repositories::{HolidayRepository, RepositoryError};

/// Loads the built-in Japanese national holiday table. Loading twice is a no-op because
/// rows are keyed by date and name.
pub struct NationalHolidaySeed;

impl NationalHolidaySeed {
    /// Years present in the built-in table.
    pub fn years() -> Vec<i32> {
        national_holiday_years()
    }

    pub async fn load(
        repository: &dyn HolidayRepository,
        years: &[i32],
        now: DateTime<Utc>,
    ) -> Result<SeedResult, RepositoryError> {
        let mut years_seeded = Vec::with_capacity(years.len());

        for &year in years {
            let mut inserted = 0;
            let mut skipped = 0;
            for input in national_holidays(year) {
                let holiday = Holiday::create(input, SEED_AUTHOR, now)
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                if repository.insert_if_absent(&holiday).await? {
                    inserted += 1;
                } else {
                    skipped += 1;
                }
            }
            years_seeded.push(YearSeedInfo { year, inserted, skipped });
        }

        Ok(SeedResult { years_seeded })
    }

    /// Checks that every built-in holiday for `years` is stored.
    pub async fn verify(
        repository: &dyn HolidayRepository,
        years: &[i32],
    ) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for &year in years {
            let stored = repository.list_by_year(year).await?;
            for expected in national_holidays(year) {
                let present = stored
                    .iter()
                    .any(|holiday| holiday.date == expected.date && holiday.name == expected.name);
                checks.push((format!("{} {}", expected.date, expected.name), present));
            }
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub years_seeded: Vec<YearSeedInfo>,
}

impl SeedResult {
    pub fn inserted(&self) -> usize {
        self.years_seeded.iter().map(|info| info.inserted).sum()
    }

    pub fn skipped(&self) -> usize {
        self.years_seeded.iter().map(|info| info.skipped).sum()
    }
}

#[derive(Debug)]
pub struct YearSeedInfo {
    pub year: i32,
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}
