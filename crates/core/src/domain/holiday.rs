use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

pub const SEED_AUTHOR: &str = "system";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolidayId(pub String);

impl HolidayId {
    pub fn generate() -> Self {
        Self(format!("HOL-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    National,
    Substitute,
    #[default]
    Company,
}

impl HolidayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::National => "national",
            Self::Substitute => "substitute",
            Self::Company => "company",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "national" => Some(Self::National),
            "substitute" => Some(Self::Substitute),
            "company" => Some(Self::Company),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub id: HolidayId,
    pub date: NaiveDate,
    pub name: String,
    pub kind: HolidayKind,
    pub description: String,
    pub year: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayInput {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub kind: HolidayKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl Holiday {
    pub fn create(
        input: HolidayInput,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = validate_name(&input.name)?;
        Ok(Self {
            id: HolidayId::generate(),
            date: input.date,
            name,
            kind: input.kind,
            description: input.description.unwrap_or_default(),
            year: input.date.year(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, input: HolidayInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.name = validate_name(&input.name)?;
        self.date = input.date;
        self.year = input.date.year();
        self.kind = input.kind;
        self.description = input.description.unwrap_or_default();
        self.updated_at = now;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("holiday name is required".to_string()));
    }
    Ok(name.to_string())
}

type Entry = (i32, u32, u32, &'static str, HolidayKind);

const NATIONAL: HolidayKind = HolidayKind::National;
const SUBSTITUTE: HolidayKind = HolidayKind::Substitute;

const JAPANESE_HOLIDAYS: &[Entry] = &[
    (2024, 1, 1, "元日", NATIONAL),
    (2024, 1, 8, "成人の日", NATIONAL),
    (2024, 2, 11, "建国記念の日", NATIONAL),
    (2024, 2, 12, "振替休日", SUBSTITUTE),
    (2024, 2, 23, "天皇誕生日", NATIONAL),
    (2024, 3, 20, "春分の日", NATIONAL),
    (2024, 4, 29, "昭和の日", NATIONAL),
    (2024, 5, 3, "憲法記念日", NATIONAL),
    (2024, 5, 4, "みどりの日", NATIONAL),
    (2024, 5, 5, "こどもの日", NATIONAL),
    (2024, 5, 6, "振替休日", SUBSTITUTE),
    (2024, 7, 15, "海の日", NATIONAL),
    (2024, 8, 11, "山の日", NATIONAL),
    (2024, 8, 12, "振替休日", SUBSTITUTE),
    (2024, 9, 16, "敬老の日", NATIONAL),
    (2024, 9, 22, "秋分の日", NATIONAL),
    (2024, 9, 23, "振替休日", SUBSTITUTE),
    (2024, 10, 14, "スポーツの日", NATIONAL),
    (2024, 11, 3, "文化の日", NATIONAL),
    (2024, 11, 4, "振替休日", SUBSTITUTE),
    (2024, 11, 23, "勤労感謝の日", NATIONAL),
    (2025, 1, 1, "元日", NATIONAL),
    (2025, 1, 13, "成人の日", NATIONAL),
    (2025, 2, 11, "建国記念の日", NATIONAL),
    (2025, 2, 23, "天皇誕生日", NATIONAL),
    (2025, 2, 24, "振替休日", SUBSTITUTE),
    (2025, 3, 20, "春分の日", NATIONAL),
    (2025, 4, 29, "昭和の日", NATIONAL),
    (2025, 5, 3, "憲法記念日", NATIONAL),
    (2025, 5, 4, "みどりの日", NATIONAL),
    (2025, 5, 5, "こどもの日", NATIONAL),
    (2025, 5, 6, "振替休日", SUBSTITUTE),
    (2025, 7, 21, "海の日", NATIONAL),
    (2025, 8, 11, "山の日", NATIONAL),
    (2025, 9, 15, "敬老の日", NATIONAL),
    (2025, 9, 23, "秋分の日", NATIONAL),
    (2025, 10, 13, "スポーツの日", NATIONAL),
    (2025, 11, 3, "文化の日", NATIONAL),
    (2025, 11, 23, "勤労感謝の日", NATIONAL),
    (2025, 11, 24, "振替休日", SUBSTITUTE),
    (2026, 1, 1, "元日", NATIONAL),
    (2026, 1, 12, "成人の日", NATIONAL),
    (2026, 2, 11, "建国記念の日", NATIONAL),
    (2026, 2, 23, "天皇誕生日", NATIONAL),
    (2026, 3, 20, "春分の日", NATIONAL),
    (2026, 4, 29, "昭和の日", NATIONAL),
    (2026, 5, 3, "憲法記念日", NATIONAL),
    (2026, 5, 4, "みどりの日", NATIONAL),
    (2026, 5, 5, "こどもの日", NATIONAL),
    (2026, 5, 6, "振替休日", SUBSTITUTE),
    (2026, 7, 20, "海の日", NATIONAL),
    (2026, 8, 11, "山の日", NATIONAL),
    (2026, 9, 21, "敬老の日", NATIONAL),
    (2026, 9, 22, "国民の休日", NATIONAL),
    (2026, 9, 23, "秋分の日", NATIONAL),
    (2026, 10, 12, "スポーツの日", NATIONAL),
    (2026, 11, 3, "文化の日", NATIONAL),
    (2026, 11, 23, "勤労感謝の日", NATIONAL),
];

/// Years covered by the built-in national holiday table.
pub fn national_holiday_years() -> Vec<i32> {
    let mut years: Vec<i32> = JAPANESE_HOLIDAYS.iter().map(|entry| entry.0).collect();
    years.dedup();
    years
}

/// Built-in Japanese national and substitute holidays for `year`, in date order.
pub fn national_holidays(year: i32) -> Vec<HolidayInput> {
    JAPANESE_HOLIDAYS
        .iter()
        .filter(|entry| entry.0 == year)
        .filter_map(|&(y, m, d, name, kind)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|date| HolidayInput {
                date,
                name: name.to_string(),
                kind,
                description: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Utc};

    use super::{national_holiday_years, national_holidays, Holiday, HolidayInput, HolidayKind};

    #[test]
    fn table_covers_each_year_in_order() {
        assert_eq!(national_holiday_years(), vec![2024, 2025, 2026]);
        for year in national_holiday_years() {
            let holidays = national_holidays(year);
            assert!(holidays.len() >= 16, "year {year} has {} entries", holidays.len());
            assert!(holidays.iter().all(|holiday| holiday.date.year() == year));
            assert!(holidays.windows(2).all(|pair| pair[0].date < pair[1].date));
        }
        assert!(national_holidays(2019).is_empty());
    }

    #[test]
    fn substitute_days_are_tagged() {
        let substitute = national_holidays(2025)
            .into_iter()
            .filter(|holiday| holiday.kind == HolidayKind::Substitute)
            .map(|holiday| holiday.date)
            .collect::<Vec<_>>();
        assert_eq!(
            substitute,
            vec![
                NaiveDate::from_ymd_opt(2025, 2, 24).expect("date"),
                NaiveDate::from_ymd_opt(2025, 5, 6).expect("date"),
                NaiveDate::from_ymd_opt(2025, 11, 24).expect("date"),
            ]
        );
    }

    #[test]
    fn created_holiday_derives_year_from_date() {
        let holiday = Holiday::create(
            HolidayInput {
                date: NaiveDate::from_ymd_opt(2025, 12, 30).expect("date"),
                name: " 年末休暇 ".to_string(),
                kind: HolidayKind::Company,
                description: None,
            },
            "admin@example.co.jp",
            Utc::now(),
        )
        .expect("create");

        assert_eq!(holiday.year, 2025);
        assert_eq!(holiday.name, "年末休暇");
        assert_eq!(holiday.description, "");
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = Holiday::create(
            HolidayInput {
                date: NaiveDate::from_ymd_opt(2025, 12, 30).expect("date"),
                name: "  ".to_string(),
                kind: HolidayKind::Company,
                description: None,
            },
            "admin@example.co.jp",
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
