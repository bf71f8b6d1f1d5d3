use std::collections::HashMap;

use tokio::sync::RwLock;

use hrdesk_core::domain::holiday::{Holiday, HolidayId};
use hrdesk_core::domain::ringi::{FinalStatus, RingiDocument, RingiId};
use hrdesk_core::ringi::{projections, RequestScope, StatusCounts};

use super::{HolidayRepository, RepositoryError, RingiRepository};

#[derive(Default)]
pub struct InMemoryRingiRepository {
    documents: RwLock<HashMap<String, RingiDocument>>,
}

#[async_trait::async_trait]
impl RingiRepository for InMemoryRingiRepository {
    async fn find_by_id(&self, id: &RingiId) -> Result<Option<RingiDocument>, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&id.0).cloned())
    }

    async fn insert(&self, document: &RingiDocument) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id.0) {
            return Err(RepositoryError::Duplicate {
                entity: "ringi",
                detail: document.id.0.clone(),
            });
        }
        documents.insert(document.id.0.clone(), document.clone());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_revision: i64,
        document: &RingiDocument,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        let stored = documents.get_mut(&document.id.0).ok_or_else(|| RepositoryError::NotFound {
            entity: "ringi",
            id: document.id.0.clone(),
        })?;
        if stored.revision != expected_revision || stored.final_status != FinalStatus::Pending {
            return Err(RepositoryError::Conflict { entity: "ringi", id: document.id.0.clone() });
        }
        *stored = document.clone();
        Ok(())
    }

    async fn list(
        &self,
        scope: &RequestScope,
        status: Option<FinalStatus>,
    ) -> Result<Vec<RingiDocument>, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(projections::filter_by_status(documents.values().cloned().collect(), status, scope))
    }

    async fn pending_for_approver(
        &self,
        email: &str,
    ) -> Result<Vec<RingiDocument>, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(projections::pending_for_approver(documents.values().cloned().collect(), email))
    }

    async fn count_by_status(&self, scope: &RequestScope) -> Result<StatusCounts, RepositoryError> {
        let documents = self.documents.read().await;
        Ok(projections::count_by_status(documents.values(), scope))
    }
}

#[derive(Default)]
pub struct InMemoryHolidayRepository {
    holidays: RwLock<HashMap<String, Holiday>>,
}

impl InMemoryHolidayRepository {
    fn clashes(holidays: &HashMap<String, Holiday>, holiday: &Holiday) -> bool {
        holidays.values().any(|existing| {
            existing.id != holiday.id && existing.date == holiday.date && existing.name == holiday.name
        })
    }
}

#[async_trait::async_trait]
impl HolidayRepository for InMemoryHolidayRepository {
    async fn list_by_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError> {
        let holidays = self.holidays.read().await;
        let mut listed: Vec<_> =
            holidays.values().filter(|holiday| holiday.year == year).cloned().collect();
        listed.sort_by(|left, right| left.date.cmp(&right.date).then_with(|| left.name.cmp(&right.name)));
        Ok(listed)
    }

    async fn find_by_id(&self, id: &HolidayId) -> Result<Option<Holiday>, RepositoryError> {
        let holidays = self.holidays.read().await;
        Ok(holidays.get(&id.0).cloned())
    }

    async fn insert(&self, holiday: &Holiday) -> Result<(), RepositoryError> {
        if self.insert_if_absent(holiday).await? {
            Ok(())
        } else {
            Err(RepositoryError::Duplicate {
                entity: "holiday",
                detail: format!("{} on {}", holiday.name, holiday.date),
            })
        }
    }

    async fn insert_if_absent(&self, holiday: &Holiday) -> Result<bool, RepositoryError> {
        let mut holidays = self.holidays.write().await;
        if Self::clashes(&holidays, holiday) || holidays.contains_key(&holiday.id.0) {
            return Ok(false);
        }
        holidays.insert(holiday.id.0.clone(), holiday.clone());
        Ok(true)
    }

    async fn update(&self, holiday: &Holiday) -> Result<(), RepositoryError> {
        let mut holidays = self.holidays.write().await;
        if !holidays.contains_key(&holiday.id.0) {
            return Err(RepositoryError::NotFound { entity: "holiday", id: holiday.id.0.clone() });
        }
        if Self::clashes(&holidays, holiday) {
            return Err(RepositoryError::Duplicate {
                entity: "holiday",
                detail: format!("{} on {}", holiday.name, holiday.date),
            });
        }
        holidays.insert(holiday.id.0.clone(), holiday.clone());
        Ok(())
    }

    async fn delete(&self, id: &HolidayId) -> Result<bool, RepositoryError> {
        let mut holidays = self.holidays.write().await;
        Ok(holidays.remove(&id.0).is_some())
    }

    async fn count_for_year(&self, year: i32) -> Result<i64, RepositoryError> {
        let holidays = self.holidays.read().await;
        Ok(holidays.values().filter(|holiday| holiday.year == year).count() as i64)
    }
}
