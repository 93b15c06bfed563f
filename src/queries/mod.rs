//! Query module
//!
//! Read side: single entities, paginated listings with brief DTOs, and
//! the players of an aggregate. Queries never go through the command
//! gate and never emit events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::domain::{
    Challenge, Clan, ClanType, DomainError, EntityKey, PlayerChallenge, PlayerClan, PlayerWar,
    Region, War,
};
use crate::error::{AppError, AppResult};
use crate::store::{CancelSignal, EntityStore, PageRequest};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

// =========================================================================
// Pagination
// =========================================================================

/// `?page_number=&page_size=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
        }
    }

    /// Page number (from 1) and page size, clamped to the accepted range
    pub fn normalized(&self) -> (i64, i64) {
        let page_number = self.page_number.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page_number, page_size)
    }

    pub fn to_request(&self) -> PageRequest {
        let (page_number, page_size) = self.normalized();
        PageRequest {
            offset: (page_number - 1).saturating_mul(page_size),
            limit: page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub page_number: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> PaginatedList<T> {
    pub fn new(items: Vec<T>, total_count: i64, page_number: i64, page_size: i64) -> Self {
        let total_pages = (total_count + page_size - 1) / page_size;
        Self {
            items,
            page_number,
            total_pages,
            total_count,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }
}

// =========================================================================
// Brief DTOs
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClanBriefDto {
    pub id: i64,
    pub name: Option<String>,
    pub region: Option<Region>,
    #[serde(rename = "type")]
    pub clan_type: ClanType,
    pub total_trophies_to_enter: i64,
}

impl From<Clan> for ClanBriefDto {
    fn from(clan: Clan) -> Self {
        Self {
            id: clan.id,
            name: clan.name,
            region: clan.region,
            clan_type: clan.clan_type,
            total_trophies_to_enter: clan.total_trophies_to_enter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeBriefDto {
    pub id: i64,
    pub begin_day: DateTime<Utc>,
    pub bounty: i64,
    pub cost: i64,
    pub description: Option<String>,
    /// Duration in seconds
    pub duration: i64,
    pub max_looses: i64,
    pub min_level: i64,
    pub name: Option<String>,
}

impl From<Challenge> for ChallengeBriefDto {
    fn from(challenge: Challenge) -> Self {
        Self {
            id: challenge.id,
            begin_day: challenge.begin_day,
            bounty: challenge.bounty,
            cost: challenge.cost,
            description: challenge.description,
            duration: challenge.duration_secs,
            max_looses: challenge.max_looses,
            min_level: challenge.min_level,
            name: challenge.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarBriefDto {
    pub id: i64,
    pub begin_day: DateTime<Utc>,
    pub duration: i64,
    pub end_day: Option<DateTime<Utc>>,
}

impl From<War> for WarBriefDto {
    fn from(war: War) -> Self {
        Self {
            id: war.id,
            begin_day: war.begin_day,
            duration: war.duration_secs,
            end_day: war.ends_at(),
        }
    }
}

// =========================================================================
// Query service
// =========================================================================

fn found<A: Aggregate>(entity: Option<A>, id: i64) -> AppResult<A> {
    entity.ok_or_else(|| AppError::Domain(DomainError::not_found(A::kind(), EntityKey::Id(id))))
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntityStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn clan(&self, id: i64) -> AppResult<Clan> {
        found(self.store.find_clan(id, &CancelSignal::never()).await?, id)
    }

    pub async fn challenge(&self, id: i64) -> AppResult<Challenge> {
        found(self.store.find_challenge(id, &CancelSignal::never()).await?, id)
    }

    pub async fn war(&self, id: i64) -> AppResult<War> {
        found(self.store.find_war(id, &CancelSignal::never()).await?, id)
    }

    pub async fn clans(&self, params: PageParams) -> AppResult<PaginatedList<ClanBriefDto>> {
        let (page_number, page_size) = params.normalized();
        let page = self.store.list_clans(params.to_request()).await?;
        Ok(PaginatedList::new(
            page.items.into_iter().map(ClanBriefDto::from).collect(),
            page.total_count,
            page_number,
            page_size,
        ))
    }

    pub async fn challenges(
        &self,
        params: PageParams,
    ) -> AppResult<PaginatedList<ChallengeBriefDto>> {
        let (page_number, page_size) = params.normalized();
        let page = self.store.list_challenges(params.to_request()).await?;
        Ok(PaginatedList::new(
            page.items.into_iter().map(ChallengeBriefDto::from).collect(),
            page.total_count,
            page_number,
            page_size,
        ))
    }

    pub async fn wars(&self, params: PageParams) -> AppResult<PaginatedList<WarBriefDto>> {
        let (page_number, page_size) = params.normalized();
        let page = self.store.list_wars(params.to_request()).await?;
        Ok(PaginatedList::new(
            page.items.into_iter().map(WarBriefDto::from).collect(),
            page.total_count,
            page_number,
            page_size,
        ))
    }

    /// Members of a clan; `NotFound` when the clan does not exist
    pub async fn clan_players(&self, clan_id: i64) -> AppResult<Vec<PlayerClan>> {
        self.clan(clan_id).await?;
        Ok(self.store.list_clan_players(clan_id).await?)
    }

    pub async fn challenge_players(&self, challenge_id: i64) -> AppResult<Vec<PlayerChallenge>> {
        self.challenge(challenge_id).await?;
        Ok(self.store.list_challenge_players(challenge_id).await?)
    }

    pub async fn war_players(&self, war_id: i64) -> AppResult<Vec<PlayerWar>> {
        self.war(war_id).await?;
        Ok(self.store.list_war_players(war_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::WarFields;
    use crate::store::{MemoryStore, UnitOfWork};
    use chrono::TimeZone;

    #[test]
    fn test_page_params_defaults_and_clamping() {
        assert_eq!(PageParams::default().normalized(), (1, 10));
        assert_eq!(PageParams::new(0, 1000).normalized(), (1, 100));
        assert_eq!(PageParams::new(3, 0).normalized(), (3, 1));

        let request = PageParams::new(3, 20).to_request();
        assert_eq!(request, PageRequest { offset: 40, limit: 20 });
    }

    #[test]
    fn test_paginated_list_flags() {
        let list = PaginatedList::new(vec![1, 2], 12, 2, 5);
        assert_eq!(list.total_pages, 3);
        assert!(list.has_previous_page);
        assert!(list.has_next_page);

        let empty: PaginatedList<i32> = PaginatedList::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_challenge_brief_dto_serialization() {
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let dto = ChallengeBriefDto::from(Challenge {
            id: 4,
            name: Some("Sprint".to_string()),
            description: None,
            begin_day: begin,
            duration_secs: 60,
            bounty: 5,
            cost: 1,
            max_looses: 3,
            min_level: 2,
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["duration"], 60);
        assert_eq!(json["max_looses"], 3);
        assert_eq!(json["name"], "Sprint");
    }

    #[tokio::test]
    async fn test_wars_listing_and_lookup() {
        let store = Arc::new(MemoryStore::new());
        let begin = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let mut work = UnitOfWork::new();
        for id in 1..=3 {
            work.insert(War::create(id, WarFields::new(begin, 3600)).0);
        }
        store.save_all(work.changes(), &CancelSignal::never()).await.unwrap();

        let queries = QueryService::new(store);
        let page = queries.wars(PageParams::new(2, 2)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 3);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items[0].end_day, Some(begin + chrono::Duration::hours(1)));

        let err = queries.war(9).await.unwrap_err();
        assert_eq!(err.error_code(), "not_found");
        assert!(queries.war_players(9).await.is_err());
        assert!(queries.war_players(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wars_listing_survives_out_of_range_end() {
        let store = Arc::new(MemoryStore::new());

        // Row written by an older schema without the duration bound
        let mut work = UnitOfWork::new();
        work.insert(War {
            id: 1,
            begin_day: Utc::now(),
            duration_secs: 10_000_000_000_000,
        });
        store.save_all(work.changes(), &CancelSignal::never()).await.unwrap();

        let page = QueryService::new(store)
            .wars(PageParams::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].end_day, None);
    }
}
