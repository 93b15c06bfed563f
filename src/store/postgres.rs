//! PostgreSQL Entity Store
//!
//! Each `save_all` runs in one transaction; dropping the transaction
//! before commit rolls every staged change back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{
    Challenge, Clan, ClanRole, ClanType, EntityKind, PlayerChallenge, PlayerClan, PlayerWar,
    Region, War,
};

use super::{
    CancelSignal, Change, EntityStore, Page, PageRequest, Record, RecordKey, StoreError,
};

type ClanRow = (i64, Option<String>, Option<String>, Option<String>, i64, i64, String);
type ChallengeRow = (
    i64,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    i64,
    i64,
    i64,
    i64,
    i64,
);
type WarRow = (i64, DateTime<Utc>, i64);

const CLAN_COLUMNS: &str = "id, name, description, region, total_trophies_to_enter, total_trophies_won_on_war, clan_type";
const CHALLENGE_COLUMNS: &str =
    "id, name, description, begin_day, duration_secs, bounty, cost, max_looses, min_level";
const WAR_COLUMNS: &str = "id, begin_day, duration_secs";

fn clan_from_row(row: ClanRow) -> Result<Clan, StoreError> {
    let (id, name, description, region, total_trophies_to_enter, total_trophies_won_on_war, clan_type) =
        row;

    let region = region
        .map(|code| Region::new(&code))
        .transpose()
        .map_err(|e| StoreError::InvalidRow(e.to_string()))?;
    let clan_type: ClanType = clan_type.parse().map_err(StoreError::InvalidRow)?;

    Ok(Clan {
        id,
        name,
        description,
        region,
        total_trophies_to_enter,
        total_trophies_won_on_war,
        clan_type,
    })
}

fn challenge_from_row(row: ChallengeRow) -> Challenge {
    let (id, name, description, begin_day, duration_secs, bounty, cost, max_looses, min_level) = row;
    Challenge {
        id,
        name,
        description,
        begin_day,
        duration_secs,
        bounty,
        cost,
        max_looses,
        min_level,
    }
}

fn war_from_row((id, begin_day, duration_secs): WarRow) -> War {
    War {
        id,
        begin_day,
        duration_secs,
    }
}

fn player_clan_from_row(
    (clan_id, player_id, role): (i64, i64, String),
) -> Result<PlayerClan, StoreError> {
    Ok(PlayerClan {
        clan_id,
        player_id,
        role: role.parse::<ClanRole>().map_err(StoreError::InvalidRow)?,
    })
}

fn sequence_for(kind: EntityKind) -> Result<&'static str, StoreError> {
    match kind {
        EntityKind::Clan => Ok("clans_id_seq"),
        EntityKind::Challenge => Ok("challenges_id_seq"),
        EntityKind::War => Ok("wars_id_seq"),
        other => Err(StoreError::Unavailable(format!(
            "{} rows are keyed by their parent and player",
            other
        ))),
    }
}

/// Entity store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        change: &Change,
    ) -> Result<(), StoreError> {
        let rows_affected = match change {
            Change::Insert(record) => self.insert(tx, record).await?,
            Change::Update(record) => self.update(tx, record).await?,
            Change::Delete(key) => self.delete(tx, *key).await?,
        };

        if rows_affected == 0 {
            let (kind, key) = match change {
                Change::Insert(record) | Change::Update(record) => {
                    (record.kind(), record.record_key().entity_key())
                }
                Change::Delete(key) => (key.kind(), key.entity_key()),
            };
            return Err(StoreError::Conflict(format!("{} {} no longer exists", kind, key)));
        }
        Ok(())
    }

    async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &Record,
    ) -> Result<u64, StoreError> {
        let result = match record {
            Record::Clan(clan) => {
                sqlx::query(
                    r#"
                    INSERT INTO clans (id, name, description, region, total_trophies_to_enter, total_trophies_won_on_war, clan_type)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(clan.id)
                .bind(&clan.name)
                .bind(&clan.description)
                .bind(clan.region.as_ref().map(Region::code))
                .bind(clan.total_trophies_to_enter)
                .bind(clan.total_trophies_won_on_war)
                .bind(clan.clan_type.as_str())
                .execute(&mut **tx)
                .await
            }
            Record::Challenge(challenge) => {
                sqlx::query(
                    r#"
                    INSERT INTO challenges (id, name, description, begin_day, duration_secs, bounty, cost, max_looses, min_level)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(challenge.id)
                .bind(&challenge.name)
                .bind(&challenge.description)
                .bind(challenge.begin_day)
                .bind(challenge.duration_secs)
                .bind(challenge.bounty)
                .bind(challenge.cost)
                .bind(challenge.max_looses)
                .bind(challenge.min_level)
                .execute(&mut **tx)
                .await
            }
            Record::War(war) => {
                sqlx::query("INSERT INTO wars (id, begin_day, duration_secs) VALUES ($1, $2, $3)")
                    .bind(war.id)
                    .bind(war.begin_day)
                    .bind(war.duration_secs)
                    .execute(&mut **tx)
                    .await
            }
            Record::PlayerClan(row) => {
                sqlx::query("INSERT INTO player_clans (clan_id, player_id, role) VALUES ($1, $2, $3)")
                    .bind(row.clan_id)
                    .bind(row.player_id)
                    .bind(row.role.as_str())
                    .execute(&mut **tx)
                    .await
            }
            Record::PlayerChallenge(row) => {
                sqlx::query(
                    "INSERT INTO player_challenges (challenge_id, player_id, won_trophies) VALUES ($1, $2, $3)",
                )
                .bind(row.challenge_id)
                .bind(row.player_id)
                .bind(row.won_trophies)
                .execute(&mut **tx)
                .await
            }
            Record::PlayerWar(row) => {
                sqlx::query(
                    "INSERT INTO player_wars (war_id, player_id, won_trophies) VALUES ($1, $2, $3)",
                )
                .bind(row.war_id)
                .bind(row.player_id)
                .bind(row.won_trophies)
                .execute(&mut **tx)
                .await
            }
        };

        Ok(result.map_err(StoreError::from_database)?.rows_affected())
    }

    async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &Record,
    ) -> Result<u64, StoreError> {
        let result = match record {
            Record::Clan(clan) => {
                sqlx::query(
                    r#"
                    UPDATE clans
                    SET name = $2, description = $3, region = $4,
                        total_trophies_to_enter = $5, total_trophies_won_on_war = $6, clan_type = $7
                    WHERE id = $1
                    "#,
                )
                .bind(clan.id)
                .bind(&clan.name)
                .bind(&clan.description)
                .bind(clan.region.as_ref().map(Region::code))
                .bind(clan.total_trophies_to_enter)
                .bind(clan.total_trophies_won_on_war)
                .bind(clan.clan_type.as_str())
                .execute(&mut **tx)
                .await
            }
            Record::Challenge(challenge) => {
                sqlx::query(
                    r#"
                    UPDATE challenges
                    SET name = $2, description = $3, begin_day = $4, duration_secs = $5,
                        bounty = $6, cost = $7, max_looses = $8, min_level = $9
                    WHERE id = $1
                    "#,
                )
                .bind(challenge.id)
                .bind(&challenge.name)
                .bind(&challenge.description)
                .bind(challenge.begin_day)
                .bind(challenge.duration_secs)
                .bind(challenge.bounty)
                .bind(challenge.cost)
                .bind(challenge.max_looses)
                .bind(challenge.min_level)
                .execute(&mut **tx)
                .await
            }
            Record::War(war) => {
                sqlx::query("UPDATE wars SET begin_day = $2, duration_secs = $3 WHERE id = $1")
                    .bind(war.id)
                    .bind(war.begin_day)
                    .bind(war.duration_secs)
                    .execute(&mut **tx)
                    .await
            }
            Record::PlayerClan(row) => {
                sqlx::query("UPDATE player_clans SET role = $3 WHERE clan_id = $1 AND player_id = $2")
                    .bind(row.clan_id)
                    .bind(row.player_id)
                    .bind(row.role.as_str())
                    .execute(&mut **tx)
                    .await
            }
            Record::PlayerChallenge(row) => {
                sqlx::query(
                    "UPDATE player_challenges SET won_trophies = $3 WHERE challenge_id = $1 AND player_id = $2",
                )
                .bind(row.challenge_id)
                .bind(row.player_id)
                .bind(row.won_trophies)
                .execute(&mut **tx)
                .await
            }
            Record::PlayerWar(row) => {
                sqlx::query(
                    "UPDATE player_wars SET won_trophies = $3 WHERE war_id = $1 AND player_id = $2",
                )
                .bind(row.war_id)
                .bind(row.player_id)
                .bind(row.won_trophies)
                .execute(&mut **tx)
                .await
            }
        };

        Ok(result.map_err(StoreError::from_database)?.rows_affected())
    }

    /// Relation rows of a deleted aggregate go with it (ON DELETE CASCADE)
    async fn delete(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        key: RecordKey,
    ) -> Result<u64, StoreError> {
        let result = match key {
            RecordKey::Clan(id) => {
                sqlx::query("DELETE FROM clans WHERE id = $1")
                    .bind(id)
                    .execute(&mut **tx)
                    .await
            }
            RecordKey::Challenge(id) => {
                sqlx::query("DELETE FROM challenges WHERE id = $1")
                    .bind(id)
                    .execute(&mut **tx)
                    .await
            }
            RecordKey::War(id) => {
                sqlx::query("DELETE FROM wars WHERE id = $1")
                    .bind(id)
                    .execute(&mut **tx)
                    .await
            }
            RecordKey::PlayerClan(clan_id, player_id) => {
                sqlx::query("DELETE FROM player_clans WHERE clan_id = $1 AND player_id = $2")
                    .bind(clan_id)
                    .bind(player_id)
                    .execute(&mut **tx)
                    .await
            }
            RecordKey::PlayerChallenge(challenge_id, player_id) => {
                sqlx::query(
                    "DELETE FROM player_challenges WHERE challenge_id = $1 AND player_id = $2",
                )
                .bind(challenge_id)
                .bind(player_id)
                .execute(&mut **tx)
                .await
            }
            RecordKey::PlayerWar(war_id, player_id) => {
                sqlx::query("DELETE FROM player_wars WHERE war_id = $1 AND player_id = $2")
                    .bind(war_id)
                    .bind(player_id)
                    .execute(&mut **tx)
                    .await
            }
        };

        Ok(result.map_err(StoreError::from_database)?.rows_affected())
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn next_id(&self, kind: EntityKind, cancel: &CancelSignal) -> Result<i64, StoreError> {
        cancel.check()?;
        let sequence = sequence_for(kind)?;
        let id: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
            .bind(sequence)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_clan(&self, id: i64, cancel: &CancelSignal) -> Result<Option<Clan>, StoreError> {
        cancel.check()?;
        let row: Option<ClanRow> =
            sqlx::query_as(&format!("SELECT {} FROM clans WHERE id = $1", CLAN_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(clan_from_row).transpose()
    }

    async fn find_challenge(
        &self,
        id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<Challenge>, StoreError> {
        cancel.check()?;
        let row: Option<ChallengeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM challenges WHERE id = $1",
            CHALLENGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(challenge_from_row))
    }

    async fn find_war(&self, id: i64, cancel: &CancelSignal) -> Result<Option<War>, StoreError> {
        cancel.check()?;
        let row: Option<WarRow> =
            sqlx::query_as(&format!("SELECT {} FROM wars WHERE id = $1", WAR_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(war_from_row))
    }

    async fn find_player_clan(
        &self,
        clan_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError> {
        cancel.check()?;
        let row: Option<(i64, i64, String)> = sqlx::query_as(
            "SELECT clan_id, player_id, role FROM player_clans WHERE clan_id = $1 AND player_id = $2",
        )
        .bind(clan_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(player_clan_from_row).transpose()
    }

    async fn find_player_challenge(
        &self,
        challenge_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerChallenge>, StoreError> {
        cancel.check()?;
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT challenge_id, player_id, won_trophies
            FROM player_challenges
            WHERE challenge_id = $1 AND player_id = $2
            "#,
        )
        .bind(challenge_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(challenge_id, player_id, won_trophies)| PlayerChallenge {
            challenge_id,
            player_id,
            won_trophies,
        }))
    }

    async fn find_player_war(
        &self,
        war_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerWar>, StoreError> {
        cancel.check()?;
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            "SELECT war_id, player_id, won_trophies FROM player_wars WHERE war_id = $1 AND player_id = $2",
        )
        .bind(war_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(war_id, player_id, won_trophies)| PlayerWar {
            war_id,
            player_id,
            won_trophies,
        }))
    }

    async fn find_clan_chief(
        &self,
        clan_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError> {
        cancel.check()?;
        let row: Option<(i64, i64, String)> = sqlx::query_as(
            "SELECT clan_id, player_id, role FROM player_clans WHERE clan_id = $1 AND role = 'chief'",
        )
        .bind(clan_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(player_clan_from_row).transpose()
    }

    async fn save_all(&self, changes: &[Change], cancel: &CancelSignal) -> Result<(), StoreError> {
        cancel.check()?;

        let mut tx = self.pool.begin().await?;
        for change in changes {
            self.apply(&mut tx, change).await?;
            cancel.check()?;
        }

        // Last point at which cancellation can still roll the work back
        cancel.check()?;
        tx.commit().await?;

        tracing::debug!(changes = changes.len(), "Unit of work committed");
        Ok(())
    }

    async fn list_clans(&self, page: PageRequest) -> Result<Page<Clan>, StoreError> {
        let rows: Vec<ClanRow> = sqlx::query_as(&format!(
            "SELECT {} FROM clans ORDER BY id LIMIT $1 OFFSET $2",
            CLAN_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clans")
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(clan_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total_count })
    }

    async fn list_challenges(&self, page: PageRequest) -> Result<Page<Challenge>, StoreError> {
        let rows: Vec<ChallengeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM challenges ORDER BY id LIMIT $1 OFFSET $2",
            CHALLENGE_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM challenges")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(challenge_from_row).collect(),
            total_count,
        })
    }

    async fn list_wars(&self, page: PageRequest) -> Result<Page<War>, StoreError> {
        let rows: Vec<WarRow> = sqlx::query_as(&format!(
            "SELECT {} FROM wars ORDER BY id LIMIT $1 OFFSET $2",
            WAR_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wars")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(war_from_row).collect(),
            total_count,
        })
    }

    async fn list_clan_players(&self, clan_id: i64) -> Result<Vec<PlayerClan>, StoreError> {
        let rows: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT clan_id, player_id, role FROM player_clans WHERE clan_id = $1 ORDER BY player_id",
        )
        .bind(clan_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(player_clan_from_row).collect()
    }

    async fn list_challenge_players(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<PlayerChallenge>, StoreError> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT challenge_id, player_id, won_trophies
            FROM player_challenges
            WHERE challenge_id = $1
            ORDER BY player_id
            "#,
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(challenge_id, player_id, won_trophies)| PlayerChallenge {
                challenge_id,
                player_id,
                won_trophies,
            })
            .collect())
    }

    async fn list_war_players(&self, war_id: i64) -> Result<Vec<PlayerWar>, StoreError> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT war_id, player_id, won_trophies FROM player_wars WHERE war_id = $1 ORDER BY player_id",
        )
        .bind(war_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(war_id, player_id, won_trophies)| PlayerWar {
                war_id,
                player_id,
                won_trophies,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clan_from_row() {
        let row: ClanRow = (
            1,
            Some("Barbarians".to_string()),
            None,
            Some("se".to_string()),
            3000,
            12,
            "invite_only".to_string(),
        );

        let clan = clan_from_row(row).unwrap();
        assert_eq!(clan.region.unwrap().code(), "SE");
        assert_eq!(clan.clan_type, ClanType::InviteOnly);
    }

    #[test]
    fn test_clan_from_row_rejects_unknown_type() {
        let row: ClanRow = (1, None, None, None, 0, 0, "secret".to_string());
        assert!(matches!(clan_from_row(row), Err(StoreError::InvalidRow(_))));
    }

    #[test]
    fn test_relation_rows_have_no_sequence() {
        assert_eq!(sequence_for(EntityKind::War).unwrap(), "wars_id_seq");
        assert!(sequence_for(EntityKind::PlayerWar).is_err());
    }
}
