use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite, Transaction};
use uuid::Uuid;

use flota_core::{DispatchError, DispatchResult};
use flota_dispatch::block;
use flota_dispatch::models::{FinishRequest, NewTrip, StartRequest, Trip, TripStatus};
use flota_dispatch::repository::{DispatchRepository, TripFilter};

const TRIP_COLUMNS: &str = "id, trip_number, origin_state, origin_municipality, origin_place, \
     destination_state, destination_municipality, destination_place, driver_id, vehicle_id, \
     scheduled_at, status, finish_rejection_reason, created_at, updated_at";

const START_REQUEST_COLUMNS: &str = "id, trip_id, driver_id, status, requested_at, responded_at, \
     responder_id, denial_reason, block_days, block_expires_at";

const FINISH_REQUEST_COLUMNS: &str =
    "id, trip_id, driver_id, status, requested_at, responded_at, responder_id";

/// SQLite-backed implementation of the dispatch contract.
///
/// Every approve/reject runs its writes first inside the transaction, so
/// the connection holds the write lock before anything is read back and
/// racing decisions serialize cleanly: the loser's conditional write
/// matches zero rows and turns into Conflict/NotFound.
pub struct StoreDispatchRepository {
    pool: Pool<Sqlite>,
}

impl StoreDispatchRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> DispatchResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(DispatchError::storage)
    }
}

async fn trip_in_tx(
    tx: &mut Transaction<'static, Sqlite>,
    trip_id: Uuid,
) -> DispatchResult<Option<Trip>> {
    let sql = format!("SELECT {} FROM trips WHERE id = ?", TRIP_COLUMNS);
    sqlx::query_as::<_, Trip>(&sql)
        .bind(trip_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DispatchError::storage)
}

fn unique_to_conflict(err: sqlx::Error, message: &str) -> DispatchError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DispatchError::conflict(message),
        _ => DispatchError::storage(err),
    }
}

#[async_trait]
impl DispatchRepository for StoreDispatchRepository {
    async fn insert_trip(&self, trip: &Trip) -> DispatchResult<()> {
        sqlx::query(
            "INSERT INTO trips (id, trip_number, origin_state, origin_municipality, origin_place, \
             destination_state, destination_municipality, destination_place, driver_id, \
             vehicle_id, scheduled_at, status, finish_rejection_reason, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(trip.id)
        .bind(&trip.trip_number)
        .bind(&trip.origin_state)
        .bind(&trip.origin_municipality)
        .bind(trip.origin_place.as_deref())
        .bind(&trip.destination_state)
        .bind(&trip.destination_municipality)
        .bind(trip.destination_place.as_deref())
        .bind(trip.driver_id)
        .bind(trip.vehicle_id)
        .bind(trip.scheduled_at)
        .bind(trip.status)
        .bind(trip.finish_rejection_reason.as_deref())
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "el numero de viaje ya existe"))?;
        Ok(())
    }

    async fn trip_by_id(&self, trip_id: Uuid) -> DispatchResult<Option<Trip>> {
        let sql = format!("SELECT {} FROM trips WHERE id = ?", TRIP_COLUMNS);
        sqlx::query_as::<_, Trip>(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn list_trips(&self, filter: &TripFilter) -> DispatchResult<Vec<Trip>> {
        let mut sql = format!("SELECT {} FROM trips", TRIP_COLUMNS);
        let mut clauses: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            clauses.push("status = ?");
        }
        if filter.driver_id.is_some() {
            clauses.push("driver_id = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY scheduled_at DESC");

        let mut query = sqlx::query_as::<_, Trip>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(driver_id) = filter.driver_id {
            query = query.bind(driver_id);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn update_trip(&self, trip_id: Uuid, changes: &NewTrip) -> DispatchResult<Trip> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE trips SET trip_number = COALESCE(?, trip_number), origin_state = ?, \
             origin_municipality = ?, origin_place = ?, destination_state = ?, \
             destination_municipality = ?, destination_place = ?, driver_id = ?, vehicle_id = ?, \
             scheduled_at = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(changes.trip_number.as_deref())
        .bind(&changes.origin.state)
        .bind(&changes.origin.municipality)
        .bind(changes.origin.place.as_deref())
        .bind(&changes.destination.state)
        .bind(&changes.destination.municipality)
        .bind(changes.destination.place.as_deref())
        .bind(changes.driver_id)
        .bind(changes.vehicle_id)
        .bind(changes.scheduled_at)
        .bind(now)
        .bind(trip_id)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "el numero de viaje ya existe"))?;

        if result.rows_affected() == 0 {
            return match self.trip_by_id(trip_id).await? {
                None => Err(DispatchError::not_found("el viaje no existe")),
                Some(trip) => Err(DispatchError::InvalidState(format!(
                    "solo se puede editar un viaje pendiente (status actual: {})",
                    trip.status
                ))),
            };
        }

        self.trip_by_id(trip_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el viaje no existe"))
    }

    async fn cancel_trip(&self, trip_id: Uuid) -> DispatchResult<Trip> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE trips SET status = 'cancelled', updated_at = ? \
             WHERE id = ? AND status IN ('pending', 'en_route')",
        )
        .bind(now)
        .bind(trip_id)
        .execute(&self.pool)
        .await
        .map_err(DispatchError::storage)?;

        if result.rows_affected() == 0 {
            return match self.trip_by_id(trip_id).await? {
                None => Err(DispatchError::not_found("el viaje no existe")),
                Some(trip) => Err(DispatchError::InvalidState(format!(
                    "transicion de viaje invalida: {} -> cancelled",
                    trip.status
                ))),
            };
        }

        self.trip_by_id(trip_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("el viaje no existe"))
    }

    async fn active_trip_for_driver(&self, driver_id: Uuid) -> DispatchResult<Option<Uuid>> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM trips WHERE driver_id = ? AND status = 'en_route' LIMIT 1")
                .bind(driver_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DispatchError::storage)?;
        Ok(row.map(|(id,)| id))
    }

    async fn insert_start_request(&self, request: &StartRequest) -> DispatchResult<()> {
        // Guarded insert: the trip must still be pending at write time,
        // whatever the service saw moments earlier.
        let result = sqlx::query(
            "INSERT INTO start_requests (id, trip_id, driver_id, status, requested_at, \
             responded_at, responder_id, denial_reason, block_days, block_expires_at) \
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ? \
             WHERE EXISTS (SELECT 1 FROM trips WHERE id = ? AND status = 'pending')",
        )
        .bind(request.id)
        .bind(request.trip_id)
        .bind(request.driver_id)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(request.responded_at)
        .bind(request.responder_id)
        .bind(request.denial_reason.as_deref())
        .bind(request.block_days)
        .bind(request.block_expires_at)
        .bind(request.trip_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            unique_to_conflict(e, "ya existe una solicitud de inicio pendiente para este viaje")
        })?;

        if result.rows_affected() == 0 {
            return match self.trip_by_id(request.trip_id).await? {
                None => Err(DispatchError::not_found("el viaje no existe")),
                Some(trip) => Err(DispatchError::InvalidState(format!(
                    "el viaje no esta pendiente (status actual: {})",
                    trip.status
                ))),
            };
        }
        Ok(())
    }

    async fn pending_start_request(&self, trip_id: Uuid) -> DispatchResult<Option<StartRequest>> {
        let sql = format!(
            "SELECT {} FROM start_requests WHERE trip_id = ? AND status = 'pending' LIMIT 1",
            START_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, StartRequest>(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn latest_denied_start_request(
        &self,
        trip_id: Uuid,
        driver_id: Uuid,
    ) -> DispatchResult<Option<StartRequest>> {
        let sql = format!(
            "SELECT {} FROM start_requests \
             WHERE trip_id = ? AND driver_id = ? AND status = 'denied' \
             ORDER BY rowid DESC LIMIT 1",
            START_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, StartRequest>(&sql)
            .bind(trip_id)
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn approve_start(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
    ) -> DispatchResult<StartRequest> {
        let mut tx = self.begin().await?;
        let now = Utc::now();

        // Claim the pending request. Running the write first takes the
        // lock; a racing approval sees zero rows here.
        let claimed: Option<(Uuid, Uuid)> = sqlx::query_as(
            "UPDATE start_requests SET status = 'approved', responded_at = ?, responder_id = ? \
             WHERE trip_id = ? AND status = 'pending' RETURNING id, driver_id",
        )
        .bind(now)
        .bind(responder_id)
        .bind(trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        let Some((request_id, driver_id)) = claimed else {
            return Err(match trip_in_tx(&mut tx, trip_id).await? {
                None => DispatchError::not_found("el viaje no existe"),
                Some(t) if t.status == TripStatus::EnRoute => {
                    DispatchError::conflict("el viaje ya esta en ruta")
                }
                Some(t) if t.status == TripStatus::Completed => {
                    DispatchError::conflict("el viaje ya fue completado")
                }
                Some(_) => {
                    DispatchError::not_found("no hay solicitud de inicio pendiente para este viaje")
                }
            });
        };

        // The driver may have gained a live haul since requesting.
        let active: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM trips WHERE driver_id = ? AND status = 'en_route' LIMIT 1")
                .bind(driver_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DispatchError::storage)?;
        if active.is_some() {
            return Err(DispatchError::conflict(
                "el transportista ya tiene un viaje en ruta",
            ));
        }

        // An open trip gets claimed by the approved requester.
        let moved = sqlx::query(
            "UPDATE trips SET status = 'en_route', driver_id = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(driver_id)
        .bind(now)
        .bind(trip_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_to_conflict(e, "el transportista ya tiene un viaje en ruta"))?;
        if moved.rows_affected() == 0 {
            return Err(DispatchError::conflict(
                "el viaje cambio de estado durante la aprobacion",
            ));
        }

        let sql = format!(
            "SELECT {} FROM start_requests WHERE id = ?",
            START_REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, StartRequest>(&sql)
            .bind(request_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DispatchError::storage)?;

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(request)
    }

    async fn reject_start(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
        reason: &str,
        block_days: i64,
    ) -> DispatchResult<StartRequest> {
        let mut tx = self.begin().await?;
        let now = Utc::now();
        let expires_at = block::expiry_for(block_days, now);

        let claimed: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE start_requests SET status = 'denied', responded_at = ?, responder_id = ?, \
             denial_reason = ?, block_days = ?, block_expires_at = ? \
             WHERE trip_id = ? AND status = 'pending' RETURNING id",
        )
        .bind(now)
        .bind(responder_id)
        .bind(reason)
        .bind(block_days)
        .bind(expires_at)
        .bind(trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        let Some((request_id,)) = claimed else {
            return Err(match trip_in_tx(&mut tx, trip_id).await? {
                None => DispatchError::not_found("el viaje no existe"),
                Some(_) => {
                    DispatchError::not_found("no hay solicitud de inicio pendiente para este viaje")
                }
            });
        };

        // Trip stays pending; only the request and its cooldown change.
        let sql = format!(
            "SELECT {} FROM start_requests WHERE id = ?",
            START_REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, StartRequest>(&sql)
            .bind(request_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DispatchError::storage)?;

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(request)
    }

    async fn insert_finish_request(&self, request: &FinishRequest) -> DispatchResult<()> {
        let mut tx = self.begin().await?;
        let now = Utc::now();

        // A fresh attempt wipes the reason left by the last denial. The
        // condition doubles as the state guard for the insert below.
        let guard = sqlx::query(
            "UPDATE trips SET finish_rejection_reason = NULL, updated_at = ? \
             WHERE id = ? AND status = 'en_route'",
        )
        .bind(now)
        .bind(request.trip_id)
        .execute(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        if guard.rows_affected() == 0 {
            return Err(match trip_in_tx(&mut tx, request.trip_id).await? {
                None => DispatchError::not_found("el viaje no existe"),
                Some(trip) => DispatchError::InvalidState(format!(
                    "el viaje no esta en ruta (status actual: {})",
                    trip.status
                )),
            });
        }

        sqlx::query(
            "INSERT INTO finish_requests (id, trip_id, driver_id, status, requested_at, \
             responded_at, responder_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(request.id)
        .bind(request.trip_id)
        .bind(request.driver_id)
        .bind(request.status)
        .bind(request.requested_at)
        .bind(request.responded_at)
        .bind(request.responder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            unique_to_conflict(
                e,
                "ya existe una solicitud de finalizacion pendiente para este viaje",
            )
        })?;

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(())
    }

    async fn pending_finish_request(&self, trip_id: Uuid) -> DispatchResult<Option<FinishRequest>> {
        let sql = format!(
            "SELECT {} FROM finish_requests WHERE trip_id = ? AND status = 'pending' LIMIT 1",
            FINISH_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, FinishRequest>(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn latest_finish_request(&self, trip_id: Uuid) -> DispatchResult<Option<FinishRequest>> {
        let sql = format!(
            "SELECT {} FROM finish_requests WHERE trip_id = ? ORDER BY rowid DESC LIMIT 1",
            FINISH_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, FinishRequest>(&sql)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DispatchError::storage)
    }

    async fn approve_finish(
        &self,
        trip_id: Uuid,
        responder_id: Uuid,
    ) -> DispatchResult<FinishRequest> {
        let mut tx = self.begin().await?;
        let now = Utc::now();

        let claimed: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE finish_requests SET status = 'approved', responded_at = ?, responder_id = ? \
             WHERE trip_id = ? AND status = 'pending' RETURNING id",
        )
        .bind(now)
        .bind(responder_id)
        .bind(trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        let Some((request_id,)) = claimed else {
            return Err(match trip_in_tx(&mut tx, trip_id).await? {
                None => DispatchError::not_found("el viaje no existe"),
                Some(t) if t.status == TripStatus::Completed => {
                    DispatchError::conflict("el viaje ya fue completado")
                }
                Some(_) => DispatchError::not_found(
                    "no hay solicitud de finalizacion pendiente para este viaje",
                ),
            });
        };

        let moved = sqlx::query(
            "UPDATE trips SET status = 'completed', finish_rejection_reason = NULL, \
             updated_at = ? WHERE id = ? AND status = 'en_route'",
        )
        .bind(now)
        .bind(trip_id)
        .execute(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;
        if moved.rows_affected() == 0 {
            return Err(DispatchError::conflict("el viaje no esta en ruta"));
        }

        let sql = format!(
            "SELECT {} FROM finish_requests WHERE id = ?",
            FINISH_REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, FinishRequest>(&sql)
            .bind(request_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DispatchError::storage)?;

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(request)
    }

    async fn reject_finish(
        &self,
        trip_id: Uuid,
        _responder_id: Uuid,
        reason: &str,
    ) -> DispatchResult<()> {
        let mut tx = self.begin().await?;
        let now = Utc::now();

        // The row is removed outright so the driver can re-request with no
        // cooldown; only the reason survives, parked on the trip.
        let removed: Option<(Uuid,)> = sqlx::query_as(
            "DELETE FROM finish_requests WHERE trip_id = ? AND status = 'pending' RETURNING id",
        )
        .bind(trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;

        if removed.is_none() {
            return Err(match trip_in_tx(&mut tx, trip_id).await? {
                None => DispatchError::not_found("el viaje no existe"),
                Some(_) => DispatchError::not_found(
                    "no hay solicitud de finalizacion pendiente para este viaje",
                ),
            });
        }

        let marked = sqlx::query(
            "UPDATE trips SET finish_rejection_reason = ?, updated_at = ? \
             WHERE id = ? AND status = 'en_route'",
        )
        .bind(reason)
        .bind(now)
        .bind(trip_id)
        .execute(&mut *tx)
        .await
        .map_err(DispatchError::storage)?;
        if marked.rows_affected() == 0 {
            return Err(DispatchError::conflict("el viaje no esta en ruta"));
        }

        tx.commit().await.map_err(DispatchError::storage)?;
        Ok(())
    }
}
