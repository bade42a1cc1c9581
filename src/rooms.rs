//! Study-room reservations. A room and a time slot can be held by one
//! reservation at a time; slots are opaque strings compared verbatim.

use std::ops::RangeInclusive;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::store::{RoomBookings, Store, Tx};
use crate::types::{Reservation, Rid};

pub const ROOMS: RangeInclusive<i64> = 1..=10;

#[derive(Debug, Clone)]
pub struct Registry<S> {
	store: S,
}

impl<S: Store> Registry<S> {
	pub fn new(store: S) -> Self {
		Registry { store }
	}

	pub async fn reserve(&self, room: i64, slot: &str, who: &str) -> AppResult<Reservation> {
		if !ROOMS.contains(&room) {
			return Err(AppError::InvalidRoom(room));
		}

		let mut tx = self.store.begin().await?;
		let reservation = match tx.insert_reservation(room, slot, who).await {
			Ok(reservation) => reservation,
			Err(e @ AppError::SlotTaken { .. }) => {
				debug!(room, slot, who, "reservation refused, slot taken");
				return Err(e);
			}
			Err(e) => return Err(e),
		};
		tx.commit().await?;

		info!(rid = reservation.rid, room, slot, who, "room reserved");
		Ok(reservation)
	}

	pub async fn cancel(&self, rid: Rid, who: &str) -> AppResult<()> {
		let mut tx = self.store.begin().await?;
		if !tx.delete_reservation(rid, who).await? {
			let reservation = tx.reservation(rid).await?.ok_or(AppError::NotFound(rid))?;
			debug!(rid, who, owner = %reservation.reserved_by, "cancel refused, not the owner");
			return Err(AppError::NotOwner(rid));
		}
		tx.commit().await?;

		info!(rid, who, "reservation cancelled");
		Ok(())
	}

	/// Clears every reservation, returning how many there were.
	pub async fn reset_all(&self) -> AppResult<u64> {
		let mut tx = self.store.begin().await?;
		let removed = tx.delete_all_reservations().await?;
		tx.commit().await?;

		info!(removed, "room reservations reset");
		Ok(removed)
	}

	pub async fn list(&self) -> AppResult<Vec<Reservation>> {
		let mut tx = self.store.begin().await?;
		let all = tx.reservations().await?;
		tx.commit().await?;
		Ok(all)
	}

	pub async fn list_for(&self, who: &str) -> AppResult<Vec<Reservation>> {
		let mut tx = self.store.begin().await?;
		let mine = tx.reservations_by(who).await?;
		tx.commit().await?;
		Ok(mine)
	}
}
