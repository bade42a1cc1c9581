//! Persistence seams used by the lending ledger and the room registry.
//!
//! A [`Store`] opens a transaction; every ledger or registry operation runs
//! its reads and writes through one transaction and commits it at the end.
//! Dropping a transaction without committing rolls it back.
//!
//! Operations write before they read: a transaction that reads first
//! cannot later wait out a concurrent writer. Mutating methods are
//! conditional and report what they touched; reads only explain a refusal.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::types::{Bid, Book, BookStatus, BorrowRecord, Reservation, Rid, Uid};

#[async_trait]
pub trait Store: Send + Sync {
	type Txn: Tx + BookLoans + RoomBookings;

	async fn begin(&self) -> AppResult<Self::Txn>;
}

#[async_trait]
pub trait Tx: Send + Sized {
	async fn commit(self) -> AppResult<()>;
}

#[async_trait]
pub trait BookLoans: Tx {
	async fn book(&mut self, bid: Bid) -> AppResult<Option<Book>>;
	/// Moves the book from status `from` to `to`; false if it was not in `from`.
	async fn update_book(
		&mut self,
		bid: Bid,
		from: BookStatus,
		to: BookStatus,
		due: Option<NaiveDate>,
	) -> AppResult<bool>;

	async fn insert_borrow(&mut self, record: &BorrowRecord) -> AppResult<()>;
	/// Deletes the borrow held by `user` on `book` and hands it back.
	async fn take_borrow(&mut self, book: Bid, user: Uid) -> AppResult<Option<BorrowRecord>>;
}

#[async_trait]
pub trait RoomBookings: Tx {
	async fn reservation(&mut self, rid: Rid) -> AppResult<Option<Reservation>>;
	async fn reservations_by(&mut self, who: &str) -> AppResult<Vec<Reservation>>;
	async fn reservations(&mut self) -> AppResult<Vec<Reservation>>;

	/// Fails with `SlotTaken` when the room and slot are already held.
	async fn insert_reservation(&mut self, room: i64, slot: &str, who: &str) -> AppResult<Reservation>;
	/// Deletes reservation `rid` only if `who` holds it; false otherwise.
	async fn delete_reservation(&mut self, rid: Rid, who: &str) -> AppResult<bool>;
	/// Returns the number of reservations removed.
	async fn delete_all_reservations(&mut self) -> AppResult<u64>;
}
