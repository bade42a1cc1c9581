use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, Transaction};

use crate::config::Config;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::store::{BookLoans, RoomBookings, Store, Tx};
use crate::types::{Bid, Book, BookQuery, BookStatus, BorrowRecord, Reservation, Rid, Uid};

pub async fn open(config: &Config) -> AppResult<SqlitePool> {
	let pool = if config.database_url == ":memory:" {
		memory_pool().await?
	} else {
		let options = SqliteConnectOptions::from_str(&config.database_url)?
			.create_if_missing(true)
			.foreign_keys(true);
		SqlitePoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
			.connect_with(options)
			.await?
	};
	pool.execute(TABLE_SCHEMA).await?;
	Ok(pool)
}

/// A private in-memory database with the schema applied.
pub async fn open_in_memory() -> AppResult<SqlitePool> {
	let pool = memory_pool().await?;
	pool.execute(TABLE_SCHEMA).await?;
	Ok(pool)
}

// every sqlite memory connection is its own database, so keep exactly one alive
async fn memory_pool() -> AppResult<SqlitePool> {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
	Ok(SqlitePoolOptions::new()
		.max_connections(1)
		.min_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await?)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
}

impl SqliteStore {
	pub fn new(pool: SqlitePool) -> Self {
		SqliteStore { pool }
	}
}

#[async_trait]
impl Store for SqliteStore {
	type Txn = SqliteTx;

	async fn begin(&self) -> AppResult<SqliteTx> {
		Ok(SqliteTx(self.pool.begin().await?))
	}
}

pub struct SqliteTx(Transaction<'static, Sqlite>);

#[async_trait]
impl Tx for SqliteTx {
	async fn commit(self) -> AppResult<()> {
		self.0.commit().await?;
		Ok(())
	}
}

#[async_trait]
impl BookLoans for SqliteTx {
	async fn book(&mut self, bid: Bid) -> AppResult<Option<Book>> {
		let row = sqlx::query_as::<_, BookQuery>(
			"SELECT id, title, genre, author, status, due_date FROM books WHERE id = ?",
		)
		.bind(bid)
		.fetch_optional(&mut *self.0)
		.await?;
		row.map(Book::from_query).transpose()
	}

	async fn update_book(
		&mut self,
		bid: Bid,
		from: BookStatus,
		to: BookStatus,
		due: Option<NaiveDate>,
	) -> AppResult<bool> {
		let done = sqlx::query("UPDATE books SET status = ?, due_date = ? WHERE id = ? AND status = ?")
			.bind(to.as_str())
			.bind(due)
			.bind(bid)
			.bind(from.as_str())
			.execute(&mut *self.0)
			.await?;
		Ok(done.rows_affected() == 1)
	}

	async fn insert_borrow(&mut self, record: &BorrowRecord) -> AppResult<()> {
		sqlx::query("INSERT INTO borrows (book_id, user_id, borrow_date, due_date) VALUES (?, ?, ?, ?)")
			.bind(record.book_id)
			.bind(record.user_id)
			.bind(record.borrow_date)
			.bind(record.due_date)
			.execute(&mut *self.0)
			.await?;
		Ok(())
	}

	async fn take_borrow(&mut self, book: Bid, user: Uid) -> AppResult<Option<BorrowRecord>> {
		Ok(sqlx::query_as::<_, BorrowRecord>(
			"DELETE FROM borrows WHERE book_id = ? AND user_id = ? RETURNING book_id, user_id, borrow_date, due_date",
		)
		.bind(book)
		.bind(user)
		.fetch_optional(&mut *self.0)
		.await?)
	}
}

const RESERVATION_COLUMNS: &str = "id, room_number, reserved_by, time_slot";

#[async_trait]
impl RoomBookings for SqliteTx {
	async fn reservation(&mut self, rid: Rid) -> AppResult<Option<Reservation>> {
		let sql = format!("SELECT {RESERVATION_COLUMNS} FROM room_reservations WHERE id = ?");
		Ok(sqlx::query_as::<_, Reservation>(&sql)
			.bind(rid)
			.fetch_optional(&mut *self.0)
			.await?)
	}

	async fn reservations_by(&mut self, who: &str) -> AppResult<Vec<Reservation>> {
		let sql = format!("SELECT {RESERVATION_COLUMNS} FROM room_reservations WHERE reserved_by = ? ORDER BY id");
		Ok(sqlx::query_as::<_, Reservation>(&sql)
			.bind(who)
			.fetch_all(&mut *self.0)
			.await?)
	}

	async fn reservations(&mut self) -> AppResult<Vec<Reservation>> {
		let sql = format!("SELECT {RESERVATION_COLUMNS} FROM room_reservations ORDER BY id");
		Ok(sqlx::query_as::<_, Reservation>(&sql)
			.fetch_all(&mut *self.0)
			.await?)
	}

	async fn insert_reservation(&mut self, room: i64, slot: &str, who: &str) -> AppResult<Reservation> {
		let inserted = sqlx::query(
			"INSERT INTO room_reservations (room_number, reserved_by, time_slot) VALUES (?, ?, ?)",
		)
		.bind(room)
		.bind(who)
		.bind(slot)
		.execute(&mut *self.0)
		.await;
		match inserted {
			Ok(done) => Ok(Reservation {
				rid: done.last_insert_rowid(),
				room,
				reserved_by: who.to_string(),
				time_slot: slot.to_string(),
			}),
			Err(e) if is_unique_violation(&e) => Err(AppError::SlotTaken { room, slot: slot.to_string() }),
			Err(e) => Err(e.into()),
		}
	}

	async fn delete_reservation(&mut self, rid: Rid, who: &str) -> AppResult<bool> {
		let done = sqlx::query("DELETE FROM room_reservations WHERE id = ? AND reserved_by = ?")
			.bind(rid)
			.bind(who)
			.execute(&mut *self.0)
			.await?;
		Ok(done.rows_affected() == 1)
	}

	async fn delete_all_reservations(&mut self) -> AppResult<u64> {
		let done = sqlx::query("DELETE FROM room_reservations")
			.execute(&mut *self.0)
			.await?;
		Ok(done.rows_affected())
	}
}

pub const TABLE_SCHEMA: &str = r#"

CREATE TABLE IF NOT EXISTS accounts (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE,
	pass TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	genre TEXT NOT NULL,
	author TEXT NOT NULL,
	status TEXT NOT NULL DEFAULT 'Available',
	due_date DATE DEFAULT NULL,
	CHECK(status IN ('Available', 'Borrowed')),
	CHECK((status == 'Borrowed') == (due_date IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS borrows (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	book_id INTEGER NOT NULL,
	user_id INTEGER NOT NULL,
	borrow_date DATE NOT NULL,
	due_date DATE NOT NULL,
	FOREIGN KEY(book_id) REFERENCES books(id),
	FOREIGN KEY(user_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS study_groups (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	genre TEXT NOT NULL DEFAULT 'General'
);

CREATE TABLE IF NOT EXISTS group_members (
	group_id INTEGER NOT NULL,
	user_id INTEGER NOT NULL,
	UNIQUE(group_id, user_id),
	FOREIGN KEY(group_id) REFERENCES study_groups(id),
	FOREIGN KEY(user_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS room_reservations (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	room_number INTEGER NOT NULL,
	reserved_by TEXT NOT NULL,
	time_slot TEXT NOT NULL,
	CHECK(room_number BETWEEN 1 AND 10),
	UNIQUE(room_number, time_slot)
);

"#;
