//! Lending ledger: who holds which book, until when, and what a late
//! return costs.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::store::{BookLoans, Store, Tx};
use crate::time::{self, Fine};
use crate::types::{Bid, BookStatus, BorrowRecord, Uid};

#[derive(Debug, Clone)]
pub struct Ledger<S> {
	store: S,
}

impl<S: Store> Ledger<S> {
	pub fn new(store: S) -> Self {
		Ledger { store }
	}

	pub async fn borrow(&self, book: Bid, user: Uid) -> AppResult<BorrowRecord> {
		self.borrow_on(book, user, time::today()).await
	}

	/// Lends `book` to `user` as of `today`, due one borrow window later.
	pub async fn borrow_on(&self, book: Bid, user: Uid, today: NaiveDate) -> AppResult<BorrowRecord> {
		let record = BorrowRecord {
			book_id: book,
			user_id: user,
			borrow_date: today,
			due_date: time::due_date(today),
		};

		let mut tx = self.store.begin().await?;
		let lent = tx
			.update_book(book, BookStatus::Available, BookStatus::Borrowed, Some(record.due_date))
			.await?;
		if !lent {
			tx.book(book).await?.ok_or(AppError::NoSuchBook(book))?;
			debug!(book, user, "borrow refused, book is out");
			return Err(AppError::NotAvailable(book));
		}
		tx.insert_borrow(&record).await?;
		tx.commit().await?;

		info!(book, user, due = %record.due_date, "book borrowed");
		Ok(record)
	}

	pub async fn return_book(&self, book: Bid, user: Uid) -> AppResult<Fine> {
		self.return_on(book, user, time::today()).await
	}

	/// Takes `book` back from `user` as of `today` and reports the fine owed.
	/// Only the user holding the book can return it.
	pub async fn return_on(&self, book: Bid, user: Uid, today: NaiveDate) -> AppResult<Fine> {
		let mut tx = self.store.begin().await?;
		let Some(record) = tx.take_borrow(book, user).await? else {
			debug!(book, user, "return refused, no matching borrow");
			return Err(AppError::NoSuchBorrow { book, user });
		};
		if !tx.update_book(book, BookStatus::Borrowed, BookStatus::Available, None).await? {
			return Err(AppError::CorruptRow(format!("book {book} has a borrow but is not out")));
		}
		tx.commit().await?;

		let fine = Fine::assess(record.due_date, today);
		info!(book, user, overdue_days = fine.overdue_days, fine = fine.amount, "book returned");
		Ok(fine)
	}
}

#[cfg(test)]
mod tests {
	use sqlx::SqlitePool;

	use super::*;
	use crate::catalog;
	use crate::sql::{self, SqliteStore};
	use crate::types::{Book, NewBook, Registration};

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	struct Fixture {
		pool: SqlitePool,
		ledger: Ledger<SqliteStore>,
		book: Bid,
		alice: Uid,
		bob: Uid,
	}

	async fn setup() -> Fixture {
		let pool = sql::open_in_memory().await.unwrap();
		let book = catalog::add_book(&pool, NewBook {
			title: "A Study in Scarlet".to_string(),
			genre: "Mystery".to_string(),
			author: "Arthur Conan Doyle".to_string(),
		})
		.await
		.unwrap()
		.bid;
		let mut users = Vec::new();
		for name in ["alice", "bob"] {
			let account = catalog::register(&pool, Registration {
				name: name.to_string(),
				email: format!("{name}@example.com"),
				pass: "hunter2".to_string(),
			})
			.await
			.unwrap();
			users.push(account.uid);
		}
		Fixture {
			ledger: Ledger::new(SqliteStore::new(pool.clone())),
			pool,
			book,
			alice: users[0],
			bob: users[1],
		}
	}

	async fn load(pool: &SqlitePool, bid: Bid) -> Book {
		catalog::list_books(pool)
			.await
			.unwrap()
			.into_iter()
			.find(|b| b.bid == bid)
			.unwrap()
	}

	async fn borrow_count(pool: &SqlitePool, bid: Bid) -> i64 {
		sqlx::query_scalar("SELECT COUNT(*) FROM borrows WHERE book_id = ?")
			.bind(bid)
			.fetch_one(pool)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn borrow_marks_book_out_for_two_weeks() {
		let f = setup().await;
		let record = f.ledger.borrow_on(f.book, f.alice, date(2024, 2, 20)).await.unwrap();
		assert_eq!(record.due_date, date(2024, 3, 5));

		let book = load(&f.pool, f.book).await;
		assert_eq!(book.status, BookStatus::Borrowed);
		assert_eq!(book.due_date, Some(date(2024, 3, 5)));
		assert_eq!(borrow_count(&f.pool, f.book).await, 1);
	}

	#[tokio::test]
	async fn second_borrow_is_refused_and_changes_nothing() {
		let f = setup().await;
		f.ledger.borrow_on(f.book, f.alice, date(2024, 2, 20)).await.unwrap();

		let err = f.ledger.borrow_on(f.book, f.bob, date(2024, 2, 21)).await.unwrap_err();
		assert!(matches!(err, AppError::NotAvailable(b) if b == f.book));

		let book = load(&f.pool, f.book).await;
		assert_eq!(book.status, BookStatus::Borrowed);
		assert_eq!(book.due_date, Some(date(2024, 3, 5)));
		assert_eq!(borrow_count(&f.pool, f.book).await, 1);
	}

	#[tokio::test]
	async fn borrowing_unknown_book() {
		let f = setup().await;
		let err = f.ledger.borrow_on(999, f.alice, date(2024, 2, 20)).await.unwrap_err();
		assert!(matches!(err, AppError::NoSuchBook(999)));
	}

	#[tokio::test]
	async fn fines_by_lateness() {
		for (returned, expected) in [(date(2024, 3, 5), 0), (date(2024, 3, 6), 2), (date(2024, 3, 10), 10)] {
			let f = setup().await;
			f.ledger.borrow_on(f.book, f.alice, date(2024, 2, 20)).await.unwrap();
			let fine = f.ledger.return_on(f.book, f.alice, returned).await.unwrap();
			assert_eq!(fine.amount, expected, "returned on {returned}");
		}
	}

	#[tokio::test]
	async fn return_frees_the_book() {
		let f = setup().await;
		f.ledger.borrow_on(f.book, f.alice, date(2024, 2, 20)).await.unwrap();
		f.ledger.return_on(f.book, f.alice, date(2024, 2, 25)).await.unwrap();

		let book = load(&f.pool, f.book).await;
		assert_eq!(book.status, BookStatus::Available);
		assert_eq!(book.due_date, None);
		assert_eq!(borrow_count(&f.pool, f.book).await, 0);

		// and it can go out again
		f.ledger.borrow_on(f.book, f.bob, date(2024, 2, 26)).await.unwrap();
	}

	#[tokio::test]
	async fn only_the_borrower_can_return() {
		let f = setup().await;
		f.ledger.borrow_on(f.book, f.alice, date(2024, 2, 20)).await.unwrap();

		let err = f.ledger.return_on(f.book, f.bob, date(2024, 2, 21)).await.unwrap_err();
		assert!(matches!(err, AppError::NoSuchBorrow { .. }));
		assert_eq!(load(&f.pool, f.book).await.status, BookStatus::Borrowed);
	}

	#[tokio::test]
	async fn returning_a_book_never_borrowed() {
		let f = setup().await;
		let err = f.ledger.return_on(f.book, f.alice, date(2024, 2, 21)).await.unwrap_err();
		assert!(matches!(err, AppError::NoSuchBorrow { book, user } if book == f.book && user == f.alice));
	}

	#[tokio::test]
	async fn failed_borrow_rolls_back() {
		let f = setup().await;
		// no such account, so the borrow row breaks its foreign key after the book was marked out
		let err = f.ledger.borrow_on(f.book, 999, date(2024, 2, 20)).await.unwrap_err();
		assert!(matches!(err, AppError::Database(_)));

		let book = load(&f.pool, f.book).await;
		assert_eq!(book.status, BookStatus::Available);
		assert_eq!(book.due_date, None);
		assert_eq!(borrow_count(&f.pool, f.book).await, 0);
	}
}
