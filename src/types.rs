use chrono::NaiveDate;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

pub type Bid = i64;
pub type Uid = i64;
pub type Rid = i64;
pub type Gid = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
	Available,
	Borrowed,
}

impl BookStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			BookStatus::Available => "Available",
			BookStatus::Borrowed => "Borrowed",
		}
	}

	pub fn is_available(self) -> bool {
		matches!(self, BookStatus::Available)
	}
}

impl std::fmt::Display for BookStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for BookStatus {
	type Err = AppError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Available" => Ok(BookStatus::Available),
			"Borrowed" => Ok(BookStatus::Borrowed),
			other => Err(AppError::CorruptRow(format!("unknown book status {other:?}"))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
	pub bid: Bid,
	pub title: String,
	pub genre: String,
	pub author: String,
	pub status: BookStatus,
	pub due_date: Option<NaiveDate>,
}

/// Raw `books` row, status still as text.
#[derive(Debug, Clone, FromRow)]
pub struct BookQuery {
	pub id: Bid,
	pub title: String,
	pub genre: String,
	pub author: String,
	pub status: String,
	pub due_date: Option<NaiveDate>,
}

impl Book {
	pub fn from_query(info: BookQuery) -> AppResult<Self> {
		let status = info.status.parse()?;
		Ok(Book {
			bid: info.id,
			title: info.title,
			genre: info.genre,
			author: info.author,
			status,
			due_date: info.due_date,
		})
	}
}

impl std::fmt::Display for Book {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"ID: {}, Title: {}, Genre: {}, Author: {}, Status: {}",
			self.bid, self.title, self.genre, self.author, self.status
		)?;
		if let Some(due) = self.due_date {
			write!(f, " (due {due})")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone)]
pub struct NewBook {
	pub title: String,
	pub genre: String,
	pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
	Title,
	Genre,
	Author,
}

impl BookField {
	pub(crate) fn column(self) -> &'static str {
		match self {
			BookField::Title => "title",
			BookField::Genre => "genre",
			BookField::Author => "author",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct BorrowRecord {
	pub book_id: Bid,
	pub user_id: Uid,
	pub borrow_date: NaiveDate,
	pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Reservation {
	#[sqlx(rename = "id")]
	pub rid: Rid,
	#[sqlx(rename = "room_number")]
	pub room: i64,
	pub reserved_by: String,
	pub time_slot: String,
}

impl std::fmt::Display for Reservation {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(
			f,
			"Reservation ID: {}, Room Number: {}, Reserved By: {}, Time Slot: {}",
			self.rid, self.room, self.reserved_by, self.time_slot
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Account {
	#[sqlx(rename = "id")]
	pub uid: Uid,
	pub name: String,
	pub email: String,
	pub pass: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
	pub name: String,
	pub email: String,
	pub pass: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StudyGroup {
	#[sqlx(rename = "id")]
	pub gid: Gid,
	pub name: String,
	pub genre: String,
}

impl std::fmt::Display for StudyGroup {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Group ID: {}, Name: {}, Genre: {}", self.gid, self.name, self.genre)
	}
}
