use thiserror::Error;

use crate::types::{Bid, Gid, Rid, Uid};

#[derive(Error, Debug)]
pub enum AppError {
	#[error("book {0} is not available")]
	NotAvailable(Bid),
	#[error("no book with id {0}")]
	NoSuchBook(Bid),
	#[error("book {book} is not borrowed by user {user}")]
	NoSuchBorrow { book: Bid, user: Uid },
	#[error("room {0} does not exist, rooms are numbered 1 to 10")]
	InvalidRoom(i64),
	#[error("room {room} is already reserved for {slot}")]
	SlotTaken { room: i64, slot: String },
	#[error("reservation {0} belongs to someone else")]
	NotOwner(Rid),
	#[error("no reservation with id {0}")]
	NotFound(Rid),
	#[error("an account with email {0} already exists")]
	EmailTaken(String),
	#[error("no study group with id {0}")]
	NoSuchGroup(Gid),
	#[error("already a member of study group {0}")]
	AlreadyMember(Gid),
	#[error("not a member of study group {0}")]
	NotMember(Gid),
	#[error("stored row could not be read: {0}")]
	CorruptRow(String),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("terminal error: {0}")]
	Io(#[from] std::io::Error),
}

impl AppError {
	/// Domain rejections the shell reports and moves on from.
	pub fn is_rejection(&self) -> bool {
		!matches!(self, AppError::CorruptRow(_) | AppError::Database(_) | AppError::Io(_))
	}
}

/// True when a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
	match err {
		sqlx::Error::Database(db) => db.is_unique_violation(),
		_ => false,
	}
}

pub type AppResult<T> = Result<T, AppError>;
