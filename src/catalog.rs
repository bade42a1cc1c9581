//! Accounts, the book shelf and study groups. Plain record keeping on top
//! of the pool, no state machine involved.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::types::{Account, Book, BookField, BookQuery, BookStatus, Gid, NewBook, Registration, StudyGroup, Uid};

pub async fn register(db: &SqlitePool, form: Registration) -> AppResult<Account> {
	let inserted = sqlx::query("INSERT INTO accounts (name, email, pass) VALUES (?, ?, ?)")
		.bind(&form.name)
		.bind(&form.email)
		.bind(&form.pass)
		.execute(db)
		.await;
	match inserted {
		Ok(done) => {
			info!(uid = done.last_insert_rowid(), email = %form.email, "account registered");
			Ok(Account {
				uid: done.last_insert_rowid(),
				name: form.name,
				email: form.email,
				pass: form.pass,
			})
		}
		Err(e) if is_unique_violation(&e) => Err(AppError::EmailTaken(form.email)),
		Err(e) => Err(e.into()),
	}
}

// passwords are compared as stored, there is no hashing
pub async fn login(db: &SqlitePool, email: &str, pass: &str) -> AppResult<Option<Account>> {
	Ok(sqlx::query_as::<_, Account>("SELECT id, name, email, pass FROM accounts WHERE email = ? AND pass = ?")
		.bind(email)
		.bind(pass)
		.fetch_optional(db)
		.await?)
}

pub async fn add_book(db: &SqlitePool, form: NewBook) -> AppResult<Book> {
	let done = sqlx::query("INSERT INTO books (title, genre, author) VALUES (?, ?, ?)")
		.bind(&form.title)
		.bind(&form.genre)
		.bind(&form.author)
		.execute(db)
		.await?;
	info!(bid = done.last_insert_rowid(), title = %form.title, "book added");
	Ok(Book {
		bid: done.last_insert_rowid(),
		title: form.title,
		genre: form.genre,
		author: form.author,
		status: BookStatus::Available,
		due_date: None,
	})
}

pub async fn list_books(db: &SqlitePool) -> AppResult<Vec<Book>> {
	let rows = sqlx::query_as::<_, BookQuery>("SELECT id, title, genre, author, status, due_date FROM books ORDER BY id")
		.fetch_all(db)
		.await?;
	rows.into_iter().map(Book::from_query).collect()
}

/// Substring match on one column, case-insensitive for ASCII like sqlite's LIKE.
pub async fn search_books(db: &SqlitePool, field: BookField, term: &str) -> AppResult<Vec<Book>> {
	let sql = format!(
		"SELECT id, title, genre, author, status, due_date FROM books WHERE {} LIKE ? ORDER BY id",
		field.column()
	);
	let rows = sqlx::query_as::<_, BookQuery>(&sql)
		.bind(format!("%{term}%"))
		.fetch_all(db)
		.await?;
	rows.into_iter().map(Book::from_query).collect()
}

pub async fn form_group(db: &SqlitePool, name: &str, genre: &str) -> AppResult<StudyGroup> {
	let done = sqlx::query("INSERT INTO study_groups (name, genre) VALUES (?, ?)")
		.bind(name)
		.bind(genre)
		.execute(db)
		.await?;
	info!(gid = done.last_insert_rowid(), name, genre, "study group formed");
	Ok(StudyGroup {
		gid: done.last_insert_rowid(),
		name: name.to_string(),
		genre: genre.to_string(),
	})
}

pub async fn list_groups(db: &SqlitePool) -> AppResult<Vec<StudyGroup>> {
	Ok(sqlx::query_as::<_, StudyGroup>("SELECT id, name, genre FROM study_groups ORDER BY id")
		.fetch_all(db)
		.await?)
}

pub async fn search_groups(db: &SqlitePool, genre: &str) -> AppResult<Vec<StudyGroup>> {
	Ok(sqlx::query_as::<_, StudyGroup>("SELECT id, name, genre FROM study_groups WHERE genre LIKE ? ORDER BY id")
		.bind(format!("%{genre}%"))
		.fetch_all(db)
		.await?)
}

pub async fn groups_of(db: &SqlitePool, user: Uid) -> AppResult<Vec<StudyGroup>> {
	Ok(sqlx::query_as::<_, StudyGroup>(
		r#"
SELECT sg.id, sg.name, sg.genre
FROM study_groups sg
INNER JOIN group_members gm ON sg.id = gm.group_id
WHERE gm.user_id = ?
ORDER BY sg.id
		"#,
	)
	.bind(user)
	.fetch_all(db)
	.await?)
}

pub async fn join_group(db: &SqlitePool, group: Gid, user: Uid) -> AppResult<StudyGroup> {
	let found = sqlx::query_as::<_, StudyGroup>("SELECT id, name, genre FROM study_groups WHERE id = ?")
		.bind(group)
		.fetch_optional(db)
		.await?
		.ok_or(AppError::NoSuchGroup(group))?;

	let joined = sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES (?, ?)")
		.bind(group)
		.bind(user)
		.execute(db)
		.await;
	match joined {
		Ok(_) => {
			info!(gid = group, uid = user, "joined study group");
			Ok(found)
		}
		Err(e) if is_unique_violation(&e) => Err(AppError::AlreadyMember(group)),
		Err(e) => Err(e.into()),
	}
}

pub async fn leave_group(db: &SqlitePool, group: Gid, user: Uid) -> AppResult<()> {
	let done = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
		.bind(group)
		.bind(user)
		.execute(db)
		.await?;
	if done.rows_affected() == 0 {
		return Err(AppError::NotMember(group));
	}
	info!(gid = group, uid = user, "left study group");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sql;

	fn book(title: &str, genre: &str, author: &str) -> NewBook {
		NewBook { title: title.to_string(), genre: genre.to_string(), author: author.to_string() }
	}

	async fn account(db: &SqlitePool, name: &str) -> Account {
		register(db, Registration {
			name: name.to_string(),
			email: format!("{name}@example.com"),
			pass: "pw".to_string(),
		})
		.await
		.unwrap()
	}

	#[tokio::test]
	async fn register_and_login() {
		let db = sql::open_in_memory().await.unwrap();
		let alice = account(&db, "alice").await;

		let found = login(&db, "alice@example.com", "pw").await.unwrap();
		assert_eq!(found, Some(alice));
		assert_eq!(login(&db, "alice@example.com", "wrong").await.unwrap(), None);
	}

	#[tokio::test]
	async fn duplicate_email_is_refused() {
		let db = sql::open_in_memory().await.unwrap();
		account(&db, "alice").await;
		let err = register(&db, Registration {
			name: "Alice Again".to_string(),
			email: "alice@example.com".to_string(),
			pass: "other".to_string(),
		})
		.await
		.unwrap_err();
		assert!(matches!(err, AppError::EmailTaken(ref e) if e == "alice@example.com"));
	}

	#[tokio::test]
	async fn books_start_available_and_search_by_field() {
		let db = sql::open_in_memory().await.unwrap();
		add_book(&db, book("Dune", "Science Fiction", "Frank Herbert")).await.unwrap();
		add_book(&db, book("Emma", "Romance", "Jane Austen")).await.unwrap();
		add_book(&db, book("Persuasion", "Romance", "Jane Austen")).await.unwrap();

		let all = list_books(&db).await.unwrap();
		assert_eq!(all.len(), 3);
		assert!(all.iter().all(|b| b.status.is_available() && b.due_date.is_none()));

		let austen = search_books(&db, BookField::Author, "austen").await.unwrap();
		assert_eq!(austen.len(), 2);
		let fiction = search_books(&db, BookField::Genre, "fiction").await.unwrap();
		assert_eq!(fiction[0].title, "Dune");
		assert!(search_books(&db, BookField::Title, "Ulysses").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn group_membership() {
		let db = sql::open_in_memory().await.unwrap();
		let alice = account(&db, "alice").await;
		let poets = form_group(&db, "Poets", "Poetry").await.unwrap();
		form_group(&db, "Sleuths", "Mystery").await.unwrap();

		assert_eq!(search_groups(&db, "myst").await.unwrap().len(), 1);
		assert_eq!(list_groups(&db).await.unwrap().len(), 2);

		join_group(&db, poets.gid, alice.uid).await.unwrap();
		let err = join_group(&db, poets.gid, alice.uid).await.unwrap_err();
		assert!(matches!(err, AppError::AlreadyMember(_)));
		assert!(matches!(join_group(&db, 77, alice.uid).await.unwrap_err(), AppError::NoSuchGroup(77)));
		assert_eq!(groups_of(&db, alice.uid).await.unwrap(), vec![poets.clone()]);

		leave_group(&db, poets.gid, alice.uid).await.unwrap();
		assert!(groups_of(&db, alice.uid).await.unwrap().is_empty());
		let err = leave_group(&db, poets.gid, alice.uid).await.unwrap_err();
		assert!(matches!(err, AppError::NotMember(_)));
	}
}
