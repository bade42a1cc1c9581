//! The numbered menu. Reads one line per prompt, calls into the catalog,
//! the ledger and the room registry, and prints what happened.

use std::io::{ErrorKind, Write};

use sqlx::SqlitePool;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::error;

use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::ledger::Ledger;
use crate::rooms::{Registry, ROOMS};
use crate::sql::SqliteStore;
use crate::types::{Account, BookField, NewBook, Registration};

const MENU: &str = "
Library Management System
1. Register
2. Login
3. Add a Book
4. List All Books
5. Borrow a Book
6. Return a Book
7. Search for a Book
8. Form a Study Group
9. Show All Study Groups
10. Join a Study Group
11. Leave a Study Group
12. Search for Study Groups by Genre
13. Reserve a Room
14. Cancel Room Reservation
15. Show Room Reservations
16. Exit";

enum Flow {
	Continue,
	Exit,
}

pub struct Shell<R, W> {
	db: SqlitePool,
	ledger: Ledger<SqliteStore>,
	rooms: Registry<SqliteStore>,
	user: Option<Account>,
	input: Lines<R>,
	out: W,
}

impl<R, W> Shell<R, W>
where
	R: AsyncBufRead + Unpin,
	W: Write,
{
	pub fn new(db: SqlitePool, rooms: Registry<SqliteStore>, input: R, out: W) -> Self {
		Shell {
			ledger: Ledger::new(SqliteStore::new(db.clone())),
			db,
			rooms,
			user: None,
			input: input.lines(),
			out,
		}
	}

	/// Runs the menu until the user picks Exit or input ends.
	pub async fn run(&mut self) -> AppResult<()> {
		loop {
			writeln!(self.out, "{MENU}")?;
			let flow = match self.ask("Enter your choice: ").await {
				Ok(choice) => self.dispatch(&choice).await,
				Err(e) => Err(e),
			};
			match flow {
				Ok(Flow::Continue) => {}
				Ok(Flow::Exit) => break,
				Err(AppError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
				Err(e) if e.is_rejection() => writeln!(self.out, "{e}")?,
				Err(e) => {
					error!(error = %e, "menu action failed");
					writeln!(self.out, "Something went wrong: {e}")?;
				}
			}
		}
		writeln!(self.out, "Thank you for using the Library Management System!")?;
		Ok(())
	}

	async fn dispatch(&mut self, choice: &str) -> AppResult<Flow> {
		match choice {
			"1" => self.register().await?,
			"2" => self.login().await?,
			"3" => self.add_book().await?,
			"4" => self.list_books().await?,
			"5" => self.borrow().await?,
			"6" => self.return_book().await?,
			"7" => self.search_books().await?,
			"8" => self.form_group().await?,
			"9" => self.list_groups().await?,
			"10" => self.join_group().await?,
			"11" => self.leave_group().await?,
			"12" => self.search_groups().await?,
			"13" => self.reserve_room().await?,
			"14" => self.cancel_reservation().await?,
			"15" => self.show_reservations().await?,
			"16" => return Ok(Flow::Exit),
			_ => writeln!(self.out, "Invalid choice. Please try again.")?,
		}
		Ok(Flow::Continue)
	}

	async fn ask(&mut self, prompt: &str) -> AppResult<String> {
		write!(self.out, "{prompt}")?;
		self.out.flush()?;
		match self.input.next_line().await? {
			Some(line) => Ok(line.trim().to_string()),
			None => Err(std::io::Error::from(ErrorKind::UnexpectedEof).into()),
		}
	}

	async fn ask_id(&mut self, prompt: &str) -> AppResult<Option<i64>> {
		let answer = self.ask(prompt).await?;
		match answer.parse() {
			Ok(id) => Ok(Some(id)),
			Err(_) => {
				writeln!(self.out, "Invalid input. Please enter a valid number.")?;
				Ok(None)
			}
		}
	}

	/// The logged-in account, or a "You need to {need}." notice for a guest.
	fn logged_in(&mut self, need: &str) -> AppResult<Option<Account>> {
		if self.user.is_none() {
			writeln!(self.out, "You need to {need}.")?;
		}
		Ok(self.user.clone())
	}

	async fn register(&mut self) -> AppResult<()> {
		let name = self.ask("Enter your name: ").await?;
		let email = self.ask("Enter your email: ").await?;
		let pass = self.ask("Enter your password: ").await?;
		catalog::register(&self.db, Registration { name, email, pass }).await?;
		writeln!(self.out, "Registration successful!")?;
		Ok(())
	}

	async fn login(&mut self) -> AppResult<()> {
		let email = self.ask("Enter your email: ").await?;
		let pass = self.ask("Enter your password: ").await?;
		match catalog::login(&self.db, &email, &pass).await? {
			Some(account) => {
				writeln!(self.out, "Welcome back, {}!", account.name)?;
				self.user = Some(account);
			}
			None => writeln!(self.out, "Invalid credentials!")?,
		}
		Ok(())
	}

	async fn add_book(&mut self) -> AppResult<()> {
		if self.logged_in("log in as an administrator to add books")?.is_none() {
			return Ok(());
		}
		let title = self.ask("Enter book title: ").await?;
		let genre = self.ask("Enter book genre: ").await?;
		let author = self.ask("Enter book author: ").await?;
		catalog::add_book(&self.db, NewBook { title, genre, author }).await?;
		writeln!(self.out, "Book added successfully!")?;
		Ok(())
	}

	async fn list_books(&mut self) -> AppResult<()> {
		let books = catalog::list_books(&self.db).await?;
		if books.is_empty() {
			writeln!(self.out, "No books found.")?;
		}
		for book in &books {
			writeln!(self.out, "{book}")?;
		}
		Ok(())
	}

	async fn borrow(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to borrow books")? else {
			return Ok(());
		};
		self.list_books().await?;
		let Some(book) = self.ask_id("Enter the ID of the book you want to borrow: ").await? else {
			return Ok(());
		};
		let record = self.ledger.borrow(book, user.uid).await?;
		writeln!(self.out, "Book {book} borrowed successfully! Please return it by {}.", record.due_date)?;
		Ok(())
	}

	async fn return_book(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to return books")? else {
			return Ok(());
		};
		let Some(book) = self.ask_id("Enter the ID of the book you want to return: ").await? else {
			return Ok(());
		};
		let fine = self.ledger.return_book(book, user.uid).await?;
		writeln!(self.out, "{fine}")?;
		writeln!(self.out, "Book returned successfully!")?;
		Ok(())
	}

	async fn search_books(&mut self) -> AppResult<()> {
		let field = loop {
			writeln!(self.out, "\nSearch for Books\n1. Search by Title\n2. Search by Genre\n3. Search by Author\n4. Return to Main Menu")?;
			match self.ask("Enter your choice: ").await?.as_str() {
				"1" => break BookField::Title,
				"2" => break BookField::Genre,
				"3" => break BookField::Author,
				"4" => return Ok(()),
				_ => writeln!(self.out, "Invalid choice! Please try again.")?,
			}
		};
		let term = self.ask("Enter the search term: ").await?;
		let found = catalog::search_books(&self.db, field, &term).await?;
		if found.is_empty() {
			writeln!(self.out, "No books found matching your criteria.")?;
		} else {
			writeln!(self.out, "Search Results:")?;
			for book in &found {
				writeln!(self.out, "{book}")?;
			}
		}
		Ok(())
	}

	async fn form_group(&mut self) -> AppResult<()> {
		if self.logged_in("log in to form a study group")?.is_none() {
			return Ok(());
		}
		let name = self.ask("Enter the name of the study group: ").await?;
		let genre = self.ask("Enter the genre of the study group: ").await?;
		let group = catalog::form_group(&self.db, &name, &genre).await?;
		writeln!(self.out, "Study group '{}' with genre '{}' created successfully!", group.name, group.genre)?;
		Ok(())
	}

	async fn list_groups(&mut self) -> AppResult<()> {
		let groups = catalog::list_groups(&self.db).await?;
		if groups.is_empty() {
			writeln!(self.out, "No study groups available.")?;
		} else {
			writeln!(self.out, "Available Study Groups:")?;
			for group in &groups {
				writeln!(self.out, "{group}")?;
			}
		}
		Ok(())
	}

	async fn join_group(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to join a study group")? else {
			return Ok(());
		};
		self.list_groups().await?;
		let Some(group) = self.ask_id("Enter the ID of the study group you want to join: ").await? else {
			return Ok(());
		};
		let joined = catalog::join_group(&self.db, group, user.uid).await?;
		writeln!(self.out, "You have successfully joined the study group '{}'!", joined.name)?;
		Ok(())
	}

	async fn leave_group(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to leave a study group")? else {
			return Ok(());
		};
		let mine = catalog::groups_of(&self.db, user.uid).await?;
		if mine.is_empty() {
			writeln!(self.out, "You are not a member of any study groups.")?;
			return Ok(());
		}
		writeln!(self.out, "Your Study Groups:")?;
		for group in &mine {
			writeln!(self.out, "{group}")?;
		}
		let Some(group) = self.ask_id("Enter the ID of the group you want to leave: ").await? else {
			return Ok(());
		};
		catalog::leave_group(&self.db, group, user.uid).await?;
		writeln!(self.out, "You have successfully left the study group.")?;
		Ok(())
	}

	async fn search_groups(&mut self) -> AppResult<()> {
		let genre = self.ask("Enter the genre to search for study groups: ").await?;
		let found = catalog::search_groups(&self.db, &genre).await?;
		if found.is_empty() {
			writeln!(self.out, "No study groups found for the specified genre.")?;
		} else {
			writeln!(self.out, "Matching Study Groups:")?;
			for group in &found {
				writeln!(self.out, "{group}")?;
			}
		}
		Ok(())
	}

	async fn reserve_room(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to reserve a room")? else {
			return Ok(());
		};
		let Some(room) = self.ask_id("Enter the room number to reserve (1-10): ").await? else {
			return Ok(());
		};
		// catch a bad room before asking for the slot
		if !ROOMS.contains(&room) {
			return Err(AppError::InvalidRoom(room));
		}
		let slot = self.ask("Enter the time slot for reservation (e.g., 10:00 AM - 12:00 PM): ").await?;
		let booked = self.rooms.reserve(room, &slot, &user.name).await?;
		writeln!(self.out, "Room {} successfully reserved for {}.", booked.room, booked.time_slot)?;
		Ok(())
	}

	async fn cancel_reservation(&mut self) -> AppResult<()> {
		let Some(user) = self.logged_in("log in to cancel a room reservation")? else {
			return Ok(());
		};
		let mine = self.rooms.list_for(&user.name).await?;
		if mine.is_empty() {
			writeln!(self.out, "You have no room reservations to cancel.")?;
			return Ok(());
		}
		writeln!(self.out, "Your Room Reservations:")?;
		for reservation in &mine {
			writeln!(self.out, "{reservation}")?;
		}
		let Some(rid) = self.ask_id("Enter the Reservation ID of the reservation you want to cancel: ").await? else {
			return Ok(());
		};
		self.rooms.cancel(rid, &user.name).await?;
		writeln!(self.out, "Room reservation canceled successfully.")?;
		Ok(())
	}

	async fn show_reservations(&mut self) -> AppResult<()> {
		let all = self.rooms.list().await?;
		if all.is_empty() {
			writeln!(self.out, "No room reservations found.")?;
		} else {
			writeln!(self.out, "Current Room Reservations:")?;
			for reservation in &all {
				writeln!(self.out, "{reservation}")?;
			}
		}
		Ok(())
	}
}
