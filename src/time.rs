use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Days between borrowing a book and its due date.
pub const BORROW_WINDOW_DAYS: i64 = 14;
/// Currency units charged per overdue day.
pub const FINE_PER_DAY: i64 = 2;

pub fn today() -> NaiveDate {
	Local::now().date_naive()
}

pub fn due_date(borrowed: NaiveDate) -> NaiveDate {
	borrowed + Duration::days(BORROW_WINDOW_DAYS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fine {
	pub overdue_days: i64,
	pub amount: i64,
}

impl Fine {
	pub fn assess(due: NaiveDate, returned: NaiveDate) -> Self {
		let overdue_days = (returned - due).num_days().max(0);
		Fine { overdue_days, amount: overdue_days * FINE_PER_DAY }
	}

	pub fn is_due(&self) -> bool {
		self.amount > 0
	}
}

impl std::fmt::Display for Fine {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		if self.is_due() {
			write!(
				f,
				"The book is {} day(s) overdue. You owe a fine of ${}.",
				self.overdue_days, self.amount
			)
		} else {
			f.write_str("The book is returned on time. No fine applicable.")
		}
	}
}

/// Time left until the next midnight after `now`.
pub fn until_next_midnight(now: NaiveDateTime) -> std::time::Duration {
	let Some(tomorrow) = now.date().succ_opt() else {
		return std::time::Duration::ZERO;
	};
	(tomorrow.and_time(NaiveTime::MIN) - now)
		.to_std()
		.unwrap_or(std::time::Duration::ZERO)
}
