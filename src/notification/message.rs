//! Composes the text of WhatsApp notifications.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{friend::Friend, transaction::Transaction};

/// Dates in messages are shown like "18 Oct 2026, 09:15 PM".
const MESSAGE_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day] [month repr:short] [year], [hour repr:12]:[minute] [period]");

/// Render `date` in the user's timezone for display in a message.
pub fn format_message_date(date: OffsetDateTime, local_offset: UtcOffset) -> String {
    date.to_offset(local_offset)
        .format(MESSAGE_DATE_FORMAT)
        .unwrap_or_else(|error| {
            tracing::warn!("Could not format message date {date}: {error}");
            date.to_string()
        })
}

/// Format an amount in rupees with two decimal places, e.g. "₹1,234.50".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("₹")
            .expect("currency symbol fits in the formatter prefix")
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-₹")
            .expect("currency symbol fits in the formatter prefix")
            .precision(Precision::Decimals(2))
    });

    // Amounts are shown in whole paise.
    let number = (number * 100.0).round() / 100.0;

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "₹0.00".to_owned()
    };

    // numfmt omits trailing zeros, so we must add them ourselves.
    // For example, "12.30" is rendered as "12.3" so we append "0".
    match formatted_string.rfind('.') {
        None => formatted_string.push_str(".00"),
        Some(point) if formatted_string.len() - point == 2 => formatted_string.push('0'),
        Some(_) => {}
    }

    formatted_string
}

/// Which route a debit came through. Only the footer differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitRoute {
    /// `POST /friends/{friend_id}/deduct`
    Deduct,
    /// `POST /send/{friend_id}`
    Send,
}

impl DebitRoute {
    fn footer(self) -> &'static str {
        match self {
            Self::Deduct => "Balance updated automatically.",
            Self::Send => "Money sent. Reply here if anything looks wrong.",
        }
    }
}

/// Everything that goes into a debit notification.
#[derive(Debug, Clone, PartialEq)]
pub struct DebitSummary<'a> {
    /// The friend after the debit was applied.
    pub friend: &'a Friend,
    /// The debit's ledger entry.
    pub transaction: &'a Transaction,
    /// The sum of the friend's debits today, including this one.
    pub todays_spend: f64,
}

/// Compose the message sent after a debit.
pub fn compose_debit_message(
    summary: &DebitSummary,
    route: DebitRoute,
    local_offset: UtcOffset,
) -> String {
    let DebitSummary {
        friend,
        transaction,
        todays_spend,
    } = summary;
    let previous_balance = transaction
        .previous_balance
        .unwrap_or(friend.total_balance + transaction.amount);
    let new_balance = transaction.new_balance.unwrap_or(friend.total_balance);

    let mut lines = vec![
        "*Money Update*".to_owned(),
        format!(
            "Date: {}",
            format_message_date(transaction.created_at, local_offset)
        ),
        format!("Friend: {}", friend.name),
        format!("Saved amount: {}", format_currency(friend.saved_amount)),
        format!("Previous balance: {}", format_currency(previous_balance)),
        format!("Debited: {}", format_currency(transaction.amount)),
        format!("Spent today: {}", format_currency(*todays_spend)),
        format!("New balance: {}", format_currency(new_balance)),
    ];

    if let Some(note) = &transaction.note {
        lines.push(format!("Note: {note}"));
    }

    lines.push(String::new());
    lines.push(route.footer().to_owned());

    lines.join("\n")
}

/// Compose a reminder about a single loan entry.
pub fn compose_loan_reminder(
    friend: &Friend,
    loan: &Transaction,
    local_offset: UtcOffset,
) -> String {
    let mut lines = vec![
        "*Loan Reminder*".to_owned(),
        format!(
            "Hi {}, this is a reminder about the {} lent to you on {}.",
            friend.name,
            format_currency(loan.amount),
            format_message_date(loan.created_at, local_offset)
        ),
    ];

    if let Some(reason) = &loan.note {
        lines.push(format!("Reason: {reason}"));
    }

    lines.push(format!(
        "Total outstanding: {}",
        format_currency(friend.owed_amount)
    ));

    lines.join("\n")
}

/// Compose a reminder about everything a friend owes.
pub fn compose_total_owed_reminder(
    friend: &Friend,
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> String {
    [
        "*Payment Reminder*".to_owned(),
        format!(
            "Hi {}, you currently owe {} in total.",
            friend.name,
            format_currency(friend.owed_amount)
        ),
        format!("As of: {}", format_message_date(now, local_offset)),
    ]
    .join("\n")
}
