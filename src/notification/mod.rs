//! Outbound WhatsApp notifications: the provider client, message text and
//! background delivery.

mod client;
mod dispatch;
mod message;

pub use client::{WhatsAppClient, WhatsAppConfig, mask_number};
pub use dispatch::send_in_background;
pub use message::{
    DebitRoute, DebitSummary, compose_debit_message, compose_loan_reminder,
    compose_total_owed_reminder,
};

#[cfg(test)]
pub(crate) use client::test_provider;
