//! Friends: the people whose balances and loans are tracked.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    Friend, NewFriend, create_friend, create_friend_table, delete_friend, get_friend, list_friends,
    set_saved_amount, set_total_balance,
};
pub use create_endpoint::create_friend_endpoint;
pub use delete_endpoint::delete_friend_endpoint;
pub use edit_endpoint::{set_saved_amount_endpoint, set_total_balance_endpoint};
pub use list_endpoint::list_friends_endpoint;

#[cfg(test)]
pub use core::normalize_whatsapp;
