//! Cross-channel transfer protocol.
//!
//! Moves tokens of one user from an origin channel to a destination channel
//! in four steps, driven by a channel-transfer service:
//!
//! ```text
//!  origin (from)                         destination (to)
//!  ─────────────                         ────────────────
//!  create_from ── record, uncommitted
//!                                        create_to ── record, committed
//!  commit_from ── commit flag set
//!                                        delete_to
//!  delete_from
//! ```
//!
//! If the destination side cannot be created, the service calls
//! [`cancel_from`] on the origin instead, which refunds the user.
//!
//! # Direction
//!
//! A transfer is *forward* when the token is native to the origin channel
//! (`VT` moved from `VT` to `CC`) and *reverse* when it is native to the
//! destination (`VT` moved back from `CC` to `VT`). The direction decides the
//! balance pools touched:
//!
//! | step        | forward                          | reverse                               |
//! |-------------|----------------------------------|---------------------------------------|
//! | create_from | own balance -, given[to] +       | allowed balance -                     |
//! | create_to   | allowed balance +                | own balance +, given[from] -          |
//! | cancel_from | own balance +, given[to] -       | allowed balance +                     |

mod command;
mod error;
mod paths;
mod protocol;
mod query;
mod storage;

pub use command::apply_command;
pub use error::TransferError;
pub use paths::{from_key, from_prefix, to_key, to_prefix};
pub use protocol::{
    cancel_from, channel_transfer_by_admin, channel_transfer_by_customer, commit_from,
    create_to, create_to_from_payload, delete_from, delete_to,
};
pub use query::{query_from, query_from_page, query_to};
