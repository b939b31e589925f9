//! Hash-locked atomic swaps between two channels.
//!
//! A user locks tokens on the origin channel under the SHA3-256 digest of a
//! secret key. The channel-transfer service mirrors the swap on the
//! destination channel. Revealing the key on the destination releases the
//! tokens there and emits a `key` event; the service then replays the key on
//! the origin to close the original swap.
//!
//! ```text
//!  origin                               destination
//!  ──────                               ───────────
//!  begin         (user, debit)
//!                                       answer     (batch, mirrored record)
//!                                       user_done  (user, credit, `key` event)
//!  robot_done    (batch, close)
//! ```
//!
//! Either side can instead be cancelled: by the owner once the swap has
//! timed out, or by the channel admin at any time.
//!
//! Multi-asset swaps follow the same rules with one debit and credit per
//! asset.

mod batch;
mod error;
mod lock;
mod multi;
mod single;

pub use error::SwapError;
pub use lock::KEY_EVENT;
pub use multi::{
    multi_swap_answer, multi_swap_begin, multi_swap_cancel, multi_swap_get,
    multi_swap_robot_done, multi_swap_user_done,
};
pub use single::{
    swap_answer, swap_begin, swap_cancel, swap_get, swap_robot_done, swap_user_done,
};
