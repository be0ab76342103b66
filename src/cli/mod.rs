//! # CLI Module
//!
//! User-facing commands of favsync. Each command wires configuration, the Spotify
//! client and the sync core together and turns errors into messages and exit
//! codes.
//!
//! - [`auth`] - Runs the Spotify OAuth PKCE flow and stores the token
//! - [`sync`] - Likes every track of every saved album, minus the skiplist
//!
//! ## Usage
//!
//! ```bash
//! favsync auth                              # Authenticate with Spotify
//! favsync sync                              # Like missing album tracks
//! favsync sync --dry-run -v                 # Show what would be liked
//! favsync sync -s ~/skiplist.csv            # Use a specific skiplist
//! favsync sync --save-tsv tracks.tsv        # Also export all album tracks
//! ```
//!
//! ## Exit Codes
//!
//! Fatal errors (authentication, unreadable skiplist, a fetch that still fails
//! after retries) print a message and exit with 1 before anything is liked.
//! Like batches that keep failing after retries are listed in the report; the
//! exit code is only 1 when every batch failed. An auth or other permanent error
//! while liking stops the run with 1, after listing the batches already liked.

mod auth;
mod sync;

pub use auth::auth;
pub use sync::sync;
