//! XLB text container parser
//!
//! XLB files hold the game's localized strings keyed by a numeric text id.
//! MXE id fields (`ip`, and the strings behind `pi` pointers) refer to these
//! keys.
//!
//! ## Format Overview
//!
//! - Section count at `0x04`
//! - Section headers from `0x10`: record stride, record count, description,
//!   then one skeleton row per record whose first 4 bytes are the key
//! - `CHNK` marker, payload record count
//! - Payload records: key, length, encoded text
//!
//! Payload records carry no slot index; their slot is inferred from the key
//! distance to the previous record (see [`Xlb::parse`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use mxe::codec::TextEncoding;
//! use mxe::xlb::Xlb;
//!
//! let xlb = Xlb::open("text_mx.xlb", TextEncoding::ShiftJis)?;
//! if let Some(text) = xlb.find_text(1184, TextEncoding::ShiftJis) {
//!     println!("{}", text);
//! }
//! # Ok::<(), mxe::Error>(())
//! ```

mod header;
mod reader;

pub use header::{XlbSection, XlbSlot, CHUNK_MARKER};
pub use reader::Xlb;
