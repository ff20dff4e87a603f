//! Wire protocol for the registry's line-oriented TCP connections.
//!
//! Wire format: UTF-8 bytes terminated by a single LF. Fields are separated
//! by `|`; the first is the verb, the rest positional. A command that
//! carries structured data puts it in the final field as JSON, which may
//! itself contain `|` — so splitting is done with a fixed max-fields cap per
//! verb rather than a naive `split('|')`.

mod error;
mod frame;
mod request;
mod response;
mod verb;

pub use error::ProtocolError;
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
pub use request::Request;
pub use response::Response;
pub use verb::Verb;
