pub mod command;
pub mod copy_uid;
pub mod error;
pub mod parser;
pub mod response;
pub mod search;
pub mod sequence_set;

pub use self::command::{UidCommand, DEFAULT_LENGTH_LIMIT};
pub use self::copy_uid::UidCopyResponse;
pub use self::error::{Error, Result};
pub use self::parser::ImapResponseParser;
pub use self::response::{parse_date_time, responses, ImapList, ImapResponse, ImapToken};
pub use self::search::SearchResponse;
pub use self::sequence_set::{compress_sequence_set, expand_sequence_set, MAX_SEQUENCE_VALUE};
