//! dm-delta - Delta storage and parsing for dbmorph
//!
//! A `DeltaProvider` answers which deltas exist on a branch and hands out
//! their raw bytes; a `DeltaParser` turns those bytes into a `Delta` for one
//! direction. The parser receives the provider as an argument on every call.

pub mod error;
pub mod local;
pub mod parser;
pub mod provider;
pub mod session;
pub(crate) mod xml;

pub use error::{ParseError, ParseResult, ProviderError, ProviderResult};
pub use local::LocalDeltaProvider;
pub use parser::{DeltaParser, XmlDeltaParser};
pub use provider::DeltaProvider;
pub use session::ProviderSession;
