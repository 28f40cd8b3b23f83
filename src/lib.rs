#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

mod source;
pub use source::{FeeHistorySource, Http, JsonRpcError, MockSource, RecordedRequest, SourceError};

mod suggester;
pub use suggester::{FeeSuggester, Result, SuggestError};

mod types;
pub use types::{BlockNumber, FeeHistory, FeeSuggestion};
