//! Results core: pure parsing, request building and fetch-cycle state.
mod cycle;
mod form;
mod link;
mod model;
mod parser;
mod portal;
mod session;

pub use cycle::{CycleEvent, CycleState, TransitionError};
pub use form::{build_lookup_url, build_submission_body, encode_form};
pub use link::parse_lookup_key;
pub use model::{LookupKey, PatientInfo, ResultRecord, SessionToken};
pub use parser::{
    clean_cell, parse_results, ParseReport, ParsedResults, ResultParser, RowField,
    SelectorLocator, TableLocator, ROW_LAYOUT,
};
pub use portal::{FormFieldNames, PortalConfig};
pub use session::extract_session_token;
