//! Field grammars of the supported flat-file formats
//!
//! A grammar knows the tag set of its format, how each tagged payload folds
//! into a [`Stanza`], what to do with leftovers when the record terminates,
//! and which relational [`Schema`] its records are emitted into.

pub mod enzyme;
pub mod uniprot;

pub use enzyme::EnzymeGrammar;
pub use uniprot::UniProtGrammar;

use crate::error::FormatError;
use crate::line::TagCode;
use crate::schema::Schema;
use crate::stanza::{SingletonPolicy, Stanza};

/// The payload grammar of one record format
pub trait Grammar {
    type Tag: TagCode;
    /// Scratch state kept while a record is being accumulated
    type State: Default;

    fn name(&self) -> &'static str;

    fn policy(&self) -> SingletonPolicy;

    fn schema(&self) -> &'static Schema;

    /// Fold one line into the stanza.
    ///
    /// `continuation` is set for untagged lines, which arrive with the tag
    /// of the previously active field.
    fn accept(
        &self,
        stanza: &mut Stanza<Self::State>,
        tag: Self::Tag,
        payload: &str,
        continuation: bool,
    ) -> Result<(), FormatError>;

    /// Flush anything still pending once the terminator is reached
    fn close(&self, stanza: &mut Stanza<Self::State>) -> Result<(), FormatError>;
}

/// Append `payload` to the pending text under `key` and hand back the whole
/// field once it ends with `terminator`
pub(crate) fn accumulate<S>(
    stanza: &mut Stanza<S>,
    key: &'static str,
    payload: &str,
    terminator: &str,
) -> Option<String> {
    stanza.append(key, payload);
    stanza.take_closed(key, terminator)
}
