use crate::value::Value;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Consistency
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum Consistency {
    #[display("ALL")]
    All,
    #[display("ANY")]
    Any,
    #[display("EACH_QUORUM")]
    EachQuorum,
    #[display("LOCAL_ONE")]
    LocalOne,
    #[display("LOCAL_QUORUM")]
    LocalQuorum,
    #[display("LOCAL_SERIAL")]
    LocalSerial,
    #[display("ONE")]
    One,
    #[display("QUORUM")]
    Quorum,
    #[display("SERIAL")]
    Serial,
    #[display("THREE")]
    Three,
    #[display("TWO")]
    Two,
}

///
/// StatementOptions
///
/// Per-statement execution options handed to the executor untouched.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementOptions {
    pub consistency: Option<Consistency>,
    pub serial_consistency: Option<Consistency>,
    pub fetch_size: Option<u32>,
    pub paging_state: Option<Vec<u8>>,
}

///
/// Statement
///
/// One parameterized statement ready for `prepare`/`execute`.
/// `bound_values` are source-side renderings (for logs and assertions),
/// `encoded_values` are the post-codec values in placeholder order.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub cql: String,
    pub bound_values: Vec<String>,
    pub encoded_values: Vec<Value>,
    pub options: StatementOptions,
}

impl Statement {
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.cql.matches('?').count()
    }
}
