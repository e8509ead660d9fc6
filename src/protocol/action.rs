//! Action to tag request types.
//!
//! Every request carried by the wire protocol belongs to one verb of a
//! closed set. The verb doubles as the HTTP path of the exchange.

use std::fmt;

/// The closed set of API verbs.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Action {
    CreateTable,
    ListTable,
    DescribeTable,
    DeleteTable,
    UpdateTable,
    GetRow,
    PutRow,
    UpdateRow,
    DeleteRow,
    BatchGetRow,
    BatchWriteRow,
    GetRange,
    ComputeSplitPointsBySize,
}

impl Action {
    /// All verbs, in a fixed order. Handy for exhaustive tests.
    pub const ALL: [Action; 13] = [
        Action::CreateTable,
        Action::ListTable,
        Action::DescribeTable,
        Action::DeleteTable,
        Action::UpdateTable,
        Action::GetRow,
        Action::PutRow,
        Action::UpdateRow,
        Action::DeleteRow,
        Action::BatchGetRow,
        Action::BatchWriteRow,
        Action::GetRange,
        Action::ComputeSplitPointsBySize,
    ];

    /// The verb name as it appears on the wire, e.g. `GetRow` in `POST /GetRow`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTable => "CreateTable",
            Self::ListTable => "ListTable",
            Self::DescribeTable => "DescribeTable",
            Self::DeleteTable => "DeleteTable",
            Self::UpdateTable => "UpdateTable",
            Self::GetRow => "GetRow",
            Self::PutRow => "PutRow",
            Self::UpdateRow => "UpdateRow",
            Self::DeleteRow => "DeleteRow",
            Self::BatchGetRow => "BatchGetRow",
            Self::BatchWriteRow => "BatchWriteRow",
            Self::GetRange => "GetRange",
            Self::ComputeSplitPointsBySize => "ComputeSplitPointsBySize",
        }
    }

    /// Whether replaying the request cannot change the outcome.
    ///
    /// `DeleteRow` deletes whatever is there, so replaying it is harmless;
    /// `UpdateTable` and the write verbs are not replay-safe.
    pub fn idempotent(&self) -> bool {
        match self {
            Self::ListTable
            | Self::DescribeTable
            | Self::DeleteTable
            | Self::CreateTable
            | Self::ComputeSplitPointsBySize
            | Self::GetRow
            | Self::BatchGetRow
            | Self::GetRange
            | Self::DeleteRow => true,
            Self::UpdateTable | Self::PutRow | Self::UpdateRow | Self::BatchWriteRow => false,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
