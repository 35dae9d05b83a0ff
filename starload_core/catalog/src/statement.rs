use crate::bulk_load::BulkLoadSpec;
use crate::schema::Table;
use std::fmt;

/// Execution phase, in the order a full run goes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Drop,
    Create,
    Load,
    Transform,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Drop => write!(f, "drop"),
            Phase::Create => write!(f, "create"),
            Phase::Load => write!(f, "load"),
            Phase::Transform => write!(f, "transform"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Drop,
    Create,
    BulkLoad(BulkLoadSpec),
    Transform,
}

/// A rendered statement plus what it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDescriptor {
    pub kind: StatementKind,
    pub target: Table,
    /// Tables the statement selects from. Empty for DDL and bulk loads.
    pub reads: Vec<Table>,
    pub sql: String,
}

impl StatementDescriptor {
    pub fn phase(&self) -> Phase {
        match self.kind {
            StatementKind::Drop => Phase::Drop,
            StatementKind::Create => Phase::Create,
            StatementKind::BulkLoad(_) => Phase::Load,
            StatementKind::Transform => Phase::Transform,
        }
    }

    /// Short label for logs, e.g. `transform dim_users`.
    pub fn label(&self) -> String {
        format!("{} {}", self.phase(), self.target)
    }
}
