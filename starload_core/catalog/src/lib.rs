pub mod bulk_load;
pub mod error;
pub mod schema;
pub mod statement;
pub mod transforms;

pub use crate::error::CatalogError;
pub use crate::schema::{Table, TableKind};
pub use crate::statement::{Phase, StatementDescriptor, StatementKind};

use crate::bulk_load::BulkLoadSpec;
use common::config::components::global::WarehouseConfig;
use common::config::components::sources::ObjectStorageSources;
use common::types::{UserDedup, WarehouseDialect};
use std::collections::HashSet;
use tracing::warn;

/// Inputs the statement catalog is rendered from.
#[derive(Debug, Clone)]
pub struct CatalogParams {
    pub dialect: WarehouseDialect,
    pub user_dedup: UserDedup,
    /// Object storage to bulk load from. `None` builds a catalog without a
    /// load phase, for warehouses whose staging tables are filled another way.
    pub sources: Option<ObjectStorageSources>,
}

impl CatalogParams {
    pub fn from_config(config: &WarehouseConfig) -> Self {
        let dialect = config.dialect();
        let sources = if dialect.supports_bulk_load() {
            Some(config.sources().clone())
        } else {
            warn!(
                "dialect '{}' cannot bulk load from object storage, the load phase is skipped",
                dialect
            );
            None
        };
        Self {
            dialect,
            user_dedup: config.user_dedup(),
            sources,
        }
    }
}

/// Ordered, validated list of every statement a run can issue.
#[derive(Debug, Clone)]
pub struct StatementCatalog {
    dialect: WarehouseDialect,
    statements: Vec<StatementDescriptor>,
}

impl StatementCatalog {
    /// Drops, creates, bulk loads, then transforms.
    pub fn build(params: &CatalogParams) -> Result<Self, CatalogError> {
        let mut statements = Vec::new();

        for table in Table::ALL {
            statements.push(StatementDescriptor {
                kind: StatementKind::Drop,
                target: table,
                reads: Vec::new(),
                sql: table.drop_sql(),
            });
        }
        for table in Table::ALL {
            statements.push(StatementDescriptor {
                kind: StatementKind::Create,
                target: table,
                reads: Vec::new(),
                sql: table.create_sql(params.dialect),
            });
        }

        if let Some(sources) = &params.sources {
            if !params.dialect.supports_bulk_load() {
                return Err(CatalogError::unsupported(format!(
                    "{} has no bulk load from object storage",
                    params.dialect
                )));
            }
            for spec in [BulkLoadSpec::events(sources), BulkLoadSpec::songs(sources)] {
                statements.push(StatementDescriptor {
                    target: spec.target,
                    reads: Vec::new(),
                    sql: spec.render()?,
                    kind: StatementKind::BulkLoad(spec),
                });
            }
        }

        for spec in transforms::transforms(params.dialect, params.user_dedup) {
            statements.push(StatementDescriptor {
                kind: StatementKind::Transform,
                target: spec.target,
                reads: spec.reads,
                sql: spec.sql,
            });
        }

        Self::from_statements(params.dialect, statements)
    }

    /// Wrap a caller supplied ordering after checking it.
    pub fn from_statements(
        dialect: WarehouseDialect,
        statements: Vec<StatementDescriptor>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            dialect,
            statements,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn dialect(&self) -> WarehouseDialect {
        self.dialect
    }

    pub fn statements(&self) -> &[StatementDescriptor] {
        &self.statements
    }

    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &StatementDescriptor> {
        self.statements.iter().filter(move |s| s.phase() == phase)
    }

    pub fn drops(&self) -> impl Iterator<Item = &StatementDescriptor> {
        self.phase(Phase::Drop)
    }

    pub fn creates(&self) -> impl Iterator<Item = &StatementDescriptor> {
        self.phase(Phase::Create)
    }

    pub fn bulk_loads(&self) -> impl Iterator<Item = &StatementDescriptor> {
        self.phase(Phase::Load)
    }

    pub fn transforms(&self) -> impl Iterator<Item = &StatementDescriptor> {
        self.phase(Phase::Transform)
    }

    /// Checks the ordering and targeting rules:
    ///
    /// * phases never go backwards (no transform before a bulk load),
    /// * a table is the target of at most one statement per phase,
    /// * bulk loads target staging tables, and a load phase covers both,
    /// * transforms target the fact or a dimension table, read only staging
    ///   tables, and cover all five star schema tables,
    /// * drop and create phases, when present, cover every table.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut previous = Phase::Drop;
        for statement in &self.statements {
            let phase = statement.phase();
            if phase < previous {
                return Err(CatalogError::invalid(format!(
                    "'{}' is ordered after the {} phase",
                    statement.label(),
                    previous
                )));
            }
            previous = phase;
        }

        for phase in [Phase::Drop, Phase::Create, Phase::Load, Phase::Transform] {
            let mut seen = HashSet::new();
            for statement in self.phase(phase) {
                if !seen.insert(statement.target) {
                    return Err(CatalogError::invalid(format!(
                        "{} appears twice in the {} phase",
                        statement.target, phase
                    )));
                }
            }
        }

        for statement in self.bulk_loads() {
            if !statement.target.is_staging() {
                return Err(CatalogError::invalid(format!(
                    "bulk load targets non-staging table {}",
                    statement.target
                )));
            }
        }

        for statement in self.transforms() {
            if statement.target.is_staging() {
                return Err(CatalogError::invalid(format!(
                    "transform targets staging table {}",
                    statement.target
                )));
            }
            if statement.reads.is_empty() {
                return Err(CatalogError::invalid(format!(
                    "transform into {} declares no source tables",
                    statement.target
                )));
            }
            if let Some(bad) = statement.reads.iter().find(|t| !t.is_staging()) {
                return Err(CatalogError::invalid(format!(
                    "transform into {} reads non-staging table {}",
                    statement.target, bad
                )));
            }
        }

        self.require_coverage(Phase::Drop, &Table::ALL)?;
        self.require_coverage(Phase::Create, &Table::ALL)?;
        self.require_coverage(Phase::Load, &Table::STAGING)?;
        if self.transforms().next().is_none() {
            return Err(CatalogError::invalid("catalog has no transform statements"));
        }
        self.require_coverage(Phase::Transform, &Table::STAR)?;
        Ok(())
    }

    /// A phase that is present must cover every table in `expected`.
    fn require_coverage(&self, phase: Phase, expected: &[Table]) -> Result<(), CatalogError> {
        let present = self.phase(phase).map(|s| s.target).collect::<HashSet<_>>();
        if present.is_empty() {
            return Ok(());
        }
        let missing = expected
            .iter()
            .filter(|t| !present.contains(*t))
            .map(Table::name)
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(CatalogError::invalid(format!(
                "{} phase is missing {}",
                phase,
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Statements of one phase (or all), each terminated with `;`.
    pub fn render(&self, phase: Option<Phase>) -> String {
        self.statements
            .iter()
            .filter(|s| phase.map_or(true, |p| s.phase() == p))
            .map(|s| format!("-- {}\n{};\n", s.label(), s.sql))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
