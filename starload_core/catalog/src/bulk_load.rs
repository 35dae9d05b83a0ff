//! COPY statements that fill the staging tables from object storage.

use crate::error::CatalogError;
use crate::schema::Table;
use common::config::components::sources::ObjectStorageSources;
use minijinja::{context, Environment};
use once_cell::sync::Lazy;

const COPY_TEMPLATE: &str = r#"COPY {{ table }} FROM {{ source | sql_literal }}
CREDENTIALS {{ credentials | sql_literal }}
REGION {{ region | sql_literal }}
{% if time_format %}
BLANKSASNULL EMPTYASNULL
TIMEFORMAT AS {{ time_format | sql_literal }}
FORMAT AS JSON {{ json_format | sql_literal }}
{% else %}
FORMAT AS JSON {{ json_format | sql_literal }}
BLANKSASNULL EMPTYASNULL
{% endif %}"#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("sql_literal", sql_literal);
    env
});

/// Quote a value as a SQL string literal.
pub fn sql_literal(value: String) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// How COPY maps JSON documents onto columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Match keys to column names.
    Auto,
    /// A JSONPaths file listing one expression per column.
    Paths(String),
}

impl JsonFormat {
    fn as_arg(&self) -> &str {
        match self {
            JsonFormat::Auto => "auto",
            JsonFormat::Paths(path) => path,
        }
    }
}

/// Everything needed to render one COPY statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLoadSpec {
    pub target: Table,
    pub source: String,
    pub iam_role: String,
    pub region: String,
    pub json_format: JsonFormat,
    /// Set for epoch millisecond timestamps (`epochmillisecs`).
    pub time_format: Option<String>,
}

impl BulkLoadSpec {
    /// Event logs: JSONPaths mapping, `ts` in epoch milliseconds.
    pub fn events(sources: &ObjectStorageSources) -> Self {
        Self {
            target: Table::StagingEvents,
            source: sources.log_data.clone(),
            iam_role: sources.iam_role.clone(),
            region: sources.region.clone(),
            json_format: JsonFormat::Paths(sources.log_jsonpath.clone()),
            time_format: Some("epochmillisecs".to_string()),
        }
    }

    /// Song catalog: keys map straight onto column names.
    pub fn songs(sources: &ObjectStorageSources) -> Self {
        Self {
            target: Table::StagingSongs,
            source: sources.song_data.clone(),
            iam_role: sources.iam_role.clone(),
            region: sources.region.clone(),
            json_format: JsonFormat::Auto,
            time_format: None,
        }
    }

    pub fn render(&self) -> Result<String, CatalogError> {
        if !self.target.is_staging() {
            return Err(CatalogError::invalid(format!(
                "bulk load must target a staging table, got {}",
                self.target
            )));
        }
        let rendered = TEMPLATES.render_str(
            COPY_TEMPLATE,
            context! {
                table => self.target.name(),
                source => &self.source,
                credentials => format!("aws_iam_role={}", self.iam_role),
                region => &self.region,
                json_format => self.json_format.as_arg(),
                time_format => &self.time_format,
            },
        )?;
        Ok(rendered.trim_end().to_string())
    }
}
