//! CQL DDL for a validated schema.

use crate::{
    Schema,
    decl::{Normalization, SasiAnalyzer, SasiMode},
    model::{
        ColumnRole, EntityModel, FieldModel, IndexImplementation, IndexKind, IndexModel,
        SasiOptions, ShapeKind, UdtModel,
    },
};

const SASI_CLASS: &str = "org.apache.cassandra.index.sasi.SASIIndex";
const DSE_SEARCH_CLASS: &str = "com.datastax.bdp.search.solr.Cql3SolrSecondaryIndex";

/// Every statement needed to create the schema: types, tables, views, then
/// indexes.
#[must_use]
pub fn schema_statements(schema: &Schema) -> Vec<String> {
    let mut out = schema.udts.iter().map(create_type).collect::<Vec<_>>();
    for entity in schema.entities.iter().filter(|e| !e.is_view()) {
        out.extend(entity_statements(schema, entity));
    }
    for view in schema.entities.iter().filter(|e| e.is_view()) {
        out.extend(entity_statements(schema, view));
    }

    out
}

/// The table (or view) and its indexes.
#[must_use]
pub fn entity_statements(schema: &Schema, entity: &EntityModel) -> Vec<String> {
    let primary = match entity
        .view_of
        .as_deref()
        .and_then(|base| schema.entity(base))
    {
        Some(base) => create_view(entity, base),
        None => create_table(schema, entity),
    };

    let mut out = vec![primary];
    out.extend(create_indexes(entity));

    out
}

#[must_use]
pub fn create_type(udt: &UdtModel) -> String {
    let fields = udt
        .fields
        .iter()
        .map(|f| format!("{} {}", f.column, f.shape))
        .collect::<Vec<_>>();

    format!(
        "CREATE TYPE IF NOT EXISTS {} ({})",
        udt.qualified_type(),
        fields.join(", ")
    )
}

#[must_use]
pub fn create_table(schema: &Schema, entity: &EntityModel) -> String {
    let columns = stored_fields(entity)
        .map(|field| {
            let ty = schema.column_type(entity, field);
            if field.role.is_static() {
                format!("{} {ty} static", field.column)
            } else {
                format!("{} {ty}", field.column)
            }
        })
        .collect::<Vec<_>>();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({})){}",
        entity.qualified_table(),
        columns.join(", "),
        primary_key(entity),
        clustering_order(entity)
    )
}

#[must_use]
pub fn create_view(view: &EntityModel, base: &EntityModel) -> String {
    let columns = stored_fields(view)
        .map(|f| f.column.as_str())
        .collect::<Vec<_>>();
    let keys = view
        .partition_fields()
        .into_iter()
        .chain(view.clustering_fields())
        .map(|f| format!("{} IS NOT NULL", f.column))
        .collect::<Vec<_>>();

    format!(
        "CREATE MATERIALIZED VIEW IF NOT EXISTS {} AS SELECT {} FROM {} WHERE {} PRIMARY KEY ({}){}",
        view.qualified_table(),
        columns.join(", "),
        base.qualified_table(),
        keys.join(" AND "),
        primary_key(view),
        clustering_order(view)
    )
}

#[must_use]
pub fn create_indexes(entity: &EntityModel) -> Vec<String> {
    entity
        .indexed_fields()
        .into_iter()
        .flat_map(|field| {
            field
                .indexes
                .iter()
                .map(move |index| create_index(entity, field, index))
        })
        .collect()
}

fn create_index(entity: &EntityModel, field: &FieldModel, index: &IndexModel) -> String {
    let name = index.resolved_name(&entity.table, &field.column);
    let table = entity.qualified_table();
    let column = &field.column;

    match index.implementation {
        IndexImplementation::Native => {
            let target = match index.kind {
                IndexKind::Normal => column.clone(),
                IndexKind::Full => format!("FULL({column})"),
                IndexKind::Collection if matches!(field.shape.kind, ShapeKind::Map(..)) => {
                    format!("VALUES({column})")
                }
                IndexKind::Collection => column.clone(),
                IndexKind::MapKey => format!("KEYS({column})"),
                IndexKind::MapValue => format!("VALUES({column})"),
                IndexKind::MapEntry => format!("ENTRIES({column})"),
            };
            format!("CREATE INDEX IF NOT EXISTS {name} ON {table} ({target})")
        }
        IndexImplementation::Sasi(options) => format!(
            "CREATE CUSTOM INDEX IF NOT EXISTS {name} ON {table} ({column}) USING '{SASI_CLASS}' WITH OPTIONS = {{{}}}",
            sasi_options(options)
        ),
        IndexImplementation::DseSearch { .. } => format!(
            "CREATE CUSTOM INDEX IF NOT EXISTS {name} ON {table} ({column}) USING '{DSE_SEARCH_CLASS}'"
        ),
    }
}

fn sasi_options(options: SasiOptions) -> String {
    let mode = match options.mode {
        SasiMode::Prefix => "PREFIX",
        SasiMode::Contains => "CONTAINS",
        SasiMode::Sparse => "SPARSE",
    };

    let mut pairs = vec![("mode", mode.to_string())];
    if options.analyzed {
        let analyzer = match options.analyzer {
            SasiAnalyzer::NonTokenizing => {
                "org.apache.cassandra.index.sasi.analyzer.NonTokenizingAnalyzer"
            }
            SasiAnalyzer::Standard => "org.apache.cassandra.index.sasi.analyzer.StandardAnalyzer",
        };
        pairs.push(("analyzed", "true".to_string()));
        pairs.push(("analyzer_class", analyzer.to_string()));
        pairs.push(("case_sensitive", options.case_sensitive.to_string()));
        match options.normalization {
            Normalization::None => {}
            Normalization::Lowercase => pairs.push(("normalize_lowercase", "true".to_string())),
            Normalization::Uppercase => pairs.push(("normalize_uppercase", "true".to_string())),
        }
    }

    pairs
        .into_iter()
        .map(|(k, v)| format!("'{k}': '{v}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn stored_fields(entity: &EntityModel) -> impl Iterator<Item = &FieldModel> {
    entity
        .ordered_fields()
        .into_iter()
        .filter(|f| f.role != ColumnRole::Computed)
}

fn primary_key(entity: &EntityModel) -> String {
    let partition = entity
        .partition_fields()
        .iter()
        .map(|f| f.column.clone())
        .collect::<Vec<_>>();
    let partition = if partition.len() == 1 {
        partition.join("")
    } else {
        format!("({})", partition.join(", "))
    };

    std::iter::once(partition)
        .chain(entity.clustering_fields().iter().map(|f| f.column.clone()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn clustering_order(entity: &EntityModel) -> String {
    let order = entity
        .clustering_fields()
        .iter()
        .map(|f| match f.role {
            ColumnRole::Clustering {
                ascending: false, ..
            } => format!("{} DESC", f.column),
            _ => format!("{} ASC", f.column),
        })
        .collect::<Vec<_>>();

    if order.is_empty() {
        String::new()
    } else {
        format!(" WITH CLUSTERING ORDER BY ({})", order.join(", "))
    }
}
