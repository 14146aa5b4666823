//! Table and column resolution.
//!
//! One [`TableAndColumnMapper`] is built per translation from the FROM
//! clause. It owns the physical identity of every referenced table and
//! the union of their schemas, and resolves column references against
//! them.

use serde::Serialize;

use crate::model::{ColumnModel, ColumnType, IdAndVersion};
use crate::sql::naming::{self, ROW_ETAG};

use super::ast::{ColumnReference, DerivedColumn, QuerySpecification, TableReference, ValueExpression};
use super::error::{TranslationError, TranslationResult};
use super::provider::SchemaProvider;

/// One table referenced by a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table reference text as the caller wrote it.
    pub original_name: String,
    pub id: IdAndVersion,
    pub alias: Option<String>,
    /// Physical index table, `T<id>[_<v>]`.
    pub translated_name: String,
    /// `_A<n>` when more than one table participates.
    pub translated_alias: Option<String>,
}

impl TableInfo {
    fn new(reference: &TableReference, position: usize, multi_table: bool) -> TranslationResult<Self> {
        let id: IdAndVersion = reference.name.parse()?;
        Ok(Self {
            original_name: reference.name.clone(),
            id,
            alias: reference.alias.clone(),
            translated_name: naming::index_table_name(&id),
            translated_alias: multi_table.then(|| naming::table_alias(position)),
        })
    }

    /// Whether a column qualifier names this table.
    pub fn matches_qualifier(&self, qualifier: &str) -> bool {
        match &self.alias {
            Some(alias) if alias == qualifier => true,
            _ => self.original_name.eq_ignore_ascii_case(qualifier),
        }
    }
}

/// A column reference resolved against the mapped tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedColumn {
    Schema { table: usize, model: ColumnModel },
    Metadata { table: usize, name: &'static str },
}

impl ResolvedColumn {
    pub fn table(&self) -> usize {
        match self {
            ResolvedColumn::Schema { table, .. } | ResolvedColumn::Metadata { table, .. } => *table,
        }
    }

    pub fn model(&self) -> Option<&ColumnModel> {
        match self {
            ResolvedColumn::Schema { model, .. } => Some(model),
            ResolvedColumn::Metadata { .. } => None,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ResolvedColumn::Schema { model, .. } => model.column_type,
            ResolvedColumn::Metadata { name, .. } if *name == ROW_ETAG => ColumnType::String,
            ResolvedColumn::Metadata { .. } => ColumnType::Integer,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, ResolvedColumn::Schema { model, .. } if model.column_type == ColumnType::Double)
    }

    /// `_C<id>_` or the reserved metadata name.
    pub fn physical_name(&self) -> String {
        match self {
            ResolvedColumn::Schema { model, .. } => naming::column_name(model.id),
            ResolvedColumn::Metadata { name, .. } => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableAndColumnMapper {
    tables: Vec<TableInfo>,
    schemas: Vec<Vec<ColumnModel>>,
}

impl TableAndColumnMapper {
    pub fn new(query: &QuerySpecification, provider: &dyn SchemaProvider) -> TranslationResult<Self> {
        let references: Vec<&TableReference> = query.tables().collect();
        let multi_table = references.len() > 1;
        let mut tables = Vec::with_capacity(references.len());
        let mut schemas = Vec::with_capacity(references.len());
        for (position, reference) in references.into_iter().enumerate() {
            let info = TableInfo::new(reference, position, multi_table)?;
            schemas.push(provider.table_schema(&info.id)?);
            tables.push(info);
        }
        Ok(Self { tables, schemas })
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn is_multi_table(&self) -> bool {
        self.tables.len() > 1
    }

    pub fn single_table_id(&self) -> Option<IdAndVersion> {
        match self.tables.as_slice() {
            [table] => Some(table.id),
            _ => None,
        }
    }

    /// Union of all referenced schemas, table then column order, each
    /// column id once.
    pub fn union_of_schemas(&self) -> Vec<ColumnModel> {
        let mut union: Vec<ColumnModel> = Vec::new();
        for column in self.schemas.iter().flatten() {
            if !union.iter().any(|c| c.id == column.id) {
                union.push(column.clone());
            }
        }
        union
    }

    /// `*` as one column reference per schema column per table.
    pub fn expand_asterisk(&self) -> Vec<DerivedColumn> {
        let multi_table = self.is_multi_table();
        self.tables
            .iter()
            .zip(&self.schemas)
            .flat_map(|(table, schema)| {
                schema.iter().map(move |column| {
                    let mut reference = ColumnReference::new(column.name.clone());
                    if multi_table {
                        reference.qualifier =
                            Some(table.alias.clone().unwrap_or_else(|| table.original_name.clone()));
                    }
                    DerivedColumn::new(ValueExpression::Column(reference))
                })
            })
            .collect()
    }

    /// Resolve a column reference.
    ///
    /// Reserved metadata names match case-insensitively, schema columns
    /// case-sensitively.
    pub fn lookup(&self, column: &ColumnReference) -> TranslationResult<ResolvedColumn> {
        let candidates: Vec<usize> = match &column.qualifier {
            Some(qualifier) => {
                let table = self
                    .tables
                    .iter()
                    .position(|t| t.matches_qualifier(qualifier))
                    .ok_or_else(|| TranslationError::UnknownTable(qualifier.clone()))?;
                vec![table]
            }
            None => (0..self.tables.len()).collect(),
        };

        if let Some(name) = naming::reserved_column_name(&column.name) {
            return match candidates.as_slice() {
                [table] => Ok(ResolvedColumn::Metadata {
                    table: *table,
                    name,
                }),
                _ => Err(TranslationError::AmbiguousColumn(column.to_string())),
            };
        }

        let mut found = candidates.into_iter().filter_map(|table| {
            self.schemas[table]
                .iter()
                .find(|c| c.name == column.name)
                .map(|model| ResolvedColumn::Schema {
                    table,
                    model: model.clone(),
                })
        });
        match (found.next(), found.next()) {
            (Some(resolved), None) => Ok(resolved),
            (Some(_), Some(_)) => Err(TranslationError::AmbiguousColumn(column.to_string())),
            (None, _) => Err(TranslationError::UnknownColumn(column.name.clone())),
        }
    }

    /// Logical column for a caller-facing name.
    pub fn column_model(&self, name: &str) -> Option<&ColumnModel> {
        self.schemas.iter().flatten().find(|c| c.name == name)
    }

    /// Alias to qualify physical columns of a table with, if any.
    pub fn table_qualifier(&self, table: usize) -> Option<&str> {
        self.tables
            .get(table)
            .and_then(|t| t.translated_alias.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;
    use crate::query::provider::InMemorySchemaProvider;

    fn provider() -> InMemorySchemaProvider {
        InMemorySchemaProvider::new()
            .with_table(
                IdAndVersion::new(1),
                vec![
                    ColumnModel::new(11, "a", ColumnType::Integer),
                    ColumnModel::new(12, "shared", ColumnType::String).with_max_size(10),
                ],
            )
            .with_table(
                IdAndVersion::new(2),
                vec![
                    ColumnModel::new(21, "b", ColumnType::Double),
                    ColumnModel::new(12, "shared", ColumnType::String).with_max_size(10),
                ],
            )
    }

    fn mapper(sql: &str) -> TableAndColumnMapper {
        TableAndColumnMapper::new(&parse_query(sql).unwrap(), &provider()).unwrap()
    }

    #[test]
    fn test_single_table() {
        let mapper = mapper("select * from \"syn1.3\"");
        assert_eq!(mapper.single_table_id(), Some(IdAndVersion::versioned(1, 3)));
        assert_eq!(mapper.tables()[0].translated_name, "T1_3");
        assert_eq!(mapper.tables()[0].translated_alias, None);
        assert_eq!(mapper.table_qualifier(0), None);
    }

    #[test]
    fn test_reserved_names_resolve_case_insensitively() {
        let mapper = mapper("select * from syn1");
        for name in ["row_id", "ROW_ID", "Row_Id"] {
            let resolved = mapper.lookup(&ColumnReference::bare(name)).unwrap();
            assert_eq!(resolved.physical_name(), "ROW_ID");
            assert_eq!(resolved.column_type(), ColumnType::Integer);
        }
    }

    #[test]
    fn test_schema_names_are_case_sensitive() {
        let mapper = mapper("select * from syn1");
        assert_eq!(
            mapper.lookup(&ColumnReference::bare("a")).unwrap().physical_name(),
            "_C11_"
        );
        assert_eq!(
            mapper.lookup(&ColumnReference::bare("A")),
            Err(TranslationError::UnknownColumn("A".into()))
        );
    }

    #[test]
    fn test_multi_table_lookup() {
        let mapper = mapper("select * from syn1 t1 join syn2 t2 on t1.a = t2.b");
        assert!(mapper.is_multi_table());
        assert_eq!(mapper.single_table_id(), None);
        assert_eq!(mapper.table_qualifier(1), Some("_A1"));

        let b = mapper.lookup(&ColumnReference::bare("b")).unwrap();
        assert_eq!(b.table(), 1);
        assert!(b.is_double());

        assert!(matches!(
            mapper.lookup(&ColumnReference::bare("shared")),
            Err(TranslationError::AmbiguousColumn(_))
        ));
        let shared = mapper.lookup(&ColumnReference::qualified("t2", "shared")).unwrap();
        assert_eq!(shared.table(), 1);
        assert!(matches!(
            mapper.lookup(&ColumnReference::qualified("t3", "a")),
            Err(TranslationError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_union_and_asterisk_expansion() {
        let mapper = mapper("select * from syn1 join syn2 on syn1.a = syn2.b");
        let ids: Vec<i64> = mapper.union_of_schemas().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11, 12, 21]);

        let expanded: Vec<String> = mapper
            .expand_asterisk()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            expanded,
            vec![
                "syn1.\"a\"",
                "syn1.\"shared\"",
                "syn2.\"b\"",
                "syn2.\"shared\""
            ]
        );
    }
}
