/// Schema Introspection Module
///
/// Fixed INFORMATION_SCHEMA queries and the column mappings that normalize
/// their results. The handler runs the queries through its raw executor and
/// applies the mappings with `HandlerResponse::project`.

use super::driver::SqlParameter;

/// Schema that holds Druid datasources.
pub const DRUID_SCHEMA: &str = "druid";

pub const TABLES_QUERY: &str = "SELECT *\nFROM INFORMATION_SCHEMA.TABLES";

pub const COLUMNS_QUERY: &str = "SELECT *\nFROM INFORMATION_SCHEMA.COLUMNS\nWHERE \"TABLE_SCHEMA\" = ? AND \"TABLE_NAME\" = ?";

/// Source column to normalized column, for table listings.
pub const TABLE_COLUMNS: [(&str, &str); 2] = [("TABLE_NAME", "table_name"), ("TABLE_TYPE", "table_type")];

/// Source column to normalized column, for column listings.
pub const COLUMN_COLUMNS: [(&str, &str); 2] = [("COLUMN_NAME", "column_name"), ("DATA_TYPE", "data_type")];

/// Parameters for [`COLUMNS_QUERY`]. The table name is bound, never
/// spliced into the query text.
pub fn columns_query_parameters(table_name: &str) -> Vec<SqlParameter> {
    vec![SqlParameter::varchar(DRUID_SCHEMA), SqlParameter::varchar(table_name)]
}
