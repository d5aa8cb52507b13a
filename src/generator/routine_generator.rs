//! Stub procedure and function definitions from a parameter list

use crate::model::ProcedureParameter;
use crate::parser::quote_table_id;

/// Type used when a parameter or function return type is unknown
const FALLBACK_TYPE: &str = "sql_variant";

pub fn generate_procedure_definition(id: &str, parameters: &[ProcedureParameter]) -> String {
    let mut sql = format!("CREATE PROCEDURE {}", quote_table_id(id));
    if !parameters.is_empty() {
        sql.push('\n');
        sql.push_str(&parameter_block(parameters));
    }
    sql.push_str("\nAS\nBEGIN\n    SET NOCOUNT ON;\nEND");
    sql
}

pub fn generate_function_definition(
    id: &str,
    parameters: &[ProcedureParameter],
    return_type: Option<&str>,
) -> String {
    let mut sql = format!("CREATE FUNCTION {} (", quote_table_id(id));
    if !parameters.is_empty() {
        sql.push('\n');
        sql.push_str(&parameter_block(parameters));
        sql.push('\n');
    }
    sql.push(')');

    let return_type = return_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(FALLBACK_TYPE);
    sql.push_str(&format!(
        "\nRETURNS {}\nAS\nBEGIN\n    RETURN NULL;\nEND",
        return_type
    ));
    sql
}

/// One indented `@name type [OUTPUT]` line per parameter, comma-joined.
fn parameter_block(parameters: &[ProcedureParameter]) -> String {
    parameters
        .iter()
        .map(|p| format!("    {}", parameter_line(p)))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn parameter_line(parameter: &ProcedureParameter) -> String {
    let name = parameter.name.trim();
    let mut line = if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{}", name)
    };

    line.push(' ');
    let data_type = parameter.data_type.trim();
    line.push_str(if data_type.is_empty() {
        FALLBACK_TYPE
    } else {
        data_type
    });

    if parameter.is_output {
        line.push_str(" OUTPUT");
    }
    line
}
