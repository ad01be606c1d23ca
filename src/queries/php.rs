use super::{QueryBundle, escape_name};

pub static QUERIES: QueryBundle = QueryBundle {
    extends: None,
    import_statements: IMPORT_STATEMENTS,
    definition_template: DEFINITION_TEMPLATE,
    constructor_definitions: CONSTRUCTOR_DEFINITIONS,
    export_clauses: &[],
    assignments: ASSIGNMENTS,
    variable_assignments: VARIABLE_ASSIGNMENTS,
    calls: CALLS,
    extra_assignment_code,
};

const IMPORT_STATEMENTS: &[&str] = &[
    // quotes are trimmed when statements are generated
    r#"
(expression_statement
  (include_expression [(string) (encapsed_string)] @module)) @import_statement
(expression_statement
  (include_once_expression [(string) (encapsed_string)] @module)) @import_statement
(expression_statement
  (require_expression [(string) (encapsed_string)] @module)) @import_statement
(expression_statement
  (require_once_expression [(string) (encapsed_string)] @module)) @import_statement
"#,
    // `use App\Models\User;` is split into module and name when generated
    r#"
(namespace_use_declaration
  (namespace_use_clause
    (qualified_name) @module)) @import_statement
"#,
];

const DEFINITION_TEMPLATE: &[&str] = &[
    r#"
(_
  name: (_) @name
  body: (_) @body)
"#,
    // abstract and interface methods
    r#"
(method_declaration
  name: (_) @name)
"#,
    r#"
(assignment_expression
  left: (variable_name (name) @name))
"#,
    r#"
(namespace_definition
  name: (_) @name)
"#,
];

const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(class_declaration) @class
(interface_declaration) @interface
"#,
    r#"
(trait_declaration) @class
"#,
    r#"
(method_declaration) @method
(function_definition) @function
"#,
    // `namespace A;` is extended to the next namespace when built
    r#"
(namespace_definition) @namespace
"#,
];

// Globals only. The whole statement is kept so its `;` stays in the code.
const ASSIGNMENTS: &[&str] = &[
    r#"
(program
  (expression_statement
    (assignment_expression
      left: (variable_name)
      right: (_))) @assignment)
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(assignment_expression
  left: (variable_name) @left
  right: (object_creation_expression (name) @right)) @assignment

(assignment_expression
  left: (variable_name) @left
  right: (object_creation_expression (qualified_name) @right)) @assignment
"#,
    r#"
(assignment_expression
  left: (variable_name) @left
  right: (variable_name) @right) @assignment
"#,
];

const CALLS: &[&str] = &[
    r#"
(function_call_expression function: (_) @identifier.name)
"#,
    r#"
(member_call_expression) @identifier.name
(scoped_call_expression) @identifier.name
"#,
    r#"
(object_creation_expression (name) @identifier.name)
(object_creation_expression (qualified_name) @identifier.name)
"#,
    r#"
(named_type) @parameter_type
"#,
];

fn extra_assignment_code(name: &str) -> String {
    let name = escape_name(name);
    format!(
        r#"
(program
  (expression_statement
    (member_call_expression
      object: (variable_name (name) @identifier.name)
      (#eq? @identifier.name "{name}"))) @code)
"#
    )
}
