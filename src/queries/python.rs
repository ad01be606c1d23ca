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
    r#"
(import_statement
  name: (dotted_name) @module) @import_statement
"#,
    r#"
(import_statement
  name: (aliased_import
    name: (_) @module
    alias: (_) @alias)) @import_statement
"#,
    r#"
(import_from_statement
  module_name: (_) @module
  name: (dotted_name) @name) @import_statement
"#,
    r#"
(import_from_statement
  module_name: (_) @module
  name: (aliased_import
    name: (_) @name
    alias: (_) @alias)) @import_statement
"#,
    r#"
(import_from_statement
  module_name: (_) @module
  (wildcard_import) @wildcard) @import_statement
"#,
];

const DEFINITION_TEMPLATE: &[&str] = &[
    r#"
(function_definition
  name: (identifier) @name
  body: (block) @body)

(class_definition
  name: (identifier) @name
  body: (block) @body)
"#,
    r#"
(function_definition
  body: (block . (expression_statement (string) @documentation)))

(class_definition
  body: (block . (expression_statement (string) @documentation)))
"#,
    r#"
(assignment
  left: (identifier) @name)
"#,
];

const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(function_definition) @function
(class_definition) @class
"#,
];

// Globals only
const ASSIGNMENTS: &[&str] = &[
    r#"
(module
  (expression_statement
    (assignment
      left: (identifier)
      right: (_)) @assignment))
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(assignment
  left: (identifier) @left
  right: (_) @right) @assignment
"#,
    r#"
(typed_parameter
  (identifier) @left
  type: (_) @right) @assignment
"#,
    r#"
(typed_default_parameter
  name: (identifier) @left
  type: (_) @right) @assignment
"#,
];

const CALLS: &[&str] = &[
    r#"
(call function: (identifier) @identifier.name)
(call function: (attribute) @identifier.name)
"#,
    r#"
(typed_parameter type: (_) @parameter_type)
(typed_default_parameter type: (_) @parameter_type)
(function_definition return_type: (_) @return_type)
"#,
    // pydantic style fields
    r#"
(class_definition
  body: (block
    (expression_statement
      (assignment type: (_) @parameter_type))))
"#,
    r#"
(expression_statement (assignment right: (identifier) @identifier.name))
(keyword_argument value: (identifier) @identifier.name)
(argument_list (identifier) @identifier.name)
"#,
    r#"
(_ (attribute) @identifier.name)
(_ object: (_) @identifier.name)
"#,
];

fn extra_assignment_code(name: &str) -> String {
    let name = escape_name(name);
    format!(
        r#"
(module
  (expression_statement
    (call
      function: (_) @identifier.name
      (#match? @identifier.name "^{name}(\\.|$)")) @code))
"#
    )
}
