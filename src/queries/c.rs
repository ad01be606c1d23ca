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

// System headers keep their angle brackets and never resolve.
const IMPORT_STATEMENTS: &[&str] = &[
    r#"
(preproc_include
  path: (system_lib_string) @module) @import_statement
"#,
    r#"
(preproc_include
  path: (string_literal (string_content) @module)) @import_statement
"#,
];

const DEFINITION_TEMPLATE: &[&str] = &[
    r#"
(function_definition
  declarator: (function_declarator
    declarator: (identifier) @name)
  body: (_) @body)

(function_definition
  declarator: (pointer_declarator
    declarator: (function_declarator
      declarator: (identifier) @name))
  body: (_) @body)
"#,
    r#"
(struct_specifier
  name: (_) @name
  body: (_) @body)

(union_specifier
  name: (_) @name
  body: (_) @body)

(enum_specifier
  name: (_) @name
  body: (_) @body)
"#,
    r#"
(type_definition
  type: (struct_specifier
    body: (_) @body)
  declarator: (type_identifier) @name)
"#,
    // global declarations
    r#"
(declaration
  declarator: (init_declarator
    declarator: (identifier) @name))

(declaration
  declarator: (init_declarator
    declarator: (pointer_declarator
      declarator: (identifier) @name)))

(declaration
  declarator: (identifier) @name)
"#,
];

const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(function_definition) @function
"#,
    r#"
(struct_specifier body: (_)) @struct
(union_specifier body: (_)) @union
(enum_specifier body: (_)) @enum
"#,
    r#"
(type_definition
  type: (struct_specifier body: (_))) @struct
"#,
];

const ASSIGNMENTS: &[&str] = &[
    r#"
(translation_unit
  (declaration
    declarator: (init_declarator
      value: (_))) @assignment)
"#,
    r#"
(translation_unit
  (declaration
    declarator: (identifier)) @assignment)
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(init_declarator
  declarator: (identifier) @left
  value: (identifier) @right) @assignment

(assignment_expression
  left: (identifier) @left
  right: (identifier) @right) @assignment
"#,
];

const CALLS: &[&str] = &[
    r#"
(call_expression function: (identifier) @identifier.name)
(call_expression function: (field_expression) @identifier.name)
"#,
    r#"
(argument_list (identifier) @identifier.name)
"#,
    r#"
(type_identifier) @parameter_type
"#,
];

fn extra_assignment_code(name: &str) -> String {
    let name = escape_name(name);
    format!(
        r#"
(translation_unit
  (expression_statement
    (call_expression
      function: (field_expression
        argument: (identifier) @identifier.name)
      (#eq? @identifier.name "{name}")) @code))
"#
    )
}
