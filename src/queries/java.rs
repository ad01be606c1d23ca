use super::{QueryBundle, no_extra_assignment_code};

pub static QUERIES: QueryBundle = QueryBundle {
    extends: None,
    import_statements: IMPORT_STATEMENTS,
    definition_template: DEFINITION_TEMPLATE,
    constructor_definitions: CONSTRUCTOR_DEFINITIONS,
    export_clauses: &[],
    // no global assignments
    assignments: &[],
    variable_assignments: VARIABLE_ASSIGNMENTS,
    calls: CALLS,
    extra_assignment_code: no_extra_assignment_code,
};

const IMPORT_STATEMENTS: &[&str] = &[
    r#"
(import_declaration
  (scoped_identifier
    scope: (_) @module
    name: (_) @name)) @import_statement
"#,
    r#"
(import_declaration
  (identifier) @module) @import_statement
"#,
    r#"
(import_declaration
  (scoped_identifier) @module
  (asterisk) @wildcard) @import_statement
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
];

// Constructors are members named like their class.
const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(class_declaration) @class
(interface_declaration) @interface
(enum_declaration) @enum
"#,
    r#"
(method_declaration) @method
(constructor_declaration) @method
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(variable_declarator
  name: (identifier) @left
  value: (identifier) @right) @assignment

(variable_declarator
  name: (identifier) @left
  value: (object_creation_expression
    type: (_) @right)) @assignment
"#,
    r#"
(local_variable_declaration
  type: (type_identifier) @right
  declarator: (variable_declarator
    name: (identifier) @left)) @assignment

(formal_parameter
  type: (type_identifier) @right
  name: (identifier) @left) @assignment
"#,
];

const CALLS: &[&str] = &[
    r#"
(method_invocation) @identifier.name
(field_access) @identifier.name
"#,
    r#"
(object_creation_expression
  type: (_) @identifier.name)
"#,
    r#"
(type_identifier) @parameter_type
"#,
    r#"
(_ object: (_) @identifier.name)
"#,
];
