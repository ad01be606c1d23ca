//! TypeScript adds interfaces, enums, type aliases and type annotations on
//! top of the JavaScript bundle. The TSX grammar shares this bundle.

use super::{QueryBundle, javascript};

pub static QUERIES: QueryBundle = QueryBundle {
    extends: Some(&javascript::QUERIES),
    import_statements: &[],
    definition_template: DEFINITION_TEMPLATE,
    constructor_definitions: CONSTRUCTOR_DEFINITIONS,
    export_clauses: &[],
    assignments: &[],
    variable_assignments: VARIABLE_ASSIGNMENTS,
    calls: CALLS,
    extra_assignment_code: javascript::extra_assignment_code,
};

const DEFINITION_TEMPLATE: &[&str] = &[
    r#"
(type_alias_declaration
  name: (_) @name
  value: (_) @body)
"#,
    // signatures have no body
    r#"
(method_signature
  name: (_) @name)

(abstract_method_signature
  name: (_) @name)
"#,
];

const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(method_signature) @function
(abstract_method_signature) @function
(interface_declaration) @interface
"#,
    r#"
(abstract_class_declaration) @class
"#,
    r#"
(enum_declaration) @enum
"#,
    r#"
(program
  (type_alias_declaration) @type)

(program
  (export_statement
    (type_alias_declaration) @type))
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(required_parameter
  pattern: (identifier) @left
  type: (type_annotation (type_identifier) @right)) @assignment

(optional_parameter
  pattern: (identifier) @left
  type: (type_annotation (type_identifier) @right)) @assignment
"#,
    // annotated lambda parameters of `forEach`, `map` and `reduce`; a class
    // annotation opens a later window and wins
    r#"
(call_expression
  function: (member_expression
    object: (identifier) @right
    property: (property_identifier) @_method)
  arguments: (arguments
    (arrow_function
      parameters: (formal_parameters . (required_parameter pattern: (identifier) @left))))
  (#any-of? @_method "forEach" "map")) @assignment

(call_expression
  function: (member_expression
    object: (identifier) @right
    property: (property_identifier) @_method)
  arguments: (arguments
    (arrow_function
      parameters: (formal_parameters (required_parameter pattern: (identifier) @left) .)))
  (#eq? @_method "reduce")) @assignment
"#,
];

// Declared names also match; the resolver skips them.
const CALLS: &[&str] = &[
    r#"
(type_identifier) @parameter_type
"#,
];
