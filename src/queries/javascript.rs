use super::{QueryBundle, escape_name};

pub static QUERIES: QueryBundle = QueryBundle {
    extends: None,
    import_statements: IMPORT_STATEMENTS,
    definition_template: DEFINITION_TEMPLATE,
    constructor_definitions: CONSTRUCTOR_DEFINITIONS,
    export_clauses: EXPORT_CLAUSES,
    assignments: ASSIGNMENTS,
    variable_assignments: VARIABLE_ASSIGNMENTS,
    calls: CALLS,
    extra_assignment_code,
};

// `@module` holds only the string fragment, without quotes.
const IMPORT_STATEMENTS: &[&str] = &[
    r#"
(import_statement
  source: (string (string_fragment) @module)) @import_statement
"#,
    r#"
(import_statement
  (import_clause (identifier) @name)
  source: (string (string_fragment) @module)) @import_statement
"#,
    r#"
(import_statement
  (import_clause
    (namespace_import (identifier) @alias))
  source: (string (string_fragment) @module)) @import_statement
"#,
    r#"
(import_statement
  (import_clause
    (named_imports
      (import_specifier
        name: (_) @name
        !alias)))
  source: (string (string_fragment) @module)) @import_statement
"#,
    r#"
(import_statement
  (import_clause
    (named_imports
      (import_specifier
        name: (_) @name
        alias: (_) @alias)))
  source: (string (string_fragment) @module)) @import_statement
"#,
    r#"
(lexical_declaration
  (variable_declarator
    name: (identifier) @alias
    value: (call_expression
      function: (identifier) @_fn
      arguments: (arguments (string (string_fragment) @module)))
    (#eq? @_fn "require"))) @import_statement

(variable_declaration
  (variable_declarator
    name: (identifier) @alias
    value: (call_expression
      function: (identifier) @_fn
      arguments: (arguments (string (string_fragment) @module)))
    (#eq? @_fn "require"))) @import_statement
"#,
    r#"
(lexical_declaration
  (variable_declarator
    name: (object_pattern
      (shorthand_property_identifier_pattern) @name)
    value: (call_expression
      function: (identifier) @_fn
      arguments: (arguments (string (string_fragment) @module)))
    (#eq? @_fn "require"))) @import_statement
"#,
];

const DEFINITION_TEMPLATE: &[&str] = &[
    r#"
(_
  name: (_) @name
  body: (_) @body)
"#,
    r#"
(variable_declarator
  name: (_) @name
  value: (arrow_function
    body: (_) @body))

(variable_declarator
  name: (_) @name
  value: (function_expression
    body: (_) @body))
"#,
    r#"
(variable_declarator
  name: (identifier) @name)
"#,
];

const CONSTRUCTOR_DEFINITIONS: &[&str] = &[
    r#"
(export_statement) @export
"#,
    r#"
(function_declaration) @function
(generator_function_declaration) @function
"#,
    r#"
(lexical_declaration
  (variable_declarator
    value: (arrow_function))) @function

(lexical_declaration
  (variable_declarator
    value: (function_expression))) @function
"#,
    r#"
(method_definition) @method
(class_declaration) @class
"#,
];

// Globals only. `!body` keeps arrow functions out.
const ASSIGNMENTS: &[&str] = &[
    r#"
(program
  (lexical_declaration
    (variable_declarator
      name: (identifier)
      value: (_ !body)) @assignment))

(program
  (variable_declaration
    (variable_declarator
      name: (identifier)
      value: (_ !body)) @assignment))
"#,
    r#"
(program
  (export_statement
    (lexical_declaration
      (variable_declarator
        name: (identifier)
        value: (_ !body)) @assignment)))
"#,
];

const EXPORT_CLAUSES: &[&str] = &[
    r#"
(export_clause
  (export_specifier
    name: (_) @name
    !alias))
"#,
    r#"
(export_clause
  (export_specifier
    name: (_) @name
    alias: (_) @alias))
"#,
];

const VARIABLE_ASSIGNMENTS: &[&str] = &[
    r#"
(assignment_expression
  left: (identifier) @left
  right: (identifier) @right) @assignment

(assignment_expression
  left: (identifier) @left
  right: (member_expression) @right) @assignment

(assignment_expression
  left: (identifier) @left
  right: (new_expression
    constructor: (_) @right)) @assignment
"#,
    r#"
(variable_declarator
  name: (identifier) @left
  value: (identifier) @right) @assignment

(variable_declarator
  name: (identifier) @left
  value: (member_expression) @right) @assignment

(variable_declarator
  name: (identifier) @left
  value: (new_expression
    constructor: (_) @right)) @assignment
"#,
    // `items.forEach(i => ...)`: the first parameter stands for `items`
    r#"
(call_expression
  function: (member_expression
    object: (identifier) @right
    property: (property_identifier) @_method)
  arguments: (arguments
    (arrow_function
      parameter: (identifier) @left))
  (#any-of? @_method "forEach" "map")) @assignment

(call_expression
  function: (member_expression
    object: (identifier) @right
    property: (property_identifier) @_method)
  arguments: (arguments
    (arrow_function
      parameters: (formal_parameters . (_) @left)))
  (#match? @left "^[A-Za-z_$][A-Za-z0-9_$]*$")
  (#any-of? @_method "forEach" "map")) @assignment
"#,
    // the element is the last parameter of a `reduce` callback
    r#"
(call_expression
  function: (member_expression
    object: (identifier) @right
    property: (property_identifier) @_method)
  arguments: (arguments
    (arrow_function
      parameters: (formal_parameters (_) @left .)))
  (#match? @left "^[A-Za-z_$][A-Za-z0-9_$]*$")
  (#eq? @_method "reduce")) @assignment
"#,
];

const CALLS: &[&str] = &[
    r#"
(call_expression function: (_) @identifier.name)
(new_expression constructor: (_) @identifier.name)
"#,
    r#"
(assignment_expression right: (member_expression) @identifier.name)
(_ (member_expression) @identifier.name)
"#,
    r#"
(arguments (identifier) @identifier.name)
(pair value: (identifier) @identifier.name)
(variable_declarator value: (identifier) @identifier.name)
"#,
    r#"
(_ object: (_) @identifier.name)
"#,
];

pub(super) fn extra_assignment_code(name: &str) -> String {
    let name = escape_name(name);
    format!(
        r#"
(program
  (expression_statement
    (call_expression
      function: (_) @identifier.name
      (#match? @identifier.name "^{name}(\\.|$)")) @code))
"#
    )
}
