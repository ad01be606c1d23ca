//! Structural pattern queries, one bundle per language.
//!
//! Each slot holds a list of pattern groups. Groups are compiled one by one,
//! so a group that does not match the grammar revision in use is dropped on
//! its own while the rest of the slot keeps working.

pub mod c;
pub mod java;
pub mod javascript;
pub mod php;
pub mod python;
pub mod typescript;

/// Named query slots shared by every language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    ImportStatements,
    DefinitionTemplate,
    ConstructorDefinitions,
    ExportClauses,
    /// Global-scope assignments turned into graph nodes.
    Assignments,
    /// Assignments at any scope, read by the calls resolver.
    VariableAssignments,
    Calls,
}

impl QueryKind {
    pub const ALL: [QueryKind; 7] = [
        QueryKind::ImportStatements,
        QueryKind::DefinitionTemplate,
        QueryKind::ConstructorDefinitions,
        QueryKind::ExportClauses,
        QueryKind::Assignments,
        QueryKind::VariableAssignments,
        QueryKind::Calls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::ImportStatements => "import_statements",
            QueryKind::DefinitionTemplate => "definition_template",
            QueryKind::ConstructorDefinitions => "constructor_definitions",
            QueryKind::ExportClauses => "export_clauses",
            QueryKind::Assignments => "assignments",
            QueryKind::VariableAssignments => "variable_assignments",
            QueryKind::Calls => "calls",
        }
    }
}

pub struct QueryBundle {
    /// Bundle whose groups come before this bundle's own groups.
    pub extends: Option<&'static QueryBundle>,
    pub import_statements: &'static [&'static str],
    pub definition_template: &'static [&'static str],
    pub constructor_definitions: &'static [&'static str],
    pub export_clauses: &'static [&'static str],
    pub assignments: &'static [&'static str],
    pub variable_assignments: &'static [&'static str],
    pub calls: &'static [&'static str],
    /// Pattern capturing `@code` statements that chain calls on a global
    /// named `name`. An empty string means the language has none.
    pub extra_assignment_code: fn(&str) -> String,
}

impl QueryBundle {
    /// All pattern groups for a slot, inherited groups first.
    pub fn patterns(&self, kind: QueryKind) -> Vec<&'static str> {
        let mut patterns = self
            .extends
            .map(|base| base.patterns(kind))
            .unwrap_or_default();
        patterns.extend(
            self.own(kind)
                .iter()
                .copied()
                .filter(|p| !p.trim().is_empty()),
        );
        patterns
    }

    fn own(&self, kind: QueryKind) -> &'static [&'static str] {
        match kind {
            QueryKind::ImportStatements => self.import_statements,
            QueryKind::DefinitionTemplate => self.definition_template,
            QueryKind::ConstructorDefinitions => self.constructor_definitions,
            QueryKind::ExportClauses => self.export_clauses,
            QueryKind::Assignments => self.assignments,
            QueryKind::VariableAssignments => self.variable_assignments,
            QueryKind::Calls => self.calls,
        }
    }
}

/// Escapes a name for use inside a tree-sitter `#match?` regex.
pub(crate) fn escape_name(name: &str) -> String {
    regex::escape(name).replace('"', "\\\"")
}

pub(crate) fn no_extra_assignment_code(_name: &str) -> String {
    String::new()
}
