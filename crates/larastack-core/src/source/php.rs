//! PHP structural queries and the edits derived from them
//!
//! Every query is a filter over [`SyntaxNode::find_all`] / [`SyntaxNode::find_first`]
//! plus kind and field checks. Edit builders take the original source and push
//! spans into an [`EditSet`]; they return how many constructs they touched so
//! callers can log it.

use crate::source::edit::{EditSet, Span};
use crate::source::lines::{has_newline, indentation_at, line_end, line_start, whole_line_span};
use crate::source::syntax::SyntaxNode;

/// Decoded value of a string literal without interpolation
pub fn string_value(node: &SyntaxNode, source: &str) -> Option<String> {
    let text = node.text(source);
    match node.kind() {
        "string" => {
            let body = text
                .strip_prefix(['b', 'B'])
                .unwrap_or(text)
                .strip_prefix('\'')?
                .strip_suffix('\'')?;
            Some(unescape_single_quoted(body))
        }
        "encapsed_string" => {
            let body = text.strip_prefix('"')?.strip_suffix('"')?;
            if body.contains('$') || body.contains('\\') {
                return None;
            }
            Some(body.to_string())
        }
        _ => None,
    }
}

fn unescape_single_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Text of a `name` / `qualified_name` node without a leading namespace separator
pub fn name_text<'s>(node: &SyntaxNode, source: &'s str) -> &'s str {
    node.text(source).trim_start_matches('\\')
}

/// Whether a (possibly qualified) name refers to `short` or to the fully qualified `short`
fn name_matches(name: &str, target: &str) -> bool {
    name == target || name.rsplit('\\').next() == Some(target) && !target.contains('\\')
}

fn is_name(node: &SyntaxNode) -> bool {
    node.is_kind("name") || node.is_kind("qualified_name")
}

// =============================================================================
// Declarations
// =============================================================================

/// First class declaration, optionally restricted to a class name
pub fn find_class<'a>(
    root: &'a SyntaxNode,
    source: &str,
    name: Option<&str>,
) -> Option<&'a SyntaxNode> {
    root.find_all(|node| node.is_kind("class_declaration"))
        .into_iter()
        .find(|class| match name {
            None => true,
            Some(wanted) => class
                .field("name")
                .is_some_and(|n| n.text(source) == wanted),
        })
}

/// Members (trait uses, properties, methods...) declared directly in a class body
pub fn class_members(class: &SyntaxNode) -> Vec<&SyntaxNode> {
    class
        .field("body")
        .or_else(|| class.child_of_kind("declaration_list"))
        .map(|body| body.named_children().collect())
        .unwrap_or_default()
}

/// Method declared directly on a class
pub fn find_method<'a>(
    class: &'a SyntaxNode,
    source: &str,
    method: &str,
) -> Option<&'a SyntaxNode> {
    class_members(class).into_iter().find(|member| {
        member.is_kind("method_declaration")
            && member
                .field("name")
                .is_some_and(|n| n.text(source) == method)
    })
}

/// Array literal initializing a class property (`protected $hidden = [...]`)
pub fn property_array<'a>(
    class: &'a SyntaxNode,
    source: &str,
    property: &str,
) -> Option<&'a SyntaxNode> {
    class_members(class)
        .into_iter()
        .filter(|member| member.is_kind("property_declaration"))
        .flat_map(|decl| decl.find_kind("property_element"))
        .find(|element| {
            element
                .find_first(|n| n.is_kind("variable_name"))
                .is_some_and(|var| var.text(source).trim_start_matches('$') == property)
        })
        .and_then(|element| element.find_first(|n| n.is_kind("array_creation_expression")))
}

/// Array literal returned directly from a method body
pub fn method_return_array<'a>(method: &'a SyntaxNode) -> Option<&'a SyntaxNode> {
    let body = method
        .field("body")
        .or_else(|| method.child_of_kind("compound_statement"))?;
    body.named_children()
        .find(|stmt| stmt.is_kind("return_statement"))
        .and_then(|ret| ret.named_children().next())
        .filter(|expr| expr.is_kind("array_creation_expression"))
}

/// First `return [...]` in the file (config files return their settings array)
pub fn find_return_array(root: &SyntaxNode) -> Option<&SyntaxNode> {
    root.find_all(|node| node.is_kind("return_statement"))
        .into_iter()
        .find_map(|ret| {
            ret.named_children()
                .next()
                .filter(|expr| expr.is_kind("array_creation_expression"))
        })
}

// =============================================================================
// Calls
// =============================================================================

/// Method name of a scoped (`A::m()`) or member (`$a->m()`) call
pub fn call_method_name<'s>(call: &SyntaxNode, source: &'s str) -> Option<&'s str> {
    call.field("name")
        .or_else(|| call.named_children().filter(|n| n.is_kind("name")).last())
        .map(|n| n.text(source))
}

/// Argument expressions of a call, in order
pub fn call_arguments(call: &SyntaxNode) -> Vec<&SyntaxNode> {
    let Some(arguments) = call
        .field("arguments")
        .or_else(|| call.child_of_kind("arguments"))
    else {
        return Vec::new();
    };

    arguments
        .named_children()
        .filter_map(|arg| {
            if arg.is_kind("argument") {
                arg.named_children().last()
            } else {
                Some(arg)
            }
        })
        .collect()
}

/// Class name on the left of `::` in a scoped call
fn call_scope<'s>(call: &SyntaxNode, source: &'s str) -> Option<&'s str> {
    call.field("scope")
        .or_else(|| call.named_children().next())
        .filter(|n| is_name(n))
        .map(|n| name_text(n, source))
}

/// Receiver of a member call (`$table` in `$table->string()`)
fn call_object(call: &SyntaxNode) -> Option<&SyntaxNode> {
    call.field("object").or_else(|| call.named_children().next())
}

fn is_member_call(node: &SyntaxNode) -> bool {
    node.is_kind("member_call_expression") || node.is_kind("nullsafe_member_call_expression")
}

/// Whether `call` is `Facade::method(...)` for the given facade name
fn is_facade_call(call: &SyntaxNode, source: &str, facade: &str, method: Option<&str>) -> bool {
    call.is_kind("scoped_call_expression")
        && call_scope(call, source).is_some_and(|scope| name_matches(scope, facade))
        && method.map_or(true, |m| call_method_name(call, source) == Some(m))
}

/// Expression held by an expression statement
fn statement_expression(statement: &SyntaxNode) -> Option<&SyntaxNode> {
    statement.named_children().next()
}

/// Path registered by a `Route::verb('/path', ...)` statement, following
/// chains such as `Route::post('/x', ...)->name('x')`
pub fn route_path(statement: &SyntaxNode, source: &str) -> Option<String> {
    let mut expr = statement_expression(statement)?;
    while is_member_call(expr) {
        expr = call_object(expr)?;
    }
    if !is_facade_call(expr, source, "Route", None) {
        return None;
    }
    call_arguments(expr)
        .first()
        .and_then(|arg| string_value(arg, source))
}

/// Statements inside `Schema::create('<table>', function (Blueprint $table) { ... })`
pub fn schema_create_statements<'a>(
    root: &'a SyntaxNode,
    source: &str,
    table: &str,
) -> Option<Vec<&'a SyntaxNode>> {
    root.find_all(|node| node.is_kind("scoped_call_expression"))
        .into_iter()
        .filter(|call| is_facade_call(call, source, "Schema", Some("create")))
        .find_map(|call| {
            let args = call_arguments(call);
            let table_arg = *args.first()?;
            if string_value(table_arg, source).as_deref() != Some(table) {
                return None;
            }
            let callback = *args.get(1)?;
            let body = callback.find_first(|n| n.is_kind("compound_statement"))?;
            Some(body.named_children().collect())
        })
}

/// Column declared by `$table->string('col')...;` or `$table->text('col')...;`
pub fn table_column_name(statement: &SyntaxNode, source: &str) -> Option<String> {
    if !statement.is_kind("expression_statement") {
        return None;
    }
    let mut call = statement_expression(statement)?;
    // Walk down modifier chains like ->nullable()->unique() to the column call.
    while is_member_call(call) {
        match call_object(call) {
            Some(object) if is_member_call(object) => call = object,
            _ => break,
        }
    }
    if !is_member_call(call) || !call_object(call).is_some_and(|o| o.is_kind("variable_name")) {
        return None;
    }
    if !matches!(call_method_name(call, source), Some("string") | Some("text")) {
        return None;
    }
    call_arguments(call)
        .first()
        .and_then(|arg| string_value(arg, source))
}

// =============================================================================
// Edit builders
// =============================================================================

/// Delete whole-line statements
pub fn delete_statement_lines(
    source: &str,
    statements: &[&SyntaxNode],
    edits: &mut EditSet,
) -> usize {
    for statement in statements {
        edits.delete(whole_line_span(source, statement.span()));
    }
    statements.len()
}

/// Remove `use` imports of the given fully qualified names. A statement
/// importing only targeted names is deleted with its line; otherwise only
/// the targeted clauses are dropped from its list.
pub fn remove_use_imports(
    source: &str,
    root: &SyntaxNode,
    names: &[&str],
    edits: &mut EditSet,
) -> usize {
    let mut removed = 0;

    for declaration in root.find_kind("namespace_use_declaration") {
        let prefix = declaration
            .child_of_kind("namespace_name")
            .map(|n| name_text(n, source).to_string());

        let clauses: Vec<(&SyntaxNode, String)> = declaration
            .find_all(|n| {
                n.is_kind("namespace_use_clause") || n.is_kind("namespace_use_group_clause")
            })
            .into_iter()
            .filter_map(|clause| {
                let name = clause.named_children().find(|n| is_name(n))?;
                let name = name_text(name, source);
                let full = match &prefix {
                    Some(prefix) => format!("{}\\{}", prefix, name),
                    None => name.to_string(),
                };
                Some((clause, full))
            })
            .collect();

        let targeted: Vec<bool> = clauses
            .iter()
            .map(|(_, full)| names.contains(&full.as_str()))
            .collect();
        let hits = targeted.iter().filter(|t| **t).count();
        if hits == 0 {
            continue;
        }
        removed += hits;

        if hits == clauses.len() {
            edits.delete(whole_line_span(source, declaration.span()));
            continue;
        }

        let kept: Vec<&str> = clauses
            .iter()
            .zip(&targeted)
            .filter(|(_, t)| !**t)
            .map(|((clause, _), _)| clause.text(source))
            .collect();
        let list = Span::new(clauses[0].0.span().start, clauses[clauses.len() - 1].0.span().end);
        edits.replace(list, kept.join(", "));
    }

    removed
}

/// Remove a trait from a class's `use A, B;` declarations
pub fn remove_trait_usage(
    source: &str,
    class: &SyntaxNode,
    trait_name: &str,
    edits: &mut EditSet,
) -> usize {
    let mut removed = 0;

    for usage in class_members(class)
        .into_iter()
        .filter(|member| member.is_kind("use_declaration"))
    {
        let traits: Vec<&SyntaxNode> = usage.named_children().filter(|n| is_name(n)).collect();
        let kept: Vec<&str> = traits
            .iter()
            .map(|t| name_text(t, source))
            .filter(|name| !name_matches(name, trait_name))
            .collect();

        if kept.len() == traits.len() {
            continue;
        }
        removed += 1;

        if kept.is_empty() {
            edits.delete(whole_line_span(source, usage.span()));
            continue;
        }

        let kept_list = kept.join(", ");
        let span = usage.span();
        let line = line_start(source, span.start);

        if usage.child_of_kind("use_list").is_some() {
            // Keep conflict-resolution blocks; only the name list changes.
            let names = Span::new(traits[0].span().start, traits[traits.len() - 1].span().end);
            edits.replace(names, kept_list);
        } else if source[line..span.start].trim().is_empty() {
            let indent = indentation_at(source, span.start);
            edits.replace(Span::new(line, span.end), format!("{}use {};", indent, kept_list));
        } else {
            edits.replace(span, format!("use {};", kept_list));
        }
    }

    removed
}

/// Entries of an array literal, in source order
pub fn array_entries(array: &SyntaxNode) -> Vec<&SyntaxNode> {
    array
        .named_children()
        .filter(|n| n.is_kind("array_element_initializer"))
        .collect()
}

/// String key of a `'key' => value` entry
pub fn entry_key(entry: &SyntaxNode, source: &str) -> Option<String> {
    if !entry.has_token("=>") {
        return None;
    }
    entry
        .named_children()
        .next()
        .and_then(|key| string_value(key, source))
}

/// String value of an entry (keyed or not)
pub fn entry_value(entry: &SyntaxNode, source: &str) -> Option<String> {
    entry
        .named_children()
        .last()
        .and_then(|value| string_value(value, source))
}

/// Remove array entries whose string key is in `keys`
pub fn remove_entries_by_key(
    source: &str,
    array: &SyntaxNode,
    keys: &[&str],
    edits: &mut EditSet,
) -> usize {
    remove_entries_where(source, array, edits, |entry| {
        entry_key(entry, source).is_some_and(|key| keys.contains(&key.as_str()))
    })
}

/// Remove unkeyed array entries whose string value is in `values`
pub fn remove_entries_by_value(
    source: &str,
    array: &SyntaxNode,
    values: &[&str],
    edits: &mut EditSet,
) -> usize {
    remove_entries_where(source, array, edits, |entry| {
        !entry.has_token("=>")
            && entry_value(entry, source).is_some_and(|value| values.contains(&value.as_str()))
    })
}

/// Remove matching entries from an array literal.
///
/// Entries that sit alone on their lines are deleted together with those
/// lines. Entries sharing a line with kept entries are cut out together with
/// the separator between them and their neighbour, so `['a', 'b', 'c']`
/// minus `'b'` becomes `['a', 'c']`.
pub fn remove_entries_where<F>(
    source: &str,
    array: &SyntaxNode,
    edits: &mut EditSet,
    is_target: F,
) -> usize
where
    F: Fn(&SyntaxNode) -> bool,
{
    let entries = array_entries(array);
    let targeted: Vec<bool> = entries.iter().map(|e| is_target(*e)).collect();
    let same_line =
        |a: &SyntaxNode, b: &SyntaxNode| !has_newline(source, a.span().end, b.span().start);

    let mut removed = 0;
    let mut i = 0;
    while i < entries.len() {
        if !targeted[i] {
            i += 1;
            continue;
        }

        let mut j = i;
        while j + 1 < entries.len() && targeted[j + 1] && same_line(entries[j], entries[j + 1]) {
            j += 1;
        }
        removed += j - i + 1;

        let first = entries[i].span();
        let last = entries[j].span();
        let next_on_line = entries.get(j + 1).filter(|next| same_line(entries[j], **next));
        let prev_on_line = i
            .checked_sub(1)
            .map(|p| entries[p])
            .filter(|prev| same_line(*prev, entries[i]));

        if let Some(next) = next_on_line {
            edits.delete(Span::new(first.start, next.span().start));
        } else if let Some(prev) = prev_on_line {
            edits.delete(Span::new(prev.span().end, last.end));
        } else {
            let run = Span::new(first.start, last.end);
            if run_owns_lines(source, run) {
                edits.delete(whole_line_span(source, run));
            } else {
                edits.delete(Span::new(first.start, after_separator(source, last.end)));
            }
        }

        i = j + 1;
    }

    removed
}

/// Whether the lines around `run` hold nothing but the run, a trailing comma,
/// an optional line comment and whitespace
fn run_owns_lines(source: &str, run: Span) -> bool {
    let before = &source[line_start(source, run.start)..run.start];
    let after_end = line_end(source, run.end);
    let after = source[run.end..after_end].trim_start();
    let after = after.strip_prefix(',').unwrap_or(after).trim();
    before.trim().is_empty() && (after.is_empty() || is_line_comment(after))
}

fn is_line_comment(text: &str) -> bool {
    text.starts_with("//") || (text.starts_with('#') && !text.starts_with("#["))
}

/// Offset past an optional `,` and the spaces following `offset` on the same line
fn after_separator(source: &str, offset: usize) -> usize {
    let rest = &source[offset..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    match trimmed.strip_prefix(',') {
        Some(after_comma) => source.len() - after_comma.trim_start_matches([' ', '\t']).len(),
        None => offset,
    }
}
