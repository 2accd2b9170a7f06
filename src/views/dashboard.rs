use maud::{html, Markup};

use super::{page, Notice};
use crate::models::{Filter, Todo, TodoId, TodoStats, User};

pub fn dashboard_page(user: &User, todos: &[Todo], filter: Filter, notices: &[Notice]) -> Markup {
    page(
        "Dashboard",
        Some(user),
        notices,
        html! {
            div class="p-6 max-w-4xl mx-auto space-y-6" {
                h1 class="text-2xl font-bold text-center" { "📝 Your Todo Dashboard" }
                (new_todo_html())
                div id="todo-panel" class="space-y-4" {
                    (panel_html(todos, filter))
                }
            }
        },
    )
}

// === Components ===
// title + description inputs, each with a microphone button
fn new_todo_html() -> Markup {
    html! {
        form class="bg-white rounded-lg shadow-lg p-4 flex flex-col gap-3" hx-post="/todos" hx-target="#todo-panel" hx-include="#active-filter"
            hx-disabled-elt="find button[type='submit']" "hx-on::after-request"="if (event.detail.successful) this.reset()" {
            div class="flex gap-2" {
                input id="new-title" class="w-full border rounded p-2" type="text" name="title" placeholder="Title" required;
                (mic_button("new-title"))
            }
            div class="flex gap-2" {
                input id="new-description" class="w-full border rounded p-2" type="text" name="description" placeholder="Description";
                (mic_button("new-description"))
            }
            button class="w-fit bg-slate-800 hover:bg-slate-700 text-white font-bold py-2 px-4 rounded" type="submit" { "+ Add Todo" }
        }
    }
}

fn mic_button(input_id: &str) -> Markup {
    html! {
        button type="button" class="px-2 text-xl opacity-50" title="Dictate" data-voice-input=(input_id) { "🎤" }
    }
}

/// Filter bar, counts and the visible list. Counts always cover every row.
pub fn panel_html(todos: &[Todo], filter: Filter) -> Markup {
    let stats = TodoStats::from_todos(todos);
    let visible = filter.apply(todos);
    html! {
        input type="hidden" id="active-filter" name="filter" value=(filter.as_str());
        div class="flex justify-between items-center flex-wrap gap-3" {
            div class="space-x-2" {
                @for option in Filter::ALL {
                    button class=(filter_class(option == filter)) hx-get="/todos" hx-target="#todo-panel"
                        hx-vals=(serde_json::json!({ "filter": option.as_str() }))
                        hx-push-url=(format!("/tododashboard?filter={}", option.as_str())) {
                        (option.label())
                    }
                }
            }
            div id="todo-stats" class="text-sm text-gray-500" {
                "📊 Total: " (stats.total) " | ✅ Completed: " (stats.completed) " | ⏳ Remaining: " (stats.remaining)
            }
        }
        ul id="todo-list" class="list-none p-0 space-y-4" {
            @if visible.is_empty() {
                p class="text-center text-gray-500" { "No todos to show." }
            } @else {
                @for todo in visible {
                    (todo_html(todo))
                }
            }
        }
    }
}

fn filter_class(active: bool) -> &'static str {
    if active {
        "bg-slate-800 text-white py-1 px-3 rounded"
    } else {
        "border border-slate-300 py-1 px-3 rounded"
    }
}

// a single line item in the todo list
pub fn todo_html(todo: &Todo) -> Markup {
    let check = if todo.is_complete {
        "text-green-500"
    } else {
        "text-gray-400"
    };
    html! {
        li id=(item_id(&todo.id)) class="flex justify-between items-start bg-white rounded-lg shadow-lg p-4" {
            div class="flex-1 space-y-1" {
                div class="text-lg font-semibold flex items-center gap-2" {
                    span class={@if todo.is_complete { "line-through" } @else { "" }} { (todo.title) }
                    button type="button" class="text-base" title="Read aloud" data-speak=(todo.spoken_text()) { "🔊" }
                }
                p class="text-sm text-gray-500" { (todo.description()) }
            }
            div class="flex gap-2 items-start" {
                button class={"text-2xl " (check)} title="Toggle complete"
                    hx-post=(format!("/todos/{}/toggle", todo.id)) hx-target="#todo-panel" hx-include="#active-filter"
                    hx-vals=(serde_json::json!({ "is_complete": todo.is_complete })) hx-disabled-elt="this" { "✔" }
                button class="text-xl" title="Edit"
                    hx-get=(format!("/todos/{}/edit", todo.id)) hx-target="closest li" hx-swap="outerHTML"
                    hx-vals=(serde_json::json!({ "title": todo.title, "description": todo.description() }))
                    hx-disabled-elt="this" { "✏️" }
                button class="text-xl text-red-500" title="Delete"
                    hx-delete=(format!("/todos/{}", todo.id)) hx-target="#todo-panel" hx-include="#active-filter"
                    hx-disabled-elt="this" { "🗑" }
            }
        }
    }
}

pub fn edit_todo_html(id: &TodoId, title: &str, description: &str) -> Markup {
    html! {
        li id=(item_id(id)) class="bg-white rounded-lg shadow-lg p-4" {
            form class="flex-1 space-y-2" hx-put=(format!("/todos/{}", id)) hx-target="#todo-panel" hx-include="#active-filter"
                hx-disabled-elt="find button[type='submit']" {
                input class="w-full border rounded p-2" type="text" name="title" value=(title) required;
                input class="w-full border rounded p-2" type="text" name="description" value=(description);
                div class="flex gap-2 mt-2" {
                    button type="submit" class="bg-slate-800 text-white py-1 px-3 rounded" { "Save" }
                    button type="button" class="py-1 px-3 rounded" hx-get="/todos" hx-target="#todo-panel" hx-include="#active-filter" { "Cancel" }
                }
            }
        }
    }
}

fn item_id(id: &TodoId) -> String {
    format!("todo-{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::todo;

    #[test]
    fn test_panel_counts_all_rows_but_lists_filtered() {
        let todos = vec![todo("1", "Done thing", true), todo("2", "Open thing", false)];
        let markup = panel_html(&todos, Filter::Remaining).into_string();
        assert!(markup.contains("Total: 2"));
        assert!(markup.contains("Completed: 1"));
        assert!(markup.contains("Open thing"));
        assert!(!markup.contains("Done thing"));
        assert!(markup.contains(r#"value="remaining""#));
    }

    #[test]
    fn test_item_buttons_disable_while_in_flight() {
        let markup = todo_html(&todo("7", "Water plants", false)).into_string();
        assert_eq!(markup.matches(r#"hx-disabled-elt="this""#).count(), 3);
    }

    #[test]
    fn test_panel_empty_message() {
        let markup = panel_html(&[], Filter::All).into_string();
        assert!(markup.contains("No todos to show."));
    }

    #[test]
    fn test_todo_item_carries_current_flag() {
        let markup = todo_html(&todo("9", "Item", true)).into_string();
        assert!(markup.contains(r#"hx-post="/todos/9/toggle""#));
        assert!(markup.contains("is_complete&quot;:true"));
        assert!(markup.contains("line-through"));
    }

    #[test]
    fn test_edit_form_prefilled() {
        let markup = edit_todo_html(&TodoId::new("4"), "Title", "Desc").into_string();
        assert!(markup.contains(r#"hx-put="/todos/4""#));
        assert!(markup.contains(r#"value="Title""#));
        assert!(markup.contains(r#"value="Desc""#));
    }
}
