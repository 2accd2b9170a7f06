use maud::{html, Markup};

use super::{page, Notice};
use crate::models::{TodoStats, User};

pub fn stats_page(user: &User, stats: TodoStats, notices: &[Notice]) -> Markup {
    page(
        "Stats",
        Some(user),
        notices,
        html! {
            div class="p-4 flex items-center justify-center" {
                div class="w-full max-w-md shadow-xl bg-white rounded-lg p-4" {
                    h2 class="text-2xl font-bold mb-4 text-center" { "ToDo Stats" }
                    @if stats.total == 0 {
                        p class="text-center text-gray-500" { "No todos yet." }
                    } @else {
                        // drawn by app.js once Chart.js has loaded
                        canvas id="stats-chart" data-completed=(stats.completed) data-remaining=(stats.remaining) {}
                    }
                    div class="mt-6 flex justify-around text-sm text-gray-700" {
                        p { "✅ Completed: " (stats.completed) }
                        p { "⌛ Remaining: " (stats.remaining) }
                    }
                }
            }
        },
    )
}
