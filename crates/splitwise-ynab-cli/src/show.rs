use std::fmt::Display;

use anstyle::{AnsiColor, Color, Style};
use splitwise_ynab::reconcile::{ApplyReport, PlannedAction, ReconcilePlan};

fn color(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

/// `text` in `style`, reset afterwards.
fn styled(style: Style, text: impl Display) -> String {
    format!("{style}{text}{style:#}")
}

fn heading(style: Style, title: &str) -> String {
    styled(style, format!("━━━ {title} ━━━"))
}

pub fn show_plan(plan: &ReconcilePlan) {
    let create_style = color(AnsiColor::Green);
    let update_style = color(AnsiColor::Yellow);
    let zero_style = color(AnsiColor::Red);

    let mut create_count = 0;
    let mut update_count = 0;
    let mut zero_count = 0;

    for action in &plan.actions {
        match action {
            PlannedAction::Create { .. } => {
                println!("{}", heading(create_style, "New expense"));
                create_count += 1;
            }
            PlannedAction::UpdateOrCreate { .. } => {
                println!(
                    "{}",
                    heading(
                        update_style,
                        "Updated expense (update, or create if unmatched)"
                    )
                );
                update_count += 1;
            }
            PlannedAction::Zero { .. } => {
                println!("{}", heading(zero_style, "Deleted expense (zero if matched)"));
                zero_count += 1;
            }
        }
        println!("{action}");
        println!();
    }

    // Summary
    if plan.is_empty() && plan.rejected.is_empty() {
        println!("✓ Nothing to reconcile!");
    } else {
        println!("{}", heading(Style::new().bold(), "Summary (dry run)"));
        if create_count > 0 {
            println!(
                "  {} transaction(s) to create",
                styled(create_style, create_count)
            );
        }
        if update_count > 0 {
            println!(
                "  {} transaction(s) to update",
                styled(update_style, update_count)
            );
        }
        if zero_count > 0 {
            println!("  {} transaction(s) to zero", styled(zero_style, zero_count));
        }
        if !plan.rejected.is_empty() {
            println!("  {} expense(s) with unusable amounts", plan.rejected.len());
        }
    }
    if !plan.dropped.is_empty() {
        println!(
            "  {} expense(s) created and deleted since the last run, ignored",
            plan.dropped.len()
        );
    }
}

pub fn show_report(report: &ApplyReport) {
    let style = if report.has_failures() {
        color(AnsiColor::Red)
    } else {
        color(AnsiColor::Green)
    };

    println!("{}", heading(Style::new().bold(), "Summary"));
    println!("  {}", styled(style, report));
    if report.has_failures() {
        println!("  See the log file for details.");
    }
}
