//! Line-oriented console driver for a planner session.

use std::fmt::Write as _;

use chrono::NaiveDate;

use carnival_shared::plan::format_currency;
use carnival_shared::{catalog, countdown, FestivalId, ItemId, PlanTier};

use crate::editors::{BudgetDraft, PackingDraft, ScheduleDraft};
use crate::events::{SessionCommand, SessionNotification};
use crate::state::SessionView;

pub const HELP: &str = "\
Commands:
  signin | signout
  select <festival-id>
  budget add <name> <cost>      budget rm <id>
  schedule add <YYYY-MM-DDTHH:MM> <title> [| note]
  schedule rm <id>
  pack add <item>               pack rm <id>      pack toggle <id>
  checkout monthly|yearly
  show | catalog | countdown | help | quit";

/// One parsed input line.
#[derive(Debug)]
pub enum ConsoleInput {
    Session(SessionCommand),
    Show,
    Catalog,
    Countdown,
    Help,
    Quit,
}

fn usage(text: &str) -> String {
    format!("usage: {text}")
}

fn id_arg(rest: &str, text: &str) -> Result<ItemId, String> {
    let id = rest.trim();
    if id.is_empty() {
        return Err(usage(text));
    }
    Ok(ItemId::from(id))
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let input = match head {
        "signin" => ConsoleInput::Session(SessionCommand::SignIn),
        "signout" => ConsoleInput::Session(SessionCommand::SignOut),
        "select" => {
            if rest.is_empty() {
                return Err(usage("select <festival-id>"));
            }
            ConsoleInput::Session(SessionCommand::Select {
                festival: FestivalId::new(rest),
            })
        }
        "budget" => parse_budget(rest)?,
        "schedule" => parse_schedule(rest)?,
        "pack" => parse_packing(rest)?,
        "checkout" => {
            let tier: PlanTier = rest.parse().map_err(|_| usage("checkout monthly|yearly"))?;
            ConsoleInput::Session(SessionCommand::StartCheckout(tier))
        }
        "show" => ConsoleInput::Show,
        "catalog" => ConsoleInput::Catalog,
        "countdown" => ConsoleInput::Countdown,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        "" => return Err(String::new()),
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(input)
}

fn parse_budget(rest: &str) -> Result<ConsoleInput, String> {
    let (verb, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let cmd = match verb {
        "add" => {
            let (name, cost) = args
                .trim()
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| usage("budget add <name> <cost>"))?;
            SessionCommand::AddBudget(BudgetDraft {
                name: name.trim().to_string(),
                cost: cost.to_string(),
            })
        }
        "rm" => SessionCommand::RemoveBudget(id_arg(args, "budget rm <id>")?),
        _ => return Err(usage("budget add|rm ...")),
    };
    Ok(ConsoleInput::Session(cmd))
}

fn parse_schedule(rest: &str) -> Result<ConsoleInput, String> {
    let (verb, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let cmd = match verb {
        "add" => {
            let (datetime, tail) = args
                .trim()
                .split_once(char::is_whitespace)
                .ok_or_else(|| usage("schedule add <datetime> <title> [| note]"))?;
            let (title, note) = tail.split_once('|').unwrap_or((tail, ""));
            SessionCommand::AddSchedule(ScheduleDraft {
                title: title.trim().to_string(),
                datetime: datetime.to_string(),
                note: note.trim().to_string(),
            })
        }
        "rm" => SessionCommand::RemoveSchedule(id_arg(args, "schedule rm <id>")?),
        _ => return Err(usage("schedule add|rm ...")),
    };
    Ok(ConsoleInput::Session(cmd))
}

fn parse_packing(rest: &str) -> Result<ConsoleInput, String> {
    let (verb, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let cmd = match verb {
        "add" => SessionCommand::AddPacking(PackingDraft {
            item: args.trim().to_string(),
        }),
        "rm" => SessionCommand::RemovePacking(id_arg(args, "pack rm <id>")?),
        "toggle" => SessionCommand::TogglePacked(id_arg(args, "pack toggle <id>")?),
        _ => return Err(usage("pack add|rm|toggle ...")),
    };
    Ok(ConsoleInput::Session(cmd))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_notification(notification: &SessionNotification) -> String {
    match notification {
        SessionNotification::IdentityChanged(Some(uid)) => format!("signed in as {uid}"),
        SessionNotification::IdentityChanged(None) => "signed out".to_string(),
        SessionNotification::PremiumChanged(true) => "premium: active".to_string(),
        SessionNotification::PremiumChanged(false) => "premium: inactive".to_string(),
        SessionNotification::ActivePlanChanged(id) => format!("active plan: {id}"),
        SessionNotification::PlanUpdated { festival, plan: Some(plan) } => format!(
            "{festival}: {} budget, {} schedule, {} packing ({})",
            plan.budget.len(),
            plan.schedule.len(),
            plan.packing.len(),
            format_currency(plan.budget_total()),
        ),
        SessionNotification::PlanUpdated { festival, plan: None } => {
            format!("{festival}: not created yet")
        }
        SessionNotification::SavedPlansChanged(plans) => format!("{} saved plan(s)", plans.len()),
        SessionNotification::WriteFailed { field, error } => {
            format!("could not save {field}: {error}")
        }
        SessionNotification::EditRejected { field, reason } => format!("{field}: {reason}"),
        SessionNotification::EntryAdded { field, id } => format!("added {field} entry {id}"),
        SessionNotification::Alert(alert) => format!("! {alert}"),
        SessionNotification::CheckoutRedirect { url } => format!("checkout: {url}"),
    }
}

pub fn render_view(view: &SessionView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "user: {}{}",
        view.identity
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(signed out)".into()),
        if view.can_use_premium() { " [premium]" } else { "" },
    );

    let Some(active) = &view.active_plan else {
        let _ = write!(out, "no plan selected");
        return out;
    };
    let Some(plan) = &view.plan else {
        let _ = write!(out, "plan {active}: not loaded");
        return out;
    };

    let _ = writeln!(out, "== {} ==", plan.name);
    let _ = writeln!(out, "Budget ({})", format_currency(plan.budget_total()));
    for b in &plan.budget {
        let _ = writeln!(out, "  [{}] {} {}", b.id, b.name, format_currency(b.cost));
    }
    let _ = writeln!(out, "Schedule");
    for s in plan.sorted_schedule() {
        let _ = write!(out, "  [{}] {} {}", s.id, s.datetime.format("%a %b %-d %H:%M"), s.title);
        if !s.note.is_empty() {
            let _ = write!(out, " ({})", s.note);
        }
        let _ = writeln!(out);
    }
    let (checked, total) = plan.packing_progress();
    let _ = writeln!(out, "Packing {checked}/{total}");
    for p in &plan.packing {
        let mark = if p.checked { "x" } else { " " };
        let _ = writeln!(out, "  [{}] ({mark}) {}", p.id, p.item);
    }
    if !view.saved_plans.is_empty() {
        let names: Vec<_> = view.saved_plans.iter().map(|p| p.festival_id.as_str()).collect();
        let _ = write!(out, "saved: {}", names.join(", "));
    }
    out.trim_end().to_string()
}

pub fn render_catalog() -> String {
    catalog::all()
        .iter()
        .map(|e| format!("{:<16} {}", e.id, e.display_name()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_countdown(today: NaiveDate) -> String {
    let upcoming = countdown::upcoming(today);
    if upcoming.is_empty() {
        return "no upcoming carnivals".to_string();
    }
    upcoming
        .iter()
        .map(|(entry, days)| format!("{days:>4} days  {}", entry.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_budget_add_with_spaces_in_name() {
        match parse_line("budget add Airbnb in Woodbrook 1200").unwrap() {
            ConsoleInput::Session(SessionCommand::AddBudget(draft)) => {
                assert_eq!(draft.name, "Airbnb in Woodbrook");
                assert_eq!(draft.cost, "1200");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_schedule_with_note() {
        match parse_line("schedule add 2026-02-16T04:00 J'ouvert | meet at band HQ").unwrap() {
            ConsoleInput::Session(SessionCommand::AddSchedule(draft)) => {
                assert_eq!(draft.datetime, "2026-02-16T04:00");
                assert_eq!(draft.title, "J'ouvert");
                assert_eq!(draft.note, "meet at band HQ");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_checkout_tier() {
        assert!(matches!(
            parse_line("checkout Yearly").unwrap(),
            ConsoleInput::Session(SessionCommand::StartCheckout(PlanTier::Yearly))
        ));
        assert!(parse_line("checkout weekly").is_err());
    }

    #[test]
    fn rejects_missing_arguments() {
        assert!(parse_line("select").is_err());
        assert!(parse_line("pack toggle").is_err());
        assert!(parse_line("budget add Costume").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn renders_signed_out_view() {
        let view = SessionView::default();
        assert!(render_view(&view).starts_with("user: (signed out)"));
    }

    #[test]
    fn countdown_lists_future_only() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let text = render_countdown(today);
        assert!(text.contains("Tobago Carnival"));
        assert!(!text.contains("Aruba Carnival"));
    }
}
